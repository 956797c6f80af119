//! 日志初始化
//!
//! 控制台日志写到 stderr，stdout 只留给命令的 JSON 输出。
//! 配置了日志目录时再叠加一个按天滚动的文件层。

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "tongdok.log";
const FALLBACK_FILTER: &str = "info";

/// 文件日志后台写线程的句柄，drop 时刷新缓冲
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// 无法解析的过滤表达式退回 `info`
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let (file_writer, guard) = match config.log_dir.as_deref().map(open_log_file) {
        Some(Ok((writer, guard))) => (Some(writer), Some(guard)),
        Some(Err(err)) => {
            eprintln!("file logging disabled: {err}");
            (None, None)
        }
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
    });

    let result = tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init();
    if let Err(err) = result {
        eprintln!("tracing subscriber already set: {err}");
    }

    guard.map(|guard| FileLogGuard { _guard: guard })
}

fn open_log_file(dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
