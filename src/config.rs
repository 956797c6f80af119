use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

/// KST
const DEFAULT_UTC_OFFSET_SECS: i32 = 9 * 3600;
const CACHE_DIR_NAME: &str = "tongdok";
const CACHE_FILE_NAME: &str = "cache.db";
const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// `Some` when ENABLE_FILE_LOGS is on
    pub log_dir: Option<PathBuf>,
    pub utc_offset: FixedOffset,
    pub cache_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| is_enabled(&v))
            .unwrap_or(false);
        let log_dir = file_logs.then(|| {
            std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
        });

        let utc_offset = match std::env::var("TONGDOK_UTC_OFFSET") {
            Ok(value) => parse_utc_offset(&value).unwrap_or_else(|| {
                // 此时日志尚未初始化
                eprintln!("invalid TONGDOK_UTC_OFFSET {value:?}, using default");
                default_offset()
            }),
            Err(_) => default_offset(),
        };

        let cache_path = std::env::var("TONGDOK_CACHE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_path);

        Self {
            log_level,
            log_dir,
            utc_offset,
            cache_path,
        }
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from("./tongdok-cache.db"))
}

fn is_enabled(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

/// Parses `+09:00`, `-0530`, `+9`, `Z` / `UTC`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    s.parse::<FixedOffset>().ok().or_else(|| parse_hour_offset(s))
}

/// `+9`, `-11`
fn parse_hour_offset(s: &str) -> Option<FixedOffset> {
    let (sign, hours) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };

    if hours.is_empty() || hours.len() > 2 || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    if hours > 23 {
        return None;
    }

    FixedOffset::east_opt(sign * hours * 3600)
}
