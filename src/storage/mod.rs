//! SQLite 本地缓存模块
//!
//! 离线保存进度历史、每日统计快照与阅读计划：
//! - 单表键值存储，值为 JSON
//! - 由调用方显式创建并持有连接句柄，没有全局状态

// ============================================================
// 依赖导入
// ============================================================

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{CompletionEvent, DailyStatEntry};
use crate::services::plan::ReadingPlan;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// 缓存键
// ============================================================

pub const HISTORY_KEY: &str = "progress_history";
pub const DAILY_STATS_KEY: &str = "daily_stats";
pub const PLAN_KEY: &str = "reading_plan";

const INIT_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

// ============================================================
// LocalCache - 本地键值缓存
// ============================================================

/// 本地键值缓存
pub struct LocalCache {
    connection: Mutex<Connection>,
    db_path: String,
}

impl LocalCache {
    /// 打开（或创建）缓存文件
    ///
    /// 父目录不存在时自动创建，启用 WAL 模式。
    pub fn open<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let connection = Connection::open(path)?;
        connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;

        let cache = Self {
            connection: Mutex::new(connection),
            db_path: path.to_string_lossy().to_string(),
        };
        cache.initialize()?;

        tracing::debug!(path = %cache.db_path, "local cache opened");
        Ok(cache)
    }

    /// 创建内存缓存（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let cache = Self {
            connection: Mutex::new(Connection::open_in_memory()?),
            db_path: ":memory:".to_string(),
        };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(INIT_SCHEMA)?;
        Ok(())
    }

    fn get_connection(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 获取缓存路径
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    // ========== 通用键值操作 ==========

    pub fn get_raw(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.get_connection()?;
        read_value(&conn, key)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.get_connection()?;
        write_value(&conn, key, value)
    }

    /// 读取 JSON 值，键不存在时返回 `None`
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    /// 删除键，返回是否删除了记录
    pub fn remove(&self, key: &str) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        let affected = conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    // ========== 进度历史 ==========

    pub fn load_history(&self) -> StorageResult<Vec<CompletionEvent>> {
        Ok(self.get_json(HISTORY_KEY)?.unwrap_or_default())
    }

    /// 追加完成记录；同一 `(day, readingIndex)` 的旧记录被替换
    ///
    /// 读取、修改、写回在同一把锁和同一个事务内完成。
    pub fn append_completion(&self, event: CompletionEvent) -> StorageResult<Vec<CompletionEvent>> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let mut history: Vec<CompletionEvent> = match read_value(&tx, HISTORY_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        history.retain(|e| !(e.day == event.day && e.reading_index == event.reading_index));
        history.push(event);

        write_value(&tx, HISTORY_KEY, &serde_json::to_string(&history)?)?;
        tx.commit()?;
        Ok(history)
    }

    // ========== 每日统计 ==========

    pub fn load_daily_stats(&self) -> StorageResult<Vec<DailyStatEntry>> {
        Ok(self.get_json(DAILY_STATS_KEY)?.unwrap_or_default())
    }

    pub fn save_daily_stats(&self, stats: &[DailyStatEntry]) -> StorageResult<()> {
        self.set_json(DAILY_STATS_KEY, stats)
    }

    // ========== 阅读计划 ==========

    pub fn load_plan(&self) -> StorageResult<Option<ReadingPlan>> {
        self.get_json(PLAN_KEY)
    }

    pub fn save_plan(&self, plan: &ReadingPlan) -> StorageResult<()> {
        self.set_json(PLAN_KEY, plan)
    }
}

fn read_value(conn: &Connection, key: &str) -> StorageResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
        [key, value],
    )?;
    Ok(())
}
