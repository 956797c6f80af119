use thiserror::Error;

use crate::services::plan::PlanError;
use crate::services::reminder::ReminderError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("计划错误: {0}")]
    Plan(#[from] PlanError),

    #[error("提醒错误: {0}")]
    Reminder(#[from] ReminderError),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("参数无效: {0}")]
    InvalidInput(String),
}

pub type AppResult<T> = Result<T, AppError>;
