//! # tongdok - 圣经通读进度核心库
//!
//! ## 模块结构
//!
//! - [`services::chapter_range`] - 章节引用规范化 (`"18장 9-16절"` → `["18"]`)
//! - [`services::weekly_activity`] - 本地完成记录与服务端每日统计合并为 7 天直方图
//! - [`services::plan`] - 通读计划 (日期换算、章数权重、进度)
//! - [`services::streak`] - 连续阅读天数
//! - [`services::reminder`] - 今日未读提醒
//! - [`storage`] - SQLite 本地缓存
//!
//! ## 使用示例
//!
//! ```rust
//! use tongdok::normalize_chapters;
//!
//! let chapters = normalize_chapters("창세기 1-3, 3:16");
//! assert_eq!(chapters.as_slice(), ["1", "2", "3"]);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

// ============================================================================
// 重新导出
// ============================================================================

pub use error::{AppError, AppResult};
pub use models::{CompletionEvent, DailyStatEntry, ReadingWeights};
pub use services::chapter_range::{normalize_chapters, ChapterSet};
pub use services::plan::{BookSpan, PlanProgress, ReadingPlan};
pub use services::streak::{compute_streak, StreakSummary};
pub use services::weekly_activity::{local_today, reconcile_weekly, WeeklyHistogram};
pub use storage::LocalCache;
