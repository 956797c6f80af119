pub mod chapter_range;
pub mod plan;
pub mod reminder;
pub mod streak;
pub mod weekly_activity;
