//! 阅读进度数据模型
//!
//! 定义进度历史、每日统计与阅读权重表，供每周活动统计、连续天数与本地缓存共用。

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// 无时区时间戳可接受的格式（按 UTC 解释）
const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// ============================================================
// CompletionEvent - 阅读完成记录
// ============================================================

/// 一次阅读完成记录（客户端进度历史中的一条）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    /// 计划中的第几天 (从 1 开始)
    pub day: u32,
    /// 当天第几项阅读 (从 0 开始)
    pub reading_index: u32,
    /// 完成时间 (原样保存，解析失败的记录在统计时跳过)
    pub completed_at: String,
}

impl CompletionEvent {
    pub fn new(day: u32, reading_index: u32, completed_at: DateTime<Utc>) -> Self {
        Self {
            day,
            reading_index,
            completed_at: completed_at.to_rfc3339(),
        }
    }

    /// 解析完成时间为 UTC 时间点
    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.completed_at)
    }

    /// 权重表中的键 `"<day>-<readingIndex>"`
    pub fn weight_key(&self) -> String {
        ReadingWeights::key(self.day, self.reading_index)
    }
}

// ============================================================
// DailyStatEntry - 服务端每日汇总
// ============================================================

/// 服务端按 UTC 日期汇总的阅读数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatEntry {
    /// UTC 日期 `YYYY-MM-DD`，可能带时间部分
    pub date: String,
    pub count: f64,
}

impl DailyStatEntry {
    pub fn new(date: NaiveDate, count: f64) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        }
    }

    /// 截断时间部分后的 UTC 日期
    pub fn utc_date(&self) -> Option<NaiveDate> {
        let trimmed = self.date.trim();
        let head = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    /// 非负的有效计数
    pub fn sanitized_count(&self) -> f64 {
        if self.count.is_finite() && self.count > 0.0 {
            self.count
        } else {
            0.0
        }
    }
}

// ============================================================
// ReadingWeights - 阅读权重表
// ============================================================

/// 阅读权重表，键为 `"<day>-<readingIndex>"`
///
/// 一条完成记录可以代表多章阅读；未登记的阅读权重为 1。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingWeights(HashMap<String, f64>);

impl ReadingWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(day: u32, reading_index: u32) -> String {
        format!("{day}-{reading_index}")
    }

    pub fn insert(&mut self, day: u32, reading_index: u32, weight: f64) {
        self.0.insert(Self::key(day, reading_index), weight);
    }

    /// 查询权重；缺失、非有限或非正的权重按 1 处理
    pub fn weight(&self, day: u32, reading_index: u32) -> f64 {
        match self.0.get(&Self::key(day, reading_index)) {
            Some(&w) if w.is_finite() && w > 0.0 => w,
            _ => 1.0,
        }
    }

    pub fn weight_for(&self, event: &CompletionEvent) -> f64 {
        self.weight(event.day, event.reading_index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for ReadingWeights {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 解析时间戳：RFC 3339，或不带时区的 `YYYY-MM-DD HH:MM:SS` (按 UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
