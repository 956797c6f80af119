use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{CompletionEvent, ReadingWeights};
use crate::services::chapter_range::normalize_chapters;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("每天的章数必须大于 0")]
    ZeroChaptersPerDay,
    #[error("没有可安排的章节")]
    NothingToSchedule,
    #[error("计划天数不连续: 第 {position} 项应为第 {expected} 天, 实际为 {actual}")]
    NonConsecutiveDay {
        position: usize,
        expected: u32,
        actual: u32,
    },
    #[error("第 {0} 天没有阅读内容")]
    EmptyDay(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReading {
    pub book: String,
    pub chapters: String,
}

impl PlanReading {
    pub fn display(&self) -> String {
        format!("{} {}", self.book, self.chapters)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub day: u32,
    pub readings: Vec<PlanReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPlan {
    pub title: String,
    pub start_date: NaiveDate,
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSpan {
    pub book: String,
    pub chapters: u32,
}

impl BookSpan {
    pub fn new(book: impl Into<String>, chapters: u32) -> Self {
        Self {
            book: book.into(),
            chapters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    pub total_days: usize,
    pub completed_days: usize,
    pub total_readings: usize,
    pub completed_readings: usize,
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub progress_percentage: f64,
}

impl ReadingPlan {
    /// 按顺序把各卷章节切分为每天 `chapters_per_day` 章，可跨卷
    pub fn sequential(
        title: impl Into<String>,
        start_date: NaiveDate,
        books: &[BookSpan],
        chapters_per_day: u32,
    ) -> Result<Self, PlanError> {
        if chapters_per_day == 0 {
            return Err(PlanError::ZeroChaptersPerDay);
        }

        let mut days = Vec::new();
        let mut current: Vec<PlanReading> = Vec::new();
        let mut used = 0u32;

        for span in books.iter().filter(|b| b.chapters > 0) {
            let mut next = 1u32;
            while next <= span.chapters {
                let take = (chapters_per_day - used).min(span.chapters - next + 1);
                let end = next + take - 1;
                current.push(PlanReading {
                    book: span.book.clone(),
                    chapters: format_chapter_range(next, end),
                });
                used += take;
                next = end + 1;

                if used == chapters_per_day {
                    days.push(PlanDay {
                        day: days.len() as u32 + 1,
                        readings: std::mem::take(&mut current),
                    });
                    used = 0;
                }
            }
        }

        if !current.is_empty() {
            days.push(PlanDay {
                day: days.len() as u32 + 1,
                readings: current,
            });
        }

        if days.is_empty() {
            return Err(PlanError::NothingToSchedule);
        }

        Ok(Self {
            title: title.into(),
            start_date,
            days,
        })
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        for (position, day) in self.days.iter().enumerate() {
            let expected = position as u32 + 1;
            if day.day != expected {
                return Err(PlanError::NonConsecutiveDay {
                    position,
                    expected,
                    actual: day.day,
                });
            }
            if day.readings.is_empty() {
                return Err(PlanError::EmptyDay(day.day));
            }
        }
        Ok(())
    }

    pub fn day(&self, day: u32) -> Option<&PlanDay> {
        self.days.iter().find(|d| d.day == day)
    }

    pub fn date_for_day(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 {
            return None;
        }
        self.start_date
            .checked_add_signed(Duration::days(i64::from(day) - 1))
    }

    /// 日期对应的计划天数；开始之前或计划结束之后返回 `None`
    pub fn day_for_date(&self, date: NaiveDate) -> Option<u32> {
        let offset = (date - self.start_date).num_days();
        if offset < 0 {
            return None;
        }
        let day = u32::try_from(offset + 1).ok()?;
        self.day(day).map(|d| d.day)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.days.iter().map(|d| d.day).max().and_then(|d| self.date_for_day(d))
    }

    /// 每项阅读的权重为其包含的章数（至少为 1）
    pub fn reading_weights(&self) -> ReadingWeights {
        let mut weights = ReadingWeights::new();
        for day in &self.days {
            for (index, reading) in day.readings.iter().enumerate() {
                let chapters = normalize_chapters(&reading.chapters).chapter_count().max(1);
                weights.insert(day.day, index as u32, chapters as f64);
            }
        }
        weights
    }

    /// 某天尚未完成的阅读 `(readingIndex, reading)`
    pub fn remaining_readings<'a>(
        &'a self,
        day: u32,
        history: &[CompletionEvent],
    ) -> Vec<(u32, &'a PlanReading)> {
        let done = completed_keys(history);
        self.day(day)
            .map(|d| {
                d.readings
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (i as u32, r))
                    .filter(|(i, _)| !done.contains(&(day, *i)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn progress(&self, history: &[CompletionEvent]) -> PlanProgress {
        let done = completed_keys(history);
        let weights = self.reading_weights();

        let mut total_readings = 0usize;
        let mut completed_readings = 0usize;
        let mut completed_days = 0usize;
        let mut total_chapters = 0usize;
        let mut completed_chapters = 0usize;

        for day in &self.days {
            let mut all_done = true;
            for (index, _) in day.readings.iter().enumerate() {
                let chapters = weights.weight(day.day, index as u32) as usize;
                total_readings += 1;
                total_chapters += chapters;
                if done.contains(&(day.day, index as u32)) {
                    completed_readings += 1;
                    completed_chapters += chapters;
                } else {
                    all_done = false;
                }
            }
            if all_done && !day.readings.is_empty() {
                completed_days += 1;
            }
        }

        let progress_percentage = if total_readings > 0 {
            (completed_readings as f64 / total_readings as f64) * 100.0
        } else {
            0.0
        };

        PlanProgress {
            total_days: self.days.len(),
            completed_days,
            total_readings,
            completed_readings,
            total_chapters,
            completed_chapters,
            progress_percentage: (progress_percentage * 100.0).round() / 100.0,
        }
    }
}

fn completed_keys(history: &[CompletionEvent]) -> HashSet<(u32, u32)> {
    history.iter().map(|e| (e.day, e.reading_index)).collect()
}

fn format_chapter_range(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}
