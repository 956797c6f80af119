//! Weekly activity reconciliation
//!
//! Completion history is timestamped in absolute time and bucketed here by
//! the viewer's local date, while the server rolls daily stats up by UTC
//! date. Near local midnight the two disagree about which day a reading
//! belongs to, so each window date takes its value from exactly one source.
//! An event claims both its local date and the UTC date the server counted
//! it under; a daily stat only fills dates no event has claimed.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::models::{CompletionEvent, DailyStatEntry, ReadingWeights};

pub const WINDOW_DAYS: i64 = 7;
pub const TODAY_LABEL: &str = "오늘";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivitySource {
    None,
    History,
    DailyStat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayActivity {
    pub date: NaiveDate,
    pub label: String,
    pub count: f64,
    pub source: ActivitySource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHistogram {
    pub days: Vec<DayActivity>,
}

impl WeeklyHistogram {
    pub fn counts(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.count).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.days.iter().map(|d| d.label.clone()).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.days.iter().find(|d| d.date == date).map(|d| d.count)
    }

    pub fn total(&self) -> f64 {
        self.days.iter().map(|d| d.count).sum()
    }

    pub fn active_days(&self) -> usize {
        self.days.iter().filter(|d| d.count > 0.0).count()
    }
}

/// The viewer's calendar date at `now`.
pub fn local_today<Tz: TimeZone>(tz: &Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

pub fn reconcile_weekly<Tz: TimeZone>(
    today: NaiveDate,
    tz: &Tz,
    history: &[CompletionEvent],
    stats: &[DailyStatEntry],
    weights: Option<&ReadingWeights>,
) -> WeeklyHistogram {
    let mut days: Vec<DayActivity> = (0..WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DayActivity {
                date,
                label: day_label(date, offset == 0),
                count: 0.0,
                source: ActivitySource::None,
            }
        })
        .collect();

    let mut covered: HashSet<NaiveDate> = HashSet::new();
    let mut skipped = 0usize;

    for event in history {
        let Some(ts) = event.completed_at_utc() else {
            skipped += 1;
            continue;
        };
        // 服务端汇总里同一条记录落在 UTC 日期上
        covered.insert(ts.date_naive());

        let date = ts.with_timezone(tz).date_naive();
        let Some(slot) = days.iter_mut().find(|d| d.date == date) else {
            continue;
        };
        let weight = weights.map(|w| w.weight_for(event)).unwrap_or(1.0);
        slot.count += weight;
        slot.source = ActivitySource::History;
        covered.insert(date);
    }

    for entry in stats {
        let Some(date) = entry.utc_date() else {
            skipped += 1;
            continue;
        };
        if covered.contains(&date) {
            continue;
        }
        if let Some(slot) = days.iter_mut().find(|d| d.date == date) {
            slot.count = entry.sanitized_count();
            slot.source = ActivitySource::DailyStat;
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "ignored records with unparseable dates");
    }

    WeeklyHistogram { days }
}

fn day_label(date: NaiveDate, is_today: bool) -> String {
    if is_today {
        TODAY_LABEL.to_string()
    } else {
        format!("{}/{}", date.month(), date.day())
    }
}
