use std::collections::{BTreeSet, HashSet};

use chrono::{Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::{CompletionEvent, DailyStatEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<NaiveDate>,
}

/// Dates with any reading: local dates of history plus UTC dates of non-zero stats.
///
/// A stat date that some event already fell on in UTC is the server's count of
/// that same event, so it adds nothing.
pub fn active_dates<Tz: TimeZone>(
    tz: &Tz,
    history: &[CompletionEvent],
    stats: &[DailyStatEntry],
) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    let mut claimed = HashSet::new();

    for ts in history.iter().filter_map(CompletionEvent::completed_at_utc) {
        claimed.insert(ts.date_naive());
        dates.insert(ts.with_timezone(tz).date_naive());
    }

    dates.extend(
        stats
            .iter()
            .filter(|entry| entry.sanitized_count() > 0.0)
            .filter_map(DailyStatEntry::utc_date)
            .filter(|date| !claimed.contains(date)),
    );

    dates
}

pub fn compute_streak<Tz: TimeZone>(
    today: NaiveDate,
    tz: &Tz,
    history: &[CompletionEvent],
    stats: &[DailyStatEntry],
) -> StreakSummary {
    let dates = active_dates(tz, history, stats);
    // 未来日期不计入
    let dates: Vec<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();

    let Some(&last_active) = dates.last() else {
        return StreakSummary::default();
    };

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &date in &dates {
        run = match prev {
            Some(p) if (date - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    // 今天还没读时，昨天结束的连续天数仍然有效
    let yesterday = today - Duration::days(1);
    let current = if last_active == today || last_active == yesterday {
        run
    } else {
        0
    };

    StreakSummary {
        current,
        longest,
        last_active: Some(last_active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn read_on(d: NaiveDate) -> CompletionEvent {
        CompletionEvent {
            day: 1,
            reading_index: 0,
            completed_at: format!("{}T12:00:00Z", d.format("%Y-%m-%d")),
        }
    }

    #[test]
    fn test_empty_history_has_no_streak() {
        let summary = compute_streak(date(2024, 1, 30), &Utc, &[], &[]);
        assert_eq!(summary, StreakSummary::default());
    }

    #[test]
    fn test_current_streak_ending_today() {
        let history: Vec<_> = (26..=30).map(|d| read_on(date(2024, 1, d))).collect();
        let summary = compute_streak(date(2024, 1, 30), &Utc, &history, &[]);
        assert_eq!(summary.current, 5);
        assert_eq!(summary.longest, 5);
        assert_eq!(summary.last_active, Some(date(2024, 1, 30)));
    }

    #[test]
    fn test_streak_survives_until_today_is_read() {
        let history: Vec<_> = (27..=29).map(|d| read_on(date(2024, 1, d))).collect();
        let summary = compute_streak(date(2024, 1, 30), &Utc, &history, &[]);
        assert_eq!(summary.current, 3);
    }

    #[test]
    fn test_broken_streak_keeps_longest() {
        let mut history: Vec<_> = (1..=4).map(|d| read_on(date(2024, 1, d))).collect();
        history.push(read_on(date(2024, 1, 20)));
        let summary = compute_streak(date(2024, 1, 30), &Utc, &history, &[]);
        assert_eq!(summary.current, 0);
        assert_eq!(summary.longest, 4);
    }

    #[test]
    fn test_stats_fill_gaps() {
        let history = vec![read_on(date(2024, 1, 28)), read_on(date(2024, 1, 30))];
        let stats = vec![
            DailyStatEntry::new(date(2024, 1, 29), 2.0),
            DailyStatEntry::new(date(2024, 1, 27), 0.0),
        ];
        let summary = compute_streak(date(2024, 1, 30), &Utc, &history, &stats);
        assert_eq!(summary.current, 3);
    }

    #[test]
    fn test_local_timezone_shifts_active_date() {
        // KST 1/30 00:30
        let history = vec![CompletionEvent {
            day: 1,
            reading_index: 0,
            completed_at: "2024-01-29T15:30:00Z".to_string(),
        }];
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let summary = compute_streak(date(2024, 1, 30), &kst, &history, &[]);
        assert_eq!(summary.last_active, Some(date(2024, 1, 30)));
        assert_eq!(summary.current, 1);
    }

    #[test]
    fn test_stat_for_event_utc_date_is_not_a_second_day() {
        // KST 1/30 00:30, server counted it under UTC 1/29
        let history = vec![CompletionEvent {
            day: 1,
            reading_index: 0,
            completed_at: "2024-01-29T15:30:00Z".to_string(),
        }];
        let stats = vec![DailyStatEntry::new(date(2024, 1, 29), 1.0)];
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();

        let summary = compute_streak(date(2024, 1, 30), &kst, &history, &stats);
        assert_eq!(summary.current, 1);
        assert_eq!(summary.longest, 1);
        assert_eq!(
            active_dates(&kst, &history, &stats).into_iter().collect::<Vec<_>>(),
            vec![date(2024, 1, 30)]
        );
    }
}
