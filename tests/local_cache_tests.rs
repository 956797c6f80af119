use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use tongdok::services::plan::BookSpan;
use tongdok::storage::{LocalCache, HISTORY_KEY};
use tongdok::{reconcile_weekly, CompletionEvent, DailyStatEntry, ReadingPlan};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn cache_persists_across_reopen() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("nested").join("cache.db");

    {
        let cache = LocalCache::open(&path).expect("failed to open cache");
        cache
            .append_completion(CompletionEvent::new(
                1,
                0,
                Utc.with_ymd_and_hms(2024, 1, 29, 15, 30, 0).unwrap(),
            ))
            .unwrap();
        cache
            .save_daily_stats(&[DailyStatEntry::new(date(2024, 1, 27), 2.0)])
            .unwrap();
    }

    let reopened = LocalCache::open(&path).expect("failed to reopen cache");
    assert_eq!(reopened.db_path(), path.to_string_lossy());
    assert_eq!(reopened.load_history().unwrap().len(), 1);
    assert_eq!(reopened.load_daily_stats().unwrap().len(), 1);
}

#[test]
fn cached_plan_drives_weighted_weekly_summary() {
    let dir = TempDir::new().unwrap();
    let cache = LocalCache::open(dir.path().join("cache.db")).unwrap();

    let books = vec![BookSpan::new("창세기", 10)];
    let plan = ReadingPlan::sequential("창세기 통독", date(2024, 1, 24), &books, 3).unwrap();
    cache.save_plan(&plan).unwrap();

    // 第 1 天 "1-3" 共 3 章, KST 1/30 00:30 完成
    cache
        .append_completion(CompletionEvent {
            day: 1,
            reading_index: 0,
            completed_at: "2024-01-29T15:30:00Z".to_string(),
        })
        .unwrap();
    cache
        .save_daily_stats(&[
            DailyStatEntry::new(date(2024, 1, 29), 3.0),
            DailyStatEntry::new(date(2024, 1, 28), 2.0),
        ])
        .unwrap();

    let plan = cache.load_plan().unwrap().expect("plan should be cached");
    let weights = plan.reading_weights();
    let history = cache.load_history().unwrap();
    let stats = cache.load_daily_stats().unwrap();
    let kst = FixedOffset::east_opt(9 * 3600).unwrap();

    let histogram = reconcile_weekly(date(2024, 1, 30), &kst, &history, &stats, Some(&weights));
    assert_eq!(histogram.get(date(2024, 1, 30)), Some(3.0));
    assert_eq!(histogram.get(date(2024, 1, 29)), Some(0.0));
    assert_eq!(histogram.get(date(2024, 1, 28)), Some(2.0));
}

#[test]
fn history_with_unparseable_timestamps_loads_and_is_skipped() {
    let cache = LocalCache::in_memory().unwrap();
    cache
        .set_raw(
            HISTORY_KEY,
            r#"[{"day":1,"readingIndex":0,"completedAt":"broken"},
                {"day":1,"readingIndex":1,"completedAt":"2024-01-30T08:00:00+09:00"}]"#,
        )
        .unwrap();

    let history = cache.load_history().unwrap();
    assert_eq!(history.len(), 2);

    let histogram = reconcile_weekly(date(2024, 1, 30), &Utc, &history, &[], None);
    assert_eq!(histogram.total(), 1.0);
}
