use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{FixedOffset, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::json;

use tongdok::config::{parse_utc_offset, Config};
use tongdok::models::parse_timestamp;
use tongdok::services::plan::{BookSpan, ReadingPlan};
use tongdok::services::reminder::{send_reminder, LogSink};
use tongdok::services::streak::compute_streak;
use tongdok::services::weekly_activity::{local_today, reconcile_weekly};
use tongdok::{
    logging, normalize_chapters, AppError, AppResult, CompletionEvent, DailyStatEntry, LocalCache,
};

#[derive(Debug, Parser)]
#[command(name = "tongdok", version, about = "Bible reading plan progress tools")]
struct Cli {
    /// SQLite cache file (overrides TONGDOK_CACHE_PATH)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Expand a chapter reference such as "창세기 1-5" or "18:9-16"
    Chapters { reference: String },
    /// Seven-day activity histogram ending today
    Weekly {
        #[command(flatten)]
        view: ViewArgs,
        /// Reading plan JSON used for per-reading chapter weights
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Current and longest reading streak
    Streak {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Mark a reading as completed in the local cache
    Record {
        #[arg(long)]
        day: u32,
        #[arg(long)]
        reading: u32,
        /// Completion time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Store server daily stats JSON in the local cache
    ImportStats { file: PathBuf },
    /// Store a reading plan JSON in the local cache
    ImportPlan { file: PathBuf },
    /// Build a sequential plan from "book:chapters" pairs
    GeneratePlan {
        #[arg(long)]
        title: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        per_day: u32,
        /// e.g. 창세기:50,출애굽기:40
        #[arg(long, value_delimiter = ',', required = true)]
        books: Vec<String>,
        /// Also store the plan in the local cache
        #[arg(long)]
        save: bool,
    },
    /// Plan completion summary
    Progress {
        #[arg(long)]
        plan: Option<PathBuf>,
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Deliver today's reminder if readings are left
    Remind {
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Completion history JSON (defaults to the local cache)
    #[arg(long)]
    history: Option<PathBuf>,
    /// Daily stats JSON (defaults to the local cache)
    #[arg(long)]
    stats: Option<PathBuf>,
    /// Local date to treat as today
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Viewer UTC offset such as +09:00
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<String>,
}

/// Opens the cache on first use only.
struct Session {
    config: Config,
    cache_path: PathBuf,
    cache: Option<LocalCache>,
}

impl Session {
    fn new(config: Config, cache_override: Option<PathBuf>) -> Self {
        let cache_path = cache_override.unwrap_or_else(|| config.cache_path.clone());
        Self {
            config,
            cache_path,
            cache: None,
        }
    }

    fn cache(&mut self) -> AppResult<&LocalCache> {
        let cache = match self.cache.take() {
            Some(cache) => cache,
            None => LocalCache::open(&self.cache_path)?,
        };
        Ok(&*self.cache.insert(cache))
    }

    fn offset(&self, raw: Option<&str>) -> AppResult<FixedOffset> {
        match raw {
            Some(value) => parse_utc_offset(value)
                .ok_or_else(|| AppError::InvalidInput(format!("invalid UTC offset: {value}"))),
            None => Ok(self.config.utc_offset),
        }
    }

    fn history(&mut self, file: Option<&Path>) -> AppResult<Vec<CompletionEvent>> {
        match file {
            Some(path) => read_json_file(path),
            None => Ok(self.cache()?.load_history()?),
        }
    }

    fn stats(&mut self, file: Option<&Path>) -> AppResult<Vec<DailyStatEntry>> {
        match file {
            Some(path) => read_json_file(path),
            None => Ok(self.cache()?.load_daily_stats()?),
        }
    }

    fn plan(&mut self, file: Option<&Path>) -> AppResult<Option<ReadingPlan>> {
        let plan: Option<ReadingPlan> = match file {
            Some(path) => Some(read_json_file(path)?),
            None => self.cache()?.load_plan()?,
        };
        if let Some(ref plan) = plan {
            plan.validate()?;
        }
        Ok(plan)
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let cli = Cli::parse();

    let _log_guard = logging::init_tracing(&config);

    let mut session = Session::new(config, cli.cache);
    match run(cli.command, &mut session) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, session: &mut Session) -> AppResult<String> {
    let value = match command {
        Command::Chapters { reference } => {
            let chapters = normalize_chapters(&reference);
            tracing::debug!(reference = %reference, count = chapters.len(), "normalized reference");
            serde_json::to_value(chapters)?
        }
        Command::Weekly { view, plan } => {
            let tz = session.offset(view.offset.as_deref())?;
            let today = view.today.unwrap_or_else(|| local_today(&tz, Utc::now()));
            let history = session.history(view.history.as_deref())?;
            let stats = session.stats(view.stats.as_deref())?;
            let weights = session.plan(plan.as_deref())?.map(|p| p.reading_weights());

            let histogram = reconcile_weekly(today, &tz, &history, &stats, weights.as_ref());
            tracing::info!(%today, total = histogram.total(), "weekly activity reconciled");
            json!({
                "labels": histogram.labels(),
                "counts": histogram.counts(),
                "days": histogram.days,
            })
        }
        Command::Streak { view } => {
            let tz = session.offset(view.offset.as_deref())?;
            let today = view.today.unwrap_or_else(|| local_today(&tz, Utc::now()));
            let history = session.history(view.history.as_deref())?;
            let stats = session.stats(view.stats.as_deref())?;
            serde_json::to_value(compute_streak(today, &tz, &history, &stats))?
        }
        Command::Record { day, reading, at } => {
            let completed_at = match at {
                Some(raw) => parse_timestamp(&raw)
                    .ok_or_else(|| AppError::InvalidInput(format!("invalid timestamp: {raw}")))?,
                None => Utc::now(),
            };
            let event = CompletionEvent::new(day, reading, completed_at);
            let history = session.cache()?.append_completion(event.clone())?;
            tracing::info!(day, reading, total = history.len(), "reading recorded");
            json!({ "recorded": event, "historySize": history.len() })
        }
        Command::ImportStats { file } => {
            let stats: Vec<DailyStatEntry> = read_json_file(&file)?;
            session.cache()?.save_daily_stats(&stats)?;
            tracing::info!(entries = stats.len(), "daily stats imported");
            json!({ "imported": stats.len() })
        }
        Command::ImportPlan { file } => {
            let plan: ReadingPlan = read_json_file(&file)?;
            plan.validate()?;
            session.cache()?.save_plan(&plan)?;
            tracing::info!(title = %plan.title, days = plan.days.len(), "reading plan imported");
            json!({ "title": plan.title, "days": plan.days.len() })
        }
        Command::GeneratePlan {
            title,
            start,
            per_day,
            books,
            save,
        } => {
            let spans = books
                .iter()
                .map(String::as_str)
                .map(parse_book_span)
                .collect::<AppResult<Vec<_>>>()?;
            let plan = ReadingPlan::sequential(title, start, &spans, per_day)?;
            if save {
                session.cache()?.save_plan(&plan)?;
                tracing::info!(days = plan.days.len(), "generated plan saved");
            }
            serde_json::to_value(plan)?
        }
        Command::Progress { plan, history } => {
            let plan = session.plan(plan.as_deref())?.ok_or_else(missing_plan)?;
            let history = session.history(history.as_deref())?;
            serde_json::to_value(plan.progress(&history))?
        }
        Command::Remind { today, offset } => {
            let tz = session.offset(offset.as_deref())?;
            let today = today.unwrap_or_else(|| local_today(&tz, Utc::now()));
            let plan = session.plan(None)?.ok_or_else(missing_plan)?;
            let history = session.history(None)?;
            serde_json::to_value(send_reminder(&LogSink, &plan, &history, today)?)?
        }
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

fn missing_plan() -> AppError {
    AppError::InvalidInput("no reading plan; run import-plan first".to_string())
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn parse_book_span(raw: &str) -> AppResult<BookSpan> {
    let invalid = || AppError::InvalidInput(format!("expected book:chapters, got {raw:?}"));
    let (book, chapters) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let chapters: u32 = chapters.trim().parse().map_err(|_| invalid())?;
    let book = book.trim();
    if book.is_empty() {
        return Err(invalid());
    }
    Ok(BookSpan::new(book, chapters))
}
