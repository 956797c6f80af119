use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::CompletionEvent;
use crate::services::plan::ReadingPlan;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("提醒发送失败: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderKind {
    /// 今天还一项都没读
    NotStarted,
    /// 读了一部分
    InProgress,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub kind: ReminderKind,
    pub plan_day: u32,
    pub date: NaiveDate,
    pub title: String,
    pub body: String,
    pub remaining: Vec<String>,
}

/// Push deliverer collaborator.
pub trait ReminderSink {
    fn deliver(&self, reminder: &Reminder) -> Result<(), ReminderError>;
}

/// Delivers by writing a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReminderSink for LogSink {
    fn deliver(&self, reminder: &Reminder) -> Result<(), ReminderError> {
        tracing::info!(
            kind = reminder.kind.as_str(),
            plan_day = reminder.plan_day,
            remaining = reminder.remaining.len(),
            title = %reminder.title,
            "reading reminder"
        );
        Ok(())
    }
}

/// `today` is the viewer's local date; `None` when there is nothing left to read today.
pub fn build_reminder(
    plan: &ReadingPlan,
    history: &[CompletionEvent],
    today: NaiveDate,
) -> Option<Reminder> {
    let plan_day = plan.day_for_date(today)?;
    let total = plan.day(plan_day).map(|d| d.readings.len()).unwrap_or(0);
    let remaining: Vec<String> = plan
        .remaining_readings(plan_day, history)
        .into_iter()
        .map(|(_, reading)| reading.display())
        .collect();

    if remaining.is_empty() {
        return None;
    }

    let kind = if remaining.len() == total {
        ReminderKind::NotStarted
    } else {
        ReminderKind::InProgress
    };

    let title = match kind {
        ReminderKind::NotStarted => format!("{} · {}일차", plan.title, plan_day),
        ReminderKind::InProgress => format!(
            "{} · {}일차 ({}/{})",
            plan.title,
            plan_day,
            total - remaining.len(),
            total
        ),
    };

    Some(Reminder {
        kind,
        plan_day,
        date: today,
        title,
        body: remaining.join(", "),
        remaining,
    })
}

pub fn send_reminder<S: ReminderSink>(
    sink: &S,
    plan: &ReadingPlan,
    history: &[CompletionEvent],
    today: NaiveDate,
) -> Result<Option<Reminder>, ReminderError> {
    let Some(reminder) = build_reminder(plan, history, today) else {
        tracing::debug!(%today, "no reminder needed");
        return Ok(None);
    };
    sink.deliver(&reminder)?;
    Ok(Some(reminder))
}
