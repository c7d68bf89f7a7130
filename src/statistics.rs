use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Category, Priority, Task};
use crate::reminders::week_bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    Week,
    Month,
    All,
}

impl TimeRange {
    /// Divisor for the daily average. `All` assumes a fixed quarter rather
    /// than the real span of the data.
    pub fn days(self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::All => 90,
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("unknown time range `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub count: usize,
    pub completed: usize,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub range: TimeRange,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub completion_rate: u32,
    pub overdue_rate: u32,
    pub by_category: BTreeMap<Category, GroupStats>,
    pub by_priority: BTreeMap<Priority, GroupStats>,
    pub average_completion_days: i64,
    pub daily_average: f64,
}

/// Tasks whose creation day (in the time zone of `now`) falls inside `range`.
/// Weeks start on Monday.
pub fn windowed<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    now: &DateTime<Tz>,
    range: TimeRange,
) -> Vec<&'a Task> {
    let zone = now.timezone();
    let today = now.date_naive();
    let (first, last) = week_bounds(today, Weekday::Mon);
    tasks
        .iter()
        .filter(|task| {
            let created = task.created_at.with_timezone(&zone).date_naive();
            match range {
                TimeRange::All => true,
                TimeRange::Week => created >= first && created <= last,
                TimeRange::Month => {
                    created.year() == today.year() && created.month() == today.month()
                }
            }
        })
        .collect()
}

pub fn statistics<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>, range: TimeRange) -> Statistics {
    let now_utc = now.with_timezone(&Utc);
    let in_range = windowed(tasks, now, range);

    let total = in_range.len();
    let completed = in_range.iter().filter(|task| task.completed).count();
    let overdue = in_range
        .iter()
        .filter(|task| !task.completed && task.due_date.is_some_and(|due| due < now_utc))
        .count();

    let mut by_category: BTreeMap<Category, GroupStats> = BTreeMap::new();
    let mut by_priority: BTreeMap<Priority, GroupStats> = BTreeMap::new();
    for task in &in_range {
        tally(by_category.entry(task.category.clone()).or_default(), task);
        tally(by_priority.entry(task.priority).or_default(), task);
    }
    for group in by_category.values_mut().chain(by_priority.values_mut()) {
        group.completion_rate = percentage(group.completed, group.count);
    }

    Statistics {
        range,
        total,
        completed,
        pending: total - completed,
        overdue,
        completion_rate: percentage(completed, total),
        overdue_rate: percentage(overdue, total),
        by_category,
        by_priority,
        average_completion_days: average_completion_days(&in_range, now_utc),
        daily_average: round_one_decimal(total as f64 / f64::from(range.days())),
    }
}

fn tally(group: &mut GroupStats, task: &Task) {
    group.count += 1;
    if task.completed {
        group.completed += 1;
    }
}

/// Average whole days from creation to completion over completed tasks with a
/// due date. Records without a completion time (older exports) count up to `now`.
fn average_completion_days(tasks: &[&Task], now: DateTime<Utc>) -> i64 {
    let days: Vec<i64> = tasks
        .iter()
        .filter(|task| task.completed && task.due_date.is_some())
        .map(|task| {
            let finished = task.completed_at.unwrap_or(now);
            (finished - task.created_at).num_days()
        })
        .collect();
    if days.is_empty() {
        return 0;
    }
    let sum: i64 = days.iter().sum();
    (sum as f64 / days.len() as f64).round() as i64
}

/// Integer percentage, rounded half away from zero. Zero for an empty whole.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
