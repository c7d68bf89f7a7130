use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReminderMode {
    #[default]
    Upcoming,
    Today,
    Tomorrow,
    ThisWeek,
}

impl FromStr for ReminderMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "today" => Ok(Self::Today),
            "tomorrow" => Ok(Self::Tomorrow),
            "thisweek" | "week" => Ok(Self::ThisWeek),
            other => Err(format!("unknown reminder mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderView {
    /// Unfinished tasks whose reminder already passed, regardless of mode.
    pub overdue: Vec<Task>,
    /// The bucket selected by the mode.
    pub items: Vec<Task>,
}

/// First day of the calendar week for a UI language. English follows the US
/// convention of Sunday; the other supported locales start on Monday.
pub fn week_start_for_language(language: &str) -> Weekday {
    if language.trim().eq_ignore_ascii_case("en-US") {
        Weekday::Sun
    } else {
        Weekday::Mon
    }
}

/// Inclusive first and last day of the week containing `date`.
pub fn week_bounds(date: NaiveDate, week_start: Weekday) -> (NaiveDate, NaiveDate) {
    let week = date.week(week_start);
    (week.first_day(), week.last_day())
}

/// Groups tasks that carry a reminder into the overdue list and the bucket
/// selected by `mode`. Calendar buckets use the time zone of `now`.
pub fn reminder_view<Tz: TimeZone>(
    tasks: &[Task],
    now: &DateTime<Tz>,
    mode: ReminderMode,
    week_start: Weekday,
) -> ReminderView {
    let zone = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();
    let tomorrow = today.succ_opt();
    let local_day = |at: &DateTime<Utc>| at.with_timezone(&zone).date_naive();

    let with_reminder = || {
        tasks
            .iter()
            .filter_map(|task| task.reminder_date.map(|at| (task, at)))
    };

    let overdue = with_reminder()
        .filter(|(task, at)| !task.completed && *at < now_utc)
        .map(|(task, _)| task.clone())
        .collect();

    let items = match mode {
        ReminderMode::Today => with_reminder()
            .filter(|(_, at)| local_day(at) == today)
            .map(|(task, _)| task.clone())
            .collect(),
        ReminderMode::Tomorrow => with_reminder()
            .filter(|(_, at)| Some(local_day(at)) == tomorrow)
            .map(|(task, _)| task.clone())
            .collect(),
        ReminderMode::ThisWeek => {
            let (first, last) = week_bounds(today, week_start);
            with_reminder()
                .filter(|(_, at)| {
                    let day = local_day(at);
                    day >= first && day <= last && day != today && Some(day) != tomorrow
                })
                .map(|(task, _)| task.clone())
                .collect()
        }
        ReminderMode::Upcoming => {
            let mut upcoming: Vec<(&Task, DateTime<Utc>)> =
                with_reminder().filter(|(_, at)| *at >= now_utc).collect();
            // Stable: equal reminders keep collection order.
            upcoming.sort_by_key(|(_, at)| *at);
            upcoming.into_iter().map(|(task, _)| task.clone()).collect()
        }
    };

    ReminderView { overdue, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDraft;
    use chrono_tz::Asia::Shanghai;

    fn shanghai(day: u32, hour: u32) -> DateTime<Utc> {
        Shanghai
            .with_ymd_and_hms(2026, 10, day, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn task(id: &str, reminder: Option<DateTime<Utc>>, completed: bool) -> Task {
        let mut draft = TaskDraft::new(format!("task-{id}"));
        draft.reminder_date = reminder;
        let mut task = Task::from_draft(id.to_string(), draft, shanghai(1, 9));
        task.completed = completed;
        task
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.id.as_str()).collect()
    }

    // Wednesday 2026-10-14 10:00 in Shanghai.
    fn now() -> DateTime<chrono_tz::Tz> {
        Shanghai.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn mode_parses_from_ui_names() {
        assert_eq!("thisWeek".parse::<ReminderMode>(), Ok(ReminderMode::ThisWeek));
        assert_eq!("this-week".parse::<ReminderMode>(), Ok(ReminderMode::ThisWeek));
        assert_eq!("Today".parse::<ReminderMode>(), Ok(ReminderMode::Today));
        assert!("later".parse::<ReminderMode>().is_err());
        assert_eq!(ReminderMode::default(), ReminderMode::Upcoming);
    }

    #[test]
    fn past_unfinished_reminders_are_overdue_and_not_upcoming() {
        let tasks = vec![
            task("a", Some(shanghai(13, 10)), false),
            task("b", Some(shanghai(13, 18)), false),
            task("done", Some(shanghai(13, 9)), true),
            task("none", None, false),
        ];
        let view = reminder_view(&tasks, &now(), ReminderMode::Upcoming, Weekday::Mon);
        assert_eq!(ids(&view.overdue), vec!["a", "b"]);
        assert!(view.items.is_empty());
    }

    #[test]
    fn upcoming_is_sorted_ascending_and_stable_for_ties() {
        let tasks = vec![
            task("late", Some(shanghai(20, 9)), false),
            task("tie-1", Some(shanghai(15, 9)), false),
            task("early", Some(shanghai(14, 12)), true),
            task("tie-2", Some(shanghai(15, 9)), false),
            task("past", Some(shanghai(14, 9)), false),
            task("now", Some(now().with_timezone(&Utc)), false),
        ];
        let view = reminder_view(&tasks, &now(), ReminderMode::Upcoming, Weekday::Mon);
        assert_eq!(ids(&view.items), vec!["now", "early", "tie-1", "tie-2", "late"]);
        assert_eq!(ids(&view.overdue), vec!["past"]);
    }

    #[test]
    fn today_and_tomorrow_follow_local_calendar_days() {
        let tasks = vec![
            task("morning", Some(shanghai(14, 8)), false),
            task("evening", Some(shanghai(14, 21)), false),
            // 17:00 UTC on the 14th is already the 15th in Shanghai.
            task(
                "utc-late",
                Some(Utc.with_ymd_and_hms(2026, 10, 14, 17, 0, 0).unwrap()),
                false,
            ),
            task("tomorrow", Some(shanghai(15, 23)), false),
            task("later", Some(shanghai(16, 0)), false),
        ];
        let today = reminder_view(&tasks, &now(), ReminderMode::Today, Weekday::Mon);
        assert_eq!(ids(&today.items), vec!["morning", "evening"]);
        // The morning reminder is also reported as overdue.
        assert_eq!(ids(&today.overdue), vec!["morning"]);

        let tomorrow = reminder_view(&tasks, &now(), ReminderMode::Tomorrow, Weekday::Mon);
        assert_eq!(ids(&tomorrow.items), vec!["utc-late", "tomorrow"]);
    }

    #[test]
    fn this_week_excludes_today_and_tomorrow_and_respects_week_start() {
        let tasks = vec![
            task("sun-before", Some(shanghai(11, 12)), false),
            task("mon", Some(shanghai(12, 12)), false),
            task("today", Some(shanghai(14, 12)), false),
            task("tomorrow", Some(shanghai(15, 12)), false),
            task("fri", Some(shanghai(16, 12)), false),
            task("sun-after", Some(shanghai(18, 12)), false),
            task("next-mon", Some(shanghai(19, 12)), false),
        ];
        let monday = reminder_view(&tasks, &now(), ReminderMode::ThisWeek, Weekday::Mon);
        assert_eq!(ids(&monday.items), vec!["mon", "fri", "sun-after"]);

        let sunday = reminder_view(&tasks, &now(), ReminderMode::ThisWeek, Weekday::Sun);
        assert_eq!(ids(&sunday.items), vec!["sun-before", "mon", "fri"]);
    }

    #[test]
    fn week_start_depends_on_language() {
        assert_eq!(week_start_for_language("en-US"), Weekday::Sun);
        assert_eq!(week_start_for_language("zh-CN"), Weekday::Mon);
        assert_eq!(week_start_for_language("ja-JP"), Weekday::Mon);

        let day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let (first, last) = week_bounds(day, Weekday::Mon);
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }
}
