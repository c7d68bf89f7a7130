use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Category, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Todo,
    Done,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "todo" | "pending" => Ok(Self::Todo),
            "done" | "completed" => Ok(Self::Done),
            other => Err(format!("unknown status filter `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub category: Option<Category>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let query = self.query.trim().to_lowercase();
        if !query.is_empty()
            && !task.title.to_lowercase().contains(&query)
            && !task.description.to_lowercase().contains(&query)
        {
            return false;
        }
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Todo => !task.completed,
            StatusFilter::Done => task.completed,
        };
        status_ok && self.category.as_ref().map_or(true, |c| *c == task.category)
    }
}

/// Tasks shown by the list screen, in collection order.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDraft;
    use chrono::Utc;

    fn task(id: &str, title: &str, description: &str, category: Category, completed: bool) -> Task {
        let mut draft = TaskDraft::new(title);
        draft.description = description.to_string();
        draft.category = category;
        let mut task = Task::from_draft(id.to_string(), draft, Utc::now());
        task.completed = completed;
        task
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "Buy Milk", "", Category::Personal, false),
            task("2", "Quarterly report", "send to the milk board", Category::Work, true),
            task("3", "Gym", "legs", Category::Health, false),
            task("4", "Read paper", "", Category::Study, true),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn default_filter_keeps_everything_in_order() {
        let tasks = sample();
        assert_eq!(ids(&filter_tasks(&tasks, &TaskFilter::default())), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn query_matches_title_or_description_case_insensitively() {
        let tasks = sample();
        let filter = TaskFilter {
            query: "  MILK ".into(),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &filter)), vec!["1", "2"]);

        let blank = TaskFilter {
            query: "   ".into(),
            ..TaskFilter::default()
        };
        assert_eq!(filter_tasks(&tasks, &blank).len(), 4);
    }

    #[test]
    fn status_and_category_narrow_the_list() {
        let tasks = sample();
        let todo = TaskFilter {
            status: StatusFilter::Todo,
            ..TaskFilter::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &todo)), vec!["1", "3"]);

        let done_work = TaskFilter {
            status: StatusFilter::Done,
            category: Some(Category::Work),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &done_work)), vec!["2"]);

        let milk_todo = TaskFilter {
            query: "milk".into(),
            status: StatusFilter::Todo,
            category: None,
        };
        assert_eq!(ids(&filter_tasks(&tasks, &milk_todo)), vec!["1"]);
    }

    #[test]
    fn status_parses_aliases() {
        assert_eq!("pending".parse::<StatusFilter>(), Ok(StatusFilter::Todo));
        assert_eq!("DONE".parse::<StatusFilter>(), Ok(StatusFilter::Done));
        assert!("archived".parse::<StatusFilter>().is_err());
    }
}
