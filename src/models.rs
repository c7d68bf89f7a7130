use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<Utc>;

pub const SCHEMA_VERSION: u32 = 1;

/// Task category. The four built-in categories are known to the UI; anything
/// else is kept verbatim so imported data never loses a user-defined label.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Study,
    Health,
    Custom(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Study => "study",
            Category::Health => "health",
            Category::Custom(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "personal" => Category::Personal,
            "work" => Category::Work,
            "study" => Category::Study,
            "health" => Category::Health,
            _ => Category::Custom(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_date: Option<Timestamp>,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl Task {
    /// Builds a fresh, not yet completed task from a draft.
    pub fn from_draft(id: String, draft: TaskDraft, created_at: Timestamp) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            completed: false,
            due_date: draft.due_date,
            reminder_date: draft.reminder_date,
            created_at,
            completed_at: None,
        }
    }

    /// Replaces every editable field. Identity and completion state stay put.
    pub fn apply_draft(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.category = draft.category;
        self.priority = draft.priority;
        self.due_date = draft.due_date;
        self.reminder_date = draft.reminder_date;
    }

    pub fn set_completed(&mut self, completed: bool, at: Timestamp) {
        if completed && !self.completed {
            self.completed_at = Some(at);
        } else if !completed {
            self.completed_at = None;
        }
        self.completed = completed;
    }
}

/// The editable part of a task, as submitted by the task form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub reminder_date: Option<Timestamp>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.clone(),
            priority: task.priority,
            due_date: task.due_date,
            reminder_date: task.reminder_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

impl TasksFile {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tasks,
        }
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme `{other}`")),
        }
    }
}

pub const ACCENT_COLORS: [&str; 4] = ["blue", "purple", "green", "orange"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Light,
            accent_color: default_accent_color(),
        }
    }
}

impl ThemeSettings {
    /// Trims the accent id and falls back to the default for unknown colors.
    pub fn normalized(mut self) -> Self {
        let accent = self.accent_color.trim().to_lowercase();
        self.accent_color = if ACCENT_COLORS.contains(&accent.as_str()) {
            accent
        } else {
            default_accent_color()
        };
        self
    }
}

fn default_accent_color() -> String {
    "blue".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default)]
    pub is_enabled: bool,
}

pub const SUPPORTED_LANGUAGES: [&str; 4] = ["zh-CN", "en-US", "ja-JP", "ko-KR"];
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSettings {
    pub language: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            language: detect_system_language(),
        }
    }
}

impl LanguageSettings {
    /// Maps a user supplied tag onto a supported one, case-insensitively.
    /// Returns `None` for tags the UI has no translations for.
    pub fn normalize_tag(tag: &str) -> Option<&'static str> {
        let tag = tag.trim().replace('_', "-");
        SUPPORTED_LANGUAGES
            .iter()
            .copied()
            .find(|supported| supported.eq_ignore_ascii_case(&tag))
    }
}

fn detect_system_language() -> String {
    sys_locale::get_locale()
        .and_then(|locale| LanguageSettings::normalize_tag(&locale))
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn category_round_trips_known_and_custom_values() {
        assert_eq!(Category::from("work"), Category::Work);
        assert_eq!(Category::from("errands"), Category::Custom("errands".into()));
        assert_eq!(String::from(Category::Health), "health");

        let value = serde_json::to_value(Category::Custom("errands".into())).unwrap();
        assert_eq!(value, serde_json::json!("errands"));
        let back: Category = serde_json::from_value(serde_json::json!("study")).unwrap();
        assert_eq!(back, Category::Study);
    }

    #[test]
    fn task_serializes_with_camel_case_keys_and_iso_dates() {
        let task = Task {
            id: "1".into(),
            title: "Buy milk".into(),
            description: String::new(),
            category: Category::Personal,
            priority: Priority::Low,
            completed: false,
            due_date: Some(ts(1_700_000_000)),
            reminder_date: None,
            created_at: ts(1_699_990_000),
            completed_at: None,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dueDate"], "2023-11-14T22:13:20Z");
        assert_eq!(value["createdAt"], "2023-11-14T19:26:40Z");
        assert_eq!(value["priority"], "low");
        assert!(value.get("reminderDate").is_none());
        assert!(value.get("completedAt").is_none());
    }

    #[test]
    fn task_deserializes_browser_export_shape() {
        let json = r#"
        {
          "id": "1712345678901",
          "title": "Read",
          "description": "",
          "completed": true,
          "category": "study",
          "priority": "high",
          "dueDate": "2024-04-06T10:00:00.000Z",
          "createdAt": "2024-04-05T19:34:38.901Z"
        }
        "#;
        let task: Task = serde_json::from_str(json).expect("task should deserialize");
        assert_eq!(task.category, Category::Study);
        assert_eq!(task.priority, Priority::High);
        assert!(task.completed);
        assert!(task.reminder_date.is_none());
        assert!(task.completed_at.is_none());
        assert!(task.due_date.is_some());
    }

    #[test]
    fn set_completed_tracks_completion_timestamp() {
        let mut task = Task::from_draft("a".into(), TaskDraft::new("a"), ts(0));
        task.set_completed(true, ts(10));
        assert_eq!(task.completed_at, Some(ts(10)));

        // Re-completing keeps the first completion time.
        task.set_completed(true, ts(20));
        assert_eq!(task.completed_at, Some(ts(10)));

        task.set_completed(false, ts(30));
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn drafts_default_to_personal_medium() {
        let draft = TaskDraft::new("a");
        assert_eq!(draft.category, Category::Personal);
        assert_eq!(draft.priority, Priority::Medium);
    }

    #[test]
    fn priority_and_theme_parse_from_names() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!("dark".parse::<ThemeMode>(), Ok(ThemeMode::Dark));
    }

    #[test]
    fn tasks_file_schema_version_defaults_when_missing() {
        let file: TasksFile = serde_json::from_str(r#"{ "tasks": [] }"#).unwrap();
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        assert!(file.tasks.is_empty());
    }

    #[test]
    fn settings_records_use_browser_storage_shapes() {
        let theme = serde_json::to_value(ThemeSettings::default()).unwrap();
        assert_eq!(theme, serde_json::json!({ "theme": "light", "accentColor": "blue" }));

        let notifications = serde_json::to_value(NotificationSettings::default()).unwrap();
        assert_eq!(notifications, serde_json::json!({ "isEnabled": false }));

        let language: LanguageSettings =
            serde_json::from_value(serde_json::json!({ "language": "en-US" })).unwrap();
        assert_eq!(language.language, "en-US");
    }

    #[test]
    fn theme_normalization_falls_back_to_default_accent() {
        let theme = ThemeSettings {
            theme: ThemeMode::Dark,
            accent_color: " Purple ".into(),
        }
        .normalized();
        assert_eq!(theme.accent_color, "purple");

        let theme = ThemeSettings {
            theme: ThemeMode::Dark,
            accent_color: "magenta".into(),
        }
        .normalized();
        assert_eq!(theme.accent_color, "blue");
        assert_eq!(theme.theme, ThemeMode::Dark);
    }

    #[test]
    fn language_tags_normalize_case_insensitively() {
        assert_eq!(LanguageSettings::normalize_tag("en_us"), Some("en-US"));
        assert_eq!(LanguageSettings::normalize_tag(" ja-jp "), Some("ja-JP"));
        assert_eq!(LanguageSettings::normalize_tag("fr-FR"), None);
        assert!(SUPPORTED_LANGUAGES.contains(&LanguageSettings::default().language.as_str()));
    }
}
