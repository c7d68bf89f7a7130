//! Task store, persistence and derived views for a personal task planner.
//!
//! The presentation layer talks to [`commands`]; everything below it is plain
//! data plus the [`TaskStore`] that owns the collection.

pub mod commands;
pub mod config;
pub mod events;
pub mod filters;
pub mod logging;
pub mod models;
pub mod reminders;
pub mod state;
pub mod statistics;
pub mod storage;

pub use events::{ChangeKind, Snapshot, StateUpdated, SubscriptionId};
pub use filters::{filter_tasks, StatusFilter, TaskFilter};
pub use models::{
    Category, LanguageSettings, NotificationSettings, Priority, Task, TaskDraft, ThemeMode,
    ThemeSettings,
};
pub use reminders::{reminder_view, ReminderMode, ReminderView};
pub use state::{StoreError, TaskStore, ValidationError};
pub use statistics::{statistics, Statistics, TimeRange};
pub use storage::{MemoryRepository, Storage, StorageError, TaskRepository};
