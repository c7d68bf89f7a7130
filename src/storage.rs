use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    LanguageSettings, NotificationSettings, Task, TasksFile, ThemeSettings,
};

pub const TASKS_RECORD: &str = "task-storage";
pub const THEME_RECORD: &str = "theme-storage";
pub const NOTIFICATION_RECORD: &str = "notification-storage";
pub const LANGUAGE_RECORD: &str = "language-storage";
const RECORD_EXTENSION: &str = "json";
const EXPORT_DIR: &str = "exports";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Load/save seam between the task store and whatever keeps the tasks durable.
pub trait TaskRepository {
    /// Returns the persisted collection, or an empty one when nothing was saved yet.
    fn load(&self) -> Result<Vec<Task>, StorageError>;
    fn save(&self, tasks: &[Task]) -> Result<(), StorageError>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for Arc<R> {
    fn load(&self) -> Result<Vec<Task>, StorageError> {
        (**self).load()
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        (**self).save(tasks)
    }
}

/// One JSON file per logical record name inside a data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(name).with_extension(RECORD_EXTENSION)
    }

    /// Reads a named record. A record that was never written is `Ok(None)`.
    pub fn load_record<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        match load_json(&self.record_path(name)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    pub fn save_record<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StorageError> {
        write_atomic(&self.record_path(name), data)
    }

    pub fn load_theme(&self) -> Result<ThemeSettings, StorageError> {
        Ok(self.load_record(THEME_RECORD)?.unwrap_or_default())
    }

    pub fn save_theme(&self, theme: &ThemeSettings) -> Result<(), StorageError> {
        self.save_record(THEME_RECORD, theme)
    }

    pub fn load_notifications(&self) -> Result<NotificationSettings, StorageError> {
        Ok(self.load_record(NOTIFICATION_RECORD)?.unwrap_or_default())
    }

    pub fn save_notifications(&self, data: &NotificationSettings) -> Result<(), StorageError> {
        self.save_record(NOTIFICATION_RECORD, data)
    }

    pub fn load_language(&self) -> Result<LanguageSettings, StorageError> {
        Ok(self.load_record(LANGUAGE_RECORD)?.unwrap_or_default())
    }

    pub fn save_language(&self, data: &LanguageSettings) -> Result<(), StorageError> {
        self.save_record(LANGUAGE_RECORD, data)
    }

    pub fn default_export_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(EXPORT_DIR).join(export_file_name(date))
    }
}

impl TaskRepository for Storage {
    fn load(&self) -> Result<Vec<Task>, StorageError> {
        Ok(self
            .load_record::<TasksFile>(TASKS_RECORD)?
            .map(|file| file.tasks)
            .unwrap_or_default())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        self.ensure_dirs()?;
        self.save_record(TASKS_RECORD, &TasksFile::new(tasks.to_vec()))
    }
}

/// In-process repository. Used as a test double and by embedders that keep
/// tasks elsewhere.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tasks: Mutex<Vec<Task>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryRepository {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes every following `save` fail with an io error until reset.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl TaskRepository for MemoryRepository {
    fn load(&self) -> Result<Vec<Task>, StorageError> {
        Ok(self.stored())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("storage quota exceeded")));
        }
        *self.tasks.lock() = tasks.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("todo-list-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Writes the bare task array, the same shape as the persisted `tasks` field.
pub fn write_export(path: &Path, tasks: &[Task]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_atomic(path, &tasks)
}

pub fn read_import(path: &Path) -> Result<Vec<Task>, StorageError> {
    load_json(path)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let mut file = File::open(path)?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

fn write_atomic<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    let json = serde_json::to_vec_pretty(data)?;
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(temp_path, path)?;
    Ok(())
}
