use std::path::{Path, PathBuf};

use chrono::Local;

use crate::filters::{filter_tasks, TaskFilter};
use crate::models::{
    LanguageSettings, NotificationSettings, Task, TaskDraft, ThemeSettings, DEFAULT_LANGUAGE,
};
use crate::reminders::{reminder_view, week_start_for_language, ReminderMode, ReminderView};
use crate::state::{StoreError, TaskStore};
use crate::statistics::{statistics, Statistics, TimeRange};
use crate::storage::{read_import, write_export, Storage, StorageError, TaskRepository};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Transient, user-visible message (a toast in the UI).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub title: String,
    pub description: Option<String>,
    pub destructive: bool,
}

impl Notice {
    fn info(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            destructive: false,
        }
    }

    fn destructive(title: &str) -> Self {
        Self {
            destructive: true,
            ..Self::info(title)
        }
    }

    fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// What the presentation layer provides to the commands.
pub trait CommandCtx {
    fn data_dir(&self) -> Result<PathBuf, StorageError>;
    fn notify(&self, notice: Notice);
    /// Asks the platform for permission to show notifications.
    fn request_notification_permission(&self) -> Result<bool, String>;
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub tasks: Vec<Task>,
    pub theme: ThemeSettings,
    pub notifications: NotificationSettings,
    pub language: LanguageSettings,
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    log::warn!("command failed: {message}");
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn store_err<T>(error: StoreError) -> CommandResult<T> {
    match error {
        StoreError::Validation(error) => err(&format!("invalid task: {error}")),
        StoreError::Storage(error) => err(&format!("storage error: {error}")),
    }
}

fn storage(ctx: &impl CommandCtx) -> Result<Storage, StorageError> {
    let storage = Storage::new(ctx.data_dir()?);
    storage.ensure_dirs()?;
    Ok(storage)
}

/// Opens the file-backed store in the context's data directory.
pub fn open_store(ctx: &impl CommandCtx) -> Result<TaskStore<Storage>, StoreError> {
    TaskStore::open(storage(ctx)?)
}

pub fn load_state<R: TaskRepository>(
    ctx: &impl CommandCtx,
    store: &TaskStore<R>,
) -> CommandResult<AppSnapshot> {
    let storage = match storage(ctx) {
        Ok(storage) => storage,
        Err(error) => return err(&format!("storage error: {error}")),
    };
    // A damaged settings record must not lock the user out of their tasks.
    let theme = storage.load_theme().unwrap_or_else(|error| {
        log::warn!("theme record unreadable, using defaults: {error}");
        ThemeSettings::default()
    });
    let notifications = storage.load_notifications().unwrap_or_else(|error| {
        log::warn!("notification record unreadable, using defaults: {error}");
        NotificationSettings::default()
    });
    let language = storage.load_language().unwrap_or_else(|error| {
        log::warn!("language record unreadable, using defaults: {error}");
        LanguageSettings::default()
    });
    ok(AppSnapshot {
        tasks: store.tasks(),
        theme,
        notifications,
        language,
    })
}

pub fn create_task<R: TaskRepository>(store: &TaskStore<R>, draft: TaskDraft) -> CommandResult<Task> {
    match store.add(draft) {
        Ok(task) => ok(task),
        Err(error) => store_err(error),
    }
}

pub fn update_task<R: TaskRepository>(
    store: &TaskStore<R>,
    task_id: &str,
    draft: TaskDraft,
) -> CommandResult<Option<Task>> {
    match store.update(task_id, draft) {
        Ok(task) => ok(task),
        Err(error) => store_err(error),
    }
}

pub fn delete_task<R: TaskRepository>(store: &TaskStore<R>, task_id: &str) -> CommandResult<bool> {
    match store.delete(task_id) {
        Ok(removed) => ok(removed),
        Err(error) => store_err(error),
    }
}

pub fn toggle_task<R: TaskRepository>(
    store: &TaskStore<R>,
    task_id: &str,
) -> CommandResult<Option<Task>> {
    match store.toggle_completion(task_id) {
        Ok(task) => ok(task),
        Err(error) => store_err(error),
    }
}

pub fn clear_tasks<R: TaskRepository>(store: &TaskStore<R>) -> CommandResult<bool> {
    match store.clear_all() {
        Ok(()) => ok(true),
        Err(error) => store_err(error),
    }
}

/// Replaces every task with the contents of an exported file. Nothing changes
/// unless the whole file parses and validates.
pub fn import_tasks<R: TaskRepository>(
    ctx: &impl CommandCtx,
    store: &TaskStore<R>,
    path: &Path,
) -> CommandResult<usize> {
    let outcome = read_import(path)
        .map_err(|error| format!("import error: {error}"))
        .and_then(|tasks| {
            store.import_tasks(tasks).map_err(|error| match error {
                StoreError::Validation(error) => format!("import rejected: {error}"),
                StoreError::Storage(error) => format!("storage error: {error}"),
            })
        });
    match outcome {
        Ok(count) => {
            ctx.notify(Notice::info("Import succeeded"));
            ok(count)
        }
        Err(message) => {
            ctx.notify(Notice::destructive("Import failed"));
            err(&message)
        }
    }
}

/// Writes the task array to `target`, or to a dated file under the data
/// directory's `exports/`. Returns the written path.
pub fn export_tasks<R: TaskRepository>(
    ctx: &impl CommandCtx,
    store: &TaskStore<R>,
    target: Option<PathBuf>,
) -> CommandResult<String> {
    let path = match target {
        Some(path) => path,
        None => match ctx.data_dir() {
            Ok(root) => Storage::new(root).default_export_path(Local::now().date_naive()),
            Err(error) => return err(&format!("data dir error: {error}")),
        },
    };
    if let Err(error) = write_export(&path, &store.snapshot()) {
        return err(&format!("export error: {error}"));
    }
    log::info!("tasks exported path={}", path.display());
    ok(path.to_string_lossy().to_string())
}

pub fn list_tasks<R: TaskRepository>(
    store: &TaskStore<R>,
    filter: &TaskFilter,
) -> CommandResult<Vec<Task>> {
    ok(filter_tasks(&store.snapshot(), filter))
}

pub fn list_reminders<R: TaskRepository>(
    ctx: &impl CommandCtx,
    store: &TaskStore<R>,
    mode: ReminderMode,
) -> CommandResult<ReminderView> {
    let language = storage(ctx)
        .and_then(|storage| storage.load_language())
        .map(|settings| settings.language)
        .unwrap_or_else(|error| {
            log::warn!("language record unreadable, using {DEFAULT_LANGUAGE}: {error}");
            DEFAULT_LANGUAGE.to_string()
        });
    let week_start = week_start_for_language(&language);
    ok(reminder_view(&store.snapshot(), &Local::now(), mode, week_start))
}

pub fn get_statistics<R: TaskRepository>(
    store: &TaskStore<R>,
    range: TimeRange,
) -> CommandResult<Statistics> {
    ok(statistics(&store.snapshot(), &Local::now(), range))
}

pub fn update_theme(ctx: &impl CommandCtx, theme: ThemeSettings) -> CommandResult<ThemeSettings> {
    let theme = theme.normalized();
    let saved = storage(ctx).and_then(|storage| storage.save_theme(&theme));
    if let Err(error) = saved {
        return err(&format!("storage error: {error}"));
    }
    ok(theme)
}

pub fn update_language(ctx: &impl CommandCtx, language: &str) -> CommandResult<LanguageSettings> {
    let normalized = LanguageSettings::normalize_tag(language).unwrap_or_else(|| {
        log::debug!("unsupported language `{language}`, falling back to {DEFAULT_LANGUAGE}");
        DEFAULT_LANGUAGE
    });
    let settings = LanguageSettings {
        language: normalized.to_string(),
    };
    let saved = storage(ctx).and_then(|storage| storage.save_language(&settings));
    if let Err(error) = saved {
        return err(&format!("storage error: {error}"));
    }
    ctx.notify(Notice::info("Language changed"));
    ok(settings)
}

/// Enabling asks for permission first; a refusal or a failing prompt stores
/// the disabled state and reports it as a destructive notice.
pub fn set_notifications_enabled(
    ctx: &impl CommandCtx,
    enabled: bool,
) -> CommandResult<NotificationSettings> {
    let (settings, notice) = if enabled {
        match ctx.request_notification_permission() {
            Ok(true) => (
                NotificationSettings { is_enabled: true },
                Notice::info("Notifications enabled"),
            ),
            Ok(false) => (
                NotificationSettings { is_enabled: false },
                Notice::destructive("Notifications disabled"),
            ),
            Err(error) => {
                log::warn!("notification permission request failed: {error}");
                (
                    NotificationSettings { is_enabled: false },
                    Notice::destructive("Notifications disabled"),
                )
            }
        }
    } else {
        (
            NotificationSettings { is_enabled: false },
            Notice::info("Notifications disabled"),
        )
    };

    let saved = storage(ctx).and_then(|storage| storage.save_notifications(&settings));
    if let Err(error) = saved {
        return err(&format!("storage error: {error}"));
    }
    ctx.notify(notice.with_description("Reload to apply the change"));
    ok(settings)
}
