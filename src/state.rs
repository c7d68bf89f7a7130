use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::events::{ChangeKind, Snapshot, StateUpdated, Subscriber, SubscriptionId};
use crate::models::{Task, TaskDraft};
use crate::storage::{StorageError, TaskRepository};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("imported task #{index} has an empty id")]
    EmptyId { index: usize },
    #[error("imported task id `{id}` appears more than once")]
    DuplicateId { id: String },
    #[error("imported task `{id}` has an empty title")]
    EmptyImportTitle { id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Single source of truth for tasks.
///
/// Every effective mutation builds the next collection, saves it through the
/// repository and only then swaps it in, so a failed save leaves the store
/// exactly as it was. Subscribers run after the lock is released.
pub struct TaskStore<R: TaskRepository> {
    inner: Arc<StoreInner<R>>,
}

impl<R: TaskRepository> Clone for TaskStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<R> {
    repo: R,
    tasks: Mutex<Snapshot>,
    subscribers: Mutex<Subscribers>,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Subscriber)>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Opens the store over whatever the repository currently holds.
    pub fn open(repo: R) -> Result<Self, StoreError> {
        let tasks = repo.load()?;
        log::debug!("task store opened count={}", tasks.len());
        Ok(Self {
            inner: Arc::new(StoreInner {
                repo,
                tasks: Mutex::new(Arc::new(tasks)),
                subscribers: Mutex::new(Subscribers::default()),
            }),
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.inner.tasks.lock())
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.snapshot().as_ref().clone()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.snapshot().iter().find(|task| task.id == id).cloned()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateUpdated) + Send + Sync + 'static,
    {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        let callback: Subscriber = Arc::new(callback);
        subscribers.entries.push((id, callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.entries.len();
        subscribers.entries.retain(|(entry_id, _)| *entry_id != id);
        subscribers.entries.len() != before
    }

    pub fn add(&self, draft: TaskDraft) -> Result<Task, StoreError> {
        validate_title(&draft.title)?;
        let task = Task::from_draft(fresh_id(&self.snapshot()), draft, Utc::now());
        let appended = task.clone();
        self.apply(ChangeKind::Added, move |tasks| {
            tasks.push(appended);
            Some(())
        })?;
        log::info!("task added id={}", task.id);
        Ok(task)
    }

    /// Replaces the editable fields of `id`. Unknown ids are a silent no-op.
    pub fn update(&self, id: &str, draft: TaskDraft) -> Result<Option<Task>, StoreError> {
        if self.snapshot().iter().all(|task| task.id != id) {
            log::debug!("update skipped, unknown task id={id}");
            return Ok(None);
        }
        validate_title(&draft.title)?;
        let updated = self.apply(ChangeKind::Updated, |tasks| {
            let task = tasks.iter_mut().find(|task| task.id == id)?;
            task.apply_draft(draft);
            Some(task.clone())
        })?;
        if updated.is_none() {
            log::debug!("update skipped, unknown task id={id}");
        }
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.apply(ChangeKind::Deleted, |tasks| {
            let index = tasks.iter().position(|task| task.id == id)?;
            Some(tasks.remove(index))
        })?;
        match &removed {
            Some(task) => log::info!("task deleted id={}", task.id),
            None => log::debug!("delete skipped, unknown task id={id}"),
        }
        Ok(removed.is_some())
    }

    pub fn toggle_completion(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let now = Utc::now();
        self.apply(ChangeKind::Toggled, |tasks| {
            let task = tasks.iter_mut().find(|task| task.id == id)?;
            task.set_completed(!task.completed, now);
            Some(task.clone())
        })
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.apply(ChangeKind::Cleared, |tasks| {
            tasks.clear();
            Some(())
        })?;
        log::info!("all tasks cleared");
        Ok(())
    }

    /// Replaces the whole collection. The batch is checked up front and
    /// rejected as a unit, so a bad record never lands partially.
    pub fn import_tasks(&self, imported: Vec<Task>) -> Result<usize, StoreError> {
        validate_batch(&imported)?;
        let count = imported.len();
        self.apply(ChangeKind::Imported, move |tasks| {
            *tasks = imported;
            Some(())
        })?;
        log::info!("tasks imported count={count}");
        Ok(count)
    }

    fn apply<T>(
        &self,
        kind: ChangeKind,
        mutate: impl FnOnce(&mut Vec<Task>) -> Option<T>,
    ) -> Result<Option<T>, StoreError> {
        let (snapshot, output) = {
            let mut current = self.inner.tasks.lock();
            let mut next = current.as_ref().clone();
            let Some(output) = mutate(&mut next) else {
                return Ok(None);
            };
            if let Err(error) = self.inner.repo.save(&next) {
                log::warn!("persist failed, change rolled back kind={kind:?} error={error}");
                return Err(error.into());
            }
            *current = Arc::new(next);
            (Arc::clone(&*current), output)
        };
        self.notify(StateUpdated {
            kind,
            tasks: snapshot,
        });
        Ok(Some(output))
    }

    fn notify(&self, event: StateUpdated) {
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            (*callback)(&event);
        }
    }
}

fn fresh_id(existing: &[Task]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if existing.iter().all(|task| task.id != id) {
            return id;
        }
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

pub fn validate_batch(tasks: &[Task]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(ValidationError::EmptyId { index });
        }
        if !seen.insert(task.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: task.id.clone(),
            });
        }
        if task.title.trim().is_empty() {
            return Err(ValidationError::EmptyImportTitle {
                id: task.id.clone(),
            });
        }
    }
    Ok(())
}
