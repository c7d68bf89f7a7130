use std::sync::Arc;

use crate::models::Task;

/// Shared, immutable view of the task collection at one instant.
pub type Snapshot = Arc<Vec<Task>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    Toggled,
    Cleared,
    Imported,
}

#[derive(Debug, Clone)]
pub struct StateUpdated {
    pub kind: ChangeKind,
    pub tasks: Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub type Subscriber = Arc<dyn Fn(&StateUpdated) + Send + Sync>;
