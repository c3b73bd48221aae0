//! Task record model.
//!
//! # Invariants
//! - `id` is unique within one task list.
//! - New tasks start with `completed = false`.
//! - Wire field names are `id`, `task`, `completed`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque task identifier.
///
/// Stored as a plain string so ids minted by older clients (short random
/// tokens) keep loading unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Mints a fresh id. Collisions are not checked.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Free-form description, serialized as `task`.
    #[serde(rename = "task")]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Creates a pending task with a generated id.
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_id(TaskId::generate(), description)
    }

    /// Creates a pending task with a caller-provided id.
    pub fn with_id(id: impl Into<TaskId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            completed: false,
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}
