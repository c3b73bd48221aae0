//! Task list store.
//!
//! # Responsibility
//! - Own the ordered task sequence.
//! - Persist the full sequence under one durable key after every mutation.
//! - Expose pending/completed projections computed on each access.
//!
//! # Invariants
//! - Insertion order is preserved; new tasks are appended.
//! - No two tasks share an id, including after rehydration.
//! - Malformed persisted data rehydrates to an empty list with a warning.
//!   The malformed bytes stay in place until the next write-through.
//! - A list whose key could not be read is never written back: memory was
//!   not loaded from storage, so it must not replace what storage holds.

use super::{Outcome, StoreWarning};
use crate::kv::{KvStore, PersistentSlot, SlotError};
use crate::model::task::{Task, TaskId};
use log::{info, warn};
use std::collections::HashSet;

/// Durable key holding the JSON-encoded task array.
pub const TASK_LIST_KEY: &str = "todos";

/// Write-through store for the task list.
pub struct TaskListStore<S: KvStore> {
    slot: PersistentSlot<S, Vec<Task>>,
    tasks: Vec<Task>,
    /// Set when the last rehydration could not read the key.
    unread: bool,
}

impl<S: KvStore> TaskListStore<S> {
    /// Creates an empty store without touching durable storage.
    pub fn new(kv: S) -> Self {
        Self {
            slot: PersistentSlot::new(kv, TASK_LIST_KEY),
            tasks: Vec::new(),
            unread: false,
        }
    }

    /// Creates a store and rehydrates it from durable storage.
    pub fn open(kv: S) -> Outcome<Self> {
        let mut store = Self::new(kv);
        let warnings = store.initialize().warnings;
        Outcome::with_warnings(store, warnings)
    }

    /// Replaces the in-memory list with the persisted one.
    ///
    /// Returns the number of tasks loaded. When the key cannot be read the
    /// list starts empty and write-through is suspended until a later
    /// `initialize` succeeds.
    pub fn initialize(&mut self) -> Outcome<usize> {
        let mut warnings = Vec::new();
        self.unread = false;

        self.tasks = match self.slot.load() {
            Ok(Some(tasks)) => dedupe_ids(tasks, &mut warnings),
            Ok(None) => Vec::new(),
            Err(err) => {
                self.unread = matches!(err, SlotError::Kv(_));
                let warning = StoreWarning::from_slot(TASK_LIST_KEY, err, false);
                warn!(
                    "event=tasks_init module=store status=degraded error_code={} error={warning}",
                    warning.code()
                );
                warnings.push(warning);
                Vec::new()
            }
        };

        info!(
            "event=tasks_init module=store status=ok count={}",
            self.tasks.len()
        );
        Outcome::with_warnings(self.tasks.len(), warnings)
    }

    /// Appends a new pending task and writes the list through.
    pub fn add_task(&mut self, description: impl Into<String>) -> Outcome<TaskId> {
        let task = Task::new(description);
        let id = task.id.clone();
        self.tasks.push(task);

        let warnings = self.write_through("task_add");
        Outcome::with_warnings(id, warnings)
    }

    /// Flips `completed` on the first task with `id`.
    ///
    /// Returns `false` and writes nothing when the id is unknown.
    pub fn toggle_task(&mut self, id: &TaskId) -> Outcome<bool> {
        let Some(task) = self.tasks.iter_mut().find(|task| &task.id == id) else {
            info!("event=task_toggle module=store status=noop reason=not_found");
            return Outcome::clean(false);
        };
        task.toggle();

        let warnings = self.write_through("task_toggle");
        Outcome::with_warnings(true, warnings)
    }

    /// Drops every task with `id` and writes the list through.
    ///
    /// Returns whether anything was removed. The write happens either way.
    pub fn remove_task(&mut self, id: &TaskId) -> Outcome<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|task| &task.id != id);
        let removed = self.tasks.len() != before;

        let warnings = self.write_through("task_remove");
        Outcome::with_warnings(removed, warnings)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks not yet completed, in list order.
    pub fn pending(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(|task| !task.completed)
    }

    /// Completed tasks, in list order.
    pub fn completed(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(|task| task.completed)
    }

    /// Whether mutations are currently being persisted.
    pub fn is_writable(&self) -> bool {
        !self.unread
    }

    fn write_through(&self, event: &str) -> Vec<StoreWarning> {
        if self.unread {
            warn!("event={event} module=store status=degraded error_code=write_skipped");
            return vec![StoreWarning::WriteSkipped { key: TASK_LIST_KEY }];
        }
        match self.slot.save(&self.tasks) {
            Ok(()) => {
                info!(
                    "event={event} module=store status=ok count={}",
                    self.tasks.len()
                );
                Vec::new()
            }
            Err(err) => {
                let warning = StoreWarning::from_slot(TASK_LIST_KEY, err, true);
                warn!(
                    "event={event} module=store status=degraded error_code={} error={warning}",
                    warning.code()
                );
                vec![warning]
            }
        }
    }
}

fn dedupe_ids(tasks: Vec<Task>, warnings: &mut Vec<StoreWarning>) -> Vec<Task> {
    let total = tasks.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Task> = tasks
        .into_iter()
        .filter(|task| seen.insert(task.id.clone()))
        .collect();

    let dropped = total - unique.len();
    if dropped > 0 {
        warn!("event=tasks_init module=store status=degraded error_code=duplicate_id dropped={dropped}");
        warnings.push(StoreWarning::CorruptData {
            key: TASK_LIST_KEY,
            detail: format!("dropped {dropped} task(s) with duplicate ids"),
        });
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::{TaskListStore, TASK_LIST_KEY};
    use crate::kv::{KvStore, MemoryKvStore};
    use crate::model::task::TaskId;

    #[test]
    fn toggle_unknown_id_does_not_write() {
        let kv = MemoryKvStore::new();
        let mut store = TaskListStore::new(&kv);

        let found = store.toggle_task(&TaskId::from("missing")).into_value();

        assert!(!found);
        assert_eq!(kv.read(TASK_LIST_KEY).unwrap(), None);
    }

    #[test]
    fn remove_unknown_id_still_writes_through() {
        let kv = MemoryKvStore::new();
        let mut store = TaskListStore::new(&kv);

        let removed = store.remove_task(&TaskId::from("missing")).into_value();

        assert!(!removed);
        assert_eq!(kv.read(TASK_LIST_KEY).unwrap().as_deref(), Some("[]"));
    }
}
