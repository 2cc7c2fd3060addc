use anyhow::Result;
use uuid::Uuid;

use crate::config::Backend;
use crate::model::task::{NewTask, Task, TaskUpdate};

/// The persistence contract shared by every backend.
///
/// Reads are served from memory. Each mutating call is persisted before it
/// returns, so a successful call is visible to the next read and a failed
/// one leaves the stored state as it was. Not-found is reported through the
/// `bool`/`Option` results, never as an error.
pub trait TaskStore {
    fn kind(&self) -> Backend;

    /// Persists a new task under a fresh id, disambiguating its title if
    /// another stored task already uses it.
    fn create(&mut self, new: NewTask) -> Result<Task>;

    /// All tasks in storage order.
    fn read_all(&self) -> &[Task];

    fn get(&self, id: &Uuid) -> Option<&Task>;

    /// Returns `false` when no task has `id`. A supplied title is resolved
    /// against every other task, so re-submitting the current title keeps it.
    fn update(&mut self, id: &Uuid, changes: TaskUpdate) -> Result<bool>;

    fn delete(&mut self, id: &Uuid) -> Result<bool>;

    fn mark_completed(&mut self, id: &Uuid, completed: bool) -> Result<bool>;

    /// Releases the backend's resources.
    fn close(self: Box<Self>) -> Result<()>;

    fn count(&self) -> usize {
        self.read_all().len()
    }

    fn completed_count(&self) -> usize {
        self.read_all().iter().filter(|t| t.completed).count()
    }

    fn active_count(&self) -> usize {
        self.count() - self.completed_count()
    }
}
