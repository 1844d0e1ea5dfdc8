//! Record store abstraction.
//!
//! Stores provide atomic single-document reads and writes and nothing
//! more; concurrent writers to the same task are last-writer-wins.

use std::future::Future;
use uuid::Uuid;
use crate::authorization::{TaskVisibility, UserVisibility};
use crate::errors::StoreResult;
use crate::models::{Role, Task, TaskPriority, TaskStatus, User};
use crate::read_models::Page;

/// Query over tasks. The visibility predicate is always part of the filter,
/// so search terms can only narrow the caller's visible set.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub visibility: TaskVisibility,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    search: Option<String>,
}

impl TaskFilter {
    pub fn new(visibility: TaskVisibility) -> Self {
        Self {
            visibility,
            status: None,
            priority: None,
            assigned_to: None,
            search: None,
        }
    }

    pub fn all() -> Self {
        Self::new(TaskVisibility::All)
    }

    pub fn status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: Option<TaskPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn assigned_to(mut self, assigned_to: Option<Uuid>) -> Self {
        self.assigned_to = assigned_to;
        self
    }

    /// Case-insensitive substring match on title or description.
    pub fn search(mut self, term: Option<String>) -> Self {
        self.search = term
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.visibility.permits(task) {
            return false;
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.assigned_to.is_some_and(|id| id != task.assigned_to) {
            return false;
        }
        match &self.search {
            Some(term) => {
                task.title.to_lowercase().contains(term)
                    || task.description.to_lowercase().contains(term)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserFilter {
    pub visibility: UserVisibility,
    pub role: Option<Role>,
    search: Option<String>,
}

impl UserFilter {
    pub fn new(visibility: UserVisibility) -> Self {
        Self {
            visibility,
            role: None,
            search: None,
        }
    }

    pub fn all() -> Self {
        Self::new(UserVisibility::All)
    }

    pub fn role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    /// Case-insensitive substring match on name or email.
    pub fn search(mut self, term: Option<String>) -> Self {
        self.search = term
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        if !self.visibility.permits(user) {
            return false;
        }
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        match &self.search {
            Some(term) => user.name.to_lowercase().contains(term) || user.email.contains(term),
            None => true,
        }
    }
}

/// Newest first, the order every list endpoint returns.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

pub fn sort_users(users: &mut [User]) {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

pub trait RecordStore: Clone + Send + Sync + 'static {
    fn find_users(&self, filter: &UserFilter) -> impl Future<Output = StoreResult<Vec<User>>> + Send;
    fn find_user(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    fn find_user_by_email(&self, email: &str) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    /// Fails with `StoreError::DuplicateEmail` if the email is taken.
    fn create_user(&self, user: User) -> impl Future<Output = StoreResult<User>> + Send;
    /// Fails with `StoreError::DuplicateEmail` if the new email belongs to another account.
    fn update_user(&self, user: User) -> impl Future<Output = StoreResult<User>> + Send;
    /// Returns whether a record was removed.
    fn delete_user(&self, id: Uuid) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Matching tasks, newest first, optionally windowed.
    fn find_tasks(
        &self,
        filter: &TaskFilter,
        page: Option<Page>,
    ) -> impl Future<Output = StoreResult<Vec<Task>>> + Send;
    fn count_tasks(&self, filter: &TaskFilter) -> impl Future<Output = StoreResult<u64>> + Send;
    fn find_task(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Task>>> + Send;
    fn create_task(&self, task: Task) -> impl Future<Output = StoreResult<Task>> + Send;
    fn update_task(&self, task: Task) -> impl Future<Output = StoreResult<Task>> + Send;
    fn delete_task(&self, id: Uuid) -> impl Future<Output = StoreResult<bool>> + Send;
}
