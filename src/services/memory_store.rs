use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::errors::{StoreError, StoreResult};
use crate::models::{normalize_email, Task, User};
use crate::read_models::Page;
use super::store::{sort_tasks, sort_users, RecordStore, TaskFilter, UserFilter};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tasks: HashMap<Uuid, Task>,
}

impl Tables {
    fn email_taken_by_other(&self, email: &str, id: Uuid) -> bool {
        self.users.values().any(|u| u.email == email && u.id != id)
    }
}

/// In-process store for tests and `store.backend = "memory"` runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().filter(|u| filter.matches(u)).cloned().collect();
        sort_users(&mut users);
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, mut user: User) -> StoreResult<User> {
        user.email = normalize_email(&user.email);
        let mut tables = self.tables.write().await;
        if tables.email_taken_by_other(&user.email, user.id) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<User> {
        user.email = normalize_email(&user.email);
        let mut tables = self.tables.write().await;
        if tables.email_taken_by_other(&user.email, user.id) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn find_tasks(&self, filter: &TaskFilter, page: Option<Page>) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables.tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        sort_tasks(&mut tasks);
        Ok(match page {
            Some(page) => page.slice(tasks),
            None => tasks,
        })
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        self.tables.write().await.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, task: Task) -> StoreResult<Task> {
        self.tables.write().await.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use crate::authorization::TaskVisibility;
    use crate::models::{Role, TaskPriority, TaskStatus};

    fn user(email: &str, role: Role) -> User {
        User::new("name".into(), email, "hash".into(), role, Utc::now())
    }

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let store = MemoryStore::new();
        store.create_user(user("Alice@X.com", Role::User)).await.unwrap();
        let err = store.create_user(user("alice@x.com ", Role::User)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
        assert!(store.find_user_by_email("ALICE@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let store = MemoryStore::new();
        store.create_user(user("a@x.com", Role::User)).await.unwrap();
        let mut b = store.create_user(user("b@x.com", Role::User)).await.unwrap();
        b.email = "A@x.com".into();
        assert!(store.update_user(b.clone()).await.is_err());
        // Re-saving with its own email is fine.
        b.email = "b@x.com".into();
        assert!(store.update_user(b).await.is_ok());
    }

    #[tokio::test]
    async fn find_tasks_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let t0 = Utc::now();
        for i in 0..5 {
            let mut task = Task::new(
                format!("task {}", i),
                String::new(),
                TaskPriority::Medium,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                if i % 2 == 0 { owner } else { Uuid::new_v4() },
                Uuid::new_v4(),
                t0 + Duration::seconds(i),
            );
            if i == 4 {
                task.status = TaskStatus::InProgress;
            }
            store.create_task(task).await.unwrap();
        }

        let filter = TaskFilter::new(TaskVisibility::AssignedTo(owner));
        assert_eq!(store.count_tasks(&filter).await.unwrap(), 3);
        let titles: Vec<String> = store
            .find_tasks(&filter, Some(Page { page: 1, limit: 2 }))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["task 4", "task 2"]);

        let todo_only = filter.clone().status(Some(TaskStatus::Todo));
        assert_eq!(store.count_tasks(&todo_only).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn search_never_widens_visibility() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let due = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        for assignee in [alice, carol] {
            let task = Task::new("Ship report".into(), String::new(), TaskPriority::High, due, assignee, Uuid::new_v4(), Utc::now());
            store.create_task(task).await.unwrap();
        }
        let filter = TaskFilter::new(TaskVisibility::AssignedTo(alice)).search(Some("SHIP".into()));
        let found = store.find_tasks(&filter, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].assigned_to, alice);
    }
}
