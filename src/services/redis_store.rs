use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use crate::errors::{StoreError, StoreResult};
use crate::models::{normalize_email, Task, User};
use crate::read_models::Page;
use super::store::{sort_tasks, sort_users, RecordStore, TaskFilter, UserFilter};

const USER_IDS: &str = "users";
const TASK_IDS: &str = "tasks";

fn user_key(id: Uuid) -> String {
    format!("user:{}", id)
}

fn task_key(id: Uuid) -> String {
    format!("task:{}", id)
}

fn email_key(email: &str) -> String {
    format!("user_email:{}", normalize_email(email))
}

/// Documents are JSON strings under `user:{id}` / `task:{id}`, enumerated
/// through the `users` / `tasks` id sets. `user_email:{email}` holds the
/// owning id and is claimed with SET NX to keep emails unique.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(client: Client) -> StoreResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    async fn get_doc<T: DeserializeOwned>(&self, key: String) -> StoreResult<Option<T>> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(key).await?;
        data.map(|d| serde_json::from_str(&d)).transpose().map_err(StoreError::from)
    }

    async fn put_doc<T: Serialize>(&self, key: String, doc: &T) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, serde_json::to_string(doc)?).await?;
        Ok(())
    }

    // Loads every document whose id is in `set`. Ids whose document has gone
    // missing in between are skipped.
    async fn load_all<T: DeserializeOwned>(&self, set: &str, key: fn(Uuid) -> String) -> StoreResult<Vec<T>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(set).await?;
        let keys: Vec<String> = ids
            .iter()
            .filter_map(|id| Uuid::parse_str(id).ok())
            .map(key)
            .collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let docs: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;
        docs.into_iter()
            .flatten()
            .map(|d| serde_json::from_str(&d).map_err(StoreError::from))
            .collect()
    }

    async fn claim_email(&self, email: &str, id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let claimed: bool = conn.set_nx(email_key(email), id.to_string()).await?;
        if claimed {
            return Ok(());
        }
        // The slot may already be ours, e.g. when re-saving unchanged.
        let owner: Option<String> = conn.get(email_key(email)).await?;
        if owner.as_deref() == Some(id.to_string().as_str()) {
            Ok(())
        } else {
            Err(StoreError::DuplicateEmail(normalize_email(email)))
        }
    }
}

impl RecordStore for RedisStore {
    async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.load_all(USER_IDS, user_key).await?;
        users.retain(|u| filter.matches(u));
        sort_users(&mut users);
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.get_doc(user_key(id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.get(email_key(email)).await?;
        match id.and_then(|id| Uuid::parse_str(&id).ok()) {
            Some(id) => self.find_user(id).await,
            None => Ok(None),
        }
    }

    async fn create_user(&self, mut user: User) -> StoreResult<User> {
        user.email = normalize_email(&user.email);
        self.claim_email(&user.email, user.id).await?;
        self.put_doc(user_key(user.id), &user).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(USER_IDS, user.id.to_string()).await?;
        tracing::debug!("Stored user {}", user.id);
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<User> {
        user.email = normalize_email(&user.email);
        let previous: Option<User> = self.get_doc(user_key(user.id)).await?;
        self.claim_email(&user.email, user.id).await?;
        if let Some(previous) = previous.filter(|p| p.email != user.email) {
            let mut conn = self.conn.clone();
            conn.del::<_, ()>(email_key(&previous.email)).await?;
        }
        self.put_doc(user_key(user.id), &user).await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(false);
        };
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(vec![user_key(id), email_key(&user.email)]).await?;
        conn.srem::<_, _, ()>(USER_IDS, id.to_string()).await?;
        Ok(true)
    }

    async fn find_tasks(&self, filter: &TaskFilter, page: Option<Page>) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.load_all(TASK_IDS, task_key).await?;
        tasks.retain(|t| filter.matches(t));
        sort_tasks(&mut tasks);
        Ok(match page {
            Some(page) => page.slice(tasks),
            None => tasks,
        })
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let tasks: Vec<Task> = self.load_all(TASK_IDS, task_key).await?;
        Ok(tasks.iter().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.get_doc(task_key(id)).await
    }

    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        self.put_doc(task_key(task.id), &task).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(TASK_IDS, task.id.to_string()).await?;
        tracing::debug!("Stored task {}", task.id);
        Ok(task)
    }

    async fn update_task(&self, task: Task) -> StoreResult<Task> {
        self.put_doc(task_key(task.id), &task).await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(task_key(id)).await?;
        conn.srem::<_, _, ()>(TASK_IDS, id.to_string()).await?;
        Ok(removed > 0)
    }
}
