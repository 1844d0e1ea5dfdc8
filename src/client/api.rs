use std::future::Future;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;
use crate::config::ClientConfig;
use crate::models::{ApiResponse, Role, TaskPriority, TaskStatus, TaskView, UserProfile};
use crate::read_models::{PageInfo, TaskStats, UserStats};
use super::session::Session;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            s if s.is_client_error() => ClientError::Validation(message),
            _ => ClientError::Server(message),
        }
    }

    /// The session is no longer accepted and the caller should log in again.
    pub fn is_session_rejected(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

/// What the dashboards need from the server. `ApiClient` is the network
/// implementation.
pub trait TaskSource: Send + Sync {
    fn current_user(&self, session: &Session) -> impl Future<Output = Result<UserProfile, ClientError>> + Send;

    /// The list a role's dashboard shows: everything for admins, the
    /// assigned list otherwise.
    fn dashboard_tasks(&self, session: &Session) -> impl Future<Output = Result<Vec<TaskView>, ClientError>> + Send;

    fn change_status(
        &self,
        session: &Session,
        task_id: Uuid,
        status: TaskStatus,
    ) -> impl Future<Output = Result<TaskView, ClientError>> + Send;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct AuthBody {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize)]
struct UserBody {
    user: UserProfile,
}

#[derive(Deserialize)]
struct UsersBody {
    users: Vec<UserProfile>,
}

#[derive(Deserialize)]
struct ManagersBody {
    managers: Vec<UserProfile>,
}

#[derive(Deserialize)]
struct TaskBody {
    task: TaskView,
}

#[derive(Deserialize)]
struct TasksBody {
    tasks: Vec<TaskView>,
}

#[derive(Deserialize)]
struct StatsBody<T> {
    stats: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<TaskView>,
    pub pagination: PageInfo,
}

/// Query string for `GET /tasks`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: chrono::NaiveDate,
    pub assigned_to: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountDraft {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.bearer_auth(session.token())
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            let body: ApiResponse<T> = response.json().await?;
            return Ok(body.payload);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        tracing::debug!("Request failed with {}: {}", status, message);
        Err(ClientError::from_status(status, message))
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session, ClientError> {
        let builder = self
            .http
            .post(self.url("/auth/signup"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        let body: AuthBody = self.send(builder).await?;
        Ok(Session::new(body.token, body.user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let builder = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let body: AuthBody = self.send(builder).await?;
        tracing::info!("Logged in as {} ({})", body.user.email, body.user.role);
        Ok(Session::new(body.token, body.user))
    }

    pub async fn me(&self, session: &Session) -> Result<UserProfile, ClientError> {
        let builder = self.authed(self.http.get(self.url("/auth/me")), session);
        let body: UserBody = self.send(builder).await?;
        Ok(body.user)
    }

    pub async fn list_tasks(&self, session: &Session, query: &TaskQuery) -> Result<TaskPage, ClientError> {
        let builder = self.authed(self.http.get(self.url("/tasks")).query(query), session);
        self.send(builder).await
    }

    pub async fn assigned_tasks(&self, session: &Session) -> Result<Vec<TaskView>, ClientError> {
        let builder = self.authed(self.http.get(self.url("/tasks/assigned")), session);
        let body: TasksBody = self.send(builder).await?;
        Ok(body.tasks)
    }

    pub async fn task_stats(&self, session: &Session) -> Result<TaskStats, ClientError> {
        let builder = self.authed(self.http.get(self.url("/tasks/stats")), session);
        let body: StatsBody<TaskStats> = self.send(builder).await?;
        Ok(body.stats)
    }

    pub async fn create_task(&self, session: &Session, draft: &TaskDraft) -> Result<TaskView, ClientError> {
        let builder = self.authed(self.http.post(self.url("/tasks")).json(draft), session);
        let body: TaskBody = self.send(builder).await?;
        Ok(body.task)
    }

    pub async fn update_status(&self, session: &Session, task_id: Uuid, status: TaskStatus) -> Result<TaskView, ClientError> {
        let builder = self
            .http
            .patch(self.url(&format!("/tasks/{}/status", task_id)))
            .json(&json!({ "status": status }));
        let body: TaskBody = self.send(self.authed(builder, session)).await?;
        Ok(body.task)
    }

    pub async fn delete_task(&self, session: &Session, task_id: Uuid) -> Result<(), ClientError> {
        let builder = self.authed(self.http.delete(self.url(&format!("/tasks/{}", task_id))), session);
        self.send::<Value>(builder).await.map(|_| ())
    }

    pub async fn team(&self, session: &Session) -> Result<Vec<UserProfile>, ClientError> {
        let builder = self.authed(self.http.get(self.url("/users/team")), session);
        let body: UsersBody = self.send(builder).await?;
        Ok(body.users)
    }

    pub async fn admin_users(&self, session: &Session) -> Result<Vec<UserProfile>, ClientError> {
        let builder = self.authed(self.http.get(self.url("/admin/users")), session);
        let body: UsersBody = self.send(builder).await?;
        Ok(body.users)
    }

    pub async fn admin_managers(&self, session: &Session) -> Result<Vec<UserProfile>, ClientError> {
        let builder = self.authed(self.http.get(self.url("/admin/managers")), session);
        let body: ManagersBody = self.send(builder).await?;
        Ok(body.managers)
    }

    pub async fn admin_tasks(&self, session: &Session) -> Result<Vec<TaskView>, ClientError> {
        let builder = self.authed(self.http.get(self.url("/admin/tasks")), session);
        let body: TasksBody = self.send(builder).await?;
        Ok(body.tasks)
    }

    pub async fn admin_stats(&self, session: &Session) -> Result<UserStats, ClientError> {
        let builder = self.authed(self.http.get(self.url("/admin/stats")), session);
        let body: StatsBody<UserStats> = self.send(builder).await?;
        Ok(body.stats)
    }

    pub async fn create_user(&self, session: &Session, draft: &AccountDraft) -> Result<UserProfile, ClientError> {
        let builder = self.authed(self.http.post(self.url("/admin/create-user")).json(draft), session);
        let body: UserBody = self.send(builder).await?;
        Ok(body.user)
    }

    pub async fn delete_user(&self, session: &Session, user_id: Uuid) -> Result<(), ClientError> {
        let builder = self.authed(self.http.delete(self.url(&format!("/admin/users/{}", user_id))), session);
        self.send::<Value>(builder).await.map(|_| ())
    }

    /// Everything the admin console shows, fetched concurrently.
    pub async fn admin_overview(
        &self,
        session: &Session,
    ) -> Result<(Vec<UserProfile>, Vec<UserProfile>, Vec<TaskView>), ClientError> {
        futures::try_join!(
            self.admin_users(session),
            self.admin_managers(session),
            self.admin_tasks(session)
        )
    }
}

impl TaskSource for ApiClient {
    async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError> {
        self.me(session).await
    }

    async fn dashboard_tasks(&self, session: &Session) -> Result<Vec<TaskView>, ClientError> {
        match session.role() {
            Role::Admin => self.admin_tasks(session).await,
            Role::Manager | Role::User => self.assigned_tasks(session).await,
        }
    }

    async fn change_status(&self, session: &Session, task_id: Uuid, status: TaskStatus) -> Result<TaskView, ClientError> {
        self.update_status(session, task_id, status).await
    }
}
