use std::collections::HashMap;
use chrono::NaiveDate;
use uuid::Uuid;
use crate::models::{TaskStatus, TaskView};
use crate::read_models::TaskStats;
use super::api::{ClientError, TaskSource};
use super::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

/// Local state kept for a status change until the server answers.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub task_id: Uuid,
    pub requested: TaskStatus,
    previous: TaskStatus,
}

/// Everything a dashboard renders from. The list is replaced wholesale on
/// every fetch; stats are recomputed from it on demand.
#[derive(Debug, Default)]
pub struct DashboardState {
    tasks: Vec<TaskView>,
    loading: bool,
    banner: Option<Banner>,
    pending: HashMap<Uuid, PendingChange>,
    expired: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[TaskView] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn is_pending(&self, task_id: Uuid) -> bool {
        self.pending.contains_key(&task_id)
    }

    /// Set once the server rejected the session; the UI should send the
    /// user back to login.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn stats(&self, today: NaiveDate) -> TaskStats {
        TaskStats::from_views(&self.tasks, today)
    }

    fn record_failure(&mut self, context: &str, err: &ClientError) {
        if err.is_session_rejected() {
            self.expired = true;
        }
        self.banner = Some(Banner::Error(format!("{}: {}", context, err)));
    }

    // A fresh list from the server does not know about changes still in
    // flight; keep showing their requested status and remember what the
    // server had, for rollback.
    fn replace_tasks(&mut self, tasks: Vec<TaskView>) {
        self.tasks = tasks;
        for change in self.pending.values_mut() {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == change.task_id) {
                change.previous = task.status;
                task.status = change.requested;
            }
        }
    }

    /// User-initiated reload: shows the loading indicator.
    pub async fn refresh<T: TaskSource>(&mut self, source: &T, session: &Session) -> Result<(), ClientError> {
        self.loading = true;
        let result = source.dashboard_tasks(session).await;
        self.loading = false;

        match result {
            Ok(tasks) => {
                self.replace_tasks(tasks);
                if matches!(self.banner, Some(Banner::Error(_))) {
                    self.banner = None;
                }
                Ok(())
            }
            Err(e) => {
                self.record_failure("Failed to fetch tasks", &e);
                Err(e)
            }
        }
    }

    /// Result of a periodic reload. Never touches the loading flag or the
    /// banner. Returns whether polling should continue.
    pub fn apply_background(&mut self, result: Result<Vec<TaskView>, ClientError>) -> bool {
        match result {
            Ok(tasks) => {
                self.replace_tasks(tasks);
                true
            }
            Err(e) if e.is_session_rejected() => {
                self.expired = true;
                false
            }
            Err(e) => {
                tracing::debug!("Background refresh failed: {}", e);
                true
            }
        }
    }

    /// Show `requested` right away. Returns `None` if the task is not in
    /// the list.
    pub fn begin_status_change(&mut self, task_id: Uuid, requested: TaskStatus) -> Option<PendingChange> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        let change = PendingChange {
            task_id,
            requested,
            previous: task.status,
        };
        task.status = requested;
        self.pending.insert(task_id, change.clone());
        Some(change)
    }

    /// Swap in the server's record for the task.
    pub fn confirm(&mut self, change: PendingChange, confirmed: TaskView) {
        self.pending.remove(&change.task_id);
        match self.tasks.iter_mut().find(|t| t.id == confirmed.id) {
            Some(slot) => *slot = confirmed,
            None => self.tasks.push(confirmed),
        }
        self.banner = Some(Banner::Success("Task status updated successfully!".into()));
    }

    pub fn rollback(&mut self, change: PendingChange, err: &ClientError) {
        let change = self.pending.remove(&change.task_id).unwrap_or(change);
        // A background refresh may have replaced the list in the meantime;
        // only undo our own optimistic value.
        if let Some(task) = self
            .tasks
            .iter_mut()
            .find(|t| t.id == change.task_id && t.status == change.requested)
        {
            task.status = change.previous;
        }
        self.record_failure("Failed to update task", err);
    }

    /// Optimistic status change followed by confirm or rollback.
    pub async fn change_status<T: TaskSource>(
        &mut self,
        source: &T,
        session: &Session,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<(), ClientError> {
        let Some(change) = self.begin_status_change(task_id, status) else {
            let err = ClientError::NotFound("Task not found".into());
            self.record_failure("Failed to update task", &err);
            return Err(err);
        };

        match source.change_status(session, task_id, status).await {
            Ok(confirmed) => {
                self.confirm(change, confirmed);
                Ok(())
            }
            Err(e) => {
                self.rollback(change, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use chrono::Utc;
    use crate::models::{Role, TaskPriority, UserProfile};

    pub(crate) fn view(title: &str, status: TaskStatus, due: NaiveDate) -> TaskView {
        let now = Utc::now();
        TaskView {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            due_date: due,
            assigned_to: None,
            created_by: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn session(role: Role) -> Session {
        Session::new(
            "token".into(),
            UserProfile {
                id: Uuid::new_v4(),
                name: "Alice".into(),
                email: "alice@x.com".into(),
                role,
                is_active: true,
                created_at: Utc::now(),
            },
        )
    }

    /// In-memory stand-in for the server.
    pub(crate) struct FakeSource {
        pub tasks: Mutex<Vec<TaskView>>,
        pub fail_with: Mutex<Option<fn() -> ClientError>>,
    }

    impl FakeSource {
        pub fn new(tasks: Vec<TaskView>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                fail_with: Mutex::new(None),
            }
        }

        pub fn fail(&self, make: fn() -> ClientError) {
            *self.fail_with.lock().unwrap() = Some(make);
        }

        fn check(&self) -> Result<(), ClientError> {
            match *self.fail_with.lock().unwrap() {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
    }

    impl TaskSource for FakeSource {
        async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError> {
            self.check()?;
            Ok(session.user().clone())
        }

        async fn dashboard_tasks(&self, _session: &Session) -> Result<Vec<TaskView>, ClientError> {
            self.check()?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn change_status(&self, _session: &Session, task_id: Uuid, status: TaskStatus) -> Result<TaskView, ClientError> {
            self.check()?;
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| ClientError::NotFound("Task not found".into()))?;
            task.status = status;
            task.completed_at = (status == TaskStatus::Done).then(Utc::now);
            Ok(task.clone())
        }
    }

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[tokio::test]
    async fn foreground_refresh_replaces_list() {
        let source = FakeSource::new(vec![view("Ship report", TaskStatus::Todo, due())]);
        let mut state = DashboardState::new();
        state.refresh(&source, &session(Role::User)).await.unwrap();
        assert_eq!(state.tasks().len(), 1);
        assert!(!state.is_loading());
        assert!(state.banner().is_none());
    }

    #[tokio::test]
    async fn optimistic_change_is_confirmed_with_server_record() {
        let task = view("Ship report", TaskStatus::Todo, due());
        let id = task.id;
        let source = FakeSource::new(vec![task]);
        let session = session(Role::User);
        let mut state = DashboardState::new();
        state.refresh(&source, &session).await.unwrap();

        state.change_status(&source, &session, id, TaskStatus::Done).await.unwrap();
        let updated = &state.tasks()[0];
        assert_eq!(updated.status, TaskStatus::Done);
        assert!(updated.completed_at.is_some());
        assert!(!state.is_pending(id));
        assert!(matches!(state.banner(), Some(Banner::Success(_))));
    }

    #[tokio::test]
    async fn failed_change_rolls_back() {
        let task = view("Ship report", TaskStatus::InProgress, due());
        let id = task.id;
        let source = FakeSource::new(vec![task]);
        let session = session(Role::User);
        let mut state = DashboardState::new();
        state.refresh(&source, &session).await.unwrap();

        source.fail(|| ClientError::Forbidden("You can only update status of your assigned tasks".into()));
        let err = state.change_status(&source, &session, id, TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
        assert_eq!(state.tasks()[0].status, TaskStatus::InProgress);
        assert!(matches!(state.banner(), Some(Banner::Error(msg)) if msg.contains("assigned tasks")));
        assert!(!state.is_expired());
    }

    #[test]
    fn pending_change_shows_requested_status() {
        let task = view("Ship report", TaskStatus::Todo, due());
        let id = task.id;
        let mut state = DashboardState::new();
        state.apply_background(Ok(vec![task]));

        let change = state.begin_status_change(id, TaskStatus::InProgress).unwrap();
        assert_eq!(state.tasks()[0].status, TaskStatus::InProgress);
        assert!(state.is_pending(id));
        state.rollback(change, &ClientError::Server("boom".into()));
        assert_eq!(state.tasks()[0].status, TaskStatus::Todo);
        assert!(state.begin_status_change(Uuid::new_v4(), TaskStatus::Done).is_none());
    }

    #[test]
    fn background_refresh_keeps_pending_status() {
        let task = view("Ship report", TaskStatus::Todo, due());
        let id = task.id;
        let mut state = DashboardState::new();
        state.apply_background(Ok(vec![task.clone()]));

        let change = state.begin_status_change(id, TaskStatus::Done).unwrap();
        let mut server_copy = task;
        server_copy.status = TaskStatus::InProgress;
        assert!(state.apply_background(Ok(vec![server_copy])));
        assert_eq!(state.tasks()[0].status, TaskStatus::Done);
        assert!(state.is_pending(id));

        // Rolling back restores what the server last reported.
        state.rollback(change, &ClientError::Server("boom".into()));
        assert_eq!(state.tasks()[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn background_refresh_is_silent() {
        let mut state = DashboardState::new();
        state.banner = Some(Banner::Success("kept".into()));
        assert!(state.apply_background(Err(ClientError::Server("down".into()))));
        assert!(!state.is_loading());
        assert_eq!(state.banner(), Some(&Banner::Success("kept".into())));

        assert!(!state.apply_background(Err(ClientError::Unauthorized("Token has expired".into()))));
        assert!(state.is_expired());
    }

    #[test]
    fn stats_follow_the_list() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut state = DashboardState::new();
        state.apply_background(Ok(vec![
            view("late", TaskStatus::Todo, due()),
            view("finished", TaskStatus::Done, due()),
            view("upcoming", TaskStatus::InProgress, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
        ]));
        let stats = state.stats(today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.overdue, 1);
    }
}
