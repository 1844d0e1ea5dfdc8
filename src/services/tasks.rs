//! Task operations: authorize, load, run the lifecycle, persist.

use std::collections::{HashMap, HashSet};
use chrono::Utc;
use uuid::Uuid;
use crate::authorization::{
    authorize, needs_team, task_visibility, Decision, Operation, TaskListKind, TaskVisibility,
    UserVisibility, ONLY_TEAM_ASSIGNMENT,
};
use crate::errors::{AppError, AppResult};
use crate::lifecycle::{apply_changes, transition};
use crate::models::{
    Claim, NewTask, Role, Task, TaskChanges, TaskStatus, TaskView, UpdateTaskForm, User, UserSummary,
};
use crate::read_models::{Page, PageInfo};
use super::store::{RecordStore, TaskFilter, UserFilter};

/// Build the visibility predicate for `claim`, loading the team if needed.
pub async fn visibility<S: RecordStore>(store: &S, claim: &Claim, kind: TaskListKind) -> AppResult<TaskVisibility> {
    let team: HashSet<Uuid> = if needs_team(claim, kind) {
        store
            .find_users(&UserFilter::new(UserVisibility::Roles(&[Role::User])))
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect()
    } else {
        HashSet::new()
    };
    Ok(task_visibility(claim, kind, &team))
}

/// One page of `filter`'s matches plus pagination info.
pub async fn list_page<S: RecordStore>(store: &S, filter: &TaskFilter, page: Page) -> AppResult<(Vec<Task>, PageInfo)> {
    let total = store.count_tasks(filter).await?;
    let tasks = store.find_tasks(filter, Some(page)).await?;
    tracing::debug!("Task page {} of {} matches", page.page, total);
    Ok((tasks, PageInfo::new(total, page)))
}

async fn find<S: RecordStore>(store: &S, id: Uuid) -> AppResult<Task> {
    store
        .find_task(id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))
}

/// Single-task read under the same rules as the general list.
pub async fn get<S: RecordStore>(store: &S, claim: &Claim, id: Uuid) -> AppResult<Task> {
    let task = find(store, id).await?;
    let assignee_role = store.find_user(task.assigned_to).await?.map(|u| u.role);
    authorize(claim, &Operation::ViewTask { task: &task, assignee_role })?;
    Ok(task)
}

/// Load the account a task is being pointed at and check the caller may
/// assign to it. `missing` is the error for an id that does not resolve
/// when the caller is not a manager.
async fn resolve_assignee<S: RecordStore>(
    store: &S,
    claim: &Claim,
    assignee_id: Uuid,
    missing: impl FnOnce() -> AppError,
) -> AppResult<User> {
    match store.find_user(assignee_id).await? {
        Some(assignee) => {
            authorize(claim, &Operation::AssignTask { assignee: &assignee })?;
            Ok(assignee)
        }
        // Managers get the same answer whether the account is missing or
        // simply outside the team.
        None if claim.role == Role::Manager => Err(AppError::forbidden(ONLY_TEAM_ASSIGNMENT)),
        None => Err(missing()),
    }
}

pub async fn create<S: RecordStore>(store: &S, claim: &Claim, new_task: NewTask) -> AppResult<Task> {
    authorize(claim, &Operation::CreateTask)?;
    resolve_assignee(store, claim, new_task.assigned_to, || {
        AppError::validation("Assigned user does not exist")
    })
    .await?;

    let now = Utc::now();
    let mut task = Task::new(
        new_task.title,
        new_task.description,
        new_task.priority,
        new_task.due_date,
        new_task.assigned_to,
        claim.subject_id,
        now,
    );
    if let Some(status) = new_task.status {
        task = transition(task, status, now);
    }

    let task = store.create_task(task).await?;
    tracing::info!("{} {} created task {} for {}", claim.role, claim.subject_id, task.id, task.assigned_to);
    Ok(task)
}

/// Full-field update. Assignees with role `user` only get their status
/// change applied; everything else in the request is ignored, including
/// values that would not pass validation.
pub async fn update<S: RecordStore>(store: &S, claim: &Claim, id: Uuid, form: UpdateTaskForm) -> AppResult<Task> {
    let task = find(store, id).await?;
    let scope = authorize(claim, &Operation::UpdateTask { task: &task })?;
    let changes = form.validate_for(scope)?;

    if scope == Decision::Allow {
        if let Some(assignee_id) = changes.assigned_to.filter(|a| *a != task.assigned_to) {
            resolve_assignee(store, claim, assignee_id, || {
                AppError::validation("Assigned user does not exist")
            })
            .await?;
        }
    }

    let task = store.update_task(apply_changes(task, changes, scope, Utc::now())).await?;
    tracing::info!("{} {} updated task {}", claim.role, claim.subject_id, task.id);
    Ok(task)
}

pub async fn update_status<S: RecordStore>(store: &S, claim: &Claim, id: Uuid, status: TaskStatus) -> AppResult<Task> {
    let task = find(store, id).await?;
    authorize(claim, &Operation::UpdateTaskStatus { task: &task })?;

    let task = store
        .update_task(apply_changes(task, TaskChanges::status_only(status), Decision::StatusOnly, Utc::now()))
        .await?;
    tracing::info!("{} {} moved task {} to {}", claim.role, claim.subject_id, task.id, task.status);
    Ok(task)
}

/// Admin reassignment; both ids must resolve.
pub async fn assign<S: RecordStore>(store: &S, claim: &Claim, id: Uuid, assignee_id: Uuid) -> AppResult<Task> {
    authorize(claim, &Operation::AdminConsole)?;
    let task = find(store, id).await?;
    resolve_assignee(store, claim, assignee_id, || AppError::not_found("User not found")).await?;

    let changes = TaskChanges {
        assigned_to: Some(assignee_id),
        ..TaskChanges::default()
    };
    let task = store.update_task(apply_changes(task, changes, Decision::Allow, Utc::now())).await?;
    tracing::info!("Task {} reassigned to {}", task.id, assignee_id);
    Ok(task)
}

pub async fn delete<S: RecordStore>(store: &S, claim: &Claim, id: Uuid) -> AppResult<()> {
    let task = find(store, id).await?;
    authorize(claim, &Operation::DeleteTask { task: &task })?;
    store.delete_task(task.id).await?;
    tracing::info!("{} {} deleted task {}", claim.role, claim.subject_id, id);
    Ok(())
}

/// Attach assignee and creator summaries. References that no longer
/// resolve come back as `None`.
pub async fn populate<S: RecordStore>(store: &S, tasks: Vec<Task>) -> AppResult<Vec<TaskView>> {
    let mut people: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
    for task in &tasks {
        for id in [task.assigned_to, task.created_by] {
            if !people.contains_key(&id) {
                let summary = store.find_user(id).await?.as_ref().map(UserSummary::from);
                people.insert(id, summary);
            }
        }
    }

    Ok(tasks
        .into_iter()
        .map(|task| {
            let assigned_to = people.get(&task.assigned_to).cloned().flatten();
            let created_by = people.get(&task.created_by).cloned().flatten();
            TaskView::new(task, assigned_to, created_by)
        })
        .collect())
}

pub async fn populate_one<S: RecordStore>(store: &S, task: Task) -> AppResult<TaskView> {
    populate(store, vec![task])
        .await?
        .pop()
        .ok_or_else(|| AppError::Unexpected("populate dropped a task".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::authorization::{ONLY_ASSIGNED_STATUS_UPDATE, USERS_CANNOT_CREATE_TASKS};
    use crate::models::TaskPriority;
    use crate::services::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        admin: Claim,
        bob: Claim,
        alice: Claim,
        carol: Claim,
        dave: Claim,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut claims = Vec::new();
        for (email, role) in [
            ("admin@x.com", Role::Admin),
            ("bob@x.com", Role::Manager),
            ("alice@x.com", Role::User),
            ("carol@x.com", Role::User),
            ("dave@x.com", Role::Manager),
        ] {
            let user = store
                .create_user(User::new(email.into(), email, "h".into(), role, Utc::now()))
                .await
                .unwrap();
            claims.push(Claim::new(user.id, role));
        }
        Fixture {
            store,
            admin: claims[0],
            bob: claims[1],
            alice: claims[2],
            carol: claims[3],
            dave: claims[4],
        }
    }

    fn new_task(title: &str, assigned_to: Uuid) -> NewTask {
        NewTask {
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::Medium,
            status: None,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            assigned_to,
        }
    }

    fn status_form(status: &str) -> UpdateTaskForm {
        UpdateTaskForm {
            status: Some(status.into()),
            ..UpdateTaskForm::default()
        }
    }

    #[tokio::test]
    async fn manager_cannot_assign_to_manager_or_admin() {
        let f = fixture().await;
        for target in [f.dave.subject_id, f.admin.subject_id, Uuid::new_v4()] {
            let err = create(&f.store, &f.bob, new_task("x", target)).await.unwrap_err();
            assert!(matches!(err, AppError::Authorization(msg) if msg == ONLY_TEAM_ASSIGNMENT));
        }
        assert_eq!(f.store.count_tasks(&TaskFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn user_cannot_create_even_valid_task() {
        let f = fixture().await;
        let err = create(&f.store, &f.alice, new_task("mine", f.alice.subject_id)).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(msg) if msg == USERS_CANNOT_CREATE_TASKS));
    }

    #[tokio::test]
    async fn admin_create_with_done_status_is_stamped() {
        let f = fixture().await;
        let mut input = new_task("already finished", f.dave.subject_id);
        input.status = Some(TaskStatus::Done);
        let task = create(&f.store, &f.admin, input).await.unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.completed_at.is_some());

        let err = create(&f.store, &f.admin, new_task("ghost", Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn assignee_full_update_only_moves_status() {
        let f = fixture().await;
        let task = create(&f.store, &f.bob, new_task("Ship report", f.alice.subject_id)).await.unwrap();
        let changes = UpdateTaskForm {
            title: Some("hijacked".into()),
            status: Some("in-progress".into()),
            ..UpdateTaskForm::default()
        };
        let updated = update(&f.store, &f.alice, task.id, changes).await.unwrap();
        assert_eq!(updated.title, "Ship report");
        assert_eq!(updated.status, TaskStatus::InProgress);

        // Invalid values in ignored fields do not block the status change.
        let sloppy = UpdateTaskForm {
            title: Some("x".repeat(500)),
            due_date: Some("someday".into()),
            status: Some("done".into()),
            ..UpdateTaskForm::default()
        };
        let updated = update(&f.store, &f.alice, task.id, sloppy).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        assert!(updated.completed_at.is_some());

        let err = update(&f.store, &f.carol, task.id, status_form("done")).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn manager_reassignment_respects_team_rule() {
        let f = fixture().await;
        let task = create(&f.store, &f.bob, new_task("t", f.alice.subject_id)).await.unwrap();
        let reassign = |to: Uuid| UpdateTaskForm {
            assigned_to: Some(to.to_string()),
            ..UpdateTaskForm::default()
        };
        let to_dave = reassign(f.dave.subject_id);
        assert!(update(&f.store, &f.bob, task.id, to_dave).await.is_err());
        let to_carol = reassign(f.carol.subject_id);
        let moved = update(&f.store, &f.bob, task.id, to_carol).await.unwrap();
        assert_eq!(moved.assigned_to, f.carol.subject_id);
    }

    #[tokio::test]
    async fn status_updates_keep_completion_invariant() {
        let f = fixture().await;
        let task = create(&f.store, &f.bob, new_task("t", f.alice.subject_id)).await.unwrap();

        let done = update_status(&f.store, &f.alice, task.id, TaskStatus::Done).await.unwrap();
        let stamp = done.completed_at;
        assert!(stamp.is_some());
        let again = update_status(&f.store, &f.alice, task.id, TaskStatus::Done).await.unwrap();
        assert_eq!(again.completed_at, stamp);

        // Full update path converges on the same rule.
        let reopened = update(&f.store, &f.bob, task.id, status_form("todo")).await.unwrap();
        assert_eq!(reopened.completed_at, None);

        let err = update_status(&f.store, &f.carol, task.id, TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(msg) if msg == ONLY_ASSIGNED_STATUS_UPDATE));
    }

    #[tokio::test]
    async fn only_creator_manager_deletes() {
        let f = fixture().await;
        let task = create(&f.store, &f.bob, new_task("t", f.alice.subject_id)).await.unwrap();
        assert!(delete(&f.store, &f.dave, task.id).await.is_err());
        assert!(delete(&f.store, &f.alice, task.id).await.is_err());
        delete(&f.store, &f.bob, task.id).await.unwrap();
        assert!(matches!(get(&f.store, &f.alice, task.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn single_read_is_forbidden_not_empty() {
        let f = fixture().await;
        let task = create(&f.store, &f.bob, new_task("t", f.alice.subject_id)).await.unwrap();
        assert!(get(&f.store, &f.alice, task.id).await.is_ok());
        assert!(get(&f.store, &f.dave, task.id).await.is_ok());
        assert!(matches!(get(&f.store, &f.carol, task.id).await, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn manager_visibility_loads_team() {
        let f = fixture().await;
        let visible = visibility(&f.store, &f.bob, TaskListKind::General).await.unwrap();
        match visible {
            TaskVisibility::AssignedToAnyOrCreatedBy { assignees, creator } => {
                assert_eq!(creator, f.bob.subject_id);
                assert_eq!(assignees, HashSet::from([f.alice.subject_id, f.carol.subject_id]));
            }
            other => panic!("unexpected visibility {:?}", other),
        }
    }

    #[tokio::test]
    async fn populate_embeds_people() {
        let f = fixture().await;
        let task = create(&f.store, &f.bob, new_task("t", f.alice.subject_id)).await.unwrap();
        let view = populate_one(&f.store, task).await.unwrap();
        assert_eq!(view.assignee_id(), Some(f.alice.subject_id));
        assert_eq!(view.created_by.map(|u| u.email), Some("bob@x.com".to_string()));
    }
}
