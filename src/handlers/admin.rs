//! Admin console endpoints. Every handler here starts with an
//! `AdminConsole` check so non-admins get 403 before any lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;
use crate::app::AppState;
use crate::authorization::{authorize, user_visibility, Operation, UserListKind};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ApiResponse, AssignTaskForm, Claim, CreateTaskForm, CreateUserForm, Role, UpdateTaskForm, UserProfile,
};
use crate::services::{accounts, tasks, RecordStore, TaskFilter, UserFilter};

async fn list_accounts<S: RecordStore>(state: &AppState<S>, claim: &Claim, kind: UserListKind) -> AppResult<Vec<UserProfile>> {
    let visibility = user_visibility(claim, kind)?;
    let users = state.store.find_users(&UserFilter::new(visibility)).await?;
    Ok(users.iter().map(UserProfile::from).collect())
}

pub async fn admin_users<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    let users = list_accounts(&state, &claim, UserListKind::NonAdmins).await?;
    Ok(ApiResponse::ok(json!({ "users": users })))
}

pub async fn admin_managers<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    let managers = list_accounts(&state, &claim, UserListKind::Managers).await?;
    Ok(ApiResponse::ok(json!({ "managers": managers })))
}

pub async fn admin_tasks<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    authorize(&claim, &Operation::AdminConsole)?;
    let all = state.store.find_tasks(&TaskFilter::all(), None).await?;
    let views = tasks::populate(&state.store, all).await?;
    Ok(ApiResponse::ok(json!({ "tasks": views })))
}

pub async fn create_user<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Json(form), _): WithRejection<Json<CreateUserForm>, AppError>,
) -> AppResult<(StatusCode, ApiResponse<Value>)> {
    authorize(&claim, &Operation::CreateUser)?;
    let user = accounts::register(&state.store, &state.credentials, form.validate()?).await?;

    let body = ApiResponse::ok(json!({ "user": UserProfile::from(&user) })).with_message("User created successfully");
    Ok((StatusCode::CREATED, body))
}

pub async fn create_manager<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Json(mut form), _): WithRejection<Json<CreateUserForm>, AppError>,
) -> AppResult<(StatusCode, ApiResponse<Value>)> {
    authorize(&claim, &Operation::CreateUser)?;
    form.role = Some(Role::Manager.as_str().to_string());
    let manager = accounts::register(&state.store, &state.credentials, form.validate()?).await?;

    let body = ApiResponse::ok(json!({ "manager": UserProfile::from(&manager) }))
        .with_message("Manager created successfully");
    Ok((StatusCode::CREATED, body))
}

pub async fn create_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Json(form), _): WithRejection<Json<CreateTaskForm>, AppError>,
) -> AppResult<(StatusCode, ApiResponse<Value>)> {
    authorize(&claim, &Operation::AdminConsole)?;
    let task = tasks::create(&state.store, &claim, form.validate()?).await?;
    let view = tasks::populate_one(&state.store, task).await?;

    let body = ApiResponse::ok(json!({ "task": view })).with_message("Task created successfully");
    Ok((StatusCode::CREATED, body))
}

pub async fn assign_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Json(form), _): WithRejection<Json<AssignTaskForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    authorize(&claim, &Operation::AdminConsole)?;
    let (task_id, assignee_id) = form.validate()?;
    let task = tasks::assign(&state.store, &claim, task_id, assignee_id).await?;
    let view = tasks::populate_one(&state.store, task).await?;
    Ok(ApiResponse::ok(json!({ "task": view })).with_message("Task assigned successfully"))
}

pub async fn update_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(form), _): WithRejection<Json<UpdateTaskForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    authorize(&claim, &Operation::AdminConsole)?;
    let task = tasks::update(&state.store, &claim, id, form).await?;
    let view = tasks::populate_one(&state.store, task).await?;
    Ok(ApiResponse::ok(json!({ "task": view })).with_message("Task updated successfully"))
}

pub async fn delete_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    authorize(&claim, &Operation::AdminConsole)?;
    tasks::delete(&state.store, &claim, id).await?;
    Ok(ApiResponse::message("Task deleted successfully"))
}
