use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;
use crate::app::AppState;
use crate::authorization::{authorize, Operation, TaskListKind};
use crate::errors::{AppError, AppResult};
use crate::models::{
    parse_id, parse_opt, ApiResponse, Claim, CreateTaskForm, StatusForm, TaskListQuery, UpdateTaskForm,
};
use crate::read_models::Page;
use crate::services::{tasks, RecordStore, TaskFilter};

/// Visibility first, then the caller's own filters on top.
async fn filter_for<S: RecordStore>(
    store: &S,
    claim: &Claim,
    kind: TaskListKind,
    query: TaskListQuery,
) -> AppResult<TaskFilter> {
    let visibility = tasks::visibility(store, claim, kind).await?;
    let assigned_to = query
        .assigned_to
        .filter(|a| !a.trim().is_empty())
        .map(|a| parse_id(&a, "assignedTo"))
        .transpose()?;
    Ok(TaskFilter::new(visibility)
        .status(parse_opt(query.status)?)
        .priority(parse_opt(query.priority)?)
        .assigned_to(assigned_to)
        .search(query.search))
}

pub async fn list_tasks<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Query(query), _): WithRejection<Query<TaskListQuery>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let page = Page::from_query(query.page, query.limit, &state.config.pagination)?;
    let filter = filter_for(&state.store, &claim, TaskListKind::General, query).await?;
    let (found, pagination) = tasks::list_page(&state.store, &filter, page).await?;
    let views = tasks::populate(&state.store, found).await?;

    tracing::debug!("{} {} listed {} tasks", claim.role, claim.subject_id, views.len());
    Ok(ApiResponse::ok(json!({ "tasks": views, "pagination": pagination })))
}

pub async fn assigned_tasks<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Query(query), _): WithRejection<Query<TaskListQuery>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let filter = filter_for(&state.store, &claim, TaskListKind::Assigned, query).await?;
    let found = state.store.find_tasks(&filter, None).await?;
    let views = tasks::populate(&state.store, found).await?;
    Ok(ApiResponse::ok(json!({ "tasks": views })))
}

pub async fn get_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let task = tasks::get(&state.store, &claim, id).await?;
    let view = tasks::populate_one(&state.store, task).await?;
    Ok(ApiResponse::ok(json!({ "task": view })))
}

pub async fn create_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Json(form), _): WithRejection<Json<CreateTaskForm>, AppError>,
) -> AppResult<(StatusCode, ApiResponse<Value>)> {
    // Role check comes before field validation so plain users always get 403.
    authorize(&claim, &Operation::CreateTask)?;
    let new_task = form.validate()?;
    let task = tasks::create(&state.store, &claim, new_task).await?;
    let view = tasks::populate_one(&state.store, task).await?;

    let body = ApiResponse::ok(json!({ "task": view })).with_message("Task created successfully");
    Ok((StatusCode::CREATED, body))
}

pub async fn update_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(form), _): WithRejection<Json<UpdateTaskForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let task = tasks::update(&state.store, &claim, id, form).await?;
    let view = tasks::populate_one(&state.store, task).await?;
    Ok(ApiResponse::ok(json!({ "task": view })).with_message("Task updated successfully"))
}

pub async fn update_task_status<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(form), _): WithRejection<Json<StatusForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let status = form.validate()?;
    let task = tasks::update_status(&state.store, &claim, id, status).await?;
    let view = tasks::populate_one(&state.store, task).await?;
    Ok(ApiResponse::ok(json!({ "task": view })).with_message("Task status updated successfully"))
}

pub async fn delete_task<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    tasks::delete(&state.store, &claim, id).await?;
    Ok(ApiResponse::message("Task deleted successfully"))
}
