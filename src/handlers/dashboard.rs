use axum::{extract::State, Extension};
use chrono::Utc;
use serde_json::{json, Value};
use crate::app::AppState;
use crate::authorization::{authorize, Operation, TaskListKind};
use crate::errors::AppResult;
use crate::models::{ApiResponse, Claim};
use crate::read_models::{TaskStats, UserStats};
use crate::services::{tasks, RecordStore, TaskFilter, UserFilter};

/// Counts over the caller's general visible set.
pub async fn task_stats<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    let visibility = tasks::visibility(&state.store, &claim, TaskListKind::General).await?;
    let visible = state.store.find_tasks(&TaskFilter::new(visibility), None).await?;
    let stats = TaskStats::from_tasks(&visible, Utc::now().date_naive());

    tracing::debug!("Stats for {} {}: {:?}", claim.role, claim.subject_id, stats);
    Ok(ApiResponse::ok(json!({ "stats": stats })))
}

pub async fn user_stats<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    authorize(&claim, &Operation::ViewUserStats)?;
    let users = state.store.find_users(&UserFilter::all()).await?;
    Ok(ApiResponse::ok(json!({ "stats": UserStats::from_users(&users) })))
}
