use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;
use crate::app::AppState;
use crate::authorization::{authorize, user_visibility, Operation, UserListKind};
use crate::errors::{AppError, AppResult};
use crate::models::{
    parse_opt, ApiResponse, Claim, UpdateProfileForm, UpdateUserForm, UserListQuery, UserProfile,
};
use crate::read_models::{Page, PageInfo};
use crate::services::{accounts, RecordStore, UserFilter};

/// Admin directory: every account, with optional role and text filters.
pub async fn list_users<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Query(query), _): WithRejection<Query<UserListQuery>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let visibility = user_visibility(&claim, UserListKind::Directory)?;
    let page = Page::from_query(query.page, query.limit, &state.config.pagination)?;
    let filter = UserFilter::new(visibility)
        .role(parse_opt(query.role)?)
        .search(query.search);

    let users = state.store.find_users(&filter).await?;
    let pagination = PageInfo::new(users.len() as u64, page);
    let users: Vec<UserProfile> = page.slice(users).iter().map(UserProfile::from).collect();
    Ok(ApiResponse::ok(json!({ "users": users, "pagination": pagination })))
}

pub async fn update_user<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(form), _): WithRejection<Json<UpdateUserForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    authorize(&claim, &Operation::UpdateUser)?;
    let user = accounts::update(&state.store, id, form.validate()?).await?;
    tracing::info!("Admin {} updated user {}", claim.subject_id, user.id);
    Ok(ApiResponse::ok(json!({ "user": UserProfile::from(&user) })).with_message("User updated successfully"))
}

pub async fn delete_user<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    accounts::delete(&state.store, &claim, id).await?;
    Ok(ApiResponse::message("User deleted successfully"))
}

pub async fn get_profile<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    let user = accounts::find(&state.store, claim.subject_id).await?;
    Ok(ApiResponse::ok(json!({ "user": UserProfile::from(&user) })))
}

/// Self-service edit of name and email. Role and active flag are not
/// reachable from here.
pub async fn update_profile<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
    WithRejection(Json(form), _): WithRejection<Json<UpdateProfileForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let user = accounts::update(&state.store, claim.subject_id, form.validate()?).await?;
    Ok(ApiResponse::ok(json!({ "user": UserProfile::from(&user) })).with_message("Profile updated successfully"))
}

/// A manager's team: every `user`-role account, by name.
pub async fn team_members<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    let visibility = user_visibility(&claim, UserListKind::Team)?;
    let mut team = state.store.find_users(&UserFilter::new(visibility)).await?;
    team.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    let users: Vec<UserProfile> = team.iter().map(UserProfile::from).collect();
    Ok(ApiResponse::ok(json!({ "users": users })))
}
