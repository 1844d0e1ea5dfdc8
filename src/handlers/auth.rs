use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::{ApiResponse, Claim, LoginForm, SignupForm, UserProfile};
use crate::services::{accounts, RecordStore};

pub async fn signup<S: RecordStore>(
    State(state): State<AppState<S>>,
    WithRejection(Json(form), _): WithRejection<Json<SignupForm>, AppError>,
) -> AppResult<(StatusCode, ApiResponse<Value>)> {
    let account = form.validate()?;
    let user = accounts::register(&state.store, &state.credentials, account).await?;
    let token = state.credentials.issue(&user)?;

    let body = ApiResponse::ok(json!({ "token": token, "user": UserProfile::from(&user) }))
        .with_message("Account created successfully");
    Ok((StatusCode::CREATED, body))
}

pub async fn login<S: RecordStore>(
    State(state): State<AppState<S>>,
    WithRejection(Json(form), _): WithRejection<Json<LoginForm>, AppError>,
) -> AppResult<ApiResponse<Value>> {
    let (token, user) = accounts::login(&state.store, &state.credentials, &form.email, &form.password).await?;
    Ok(ApiResponse::ok(json!({ "token": token, "user": UserProfile::from(&user) }))
        .with_message("Login successful"))
}

/// The account behind the presented token. A token whose account has since
/// been deleted is treated as invalid.
pub async fn me<S: RecordStore>(
    State(state): State<AppState<S>>,
    Extension(claim): Extension<Claim>,
) -> AppResult<ApiResponse<Value>> {
    let user = state
        .store
        .find_user(claim.subject_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Account no longer exists".into()))?;
    Ok(ApiResponse::ok(json!({ "user": UserProfile::from(&user) })))
}
