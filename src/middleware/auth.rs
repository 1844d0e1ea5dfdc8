use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use crate::app::AppState;
use crate::errors::{AppError, AppResult, CredentialError};
use crate::models::Claim;
use crate::services::RecordStore;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the bearer token, then check the account behind it still exists
/// and is active. The `Claim` handed to handlers carries the stored role,
/// so role changes and removals apply before the token expires.
pub async fn require_auth<S: RecordStore>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(req.headers()).ok_or(CredentialError::Missing)?;
    let token_claim = state.credentials.verify(token).map_err(|e| {
        tracing::debug!("Rejected token on {}: {}", req.uri().path(), e);
        e
    })?;

    let Some(user) = state.store.find_user(token_claim.subject_id).await? else {
        tracing::info!("Token for removed account {} rejected", token_claim.subject_id);
        return Err(AppError::Authentication("Account no longer exists".into()));
    };
    if !user.is_active {
        return Err(AppError::Authentication("Account is deactivated".into()));
    }
    if user.role != token_claim.role {
        tracing::debug!("Account {} is now {}, token says {}", user.id, user.role, token_claim.role);
    }

    req.extensions_mut().insert(Claim::new(user.id, user.role));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
