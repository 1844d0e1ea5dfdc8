//! Account operations shared by the auth, user and admin endpoints.

use chrono::Utc;
use uuid::Uuid;
use crate::authorization::{authorize, Operation};
use crate::errors::{AppError, AppResult, StoreError};
use crate::models::{AccountChanges, Claim, NewAccount, User};
use super::credentials::CredentialService;
use super::store::{RecordStore, TaskFilter};

fn conflict(err: StoreError, message: &str) -> AppError {
    match err {
        StoreError::DuplicateEmail(_) => AppError::Conflict(message.into()),
        other => AppError::Store(other),
    }
}

/// Hash the password and persist a new account.
pub async fn register<S: RecordStore>(
    store: &S,
    credentials: &CredentialService,
    account: NewAccount,
) -> AppResult<User> {
    if store.find_user_by_email(&account.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = credentials.hash_password(&account.password)?;
    let user = User::new(account.name, &account.email, password_hash, account.role, Utc::now());
    let user = store
        .create_user(user)
        .await
        .map_err(|e| conflict(e, "Email already registered"))?;

    tracing::info!("Registered {} account {}", user.role, user.id);
    Ok(user)
}

/// Check credentials and issue a session token.
pub async fn login<S: RecordStore>(
    store: &S,
    credentials: &CredentialService,
    email: &str,
    password: &str,
) -> AppResult<(String, User)> {
    let invalid = || AppError::Authentication("Invalid email or password".into());

    let Some(user) = store.find_user_by_email(email).await? else {
        tracing::info!("Login failed: unknown email");
        return Err(invalid());
    };
    if !credentials.verify_password(password, &user.password_hash)? {
        tracing::info!("Login failed: bad password for {}", user.id);
        return Err(invalid());
    }
    if !user.is_active {
        return Err(AppError::Authentication("Account is deactivated".into()));
    }

    let token = credentials.issue(&user)?;
    tracing::info!("User {} logged in as {}", user.id, user.role);
    Ok((token, user))
}

pub async fn find<S: RecordStore>(store: &S, id: Uuid) -> AppResult<User> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Apply account changes. Callers decide which fields the actor may send.
pub async fn update<S: RecordStore>(store: &S, id: Uuid, changes: AccountChanges) -> AppResult<User> {
    let mut user = find(store, id).await?;

    if let Some(name) = changes.name {
        user.name = name;
    }
    if let Some(email) = changes.email {
        user.email = email;
    }
    if let Some(role) = changes.role {
        if role != user.role {
            tracing::info!("Changing role of {} from {} to {}", user.id, user.role, role);
        }
        user.role = role;
    }
    if let Some(active) = changes.is_active {
        user.is_active = active;
    }
    user.updated_at = Utc::now();

    store
        .update_user(user)
        .await
        .map_err(|e| conflict(e, "Email already in use"))
}

/// Admin-only account removal.
///
/// Tasks assigned to the removed account are deleted. Tasks it created for
/// other people are handed over to the deleting admin, so no task is left
/// pointing at a missing account.
pub async fn delete<S: RecordStore>(store: &S, claim: &Claim, id: Uuid) -> AppResult<()> {
    authorize(claim, &Operation::DeleteUser)?;
    if claim.is(id) {
        return Err(AppError::validation("You cannot delete your own account"));
    }
    let user = find(store, id).await?;

    let related = store.find_tasks(&TaskFilter::all(), None).await?;
    let mut removed = 0usize;
    let mut handed_over = 0usize;
    for mut task in related {
        if task.assigned_to == user.id {
            store.delete_task(task.id).await?;
            removed += 1;
        } else if task.created_by == user.id {
            task.created_by = claim.subject_id;
            task.updated_at = Utc::now();
            store.update_task(task).await?;
            handed_over += 1;
        }
    }

    store.delete_user(user.id).await?;
    tracing::info!(
        "Deleted user {} ({} tasks removed, {} tasks handed to {})",
        user.id,
        removed,
        handed_over,
        claim.subject_id
    );
    Ok(())
}
