use crate::config::BootstrapConfig;
use crate::errors::AppResult;
use crate::models::{NewAccount, Role, User};
use super::{accounts, credentials::CredentialService, store::RecordStore};

/// Make sure the configured admin account exists. Returns the account when
/// it had to be created.
pub async fn ensure_admin<S: RecordStore>(
    store: &S,
    credentials: &CredentialService,
    config: &BootstrapConfig,
) -> AppResult<Option<User>> {
    if let Some(existing) = store.find_user_by_email(&config.admin_email).await? {
        tracing::info!("Admin account {} already present", existing.email);
        return Ok(None);
    }

    let admin = accounts::register(
        store,
        credentials,
        NewAccount {
            name: config.admin_name.clone(),
            email: config.admin_email.clone(),
            password: config.admin_password.clone(),
            role: Role::Admin,
        },
    )
    .await?;
    tracing::warn!("Created bootstrap admin {}; change its password", admin.email);
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::MemoryStore;

    #[tokio::test]
    async fn creates_admin_once() {
        let config = Config::for_testing();
        let store = MemoryStore::new();
        let credentials = CredentialService::new(&config.auth);

        let created = ensure_admin(&store, &credentials, &config.bootstrap).await.unwrap();
        assert_eq!(created.map(|u| u.role), Some(Role::Admin));
        let again = ensure_admin(&store, &credentials, &config.bootstrap).await.unwrap();
        assert!(again.is_none());
    }
}
