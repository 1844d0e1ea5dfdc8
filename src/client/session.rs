use std::fmt;
use crate::models::{Role, UserProfile};

/// A logged-in session: the bearer token plus the account it was issued
/// for. Passed explicitly to every authenticated call.
#[derive(Clone)]
pub struct Session {
    token: String,
    user: UserProfile,
}

impl Session {
    pub fn new(token: String, user: UserProfile) -> Self {
        Self { token, user }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn home_path(&self) -> &'static str {
        self.user.role.home_path()
    }

    /// Replace the cached account after the server re-verified it.
    pub fn refresh_user(&mut self, user: UserProfile) {
        if user.role != self.user.role {
            tracing::info!("Role of {} changed from {} to {}", user.id, self.user.role, user.role);
        }
        self.user = user;
    }

    /// Drop the session on logout or after the server rejected it.
    pub fn end(self) {
        tracing::info!("Session for {} ended", self.user.email);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}
