use crate::models::Role;
use super::api::{ClientError, TaskSource};
use super::session::Session;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render,
    Redirect(&'static str),
}

/// Client-side gate in front of each dashboard. It only decides what to
/// render; the server still authorizes every call.
pub struct RouteGuard;

impl RouteGuard {
    /// `verified` is the role the server confirmed for the session, or
    /// `None` when there is no session or verification failed.
    pub fn decide(required: Role, verified: Option<Role>) -> Navigation {
        match verified {
            None => Navigation::Redirect(LOGIN_PATH),
            Some(role) if role == required => Navigation::Render,
            Some(role) => Navigation::Redirect(role.home_path()),
        }
    }

    /// Re-verify the session against the server before deciding. The cached
    /// role is never trusted on its own.
    pub async fn guard<T: TaskSource>(source: &T, session: Option<&mut Session>, required: Role) -> Navigation {
        let Some(session) = session else {
            return Self::decide(required, None);
        };

        match source.current_user(session).await {
            Ok(user) => {
                session.refresh_user(user);
                Self::decide(required, Some(session.role()))
            }
            Err(ClientError::Unauthorized(message)) => {
                tracing::info!("Session rejected: {}", message);
                Self::decide(required, None)
            }
            Err(e) => {
                tracing::warn!("Could not verify session: {}", e);
                Self::decide(required, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::dashboard::tests::{session, FakeSource};

    #[test]
    fn matching_role_renders() {
        assert_eq!(RouteGuard::decide(Role::Manager, Some(Role::Manager)), Navigation::Render);
    }

    #[test]
    fn wrong_role_goes_home() {
        assert_eq!(RouteGuard::decide(Role::Admin, Some(Role::User)), Navigation::Redirect("/user"));
        assert_eq!(RouteGuard::decide(Role::User, Some(Role::Manager)), Navigation::Redirect("/manager"));
        assert_eq!(RouteGuard::decide(Role::Manager, Some(Role::Admin)), Navigation::Redirect("/admin"));
    }

    #[test]
    fn no_session_goes_to_login() {
        assert_eq!(RouteGuard::decide(Role::User, None), Navigation::Redirect(LOGIN_PATH));
    }

    #[tokio::test]
    async fn guard_reverifies_with_server() {
        let source = FakeSource::new(Vec::new());
        let mut manager = session(Role::Manager);
        assert_eq!(RouteGuard::guard(&source, Some(&mut manager), Role::Manager).await, Navigation::Render);
        assert_eq!(
            RouteGuard::guard(&source, Some(&mut manager), Role::Admin).await,
            Navigation::Redirect("/manager")
        );
        assert_eq!(RouteGuard::guard(&source, None, Role::Manager).await, Navigation::Redirect(LOGIN_PATH));

        source.fail(|| ClientError::Unauthorized("Token has expired".into()));
        assert_eq!(
            RouteGuard::guard(&source, Some(&mut manager), Role::Manager).await,
            Navigation::Redirect(LOGIN_PATH)
        );
    }
}
