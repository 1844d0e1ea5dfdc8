//! Dashboard-side client: typed API calls, the session value, the route
//! guard and the state a dashboard renders from.

mod api;
mod dashboard;
mod guard;
mod poller;
mod session;

pub use api::{AccountDraft, ApiClient, ClientError, TaskDraft, TaskPage, TaskQuery, TaskSource};
pub use dashboard::{Banner, DashboardState, PendingChange};
pub use guard::{Navigation, RouteGuard, LOGIN_PATH};
pub use poller::{spawn_background_refresh, DEFAULT_POLL_INTERVAL};
pub use session::Session;
