use std::sync::Arc;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use crate::config::Config;
use crate::handlers;
use crate::middleware::require_auth;
use crate::services::{CredentialService, RecordStore};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub credentials: Arc<CredentialService>,
    pub config: Arc<Config>,
}

impl<S: RecordStore> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            credentials: Arc::new(CredentialService::new(&config.auth)),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

pub fn build_router<S: RecordStore>(state: AppState<S>) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me::<S>))
        // Tasks
        .route("/tasks", get(handlers::list_tasks::<S>).post(handlers::create_task::<S>))
        .route("/tasks/assigned", get(handlers::assigned_tasks::<S>))
        .route("/tasks/stats", get(handlers::task_stats::<S>))
        .route(
            "/tasks/:id",
            get(handlers::get_task::<S>)
                .put(handlers::update_task::<S>)
                .delete(handlers::delete_task::<S>),
        )
        .route("/tasks/:id/status", patch(handlers::update_task_status::<S>))
        // Users
        .route("/users", get(handlers::list_users::<S>))
        .route("/users/team", get(handlers::team_members::<S>))
        .route(
            "/users/profile/me",
            get(handlers::get_profile::<S>).put(handlers::update_profile::<S>),
        )
        .route(
            "/users/:id",
            put(handlers::update_user::<S>).delete(handlers::delete_user::<S>),
        )
        // Admin console
        .route("/admin/stats", get(handlers::user_stats::<S>))
        .route("/admin/users", get(handlers::admin_users::<S>))
        .route("/admin/users/:id", delete(handlers::delete_user::<S>))
        .route("/admin/managers", get(handlers::admin_managers::<S>))
        .route("/admin/tasks", get(handlers::admin_tasks::<S>))
        .route(
            "/admin/tasks/:id",
            put(handlers::admin_update_task::<S>).delete(handlers::admin_delete_task::<S>),
        )
        .route("/admin/create-user", post(handlers::admin_create_user::<S>))
        .route("/admin/create-manager", post(handlers::admin_create_manager::<S>))
        .route("/admin/create-task", post(handlers::admin_create_task::<S>))
        .route("/admin/assign-task", post(handlers::admin_assign_task::<S>))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<S>));

    let max_body_bytes = state.config.server.max_body_bytes;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::health))
        .route("/auth/signup", post(handlers::signup::<S>))
        .route("/auth/login", post(handlers::login::<S>))
        .merge(protected)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .with_state(state)
}
