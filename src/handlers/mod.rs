mod admin;
mod auth;
mod dashboard;
mod task;
mod user;

use serde_json::Value;
use crate::errors::AppError;
use crate::models::ApiResponse;

pub use admin::{
    admin_managers, admin_tasks, admin_users, assign_task as admin_assign_task,
    create_manager as admin_create_manager, create_task as admin_create_task,
    create_user as admin_create_user, delete_task as admin_delete_task,
    update_task as admin_update_task,
};
pub use auth::{login, me, signup};
pub use dashboard::{task_stats, user_stats};
pub use task::{
    assigned_tasks, create_task, delete_task, get_task, list_tasks, update_task, update_task_status,
};
pub use user::{delete_user, get_profile, list_users, team_members, update_profile, update_user};

pub async fn health() -> ApiResponse<Value> {
    ApiResponse::message("Role-Based Task Management API")
}

pub async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}
