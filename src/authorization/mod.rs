//! Authorization engine: who may do what to which record, and which
//! records a list operation may return.

mod engine;
mod visibility;

pub use engine::{authorize, can_perform, Decision, Operation};
pub use engine::{
    ADMIN_ONLY, MANAGER_ONLY, ONLY_ASSIGNED_STATUS_UPDATE, ONLY_OWN_TASK_DELETE,
    ONLY_OWN_TASK_UPDATE, ONLY_TEAM_ASSIGNMENT, TASK_NOT_VISIBLE, USERS_CANNOT_CREATE_TASKS,
    USERS_CANNOT_DELETE_TASKS,
};
pub use visibility::{
    needs_team, task_visibility, user_visibility, TaskListKind, TaskVisibility, UserListKind,
    UserVisibility,
};
