//! Visibility filters for list operations.
//!
//! A manager's team is every account with role `user`; there is no
//! per-manager roster. The caller resolves that set from the store and
//! passes it in, which keeps the filters themselves pure.

use std::collections::HashSet;
use uuid::Uuid;
use crate::errors::AppResult;
use crate::models::{Claim, Role, Task, User};
use super::engine::{can_perform, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskListKind {
    /// `GET /tasks`, `GET /tasks/stats`
    General,
    /// `GET /tasks/assigned`
    Assigned,
}

/// Predicate restricting which tasks a list operation may return.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskVisibility {
    All,
    AssignedTo(Uuid),
    /// Union: assigned to any of `assignees`, or created by `creator`.
    AssignedToAnyOrCreatedBy { assignees: HashSet<Uuid>, creator: Uuid },
}

impl TaskVisibility {
    pub fn permits(&self, task: &Task) -> bool {
        match self {
            TaskVisibility::All => true,
            TaskVisibility::AssignedTo(id) => task.assigned_to == *id,
            TaskVisibility::AssignedToAnyOrCreatedBy { assignees, creator } => {
                assignees.contains(&task.assigned_to) || task.created_by == *creator
            }
        }
    }
}

/// Whether building the filter for `kind` needs the team (user-role ids).
pub fn needs_team(claim: &Claim, kind: TaskListKind) -> bool {
    claim.role == Role::Manager && kind == TaskListKind::General
}

pub fn task_visibility(claim: &Claim, kind: TaskListKind, team: &HashSet<Uuid>) -> TaskVisibility {
    match (claim.role, kind) {
        (Role::Admin, _) => TaskVisibility::All,
        (Role::Manager, TaskListKind::General) => TaskVisibility::AssignedToAnyOrCreatedBy {
            assignees: team.clone(),
            creator: claim.subject_id,
        },
        (Role::Manager, TaskListKind::Assigned) => TaskVisibility::AssignedToAnyOrCreatedBy {
            assignees: HashSet::from([claim.subject_id]),
            creator: claim.subject_id,
        },
        (Role::User, _) => TaskVisibility::AssignedTo(claim.subject_id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserListKind {
    /// `GET /users`: every account, searchable.
    Directory,
    /// `GET /admin/users`: everyone except admins.
    NonAdmins,
    /// `GET /admin/managers`
    Managers,
    /// `GET /users/team`
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVisibility {
    All,
    Roles(&'static [Role]),
}

impl UserVisibility {
    pub fn permits(&self, user: &User) -> bool {
        match self {
            UserVisibility::All => true,
            UserVisibility::Roles(roles) => roles.contains(&user.role),
        }
    }
}

/// Authorize a user listing and return the filter it runs under.
pub fn user_visibility(claim: &Claim, kind: UserListKind) -> AppResult<UserVisibility> {
    let (operation, visibility) = match kind {
        UserListKind::Directory => (Operation::ListUsers, UserVisibility::All),
        UserListKind::NonAdmins => (
            Operation::ListUsers,
            UserVisibility::Roles(&[Role::Manager, Role::User]),
        ),
        UserListKind::Managers => (Operation::ListManagers, UserVisibility::Roles(&[Role::Manager])),
        UserListKind::Team => (Operation::ListTeam, UserVisibility::Roles(&[Role::User])),
    };
    can_perform(claim, &operation).require()?;
    Ok(visibility)
}
