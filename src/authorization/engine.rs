//! Per-record permission decisions.
//!
//! `can_perform` is a pure function of the caller's claim and the operation
//! (including whatever target record the operation touches). It never reads
//! or writes the store; handlers load the target first and hand it in.

use crate::errors::{AppError, AppResult};
use crate::models::{Claim, Role, Task, User};

pub const USERS_CANNOT_CREATE_TASKS: &str = "Users cannot create tasks";
pub const ONLY_TEAM_ASSIGNMENT: &str = "Managers can only assign tasks to team members";
pub const ONLY_OWN_TASK_UPDATE: &str = "You can only update your own tasks";
pub const ONLY_ASSIGNED_STATUS_UPDATE: &str = "You can only update status of your assigned tasks";
pub const ONLY_OWN_TASK_DELETE: &str = "You can only delete your own tasks";
pub const USERS_CANNOT_DELETE_TASKS: &str = "Users cannot delete tasks";
pub const TASK_NOT_VISIBLE: &str = "You do not have access to this task";
pub const ADMIN_ONLY: &str = "Access denied. Administrator role required";
pub const MANAGER_ONLY: &str = "Only managers can access this endpoint";

#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Any `/admin` endpoint.
    AdminConsole,
    ListUsers,
    ListManagers,
    ListTeam,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ViewUserStats,
    /// Role gate only; the assignee is checked separately by `AssignTask`.
    CreateTask,
    /// Pointing a new or existing task at `assignee`.
    AssignTask { assignee: &'a User },
    /// `assignee_role` is `None` when the assignee account no longer resolves.
    ViewTask { task: &'a Task, assignee_role: Option<Role> },
    UpdateTask { task: &'a Task },
    UpdateTaskStatus { task: &'a Task },
    DeleteTask { task: &'a Task },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Allowed, but only the status field of the task may change; other
    /// fields in the same request are dropped.
    StatusOnly,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Deny(_))
    }

    /// Turn a denial into a 403, passing any allow through.
    pub fn require(self) -> AppResult<Decision> {
        match self {
            Decision::Deny(reason) => {
                tracing::warn!("Authorization denied: {}", reason);
                Err(AppError::forbidden(reason))
            }
            allowed => Ok(allowed),
        }
    }
}

fn only(claim: &Claim, role: Role, reason: &'static str) -> Decision {
    if claim.role == role {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

pub fn can_perform(claim: &Claim, operation: &Operation<'_>) -> Decision {
    use Operation::*;

    match *operation {
        AdminConsole | ListUsers | ListManagers | CreateUser | UpdateUser | DeleteUser
        | ViewUserStats => only(claim, Role::Admin, ADMIN_ONLY),

        ListTeam => only(claim, Role::Manager, MANAGER_ONLY),

        CreateTask => match claim.role {
            Role::Admin | Role::Manager => Decision::Allow,
            Role::User => Decision::Deny(USERS_CANNOT_CREATE_TASKS),
        },

        AssignTask { assignee } => match claim.role {
            Role::Admin => Decision::Allow,
            Role::Manager if assignee.role == Role::User => Decision::Allow,
            Role::Manager => Decision::Deny(ONLY_TEAM_ASSIGNMENT),
            Role::User => Decision::Deny(USERS_CANNOT_CREATE_TASKS),
        },

        // Mirrors the general list filter so a single read never shows
        // something the list would hide.
        ViewTask { task, assignee_role } => {
            let visible = match claim.role {
                Role::Admin => true,
                Role::Manager => assignee_role == Some(Role::User) || claim.is(task.created_by),
                Role::User => claim.is(task.assigned_to),
            };
            if visible {
                Decision::Allow
            } else {
                Decision::Deny(TASK_NOT_VISIBLE)
            }
        }

        UpdateTask { task } => match claim.role {
            Role::Admin | Role::Manager => Decision::Allow,
            Role::User if claim.is(task.assigned_to) => Decision::StatusOnly,
            Role::User => Decision::Deny(ONLY_OWN_TASK_UPDATE),
        },

        UpdateTaskStatus { task } => match claim.role {
            Role::Admin | Role::Manager => Decision::Allow,
            Role::User if claim.is(task.assigned_to) => Decision::Allow,
            Role::User => Decision::Deny(ONLY_ASSIGNED_STATUS_UPDATE),
        },

        DeleteTask { task } => match claim.role {
            Role::Admin => Decision::Allow,
            Role::Manager if claim.is(task.created_by) => Decision::Allow,
            Role::Manager => Decision::Deny(ONLY_OWN_TASK_DELETE),
            Role::User => Decision::Deny(USERS_CANNOT_DELETE_TASKS),
        },
    }
}

/// `can_perform` followed by `Decision::require`.
pub fn authorize(claim: &Claim, operation: &Operation<'_>) -> AppResult<Decision> {
    can_perform(claim, operation).require()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;
    use crate::models::TaskPriority;

    fn user(role: Role) -> User {
        User::new("n".into(), &format!("{}@x.com", Uuid::new_v4()), "h".into(), role, Utc::now())
    }

    fn task(assigned_to: Uuid, created_by: Uuid) -> Task {
        Task::new(
            "t".into(),
            String::new(),
            TaskPriority::Medium,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            assigned_to,
            created_by,
            Utc::now(),
        )
    }

    fn claim_of(user: &User) -> Claim {
        Claim::new(user.id, user.role)
    }

    #[test]
    fn account_management_is_admin_only() {
        let ops = [
            Operation::AdminConsole,
            Operation::ListUsers,
            Operation::ListManagers,
            Operation::CreateUser,
            Operation::UpdateUser,
            Operation::DeleteUser,
            Operation::ViewUserStats,
        ];
        for role in Role::ALL {
            let claim = claim_of(&user(role));
            for op in &ops {
                assert_eq!(can_perform(&claim, op).is_allowed(), role == Role::Admin, "{:?} {:?}", role, op);
            }
        }
    }

    #[test]
    fn team_listing_is_manager_only() {
        for role in Role::ALL {
            let claim = claim_of(&user(role));
            assert_eq!(can_perform(&claim, &Operation::ListTeam).is_allowed(), role == Role::Manager);
        }
    }

    #[test]
    fn plain_users_cannot_create_tasks() {
        let claim = claim_of(&user(Role::User));
        assert_eq!(
            can_perform(&claim, &Operation::CreateTask),
            Decision::Deny(USERS_CANNOT_CREATE_TASKS)
        );
        let assignee = user(Role::User);
        assert!(!can_perform(&claim, &Operation::AssignTask { assignee: &assignee }).is_allowed());
    }

    #[test]
    fn managers_assign_only_to_user_role_accounts() {
        let claim = claim_of(&user(Role::Manager));
        let member = user(Role::User);
        let peer = user(Role::Manager);
        let admin = user(Role::Admin);
        assert_eq!(can_perform(&claim, &Operation::AssignTask { assignee: &member }), Decision::Allow);
        assert_eq!(
            can_perform(&claim, &Operation::AssignTask { assignee: &peer }),
            Decision::Deny(ONLY_TEAM_ASSIGNMENT)
        );
        assert_eq!(
            can_perform(&claim, &Operation::AssignTask { assignee: &admin }),
            Decision::Deny(ONLY_TEAM_ASSIGNMENT)
        );
    }

    #[test]
    fn admins_assign_to_anyone() {
        let claim = claim_of(&user(Role::Admin));
        for role in Role::ALL {
            let assignee = user(role);
            assert!(can_perform(&claim, &Operation::AssignTask { assignee: &assignee }).is_allowed());
        }
    }

    #[test]
    fn assignee_gets_status_only_full_update() {
        let alice = user(Role::User);
        let bob = user(Role::Manager);
        let t = task(alice.id, bob.id);
        assert_eq!(can_perform(&claim_of(&alice), &Operation::UpdateTask { task: &t }), Decision::StatusOnly);
        assert_eq!(can_perform(&claim_of(&bob), &Operation::UpdateTask { task: &t }), Decision::Allow);

        let carol = user(Role::User);
        assert_eq!(
            can_perform(&claim_of(&carol), &Operation::UpdateTask { task: &t }),
            Decision::Deny(ONLY_OWN_TASK_UPDATE)
        );
    }

    #[test]
    fn status_update_requires_assignment_for_users() {
        let alice = user(Role::User);
        let carol = user(Role::User);
        let creator = user(Role::Admin);
        let t = task(alice.id, creator.id);
        assert!(can_perform(&claim_of(&alice), &Operation::UpdateTaskStatus { task: &t }).is_allowed());
        assert_eq!(
            can_perform(&claim_of(&carol), &Operation::UpdateTaskStatus { task: &t }),
            Decision::Deny(ONLY_ASSIGNED_STATUS_UPDATE)
        );
        // Managers may move any task, not only their own.
        let other_manager = user(Role::Manager);
        assert!(can_perform(&claim_of(&other_manager), &Operation::UpdateTaskStatus { task: &t }).is_allowed());
    }

    #[test]
    fn delete_is_admin_or_creator() {
        let alice = user(Role::User);
        let bob = user(Role::Manager);
        let dave = user(Role::Manager);
        let admin = user(Role::Admin);
        let t = task(alice.id, bob.id);
        assert!(can_perform(&claim_of(&admin), &Operation::DeleteTask { task: &t }).is_allowed());
        assert!(can_perform(&claim_of(&bob), &Operation::DeleteTask { task: &t }).is_allowed());
        assert_eq!(
            can_perform(&claim_of(&dave), &Operation::DeleteTask { task: &t }),
            Decision::Deny(ONLY_OWN_TASK_DELETE)
        );
        assert_eq!(
            can_perform(&claim_of(&alice), &Operation::DeleteTask { task: &t }),
            Decision::Deny(USERS_CANNOT_DELETE_TASKS)
        );
    }

    #[test]
    fn single_task_view_matches_list_rules() {
        let alice = user(Role::User);
        let carol = user(Role::User);
        let bob = user(Role::Manager);
        let dave = user(Role::Manager);

        let team_task = task(alice.id, dave.id);
        let view = |c: &User, t: &Task, r: Option<Role>| {
            can_perform(&claim_of(c), &Operation::ViewTask { task: t, assignee_role: r }).is_allowed()
        };
        assert!(view(&alice, &team_task, Some(Role::User)));
        assert!(!view(&carol, &team_task, Some(Role::User)));
        assert!(view(&bob, &team_task, Some(Role::User)));

        // A task dave assigned to himself is invisible to other managers.
        let private = task(dave.id, dave.id);
        assert!(!view(&bob, &private, Some(Role::Manager)));
        assert!(view(&dave, &private, Some(Role::Manager)));
    }

    #[test]
    fn require_maps_denial_to_forbidden() {
        let err = Decision::Deny(ADMIN_ONLY).require().unwrap_err();
        assert!(matches!(err, AppError::Authorization(msg) if msg == ADMIN_ONLY));
        assert_eq!(Decision::StatusOnly.require().unwrap(), Decision::StatusOnly);
    }
}
