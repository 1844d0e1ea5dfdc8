//! Task status transitions.
//!
//! Every status change, whether from a full-field update or a status-only
//! update, goes through [`transition`]. It keeps `completed_at` non-null
//! exactly when the status is `done`, stamping it once on entry.

use chrono::{DateTime, Utc};
use crate::authorization::Decision;
use crate::models::{Task, TaskChanges, TaskStatus};

/// Move `task` to `requested`, applying the completion-time side effects.
///
/// All transitions are legal, including reopening a `done` task. Status
/// strings are validated before a `TaskStatus` exists, so there is no
/// failure case here.
pub fn transition(mut task: Task, requested: TaskStatus, now: DateTime<Utc>) -> Task {
    task.completed_at = match (requested, task.completed_at) {
        (TaskStatus::Done, Some(stamped)) => Some(stamped),
        (TaskStatus::Done, None) => Some(now),
        (_, _) => None,
    };
    task.status = requested;
    task
}

/// Apply a partial update under the scope granted by the authorization
/// engine. With `Decision::StatusOnly` every other field is ignored.
pub fn apply_changes(mut task: Task, changes: TaskChanges, scope: Decision, now: DateTime<Utc>) -> Task {
    if scope != Decision::StatusOnly {
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        if let Some(assigned_to) = changes.assigned_to {
            task.assigned_to = assigned_to;
        }
    }

    // Re-saving without a status still normalizes completed_at.
    let status = changes.status.unwrap_or(task.status);
    let mut task = transition(task, status, now);
    task.updated_at = now;
    task
}
