use std::str::FromStr;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;
use crate::authorization::Decision;
use crate::errors::{AppError, AppResult};
use super::{
    task::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS},
    NewTask, Role, TaskChanges, TaskPriority, TaskStatus,
};

pub const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SignupForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CreateUserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Account fields after validation; the password is still plain text here.
#[derive(Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl SignupForm {
    // Self-service signups are always plain users.
    pub fn validate(self) -> AppResult<NewAccount> {
        CreateUserForm {
            name: self.name,
            email: self.email,
            password: self.password,
            role: None,
        }
        .validate()
    }
}

impl CreateUserForm {
    pub fn validate(self) -> AppResult<NewAccount> {
        let (Some(name), Some(email), Some(password)) = (
            non_blank(self.name),
            non_blank(self.email),
            self.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::validation("Please provide name, email, and password"));
        };
        validate_email(&email)?;
        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                PASSWORD_MIN_CHARS
            )));
        }
        let role = match non_blank(self.role) {
            Some(raw) => Role::from_str(&raw).map_err(AppError::Validation)?,
            None => Role::User,
        };
        Ok(NewAccount { name, email, password, role })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateUserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUserForm {
    pub fn validate(self) -> AppResult<AccountChanges> {
        let email = non_blank(self.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }
        let role = non_blank(self.role)
            .map(|raw| Role::from_str(&raw).map_err(AppError::Validation))
            .transpose()?;
        Ok(AccountChanges {
            name: non_blank(self.name),
            email,
            role,
            is_active: self.is_active,
        })
    }
}

/// Self-service profile edit: only name and email are honoured.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct UpdateProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileForm {
    pub fn validate(self) -> AppResult<AccountChanges> {
        let email = non_blank(self.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }
        Ok(AccountChanges {
            name: non_blank(self.name),
            email,
            ..AccountChanges::default()
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateTaskForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

impl CreateTaskForm {
    pub fn validate(self) -> AppResult<NewTask> {
        let (Some(title), Some(assigned_to), Some(due_date)) = (
            non_blank(self.title),
            non_blank(self.assigned_to),
            non_blank(self.due_date),
        ) else {
            return Err(AppError::validation("Please provide title, assignedTo, and dueDate"));
        };

        Ok(NewTask {
            title: validate_title(title)?,
            description: validate_description(self.description.unwrap_or_default())?,
            priority: parse_opt(self.priority)?.unwrap_or_default(),
            status: parse_opt(self.status)?,
            due_date: parse_due_date(&due_date)?,
            assigned_to: parse_id(&assigned_to, "assignedTo")?,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateTaskForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
}

impl UpdateTaskForm {
    /// Validate the fields `scope` lets the caller change. Under
    /// `Decision::StatusOnly` the other fields are dropped unchecked.
    pub fn validate_for(self, scope: Decision) -> AppResult<TaskChanges> {
        match scope {
            Decision::StatusOnly => Ok(TaskChanges {
                status: parse_opt(self.status)?,
                ..TaskChanges::default()
            }),
            _ => self.validate(),
        }
    }

    pub fn validate(self) -> AppResult<TaskChanges> {
        Ok(TaskChanges {
            title: non_blank(self.title).map(validate_title).transpose()?,
            description: self.description.map(validate_description).transpose()?,
            status: parse_opt(self.status)?,
            priority: parse_opt(self.priority)?,
            due_date: non_blank(self.due_date).map(|d| parse_due_date(&d)).transpose()?,
            assigned_to: non_blank(self.assigned_to)
                .map(|id| parse_id(&id, "assignedTo"))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StatusForm {
    pub status: Option<String>,
}

impl StatusForm {
    pub fn validate(self) -> AppResult<TaskStatus> {
        let raw = self.status.unwrap_or_default();
        TaskStatus::from_str(&raw).map_err(AppError::Validation)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignTaskForm {
    pub task_id: Option<String>,
    #[serde(alias = "managerId")]
    pub assignee_id: Option<String>,
}

impl AssignTaskForm {
    pub fn validate(self) -> AppResult<(Uuid, Uuid)> {
        let (Some(task_id), Some(assignee_id)) = (non_blank(self.task_id), non_blank(self.assignee_id))
        else {
            return Err(AppError::validation("Please provide taskId and assigneeId"));
        };
        Ok((parse_id(&task_id, "taskId")?, parse_id(&assignee_id, "assigneeId")?))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<String>,
    pub search: Option<String>,
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_opt<T: FromStr<Err = String>>(raw: Option<String>) -> AppResult<Option<T>> {
    non_blank(raw)
        .map(|v| T::from_str(&v).map_err(AppError::Validation))
        .transpose()
}

pub fn parse_id(raw: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("Invalid {}: {}", field, raw)))
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp (date part kept).
pub fn parse_due_date(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::validation(format!("Invalid dueDate: {}", raw)))
}

fn validate_title(title: String) -> AppResult<String> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("Please provide a task title"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::validation(format!(
            "Title cannot be more than {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(title)
}

fn validate_description(description: String) -> AppResult<String> {
    let description = description.trim().to_string();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::validation(format!(
            "Description cannot be more than {} characters",
            DESCRIPTION_MAX_CHARS
        )));
    }
    Ok(description)
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid email: {}", email)))
    }
}
