//! Dashboard aggregations and pagination math.
//!
//! Everything here is recomputed from the already-filtered collection on
//! each request; nothing is cached or maintained incrementally.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::config::PaginationConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Role, Task, TaskPriority, TaskStatus, TaskView, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub todo: u64,
    pub in_progress: u64,
    pub done: u64,
    pub overdue: u64,
    pub by_priority: PriorityCounts,
}

impl TaskStats {
    fn record(&mut self, status: TaskStatus, priority: TaskPriority, overdue: bool) {
        self.total += 1;
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Done => self.done += 1,
        }
        match priority {
            TaskPriority::Low => self.by_priority.low += 1,
            TaskPriority::Medium => self.by_priority.medium += 1,
            TaskPriority::High => self.by_priority.high += 1,
        }
        if overdue {
            self.overdue += 1;
        }
    }

    /// Overdue means due strictly before `today` and not done.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>, today: NaiveDate) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            stats.record(task.status, task.priority, task.is_overdue(today));
        }
        stats
    }

    /// Same aggregation over the client-side view type.
    pub fn from_views<'a>(tasks: impl IntoIterator<Item = &'a TaskView>, today: NaiveDate) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            let overdue = task.due_date < today && task.status != TaskStatus::Done;
            stats.record(task.status, task.priority, overdue);
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: u64,
    pub admin: u64,
    pub manager: u64,
    pub user: u64,
}

impl UserStats {
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut stats = Self::default();
        for user in users {
            stats.total += 1;
            match user.role {
                Role::Admin => stats.admin += 1,
                Role::Manager => stats.manager += 1,
                Role::User => stats.user += 1,
            }
        }
        stats
    }
}

/// A window into a sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    /// Resolve query parameters against configured defaults. Pages are 1-based.
    pub fn from_query(page: Option<u64>, limit: Option<u64>, config: &PaginationConfig) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(config.default_limit);
        if page == 0 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if limit == 0 {
            return Err(AppError::validation("limit must be at least 1"));
        }
        Ok(Self {
            page,
            limit: limit.min(config.max_limit),
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl PageInfo {
    pub fn new(total: u64, page: Page) -> Self {
        Self {
            total,
            page: page.page,
            limit: page.limit,
            pages: total.div_ceil(page.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use crate::lifecycle::transition;

    fn task(status: TaskStatus, priority: TaskPriority, due: NaiveDate) -> Task {
        let now = Utc::now();
        let t = Task::new("t".into(), String::new(), priority, due, Uuid::new_v4(), Uuid::new_v4(), now);
        transition(t, status, now)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn counts_by_status_priority_and_overdue() {
        let today = date(2025, 1, 15);
        let tasks = vec![
            task(TaskStatus::Todo, TaskPriority::High, date(2025, 1, 10)),      // overdue
            task(TaskStatus::InProgress, TaskPriority::High, date(2025, 1, 14)), // overdue
            task(TaskStatus::Done, TaskPriority::Low, date(2025, 1, 1)),        // done, not overdue
            task(TaskStatus::Todo, TaskPriority::Medium, date(2025, 1, 15)),    // due today
        ];
        let stats = TaskStats::from_tasks(&tasks, today);
        assert_eq!(stats.total, 4);
        assert_eq!((stats.todo, stats.in_progress, stats.done), (2, 1, 1));
        assert_eq!(stats.by_priority, PriorityCounts { low: 1, medium: 1, high: 2 });
        assert_eq!(stats.overdue, 2);
    }

    #[test]
    fn empty_set_is_all_zero() {
        let stats = TaskStats::from_tasks(&Vec::<Task>::new(), date(2025, 1, 1));
        assert_eq!(stats, TaskStats::default());
    }

    #[test]
    fn stats_serialize_with_camel_case_keys() {
        let json = serde_json::to_value(TaskStats::default()).unwrap();
        assert!(json.get("inProgress").is_some());
        assert!(json.get("byPriority").is_some());
    }

    #[test]
    fn user_stats_group_by_role() {
        let now = Utc::now();
        let users: Vec<User> = [Role::Admin, Role::Manager, Role::User, Role::User]
            .into_iter()
            .enumerate()
            .map(|(i, role)| User::new(format!("u{}", i), &format!("u{}@x.com", i), "h".into(), role, now))
            .collect();
        let stats = UserStats::from_users(&users);
        assert_eq!(stats, UserStats { total: 4, admin: 1, manager: 1, user: 2 });
    }

    #[test]
    fn pages_round_up() {
        let page = Page { page: 1, limit: 10 };
        assert_eq!(PageInfo::new(0, page).pages, 0);
        assert_eq!(PageInfo::new(10, page).pages, 1);
        assert_eq!(PageInfo::new(11, page).pages, 2);
    }

    #[test]
    fn page_from_query_applies_defaults_and_cap() {
        let config = PaginationConfig { default_limit: 10, max_limit: 50 };
        assert_eq!(Page::from_query(None, None, &config).unwrap(), Page { page: 1, limit: 10 });
        assert_eq!(Page::from_query(Some(3), Some(500), &config).unwrap(), Page { page: 3, limit: 50 });
        assert!(Page::from_query(Some(0), None, &config).is_err());
        assert!(Page::from_query(None, Some(0), &config).is_err());
    }

    #[test]
    fn slice_skips_previous_pages() {
        let page = Page { page: 2, limit: 3 };
        assert_eq!(page.slice((1..=8).collect::<Vec<_>>()), vec![4, 5, 6]);
        let past_end = Page { page: 5, limit: 3 };
        assert!(past_end.slice((1..=8).collect::<Vec<_>>()).is_empty());
    }
}
