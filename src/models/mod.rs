mod claim;
mod forms;
mod response;
mod task;
mod user;
mod views;

pub use claim::Claim;
pub use forms::{
    AccountChanges, AssignTaskForm, CreateTaskForm, CreateUserForm, LoginForm, NewAccount,
    SignupForm, StatusForm, TaskListQuery, UpdateProfileForm, UpdateTaskForm, UpdateUserForm,
    UserListQuery,
};
pub use response::ApiResponse;
pub use task::{NewTask, Task, TaskChanges, TaskPriority, TaskStatus};
pub use user::{normalize_email, Role, User};
pub use views::{TaskView, UserProfile, UserSummary};

pub(crate) use forms::{non_blank, parse_id, parse_opt};
