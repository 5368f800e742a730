/// Persistence seams for the entity models
///
/// Each entity talks to its storage through one async trait. Two backends
/// implement all of them:
///
/// - [`PgStore`]: PostgreSQL through a `sqlx` pool
/// - [`MemoryStore`]: in-process tables, used by tests and examples
///
/// Stores enforce what a database would: unique emails and uids, one tag per
/// task, and references to existing rows. Those violations surface as
/// `ModelError::Validation` keyed to the offending field, so callers see them
/// exactly like form validation failures.
///
/// Field validation itself happens in the models before a store is reached.

use crate::error::ModelResult;
use crate::models::state::RecordState;
use crate::models::status::{CreateStatus, Status, UpdateStatus};
use crate::models::tag::{CreateTag, Tag};
use crate::models::task::{CreateTask, Task, TaskRole, UpdateTask};
use crate::models::task_tag::{CreateTaskTag, TaskTag};
use crate::models::user::{NewUser, User, UserChanges};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> ModelResult<User>;

    async fn find_user(&self, id: i32) -> ModelResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> ModelResult<Option<User>>;

    /// Writes the present fields and refreshes `updated_at`; `None` if no row has this id
    async fn update_user(&self, id: i32, changes: UserChanges) -> ModelResult<Option<User>>;

    async fn set_user_state(&self, id: i32, state: RecordState) -> ModelResult<Option<User>>;

    /// Users in `state`, ordered by id
    async fn list_users(&self, state: RecordState) -> ModelResult<Vec<User>>;
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn insert_status(&self, status: CreateStatus) -> ModelResult<Status>;

    async fn find_status(&self, id: i32) -> ModelResult<Option<Status>>;

    async fn update_status(&self, id: i32, changes: UpdateStatus) -> ModelResult<Option<Status>>;

    async fn set_status_state(&self, id: i32, state: RecordState) -> ModelResult<Option<Status>>;

    async fn list_statuses(&self, state: RecordState) -> ModelResult<Vec<Status>>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn insert_tag(&self, tag: CreateTag) -> ModelResult<Tag>;

    async fn find_tag(&self, id: i32) -> ModelResult<Option<Tag>>;

    async fn list_tags(&self) -> ModelResult<Vec<Tag>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: CreateTask) -> ModelResult<Task>;

    async fn find_task(&self, id: i32) -> ModelResult<Option<Task>>;

    async fn update_task(&self, id: i32, changes: UpdateTask) -> ModelResult<Option<Task>>;

    async fn set_task_state(&self, id: i32, state: RecordState) -> ModelResult<Option<Task>>;

    async fn list_tasks(&self, state: RecordState) -> ModelResult<Vec<Task>>;

    /// Active tasks in which `user_id` plays `role`, ordered by id
    async fn list_tasks_for_user(&self, user_id: i32, role: TaskRole) -> ModelResult<Vec<Task>>;
}

#[async_trait]
pub trait TaskTagStore: Send + Sync {
    async fn insert_task_tag(&self, link: CreateTaskTag) -> ModelResult<TaskTag>;

    async fn find_task_tag_by_task(&self, task_id: i32) -> ModelResult<Option<TaskTag>>;
}

/// Every entity store at once
pub trait Store: UserStore + StatusStore + TagStore + TaskStore + TaskTagStore {}

impl<T> Store for T where T: UserStore + StatusStore + TagStore + TaskStore + TaskTagStore {}
