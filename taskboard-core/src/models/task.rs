/// Task model and operations
///
/// A task is created by one user, may be assigned to another (or the same)
/// user, sits in one status and carries at most one tag. Both user references
/// point at the same table; [`TaskRole`] tells them apart.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     status_id INTEGER NOT NULL REFERENCES statuses(id),
///     creator_id INTEGER NOT NULL REFERENCES users(id),
///     assigned_to_id INTEGER REFERENCES users(id),
///     state TEXT NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskboard_core::models::status::{CreateStatus, Status};
/// use taskboard_core::models::task::{CreateTask, Task, TaskRole};
/// use taskboard_core::models::user::{CreateUser, User};
/// use taskboard_core::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let author = User::create(&store, CreateUser {
///     first_name: "Jane".to_string(),
///     last_name: "Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password: "secret".to_string(),
/// }).await?;
/// let status = Status::create(&store, CreateStatus { name: "New".to_string() }).await?;
///
/// let task = Task::create(&store, CreateTask {
///     name: "Write docs".to_string(),
///     description: None,
///     status_id: status.id,
///     creator_id: author.id,
///     assigned_to_id: Some(author.id),
/// }).await?;
///
/// let mine = Task::list_for_user(&store, author.id, TaskRole::Assignee).await?;
/// assert_eq!(mine[0].id, task.id);
/// # Ok(())
/// # }
/// ```

use crate::error::{ModelError, ModelResult};
use crate::models::state::RecordState;
use crate::models::status::Status;
use crate::models::tag::Tag;
use crate::models::task_tag::TaskTag;
use crate::models::user::User;
use crate::store::{StatusStore, TagStore, TaskStore, TaskTagStore, UserStore};
use crate::validation::{check_name, check_reference, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Role a user plays for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskRole {
    /// Author of the task
    #[serde(rename = "creator")]
    Creator,

    /// User the task is assigned to
    #[serde(rename = "assignedTo")]
    Assignee,
}

impl TaskRole {
    /// Association alias of the role, as registered in the schema
    pub fn alias(&self) -> &'static str {
        match self {
            TaskRole::Creator => "creator",
            TaskRole::Assignee => "assignedTo",
        }
    }
}

/// Tracked piece of work
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status_id: i32,
    pub creator_id: i32,
    pub assigned_to_id: Option<i32>,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub name: String,
    pub description: Option<String>,
    pub status_id: i32,
    pub creator_id: i32,
    pub assigned_to_id: Option<i32>,
}

/// Partial update for a task
///
/// The creator is fixed at creation. Use `Some(None)` to clear the description
/// or the assignee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status_id: Option<i32>,
    pub assigned_to_id: Option<Option<i32>>,
}

/// Validates a new task
///
/// Only the shape of references is checked here; whether they point at
/// existing rows is reported by the store.
pub fn validate_create(data: &CreateTask) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check_name(&mut errors, "name", &data.name);
    check_reference(&mut errors, "statusId", data.status_id);
    check_reference(&mut errors, "creatorId", data.creator_id);
    if let Some(assigned_to_id) = data.assigned_to_id {
        check_reference(&mut errors, "assignedToId", assigned_to_id);
    }

    errors.into_result()
}

/// Validates the fields present in a partial update
pub fn validate_update(data: &UpdateTask) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(name) = &data.name {
        check_name(&mut errors, "name", name);
    }
    if let Some(status_id) = data.status_id {
        check_reference(&mut errors, "statusId", status_id);
    }
    if let Some(Some(assigned_to_id)) = data.assigned_to_id {
        check_reference(&mut errors, "assignedToId", assigned_to_id);
    }

    errors.into_result()
}

impl Task {
    pub async fn create<S>(store: &S, data: CreateTask) -> ModelResult<Self>
    where
        S: TaskStore + ?Sized,
    {
        validate_create(&data)?;

        let task = store.insert_task(data).await?;

        info!(
            task_id = task.id,
            creator_id = task.creator_id,
            assigned_to_id = ?task.assigned_to_id,
            "Created task"
        );
        Ok(task)
    }

    pub async fn find_by_id<S>(store: &S, id: i32) -> ModelResult<Option<Self>>
    where
        S: TaskStore + ?Sized,
    {
        store.find_task(id).await
    }

    pub async fn get_by_id<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: TaskStore + ?Sized,
    {
        store
            .find_task(id)
            .await?
            .ok_or_else(|| ModelError::not_found("Task", id))
    }

    /// Tasks not soft-deleted, ordered by id
    pub async fn list_active<S>(store: &S) -> ModelResult<Vec<Self>>
    where
        S: TaskStore + ?Sized,
    {
        store.list_tasks(RecordState::Active).await
    }

    /// Active tasks in which `user_id` plays `role`
    pub async fn list_for_user<S>(store: &S, user_id: i32, role: TaskRole) -> ModelResult<Vec<Self>>
    where
        S: TaskStore + ?Sized,
    {
        store.list_tasks_for_user(user_id, role).await
    }

    pub async fn update<S>(store: &S, id: i32, data: UpdateTask) -> ModelResult<Self>
    where
        S: TaskStore + ?Sized,
    {
        validate_update(&data)?;

        let task = store
            .update_task(id, data)
            .await?
            .ok_or_else(|| ModelError::not_found("Task", id))?;

        debug!(task_id = task.id, "Updated task");
        Ok(task)
    }

    pub async fn soft_delete<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: TaskStore + ?Sized,
    {
        let task = store
            .set_task_state(id, RecordState::Deleted)
            .await?
            .ok_or_else(|| ModelError::not_found("Task", id))?;

        info!(task_id = task.id, "Soft-deleted task");
        Ok(task)
    }

    pub async fn creator<S>(&self, store: &S) -> ModelResult<User>
    where
        S: UserStore + ?Sized,
    {
        User::get_by_id(store, self.creator_id).await
    }

    pub async fn assignee<S>(&self, store: &S) -> ModelResult<Option<User>>
    where
        S: UserStore + ?Sized,
    {
        match self.assigned_to_id {
            Some(id) => User::get_by_id(store, id).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn status<S>(&self, store: &S) -> ModelResult<Status>
    where
        S: StatusStore + ?Sized,
    {
        Status::get_by_id(store, self.status_id).await
    }

    /// Tags attached through the join entity (zero or one)
    pub async fn tags<S>(&self, store: &S) -> ModelResult<Vec<Tag>>
    where
        S: TaskTagStore + TagStore + ?Sized,
    {
        match TaskTag::find_by_task(store, self.id).await? {
            Some(link) => Ok(vec![Tag::get_by_id(store, link.tag_id).await?]),
            None => Ok(Vec::new()),
        }
    }
}
