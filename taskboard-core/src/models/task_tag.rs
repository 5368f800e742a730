/// TaskTag join entity
///
/// Links a task to a tag. The `task_id` column is unique, so a task carries at
/// most one tag: a second link for the same task is rejected with a
/// uniqueness error on `taskId` rather than replacing the first.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_tags (
///     id SERIAL PRIMARY KEY,
///     task_id INTEGER NOT NULL REFERENCES tasks(id),  -- UNIQUE (task_tags_task_id_key)
///     tag_id INTEGER NOT NULL REFERENCES tags(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::error::ModelResult;
use crate::store::TaskTagStore;
use crate::validation::{check_reference, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Link between one task and one tag
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskTag {
    pub id: i32,
    pub task_id: i32,
    pub tag_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for linking a task to a tag
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskTag {
    pub task_id: i32,
    pub tag_id: i32,
}

pub fn validate_create(data: &CreateTaskTag) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_reference(&mut errors, "taskId", data.task_id);
    check_reference(&mut errors, "tagId", data.tag_id);
    errors.into_result()
}

impl TaskTag {
    /// Tags a task
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` on `taskId` if the task already has a tag
    ///   (`"taskId must be unique"`) or doesn't exist
    /// - `ModelError::Validation` on `tagId` if the tag doesn't exist
    pub async fn create<S>(store: &S, data: CreateTaskTag) -> ModelResult<Self>
    where
        S: TaskTagStore + ?Sized,
    {
        validate_create(&data)?;

        let link = store.insert_task_tag(data).await?;

        info!(task_id = link.task_id, tag_id = link.tag_id, "Tagged task");
        Ok(link)
    }

    /// The link of a task, if it has one
    pub async fn find_by_task<S>(store: &S, task_id: i32) -> ModelResult<Option<Self>>
    where
        S: TaskTagStore + ?Sized,
    {
        store.find_task_tag_by_task(task_id).await
    }
}
