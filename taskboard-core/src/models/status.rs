/// Status model and operations
///
/// Statuses are the workflow columns tasks move through ("new", "in progress",
/// "done", ...). Deleting a status is a state transition: tasks keep pointing
/// at it and it simply drops out of [`Status::list_active`].
///
/// Names are not unique; two statuses may share one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE statuses (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     state TEXT NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::error::{ModelError, ModelResult};
use crate::models::state::RecordState;
use crate::store::StatusStore;
use crate::validation::{check_name, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Workflow status
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: i32,
    pub name: String,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatus {
    pub name: String,
}

/// Partial update for a status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub name: Option<String>,
}

pub fn validate_create(data: &CreateStatus) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, "name", &data.name);
    errors.into_result()
}

pub fn validate_update(data: &UpdateStatus) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &data.name {
        check_name(&mut errors, "name", name);
    }
    errors.into_result()
}

impl Status {
    pub async fn create<S>(store: &S, data: CreateStatus) -> ModelResult<Self>
    where
        S: StatusStore + ?Sized,
    {
        validate_create(&data)?;

        let status = store.insert_status(data).await?;

        info!(status_id = status.id, name = %status.name, "Created status");
        Ok(status)
    }

    pub async fn find_by_id<S>(store: &S, id: i32) -> ModelResult<Option<Self>>
    where
        S: StatusStore + ?Sized,
    {
        store.find_status(id).await
    }

    /// Like [`Status::find_by_id`], but a missing status is an error
    pub async fn get_by_id<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: StatusStore + ?Sized,
    {
        store
            .find_status(id)
            .await?
            .ok_or_else(|| ModelError::not_found("Status", id))
    }

    /// Statuses not soft-deleted, ordered by id
    pub async fn list_active<S>(store: &S) -> ModelResult<Vec<Self>>
    where
        S: StatusStore + ?Sized,
    {
        store.list_statuses(RecordState::Active).await
    }

    pub async fn update<S>(store: &S, id: i32, data: UpdateStatus) -> ModelResult<Self>
    where
        S: StatusStore + ?Sized,
    {
        validate_update(&data)?;

        store
            .update_status(id, data)
            .await?
            .ok_or_else(|| ModelError::not_found("Status", id))
    }

    /// Moves a status to `deleted`
    ///
    /// Tasks referencing it are left untouched.
    pub async fn soft_delete<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: StatusStore + ?Sized,
    {
        let status = store
            .set_status_state(id, RecordState::Deleted)
            .await?
            .ok_or_else(|| ModelError::not_found("Status", id))?;

        info!(status_id = status.id, "Soft-deleted status");
        Ok(status)
    }
}
