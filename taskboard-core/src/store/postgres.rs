/// PostgreSQL store
///
/// Runs the entity queries against a `sqlx` pool. Tables and constraint names
/// come from the migrations in `migrations/`; unique and foreign-key violations
/// are translated into field errors by constraint name.
///
/// # Example
///
/// ```no_run
/// use taskboard_core::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_core::models::tag::{CreateTag, Tag};
/// use taskboard_core::store::PgStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let tag = Tag::create(&store, CreateTag { name: "bug".to_string() }).await?;
/// # Ok(())
/// # }
/// ```

use crate::error::{ModelError, ModelResult};
use crate::models::schema::{schema, EntityKind};
use crate::models::state::RecordState;
use crate::models::status::{CreateStatus, Status, UpdateStatus};
use crate::models::tag::{CreateTag, Tag};
use crate::models::task::{CreateTask, Task, TaskRole, UpdateTask};
use crate::models::task_tag::{CreateTaskTag, TaskTag};
use crate::models::user::{NewUser, User, UserChanges};
use crate::store::{StatusStore, TagStore, TaskStore, TaskTagStore, UserStore};
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::PgPool;
use tracing::debug;

const USER_COLUMNS: &str =
    "id, uid, first_name, last_name, email, password, state, created_at, updated_at";
const STATUS_COLUMNS: &str = "id, name, state, created_at, updated_at";
const TAG_COLUMNS: &str = "id, name, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, name, description, status_id, creator_id, assigned_to_id, state, created_at, updated_at";
const TASK_TAG_COLUMNS: &str = "id, task_id, tag_id, created_at, updated_at";

/// Form field guarded by a named constraint
fn constraint_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "users_email_key" => Some("email"),
        "users_uid_key" => Some("uid"),
        "tasks_status_id_fkey" => Some("statusId"),
        "tasks_creator_id_fkey" => Some("creatorId"),
        "tasks_assigned_to_id_fkey" => Some("assignedToId"),
        "task_tags_task_id_key" | "task_tags_task_id_fkey" => Some("taskId"),
        "task_tags_tag_id_fkey" => Some("tagId"),
        _ => None,
    }
}

/// Turns constraint violations into field errors; everything else stays a database error
fn map_db_error(err: sqlx::Error) -> ModelError {
    let violation = match &err {
        sqlx::Error::Database(db_err) => db_err
            .constraint()
            .and_then(constraint_field)
            .map(|field| (db_err.kind(), field)),
        _ => None,
    };

    match violation {
        Some((ErrorKind::UniqueViolation, field)) => {
            debug!(field, "Unique constraint violated");
            ModelError::unique_violation(field)
        }
        Some((ErrorKind::ForeignKeyViolation, field)) => {
            debug!(field, "Foreign key constraint violated");
            ModelError::dangling_reference(field)
        }
        _ => ModelError::Database(err),
    }
}

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> ModelResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (uid, first_name, last_name, email, password)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.uid)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(user.password_digest)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn find_user(&self, id: i32) -> ModelResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_user_by_email(&self, email: &str) -> ModelResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> ModelResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 email = COALESCE($4, email),
                 password = COALESCE($5, password),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.password_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn set_user_state(&self, id: i32, state: RecordState) -> ModelResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET state = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn list_users(&self, state: RecordState) -> ModelResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE state = $1 ORDER BY id",
            USER_COLUMNS
        ))
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl StatusStore for PgStore {
    async fn insert_status(&self, status: CreateStatus) -> ModelResult<Status> {
        sqlx::query_as::<_, Status>(&format!(
            "INSERT INTO statuses (name) VALUES ($1) RETURNING {}",
            STATUS_COLUMNS
        ))
        .bind(status.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn find_status(&self, id: i32) -> ModelResult<Option<Status>> {
        sqlx::query_as::<_, Status>(&format!("SELECT {} FROM statuses WHERE id = $1", STATUS_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn update_status(&self, id: i32, changes: UpdateStatus) -> ModelResult<Option<Status>> {
        sqlx::query_as::<_, Status>(&format!(
            "UPDATE statuses
             SET name = COALESCE($2, name), updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            STATUS_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn set_status_state(&self, id: i32, state: RecordState) -> ModelResult<Option<Status>> {
        sqlx::query_as::<_, Status>(&format!(
            "UPDATE statuses SET state = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            STATUS_COLUMNS
        ))
        .bind(id)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn list_statuses(&self, state: RecordState) -> ModelResult<Vec<Status>> {
        sqlx::query_as::<_, Status>(&format!(
            "SELECT {} FROM statuses WHERE state = $1 ORDER BY id",
            STATUS_COLUMNS
        ))
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl TagStore for PgStore {
    async fn insert_tag(&self, tag: CreateTag) -> ModelResult<Tag> {
        sqlx::query_as::<_, Tag>(&format!(
            "INSERT INTO tags (name) VALUES ($1) RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(tag.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn find_tag(&self, id: i32) -> ModelResult<Option<Tag>> {
        sqlx::query_as::<_, Tag>(&format!("SELECT {} FROM tags WHERE id = $1", TAG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn list_tags(&self) -> ModelResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(&format!("SELECT {} FROM tags ORDER BY id", TAG_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: CreateTask) -> ModelResult<Task> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (name, description, status_id, creator_id, assigned_to_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.name)
        .bind(task.description)
        .bind(task.status_id)
        .bind(task.creator_id)
        .bind(task.assigned_to_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn find_task(&self, id: i32) -> ModelResult<Option<Task>> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn update_task(&self, id: i32, changes: UpdateTask) -> ModelResult<Option<Task>> {
        // Nullable columns can be cleared, so COALESCE won't do here
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if changes.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if changes.status_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status_id = ${}", bind_count));
        }
        if changes.assigned_to_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to_id = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(description) = changes.description {
            q = q.bind(description);
        }
        if let Some(status_id) = changes.status_id {
            q = q.bind(status_id);
        }
        if let Some(assigned_to_id) = changes.assigned_to_id {
            q = q.bind(assigned_to_id);
        }

        q.fetch_optional(&self.pool).await.map_err(map_db_error)
    }

    async fn set_task_state(&self, id: i32, state: RecordState) -> ModelResult<Option<Task>> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET state = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn list_tasks(&self, state: RecordState) -> ModelResult<Vec<Task>> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE state = $1 ORDER BY id",
            TASK_COLUMNS
        ))
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn list_tasks_for_user(&self, user_id: i32, role: TaskRole) -> ModelResult<Vec<Task>> {
        let foreign_key = schema()
            .association(EntityKind::User, role.alias())
            .map(|association| association.foreign_key)
            .ok_or_else(|| sqlx::Error::ColumnNotFound(role.alias().to_string()))?;

        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE {} = $1 AND state = $2 ORDER BY id",
            TASK_COLUMNS, foreign_key
        ))
        .bind(user_id)
        .bind(RecordState::Active.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl TaskTagStore for PgStore {
    async fn insert_task_tag(&self, link: CreateTaskTag) -> ModelResult<TaskTag> {
        sqlx::query_as::<_, TaskTag>(&format!(
            "INSERT INTO task_tags (task_id, tag_id) VALUES ($1, $2) RETURNING {}",
            TASK_TAG_COLUMNS
        ))
        .bind(link.task_id)
        .bind(link.tag_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn find_task_tag_by_task(&self, task_id: i32) -> ModelResult<Option<TaskTag>> {
        sqlx::query_as::<_, TaskTag>(&format!(
            "SELECT {} FROM task_tags WHERE task_id = $1",
            TASK_TAG_COLUMNS
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_fields() {
        assert_eq!(constraint_field("users_email_key"), Some("email"));
        assert_eq!(constraint_field("task_tags_task_id_key"), Some("taskId"));
        assert_eq!(constraint_field("tasks_assigned_to_id_fkey"), Some("assignedToId"));
        assert_eq!(constraint_field("statuses_pkey"), None);
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, ModelError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_role_columns_resolve() {
        for (role, column) in [(TaskRole::Creator, "creator_id"), (TaskRole::Assignee, "assigned_to_id")] {
            let association = schema().association(EntityKind::User, role.alias()).unwrap();
            assert_eq!(association.foreign_key, column);
        }
    }
}
