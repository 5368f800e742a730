/// In-memory store
///
/// Keeps every table in a `BTreeMap` keyed by id behind one async lock, so a
/// uniqueness check and the write that follows it happen atomically. It
/// enforces the same constraints as the PostgreSQL schema and reports them
/// the same way, which lets model tests run without a database.
///
/// Cloning a `MemoryStore` shares the underlying tables.

use crate::error::{ModelError, ModelResult};
use crate::models::state::RecordState;
use crate::models::status::{CreateStatus, Status, UpdateStatus};
use crate::models::tag::{CreateTag, Tag};
use crate::models::task::{CreateTask, Task, TaskRole, UpdateTask};
use crate::models::task_tag::{CreateTaskTag, TaskTag};
use crate::models::user::{NewUser, User, UserChanges};
use crate::store::{StatusStore, TagStore, TaskStore, TaskTagStore, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    statuses: BTreeMap<i32, Status>,
    tags: BTreeMap<i32, Tag>,
    tasks: BTreeMap<i32, Task>,
    task_tags: BTreeMap<i32, TaskTag>,
}

/// Next serial value for a table
fn next_id<V>(table: &BTreeMap<i32, V>) -> i32 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

impl Tables {
    fn check_task_references(
        &self,
        status_id: Option<i32>,
        creator_id: Option<i32>,
        assigned_to_id: Option<i32>,
    ) -> ModelResult<()> {
        if let Some(id) = status_id {
            if !self.statuses.contains_key(&id) {
                return Err(ModelError::dangling_reference("statusId"));
            }
        }
        if let Some(id) = creator_id {
            if !self.users.contains_key(&id) {
                return Err(ModelError::dangling_reference("creatorId"));
            }
        }
        if let Some(id) = assigned_to_id {
            if !self.users.contains_key(&id) {
                return Err(ModelError::dangling_reference("assignedToId"));
            }
        }
        Ok(())
    }
}

/// Store keeping every record in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> ModelResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(ModelError::unique_violation("email"));
        }
        if tables.users.values().any(|u| u.uid == user.uid) {
            return Err(ModelError::unique_violation("uid"));
        }

        let now = Utc::now();
        let record = User {
            id: next_id(&tables.users),
            uid: user.uid,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_digest: user.password_digest,
            state: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: i32) -> ModelResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ModelResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> ModelResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }

        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(ModelError::unique_violation("email"));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_digest) = changes.password_digest {
            user.password_digest = password_digest;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_user_state(&self, id: i32, state: RecordState) -> ModelResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.state = state;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn list_users(&self, state: RecordState) -> ModelResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().filter(|u| u.state == state).cloned().collect())
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn insert_status(&self, status: CreateStatus) -> ModelResult<Status> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let record = Status {
            id: next_id(&tables.statuses),
            name: status.name,
            state: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        tables.statuses.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_status(&self, id: i32) -> ModelResult<Option<Status>> {
        Ok(self.tables.read().await.statuses.get(&id).cloned())
    }

    async fn update_status(&self, id: i32, changes: UpdateStatus) -> ModelResult<Option<Status>> {
        let mut tables = self.tables.write().await;
        Ok(tables.statuses.get_mut(&id).map(|status| {
            if let Some(name) = changes.name {
                status.name = name;
            }
            status.updated_at = Utc::now();
            status.clone()
        }))
    }

    async fn set_status_state(&self, id: i32, state: RecordState) -> ModelResult<Option<Status>> {
        let mut tables = self.tables.write().await;
        Ok(tables.statuses.get_mut(&id).map(|status| {
            status.state = state;
            status.updated_at = Utc::now();
            status.clone()
        }))
    }

    async fn list_statuses(&self, state: RecordState) -> ModelResult<Vec<Status>> {
        let tables = self.tables.read().await;
        Ok(tables.statuses.values().filter(|s| s.state == state).cloned().collect())
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn insert_tag(&self, tag: CreateTag) -> ModelResult<Tag> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let record = Tag {
            id: next_id(&tables.tags),
            name: tag.name,
            created_at: now,
            updated_at: now,
        };
        tables.tags.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_tag(&self, id: i32) -> ModelResult<Option<Tag>> {
        Ok(self.tables.read().await.tags.get(&id).cloned())
    }

    async fn list_tags(&self) -> ModelResult<Vec<Tag>> {
        Ok(self.tables.read().await.tags.values().cloned().collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: CreateTask) -> ModelResult<Task> {
        let mut tables = self.tables.write().await;
        tables.check_task_references(Some(task.status_id), Some(task.creator_id), task.assigned_to_id)?;

        let now = Utc::now();
        let record = Task {
            id: next_id(&tables.tasks),
            name: task.name,
            description: task.description,
            status_id: task.status_id,
            creator_id: task.creator_id,
            assigned_to_id: task.assigned_to_id,
            state: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_task(&self, id: i32) -> ModelResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn update_task(&self, id: i32, changes: UpdateTask) -> ModelResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&id) {
            return Ok(None);
        }
        tables.check_task_references(changes.status_id, None, changes.assigned_to_id.flatten())?;

        let Some(task) = tables.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            task.name = name;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status_id) = changes.status_id {
            task.status_id = status_id;
        }
        if let Some(assigned_to_id) = changes.assigned_to_id {
            task.assigned_to_id = assigned_to_id;
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn set_task_state(&self, id: i32, state: RecordState) -> ModelResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        Ok(tables.tasks.get_mut(&id).map(|task| {
            task.state = state;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn list_tasks(&self, state: RecordState) -> ModelResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().filter(|t| t.state == state).cloned().collect())
    }

    async fn list_tasks_for_user(&self, user_id: i32, role: TaskRole) -> ModelResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.state.is_active())
            .filter(|t| match role {
                TaskRole::Creator => t.creator_id == user_id,
                TaskRole::Assignee => t.assigned_to_id == Some(user_id),
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskTagStore for MemoryStore {
    async fn insert_task_tag(&self, link: CreateTaskTag) -> ModelResult<TaskTag> {
        let mut tables = self.tables.write().await;

        // Unique index fires before the foreign keys, as in Postgres
        if tables.task_tags.values().any(|l| l.task_id == link.task_id) {
            return Err(ModelError::unique_violation("taskId"));
        }
        if !tables.tasks.contains_key(&link.task_id) {
            return Err(ModelError::dangling_reference("taskId"));
        }
        if !tables.tags.contains_key(&link.tag_id) {
            return Err(ModelError::dangling_reference("tagId"));
        }

        let now = Utc::now();
        let record = TaskTag {
            id: next_id(&tables.task_tags),
            task_id: link.task_id,
            tag_id: link.tag_id,
            created_at: now,
            updated_at: now,
        };
        tables.task_tags.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_task_tag_by_task(&self, task_id: i32) -> ModelResult<Option<TaskTag>> {
        let tables = self.tables.read().await;
        Ok(tables.task_tags.values().find(|l| l.task_id == task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, uid: &str) -> NewUser {
        NewUser {
            uid: uid.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password_digest: String::new(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        let first = store.insert_tag(CreateTag { name: "a".to_string() }).await.unwrap();
        let second = store.insert_tag(CreateTag { name: "b".to_string() }).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.insert_status(CreateStatus { name: "New".to_string() }).await.unwrap();
        assert_eq!(other.list_statuses(RecordState::Active).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_uid_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com", "abc")).await.unwrap();
        let err = store.insert_user(new_user("b@example.com", "abc")).await.unwrap_err();
        assert!(err.field_errors().unwrap().has("uid", "uid must be unique"));
    }

    #[tokio::test]
    async fn test_update_keeps_own_email() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com", "abc")).await.unwrap();
        store.insert_user(new_user("b@example.com", "def")).await.unwrap();

        let same = UserChanges {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(store.update_user(user.id, same).await.unwrap().is_some());

        let taken = UserChanges {
            email: Some("b@example.com".to_string()),
            ..Default::default()
        };
        assert!(store.update_user(user.id, taken).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_user_with_taken_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com", "abc")).await.unwrap();

        let changes = UserChanges {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(store.update_user(99, changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_link_reported_before_missing_tag() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com", "abc")).await.unwrap();
        let status = store.insert_status(CreateStatus { name: "New".to_string() }).await.unwrap();
        let tag = store.insert_tag(CreateTag { name: "bug".to_string() }).await.unwrap();
        let task = store
            .insert_task(CreateTask {
                name: "Write".to_string(),
                status_id: status.id,
                creator_id: user.id,
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .insert_task_tag(CreateTaskTag { task_id: task.id, tag_id: tag.id })
            .await
            .unwrap();

        let err = store
            .insert_task_tag(CreateTaskTag { task_id: task.id, tag_id: tag.id + 10 })
            .await
            .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.has("taskId", "taskId must be unique"));
        assert!(errors.get("tagId").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let store = MemoryStore::new();
        assert!(store.update_task(3, UpdateTask::default()).await.unwrap().is_none());
        assert!(store.set_task_state(3, RecordState::Deleted).await.unwrap().is_none());
    }
}
