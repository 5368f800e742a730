/// Tag model and operations
///
/// Tags are free-form labels. They are attached to tasks through
/// [`crate::models::task_tag::TaskTag`].

use crate::error::{ModelError, ModelResult};
use crate::store::TagStore;
use crate::validation::{check_name, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Task label
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTag {
    pub name: String,
}

pub fn validate_create(data: &CreateTag) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, "name", &data.name);
    errors.into_result()
}

impl Tag {
    pub async fn create<S>(store: &S, data: CreateTag) -> ModelResult<Self>
    where
        S: TagStore + ?Sized,
    {
        validate_create(&data)?;

        let tag = store.insert_tag(data).await?;

        info!(tag_id = tag.id, name = %tag.name, "Created tag");
        Ok(tag)
    }

    pub async fn find_by_id<S>(store: &S, id: i32) -> ModelResult<Option<Self>>
    where
        S: TagStore + ?Sized,
    {
        store.find_tag(id).await
    }

    pub async fn get_by_id<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: TagStore + ?Sized,
    {
        store
            .find_tag(id)
            .await?
            .ok_or_else(|| ModelError::not_found("Tag", id))
    }

    /// Every tag, ordered by id
    pub async fn list<S>(store: &S) -> ModelResult<Vec<Self>>
    where
        S: TagStore + ?Sized,
    {
        store.list_tags().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validation::{length_message, FILL_MESSAGE, MAX_COLUMN_LENGTH};

    #[tokio::test]
    async fn test_create_and_list() {
        let store = MemoryStore::new();
        let bug = Tag::create(&store, CreateTag { name: "bug".to_string() }).await.unwrap();
        Tag::create(&store, CreateTag { name: "docs".to_string() }).await.unwrap();

        let names: Vec<String> = Tag::list(&store).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["bug", "docs"]);
        assert_eq!(Tag::get_by_id(&store, bug.id).await.unwrap().name, "bug");
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let store = MemoryStore::new();
        let err = Tag::create(&store, CreateTag::default()).await.unwrap_err();
        assert!(err.field_errors().unwrap().has("name", FILL_MESSAGE));
        assert!(Tag::list(&store).await.unwrap().is_empty());
    }

    #[test]
    fn test_name_fits_column() {
        let at_limit = CreateTag { name: "x".repeat(MAX_COLUMN_LENGTH) };
        assert!(validate_create(&at_limit).is_ok());

        let too_long = CreateTag { name: "x".repeat(MAX_COLUMN_LENGTH + 1) };
        let errors = validate_create(&too_long).unwrap_err();
        assert!(errors.has("name", &length_message(1, MAX_COLUMN_LENGTH)));
    }
}
