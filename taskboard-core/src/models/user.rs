/// User model and operations
///
/// Users sign in with email and password, create tasks and get tasks assigned
/// to them. A user is never removed; [`User::deactivate`] moves it to the
/// `deleted` state.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     uid VARCHAR(32) NOT NULL,          -- UNIQUE (users_uid_key)
///     first_name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,       -- UNIQUE (users_email_key)
///     password VARCHAR(255) NOT NULL,    -- Argon2id PHC string
///     state TEXT NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Validation
///
/// | field       | rules                                              |
/// |-------------|----------------------------------------------------|
/// | `firstName` | filled; 3 to 20 characters                         |
/// | `lastName`  | filled; 3 to 20 characters                         |
/// | `email`     | filled; valid address; unique (checked by store)   |
/// | `password`  | filled (before encryption)                         |
///
/// # Example
///
/// ```
/// use taskboard_core::models::user::{CreateUser, UpdateUser, User};
/// use taskboard_core::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let user = User::create(&store, CreateUser {
///     first_name: "Jane".to_string(),
///     last_name: "Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password: "secret".to_string(),
/// }).await?;
///
/// let renamed = User::update(&store, user.id, UpdateUser {
///     last_name: Some("Smith".to_string()),
///     ..Default::default()
/// }).await?;
/// assert_eq!(renamed.full_name(), "Smith Jane");
///
/// let found = User::authenticate(&store, "jane@example.com", "secret").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{encrypt_password, verify_password};
use crate::error::{ModelError, ModelResult};
use crate::models::state::RecordState;
use crate::models::task::{Task, TaskRole};
use crate::store::{TaskStore, UserStore};
use crate::validation::{check_email, check_length, check_not_empty, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Shortest accepted first or last name
pub const MIN_NAME_LENGTH: usize = 3;

/// Longest accepted first or last name
pub const MAX_NAME_LENGTH: usize = 20;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Surrogate key
    pub id: i32,

    /// Externally visible identifier, generated once at creation
    pub uid: String,

    pub first_name: String,

    pub last_name: String,

    /// Unique across all users, whatever their state
    pub email: String,

    /// Encrypted password; never serialized
    #[sqlx(rename = "password")]
    #[serde(skip)]
    pub password_digest: String,

    pub state: RecordState,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user, as submitted by the sign-up form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Plaintext; encrypted before it reaches the store
    pub password: String,
}

/// Partial update for a user
///
/// Only `Some` fields are validated and written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    /// Plaintext; encrypted before it reaches the store
    pub password: Option<String>,
}

/// Validated row handed to [`UserStore::insert_user`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_digest: String,
}

/// Validated changes handed to [`UserStore::update_user`]
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_digest: Option<String>,
}

fn check_name(errors: &mut FieldErrors, field: &str, value: &str) {
    check_not_empty(errors, field, value);
    check_length(errors, field, value, MIN_NAME_LENGTH, MAX_NAME_LENGTH);
}

fn check_user_email(errors: &mut FieldErrors, value: &str) {
    check_not_empty(errors, "email", value);
    check_email(errors, "email", value);
}

/// Validates a sign-up form
///
/// Email uniqueness is not checked here; the store reports it on insert.
pub fn validate_create(data: &CreateUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check_name(&mut errors, "firstName", &data.first_name);
    check_name(&mut errors, "lastName", &data.last_name);
    check_user_email(&mut errors, &data.email);
    check_not_empty(&mut errors, "password", &data.password);

    errors.into_result()
}

/// Validates the fields present in a partial update
pub fn validate_update(data: &UpdateUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(first_name) = &data.first_name {
        check_name(&mut errors, "firstName", first_name);
    }
    if let Some(last_name) = &data.last_name {
        check_name(&mut errors, "lastName", last_name);
    }
    if let Some(email) = &data.email {
        check_user_email(&mut errors, email);
    }
    if let Some(password) = &data.password {
        check_not_empty(&mut errors, "password", password);
    }

    errors.into_result()
}

/// New externally visible identifier (UUIDv4, 32 lowercase hex digits)
pub fn generate_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

impl User {
    /// `"{lastName} {firstName}"`
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Validates the form, encrypts the password and inserts the user
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` if a field rule fails or the email is taken
    /// - `ModelError::Password` / `ModelError::Database` on unexpected failures
    pub async fn create<S>(store: &S, data: CreateUser) -> ModelResult<Self>
    where
        S: UserStore + ?Sized,
    {
        validate_create(&data)?;

        let password_digest = encrypt_password(&data.password)?;

        let user = store
            .insert_user(NewUser {
                uid: generate_uid(),
                first_name: data.first_name,
                last_name: data.last_name,
                email: data.email,
                password_digest,
            })
            .await?;

        info!(user_id = user.id, uid = %user.uid, "Created user");
        Ok(user)
    }

    /// Finds a user by surrogate key
    pub async fn find_by_id<S>(store: &S, id: i32) -> ModelResult<Option<Self>>
    where
        S: UserStore + ?Sized,
    {
        store.find_user(id).await
    }

    /// Like [`User::find_by_id`], but a missing user is an error
    pub async fn get_by_id<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: UserStore + ?Sized,
    {
        store
            .find_user(id)
            .await?
            .ok_or_else(|| ModelError::not_found("User", id))
    }

    /// Finds a user by email, whatever its state
    pub async fn find_by_email<S>(store: &S, email: &str) -> ModelResult<Option<Self>>
    where
        S: UserStore + ?Sized,
    {
        store.find_user_by_email(email).await
    }

    /// Users in the `active` state, ordered by id
    pub async fn list_active<S>(store: &S) -> ModelResult<Vec<Self>>
    where
        S: UserStore + ?Sized,
    {
        store.list_users(RecordState::Active).await
    }

    /// Applies a partial update
    ///
    /// Present fields are re-validated; a new password is encrypted before
    /// it is written. `updated_at` is refreshed.
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` if a present field fails its rules or the new
    ///   email belongs to another user
    /// - `ModelError::NotFound` if no user has this id
    pub async fn update<S>(store: &S, id: i32, data: UpdateUser) -> ModelResult<Self>
    where
        S: UserStore + ?Sized,
    {
        validate_update(&data)?;

        let password_digest = data
            .password
            .as_deref()
            .map(encrypt_password)
            .transpose()?;

        let user = store
            .update_user(
                id,
                UserChanges {
                    first_name: data.first_name,
                    last_name: data.last_name,
                    email: data.email,
                    password_digest,
                },
            )
            .await?
            .ok_or_else(|| ModelError::not_found("User", id))?;

        debug!(user_id = user.id, "Updated user");
        Ok(user)
    }

    /// Soft-deletes a user
    pub async fn deactivate<S>(store: &S, id: i32) -> ModelResult<Self>
    where
        S: UserStore + ?Sized,
    {
        let user = store
            .set_user_state(id, RecordState::Deleted)
            .await?
            .ok_or_else(|| ModelError::not_found("User", id))?;

        info!(user_id = user.id, "Deactivated user");
        Ok(user)
    }

    /// Checks a login attempt
    ///
    /// Returns the user when the email belongs to an active user and the
    /// password matches. Unknown emails, deactivated users and wrong passwords
    /// all yield `None`.
    pub async fn authenticate<S>(store: &S, email: &str, password: &str) -> ModelResult<Option<Self>>
    where
        S: UserStore + ?Sized,
    {
        let user = match store.find_user_by_email(email).await? {
            Some(user) if user.is_active() => user,
            _ => return Ok(None),
        };

        if verify_password(password, &user.password_digest)? {
            Ok(Some(user))
        } else {
            debug!(user_id = user.id, "Password mismatch");
            Ok(None)
        }
    }

    /// Active tasks this user created
    pub async fn created_tasks<S>(&self, store: &S) -> ModelResult<Vec<Task>>
    where
        S: TaskStore + ?Sized,
    {
        Task::list_for_user(store, self.id, TaskRole::Creator).await
    }

    /// Active tasks assigned to this user
    pub async fn assigned_tasks<S>(&self, store: &S) -> ModelResult<Vec<Task>>
    where
        S: TaskStore + ?Sized,
    {
        Task::list_for_user(store, self.id, TaskRole::Assignee).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validation::{length_message, EMAIL_MESSAGE, FILL_MESSAGE};
    use std::time::Duration;

    fn jane() -> CreateUser {
        CreateUser {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_full_name() {
        let now = Utc::now();
        let user = User {
            id: 1,
            uid: generate_uid(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password_digest: String::new(),
            state: RecordState::Active,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(user.full_name(), "Doe Jane");
    }

    #[test]
    fn test_generate_uid() {
        let uid = generate_uid();
        assert_eq!(uid.len(), 32);
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(uid, generate_uid());
    }

    #[test]
    fn test_validate_create_accepts_valid_input() {
        assert!(validate_create(&jane()).is_ok());
    }

    #[test]
    fn test_validate_create_empty_first_name() {
        let errors = validate_create(&CreateUser {
            first_name: String::new(),
            ..jane()
        })
        .unwrap_err();

        assert!(errors.has("firstName", FILL_MESSAGE));
        assert!(errors.has("firstName", &length_message(3, 20)));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_validate_create_name_bounds() {
        for (name, ok) in [("Al", false), ("Ann", true), (&"x".repeat(20)[..], true), (&"x".repeat(21)[..], false)] {
            let result = validate_create(&CreateUser {
                last_name: name.to_string(),
                ..jane()
            });
            assert_eq!(result.is_ok(), ok, "last name {:?}", name);
        }
    }

    #[test]
    fn test_validate_create_bad_email_and_password() {
        let errors = validate_create(&CreateUser {
            email: "jane-at-example".to_string(),
            password: String::new(),
            ..jane()
        })
        .unwrap_err();

        assert!(errors.has("email", EMAIL_MESSAGE));
        assert!(errors.has("password", FILL_MESSAGE));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "password"]);
    }

    #[test]
    fn test_validate_update_only_checks_present_fields() {
        assert!(validate_update(&UpdateUser::default()).is_ok());

        let errors = validate_update(&UpdateUser {
            first_name: Some("Jo".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["firstName"]);
    }

    #[tokio::test]
    async fn test_create_encrypts_password() {
        let store = MemoryStore::new();
        let user = User::create(&store, jane()).await.unwrap();

        assert_ne!(user.password_digest, "secret");
        assert!(user.password_digest.starts_with("$argon2id$"));
        assert_eq!(user.state, RecordState::Active);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = MemoryStore::new();
        User::create(&store, jane()).await.unwrap();

        let err = User::create(
            &store,
            CreateUser {
                first_name: "Janet".to_string(),
                ..jane()
            },
        )
        .await
        .unwrap_err();

        let errors = err.field_errors().expect("validation error");
        assert!(errors.has("email", "email must be unique"));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_fields() {
        let store = MemoryStore::new();
        let user = User::create(&store, jane()).await.unwrap();

        let err = User::update(
            &store,
            user.id,
            UpdateUser {
                email: Some("nope".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(err.field_errors().unwrap().has("email", EMAIL_MESSAGE));
        let unchanged = User::get_by_id(&store, user.id).await.unwrap();
        assert_eq!(unchanged.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryStore::new();
        let err = User::update(&store, 99, UpdateUser::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_password_reencrypts() {
        let store = MemoryStore::new();
        let user = User::create(&store, jane()).await.unwrap();

        User::update(
            &store,
            user.id,
            UpdateUser {
                password: Some("new-secret".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(User::authenticate(&store, "jane@example.com", "secret").await.unwrap().is_none());
        assert!(User::authenticate(&store, "jane@example.com", "new-secret").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mutations_refresh_updated_at() {
        let store = MemoryStore::new();
        let user = User::create(&store, jane()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let renamed = User::update(
            &store,
            user.id,
            UpdateUser {
                first_name: Some("Janet".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(renamed.updated_at > user.updated_at);
        assert_eq!(renamed.created_at, user.created_at);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let deactivated = User::deactivate(&store, user.id).await.unwrap();
        assert!(deactivated.updated_at > renamed.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_user_with_taken_email() {
        let store = MemoryStore::new();
        User::create(&store, jane()).await.unwrap();

        let err = User::update(
            &store,
            99,
            UpdateUser {
                email: Some("jane@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_authenticate() {
        let store = MemoryStore::new();
        let user = User::create(&store, jane()).await.unwrap();

        let deactivated = User::deactivate(&store, user.id).await.unwrap();
        assert_eq!(deactivated.state, RecordState::Deleted);

        assert!(User::authenticate(&store, "jane@example.com", "secret").await.unwrap().is_none());
        assert!(User::list_active(&store).await.unwrap().is_empty());
        assert!(User::find_by_id(&store, user.id).await.unwrap().is_some());
    }
}
