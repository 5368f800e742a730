/// Entity definitions for taskboard
///
/// Each entity module holds the record type, its create/update inputs, the
/// explicit validation functions for those inputs, and the operations that run
/// against a store handle.
///
/// # Models
///
/// - `user`: Accounts; creators and assignees of tasks
/// - `status`: Workflow statuses a task can be in
/// - `task`: Tasks with a creator, an optional assignee, a status and a tag
/// - `tag`: Labels attached to tasks
/// - `task_tag`: Join records between tasks and tags
/// - `schema`: Entity list and association graph
/// - `state`: Soft-delete marker shared by users, statuses and tasks
///
/// # Example
///
/// ```
/// use taskboard_core::models::status::{CreateStatus, Status};
/// use taskboard_core::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let status = Status::create(&store, CreateStatus { name: "In progress".to_string() }).await?;
/// Status::soft_delete(&store, status.id).await?;
///
/// assert!(Status::list_active(&store).await?.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod schema;
pub mod state;
pub mod status;
pub mod tag;
pub mod task;
pub mod task_tag;
pub mod user;

pub use state::RecordState;
