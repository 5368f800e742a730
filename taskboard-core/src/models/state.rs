/// Soft-delete marker
///
/// Users, statuses and tasks are never removed by the entity layer. Deleting
/// one moves it to `Deleted`; listings meant for display filter on `Active`.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a soft-deletable record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Visible in listings (default for new records)
    #[default]
    Active,

    /// Soft-deleted; kept in storage, hidden from active listings
    Deleted,
}

impl RecordState {
    /// Converts state to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordState::Active => "active",
            RecordState::Deleted => "deleted",
        }
    }

    /// Parses state from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(RecordState::Active),
            "deleted" => Some(RecordState::Deleted),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RecordState::Active)
    }
}
