use thiserror::Error;

use crate::game::ids::{IdError, ItemId, QuestId};
use crate::game::types::QuestStatus;
use crate::validation::ValidationError;

/// Errors that can arise while running game workflows against the store.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON seed or draft input.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("email already registered")]
    EmailTaken,

    #[error("quest title already exists: {0}")]
    QuestTitleTaken(String),

    #[error("item name already exists: {0}")]
    ItemNameTaken(String),

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid session token")]
    InvalidSession,

    #[error("session expired")]
    SessionExpired,

    #[error("quest already accepted (status: {status})")]
    QuestAlreadyAccepted { status: QuestStatus },

    #[error("quest not accepted by player: {0}")]
    QuestNotAccepted(QuestId),

    /// Completion guard: only `in_progress` quests pay out.
    #[error("quest is already {status}")]
    QuestNotInProgress { status: QuestStatus },

    #[error("item not found in inventory: {0}")]
    ItemNotInInventory(ItemId),

    #[error("password hash failure: {0}")]
    PasswordHash(String),

    /// Internal error (unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// True for errors caused by the request rather than the server.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            GameError::Sled(_)
                | GameError::Bincode(_)
                | GameError::Io(_)
                | GameError::SchemaMismatch { .. }
                | GameError::PasswordHash(_)
                | GameError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_workflow_wording() {
        let err = GameError::QuestNotInProgress {
            status: QuestStatus::Completed,
        };
        assert_eq!(err.to_string(), "quest is already completed");
        assert!(err.is_user_error());

        let err = GameError::Internal("boom".into());
        assert!(!err.is_user_error());
    }
}
