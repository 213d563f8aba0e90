//! Canonical identifiers for players, items and quests.
//!
//! Identifiers reach the game from several places: JSON seed files, CLI
//! arguments, and records written by older tooling that embedded the id in
//! an object (`{"_id": "..."}` or `{"$oid": "..."}`). Every one of those
//! shapes is funnelled through [`EntityId::parse`] so the rest of the crate
//! only ever compares one representation.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted identifier length in bytes.
pub const MAX_ID_LEN: usize = 64;

/// Reasons an identifier can be rejected during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier is too long (maximum {max} bytes)")]
    TooLong { max: usize },

    #[error("identifier contains whitespace or control characters")]
    InvalidCharacters,
}

/// Canonical identifier: trimmed, non-empty, no inner whitespace or control
/// characters. Comparison is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

pub type PlayerId = EntityId;
pub type ItemId = EntityId;
pub type QuestId = EntityId;

impl EntityId {
    /// Normalize raw identifier text into its canonical form.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() > MAX_ID_LEN {
            return Err(IdError::TooLong { max: MAX_ID_LEN });
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdError::InvalidCharacters);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Fresh fixed-width (32 hex chars) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Identifier shapes accepted from human-readable input (JSON, TOML).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdRef {
    Text(String),
    Number(u64),
    Embedded(EmbeddedId),
}

/// An id wrapped in an object, e.g. a populated record or an ObjectId export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddedId {
    #[serde(alias = "_id", alias = "$oid")]
    pub id: Box<IdRef>,
}

impl TryFrom<IdRef> for EntityId {
    type Error = IdError;

    fn try_from(value: IdRef) -> Result<Self, Self::Error> {
        match value {
            IdRef::Text(text) => EntityId::parse(&text),
            IdRef::Number(n) => EntityId::parse(&n.to_string()),
            IdRef::Embedded(embedded) => EntityId::try_from(*embedded.id),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // bincode cannot drive untagged enums; binary records only ever hold
        // the canonical string.
        if deserializer.is_human_readable() {
            let raw = IdRef::deserialize(deserializer)?;
            EntityId::try_from(raw).map_err(de::Error::custom)
        } else {
            let raw = String::deserialize(deserializer)?;
            EntityId::parse(&raw).map_err(de::Error::custom)
        }
    }
}
