use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::ids::{ItemId, PlayerId, QuestId};
use crate::game::leveling::{derive_level, RewardPackage, STARTING_LEVEL};

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const ITEM_SCHEMA_VERSION: u8 = 1;
pub const QUEST_SCHEMA_VERSION: u8 = 1;
pub const SESSION_SCHEMA_VERSION: u8 = 1;

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Armor,
    Potion,
    #[default]
    QuestItem,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemKind::Weapon => "weapon",
            ItemKind::Armor => "armor",
            ItemKind::Potion => "potion",
            ItemKind::QuestItem => "quest_item",
        };
        f.write_str(label)
    }
}

/// Catalog entry for an item players can hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub effect: String,
    pub value: u32,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl ItemRecord {
    pub fn new(id: ItemId, name: &str, effect: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: ItemKind::default(),
            effect: effect.to_string(),
            value: 0,
            created_at: Utc::now(),
            schema_version: ITEM_SCHEMA_VERSION,
        }
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }
}

// ============================================================================
// Quests
// ============================================================================

/// Progress of a quest in one player's quest log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Available,
    InProgress,
    Completed,
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestStatus::Available => "available",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Quest definition shared by all players.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestRecord {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    /// Recommended player level.
    pub level: u64,
    pub rewards: RewardPackage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl QuestRecord {
    pub fn new(id: QuestId, title: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            level: STARTING_LEVEL,
            rewards: RewardPackage::default(),
            created_at: now,
            updated_at: now,
            schema_version: QUEST_SCHEMA_VERSION,
        }
    }

    pub fn with_level(mut self, level: u64) -> Self {
        self.level = level.max(STARTING_LEVEL);
        self
    }

    pub fn with_rewards(mut self, rewards: RewardPackage) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Entry in a player's quest log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerQuest {
    pub quest_id: QuestId,
    pub status: QuestStatus,
    pub accepted_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PlayerQuest {
    pub fn accepted(quest_id: QuestId) -> Self {
        Self {
            quest_id,
            status: QuestStatus::InProgress,
            accepted_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == QuestStatus::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.status == QuestStatus::Completed
    }

    pub fn mark_completed(&mut self) {
        self.status = QuestStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

// ============================================================================
// Players
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    /// Lowercased login email.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Cached `derive_level(experience)`.
    pub level: u64,
    pub experience: u64,
    /// Held item ids in acquisition order; duplicates are separate entries.
    pub inventory: Vec<ItemId>,
    pub quests: Vec<PlayerQuest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(id: PlayerId, name: &str, email: &str, password_hash: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            level: STARTING_LEVEL,
            experience: 0,
            inventory: Vec::new(),
            quests: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn quest_entry(&self, quest_id: &QuestId) -> Option<&PlayerQuest> {
        self.quests.iter().find(|pq| pq.quest_id == *quest_id)
    }

    /// True when the cached level agrees with the stored experience.
    pub fn level_is_consistent(&self) -> bool {
        self.level == derive_level(self.experience)
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            level: self.level,
            experience: self.experience,
        }
    }
}

/// Public view of a player; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub email: String,
    pub level: u64,
    pub experience: u64,
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub token: String,
    pub player_id: PlayerId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl SessionRecord {
    pub fn new(token: String, player_id: PlayerId, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            token,
            player_id,
            issued_at,
            expires_at: issued_at + ttl,
            schema_version: SESSION_SCHEMA_VERSION,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
