//! Player profile view with inventory and quest log resolved against the catalog.

use serde::Serialize;

use crate::game::errors::GameError;
use crate::game::ids::{EntityId, PlayerId};
use crate::game::inventory::HasEntityId;
use crate::game::leveling::experience_to_next_level;
use crate::game::storage::GameStore;
use crate::game::types::{ItemRecord, PlayerQuest, PlayerSummary, QuestRecord};

/// A catalog reference that may or may not resolve. Unknown ids are kept so
/// nothing silently disappears from the player's view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Populated<T> {
    Record(T),
    Id(EntityId),
}

impl<T> Populated<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            Populated::Record(record) => Some(record),
            Populated::Id(_) => None,
        }
    }
}

impl HasEntityId for Populated<ItemRecord> {
    fn entity_id(&self) -> &EntityId {
        match self {
            Populated::Record(item) => &item.id,
            Populated::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestLogEntry {
    #[serde(flatten)]
    pub entry: PlayerQuest,
    pub quest: Populated<QuestRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub player: PlayerSummary,
    pub experience_to_next_level: u64,
    pub inventory: Vec<Populated<ItemRecord>>,
    pub quests: Vec<QuestLogEntry>,
}

/// Load a player and resolve inventory and quest ids.
pub fn player_profile(store: &GameStore, player_id: &PlayerId) -> Result<PlayerProfile, GameError> {
    let player = store.get_player(player_id)?;

    let mut inventory = Vec::with_capacity(player.inventory.len());
    for id in &player.inventory {
        inventory.push(match store.try_get_item(id)? {
            Some(item) => Populated::Record(item),
            None => Populated::Id(id.clone()),
        });
    }

    let mut quests = Vec::with_capacity(player.quests.len());
    for entry in &player.quests {
        let quest = match store.try_get_quest(&entry.quest_id)? {
            Some(quest) => Populated::Record(quest),
            None => Populated::Id(entry.quest_id.clone()),
        };
        quests.push(QuestLogEntry {
            entry: entry.clone(),
            quest,
        });
    }

    Ok(PlayerProfile {
        experience_to_next_level: experience_to_next_level(player.experience),
        player: player.summary(),
        inventory,
        quests,
    })
}

pub fn format_profile(profile: &PlayerProfile) -> String {
    let p = &profile.player;
    let mut out = format!("=== {} ===\n", p.name);
    out.push_str(&format!(
        "Level {} | {} xp ({} to next level)\n",
        p.level, p.experience, profile.experience_to_next_level
    ));

    out.push_str(&format!("Inventory ({}):\n", profile.inventory.len()));
    for entry in &profile.inventory {
        match entry {
            Populated::Record(item) => out.push_str(&format!("  {} [{}]\n", item.name, item.kind)),
            Populated::Id(id) => out.push_str(&format!("  unknown item {}\n", id)),
        }
    }

    out.push_str(&format!("Quests ({}):\n", profile.quests.len()));
    for log_entry in &profile.quests {
        let title = match &log_entry.quest {
            Populated::Record(quest) => quest.title.clone(),
            Populated::Id(id) => format!("removed quest {}", id),
        };
        out.push_str(&format!("  {} ({})\n", title, log_entry.entry.status));
    }
    out
}
