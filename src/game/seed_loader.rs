//! Seed data loaders for the item and quest catalog.
//!
//! Seeds live in `data/seeds/` as JSON so admins can customize the starting
//! catalog without recompiling. Identifiers in seed files may be plain
//! strings or embedded objects; rewards may omit any field.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::game::errors::GameError;
use crate::game::ids::{ItemId, QuestId};
use crate::game::leveling::{RewardConfig, RewardPackage};
use crate::game::types::{ItemKind, ItemRecord, QuestRecord};
use crate::validation::{required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};

pub const ITEMS_SEED_FILE: &str = "items.json";
pub const QUESTS_SEED_FILE: &str = "quests.json";

#[derive(Debug, Deserialize)]
struct ItemSeed {
    #[serde(alias = "_id")]
    id: ItemId,
    name: String,
    #[serde(default, rename = "type", alias = "kind")]
    kind: ItemKind,
    effect: String,
    #[serde(default)]
    value: u32,
}

#[derive(Debug, Deserialize)]
struct QuestSeed {
    #[serde(alias = "_id")]
    id: QuestId,
    title: String,
    description: String,
    #[serde(default)]
    level: Option<u64>,
    #[serde(default)]
    rewards: Option<RewardConfig>,
}

fn read_seed_file(path: &Path) -> Result<String, GameError> {
    fs::read_to_string(path).map_err(|e| {
        GameError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })
}

/// Load items from data/seeds/items.json
pub fn load_items_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<ItemRecord>, GameError> {
    let path = path.as_ref();
    let contents = read_seed_file(path)?;
    let seeds: Vec<ItemSeed> = serde_json::from_str(&contents)?;

    seeds
        .into_iter()
        .map(|seed| -> Result<ItemRecord, GameError> {
            let name = required_text("name", &seed.name, MAX_TITLE_LEN)?;
            let effect = required_text("effect", &seed.effect, MAX_TEXT_LEN)?;
            Ok(ItemRecord::new(seed.id, &name, &effect)
                .with_kind(seed.kind)
                .with_value(seed.value))
        })
        .collect()
}

/// Load quests from data/seeds/quests.json
pub fn load_quests_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<QuestRecord>, GameError> {
    let path = path.as_ref();
    let contents = read_seed_file(path)?;
    let seeds: Vec<QuestSeed> = serde_json::from_str(&contents)?;

    seeds
        .into_iter()
        .map(|seed| -> Result<QuestRecord, GameError> {
            let title = required_text("title", &seed.title, MAX_TITLE_LEN)?;
            let description = required_text("description", &seed.description, MAX_TEXT_LEN)?;
            let mut quest = QuestRecord::new(seed.id, &title, &description)
                .with_rewards(RewardPackage::from(seed.rewards));
            if let Some(level) = seed.level {
                quest = quest.with_level(level);
            }
            Ok(quest)
        })
        .collect()
}
