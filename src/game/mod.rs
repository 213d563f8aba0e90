//! Quest board domain: identifiers, records, the leveling engine, inventory
//! checks and the workflows that tie them to the sled-backed store.

pub mod auth;
pub mod errors;
pub mod ids;
pub mod inventory;
pub mod items;
pub mod leveling;
pub mod profile;
pub mod quest;
pub mod seed_loader;
pub mod storage;
pub mod types;

pub use auth::{AuthService, AuthSession, DEFAULT_MIN_PASSWORD_LEN, DEFAULT_SESSION_TTL_HOURS};
pub use errors::GameError;
pub use ids::{EntityId, IdError, IdRef, ItemId, PlayerId, QuestId};
pub use inventory::{find_item, format_inventory, use_item, HasEntityId, InventoryLookup, ItemUse};
pub use items::{create_item, format_item, format_item_list, get_item, list_items, ItemDraft};
pub use leveling::{
    apply_quest_reward, derive_level, experience_for_level, experience_to_next_level,
    QuestRewardResult, RewardConfig, RewardPackage, EXPERIENCE_PER_LEVEL, STARTING_LEVEL,
};
pub use profile::{format_profile, player_profile, PlayerProfile, Populated, QuestLogEntry};
pub use quest::{
    accept_quest, complete_quest, create_quest, delete_quest, format_quest_completion,
    format_quest_list, get_quest, list_quests, update_quest, QuestCompletion, QuestDraft,
    QuestPage, QuestPatch, QuestQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use seed_loader::{load_items_from_json, load_quests_from_json};
pub use storage::{GameStore, GameStoreBuilder};
pub use types::*;
