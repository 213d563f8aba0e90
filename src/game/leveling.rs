//! Experience, leveling and quest reward calculation.
//!
//! Everything here is pure: callers load a player's `(experience, level)`,
//! hand it to [`apply_quest_reward`] together with the quest's
//! [`RewardPackage`], and persist the returned [`QuestRewardResult`] in a
//! single atomic update. Nothing in this module touches the store.
//!
//! The curve is flat: every level costs [`EXPERIENCE_PER_LEVEL`] points, so
//! `level = experience / 100 + 1`.

use serde::{Deserialize, Serialize};

use crate::game::ids::ItemId;

/// Experience points required for each level.
pub const EXPERIENCE_PER_LEVEL: u64 = 100;

/// Level of a player with no experience.
pub const STARTING_LEVEL: u64 = 1;

/// Level implied by a total experience value.
pub fn derive_level(experience: u64) -> u64 {
    experience / EXPERIENCE_PER_LEVEL + STARTING_LEVEL
}

/// Total experience at which `level` begins. Levels below 1 start at 0.
pub fn experience_for_level(level: u64) -> u64 {
    level
        .saturating_sub(STARTING_LEVEL)
        .saturating_mul(EXPERIENCE_PER_LEVEL)
}

/// Experience still needed to reach the next level.
pub fn experience_to_next_level(experience: u64) -> u64 {
    let next = derive_level(experience).saturating_add(1);
    experience_for_level(next).saturating_sub(experience)
}

/// Reward definition as it arrives from quest seeds or admin input. Any field
/// may be missing; normalize with [`RewardPackage::from_config`] before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default)]
    pub experience: Option<u64>,
    #[serde(default)]
    pub item: Option<ItemId>,
}

/// Fully populated reward attached to a quest: an experience amount and at
/// most one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPackage {
    pub experience: u64,
    pub item: Option<ItemId>,
}

impl RewardPackage {
    pub fn new(experience: u64, item: Option<ItemId>) -> Self {
        Self { experience, item }
    }

    pub fn experience_only(experience: u64) -> Self {
        Self::new(experience, None)
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    /// Fill in defaults for a possibly partial (or absent) reward: missing
    /// experience is 0, missing item is no item.
    pub fn from_config(config: Option<&RewardConfig>) -> Self {
        Self::from(config.cloned())
    }

    /// Override only the fields `patch` supplies and keep the rest.
    pub fn merged(mut self, patch: RewardConfig) -> Self {
        if let Some(experience) = patch.experience {
            self.experience = experience;
        }
        if let Some(item) = patch.item {
            self.item = Some(item);
        }
        self
    }
}

impl From<RewardConfig> for RewardPackage {
    fn from(config: RewardConfig) -> Self {
        Self {
            experience: config.experience.unwrap_or(0),
            item: config.item,
        }
    }
}

impl From<Option<RewardConfig>> for RewardPackage {
    fn from(config: Option<RewardConfig>) -> Self {
        config.map(Self::from).unwrap_or_default()
    }
}

/// Outcome of awarding a quest's reward to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRewardResult {
    pub experience_reward: u64,
    pub new_experience: u64,
    pub new_level: u64,
    pub leveled_up: bool,
    /// Zero or one item ids, in list form for uniform handling.
    pub item_rewards: Vec<ItemId>,
}

impl QuestRewardResult {
    /// Levels gained relative to the level the caller supplied.
    pub fn levels_gained(&self, previous_level: u64) -> u64 {
        self.new_level.saturating_sub(previous_level)
    }
}

/// Compute the experience, level and item changes produced by a reward.
///
/// `current_level` is taken as supplied: `leveled_up` compares the new level
/// against it, not against `derive_level(current_experience)`. A stale level
/// passed in yields a stale answer.
///
/// Applying the *result* twice to a stored player double-awards; guarding
/// against that is the completion workflow's job.
pub fn apply_quest_reward(
    reward: &RewardPackage,
    current_experience: u64,
    current_level: u64,
) -> QuestRewardResult {
    let experience_reward = reward.experience;
    let new_experience = current_experience.saturating_add(experience_reward);
    let new_level = derive_level(new_experience);

    QuestRewardResult {
        experience_reward,
        new_experience,
        new_level,
        leveled_up: new_level > current_level,
        item_rewards: reward.item.iter().cloned().collect(),
    }
}
