/// Quest lifecycle and catalog management
///
/// Players accept quests into their log and complete them for rewards.
/// Completion runs inside a single atomic player update so a quest can only
/// ever pay out once.
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::ids::{EntityId, ItemId, PlayerId, QuestId};
use crate::game::leveling::{apply_quest_reward, QuestRewardResult, RewardConfig, RewardPackage};
use crate::game::storage::GameStore;
use crate::game::types::{PlayerQuest, PlayerSummary, QuestRecord, QuestStatus};
use crate::validation::{required_text, ValidationError, MAX_TEXT_LEN, MAX_TITLE_LEN};

/// Default number of quests per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;
/// Highest recommended level a quest may carry.
pub const MAX_QUEST_LEVEL: u64 = 1_000;

// ============================================================================
// Player Quest Log
// ============================================================================

/// Add a quest to the player's log with status `in_progress`.
pub fn accept_quest(
    store: &GameStore,
    player_id: &PlayerId,
    quest_id: &QuestId,
) -> Result<PlayerQuest, GameError> {
    let quest = store.get_quest(quest_id)?;

    let (player, entry) = store.update_player(player_id, |player| {
        if let Some(existing) = player.quest_entry(quest_id) {
            return Err(GameError::QuestAlreadyAccepted {
                status: existing.status,
            });
        }
        let entry = PlayerQuest::accepted(quest_id.clone());
        player.quests.push(entry.clone());
        Ok(entry)
    })?;

    info!("player {} accepted quest '{}' ({})", player.id, quest.title, quest.id);
    Ok(entry)
}

/// Outcome of a successful quest completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestCompletion {
    pub quest: PlayerQuest,
    pub quest_title: String,
    pub rewards: QuestRewardResult,
    pub player: PlayerSummary,
    pub inventory: Vec<ItemId>,
}

/// Complete an accepted quest and award its rewards.
///
/// The status check, reward calculation and write happen in one
/// compare-and-swap update, so two concurrent completions of the same quest
/// award once and the loser sees `QuestNotInProgress`.
pub fn complete_quest(
    store: &GameStore,
    player_id: &PlayerId,
    quest_id: &QuestId,
) -> Result<QuestCompletion, GameError> {
    store.get_player(player_id)?;
    let quest = store.get_quest(quest_id)?;

    let (player, (entry, rewards)) = store.update_player(player_id, |player| {
        let Some(index) = player.quests.iter().position(|pq| pq.quest_id == *quest_id) else {
            return Err(GameError::QuestNotAccepted(quest_id.clone()));
        };
        let status = player.quests[index].status;
        if status != QuestStatus::InProgress {
            return Err(GameError::QuestNotInProgress { status });
        }

        let result = apply_quest_reward(&quest.rewards, player.experience, player.level);
        player.quests[index].mark_completed();
        player.experience = result.new_experience;
        player.level = result.new_level;
        player.inventory.extend(result.item_rewards.iter().cloned());
        Ok((player.quests[index].clone(), result))
    })?;

    info!(
        "player {} completed quest '{}' (+{} xp, level {}{})",
        player.id,
        quest.title,
        rewards.experience_reward,
        rewards.new_level,
        if rewards.leveled_up { ", level up" } else { "" }
    );

    Ok(QuestCompletion {
        quest: entry,
        quest_title: quest.title,
        rewards,
        player: player.summary(),
        inventory: player.inventory,
    })
}

// ============================================================================
// Quest Catalog
// ============================================================================

/// Input for creating a quest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub level: Option<u64>,
    #[serde(default)]
    pub rewards: Option<RewardConfig>,
}

/// Partial update of a quest. Missing fields are left unchanged, and that
/// holds inside `rewards` too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<u64>,
    #[serde(default)]
    pub rewards: Option<RewardConfig>,
}

fn check_level(level: u64) -> Result<u64, ValidationError> {
    if !(1..=MAX_QUEST_LEVEL).contains(&level) {
        return Err(ValidationError::OutOfRange {
            field: "level",
            min: 1,
            max: MAX_QUEST_LEVEL,
        });
    }
    Ok(level)
}

fn ensure_title_free(store: &GameStore, title: &str, except: Option<&QuestId>) -> Result<(), GameError> {
    let taken = store
        .list_quests()?
        .into_iter()
        .any(|q| q.title == title && Some(&q.id) != except);
    if taken {
        return Err(GameError::QuestTitleTaken(title.to_string()));
    }
    Ok(())
}

pub fn create_quest(store: &GameStore, draft: QuestDraft) -> Result<QuestRecord, GameError> {
    let title = required_text("title", &draft.title, MAX_TITLE_LEN)?;
    let description = required_text("description", &draft.description, MAX_TEXT_LEN)?;
    let level = check_level(draft.level.unwrap_or(1))?;
    ensure_title_free(store, &title, None)?;

    let quest = QuestRecord::new(EntityId::generate(), &title, &description)
        .with_level(level)
        .with_rewards(RewardPackage::from(draft.rewards));
    store.put_quest(quest.clone())?;
    info!("created quest '{}' ({})", quest.title, quest.id);
    Ok(quest)
}

pub fn update_quest(store: &GameStore, quest_id: &QuestId, patch: QuestPatch) -> Result<QuestRecord, GameError> {
    let mut quest = store.get_quest(quest_id)?;

    if let Some(title) = patch.title {
        let title = required_text("title", &title, MAX_TITLE_LEN)?;
        if title != quest.title {
            ensure_title_free(store, &title, Some(quest_id))?;
        }
        quest.title = title;
    }
    if let Some(description) = patch.description {
        quest.description = required_text("description", &description, MAX_TEXT_LEN)?;
    }
    if let Some(level) = patch.level {
        quest.level = check_level(level)?;
    }
    if let Some(rewards) = patch.rewards {
        quest.rewards = quest.rewards.merged(rewards);
    }

    quest.touch();
    store.put_quest(quest.clone())?;
    info!("updated quest '{}' ({})", quest.title, quest.id);
    Ok(quest)
}

/// Remove a quest from the catalog. Player logs keep their entries.
pub fn delete_quest(store: &GameStore, quest_id: &QuestId) -> Result<QuestRecord, GameError> {
    let removed = store.remove_quest(quest_id)?;
    info!("deleted quest '{}' ({})", removed.title, removed.id);
    Ok(removed)
}

pub fn get_quest(store: &GameStore, quest_id: &QuestId) -> Result<QuestRecord, GameError> {
    store.get_quest(quest_id)
}

// ============================================================================
// Listing
// ============================================================================

/// Filters and paging for [`list_quests`]. Reward bounds apply to the
/// experience reward; all bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuestQuery {
    pub min_reward: Option<u64>,
    pub max_reward: Option<u64>,
    pub min_level: Option<u64>,
    pub max_level: Option<u64>,
    /// 1-based page number.
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl QuestQuery {
    fn matches(&self, quest: &QuestRecord) -> bool {
        let xp = quest.rewards.experience;
        self.min_reward.map_or(true, |min| xp >= min)
            && self.max_reward.map_or(true, |max| xp <= max)
            && self.min_level.map_or(true, |min| quest.level >= min)
            && self.max_level.map_or(true, |max| quest.level <= max)
    }

    fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of quests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestPage {
    pub quests: Vec<QuestRecord>,
    /// Quests on this page.
    pub count: usize,
    /// Quests matching the filters across all pages.
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

/// Filter, sort (level, then title) and paginate the quest catalog.
pub fn list_quests(store: &GameStore, query: &QuestQuery) -> Result<QuestPage, GameError> {
    let mut matching: Vec<QuestRecord> = store
        .list_quests()?
        .into_iter()
        .filter(|q| query.matches(q))
        .collect();
    matching.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.title.cmp(&b.title)));

    let page = query.page();
    let limit = query.limit();
    let total = matching.len();
    let pages = total.div_ceil(limit);
    let quests: Vec<QuestRecord> = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    debug!("quest listing page {}/{}: {} of {}", page, pages, quests.len(), total);
    Ok(QuestPage {
        count: quests.len(),
        quests,
        total,
        page,
        pages,
    })
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a quest page for display
pub fn format_quest_list(page: &QuestPage) -> Vec<String> {
    if page.quests.is_empty() {
        return vec!["No quests available.".to_string()];
    }

    let mut lines = vec![format!("=== QUESTS (page {}/{}) ===", page.page, page.pages.max(1))];
    for quest in &page.quests {
        let mut line = format!(
            "[Lv{}] {} - {} xp",
            quest.level, quest.title, quest.rewards.experience
        );
        if let Some(item) = &quest.rewards.item {
            line.push_str(&format!(" + item {}", item));
        }
        line.push_str(&format!(" ({})", quest.id));
        lines.push(line);
    }
    lines.push(format!("Showing {} of {}", page.count, page.total));
    lines
}

/// Format the result of completing a quest
pub fn format_quest_completion(completion: &QuestCompletion) -> String {
    let mut output = format!("Quest complete: {}\n", completion.quest_title);
    output.push_str(&format!(
        "+{} xp (total {})\n",
        completion.rewards.experience_reward, completion.rewards.new_experience
    ));
    if completion.rewards.leveled_up {
        output.push_str(&format!("LEVEL UP! You are now level {}\n", completion.rewards.new_level));
    } else {
        output.push_str(&format!("Level {}\n", completion.rewards.new_level));
    }
    for item in &completion.rewards.item_rewards {
        output.push_str(&format!("Received item {}\n", item));
    }
    output
}

// ============================================================================
// Unit Tests
// ============================================================================
