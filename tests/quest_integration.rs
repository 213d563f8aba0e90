//! Integration tests for the quest board
//!
//! End-to-end flow against a seeded store: accepting quests, completing
//! them, collecting experience and items, and the double-award guard.
mod common;

use std::sync::Arc;
use std::thread;

use common::{create_test_player, id, seeded_store};
use questhall::game::{
    accept_quest, complete_quest, create_quest, format_quest_list, get_quest, list_quests,
    update_quest, GameError, QuestDraft, QuestPatch, QuestQuery, QuestStatus, RewardConfig,
};

#[test]
fn seeded_catalog_is_listed_in_level_order() {
    let (store, _temp) = seeded_store();
    assert_eq!(store.catalog_counts(), (5, 5));

    let page = list_quests(&store, &QuestQuery::default()).expect("list quests");
    assert_eq!(page.total, 5);
    let levels: Vec<u64> = page.quests.iter().map(|q| q.level).collect();
    let mut sorted = levels.clone();
    sorted.sort();
    assert_eq!(levels, sorted, "quests should be sorted by level");
    // Same level sorts by title
    assert_eq!(page.quests[0].title, "Rats in the Cellar");
    assert_eq!(page.quests[1].title, "The Mayor's Letter");

    let armory = store.get_quest(&id("old-armory")).expect("get quest");
    assert_eq!(armory.rewards.experience, 0, "missing experience defaults to 0");
    assert_eq!(armory.rewards.item, Some(id("leather-armor")));

    let lines = format_quest_list(&page);
    assert!(lines[0].starts_with("=== QUESTS"));
}

#[test]
fn quest_lifecycle_levels_player_up() {
    let (store, _temp) = seeded_store();
    let alice = create_test_player(&store, "alice");

    accept_quest(&store, &alice, &id("rat-cellar")).expect("accept rats");
    let first = complete_quest(&store, &alice, &id("rat-cellar")).expect("complete rats");
    assert_eq!(first.rewards.experience_reward, 50);
    assert_eq!(first.rewards.new_level, 1);
    assert!(!first.rewards.leveled_up);
    assert_eq!(first.inventory, vec![id("healing-potion")]);

    accept_quest(&store, &alice, &id("mayors-letter")).expect("accept letter");
    let second = complete_quest(&store, &alice, &id("mayors-letter")).expect("complete letter");
    assert_eq!(second.rewards.new_experience, 125);
    assert_eq!(second.rewards.new_level, 2);
    assert!(second.rewards.leveled_up);
    assert_eq!(second.inventory, vec![id("healing-potion"), id("sealed-letter")]);

    let player = store.get_player(&alice).expect("player");
    assert_eq!(player.experience, 125);
    assert_eq!(player.level, 2);
    assert!(player.level_is_consistent());
    assert!(player.quests.iter().all(|q| q.status == QuestStatus::Completed));
}

#[test]
fn completed_quest_cannot_be_accepted_or_completed_again() {
    let (store, _temp) = seeded_store();
    let bob = create_test_player(&store, "bob");

    accept_quest(&store, &bob, &id("wolf-hunt")).expect("accept");
    complete_quest(&store, &bob, &id("wolf-hunt")).expect("complete");

    let again = complete_quest(&store, &bob, &id("wolf-hunt"));
    assert!(matches!(
        again,
        Err(GameError::QuestNotInProgress {
            status: QuestStatus::Completed
        })
    ));
    let reaccept = accept_quest(&store, &bob, &id("wolf-hunt"));
    assert!(matches!(
        reaccept,
        Err(GameError::QuestAlreadyAccepted {
            status: QuestStatus::Completed
        })
    ));

    let player = store.get_player(&bob).expect("player");
    assert_eq!(player.experience, 150);
    assert_eq!(player.inventory.len(), 1);
}

#[test]
fn concurrent_completions_award_once() {
    let (store, _temp) = seeded_store();
    let carol = create_test_player(&store, "carol");
    accept_quest(&store, &carol, &id("bandit-camp")).expect("accept");

    let store = Arc::new(store);
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = store.clone();
            let carol = carol.clone();
            thread::spawn(move || complete_quest(&store, &carol, &id("bandit-camp")).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);

    let player = store.get_player(&carol).expect("player");
    assert_eq!(player.experience, 300);
    assert_eq!(player.level, 4);
    assert_eq!(player.inventory, vec![id("rusty-sword")]);
}

#[test]
fn concurrent_rewards_for_different_quests_all_land() {
    let (store, _temp) = seeded_store();
    let dana = create_test_player(&store, "dana");
    let quests = ["rat-cellar", "mayors-letter", "wolf-hunt", "bandit-camp"];
    for quest in quests {
        accept_quest(&store, &dana, &id(quest)).expect("accept");
    }

    let store = Arc::new(store);
    let handles: Vec<_> = quests
        .iter()
        .map(|quest| {
            let store = store.clone();
            let dana = dana.clone();
            let quest = id(quest);
            thread::spawn(move || complete_quest(&store, &dana, &quest).expect("complete"))
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let player = store.get_player(&dana).expect("player");
    assert_eq!(player.experience, 50 + 75 + 150 + 300);
    assert_eq!(player.level, 6);
    assert_eq!(player.inventory.len(), 4);
}

#[test]
fn admin_created_quest_can_be_completed() {
    let (store, _temp) = seeded_store();
    let erin = create_test_player(&store, "erin");

    let quest = create_quest(
        &store,
        QuestDraft {
            title: "Lost Cat".into(),
            description: "Find the baker's cat.".into(),
            level: Some(1),
            rewards: Some(RewardConfig {
                experience: Some(250),
                item: None,
            }),
        },
    )
    .expect("create quest");

    accept_quest(&store, &erin, &quest.id).expect("accept");
    let done = complete_quest(&store, &erin, &quest.id).expect("complete");
    assert_eq!(done.rewards.new_level, 3);
    assert!(done.rewards.item_rewards.is_empty());
    assert!(done.inventory.is_empty());
}

#[test]
fn unknown_quest_and_player_are_not_found() {
    let (store, _temp) = seeded_store();
    let frank = create_test_player(&store, "frank");
    assert!(matches!(
        accept_quest(&store, &frank, &id("no-such-quest")),
        Err(GameError::NotFound(_))
    ));
    assert!(matches!(
        complete_quest(&store, &id("ghost"), &id("rat-cellar")),
        Err(GameError::NotFound(_))
    ));
}

#[test]
fn editing_reward_item_keeps_seeded_experience() {
    let (store, _temp) = seeded_store();
    let wolf_hunt = id("wolf-hunt");
    let before = get_quest(&store, &wolf_hunt).expect("seeded quest");
    assert_eq!(before.rewards.experience, 150);

    let patch = QuestPatch {
        rewards: Some(RewardConfig {
            experience: None,
            item: Some(id("rusty-sword")),
        }),
        ..Default::default()
    };
    let after = update_quest(&store, &wolf_hunt, patch).expect("edit quest");
    assert_eq!(after.rewards.experience, 150);
    assert_eq!(after.rewards.item, Some(id("rusty-sword")));
    assert_eq!(after.title, before.title);
}
