//! Inventory membership checks and the use-item workflow
use log::info;
use serde::{Serialize, Serializer};

use super::errors::GameError;
use super::ids::{EntityId, ItemId, PlayerId};
use super::storage::GameStore;
use super::types::ItemRecord;

/// Anything that can sit in an inventory list: a bare id or a populated
/// record carrying one.
pub trait HasEntityId {
    fn entity_id(&self) -> &EntityId;
}

impl HasEntityId for EntityId {
    fn entity_id(&self) -> &EntityId {
        self
    }
}

impl HasEntityId for ItemRecord {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

impl<T: HasEntityId> HasEntityId for &T {
    fn entity_id(&self) -> &EntityId {
        (*self).entity_id()
    }
}

/// Result of looking an item id up in an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InventoryLookup {
    pub has_item: bool,
    /// First matching position. Serialized as `-1` when absent.
    #[serde(serialize_with = "serialize_index")]
    pub item_index: Option<usize>,
    /// Mirrors `has_item` for now.
    pub can_use: bool,
}

impl InventoryLookup {
    pub const NOT_FOUND_INDEX: i64 = -1;

    fn found(index: usize) -> Self {
        Self {
            has_item: true,
            item_index: Some(index),
            can_use: true,
        }
    }

    fn missing() -> Self {
        Self {
            has_item: false,
            item_index: None,
            can_use: false,
        }
    }

    /// Index with the `-1` not-found sentinel used on the wire.
    pub fn index_or_sentinel(&self) -> i64 {
        self.item_index
            .map(|i| i as i64)
            .unwrap_or(Self::NOT_FOUND_INDEX)
    }
}

fn serialize_index<S: Serializer>(index: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
    match index {
        Some(i) => serializer.serialize_u64(*i as u64),
        None => serializer.serialize_i64(InventoryLookup::NOT_FOUND_INDEX),
    }
}

// ============================================================================
// Inventory Operations
// ============================================================================

/// Find the first entry matching `item_id`.
pub fn find_item<T: HasEntityId>(inventory: &[T], item_id: &ItemId) -> InventoryLookup {
    inventory
        .iter()
        .position(|entry| entry.entity_id() == item_id)
        .map(InventoryLookup::found)
        .unwrap_or_else(InventoryLookup::missing)
}

/// Outcome of the use-item workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemUse {
    /// Catalog entry for the used item, if the catalog still knows it.
    pub used_item: Option<ItemRecord>,
    pub remaining_inventory: Vec<ItemId>,
}

/// Consume one copy of `item_id` from the player's inventory.
pub fn use_item(store: &GameStore, player_id: &PlayerId, item_id: &ItemId) -> Result<ItemUse, GameError> {
    let used_item = store.try_get_item(item_id)?;

    let (player, index) = store.update_player(player_id, |player| {
        let lookup = find_item(&player.inventory, item_id);
        match lookup.item_index {
            Some(index) if lookup.can_use => {
                player.inventory.remove(index);
                Ok(index)
            }
            _ => Err(GameError::ItemNotInInventory(item_id.clone())),
        }
    })?;

    info!(
        "player {} used item {} (slot {}, {} left)",
        player.id,
        item_id,
        index,
        player.inventory.len()
    );

    Ok(ItemUse {
        used_item,
        remaining_inventory: player.inventory,
    })
}

/// Format inventory lines for the CLI
pub fn format_inventory(
    inventory: &[ItemId],
    get_item: impl Fn(&ItemId) -> Option<ItemRecord>,
) -> Vec<String> {
    if inventory.is_empty() {
        return vec!["Inventory is empty.".to_string()];
    }

    let mut lines = Vec::with_capacity(inventory.len() + 1);
    for (idx, id) in inventory.iter().enumerate() {
        match get_item(id) {
            Some(item) => {
                let value = if item.value > 0 {
                    format!(" ({}g)", item.value)
                } else {
                    String::new()
                };
                lines.push(format!(
                    "{}. {} [{}] {}{}",
                    idx + 1,
                    item.name,
                    item.kind,
                    item.effect,
                    value
                ));
            }
            None => lines.push(format!("{}. unknown item {}", idx + 1, id)),
        }
    }
    lines.push(format!("Items: {}", inventory.len()));
    lines
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::storage::GameStoreBuilder;
    use crate::game::types::{ItemKind, PlayerRecord};
    use tempfile::TempDir;

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|r| ItemId::parse(r).unwrap()).collect()
    }

    fn item(raw: &str) -> ItemId {
        ItemId::parse(raw).unwrap()
    }

    #[test]
    fn finds_item_in_middle() {
        let lookup = find_item(&ids(&["item1", "item2", "item3"]), &item("item2"));
        assert_eq!(
            lookup,
            InventoryLookup {
                has_item: true,
                item_index: Some(1),
                can_use: true
            }
        );
        assert_eq!(lookup.index_or_sentinel(), 1);
    }

    #[test]
    fn missing_item_uses_sentinel() {
        let lookup = find_item(&ids(&["item1", "item2", "item3"]), &item("item4"));
        assert!(!lookup.has_item);
        assert!(!lookup.can_use);
        assert_eq!(lookup.item_index, None);
        assert_eq!(lookup.index_or_sentinel(), -1);
    }

    #[test]
    fn empty_inventory_never_matches() {
        let empty: Vec<ItemId> = Vec::new();
        let lookup = find_item(&empty, &item("item1"));
        assert_eq!(lookup.index_or_sentinel(), -1);
        assert!(!lookup.has_item);
    }

    #[test]
    fn duplicates_resolve_to_first() {
        let inventory = ids(&["potion", "sword", "potion", "potion"]);
        assert_eq!(find_item(&inventory, &item("potion")).item_index, Some(0));
        assert_eq!(find_item(&inventory, &item("sword")).item_index, Some(1));
    }

    #[test]
    fn can_use_mirrors_has_item() {
        let inventory = ids(&["a", "b", "c", "b"]);
        for wanted in ["a", "b", "c", "d", "B"] {
            let lookup = find_item(&inventory, &item(wanted));
            assert_eq!(lookup.can_use, lookup.has_item);
            assert_eq!(lookup.has_item, lookup.item_index.is_some());
        }
    }

    #[test]
    fn populated_records_compare_by_id() {
        let records = vec![
            ItemRecord::new(item("sword"), "Sword", "+2 attack").with_kind(ItemKind::Weapon),
            ItemRecord::new(item("potion"), "Potion", "Heals 10").with_kind(ItemKind::Potion),
        ];
        assert_eq!(find_item(&records, &item("potion")).item_index, Some(1));

        let refs: Vec<&ItemRecord> = records.iter().collect();
        assert_eq!(find_item(&refs, &item("sword")).item_index, Some(0));

        // Raw id coming from JSON in embedded form matches the same entry.
        let embedded: ItemId = serde_json::from_str(r#"{"_id": "potion"}"#).unwrap();
        assert_eq!(find_item(&records, &embedded).item_index, Some(1));
    }

    #[test]
    fn lookup_serializes_sentinel() {
        let missing = find_item(&ids(&["a"]), &item("z"));
        let json = serde_json::to_value(missing).unwrap();
        assert_eq!(json["item_index"], -1);
        assert_eq!(json["has_item"], false);

        let found = find_item(&ids(&["a"]), &item("a"));
        assert_eq!(serde_json::to_value(found).unwrap()["item_index"], 0);
    }

    #[test]
    fn use_item_removes_first_copy() {
        let dir = TempDir::new().unwrap();
        let store = GameStoreBuilder::new(dir.path()).open().unwrap();
        let potion = ItemRecord::new(item("potion"), "Potion", "Heals 10");
        store.put_item(potion.clone()).unwrap();

        let mut player = PlayerRecord::new(item("p1"), "A", "a@example.com", "h");
        player.inventory = ids(&["potion", "sword", "potion"]);
        store.put_player(player).unwrap();

        let used = use_item(&store, &item("p1"), &item("potion")).unwrap();
        assert_eq!(used.used_item.as_ref().map(|i| i.name.as_str()), Some("Potion"));
        assert_eq!(used.remaining_inventory, ids(&["sword", "potion"]));

        // Items missing from the catalog can still be used up.
        let used = use_item(&store, &item("p1"), &item("sword")).unwrap();
        assert!(used.used_item.is_none());
        assert_eq!(used.remaining_inventory, ids(&["potion"]));
    }

    #[test]
    fn use_item_not_held_leaves_inventory_untouched() {
        let dir = TempDir::new().unwrap();
        let store = GameStoreBuilder::new(dir.path()).open().unwrap();
        let mut player = PlayerRecord::new(item("p1"), "A", "a@example.com", "h");
        player.inventory = ids(&["sword"]);
        store.put_player(player).unwrap();

        let err = use_item(&store, &item("p1"), &item("potion")).unwrap_err();
        assert!(matches!(err, GameError::ItemNotInInventory(_)));
        assert_eq!(store.get_player(&item("p1")).unwrap().inventory, ids(&["sword"]));
    }

    #[test]
    fn format_inventory_lists_entries() {
        let sword = ItemRecord::new(item("sword"), "Sword", "+2 attack")
            .with_kind(ItemKind::Weapon)
            .with_value(12);
        let lines = format_inventory(&ids(&["sword", "ghost"]), |id| {
            (id.as_str() == "sword").then(|| sword.clone())
        });
        assert_eq!(lines[0], "1. Sword [weapon] +2 attack (12g)");
        assert_eq!(lines[1], "2. unknown item ghost");
        assert_eq!(lines[2], "Items: 2");
        assert_eq!(format_inventory(&[], |_| None), vec!["Inventory is empty."]);
    }
}
