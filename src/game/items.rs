//! Item catalog management.

use log::info;
use serde::Deserialize;

use crate::game::errors::GameError;
use crate::game::ids::{EntityId, ItemId};
use crate::game::storage::GameStore;
use crate::game::types::{ItemKind, ItemRecord};
use crate::validation::{required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};

/// Input for creating a catalog item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub effect: String,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<ItemKind>,
    #[serde(default)]
    pub value: Option<u32>,
}

/// Create a catalog item. Names are unique.
pub fn create_item(store: &GameStore, draft: ItemDraft) -> Result<ItemRecord, GameError> {
    let name = required_text("name", &draft.name, MAX_TITLE_LEN)?;
    let effect = required_text("effect", &draft.effect, MAX_TEXT_LEN)?;

    if store.list_items()?.iter().any(|item| item.name == name) {
        return Err(GameError::ItemNameTaken(name));
    }

    let item = ItemRecord::new(EntityId::generate(), &name, &effect)
        .with_kind(draft.kind.unwrap_or_default())
        .with_value(draft.value.unwrap_or(0));
    store.put_item(item.clone())?;
    info!("created item '{}' ({})", item.name, item.id);
    Ok(item)
}

pub fn get_item(store: &GameStore, item_id: &ItemId) -> Result<ItemRecord, GameError> {
    store.get_item(item_id)
}

/// All catalog items sorted by name.
pub fn list_items(store: &GameStore) -> Result<Vec<ItemRecord>, GameError> {
    let mut items = store.list_items()?;
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

pub fn format_item(item: &ItemRecord) -> String {
    format!(
        "{} [{}]\n{}\nValue: {}\nId: {}",
        item.name, item.kind, item.effect, item.value, item.id
    )
}

pub fn format_item_list(items: &[ItemRecord]) -> Vec<String> {
    if items.is_empty() {
        return vec!["No items in the catalog.".to_string()];
    }
    items
        .iter()
        .map(|item| format!("{} [{}] {} ({})", item.name, item.kind, item.effect, item.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::storage::GameStoreBuilder;
    use tempfile::TempDir;

    #[test]
    fn create_applies_defaults_and_unique_names() {
        let dir = TempDir::new().unwrap();
        let store = GameStoreBuilder::new(dir.path()).open().unwrap();

        let item = create_item(
            &store,
            ItemDraft {
                name: "Old Map".into(),
                effect: "Shows the way".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(item.kind, ItemKind::QuestItem);
        assert_eq!(item.value, 0);
        assert_eq!(get_item(&store, &item.id).unwrap(), item);

        let dup = create_item(
            &store,
            ItemDraft {
                name: "Old Map".into(),
                effect: "again".into(),
                ..Default::default()
            },
        );
        assert!(matches!(dup, Err(GameError::ItemNameTaken(_))));

        let missing = create_item(&store, ItemDraft::default());
        assert!(matches!(missing, Err(GameError::Validation(_))));
    }

    #[test]
    fn draft_reads_type_field() {
        let draft: ItemDraft =
            serde_json::from_str(r#"{"name": "Sword", "effect": "+2", "type": "weapon", "value": 10}"#)
                .unwrap();
        assert_eq!(draft.kind, Some(ItemKind::Weapon));
        assert_eq!(draft.value, Some(10));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let store = GameStoreBuilder::new(dir.path()).open().unwrap();
        for name in ["Shield", "Amulet", "Potion"] {
            create_item(
                &store,
                ItemDraft {
                    name: name.into(),
                    effect: "x".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let names: Vec<String> = list_items(&store).unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Amulet", "Potion", "Shield"]);
        assert_eq!(format_item_list(&[]), vec!["No items in the catalog."]);
    }
}
