use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::game::errors::GameError;
use crate::game::ids::{ItemId, PlayerId, QuestId};
use crate::game::seed_loader::{load_items_from_json, load_quests_from_json, ITEMS_SEED_FILE, QUESTS_SEED_FILE};
use crate::game::types::{
    ItemRecord, PlayerRecord, QuestRecord, SessionRecord, ITEM_SCHEMA_VERSION,
    PLAYER_SCHEMA_VERSION, QUEST_SCHEMA_VERSION, SESSION_SCHEMA_VERSION,
};

const TREE_PRIMARY: &str = "questhall";
const TREE_CATALOG: &str = "questhall_catalog";
const TREE_SESSIONS: &str = "questhall_sessions";

const PLAYER_PREFIX: &str = "players:";
const EMAIL_PREFIX: &str = "emails:";
const ITEM_PREFIX: &str = "items:";
const QUEST_PREFIX: &str = "quests:";
const SESSION_PREFIX: &str = "sessions:";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct GameStoreBuilder {
    path: PathBuf,
    seed_dir: Option<PathBuf>,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_dir: None,
        }
    }

    /// Load `items.json` / `quests.json` from `dir` when the catalog is empty.
    pub fn with_seed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.seed_dir = Some(dir.into());
        self
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        let store = GameStore::open(&self.path)?;
        if let Some(dir) = self.seed_dir {
            let items = load_items_from_json(dir.join(ITEMS_SEED_FILE))?;
            let quests = load_quests_from_json(dir.join(QUESTS_SEED_FILE))?;
            store.seed_catalog_if_needed(items, quests)?;
        }
        Ok(store)
    }
}

/// Sled-backed persistence for players, the item/quest catalog and login
/// sessions.
pub struct GameStore {
    _db: sled::Db,
    primary: sled::Tree,
    catalog: sled::Tree,
    sessions: sled::Tree,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        let catalog = db.open_tree(TREE_CATALOG)?;
        let sessions = db.open_tree(TREE_SESSIONS)?;
        Ok(Self {
            _db: db,
            primary,
            catalog,
            sessions,
        })
    }

    fn player_key(id: &PlayerId) -> Vec<u8> {
        format!("{}{}", PLAYER_PREFIX, id).into_bytes()
    }

    fn email_key(email: &str) -> Vec<u8> {
        format!("{}{}", EMAIL_PREFIX, email.to_ascii_lowercase()).into_bytes()
    }

    fn item_key(id: &ItemId) -> Vec<u8> {
        format!("{}{}", ITEM_PREFIX, id).into_bytes()
    }

    fn quest_key(id: &QuestId) -> Vec<u8> {
        format!("{}{}", QUEST_PREFIX, id).into_bytes()
    }

    fn session_key(token: &str) -> Vec<u8> {
        format!("{}{}", SESSION_PREFIX, token).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(bytes)?)
    }

    fn check_schema(entity: &'static str, expected: u8, found: u8) -> Result<(), GameError> {
        if found != expected {
            return Err(GameError::SchemaMismatch {
                entity,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn decode_player(bytes: &[u8]) -> Result<PlayerRecord, GameError> {
        let record: PlayerRecord = Self::deserialize(bytes)?;
        Self::check_schema("player", PLAYER_SCHEMA_VERSION, record.schema_version)?;
        Ok(record)
    }

    fn decode_item(bytes: &[u8]) -> Result<ItemRecord, GameError> {
        let record: ItemRecord = Self::deserialize(bytes)?;
        Self::check_schema("item", ITEM_SCHEMA_VERSION, record.schema_version)?;
        Ok(record)
    }

    fn decode_quest(bytes: &[u8]) -> Result<QuestRecord, GameError> {
        let record: QuestRecord = Self::deserialize(bytes)?;
        Self::check_schema("quest", QUEST_SCHEMA_VERSION, record.schema_version)?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert or overwrite a player record.
    pub fn put_player(&self, mut player: PlayerRecord) -> Result<(), GameError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.touch();
        let key = Self::player_key(&player.id);
        let bytes = Self::serialize(&player)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    /// Fetch a player record by id.
    pub fn get_player(&self, id: &PlayerId) -> Result<PlayerRecord, GameError> {
        let key = Self::player_key(id);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(GameError::NotFound(format!("player: {}", id)));
        };
        Self::decode_player(&bytes)
    }

    fn decode_email_owner(bytes: &[u8]) -> Result<PlayerId, GameError> {
        let raw = std::str::from_utf8(bytes)
            .map_err(|e| GameError::Internal(format!("corrupt email index entry: {}", e)))?;
        Ok(PlayerId::parse(raw)?)
    }

    /// Look a player up through the email index.
    pub fn find_player_by_email(&self, email: &str) -> Result<Option<PlayerRecord>, GameError> {
        let Some(id_bytes) = self.primary.get(Self::email_key(email))? else {
            return Ok(None);
        };
        let id = Self::decode_email_owner(&id_bytes)?;
        match self.get_player(&id) {
            Ok(player) => Ok(Some(player)),
            Err(GameError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Claim `email` for `id`. Returns false when another stored player
    /// already holds it. An entry whose player record is gone is taken over.
    pub fn reserve_email(&self, email: &str, id: &PlayerId) -> Result<bool, GameError> {
        let key = Self::email_key(email);
        let mut expected: Option<sled::IVec> = None;
        loop {
            let swapped =
                self.primary
                    .compare_and_swap(&key, expected.as_ref(), Some(id.as_str().as_bytes()))?;
            let current = match swapped {
                Ok(()) => {
                    self.primary.flush()?;
                    return Ok(true);
                }
                Err(sled::CompareAndSwapError { current, .. }) => current,
            };
            let Some(current) = current else {
                expected = None;
                continue;
            };
            let owner = Self::decode_email_owner(&current)?;
            if owner == *id || self.primary.contains_key(Self::player_key(&owner))? {
                return Ok(owner == *id);
            }
            debug!("replacing dangling email index entry for {}", email);
            expected = Some(current);
        }
    }

    /// Delete a player record. Returns whether it existed.
    pub fn remove_player(&self, id: &PlayerId) -> Result<bool, GameError> {
        let removed = self.primary.remove(Self::player_key(id))?.is_some();
        self.primary.flush()?;
        Ok(removed)
    }

    /// List all player ids currently stored.
    pub fn list_player_ids(&self) -> Result<Vec<PlayerId>, GameError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(PLAYER_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(raw) = text.strip_prefix(PLAYER_PREFIX) {
                ids.push(PlayerId::parse(raw)?);
            }
        }
        Ok(ids)
    }

    /// Atomic read-modify-write of one player.
    ///
    /// `apply` may run more than once when a concurrent writer wins the race,
    /// so it must only mutate the record it is handed. Returning an error
    /// aborts without writing.
    pub fn update_player<T, F>(&self, id: &PlayerId, mut apply: F) -> Result<(PlayerRecord, T), GameError>
    where
        F: FnMut(&mut PlayerRecord) -> Result<T, GameError>,
    {
        let key = Self::player_key(id);
        loop {
            let Some(current) = self.primary.get(&key)? else {
                return Err(GameError::NotFound(format!("player: {}", id)));
            };
            let mut player = Self::decode_player(&current)?;
            let outcome = apply(&mut player)?;
            player.schema_version = PLAYER_SCHEMA_VERSION;
            player.touch();
            let bytes = Self::serialize(&player)?;
            match self.primary.compare_and_swap(&key, Some(current), Some(bytes))? {
                Ok(()) => {
                    self.primary.flush()?;
                    return Ok((player, outcome));
                }
                Err(_) => {
                    debug!("player {} changed during update; retrying", id);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Insert or update an item definition.
    pub fn put_item(&self, mut item: ItemRecord) -> Result<(), GameError> {
        item.schema_version = ITEM_SCHEMA_VERSION;
        let key = Self::item_key(&item.id);
        let bytes = Self::serialize(&item)?;
        self.catalog.insert(key, bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    pub fn get_item(&self, id: &ItemId) -> Result<ItemRecord, GameError> {
        self.try_get_item(id)?
            .ok_or_else(|| GameError::NotFound(format!("item: {}", id)))
    }

    pub fn try_get_item(&self, id: &ItemId) -> Result<Option<ItemRecord>, GameError> {
        match self.catalog.get(Self::item_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_item(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_items(&self) -> Result<Vec<ItemRecord>, GameError> {
        self.catalog
            .scan_prefix(ITEM_PREFIX.as_bytes())
            .map(|entry| {
                entry
                    .map_err(GameError::from)
                    .and_then(|(_key, value)| Self::decode_item(&value))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Quests
    // ------------------------------------------------------------------

    /// Insert or update a quest definition.
    pub fn put_quest(&self, mut quest: QuestRecord) -> Result<(), GameError> {
        quest.schema_version = QUEST_SCHEMA_VERSION;
        let key = Self::quest_key(&quest.id);
        let bytes = Self::serialize(&quest)?;
        self.catalog.insert(key, bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    pub fn get_quest(&self, id: &QuestId) -> Result<QuestRecord, GameError> {
        self.try_get_quest(id)?
            .ok_or_else(|| GameError::NotFound(format!("quest: {}", id)))
    }

    pub fn try_get_quest(&self, id: &QuestId) -> Result<Option<QuestRecord>, GameError> {
        match self.catalog.get(Self::quest_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_quest(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_quests(&self) -> Result<Vec<QuestRecord>, GameError> {
        self.catalog
            .scan_prefix(QUEST_PREFIX.as_bytes())
            .map(|entry| {
                entry
                    .map_err(GameError::from)
                    .and_then(|(_key, value)| Self::decode_quest(&value))
            })
            .collect()
    }

    /// Remove a quest definition, returning it.
    pub fn remove_quest(&self, id: &QuestId) -> Result<QuestRecord, GameError> {
        let Some(bytes) = self.catalog.remove(Self::quest_key(id))? else {
            return Err(GameError::NotFound(format!("quest: {}", id)));
        };
        self.catalog.flush()?;
        Self::decode_quest(&bytes)
    }

    /// Insert the given catalog when it holds no items and no quests yet.
    /// Returns the number of records written.
    pub fn seed_catalog_if_needed(
        &self,
        items: Vec<ItemRecord>,
        quests: Vec<QuestRecord>,
    ) -> Result<usize, GameError> {
        if self.catalog_counts() != (0, 0) {
            debug!("catalog already populated, skipping seed");
            return Ok(0);
        }
        let mut inserted = 0usize;
        for item in items {
            self.put_item(item)?;
            inserted += 1;
        }
        for quest in quests {
            self.put_quest(quest)?;
            inserted += 1;
        }
        info!("seeded catalog with {} records", inserted);
        Ok(inserted)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn put_session(&self, mut session: SessionRecord) -> Result<(), GameError> {
        session.schema_version = SESSION_SCHEMA_VERSION;
        let key = Self::session_key(&session.token);
        let bytes = Self::serialize(&session)?;
        self.sessions.insert(key, bytes)?;
        self.sessions.flush()?;
        Ok(())
    }

    pub fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, GameError> {
        let Some(bytes) = self.sessions.get(Self::session_key(token))? else {
            return Ok(None);
        };
        let record: SessionRecord = Self::deserialize(&bytes)?;
        Self::check_schema("session", SESSION_SCHEMA_VERSION, record.schema_version)?;
        Ok(Some(record))
    }

    /// Remove a session. Returns whether it existed.
    pub fn remove_session(&self, token: &str) -> Result<bool, GameError> {
        let removed = self.sessions.remove(Self::session_key(token))?;
        self.sessions.flush()?;
        Ok(removed.is_some())
    }

    /// Drop every session that expired before `now`.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, GameError> {
        let mut expired = Vec::new();
        for entry in self.sessions.scan_prefix(SESSION_PREFIX.as_bytes()) {
            let (key, value) = entry?;
            let record: SessionRecord = Self::deserialize(&value)?;
            if record.is_expired(now) {
                expired.push(key);
            }
        }
        for key in &expired {
            self.sessions.remove(key)?;
        }
        if !expired.is_empty() {
            self.sessions.flush()?;
        }
        Ok(expired.len())
    }

    pub fn player_count(&self) -> usize {
        self.primary.scan_prefix(PLAYER_PREFIX.as_bytes()).count()
    }

    pub fn catalog_counts(&self) -> (usize, usize) {
        let items = self.catalog.scan_prefix(ITEM_PREFIX.as_bytes()).count();
        let quests = self.catalog.scan_prefix(QUEST_PREFIX.as_bytes()).count();
        (items, quests)
    }
}
