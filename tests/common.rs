//! Test utilities & fixtures.
//! Stores are opened in throwaway temp dirs and seeded from `data/seeds`.

use std::path::{Path, PathBuf};

use questhall::config::{Argon2Config, SecurityConfig};
use questhall::game::{AuthService, EntityId, GameStore, GameStoreBuilder, PlayerRecord};
use tempfile::TempDir;

/// Seed directory shipped with the crate.
pub fn seeds_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("seeds")
}

/// Store seeded with the bundled catalog.
pub fn seeded_store() -> (GameStore, TempDir) {
    let temp_dir = TempDir::new().expect("tempdir");
    let store = GameStoreBuilder::new(temp_dir.path())
        .with_seed_dir(seeds_dir())
        .open()
        .expect("open seeded store");
    (store, temp_dir)
}

#[allow(dead_code)]
pub fn empty_store() -> (GameStore, TempDir) {
    let temp_dir = TempDir::new().expect("tempdir");
    let store = GameStoreBuilder::new(temp_dir.path()).open().expect("open store");
    (store, temp_dir)
}

pub fn id(raw: &str) -> EntityId {
    EntityId::parse(raw).expect("valid id")
}

/// Insert a player directly, bypassing registration.
#[allow(dead_code)]
pub fn create_test_player(store: &GameStore, raw_id: &str) -> EntityId {
    let player = PlayerRecord::new(
        id(raw_id),
        raw_id,
        &format!("{}@example.com", raw_id),
        "not-a-hash",
    );
    store.put_player(player).expect("put player");
    id(raw_id)
}

/// Auth service with minimal Argon2 cost so tests stay fast.
#[allow(dead_code)]
pub fn fast_auth() -> AuthService {
    AuthService::from_config(Some(&SecurityConfig {
        argon2: Some(Argon2Config {
            memory_kib: Some(1024),
            time_cost: Some(1),
            parallelism: Some(1),
        }),
        session_ttl_hours: None,
        min_password_length: None,
    }))
}
