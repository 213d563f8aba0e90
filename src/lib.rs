//! # Questhall - RPG Quest Board Backend
//!
//! Questhall keeps players, an item catalog and a quest catalog in an
//! embedded sled database and implements the rules that connect them:
//! accepting and completing quests, awarding experience and items, deriving
//! levels, and using items from an inventory.
//!
//! ## Features
//!
//! - **Leveling Engine**: Flat 100-experience-per-level curve with a pure
//!   reward calculator ([`game::leveling`]).
//! - **Inventory Checks**: Ordered, duplicate-aware membership lookup
//!   ([`game::inventory`]).
//! - **Atomic Workflows**: Quest completion and item use run as single
//!   compare-and-swap updates on the player record, so rewards are never
//!   awarded twice.
//! - **Accounts**: Argon2id password hashing and expiring session tokens.
//! - **Catalog Seeding**: JSON seed files for items and quests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use questhall::game::{accept_quest, complete_quest, AuthService, GameStoreBuilder, QuestId};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = GameStoreBuilder::new("./data/questhall.db")
//!         .with_seed_dir("./data/seeds")
//!         .open()?;
//!     let auth = AuthService::new();
//!     let session = auth.register(&store, "Aria", "aria@example.com", "hunter22")?;
//!
//!     let quest = QuestId::parse("rat-cellar")?;
//!     accept_quest(&store, &session.player.id, &quest)?;
//!     let done = complete_quest(&store, &session.player.id, &quest)?;
//!     println!("level {} ({} xp)", done.player.level, done.player.experience);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Records, store, leveling, inventory and the player workflows
//! - [`config`] - TOML configuration
//! - [`validation`] - Input validation for names, emails, passwords and text

pub mod config;
pub mod game;
pub mod validation;
