//! Binary entrypoint for the Questhall CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml` and the data directory
//! - `seed` - load the item/quest catalog from the seeds directory
//! - `status` - print player and catalog counts, purge expired sessions
//! - `register` / `login` / `logout` - account and session management
//! - `profile`, `items`, `item`, `quests`, `quest` - read-only views
//! - `accept`, `complete`, `use-item`, `has-item` - player actions
//! - `add-item`, `add-quest`, `edit-quest`, `remove-quest` - catalog admin
//!
//! Player actions need a session token from `login` or `register`, passed
//! with `--token` or the `QUESTHALL_TOKEN` environment variable.
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use questhall::config::Config;
use questhall::game::{
    self, AuthService, GameStore, GameStoreBuilder, ItemDraft, ItemId, ItemKind, PlayerRecord,
    QuestDraft, QuestId, QuestPatch, QuestQuery, RewardConfig,
};

#[derive(Parser)]
#[command(name = "questhall")]
#[command(about = "An RPG quest board: players, items, quests and leveling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Session token for player commands
    #[arg(long, env = "QUESTHALL_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Load the item and quest catalog from the seeds directory (only when empty)
    Seed,
    /// Show player and catalog statistics
    Status,
    /// Create a player account (password is prompted)
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
    },
    /// Log in and print a session token (password is prompted)
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in player's profile
    Profile,
    /// List catalog items
    Items,
    /// Show one catalog item
    Item { id: ItemId },
    /// List quests with optional filters
    Quests {
        #[arg(long)]
        min_reward: Option<u64>,
        #[arg(long)]
        max_reward: Option<u64>,
        #[arg(long)]
        min_level: Option<u64>,
        #[arg(long)]
        max_level: Option<u64>,
        #[arg(short, long)]
        page: Option<usize>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one quest
    Quest { id: QuestId },
    /// Accept a quest
    Accept { quest: QuestId },
    /// Complete an accepted quest and collect its rewards
    Complete { quest: QuestId },
    /// Use (consume) one item from the inventory
    UseItem { item: ItemId },
    /// Check whether the inventory holds an item
    HasItem { item: ItemId },
    /// Add an item to the catalog
    AddItem {
        #[arg(long)]
        name: String,
        #[arg(long)]
        effect: String,
        /// weapon, armor, potion or quest_item
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        value: Option<u32>,
    },
    /// Add a quest to the catalog
    AddQuest {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        level: Option<u64>,
        /// Experience reward
        #[arg(long)]
        xp: Option<u64>,
        /// Item reward id
        #[arg(long)]
        reward_item: Option<ItemId>,
    },
    /// Change fields of an existing quest
    EditQuest {
        id: QuestId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        level: Option<u64>,
        /// Set the reward's experience amount
        #[arg(long)]
        xp: Option<u64>,
        /// Replace the reward item
        #[arg(long)]
        reward_item: Option<ItemId>,
    },
    /// Delete a quest from the catalog
    RemoveQuest { id: QuestId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match run(cli).await {
        // Request errors get a plain message instead of the error chain.
        Err(e) => match e.downcast_ref::<game::GameError>() {
            Some(err) if err.is_user_error() => {
                eprintln!("{}", err);
                std::process::exit(2);
            }
            _ => Err(e),
        },
        ok => ok,
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new Questhall configuration");
        Config::create_default(&cli.config).await?;
        let config = Config::load(&cli.config).await?;
        tokio::fs::create_dir_all(&config.game.data_dir).await?;
        info!("Configuration file created at {}", cli.config);
        println!(
            "Created {}. Put items.json and quests.json in {} and run `questhall seed`.",
            cli.config, config.game.seeds_dir
        );
        return Ok(());
    }

    let config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config).await?
    } else {
        Config::default()
    };
    init_logging(&Some(config.clone()), cli.verbose);
    if !Path::new(&cli.config).exists() {
        warn!("{} not found; using default configuration", cli.config);
    }

    let store = GameStoreBuilder::new(config.db_path()).open()?;
    let auth = AuthService::from_config(config.security.as_ref());

    match cli.command {
        // Written before the store is opened
        Commands::Init => {}
        Commands::Seed => {
            let dir = config.seeds_dir();
            let items = game::load_items_from_json(dir.join(game::seed_loader::ITEMS_SEED_FILE))?;
            let quests = game::load_quests_from_json(dir.join(game::seed_loader::QUESTS_SEED_FILE))?;
            let inserted = store.seed_catalog_if_needed(items, quests)?;
            if inserted == 0 {
                println!("Catalog already populated; nothing seeded.");
            } else {
                println!("Seeded {} catalog records from {}.", inserted, dir.display());
            }
        }
        Commands::Status => {
            let purged = store.purge_expired_sessions(chrono::Utc::now())?;
            let (items, quests) = store.catalog_counts();
            let status = serde_json::json!({
                "name": &config.game.name,
                "version": env!("CARGO_PKG_VERSION"),
                "database": config.db_path().display().to_string(),
                "players": store.player_count(),
                "items": items,
                "quests": quests,
                "expired_sessions_purged": purged,
            });
            if cli.json {
                println!("{}", status);
            } else {
                println!("{} v{}", config.game.name, env!("CARGO_PKG_VERSION"));
                println!("Database: {}", config.db_path().display());
                println!("Players: {}", store.player_count());
                println!("Catalog: {} items, {} quests", items, quests);
                println!("Expired sessions purged: {}", purged);
            }
        }
        Commands::Register { name, email } => {
            let pass1 = rpassword::prompt_password("Password: ")?;
            let pass2 = rpassword::prompt_password("Confirm password: ")?;
            if pass1 != pass2 {
                return Err(anyhow!("passwords do not match"));
            }
            let session = auth.register(&store, &name, &email, &pass1)?;
            print_session(&session, cli.json)?;
        }
        Commands::Login { email } => {
            let password = rpassword::prompt_password("Password: ")?;
            let session = auth.login(&store, &email, &password)?;
            print_session(&session, cli.json)?;
        }
        Commands::Logout => {
            let token = require_token(&cli.token)?;
            if auth.logout(&store, token)? {
                println!("Logged out.");
            } else {
                println!("Session was not active.");
            }
        }
        Commands::Profile => {
            let player = current_player(&auth, &store, &cli.token)?;
            let profile = game::player_profile(&store, &player.id)?;
            emit(&profile, cli.json, || game::format_profile(&profile))?;
        }
        Commands::Items => {
            let items = game::list_items(&store)?;
            emit(&items, cli.json, || game::format_item_list(&items).join("\n"))?;
        }
        Commands::Item { id } => {
            let item = game::get_item(&store, &id)?;
            emit(&item, cli.json, || game::format_item(&item))?;
        }
        Commands::Quests {
            min_reward,
            max_reward,
            min_level,
            max_level,
            page,
            limit,
        } => {
            let query = QuestQuery {
                min_reward,
                max_reward,
                min_level,
                max_level,
                page,
                limit: limit.or(Some(config.game.quest_page_size)),
            };
            let page = game::list_quests(&store, &query)?;
            emit(&page, cli.json, || game::format_quest_list(&page).join("\n"))?;
        }
        Commands::Quest { id } => {
            let quest = game::get_quest(&store, &id)?;
            emit(&quest, cli.json, || {
                let mut out = format!(
                    "{} (Lv{})\n{}\nReward: {} xp",
                    quest.title, quest.level, quest.description, quest.rewards.experience
                );
                if let Some(item) = &quest.rewards.item {
                    out.push_str(&format!(" + item {}", item));
                }
                out
            })?;
        }
        Commands::Accept { quest } => {
            let player = current_player(&auth, &store, &cli.token)?;
            let entry = game::accept_quest(&store, &player.id, &quest)?;
            emit(&entry, cli.json, || format!("Quest {} accepted ({}).", entry.quest_id, entry.status))?;
        }
        Commands::Complete { quest } => {
            let player = current_player(&auth, &store, &cli.token)?;
            let completion = game::complete_quest(&store, &player.id, &quest)?;
            emit(&completion, cli.json, || game::format_quest_completion(&completion))?;
        }
        Commands::UseItem { item } => {
            let player = current_player(&auth, &store, &cli.token)?;
            let used = game::use_item(&store, &player.id, &item)?;
            emit(&used, cli.json, || {
                let name = used
                    .used_item
                    .as_ref()
                    .map(|i| i.name.clone())
                    .unwrap_or_else(|| item.to_string());
                let mut lines = vec![format!("Used {}.", name)];
                lines.extend(game::format_inventory(&used.remaining_inventory, |id| {
                    store.try_get_item(id).ok().flatten()
                }));
                lines.join("\n")
            })?;
        }
        Commands::HasItem { item } => {
            let player = current_player(&auth, &store, &cli.token)?;
            let lookup = game::find_item(&player.inventory, &item);
            emit(&lookup, cli.json, || match lookup.item_index {
                Some(index) => format!("{} is in slot {}.", item, index + 1),
                None => format!("{} is not in your inventory.", item),
            })?;
        }
        Commands::AddItem {
            name,
            effect,
            kind,
            value,
        } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let item = game::create_item(
                &store,
                ItemDraft {
                    name,
                    effect,
                    kind,
                    value,
                },
            )?;
            emit(&item, cli.json, || format!("Created item {} ({}).", item.name, item.id))?;
        }
        Commands::AddQuest {
            title,
            description,
            level,
            xp,
            reward_item,
        } => {
            let rewards = (xp.is_some() || reward_item.is_some()).then(|| RewardConfig {
                experience: xp,
                item: reward_item,
            });
            let quest = game::create_quest(
                &store,
                QuestDraft {
                    title,
                    description,
                    level,
                    rewards,
                },
            )?;
            emit(&quest, cli.json, || format!("Created quest {} ({}).", quest.title, quest.id))?;
        }
        Commands::EditQuest {
            id,
            title,
            description,
            level,
            xp,
            reward_item,
        } => {
            let rewards = (xp.is_some() || reward_item.is_some()).then(|| RewardConfig {
                experience: xp,
                item: reward_item,
            });
            let quest = game::update_quest(
                &store,
                &id,
                QuestPatch {
                    title,
                    description,
                    level,
                    rewards,
                },
            )?;
            emit(&quest, cli.json, || format!("Updated quest {} ({}).", quest.title, quest.id))?;
        }
        Commands::RemoveQuest { id } => {
            let removed = game::delete_quest(&store, &id)?;
            emit(&removed, cli.json, || format!("Removed quest {} ({}).", removed.title, removed.id))?;
        }
    }

    Ok(())
}

fn require_token(token: &Option<String>) -> Result<&str> {
    token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow!("not logged in: pass --token or set QUESTHALL_TOKEN"))
}

fn current_player(auth: &AuthService, store: &GameStore, token: &Option<String>) -> Result<PlayerRecord> {
    let token = require_token(token)?;
    Ok(auth.authenticate(store, token)?)
}

fn parse_kind(raw: &str) -> Result<ItemKind> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|_| anyhow!("unknown item kind '{}' (weapon, armor, potion, quest_item)", raw))
}

fn print_session(session: &game::AuthSession, json: bool) -> Result<()> {
    emit(session, json, || {
        format!(
            "Welcome, {} (level {}).\nToken: {}\nExpires: {}\nexport QUESTHALL_TOKEN={}",
            session.player.name,
            session.player.level,
            session.token,
            session.expires_at.format("%Y-%m-%d %H:%M UTC"),
            session.token
        )
    })
}

fn emit<T: Serialize>(value: &T, json: bool, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Some(cfg) = config {
        let security_path = cfg.logging.security_file.clone();
        if let Some(ref file) = cfg.logging.file {
            if let Ok(f) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
            {
                let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
                // Echo to the console only when attached to a terminal
                let is_tty = atty::is(atty::Stream::Stderr);

                builder.format(move |fmt, record| {
                    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                    let line = format!("{} [{}] {}", ts, record.level(), record.args());

                    if let Ok(mut guard) = write_mutex.lock() {
                        let _ = writeln!(guard, "{}", line);
                    }

                    if record.target() == "security" {
                        if let Some(ref sec_path) = security_path {
                            if let Ok(mut sf) = std::fs::OpenOptions::new()
                                .create(true)
                                .append(true)
                                .open(sec_path)
                            {
                                let _ = writeln!(sf, "{}", line);
                            }
                        }
                    }

                    if is_tty {
                        writeln!(fmt, "{}", line)
                    } else {
                        Ok(())
                    }
                });
                let _ = builder.try_init();
                return;
            }
        }
    }
    builder.format(|fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
    });
    let _ = builder.try_init();
}
