//! Player registration, login and session tokens.
//!
//! Passwords are hashed with Argon2id. Sessions are random uuid v4 tokens
//! stored alongside an expiry; expired tokens are deleted the first time they
//! are presented.

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Duration, Utc};
use log::{debug, info};
use password_hash::{PasswordHasher, PasswordVerifier};
use serde::Serialize;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::game::errors::GameError;
use crate::game::ids::EntityId;
use crate::game::storage::GameStore;
use crate::game::types::{PlayerRecord, PlayerSummary, SessionRecord};
use crate::validation::{validate_email, validate_password, validate_player_name, ValidationError};

/// Session lifetime when none is configured (7 days).
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}

/// A freshly issued login session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub player: PlayerSummary,
    pub expires_at: chrono::DateTime<Utc>,
}

pub struct AuthService {
    argon2: Argon2<'static>,
    session_ttl: Duration,
    min_password_len: usize,
}

impl Default for AuthService {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
        }
    }
}

impl AuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the optional `[security]` config section. Invalid Argon2
    /// parameters fall back to the library defaults.
    pub fn from_config(security: Option<&SecurityConfig>) -> Self {
        let mut service = Self::default();
        let Some(sec) = security else {
            return service;
        };
        if let Some(a) = &sec.argon2 {
            let base = Params::DEFAULT;
            let mem = a.memory_kib.unwrap_or(base.m_cost());
            let time = a.time_cost.unwrap_or(base.t_cost());
            let para = a.parallelism.unwrap_or(base.p_cost());
            match Params::new(mem, time, para, None) {
                Ok(params) => service.argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
                Err(e) => log::warn!("ignoring invalid argon2 params: {}", e),
            }
        }
        if let Some(hours) = sec.session_ttl_hours {
            service.session_ttl = Duration::hours(hours.clamp(1, MAX_SESSION_TTL_HOURS));
        }
        if let Some(min) = sec.min_password_length {
            service.min_password_len = min;
        }
        service
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn min_password_len(&self) -> usize {
        self.min_password_len
    }

    fn hash_password(&self, password: &str) -> Result<String, GameError> {
        let salt = password_hash::SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| GameError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, stored: &str) -> Result<bool, GameError> {
        let parsed = password_hash::PasswordHash::new(stored)
            .map_err(|e| GameError::PasswordHash(format!("corrupt password hash: {e}")))?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }

    fn issue_session(&self, store: &GameStore, player: &PlayerRecord) -> Result<AuthSession, GameError> {
        let token = Uuid::new_v4().to_string();
        let session = SessionRecord::new(token.clone(), player.id.clone(), Utc::now(), self.session_ttl);
        let expires_at = session.expires_at;
        store.put_session(session)?;
        Ok(AuthSession {
            token,
            player: player.summary(),
            expires_at,
        })
    }

    /// Create a player account and log it in.
    pub fn register(
        &self,
        store: &GameStore,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, GameError> {
        let name = validate_player_name(name)?;
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::Missing { field: "password" }.into());
        }
        if store.find_player_by_email(&email)?.is_some() {
            sec_log!("registration rejected: email already registered ({})", email);
            return Err(GameError::EmailTaken);
        }
        validate_password(password, self.min_password_len)?;

        let hash = self.hash_password(password)?;
        let player = PlayerRecord::new(EntityId::generate(), &name, &email, &hash);
        // The record goes in before the email claim so a live claim always
        // points at a stored player.
        store.put_player(player.clone())?;
        if !store.reserve_email(&email, &player.id)? {
            store.remove_player(&player.id)?;
            sec_log!("registration race lost for {}", email);
            return Err(GameError::EmailTaken);
        }

        info!(target: "security", "registered player {} ({})", player.id, email);
        self.issue_session(store, &player)
    }

    /// Exchange credentials for a session. Unknown email and wrong password
    /// produce the same error.
    pub fn login(&self, store: &GameStore, email: &str, password: &str) -> Result<AuthSession, GameError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::Missing { field: "email" }.into());
        }
        if password.is_empty() {
            return Err(ValidationError::Missing { field: "password" }.into());
        }

        let Some(player) = store.find_player_by_email(email)? else {
            sec_log!("login failed: unknown email {}", email);
            return Err(GameError::InvalidCredentials);
        };
        if !self.verify_password(password, &player.password_hash)? {
            sec_log!("login failed: bad password for player {}", player.id);
            return Err(GameError::InvalidCredentials);
        }

        info!(target: "security", "player {} logged in", player.id);
        self.issue_session(store, &player)
    }

    /// Resolve a session token to its player.
    pub fn authenticate(&self, store: &GameStore, token: &str) -> Result<PlayerRecord, GameError> {
        let token = token.trim();
        let Some(session) = store.get_session(token)? else {
            return Err(GameError::InvalidSession);
        };
        if session.is_expired(Utc::now()) {
            store.remove_session(token)?;
            debug!("removed expired session for player {}", session.player_id);
            return Err(GameError::SessionExpired);
        }
        match store.get_player(&session.player_id) {
            Ok(player) => Ok(player),
            Err(GameError::NotFound(_)) => {
                store.remove_session(token)?;
                Err(GameError::InvalidSession)
            }
            Err(e) => Err(e),
        }
    }

    /// Drop a session. Returns whether the token was live.
    pub fn logout(&self, store: &GameStore, token: &str) -> Result<bool, GameError> {
        let removed = store.remove_session(token.trim())?;
        if removed {
            info!(target: "security", "session closed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::storage::GameStoreBuilder;
    use tempfile::TempDir;

    /// Cheap Argon2 params keep the tests fast.
    fn fast_auth() -> AuthService {
        let sec = SecurityConfig {
            argon2: Some(crate::config::Argon2Config {
                memory_kib: Some(1024),
                time_cost: Some(1),
                parallelism: Some(1),
            }),
            session_ttl_hours: None,
            min_password_length: None,
        };
        AuthService::from_config(Some(&sec))
    }

    fn store() -> (TempDir, GameStore) {
        let dir = TempDir::new().unwrap();
        let store = GameStoreBuilder::new(dir.path()).open().unwrap();
        (dir, store)
    }

    #[test]
    fn register_then_login() {
        let (_dir, store) = store();
        let auth = fast_auth();
        let session = auth
            .register(&store, "Aria", "Aria@Example.com", "hunter22")
            .unwrap();
        assert_eq!(session.player.email, "aria@example.com");
        assert_eq!(session.player.level, 1);

        let stored = store.get_player(&session.player.id).unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));

        let login = auth.login(&store, "aria@example.com", "hunter22").unwrap();
        assert_eq!(login.player.id, session.player.id);
        assert_ne!(login.token, session.token);
    }

    #[test]
    fn duplicate_email_and_short_password() {
        let (_dir, store) = store();
        let auth = fast_auth();
        auth.register(&store, "Aria", "aria@example.com", "hunter22").unwrap();

        let err = auth
            .register(&store, "Other", "ARIA@example.com", "hunter22")
            .unwrap_err();
        assert!(matches!(err, GameError::EmailTaken));
        assert_eq!(err.to_string(), "email already registered");

        let err = auth.register(&store, "Bo", "bo@example.com", "12345").unwrap_err();
        assert_eq!(err.to_string(), "password must be at least 6 characters long");
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn stale_email_claim_does_not_block_registration() {
        let (_dir, store) = store();
        let auth = fast_auth();
        store
            .reserve_email("aria@example.com", &EntityId::parse("vanished").unwrap())
            .unwrap();

        let session = auth
            .register(&store, "Aria", "aria@example.com", "hunter22")
            .unwrap();
        let login = auth.login(&store, "aria@example.com", "hunter22").unwrap();
        assert_eq!(login.player.id, session.player.id);
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn bad_credentials_are_indistinguishable() {
        let (_dir, store) = store();
        let auth = fast_auth();
        auth.register(&store, "Aria", "aria@example.com", "hunter22").unwrap();

        let wrong = auth.login(&store, "aria@example.com", "nope-nope").unwrap_err();
        let unknown = auth.login(&store, "nobody@example.com", "hunter22").unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, GameError::InvalidCredentials));
    }

    #[test]
    fn sessions_authenticate_expire_and_logout() {
        let (_dir, store) = store();
        let auth = fast_auth();
        let session = auth.register(&store, "Aria", "aria@example.com", "hunter22").unwrap();

        let player = auth.authenticate(&store, &session.token).unwrap();
        assert_eq!(player.id, session.player.id);

        assert!(auth.logout(&store, &session.token).unwrap());
        assert!(matches!(
            auth.authenticate(&store, &session.token),
            Err(GameError::InvalidSession)
        ));

        let expired = fast_auth().with_session_ttl(Duration::seconds(-1));
        let stale = expired.login(&store, "aria@example.com", "hunter22").unwrap();
        assert!(matches!(
            auth.authenticate(&store, &stale.token),
            Err(GameError::SessionExpired)
        ));
        assert!(store.get_session(&stale.token).unwrap().is_none());
    }
}
