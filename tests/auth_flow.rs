//! Registration, login and session handling against a real store
mod common;

use chrono::Duration;
use common::{empty_store, fast_auth};
use questhall::game::{accept_quest, GameError, QuestId};

#[test]
fn register_login_and_play() {
    let (store, _temp) = common::seeded_store();
    let auth = fast_auth();

    let session = auth
        .register(&store, "Aria", "aria@example.com", "hunter22")
        .expect("register");
    let player = auth.authenticate(&store, &session.token).expect("authenticate");
    assert_eq!(player.name, "Aria");

    let quest = QuestId::parse("rat-cellar").expect("quest id");
    accept_quest(&store, &player.id, &quest).expect("accept");

    let login = auth
        .login(&store, "ARIA@example.com", "hunter22")
        .expect("login with different case");
    assert_eq!(login.player.id, player.id);
}

#[test]
fn registration_rejections() {
    let (store, _temp) = empty_store();
    let auth = fast_auth();

    for (name, email, password) in [
        ("", "a@example.com", "hunter22"),
        ("Aria", "", "hunter22"),
        ("Aria", "a@example.com", ""),
    ] {
        let err = auth.register(&store, name, email, password).unwrap_err();
        assert!(matches!(err, GameError::Validation(_)), "{name:?} {email:?}");
    }

    assert!(matches!(
        auth.register(&store, "Aria", "not-an-email", "hunter22"),
        Err(GameError::Validation(_))
    ));

    auth.register(&store, "Aria", "a@example.com", "hunter22")
        .expect("first registration");
    assert!(matches!(
        auth.register(&store, "Aria Two", "a@example.com", "x"),
        Err(GameError::EmailTaken)
    ));
    assert_eq!(store.player_count(), 1);
}

#[test]
fn expired_sessions_are_rejected_and_purged() {
    let (store, _temp) = empty_store();
    let auth = fast_auth();
    auth.register(&store, "Aria", "aria@example.com", "hunter22")
        .expect("register");

    let short = fast_auth().with_session_ttl(Duration::seconds(-5));
    let stale = short
        .login(&store, "aria@example.com", "hunter22")
        .expect("login");
    let stale2 = short
        .login(&store, "aria@example.com", "hunter22")
        .expect("login");

    assert!(matches!(
        auth.authenticate(&store, &stale.token),
        Err(GameError::SessionExpired)
    ));
    assert_eq!(
        store
            .purge_expired_sessions(chrono::Utc::now())
            .expect("purge"),
        1
    );
    assert!(matches!(
        auth.authenticate(&store, &stale2.token),
        Err(GameError::InvalidSession)
    ));
}

#[test]
fn garbage_token_is_invalid() {
    let (store, _temp) = empty_store();
    let auth = fast_auth();
    assert!(matches!(
        auth.authenticate(&store, "not-a-token"),
        Err(GameError::InvalidSession)
    ));
    assert!(!auth.logout(&store, "not-a-token").expect("logout"));
}
