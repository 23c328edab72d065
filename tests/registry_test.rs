//! Tests for lobby codes and the session registry.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use strictly_grams::{
    CodeGenerator, ConnId, GameError, GameRules, GameSession, Host, LOBBY_CODE_LEN, LobbyCode,
    RandomCodes, SessionRegistry, lock_session,
};

/// Hands out scripted codes, repeating the last one forever.
struct ScriptedCodes {
    codes: Mutex<Vec<&'static str>>,
}

impl ScriptedCodes {
    fn new(mut codes: Vec<&'static str>) -> Self {
        codes.reverse();
        Self {
            codes: Mutex::new(codes),
        }
    }
}

impl CodeGenerator for ScriptedCodes {
    fn generate(&self) -> LobbyCode {
        let mut codes = self.codes.lock().expect("Lock poisoned");
        let code = if codes.len() > 1 {
            codes.pop().expect("Script empty")
        } else {
            codes[0]
        };
        LobbyCode::parse(code).expect("Bad scripted code")
    }
}

fn host(id: u64) -> Host {
    Host {
        conn: ConnId(id),
        name: format!("Player {id}"),
        account: None,
    }
}

#[test]
fn test_lobby_code_parse_normalizes_case() {
    let code = LobbyCode::parse(" abcde ").expect("Parse failed");
    assert_eq!(code.as_str(), "ABCDE");
    assert_eq!(code.to_string(), "ABCDE");
    assert_eq!("qwert".parse::<LobbyCode>(), LobbyCode::parse("QWERT"));
}

#[test]
fn test_lobby_code_parse_rejects_bad_input() {
    for bad in ["", "ABCD", "ABCDEF", "AB1DE", "AB DE"] {
        assert!(
            matches!(LobbyCode::parse(bad), Err(GameError::InvalidRequest { .. })),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_random_codes_are_uppercase_letters() {
    for _ in 0..50 {
        let code = RandomCodes.generate();
        assert_eq!(code.as_str().len(), LOBBY_CODE_LEN);
        assert!(code.as_str().chars().all(|ch| ch.is_ascii_uppercase()));
    }
}

#[test]
fn test_create_registers_session_with_host() {
    let registry = SessionRegistry::new();
    let (code, session, player) = registry
        .create(host(1), &GameRules::default())
        .expect("Create failed");

    assert_eq!(player.id, ConnId(1));
    assert!(registry.contains(&code));
    assert_eq!(registry.len(), 1);
    let game = lock_session(&session);
    assert_eq!(game.code(), &code);
    assert!(game.has_player(ConnId(1)));
}

#[test]
fn test_create_retries_past_collisions() {
    let codes = Arc::new(ScriptedCodes::new(vec!["AAAAA", "AAAAA", "BBBBB"]));
    let registry = SessionRegistry::with_codes(codes);
    let rules = GameRules::default();

    let (first, _, _) = registry.create(host(1), &rules).expect("Create failed");
    let (second, _, _) = registry.create(host(2), &rules).expect("Create failed");
    assert_eq!(first.as_str(), "AAAAA");
    assert_eq!(second.as_str(), "BBBBB");
}

#[test]
fn test_create_gives_up_after_attempts() {
    let registry = SessionRegistry::with_codes(Arc::new(ScriptedCodes::new(vec!["ZZZZZ"])));
    let rules = GameRules::default();
    registry.create(host(1), &rules).expect("Create failed");

    let result = registry.create(host(2), &rules);
    assert_eq!(
        result.err(),
        Some(GameError::CodeGenerationExhausted { attempts: 5 })
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_insert_hands_back_session_on_live_code() {
    let registry = SessionRegistry::new();
    let rules = GameRules::default();
    let code = LobbyCode::parse("TAKEN").expect("Bad code");
    registry
        .insert(GameSession::new(code.clone(), &rules, Utc::now()))
        .expect("Insert failed");

    let mut duplicate = GameSession::new(code.clone(), &rules, Utc::now());
    duplicate
        .add_player(ConnId(7), "Dup".to_string(), None)
        .expect("Join failed");
    let rejected = registry.insert(duplicate).expect_err("Duplicate accepted");
    assert_eq!(rejected.code(), &code);
    assert!(rejected.has_player(ConnId(7)));

    let live = registry.get(&code).expect("Original gone");
    assert_eq!(lock_session(&live).player_count(), 0);
}

#[test]
fn test_get_unknown_code() {
    let registry = SessionRegistry::new();
    let code = LobbyCode::parse("NOPEE").expect("Bad code");
    assert_eq!(
        registry.get(&code).err(),
        Some(GameError::LobbyNotFound { code })
    );
}

#[test]
fn test_remove_is_idempotent() {
    let registry = SessionRegistry::new();
    let (code, _, _) = registry
        .create(host(1), &GameRules::default())
        .expect("Create failed");

    assert!(registry.remove(&code).is_some());
    assert!(registry.remove(&code).is_none());
    assert!(registry.is_empty());
    assert!(registry.get(&code).is_err());
}

#[test]
fn test_sessions_snapshot() {
    let registry = SessionRegistry::new();
    let rules = GameRules::default();
    registry.create(host(1), &rules).expect("Create failed");
    registry.create(host(2), &rules).expect("Create failed");
    assert_eq!(registry.sessions().len(), 2);
}
