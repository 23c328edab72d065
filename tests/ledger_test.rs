//! Tests for word placement, steals and tile conservation.

use chrono::Utc;
use strictly_grams::{
    ConnId, GameError, GameRules, GameSession, LobbyCode, PermissiveDictionary, Phase, TOTAL_TILES,
    TileBag, TurnChange, WordId, WordList, added_letters, normalize_word,
};

const ALICE: ConnId = ConnId(1);
const BOB: ConnId = ConnId(2);

/// Starts a two-player game. After the opening deal and two rounds of draws
/// Alice holds C, A, T and Bob holds X, S, Q, and it is Alice's turn.
fn cat_game() -> GameSession {
    game_with(&['C', 'X', 'A', 'S', 'T', 'Q'])
}

/// Like [`cat_game`], with `stack` on top of the bag instead.
fn game_with(stack: &[char]) -> GameSession {
    let bag = TileBag::stacked(stack).expect("Stack failed");
    let code = LobbyCode::parse("LEDGR").expect("Bad code");
    let mut session = GameSession::with_bag(code, bag, &GameRules::default(), Utc::now());
    session
        .add_player(ALICE, "Alice".to_string(), None)
        .expect("Join failed");
    session
        .add_player(BOB, "Bob".to_string(), None)
        .expect("Join failed");
    session.start(ALICE, Utc::now()).expect("Start failed");
    for player in [ALICE, BOB, ALICE, BOB] {
        session.draw_tile(player, Utc::now()).expect("Draw failed");
    }
    session
}

fn place_cat(session: &mut GameSession) -> WordId {
    session
        .place_word(ALICE, "cat", &['c', 'a', 't'], &PermissiveDictionary, Utc::now())
        .expect("Placement failed")
        .word
        .id()
        .clone()
}

#[test]
fn test_normalize_word() {
    assert_eq!(normalize_word(" cats "), Ok("CATS".to_string()));
    assert!(matches!(normalize_word(""), Err(GameError::InvalidWord { .. })));
    assert!(matches!(normalize_word("c4t"), Err(GameError::InvalidWord { .. })));
    assert!(matches!(
        normalize_word(&"A".repeat(33)),
        Err(GameError::InvalidWord { .. })
    ));
}

#[test]
fn test_added_letters_by_value() {
    assert_eq!(added_letters("CAT", "CATS"), Ok(vec!['S']));
    assert_eq!(added_letters("CAT", "TACKS"), Ok(vec!['K', 'S']));
    assert_eq!(added_letters("TEE", "TEETH"), Ok(vec!['T', 'H']));
}

#[test]
fn test_added_letters_rejects_anagram_and_missing_letters() {
    assert!(matches!(
        added_letters("CAT", "ACT"),
        Err(GameError::InvalidSteal { .. })
    ));
    assert!(matches!(
        added_letters("CAT", "COTS"),
        Err(GameError::InvalidSteal { .. })
    ));
}

#[test]
fn test_place_word_moves_tiles_and_advances_turn() {
    let mut session = cat_game();
    assert_eq!(session.tile_total(), TOTAL_TILES);

    let placement = session
        .place_word(ALICE, "cat", &['C', 'A', 'T'], &PermissiveDictionary, Utc::now())
        .expect("Placement failed");
    assert_eq!(placement.word.text(), "CAT");
    assert!(!*placement.word.stolen());
    assert!(matches!(placement.change, TurnChange::Next { player, .. } if player == BOB));

    let alice = session.hand(ALICE).expect("Alice missing");
    assert!(alice.letters().is_empty());
    assert_eq!(alice.words().len(), 1);
    assert_eq!(session.turns().idle_turns(), 0);
    assert_eq!(session.tile_total(), TOTAL_TILES);
}

#[test]
fn test_place_word_out_of_turn() {
    let mut session = cat_game();
    let result = session.place_word(BOB, "sx", &['S', 'X'], &PermissiveDictionary, Utc::now());
    assert_eq!(result.err(), Some(GameError::NotYourTurn));
}

#[test]
fn test_place_word_with_missing_tile_changes_nothing() {
    let mut session = cat_game();
    let generation = session.turns().generation();
    let result = session.place_word(
        ALICE,
        "cats",
        &['C', 'A', 'T', 'S'],
        &PermissiveDictionary,
        Utc::now(),
    );
    assert_eq!(result.err(), Some(GameError::TilesUnavailable { letter: 'S' }));
    assert_eq!(session.hand(ALICE).expect("Alice missing").letters().len(), 3);
    assert_eq!(session.turns().current_player(), Some(ALICE));
    assert_eq!(session.turns().generation(), generation);
}

#[test]
fn test_place_word_tiles_must_spell_word() {
    let mut session = cat_game();
    let result = session.place_word(ALICE, "at", &['C', 'A', 'T'], &PermissiveDictionary, Utc::now());
    assert_eq!(
        result.err(),
        Some(GameError::TilesMismatch {
            word: "AT".to_string()
        })
    );
    assert_eq!(session.hand(ALICE).expect("Alice missing").letters().len(), 3);
}

#[test]
fn test_place_word_rejected_by_dictionary() {
    let mut session = cat_game();
    let words = WordList::from_words(["dog"]);
    let result = session.place_word(ALICE, "cat", &['C', 'A', 'T'], &words, Utc::now());
    assert_eq!(
        result.err(),
        Some(GameError::InvalidWord {
            word: "CAT".to_string()
        })
    );
    assert_eq!(session.hand(ALICE).expect("Alice missing").letters().len(), 3);
    assert_eq!(session.turns().current_player(), Some(ALICE));
}

#[test]
fn test_steal_extends_word() {
    let mut session = cat_game();
    let cat_id = place_cat(&mut session);

    let steal = session
        .steal_word(BOB, ALICE, &cat_id, "cats", &PermissiveDictionary, Utc::now())
        .expect("Steal failed");
    assert_eq!(steal.victim, ALICE);
    assert_eq!(steal.old_word_id, cat_id);
    assert_eq!(steal.added, vec!['S']);
    assert_eq!(steal.word.text(), "CATS");
    assert!(*steal.word.stolen());

    let alice = session.hand(ALICE).expect("Alice missing");
    let bob = session.hand(BOB).expect("Bob missing");
    assert!(alice.words().is_empty());
    assert_eq!(bob.words().len(), 1);
    assert_eq!(bob.letters().letters(), vec!['Q', 'X']);
    assert_eq!(session.tile_total(), TOTAL_TILES);
}

#[test]
fn test_word_ids_are_never_reissued() {
    let mut session = game_with(&['C', 'X', 'A', 'S', 'T', 'Q', 'O', 'Z', 'N']);
    let cat_id = place_cat(&mut session);
    let cats_id = session
        .steal_word(BOB, ALICE, &cat_id, "cats", &PermissiveDictionary, Utc::now())
        .expect("Steal failed")
        .word
        .id()
        .clone();

    // Alice draws O and N around Bob's turns, then plays ON.
    for player in [ALICE, BOB, ALICE, BOB] {
        session.draw_tile(player, Utc::now()).expect("Draw failed");
    }
    let on_id = session
        .place_word(ALICE, "on", &['O', 'N'], &PermissiveDictionary, Utc::now())
        .expect("Placement failed")
        .word
        .id()
        .clone();

    assert_ne!(cats_id, cat_id);
    assert_ne!(on_id, cat_id);
    assert_ne!(on_id, cats_id);
}

#[test]
fn test_steal_with_missing_letter_changes_nothing() {
    let mut session = cat_game();
    let cat_id = place_cat(&mut session);
    let generation = session.turns().generation();

    let result = session.steal_word(BOB, ALICE, &cat_id, "CATZ", &PermissiveDictionary, Utc::now());
    assert_eq!(result.err(), Some(GameError::TilesUnavailable { letter: 'Z' }));

    let alice = session.hand(ALICE).expect("Alice missing");
    let bob = session.hand(BOB).expect("Bob missing");
    assert!(alice.word(&cat_id).is_some());
    assert_eq!(bob.letters().len(), 3);
    assert!(bob.words().is_empty());
    assert_eq!(session.turns().current_player(), Some(BOB));
    assert_eq!(session.turns().generation(), generation);
}

#[test]
fn test_steal_rejects_rearrangement() {
    let mut session = cat_game();
    let cat_id = place_cat(&mut session);
    let result = session.steal_word(BOB, ALICE, &cat_id, "ACT", &PermissiveDictionary, Utc::now());
    assert!(matches!(result, Err(GameError::InvalidSteal { .. })));
    assert!(session.hand(ALICE).expect("Alice missing").word(&cat_id).is_some());
}

#[test]
fn test_steal_unknown_word() {
    let mut session = cat_game();
    place_cat(&mut session);
    let missing = WordId("deadbeef".to_string());
    let result = session.steal_word(BOB, ALICE, &missing, "CATS", &PermissiveDictionary, Utc::now());
    assert!(matches!(result, Err(GameError::WordNotFound { .. })));
}

#[test]
fn test_steal_from_unknown_player() {
    let mut session = cat_game();
    let cat_id = place_cat(&mut session);
    let result = session.steal_word(
        BOB,
        ConnId(99),
        &cat_id,
        "CATS",
        &PermissiveDictionary,
        Utc::now(),
    );
    assert_eq!(result.err(), Some(GameError::PlayerNotFound { player: ConnId(99) }));
}

#[test]
fn test_steal_rejected_by_dictionary() {
    let mut session = cat_game();
    let cat_id = place_cat(&mut session);
    let words = WordList::from_words(["CAT"]);
    let result = session.steal_word(BOB, ALICE, &cat_id, "CATS", &words, Utc::now());
    assert!(matches!(result, Err(GameError::InvalidWord { .. })));
    assert_eq!(session.hand(BOB).expect("Bob missing").letters().len(), 3);
}

#[test]
fn test_actions_rejected_before_start() {
    let code = LobbyCode::parse("WAITS").expect("Bad code");
    let mut session = GameSession::new(code, &GameRules::default(), Utc::now());
    session
        .add_player(ALICE, "Alice".to_string(), None)
        .expect("Join failed");
    assert_eq!(
        session.draw_tile(ALICE, Utc::now()).err(),
        Some(GameError::GameNotActive)
    );
}

#[test]
fn test_departed_tiles_stay_accounted() {
    let mut session = cat_game();
    place_cat(&mut session);
    session
        .add_player(ConnId(3), "Late".to_string(), None)
        .expect_err("Join after start should fail");

    let departure = session
        .remove_player(ALICE, Utc::now())
        .expect("Alice should leave");
    assert_eq!(departure.player.name, "Alice");
    assert!(matches!(departure.change, Some(TurnChange::GameOver(_))));
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.tile_total(), TOTAL_TILES);
}

#[test]
fn test_empty_bag_does_not_advance_turn() {
    let mut session = cat_game();
    while !session.bag().is_empty() {
        let player = session.turns().current_player().expect("No current player");
        session.draw_tile(player, Utc::now()).expect("Draw failed");
    }
    let player = session.turns().current_player().expect("No current player");
    let generation = session.turns().generation();
    assert_eq!(session.draw_tile(player, Utc::now()).err(), Some(GameError::EmptyBag));
    assert_eq!(session.turns().generation(), generation);
    assert_eq!(session.tile_total(), TOTAL_TILES);
}
