//! Tests for the tile distribution, bag and letter multisets.

use strictly_grams::{GameError, LetterCounts, TILE_DISTRIBUTION, TOTAL_TILES, TileBag};

#[test]
fn test_distribution_totals_144() {
    let total: u32 = TILE_DISTRIBUTION.iter().map(|(_, count)| count).sum();
    assert_eq!(total as usize, TOTAL_TILES);
    assert_eq!(TILE_DISTRIBUTION.len(), 26);
}

#[test]
fn test_distribution_letter_counts() {
    let lookup = |letter: char| {
        TILE_DISTRIBUTION
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, count)| *count)
    };
    assert_eq!(lookup('E'), Some(18));
    assert_eq!(lookup('A'), Some(13));
    assert_eq!(lookup('Q'), Some(2));
    assert_eq!(lookup('Z'), Some(2));
}

#[test]
fn test_shuffled_bag_matches_distribution() {
    let bag = TileBag::shuffled();
    assert_eq!(bag.len(), TOTAL_TILES);
    let remaining = bag.remaining();
    for (letter, count) in TILE_DISTRIBUTION.iter() {
        assert_eq!(remaining.count(*letter), *count, "count for {letter}");
    }
}

#[test]
fn test_draw_until_empty() {
    let mut bag = TileBag::shuffled();
    for _ in 0..TOTAL_TILES {
        bag.draw().expect("Bag ran out early");
    }
    assert!(bag.is_empty());
    assert_eq!(bag.draw(), Err(GameError::EmptyBag));
}

#[test]
fn test_stacked_bag_draws_top_first() {
    let mut bag = TileBag::stacked(&['Q', 'U', 'E']).expect("Stack failed");
    assert_eq!(bag.len(), TOTAL_TILES);
    assert_eq!(bag.draw(), Ok('Q'));
    assert_eq!(bag.draw(), Ok('U'));
    assert_eq!(bag.draw(), Ok('E'));
    assert_eq!(bag.len(), TOTAL_TILES - 3);
}

#[test]
fn test_stacked_bag_rejects_oversupply() {
    assert_eq!(TileBag::stacked(&['Z', 'Z', 'Z']).err(), Some('Z'));
}

#[test]
fn test_letter_counts_multiplicity() {
    let counts: LetterCounts = "BANANA".chars().collect();
    assert_eq!(counts.count('A'), 3);
    assert_eq!(counts.count('N'), 2);
    assert_eq!(counts.count('B'), 1);
    assert_eq!(counts.len(), 6);
    assert_eq!(counts.letters(), vec!['A', 'A', 'A', 'B', 'N', 'N']);
}

#[test]
fn test_take_all_leaves_original_untouched() {
    let counts: LetterCounts = "CAT".chars().collect();
    let rest = counts.take_all(&['C', 'A']).expect("Take failed");
    assert_eq!(rest.letters(), vec!['T']);
    assert_eq!(counts.len(), 3);
}

#[test]
fn test_take_all_reports_first_missing_letter() {
    let counts: LetterCounts = "SEA".chars().collect();
    assert_eq!(counts.take_all(&['S', 'S']), Err('S'));
    assert_eq!(counts.take_all(&['A', 'Z', 'Q']), Err('Z'));
    assert!(!counts.contains_all(&['E', 'E']));
    assert!(counts.contains_all(&['E', 'A']));
}

#[test]
fn test_remove_drops_exhausted_letters() {
    let mut counts: LetterCounts = "AA".chars().collect();
    assert!(counts.remove('A'));
    assert!(counts.remove('A'));
    assert!(!counts.remove('A'));
    assert!(counts.is_empty());
    assert_eq!(counts, LetterCounts::new());
}
