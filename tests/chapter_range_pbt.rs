//! Property-Based Tests for chapter reference normalization
//!
//! Tests the following invariants:
//! - No duplicate tokens for any input
//! - Numeric tokens are canonical decimal (no leading zeros)
//! - Plain ranges expand to exactly `end - start + 1` chapters
//! - Verse references keep only the chapter

use std::collections::HashSet;

use proptest::prelude::*;

use tongdok::normalize_chapters;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_book() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(""),
        Just("창세기 "),
        Just("시편 "),
        Just("요한복음 "),
        Just("Gen "),
    ]
}

fn arb_separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("-"), Just("~"), Just("\u{2013}"), Just("\u{2014}")]
}

fn arb_part() -> impl Strategy<Value = String> {
    prop_oneof![
        (arb_book(), 1u32..=150).prop_map(|(b, c)| format!("{b}{c}")),
        (arb_book(), 1u32..=150, 0u32..=20, arb_separator())
            .prop_map(|(b, s, len, sep)| format!("{b}{s}{sep}{}", s + len)),
        (1u32..=150, 1u32..=30, 1u32..=30).prop_map(|(c, v1, v2)| format!("{c}:{v1}-{v2}")),
        (1u32..=150, 1u32..=30, 1u32..=30).prop_map(|(c, v1, v2)| format!("{c}장 {v1}-{v2}절")),
        "[가-힣a-z ]{0,8}",
    ]
}

fn arb_reference() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_part(), 0..5).prop_map(|parts| parts.join(", "))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_no_duplicate_tokens(reference in arb_reference()) {
        let set = normalize_chapters(&reference);
        let unique: HashSet<&String> = set.iter().collect();
        prop_assert_eq!(unique.len(), set.len());
    }

    #[test]
    fn prop_numeric_tokens_are_canonical(reference in arb_reference()) {
        for token in normalize_chapters(&reference).iter() {
            if token.chars().all(|c| c.is_ascii_digit()) {
                let n: u32 = token.parse().unwrap();
                prop_assert_eq!(&n.to_string(), token);
            }
        }
    }

    #[test]
    fn prop_range_expands_inclusively(
        book in arb_book(),
        start in 1u32..=150,
        len in 0u32..=400,
        sep in arb_separator(),
    ) {
        let end = start + len;
        let set = normalize_chapters(&format!("{book}{start}{sep}{end}"));
        prop_assert_eq!(set.len() as u32, len + 1);
        prop_assert!(set.is_fully_numeric());
        prop_assert_eq!(set.chapters(), (start..=end).collect::<Vec<_>>());
    }

    #[test]
    fn prop_verse_references_keep_chapter(chapter in 1u32..=150, v1 in 1u32..=40, v2 in 1u32..=40) {
        let colon = normalize_chapters(&format!("{chapter}:{v1}-{v2}"));
        let korean = normalize_chapters(&format!("{chapter}장 {v1}-{v2}절"));
        prop_assert_eq!(colon.as_slice(), &[chapter.to_string()]);
        prop_assert_eq!(korean.as_slice(), &[chapter.to_string()]);
    }

    #[test]
    fn prop_normalize_never_panics(reference in ".{0,40}") {
        let _ = normalize_chapters(&reference);
    }
}

// ============================================================================
// Documented examples
// ============================================================================

#[test]
fn documented_examples() {
    let cases: [(&str, &[&str]); 6] = [
        ("1-5", &["1", "2", "3", "4", "5"]),
        ("119", &["119"]),
        ("창세기 1-5", &["1", "2", "3", "4", "5"]),
        ("창세기 1", &["1"]),
        ("18:9-16", &["18"]),
        ("18장 9-16절", &["18"]),
    ];

    for (reference, expected) in cases {
        let set = normalize_chapters(reference);
        assert_eq!(set.as_slice(), expected, "reference {reference:?}");
    }
}
