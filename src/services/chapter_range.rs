//! Chapter reference normalization
//!
//! Turns free-form reading references such as `"18:9-16"`, `"18장 9-16절"`
//! or `"창세기 1-5"` into the ordered, distinct chapter numbers they denote.
//! Input that cannot be understood is passed through verbatim as a single
//! token so the reading can still be displayed.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on chapters produced by one range; wider ranges such as
/// `1-4000000000` are kept verbatim instead of being expanded.
pub const MAX_RANGE_SPAN: u32 = 10_000;

const RANGE_SEPARATORS: [char; 3] = ['~', '\u{2013}', '\u{2014}'];
const CHAPTER_MARKER: char = '장';
const VERSE_MARKER: char = '절';

/// Ordered set of chapter tokens, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterSet(Vec<String>);

impl ChapterSet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Number of tokens that are real chapter numbers.
    pub fn chapter_count(&self) -> usize {
        self.0.iter().filter(|t| is_chapter_token(t)).count()
    }

    /// `false` when at least one verbatim fallback token is present.
    pub fn is_fully_numeric(&self) -> bool {
        self.0.iter().all(|t| is_chapter_token(t))
    }

    pub fn chapters(&self) -> Vec<u32> {
        self.0.iter().filter_map(|t| t.parse().ok()).collect()
    }
}

impl<'a> IntoIterator for &'a ChapterSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub fn normalize_chapters(reference: &str) -> ChapterSet {
    let mut tokens = Vec::new();

    for part in reference.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        expand_part(part, &mut tokens);
    }

    ChapterSet(dedup_preserving_order(tokens))
}

fn expand_part(part: &str, out: &mut Vec<String>) {
    // 18:9-16
    if let Some((before, _)) = part.split_once(':') {
        let token = parse_digits(before)
            .map(|n| n.to_string())
            .unwrap_or_else(|| fallback(part));
        out.push(token);
        return;
    }

    // 18장 9-16절
    if part.contains(VERSE_MARKER) {
        let token = marked_chapter(part)
            .or_else(|| leading_integer(part))
            .map(|n| n.to_string())
            .unwrap_or_else(|| fallback(part));
        out.push(token);
        return;
    }

    let normalized: String = part
        .chars()
        .map(|c| if RANGE_SEPARATORS.contains(&c) { '-' } else { c })
        .filter(|&c| c != CHAPTER_MARKER)
        .collect();
    let normalized = normalized.trim();

    match normalized.split_once('-') {
        Some((start, end)) if !end.contains('-') => {
            match (parse_digits(start), parse_digits(end)) {
                (Some(s), Some(e)) if s <= e && e - s < MAX_RANGE_SPAN => {
                    out.extend((s..=e).map(|n| n.to_string()));
                }
                _ => out.push(fallback(normalized)),
            }
        }
        _ => {
            let token = parse_digits(normalized)
                .map(|n| n.to_string())
                .unwrap_or_else(|| fallback(normalized));
            out.push(token);
        }
    }
}

/// Keeps only ASCII digits and parses what is left.
fn parse_digits(s: &str) -> Option<u32> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// First `<digits>장` occurrence.
fn marked_chapter(s: &str) -> Option<u32> {
    chapter_marker()?
        .captures_iter(s)
        .find_map(|caps| caps.get(1)?.as_str().parse().ok())
}

fn chapter_marker() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)장").ok()).as_ref()
}

fn leading_integer(s: &str) -> Option<u32> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn fallback(raw: &str) -> String {
    let token = raw.trim().to_string();
    tracing::debug!(token = %token, "chapter reference kept verbatim");
    token
}

fn is_chapter_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn dedup_preserving_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
