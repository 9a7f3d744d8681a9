//! Scoring of a single (capture, key file) candidate.

use std::time::Duration;

use super::CandidateFile;

const EXACT_STEM: u32 = 100;
const STEM_CONTAINS: u32 = 50;
const KEY_LIKE_NAME: u32 = 20;
const SHARED_NUMBER: u32 = 30;
const WITHIN_HOUR: u32 = 25;
const WITHIN_DAY: u32 = 10;

/// Best scores below this are not trusted; pairing falls back to the first key file.
pub const MIN_CONFIDENT_SCORE: u32 = 20;

const KEY_TOKENS: [&str; 3] = ["sslkey", "keylog", "keys"];

/// How strongly `key` looks like the key-material file for `capture`.
pub fn pair_score(capture: &CandidateFile, key: &CandidateFile) -> u32 {
    let cap = capture.stem.as_str();
    let k = key.stem.as_str();
    let mut score = 0;

    if cap == k {
        score += EXACT_STEM;
    } else if cap.contains(k) || k.contains(cap) {
        score += STEM_CONTAINS;
    }

    if KEY_TOKENS.iter().any(|t| k.contains(t)) {
        score += KEY_LIKE_NAME;
    }

    let key_numbers = numbers(k);
    for n in numbers(cap) {
        if key_numbers.contains(&n) {
            score += SHARED_NUMBER;
        }
    }

    let diff = mtime_distance(capture, key);
    if diff <= Duration::from_secs(3_600) {
        score += WITHIN_HOUR;
    } else if diff <= Duration::from_secs(86_400) {
        score += WITHIN_DAY;
    }

    score
}

fn mtime_distance(a: &CandidateFile, b: &CandidateFile) -> Duration {
    a.mtime
        .duration_since(b.mtime)
        .or_else(|_| b.mtime.duration_since(a.mtime))
        .unwrap_or(Duration::MAX)
}

/// Maximal runs of ASCII digits, in order of appearance.
fn numbers(stem: &str) -> Vec<&str> {
    stem.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect()
}
