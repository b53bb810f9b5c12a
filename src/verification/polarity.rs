//! Lexical stance polarity.
//!
//! A coarse sign for a claim's directional stance, used only for
//! conflict detection between claims that the matcher already judged
//! semantically similar.

/// Verbs asserting a decreasing/limiting effect.
const POSITIVE_KEYWORDS: &[&str] = &[
    "reduce", "decrease", "lower", "decline", "fall", "slow", "limit", "control", "curb",
];

/// Verbs asserting an increasing/worsening effect.
const NEGATIVE_KEYWORDS: &[&str] = &[
    "increase", "rise", "raise", "boost", "accelerate", "worsen", "expand",
];

/// Score the stance of a claim.
///
/// Returns +1 for a decreasing assertion, -1 for an increasing one, and
/// 0 when neutral or tied.
pub fn polarity_score(text: &str) -> i32 {
    let text = text.to_lowercase();

    let positive_hits = POSITIVE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
    let negative_hits = NEGATIVE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();

    match positive_hits.cmp(&negative_hits) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}
