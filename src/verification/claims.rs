//! Atomic claim extraction from document text.
//!
//! The extractor asks the oracle for dash-prefixed factual bullets and
//! parses the response line by line, filtering out short fragments,
//! boilerplate, and page metadata before emission. Oracle failure
//! yields an empty list; extraction never propagates errors.

use regex::Regex;
use std::sync::Arc;

use crate::llm::LlmClient;
use crate::verification::types::ExtractedClaim;

/// Per-call text budget; longer inputs are truncated before the oracle call.
const MAX_TEXT_LENGTH: usize = 12_000;

/// Inputs shorter than this are skipped entirely.
const MIN_INPUT_LENGTH: usize = 50;

/// Minimum words for an emitted claim.
const MIN_CLAIM_WORDS: usize = 8;

const BOILERPLATE_KEYWORDS: &[&str] = &[
    "member fdic",
    "all rights reserved",
    "privacy policy",
    "terms of use",
    "copyright",
    "offers checking accounts",
];

const PURE_METADATA_PATTERNS: &[&str] = &[
    "written by",
    "authored by",
    "posted by",
    "min read",
    "minute read",
    "reading time",
    "share on twitter",
    "share on facebook",
    "follow us",
    "subscribe to",
    "last modified",
    "last updated",
    "advertisement",
    "sponsored content",
    "table of contents",
    "click here",
    "read more about",
    "home >",
    "news >",
    "blog >",
];

/// Oracle-backed claim extractor.
pub struct ClaimExtractor {
    client: Arc<dyn LlmClient>,
    time_pattern: Regex,
}

impl ClaimExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            time_pattern: Regex::new(r"\b(\d{1,2}:\d{2}|am|pm|ist|gmt|utc)\b")
                .expect("static regex"),
        }
    }

    /// Extract atomic claims from a text block, each carrying the
    /// source URL back with it.
    pub async fn extract_claims(&self, text: &str, source_url: &str) -> Vec<ExtractedClaim> {
        if text.trim().len() < MIN_INPUT_LENGTH {
            return Vec::new();
        }

        let text = truncate_on_char_boundary(text, MAX_TEXT_LENGTH);
        let prompt = build_extraction_prompt(text);

        let response = match self.client.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(source_url, error = %e, "claim extraction oracle call failed");
                return Vec::new();
            }
        };

        self.parse_response(&response, source_url)
    }

    fn parse_response(&self, response: &str, source_url: &str) -> Vec<ExtractedClaim> {
        let mut claims = Vec::new();

        for line in response.lines() {
            let line = line.trim();
            if !line.starts_with('-') {
                continue;
            }

            let claim_text = line.trim_start_matches('-').trim();

            if is_too_short(claim_text) || is_boilerplate(claim_text) || self.is_metadata(claim_text)
            {
                continue;
            }

            claims.push(ExtractedClaim::new(claim_text, source_url));
        }

        claims
    }

    /// Lines that are page furniture rather than content: author
    /// credits, read-time tags, breadcrumbs, bare timestamps. Claims of
    /// ten or more words are never treated as metadata.
    fn is_metadata(&self, claim: &str) -> bool {
        let lower = claim.to_lowercase();
        let word_count = lower.split_whitespace().count();

        if word_count >= 10 {
            return false;
        }

        if PURE_METADATA_PATTERNS.iter().any(|p| lower.contains(p)) {
            return true;
        }

        // Short lines dominated by time markers are bare timestamps.
        if word_count < MIN_CLAIM_WORDS {
            let time_hits = self.time_pattern.find_iter(&lower).count();
            if time_hits >= 2 {
                return true;
            }
        }

        false
    }
}

fn is_too_short(claim: &str) -> bool {
    claim.split_whitespace().count() < MIN_CLAIM_WORDS
}

fn is_boilerplate(claim: &str) -> bool {
    let lower = claim.to_lowercase();
    BOILERPLATE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn truncate_on_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"You are an information extraction system specialized in extracting SUBSTANTIVE factual claims.

Extract ONLY explicit, factual claims that contain real information about the topic.

DO NOT EXTRACT author names, publication dates, read times, navigation text,
social sharing prompts, page metadata, article structure, or generic statements.

Rules:
- Extract only verifiable factual statements WITH REAL INFORMATION
- One claim per bullet (minimum 8 words each)
- Claims must contain specific facts, names, numbers, dates, or concrete information
- If no substantive factual claims exist, return NONE

Return format (use exactly this format):
- <claim 1>
- <claim 2>

TEXT:
{}"#,
        text
    )
}
