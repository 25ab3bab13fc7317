//! Keyword/confidence matcher
//!
//! Scores candidate tools against free text using three tiers of keyword
//! match: exact token, substring, and loose. The additive constants are
//! hand-tuned and load-bearing; callers treat them as behavioral contract,
//! not as a principled scoring model.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::KeywordMapping;

// Tier scoring constants. Tests depend on these exact values.
const EXACT_BASE: f64 = 0.8;
const EXACT_PER_EXTRA: f64 = 0.05;
const EXACT_LONG_BONUS: f64 = 0.1;
const EXACT_LONG_LEN: usize = 6;
const EXACT_CAP: f64 = 1.0;

const SUBSTRING_BASE: f64 = 0.4;
const SUBSTRING_PER_MATCH: f64 = 0.08;
const SUBSTRING_LONG_BONUS: f64 = 0.1;
const SUBSTRING_LONG_LEN: usize = 4;
const SUBSTRING_CAP: f64 = 0.7;

const LOOSE_BASE: f64 = 0.1;
const LOOSE_PER_MATCH: f64 = 0.05;
const LOOSE_CAP: f64 = 0.4;

/// Minimum token length considered for loose matching
const LOOSE_MIN_TOKEN_LEN: usize = 3;

/// One ranked match against the keyword index
#[derive(Debug, Clone, Serialize)]
pub struct KeywordMatch {
    /// Matched tool
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Keywords that produced the winning tier
    #[serde(rename = "matchedKeywords")]
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone)]
struct WeightedKeyword {
    keyword: String,
    weight: f64,
}

/// In-memory index of keyword mappings, grouped by tool
#[derive(Debug, Default)]
pub struct KeywordIndex {
    by_tool: HashMap<String, Vec<WeightedKeyword>>,
}

impl KeywordIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from persisted mapping rows
    ///
    /// Duplicate (tool, keyword) pairs keep the first row, matching the
    /// uniqueness constraint on the persisted table.
    pub fn from_mappings(mappings: &[KeywordMapping]) -> Self {
        let mut index = Self::new();
        for mapping in mappings {
            index.insert(mapping);
        }
        index
    }

    /// Add one mapping row
    pub fn insert(&mut self, mapping: &KeywordMapping) {
        let keyword = mapping.keyword.to_lowercase();
        let entries = self.by_tool.entry(mapping.tool_name.clone()).or_default();
        if entries.iter().any(|e| e.keyword == keyword) {
            return;
        }
        entries.push(WeightedKeyword {
            keyword,
            weight: mapping.confidence.clamp(0.0, 1.0),
        });
    }

    /// Number of tools with at least one keyword
    pub fn tool_count(&self) -> usize {
        self.by_tool.len()
    }

    /// Total number of indexed keyword rows
    pub fn mapping_count(&self) -> usize {
        self.by_tool.values().map(Vec::len).sum()
    }

    /// Whether the index holds any mappings
    pub fn is_empty(&self) -> bool {
        self.by_tool.is_empty()
    }

    /// Tools from `discovered` that have no mapping in the index
    pub fn unmapped_tools(&self, discovered: &[String]) -> Vec<String> {
        discovered
            .iter()
            .filter(|name| !self.by_tool.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Rank all tools against the input text
    ///
    /// Ties break by higher confidence first, then alphabetical tool name,
    /// so ordering is deterministic and testable.
    pub fn match_text(&self, text: &str) -> Vec<KeywordMatch> {
        let lower = text.to_lowercase();
        let tokens: HashSet<&str> = lower.split_whitespace().collect();

        let mut matches: Vec<KeywordMatch> = self
            .by_tool
            .iter()
            .filter_map(|(tool, keywords)| score_tool(tool, keywords, &lower, &tokens))
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tool_name.cmp(&b.tool_name))
        });
        matches
    }
}

/// Score one tool's keyword set; best-scoring observed tier wins.
fn score_tool(
    tool: &str,
    keywords: &[WeightedKeyword],
    lower: &str,
    tokens: &HashSet<&str>,
) -> Option<KeywordMatch> {
    let mut exact: Vec<&WeightedKeyword> = Vec::new();
    let mut substring: Vec<&WeightedKeyword> = Vec::new();
    let mut loose: Vec<&WeightedKeyword> = Vec::new();

    for entry in keywords {
        if tokens.contains(entry.keyword.as_str()) {
            exact.push(entry);
        } else if lower.contains(&entry.keyword) {
            substring.push(entry);
        } else if tokens
            .iter()
            .any(|t| t.len() >= LOOSE_MIN_TOKEN_LEN && entry.keyword.contains(t))
        {
            loose.push(entry);
        }
    }

    let exact_tier = (!exact.is_empty()).then(|| {
        let mut score = EXACT_BASE + EXACT_PER_EXTRA * (exact.len() - 1) as f64;
        if longest(&exact) >= EXACT_LONG_LEN {
            score += EXACT_LONG_BONUS;
        }
        (exact, score, EXACT_CAP)
    });
    let substring_tier = (!substring.is_empty()).then(|| {
        let mut score = SUBSTRING_BASE + SUBSTRING_PER_MATCH * substring.len() as f64;
        if longest(&substring) >= SUBSTRING_LONG_LEN {
            score += SUBSTRING_LONG_BONUS;
        }
        (substring, score, SUBSTRING_CAP)
    });
    let loose_tier = (!loose.is_empty()).then(|| {
        let score = LOOSE_BASE + LOOSE_PER_MATCH * loose.len() as f64;
        (loose, score, LOOSE_CAP)
    });

    // Every observed tier is weighted by its strongest backing row, and
    // the best weighted tier wins. A weak exact-token row must not
    // suppress a strong substring match, and adding an exact match can
    // only ever raise a tool's confidence.
    let mut best: Option<KeywordMatch> = None;
    for (matched, score, cap) in [exact_tier, substring_tier, loose_tier].into_iter().flatten() {
        let weight = matched.iter().map(|e| e.weight).fold(0.0f64, f64::max);
        let confidence = (score.min(cap) * weight).clamp(0.0, 1.0);
        if best.as_ref().map_or(true, |b| confidence > b.confidence) {
            best = Some(KeywordMatch {
                tool_name: tool.to_string(),
                confidence,
                matched_keywords: matched.iter().map(|e| e.keyword.clone()).collect(),
            });
        }
    }
    best
}

fn longest(entries: &[&WeightedKeyword]) -> usize {
    entries.iter().map(|e| e.keyword.chars().count()).max().unwrap_or(0)
}
