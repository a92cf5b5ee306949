//! Lexical scorer - weighted token overlap between a query and arbitrary JSON
//!
//! Every piece of text in a document contributes its tokens with a weight:
//! shallow strings count more than deeply nested ones, and values under
//! descriptive keys (`label`, `name`, `title`, ...) are boosted. The score is
//! the weight mass of query tokens divided by the total mass plus the query
//! size. No corpus statistics are involved, so scores rank documents against
//! one query but are not calibrated across queries.

use crate::document::Document;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

const DESCRIPTIVE_KEYS: &[&str] = &["label", "name", "title", "desc", "summary"];
const DESCRIPTIVE_KEY_WEIGHT: f64 = 2.5;

/// Lower-case `text` and split it into maximal runs of word characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A query prepared for scoring many documents
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    tokens: HashSet<String>,
}

impl LexicalScorer {
    /// Tokenize the query once
    pub fn new(query: &str) -> Self {
        Self {
            tokens: tokenize(query).into_iter().collect(),
        }
    }

    /// Whether the query produced no tokens at all
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Score one document. Always `>= 0`.
    pub fn score(&self, document: &Value) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }

        // Accumulate in walk order; the result must not depend on hashing
        let mut doc_sum = 0.0;
        let mut intersect = 0.0;
        collect_text(document, 0, 1.0, &mut |text, weight| {
            for token in tokenize(text) {
                doc_sum += weight;
                if self.tokens.contains(&token) {
                    intersect += weight;
                }
            }
        });
        if doc_sum <= 0.0 {
            return 0.0;
        }

        intersect / (doc_sum + self.tokens.len() as f64)
    }

    /// Score every document, keep positive scores, and return the best `k`.
    ///
    /// Ties keep the order in which documents were supplied.
    pub fn top_k<'a>(&self, documents: &'a [Document], k: usize) -> Vec<ScoredDocument<'a>> {
        let mut scored: Vec<ScoredDocument<'a>> = documents
            .iter()
            .filter_map(|document| {
                let score = self.score(&document.raw);
                (score > 0.0).then_some(ScoredDocument { document, score })
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }
}

/// A document paired with its relevance score
#[derive(Debug, Clone, Copy)]
pub struct ScoredDocument<'a> {
    pub document: &'a Document,
    pub score: f64,
}

/// Convenience wrapper around [`LexicalScorer::score`]
pub fn score(query: &str, document: &Value) -> f64 {
    LexicalScorer::new(query).score(document)
}

fn key_weight(key: &str) -> f64 {
    let key = key.to_lowercase();
    if DESCRIPTIVE_KEYS.iter().any(|k| key.contains(k)) {
        DESCRIPTIVE_KEY_WEIGHT
    } else {
        1.0
    }
}

fn depth_weight(depth: usize) -> f64 {
    (3.0 - 0.3 * depth as f64).max(1.0)
}

/// Render a scalar the way it should be tokenized; `None` for containers and null
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect_text(value: &Value, depth: usize, multiplier: f64, sink: &mut impl FnMut(&str, f64)) {
    match value {
        Value::Null => {}
        Value::String(s) => sink(s, depth_weight(depth) * multiplier),
        Value::Number(_) | Value::Bool(_) => {
            if let Some(text) = scalar_text(value) {
                sink(&text, multiplier);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, depth + 1, multiplier, sink);
            }
        }
        Value::Object(fields) => {
            for (key, item) in fields {
                let weight = key_weight(key) * multiplier;
                match scalar_text(item) {
                    Some(text) => sink(&text, weight),
                    None => collect_text(item, depth + 1, weight, sink),
                }
            }
        }
    }
}
