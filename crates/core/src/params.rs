//! Search request parameters as they arrive from an HTTP query string

use serde::Serialize;

pub const DEFAULT_K: usize = 5;
pub const DEFAULT_HOPS: usize = 1;

/// Parsed `q`, `k` and `hops` parameters.
///
/// Values that are missing or not non-negative integers fall back to the
/// defaults instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub q: String,
    pub k: usize,
    pub hops: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            k: DEFAULT_K,
            hops: DEFAULT_HOPS,
        }
    }
}

impl SearchParams {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    /// Build parameters from decoded query-string pairs. Unknown keys are ignored.
    pub fn from_query_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "q" => params.q = value.to_string(),
                "k" => params.k = parse_or(value, DEFAULT_K),
                "hops" => params.hops = parse_or(value, DEFAULT_HOPS),
                _ => {}
            }
        }
        params
    }

    /// Whether this request is really a full-graph request
    pub fn is_graph_request(&self) -> bool {
        self.q.trim().is_empty()
    }
}

fn parse_or(value: &str, default: usize) -> usize {
    value.trim().parse().unwrap_or(default)
}
