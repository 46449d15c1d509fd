//! Full-text search over posts.
//!
//! Ranking and snippets come from the database's FTS index; this layer only
//! shapes the match expression and the options.

use crate::posts::MAX_PAGE_SIZE;
use domains::{PostRepo, Result, SearchHit, SearchOptions, Visibility};
use std::sync::Arc;

/// Turns free text into an FTS5 match expression: every whitespace
/// separated term becomes a quoted prefix query, and the engine ANDs them.
/// Returns `None` when nothing searchable is left.
pub fn build_match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" "))
}

pub struct SearchService {
    posts: Arc<dyn PostRepo>,
}

impl SearchService {
    pub fn new(posts: Arc<dyn PostRepo>) -> Self {
        Self { posts }
    }

    /// Blank queries return no hits without touching the store.
    pub async fn search(&self, query: &str, mut opts: SearchOptions) -> Result<Vec<SearchHit>> {
        let Some(expr) = build_match_expression(query) else {
            return Ok(Vec::new());
        };

        opts.limit = opts.limit.clamp(1, MAX_PAGE_SIZE);
        if opts.visibility.is_empty() {
            opts.visibility = Visibility::LISTED.to_vec();
        }

        tracing::debug!(query, expr = %expr, limit = opts.limit, offset = opts.offset, "searching posts");
        self.posts.search_posts(&expr, &opts).await
    }
}
