//! Longest-prefix route resolution and path rewriting.
//!
//! The table is built once at startup from the configured bindings and is
//! immutable afterwards, so lookups need no synchronization. Bindings are
//! sorted by public-prefix length descending at construction (stable sort,
//! so registration order is the documented tie-break for equal-length
//! prefixes) and the first match wins.

use thiserror::Error;

use crate::config::models::RouteBindingConfig;

/// Route resolution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No configured public prefix matches the request path. Surfaced as a
    /// 404 and never retried.
    #[error("no route matches path '{0}'")]
    NoMatchingRoute(String),
}

/// One immutable (public prefix, upstream, internal prefix) binding.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    pub public_prefix: String,
    pub upstream: String,
    pub internal_prefix: String,
}

/// Outcome of a successful resolution: where to send the request and what
/// the rewritten path (including any query string) looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub upstream: String,
    pub rewritten_path: String,
    pub public_prefix: String,
}

/// Ordered set of route bindings with longest-prefix-match resolution.
pub struct RouteTable {
    bindings: Vec<RouteBinding>,
}

impl RouteTable {
    /// Build the table from configured bindings. Sorting happens here, once,
    /// so the per-request hot path is a linear scan over an already-ordered
    /// slice.
    pub fn new(routes: &[RouteBindingConfig]) -> Self {
        let mut bindings: Vec<RouteBinding> = routes
            .iter()
            .map(|r| RouteBinding {
                public_prefix: r.public_prefix.clone(),
                upstream: r.upstream.trim_end_matches('/').to_string(),
                internal_prefix: r.internal_prefix.clone(),
            })
            .collect();

        // Stable sort keeps registration order among equal-length prefixes.
        bindings.sort_by_key(|b| std::cmp::Reverse(b.public_prefix.len()));

        Self { bindings }
    }

    /// Resolve a request path (with optional query string) to an upstream
    /// target and rewritten path.
    ///
    /// The matched public prefix is replaced by the binding's internal
    /// prefix; the remainder of the path and the query string are preserved
    /// untouched. An empty internal prefix strips the public prefix
    /// entirely.
    pub fn resolve(&self, path_and_query: &str) -> Result<ResolvedRoute, RouteError> {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path_and_query, None),
        };

        let binding = self
            .bindings
            .iter()
            .find(|b| path.starts_with(&b.public_prefix))
            .ok_or_else(|| RouteError::NoMatchingRoute(path.to_string()))?;

        let remainder = &path[binding.public_prefix.len()..];
        let mut rewritten = format!("{}{remainder}", binding.internal_prefix);
        if rewritten.is_empty() {
            rewritten.push('/');
        }
        if let Some(q) = query {
            rewritten.push('?');
            rewritten.push_str(q);
        }

        Ok(ResolvedRoute {
            upstream: binding.upstream.clone(),
            rewritten_path: rewritten,
            public_prefix: binding.public_prefix.clone(),
        })
    }

    /// Number of configured bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the table has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
