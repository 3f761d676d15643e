//! Fallback endpoint registry
//!
//! Purely advisory: admission decisions carry a `fallback_available` flag, and
//! the caller decides whether to route to an alternate endpoint. The registry
//! never performs the substitution itself.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Per-endpoint list of alternate endpoints
#[derive(Debug, Default)]
pub struct FallbackRegistry {
    routes: RwLock<HashMap<String, Vec<String>>>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the alternate endpoints for `endpoint`, replacing any
    /// previous registration
    pub fn register(&self, endpoint: &str, fallbacks: Vec<String>) {
        self.routes.write().insert(endpoint.to_string(), fallbacks);
    }

    /// Remove the registration for `endpoint`
    pub fn remove(&self, endpoint: &str) {
        self.routes.write().remove(endpoint);
    }

    /// Whether at least one alternate endpoint is registered
    pub fn has_fallback(&self, endpoint: &str) -> bool {
        self.routes
            .read()
            .get(endpoint)
            .is_some_and(|fallbacks| !fallbacks.is_empty())
    }

    /// The alternate endpoints registered for `endpoint`, in preference order
    pub fn fallbacks(&self, endpoint: &str) -> Vec<String> {
        self.routes.read().get(endpoint).cloned().unwrap_or_default()
    }
}
