//! Engine configuration loaded from the environment.

use kitbom_products::DEFAULT_MAX_DEPTH;

/// Environment variable bounding BOM traversal depth.
pub const MAX_DEPTH_VAR: &str = "KITBOM_MAX_BOM_DEPTH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deepest BOM level (below the root) a traversal may reach.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a closure instead of
    /// touching the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => tracing::warn!(
                    value = %raw,
                    default = config.max_depth,
                    "{MAX_DEPTH_VAR} must be a positive integer; using default"
                ),
            }
        }
        config
    }
}
