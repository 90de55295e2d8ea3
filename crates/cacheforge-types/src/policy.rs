//! Policy candidate types and name sanitization.

use serde::{Deserialize, Serialize};

/// Token used when a policy name sanitizes to nothing (e.g. "!!!").
pub const FALLBACK_POLICY_TOKEN: &str = "policy";

/// A generated cache-replacement policy, as recovered from a model response.
///
/// Candidates are immutable once parsed; the artifact written from `source`
/// is what gets built, evaluated, and referenced by recorded trials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCandidate {
    pub name: String,
    pub description: String,
    pub source: String,
}

impl PolicyCandidate {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            source: source.into(),
        }
    }

    /// Filesystem-safe token derived from the candidate name.
    pub fn token(&self) -> String {
        sanitize(&self.name)
    }
}

/// Convert a free-text policy name into a filesystem-safe token.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, leading and trailing
/// underscores are trimmed, and the result is lowercased. Underscore runs are
/// kept as-is so the mapping stays idempotent. A name with no alphanumeric
/// characters maps to [`FALLBACK_POLICY_TOKEN`].
///
/// # Examples
///
/// ```
/// use cacheforge_types::policy::sanitize;
///
/// assert_eq!(sanitize("Adaptive SHiP-D"), "adaptive_ship_d");
/// assert_eq!(sanitize("  RRIP (v2)  "), "rrip__v2");
/// assert_eq!(sanitize(&sanitize("Hawkeye++")), "hawkeye");
/// ```
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_POLICY_TOKEN.to_string()
    } else {
        trimmed.to_string()
    }
}
