//! Agent name normalization.
//!
//! Vendor and agent equality is always decided on the normalized key;
//! the raw spelling is kept alongside it for display.

/// Comparison key for an agent name: trimmed, then upper-cased.
pub fn normalize_agent(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Returns true when the value is absent or only whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// An agent name with its comparison key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentName {
    pub key: String,
    pub raw: String,
}

impl AgentName {
    pub fn new(raw: &str) -> Self {
        Self {
            key: normalize_agent(raw),
            raw: raw.to_string(),
        }
    }

    /// Same agent as `other`, ignoring surrounding whitespace and case.
    pub fn matches(&self, other: &str) -> bool {
        self.key == normalize_agent(other)
    }
}
