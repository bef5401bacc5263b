//! Static provider metadata.

use serde::{Deserialize, Serialize};

/// What kind of records a provider can supply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Title metadata only (ratings, posters, synopses).
    Metadata,
    /// Resolvable links.
    Links,
    /// Both metadata and links.
    Both,
}

impl Capability {
    /// Whether the provider can ever produce links.
    pub fn supplies_links(self) -> bool {
        matches!(self, Capability::Links | Capability::Both)
    }
}

/// Name, fallback priority and capability of one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Provider name, also used as the source tag of its records.
    pub name: String,
    /// Fallback priority; lower values are probed first.
    pub priority: u32,
    pub capability: Capability,
    /// Search with the master (English) title when one is known.
    #[serde(default)]
    pub prefers_master_title: bool,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, priority: u32, capability: Capability) -> Self {
        Self {
            name: name.into(),
            priority,
            capability,
            prefers_master_title: false,
        }
    }

    pub fn with_master_title(mut self, prefers: bool) -> Self {
        self.prefers_master_title = prefers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_supplies_links() {
        assert!(!Capability::Metadata.supplies_links());
        assert!(Capability::Links.supplies_links());
        assert!(Capability::Both.supplies_links());
    }

    #[test]
    fn test_capability_serialization() {
        assert_eq!(
            serde_json::to_string(&Capability::Metadata).unwrap(),
            "\"metadata\""
        );
        assert_eq!(serde_json::to_string(&Capability::Both).unwrap(), "\"both\"");
    }
}
