//! Opaque identifiers for items and projects.
//!
//! The engine never interprets id contents — the host allocates them
//! (UUIDs, short ids, whatever the persistence layer uses) and the engine
//! treats them as atoms for hashing and equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier of a work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identifier of the owning project aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemId, ProjectId};

    #[test]
    fn ids_serialize_transparently() {
        let id = ItemId::new("it-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"it-123\"");

        let back: ItemId = serde_json::from_str("\"it-123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_matches_inner() {
        assert_eq!(ItemId::from("a").to_string(), "a");
        assert_eq!(ProjectId::from("p").to_string(), "p");
    }
}
