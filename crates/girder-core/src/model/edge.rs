use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ids::ItemId;
use super::item::ParseEnumError;

/// The four dependency link types of a predecessor/successor relation.
///
/// Wire names are the standard two-letter scheduling codes (`FS`, `SS`,
/// `FF`, `SF`). The type (and `lag_days`) feed only the scheduling projection —
/// completion blocking is status-based regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

impl Default for DependencyType {
    fn default() -> Self {
        Self::FinishToStart
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fs" | "finish_to_start" => Ok(Self::FinishToStart),
            "ss" | "start_to_start" => Ok(Self::StartToStart),
            "ff" | "finish_to_finish" => Ok(Self::FinishToFinish),
            "sf" | "start_to_finish" => Ok(Self::StartToFinish),
            _ => Err(ParseEnumError {
                expected: "dependency type",
                got: s.to_string(),
            }),
        }
    }
}

/// A directed dependency relation: the successor is blocked by the
/// predecessor.
///
/// Edges are independent of the parent/child tree — a successor may be
/// blocked by an item in another branch or another project. The pair
/// `(predecessor_id, successor_id)` is unique within a graph; re-adding an
/// existing pair updates `dep_type` and `lag_days` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub predecessor_id: ItemId,
    pub successor_id: ItemId,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub lag_days: i64,
}
