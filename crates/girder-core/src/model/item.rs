use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ids::{ItemId, ProjectId};

/// The six lifecycle statuses.
///
/// Wire names use the human-readable forms (`"In Progress"`, `"On hold"`)
/// so serialized items stay compatible with existing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Backlog,
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On hold")]
    OnHold,
    Review,
    Done,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::OnHold => "On hold",
            Self::Review => "Review",
            Self::Done => "Done",
        }
    }

    /// Items in this status no longer block their successors.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Statuses that count as "active" when rolling a parent up from its
    /// children (`InProgress` and `Review`).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Review)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Todo
    }
}

/// Stored priority. Informational only — no engine computation reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// All persisted fields of a work item.
///
/// Top-level items and arbitrarily nested sub-items share this one
/// representation; `parent_id = None` marks a top-level item. Derived
/// attributes (WBS code, slack, criticality) are computed on demand by the
/// projection layer and never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFields {
    pub id: ItemId,
    /// Owning aggregate. Immutable after creation.
    pub project_id: ProjectId,
    pub parent_id: Option<ItemId>,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub assignee_ids: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    /// Engine-managed: set on transition into `Done`, cleared on transition
    /// out, unless the caller supplies an explicit value.
    pub completed_at: Option<DateTime<Utc>>,
    /// Deterministic sibling ordering key. Not unique; ties break on
    /// `created_at`.
    pub sort_index: i64,
    pub is_milestone: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemFields {
    /// `true` when the item is top-level within its project.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Caller-supplied fields for item creation. Everything not set here gets
/// the engine default (`Todo`, `Medium`, append-at-end sort index).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub assignee_ids: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub sort_index: Option<i64>,
    pub is_milestone: bool,
}

/// Partial update for an existing item. `None` fields are left untouched.
///
/// `completed_at` is only honored on transitions into or out of `Done`
/// (or while the stored status is `Done`) — otherwise the field is
/// engine-managed and a patch value is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub sort_index: Option<i64>,
    pub is_milestone: Option<bool>,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "backlog" => Ok(Self::Backlog),
            "todo" => Ok(Self::Todo),
            "in progress" | "in_progress" => Ok(Self::InProgress),
            "on hold" | "on_hold" => Ok(Self::OnHold),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}
