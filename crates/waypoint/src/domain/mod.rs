//! Domain types for roadmap planning.
//!
//! Items are the nodes of the roadmap; [`DependencyEdge`]s are directed
//! "source depends on target" relations between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of an item title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of an item description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Highest priority value (most urgent).
pub const MIN_PRIORITY: u8 = 0;

/// Lowest priority value (backlog).
pub const MAX_PRIORITY: u8 = 4;

/// Unique identifier for a roadmap item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A roadmap item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier for the item
    pub id: ItemId,

    /// Short title
    pub title: String,

    /// Longer description
    #[serde(default)]
    pub description: String,

    /// Current status
    pub status: ItemStatus,

    /// Priority level (0 = highest, 4 = lowest)
    pub priority: u8,

    /// Roadmap branch (track) the item belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Milestone the item is scheduled for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,

    /// Person or team the item is allocated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Estimated effort in person-days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_days: Option<u32>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Completion timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Validate the item's user-supplied fields.
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(&self.title, &self.description, self.priority)
    }

    /// Returns `true` once the item no longer needs work.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Status of a roadmap item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Accepted onto the roadmap, not started
    Planned,

    /// Work has started
    InProgress,

    /// Delivered
    Completed,

    /// Dropped from the roadmap
    Cancelled,
}

impl ItemStatus {
    /// Completed and cancelled items no longer block anything.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Descriptive classification of a dependency edge.
///
/// Every type participates in cycle detection; the type only changes how
/// planning queries read the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    /// Hard blocker: the source cannot start until the target is done
    #[default]
    Blocks,

    /// The source needs the target's output
    Requires,

    /// Informational link
    Related,

    /// Hierarchical link from a child item to its parent
    ParentChild,
}

impl EdgeType {
    /// Returns `true` if an open target keeps the source from being ready.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Blocks | Self::Requires)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocks => write!(f, "blocks"),
            Self::Requires => write!(f, "requires"),
            Self::Related => write!(f, "related"),
            Self::ParentChild => write!(f, "parent-child"),
        }
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocks" => Ok(Self::Blocks),
            "requires" => Ok(Self::Requires),
            "related" => Ok(Self::Related),
            "parent-child" | "parent_child" => Ok(Self::ParentChild),
            other => Err(format!(
                "Unknown dependency type '{other}'. Expected blocks, requires, related, or parent-child"
            )),
        }
    }
}

/// Directed dependency between two items: `source_id` depends on `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Unique identifier, assigned by the store
    pub id: EdgeId,

    /// The dependent item
    pub source_id: ItemId,

    /// The item depended upon
    pub target_id: ItemId,

    /// Descriptive classification
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a new edge; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDependency {
    /// The dependent item
    pub source_id: ItemId,

    /// The item depended upon
    pub target_id: ItemId,

    /// Descriptive classification
    pub edge_type: EdgeType,
}

/// Data for creating a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Item title
    pub title: String,

    /// Item description
    pub description: String,

    /// Priority level (0-4)
    pub priority: u8,

    /// Roadmap branch
    pub branch: Option<String>,

    /// Milestone
    pub milestone: Option<String>,

    /// Owner
    pub owner: Option<String>,

    /// Effort estimate in person-days
    pub effort_days: Option<u32>,
}

impl NewItem {
    /// Create a planned item with default priority and no metadata.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: 2,
            branch: None,
            milestone: None,
            owner: None,
            effort_days: None,
        }
    }

    /// Validate the new item data.
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(&self.title, &self.description, self.priority)
    }
}

/// Data for updating an existing item
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<ItemStatus>,

    /// New priority
    pub priority: Option<u8>,

    /// New branch (`Some(None)` clears it)
    pub branch: Option<Option<String>>,

    /// New milestone (`Some(None)` clears it)
    pub milestone: Option<Option<String>>,

    /// New owner (`Some(None)` clears it)
    pub owner: Option<Option<String>>,

    /// New effort estimate (`Some(None)` clears it)
    pub effort_days: Option<Option<u32>>,
}

/// Filter for querying items
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Filter by status
    pub status: Option<ItemStatus>,

    /// Filter by priority
    pub priority: Option<u8>,

    /// Filter by branch
    pub branch: Option<String>,

    /// Filter by milestone
    pub milestone: Option<String>,

    /// Filter by owner
    pub owner: Option<String>,

    /// Limit number of results
    pub limit: Option<usize>,
}

impl ItemFilter {
    /// Returns `true` if the item passes every set criterion (limit aside).
    pub fn matches(&self, item: &Item) -> bool {
        if self.status.is_some_and(|status| item.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| item.priority != priority) {
            return false;
        }
        if let Some(branch) = &self.branch {
            if item.branch.as_ref() != Some(branch) {
                return false;
            }
        }
        if let Some(milestone) = &self.milestone {
            if item.milestone.as_ref() != Some(milestone) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if item.owner.as_ref() != Some(owner) {
                return false;
            }
        }
        true
    }
}

/// A full copy of store contents, used for import/export and persistence.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// All items
    pub items: Vec<Item>,

    /// All dependency edges
    pub edges: Vec<DependencyEdge>,
}

/// Sort items by priority (P0 first), then oldest first, then id.
///
/// The id tiebreaker keeps output deterministic when timestamps match.
pub fn sort_by_priority(items: &mut [Item]) {
    items.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

fn validate_fields(title: &str, description: &str, priority: u8) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }
    if priority > MAX_PRIORITY {
        return Err(format!(
            "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
        ));
    }
    Ok(())
}
