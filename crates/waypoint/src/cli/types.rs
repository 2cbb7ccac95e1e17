//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::{EdgeType, ItemStatus};

/// Item status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatusArg {
    /// Not started
    Planned,
    /// Currently being worked on
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Done
    Completed,
    /// Dropped from the roadmap
    Cancelled,
}

impl std::fmt::Display for ItemStatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ItemStatus::from(*self).fmt(f)
    }
}

/// Edge type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTypeArg {
    /// Target must finish before source can start
    Blocks,
    /// Source needs target (blocking)
    Requires,
    /// Informational link
    Related,
    /// Hierarchical: source is a child of target
    #[value(name = "parent-child")]
    ParentChild,
}

impl std::fmt::Display for EdgeTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        EdgeType::from(*self).fmt(f)
    }
}

impl From<ItemStatusArg> for ItemStatus {
    fn from(arg: ItemStatusArg) -> Self {
        match arg {
            ItemStatusArg::Planned => ItemStatus::Planned,
            ItemStatusArg::InProgress => ItemStatus::InProgress,
            ItemStatusArg::Completed => ItemStatus::Completed,
            ItemStatusArg::Cancelled => ItemStatus::Cancelled,
        }
    }
}

impl From<EdgeTypeArg> for EdgeType {
    fn from(arg: EdgeTypeArg) -> Self {
        match arg {
            EdgeTypeArg::Blocks => EdgeType::Blocks,
            EdgeTypeArg::Requires => EdgeType::Requires,
            EdgeTypeArg::Related => EdgeType::Related,
            EdgeTypeArg::ParentChild => EdgeType::ParentChild,
        }
    }
}
