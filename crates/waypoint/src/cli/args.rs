//! CLI argument structs for all commands.

use clap::{Parser, Subcommand};

use super::types::{EdgeTypeArg, ItemStatusArg};
use super::validators::{
    validate_description, validate_edge_id, validate_item_id, validate_label, validate_prefix,
    validate_title,
};
use crate::domain::{ItemFilter, MAX_PRIORITY, MIN_PRIORITY};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Item ID prefix (e.g., "road" for "road-a3f8")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone, Default)]
pub struct InfoArgs {}

/// Arguments for the `item` command
#[derive(Parser, Debug, Clone)]
pub struct ItemArgs {
    /// Item subcommand
    #[command(subcommand)]
    pub action: ItemAction,
}

/// Filters shared by listing commands
#[derive(Parser, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Filter by branch
    #[arg(short, long, value_parser = validate_label)]
    pub branch: Option<String>,

    /// Filter by milestone
    #[arg(short, long, value_parser = validate_label)]
    pub milestone: Option<String>,

    /// Filter by owner
    #[arg(short, long, value_parser = validate_label)]
    pub owner: Option<String>,

    /// Filter by priority
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)))]
    pub priority: Option<u8>,
}

impl FilterArgs {
    /// Build an [`ItemFilter`] from these flags.
    pub fn to_filter(&self, limit: Option<usize>) -> ItemFilter {
        ItemFilter {
            status: None,
            priority: self.priority,
            branch: self.branch.clone(),
            milestone: self.milestone.clone(),
            owner: self.owner.clone(),
            limit,
        }
    }
}

/// Item management actions
#[derive(Subcommand, Debug, Clone)]
pub enum ItemAction {
    /// Create a new roadmap item
    Create {
        /// Item title (maximum 200 characters)
        #[arg(value_parser = validate_title)]
        title: String,

        /// Detailed description
        #[arg(short = 'D', long, value_parser = validate_description)]
        description: Option<String>,

        /// Priority level (0=critical, 1=high, 2=medium, 3=low, 4=backlog)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)), default_value = "2")]
        priority: u8,

        /// Roadmap branch
        #[arg(short, long, value_parser = validate_label)]
        branch: Option<String>,

        /// Milestone
        #[arg(short, long, value_parser = validate_label)]
        milestone: Option<String>,

        /// Owner
        #[arg(short, long, value_parser = validate_label)]
        owner: Option<String>,

        /// Effort estimate in person-days
        #[arg(short, long)]
        effort: Option<u32>,
    },

    /// List items with optional filters
    List {
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<ItemStatusArg>,

        /// Common filters
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of items to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Show an item with its dependencies and dependents
    Show {
        /// Item ID
        #[arg(value_parser = validate_item_id)]
        item_id: String,
    },

    /// Update fields of an item
    ///
    /// Only provided fields change. Use the `--no-*` flags to clear optional fields.
    Update {
        /// Item ID
        #[arg(value_parser = validate_item_id)]
        item_id: String,

        /// New title
        #[arg(long, value_parser = validate_title)]
        title: Option<String>,

        /// New description
        #[arg(short = 'D', long, value_parser = validate_description)]
        description: Option<String>,

        /// New status
        #[arg(short, long, value_enum)]
        status: Option<ItemStatusArg>,

        /// New priority
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)))]
        priority: Option<u8>,

        /// New branch
        #[arg(short, long, value_parser = validate_label, conflicts_with = "no_branch")]
        branch: Option<String>,

        /// Clear the branch
        #[arg(long)]
        no_branch: bool,

        /// New milestone
        #[arg(short, long, value_parser = validate_label, conflicts_with = "no_milestone")]
        milestone: Option<String>,

        /// Clear the milestone
        #[arg(long)]
        no_milestone: bool,

        /// New owner
        #[arg(short, long, value_parser = validate_label, conflicts_with = "no_owner")]
        owner: Option<String>,

        /// Clear the owner
        #[arg(long)]
        no_owner: bool,

        /// New effort estimate in person-days
        #[arg(short, long, conflicts_with = "no_effort")]
        effort: Option<u32>,

        /// Clear the effort estimate
        #[arg(long)]
        no_effort: bool,
    },

    /// Delete an item and every dependency touching it
    Delete {
        /// Item ID
        #[arg(value_parser = validate_item_id)]
        item_id: String,
    },
}

/// Arguments for the `dep` command
#[derive(Parser, Debug, Clone)]
pub struct DepArgs {
    /// Dependency subcommand
    #[command(subcommand)]
    pub action: DepAction,
}

/// Dependency management actions
#[derive(Subcommand, Debug, Clone)]
pub enum DepAction {
    /// Add a dependency: FROM depends on TO
    Add {
        /// Dependent item
        #[arg(value_parser = validate_item_id)]
        from: String,

        /// Item depended upon
        #[arg(value_parser = validate_item_id)]
        to: String,

        /// Edge type
        #[arg(short = 't', long = "type", value_enum, default_value = "blocks")]
        edge_type: EdgeTypeArg,
    },

    /// Remove a dependency by its ID
    Remove {
        /// Dependency ID
        #[arg(value_parser = validate_edge_id)]
        edge_id: String,
    },

    /// Change the type of a dependency
    Type {
        /// Dependency ID
        #[arg(value_parser = validate_edge_id)]
        edge_id: String,

        /// New edge type
        #[arg(value_enum)]
        edge_type: EdgeTypeArg,
    },

    /// List the dependencies of an item
    List {
        /// Item ID
        #[arg(value_parser = validate_item_id)]
        item_id: String,

        /// List dependents (items depending on this one) instead
        #[arg(short, long)]
        reverse: bool,

        /// Only edges of this type
        #[arg(short = 't', long = "type", value_enum)]
        edge_type: Option<EdgeTypeArg>,
    },

    /// Show everything an item depends on, transitively
    Tree {
        /// Item ID
        #[arg(value_parser = validate_item_id)]
        item_id: String,

        /// Maximum depth to walk
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Check whether adding FROM -> TO would create a cycle
    Check {
        /// Dependent item
        #[arg(value_parser = validate_item_id)]
        from: String,

        /// Item depended upon
        #[arg(value_parser = validate_item_id)]
        to: String,
    },

    /// Report cycles reachable from an item, or from every item
    Cycles {
        /// Item ID (all items when omitted)
        #[arg(value_parser = validate_item_id)]
        item_id: Option<String>,
    },
}

/// Arguments for the `ready` command
#[derive(Parser, Debug, Clone)]
pub struct ReadyArgs {
    /// Common filters
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum number of items to display
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for the `blocked` command
#[derive(Parser, Debug, Clone, Default)]
pub struct BlockedArgs {
    /// Only items on this branch
    #[arg(short, long, value_parser = validate_label)]
    pub branch: Option<String>,
}

/// Arguments for the `plan` command
#[derive(Parser, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Only items on this branch (order stays global)
    #[arg(short, long, value_parser = validate_label)]
    pub branch: Option<String>,

    /// Include completed and cancelled items
    #[arg(short, long)]
    pub all: bool,
}
