//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a new waypoint repository
//! - `info`: Show repository summary
//! - `item`: Create, list, show, update or delete roadmap items
//! - `dep`: Manage dependencies and inspect the graph
//! - `ready`: Items nothing unfinished is holding back
//! - `blocked`: Items waiting on unfinished work
//! - `plan`: Every item in dependency order
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! waypoint item create "Launch beta" --priority 1 --branch platform
//! waypoint dep add road-a3f8 road-b1c2 --type requires
//! waypoint dep tree road-a3f8
//! waypoint --json plan
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    BlockedArgs, DepAction, DepArgs, FilterArgs, InfoArgs, InitArgs, ItemAction, ItemArgs,
    PlanArgs, ReadyArgs,
};
pub use types::{EdgeTypeArg, ItemStatusArg};
pub use validators::{validate_description, validate_item_id, validate_prefix, validate_title};

/// Waypoint - roadmap planning on a dependency graph
///
/// Track roadmap items and the dependencies between them. Data lives in
/// `.waypoint/roadmap.jsonl` for easy version control.
#[derive(Parser, Debug)]
#[command(name = "waypoint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new waypoint repository
    ///
    /// Creates `.waypoint/` with configuration and an empty roadmap.
    Init(InitArgs),

    /// Show repository information
    Info(InfoArgs),

    /// Manage roadmap items
    Item(ItemArgs),

    /// Manage dependencies between items
    Dep(DepArgs),

    /// Show items ready to start
    ///
    /// An item is ready when it is open and no `blocks`/`requires` target is
    /// unfinished, directly or through a blocked parent.
    Ready(ReadyArgs),

    /// Show blocked items with their blockers
    Blocked(BlockedArgs),

    /// Show open items in dependency order
    Plan(PlanArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::Item(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_item(&mut app, args, output_mode).await
            }
            Some(Commands::Dep(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_dep(&mut app, args, output_mode).await
            }
            Some(Commands::Ready(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_ready(&app, args, output_mode).await
            }
            Some(Commands::Blocked(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_blocked(&app, args, output_mode).await
            }
            Some(Commands::Plan(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_plan(&app, args, output_mode).await
            }
            None => {
                println!("Waypoint roadmap planner");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
