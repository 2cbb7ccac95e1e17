//! Output formatting for CLI commands.
//!
//! Every printer comes in two shapes: human-readable text and pretty JSON
//! for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)
//! - [`tree`]: Dependency tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::domain::{DependencyEdge, Item, ItemId};
use crate::graph::{BlockedItem, BranchEffort};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};
pub use tree::DepTreeNode;

use color::{
    bold, colored_status_icon, colorize_edge_type, colorize_id, colorize_priority,
    colorize_status, cyan, dimmed, yellow,
};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Settings that control text rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` from environment variables.
    ///
    /// Reads:
    /// - `WAYPOINT_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `WAYPOINT_ASCII`: "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var, any value disables colors
    /// - `WAYPOINT_COLOR`: "0" or "false" disables colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("WAYPOINT_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "WAYPOINT_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("WAYPOINT_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "WAYPOINT_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("WAYPOINT_COLOR")
                .is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

fn get_terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| usize::from(w.0))
}

/// Run `text` or emit `value` as JSON on a locked stdout.
fn dispatch<T, F>(mode: OutputMode, value: &T, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'static>, &OutputConfig) -> io::Result<()>,
{
    let mut handle = io::stdout().lock();
    match mode {
        OutputMode::Text => text(&mut handle, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, value),
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{msg}")
}

/// Print a single item summary
pub fn print_item(item: &Item, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, item, |w, config| write_item_line(w, item, config))
}

/// Print a list of items
pub fn print_items(items: &[Item], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, items, |w, config| write_items(w, items, "item", config))
}

/// Print an item with full details (for `item show`)
pub fn print_item_details(
    item: &Item,
    deps: &[DependencyEdge],
    dependents: &[DependencyEdge],
    mode: OutputMode,
) -> io::Result<()> {
    #[derive(Serialize)]
    struct Details<'a> {
        #[serde(flatten)]
        item: &'a Item,
        dependencies: &'a [DependencyEdge],
        dependents: &'a [DependencyEdge],
    }

    let value = Details {
        item,
        dependencies: deps,
        dependents,
    };
    dispatch(mode, &value, |w, config| {
        write_item_details(w, item, deps, dependents, config)
    })
}

/// Print edges (for `dep list`). `reverse` lists sources instead of targets.
pub fn print_edges(edges: &[DependencyEdge], reverse: bool, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, edges, |w, config| write_edges(w, edges, reverse, config))
}

/// Print blocked items with their blockers
pub fn print_blocked(blocked: &[BlockedItem], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, blocked, |w, config| write_blocked(w, blocked, config))
}

/// Print cycles found in the graph
pub fn print_cycles(cycles: &[Vec<ItemId>], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, cycles, |w, config| write_cycles(w, cycles, config))
}

/// Print items in planning order
pub fn print_plan(items: &[Item], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, items, |w, config| write_plan(w, items, config))
}

/// Print open effort per branch
pub fn print_branch_effort(efforts: &[BranchEffort], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, efforts, |w, config| write_branch_effort(w, efforts, config))
}

/// Print a dependency tree followed by the root's dependents
pub fn print_dep_tree(
    root: &DepTreeNode,
    dependents: &[DependencyEdge],
    mode: OutputMode,
) -> io::Result<()> {
    let json = tree::dep_tree_json(root, dependents);
    dispatch(mode, &json, |w, config| {
        tree::write_dep_tree(w, root, config)?;
        tree::write_dependents(w, dependents, config)
    })
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_item_line<W: Write>(w: &mut W, item: &Item, config: &OutputConfig) -> io::Result<()> {
    write!(
        w,
        "{} {}  {}  {}",
        colored_status_icon(item.status, config),
        colorize_id(item.id.as_str(), config),
        colorize_priority(item.priority, config),
        item.title
    )?;
    if let Some(branch) = &item.branch {
        write!(w, "  {}", dimmed(&format!("[{branch}]"), config))?;
    }
    writeln!(w)
}

fn write_items<W: Write>(
    w: &mut W,
    items: &[Item],
    noun: &str,
    config: &OutputConfig,
) -> io::Result<()> {
    if items.is_empty() {
        writeln!(w, "No {noun}s found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} {noun}(s):", items.len())?;
    writeln!(w)?;
    for item in items {
        write_item_line(w, item, config)?;
    }
    Ok(())
}

fn write_optional_field<W: Write>(
    w: &mut W,
    label: &str,
    value: Option<String>,
    config: &OutputConfig,
) -> io::Result<()> {
    if let Some(value) = value {
        writeln!(w, "{} {}", dimmed(label, config), value)?;
    }
    Ok(())
}

fn write_item_details<W: Write>(
    w: &mut W,
    item: &Item,
    deps: &[DependencyEdge],
    dependents: &[DependencyEdge],
    config: &OutputConfig,
) -> io::Result<()> {
    let content_width = get_terminal_width().min(config.max_width);

    writeln!(
        w,
        "{} {}: {}",
        colored_status_icon(item.status, config),
        colorize_id(item.id.as_str(), config),
        item.title
    )?;
    writeln!(
        w,
        "{}  {}    {}  {}",
        dimmed("Status:", config),
        colorize_status(item.status, config),
        dimmed("Priority:", config),
        colorize_priority(item.priority, config)
    )?;

    write_optional_field(w, "Branch:", item.branch.clone(), config)?;
    write_optional_field(w, "Milestone:", item.milestone.clone(), config)?;
    write_optional_field(w, "Owner:", item.owner.clone(), config)?;
    write_optional_field(w, "Effort:", item.effort_days.map(|d| format!("{d}d")), config)?;

    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Created:", config),
        item.created_at.format("%Y-%m-%d %H:%M"),
        dimmed("Updated:", config),
        item.updated_at.format("%Y-%m-%d %H:%M")
    )?;
    write_optional_field(
        w,
        "Completed:",
        item.completed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        config,
    )?;

    if !item.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Description", config))?;
        for line in wrap_text(&item.description, content_width.saturating_sub(2)) {
            writeln!(w, "  {line}")?;
        }
    }

    if !deps.is_empty() {
        writeln!(w)?;
        writeln!(w, "{} ({}):", bold("Depends on", config), deps.len())?;
        for edge in deps {
            writeln!(
                w,
                "  {} {} {}  {}",
                cyan("→", config),
                colorize_id(edge.target_id.as_str(), config),
                colorize_edge_type(edge.edge_type, config),
                dimmed(edge.id.as_str(), config)
            )?;
        }
    }

    if !dependents.is_empty() {
        writeln!(w)?;
        writeln!(w, "{} ({}):", bold("Depended on by", config), dependents.len())?;
        for edge in dependents {
            writeln!(
                w,
                "  {} {} {}  {}",
                yellow("←", config),
                colorize_id(edge.source_id.as_str(), config),
                colorize_edge_type(edge.edge_type, config),
                dimmed(edge.id.as_str(), config)
            )?;
        }
    }

    Ok(())
}

fn write_edges<W: Write>(
    w: &mut W,
    edges: &[DependencyEdge],
    reverse: bool,
    config: &OutputConfig,
) -> io::Result<()> {
    if edges.is_empty() {
        writeln!(w, "No dependencies found.")?;
        return Ok(());
    }

    for edge in edges {
        let (arrow, other) = if reverse {
            (yellow("←", config), &edge.source_id)
        } else {
            (cyan("→", config), &edge.target_id)
        };
        writeln!(
            w,
            "{}  {} {} {}",
            dimmed(edge.id.as_str(), config),
            arrow,
            colorize_id(other.as_str(), config),
            colorize_edge_type(edge.edge_type, config)
        )?;
    }
    Ok(())
}

fn write_blocked<W: Write>(
    w: &mut W,
    blocked: &[BlockedItem],
    config: &OutputConfig,
) -> io::Result<()> {
    if blocked.is_empty() {
        writeln!(w, "No blocked items found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} blocked item(s):", blocked.len())?;
    writeln!(w)?;

    for entry in blocked {
        write_item_line(w, &entry.item, config)?;
        let blockers: Vec<String> = entry
            .blocked_by
            .iter()
            .map(|b| {
                format!(
                    "{} ({})",
                    colorize_id(b.id.as_str(), config),
                    colorize_status(b.status, config)
                )
            })
            .collect();
        writeln!(w, "  {} {}", dimmed("Blocked by:", config), blockers.join(", "))?;
    }

    Ok(())
}

fn write_cycles<W: Write>(
    w: &mut W,
    cycles: &[Vec<ItemId>],
    config: &OutputConfig,
) -> io::Result<()> {
    if cycles.is_empty() {
        writeln!(w, "{}", success("No cycles found.", config))?;
        return Ok(());
    }

    writeln!(w, "{}", error(&format!("Found {} cycle(s):", cycles.len()), config))?;
    let arrow = if config.use_ascii { " -> " } else { " → " };
    for cycle in cycles {
        let mut path: Vec<String> = cycle
            .iter()
            .map(|id| colorize_id(id.as_str(), config))
            .collect();
        if let Some(first) = cycle.first() {
            path.push(colorize_id(first.as_str(), config));
        }
        writeln!(w, "  {}", path.join(arrow))?;
    }
    Ok(())
}

fn write_plan<W: Write>(w: &mut W, items: &[Item], config: &OutputConfig) -> io::Result<()> {
    if items.is_empty() {
        writeln!(w, "Nothing to plan.")?;
        return Ok(());
    }

    let width = items.len().to_string().len();
    for (step, item) in items.iter().enumerate() {
        write!(w, "{:>width$}. ", step + 1)?;
        write_item_line(w, item, config)?;
    }
    Ok(())
}

fn write_branch_effort<W: Write>(
    w: &mut W,
    efforts: &[BranchEffort],
    config: &OutputConfig,
) -> io::Result<()> {
    if efforts.is_empty() {
        writeln!(w, "No open items.")?;
        return Ok(());
    }

    writeln!(w, "{}", bold("Open effort by branch:", config))?;
    for effort in efforts {
        let branch = effort.branch.as_deref().unwrap_or("(no branch)");
        write!(
            w,
            "  {branch:<20} {:>4}d  {} item(s)",
            effort.effort_days, effort.open_items
        )?;
        if effort.unestimated > 0 {
            write!(
                w,
                "  {}",
                warning(&format!("{} unestimated", effort.unestimated), config)
            )?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Wrap text to fit within a given width, preserving existing line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}
