//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Done:   green   (completed items, successful actions)
//!   - Active:         yellow  (in_progress, P1 priority)
//!   - Error/Blocked:  red     (cycles, P0 priority, hard blockers)
//!   - Reference:      cyan    (item and edge ids)
//!   - Muted:          dimmed  (field labels, connectors, cancelled items)
//!   - Emphasis:       bold    (section headers, P0)

use crate::domain::{EdgeType, ItemStatus};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply color to status text based on item status.
pub(crate) fn colorize_status(status: ItemStatus, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        ItemStatus::Planned => text.white().to_string(),
        ItemStatus::InProgress => text.yellow().to_string(),
        ItemStatus::Completed => text.green().to_string(),
        ItemStatus::Cancelled => text.dimmed().to_string(),
    }
}

/// Apply color to priority text based on priority level.
pub(crate) fn colorize_priority(priority: u8, config: &OutputConfig) -> String {
    let text = format!("P{priority}");
    if !config.use_colors {
        return text;
    }
    match priority {
        0 => text.red().bold().to_string(),
        1 => text.yellow().to_string(),
        _ => text,
    }
}

/// Colorize an item or edge id (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Edge type in parentheses; blocking types in red, the rest dimmed.
pub(crate) fn colorize_edge_type(edge_type: EdgeType, config: &OutputConfig) -> String {
    let text = format!("({edge_type})");
    if !config.use_colors {
        return text;
    }
    if edge_type.is_blocking() {
        text.red().to_string()
    } else {
        text.dimmed().to_string()
    }
}

/// Get a colored status icon, with ASCII fallback support.
pub(crate) fn colored_status_icon(status: ItemStatus, config: &OutputConfig) -> String {
    let icon = if config.use_ascii {
        match status {
            ItemStatus::Planned => "o",
            ItemStatus::InProgress => ">",
            ItemStatus::Completed => "+",
            ItemStatus::Cancelled => "-",
        }
    } else {
        match status {
            ItemStatus::Planned => "○",
            ItemStatus::InProgress => "▶",
            ItemStatus::Completed => "✓",
            ItemStatus::Cancelled => "⊘",
        }
    };

    if !config.use_colors {
        return icon.to_string();
    }

    match status {
        ItemStatus::Planned => icon.white().to_string(),
        ItemStatus::InProgress => icon.yellow().to_string(),
        ItemStatus::Completed => icon.green().to_string(),
        ItemStatus::Cancelled => icon.dimmed().to_string(),
    }
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Apply cyan color to text (for arrows/connectors).
pub(crate) fn cyan(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Apply yellow color to text (for arrows/connectors).
pub(crate) fn yellow(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}
