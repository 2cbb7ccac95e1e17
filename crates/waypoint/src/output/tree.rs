//! Dependency tree rendering for `waypoint dep tree` output.

use std::collections::HashMap;
use std::io::{self, Write};

use colored::Colorize;

use super::color::{
    bold, colored_status_icon, colorize_edge_type, colorize_id, colorize_priority, dimmed,
};
use super::OutputConfig;
use crate::domain::{DependencyEdge, EdgeType, Item, ItemId, ItemStatus};

/// A node in a dependency tree for rendering purposes.
#[derive(Debug, Clone)]
pub struct DepTreeNode {
    /// Item ID of this node.
    pub id: ItemId,
    /// Edge type linking the parent to this node (`None` for the root).
    pub edge_type: Option<EdgeType>,
    /// Item status, when the item is known.
    pub status: Option<ItemStatus>,
    /// Item title, when the item is known.
    pub title: Option<String>,
    /// Item priority, when the item is known.
    pub priority: Option<u8>,
    /// Items this node depends on.
    pub children: Vec<DepTreeNode>,
}

impl DepTreeNode {
    /// Assemble a tree from the flat `(edge, depth)` list produced by
    /// `DependencyManager::dependency_tree`.
    ///
    /// Every edge's target appears once in that list, so grouping edges by
    /// source reconstructs a proper tree.
    pub fn build(
        root: &Item,
        edges: &[(DependencyEdge, usize)],
        items: &HashMap<ItemId, Item>,
    ) -> Self {
        let mut by_source: HashMap<&ItemId, Vec<&DependencyEdge>> = HashMap::new();
        for (edge, _) in edges {
            by_source.entry(&edge.source_id).or_default().push(edge);
        }

        let mut node = Self::leaf(&root.id, None, Some(root));
        node.children = Self::children_of(&root.id, &by_source, items);
        node
    }

    fn children_of(
        id: &ItemId,
        by_source: &HashMap<&ItemId, Vec<&DependencyEdge>>,
        items: &HashMap<ItemId, Item>,
    ) -> Vec<Self> {
        let Some(edges) = by_source.get(id) else {
            return Vec::new();
        };
        edges
            .iter()
            .map(|edge| {
                let mut child =
                    Self::leaf(&edge.target_id, Some(edge.edge_type), items.get(&edge.target_id));
                child.children = Self::children_of(&edge.target_id, by_source, items);
                child
            })
            .collect()
    }

    fn leaf(id: &ItemId, edge_type: Option<EdgeType>, item: Option<&Item>) -> Self {
        Self {
            id: id.clone(),
            edge_type,
            status: item.map(|i| i.status),
            title: item.map(|i| i.title.clone()),
            priority: item.map(|i| i.priority),
            children: Vec::new(),
        }
    }

    /// Convert the tree to a JSON value for programmatic output.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "id": self.id,
        });

        if let Some(edge_type) = self.edge_type {
            obj["type"] = serde_json::json!(edge_type);
        }
        if let Some(title) = &self.title {
            obj["title"] = serde_json::json!(title);
        }
        if let Some(p) = self.priority {
            obj["priority"] = serde_json::json!(p);
        }
        if let Some(s) = self.status {
            obj["status"] = serde_json::json!(s);
        }
        obj["dependencies"] =
            serde_json::json!(self.children.iter().map(Self::to_json).collect::<Vec<_>>());

        obj
    }
}

/// JSON for `dep tree`: the tree plus the items depending on the root.
pub fn dep_tree_json(root: &DepTreeNode, dependents: &[DependencyEdge]) -> serde_json::Value {
    let mut json = root.to_json();
    json["dependents"] = serde_json::json!(dependents
        .iter()
        .map(|edge| {
            serde_json::json!({
                "id": edge.source_id,
                "edge_id": edge.id,
                "type": edge.edge_type,
            })
        })
        .collect::<Vec<_>>());
    json
}

/// Render the dependency tree with box-drawing (or ASCII) connectors.
///
/// ```text
/// ◆ road-a3f8 [P1] Launch beta
/// ├── road-b1c2 (blocks) ✓
/// │   └── road-d4e5 (requires) ○
/// └── road-f6a7 (related) ▶
/// ```
pub fn write_dep_tree<W: Write>(
    w: &mut W,
    root: &DepTreeNode,
    config: &OutputConfig,
) -> io::Result<()> {
    let root_icon = if config.use_ascii { "*" } else { "◆" };
    let root_icon_str = if config.use_colors {
        root_icon.cyan().bold().to_string()
    } else {
        root_icon.to_string()
    };

    let priority_str = root
        .priority
        .map(|p| format!(" [{}]", colorize_priority(p, config)))
        .unwrap_or_default();
    let title_str = root
        .title
        .as_deref()
        .map(|t| format!(" {t}"))
        .unwrap_or_default();

    writeln!(
        w,
        "{} {}{}{}",
        root_icon_str,
        colorize_id(root.id.as_str(), config),
        priority_str,
        title_str
    )?;

    write_children(w, &root.children, &[], config)
}

/// `prefix_segments` holds, per ancestor level, whether siblings follow below.
fn write_children<W: Write>(
    w: &mut W,
    children: &[DepTreeNode],
    prefix_segments: &[bool],
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    let prefix: String = prefix_segments
        .iter()
        .map(|&has_more| dimmed(if has_more { pipe } else { space }, config))
        .collect();

    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();
        let connector = dimmed(if is_last { corner } else { branch }, config);

        let edge_str = child
            .edge_type
            .map(|t| format!(" {}", colorize_edge_type(t, config)))
            .unwrap_or_default();
        let status_str = match child.status {
            Some(s) => format!(" {}", colored_status_icon(s, config)),
            None => format!(" {}", dimmed("(missing)", config)),
        };

        writeln!(
            w,
            "{}{}{}{}{}",
            prefix,
            connector,
            colorize_id(child.id.as_str(), config),
            edge_str,
            status_str
        )?;

        if !child.children.is_empty() {
            let mut next_segments = prefix_segments.to_vec();
            next_segments.push(!is_last);
            write_children(w, &child.children, &next_segments, config)?;
        }
    }

    Ok(())
}

/// Print the "Depended on by" section under a tree.
pub fn write_dependents<W: Write>(
    w: &mut W,
    dependents: &[DependencyEdge],
    config: &OutputConfig,
) -> io::Result<()> {
    if dependents.is_empty() {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "{} ({}):", bold("Depended on by", config), dependents.len())?;

    let corner = dimmed(if config.use_ascii { "`-- " } else { "└── " }, config);
    for edge in dependents {
        writeln!(
            w,
            "  {}{} {}",
            corner,
            colorize_id(edge.source_id.as_str(), config),
            colorize_edge_type(edge.edge_type, config)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EdgeId;
    use chrono::Utc;

    fn item(id: &str, status: ItemStatus) -> Item {
        let now = Utc::now();
        Item {
            id: ItemId::new(id),
            title: format!("Item {id}"),
            description: String::new(),
            status,
            priority: 2,
            branch: None,
            milestone: None,
            owner: None,
            effort_days: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn edge(n: u32, source: &str, target: &str, edge_type: EdgeType) -> DependencyEdge {
        DependencyEdge {
            id: EdgeId::new(format!("edge-{n}")),
            source_id: ItemId::new(source),
            target_id: ItemId::new(target),
            edge_type,
            created_at: Utc::now(),
        }
    }

    fn render(root: &DepTreeNode, config: &OutputConfig) -> String {
        let mut buffer = Vec::new();
        write_dep_tree(&mut buffer, root, config).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    /// root -> a -> c, root -> b
    fn sample_tree() -> DepTreeNode {
        let root = item("root", ItemStatus::Planned);
        let items: HashMap<ItemId, Item> = [
            item("a", ItemStatus::Completed),
            item("b", ItemStatus::InProgress),
            item("c", ItemStatus::Planned),
        ]
        .into_iter()
        .map(|i| (i.id.clone(), i))
        .collect();
        let edges = vec![
            (edge(1, "root", "a", EdgeType::Blocks), 1),
            (edge(2, "root", "b", EdgeType::Related), 1),
            (edge(3, "a", "c", EdgeType::Requires), 2),
        ];
        DepTreeNode::build(&root, &edges, &items)
    }

    #[test]
    fn test_build_nests_by_source() {
        let tree = sample_tree();

        assert_eq!(tree.id.as_str(), "root");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].id.as_str(), "a");
        assert_eq!(tree.children[0].children[0].id.as_str(), "c");
        assert_eq!(tree.children[0].children[0].edge_type, Some(EdgeType::Requires));
        assert!(tree.children[1].children.is_empty());
    }

    #[test]
    fn test_build_marks_unknown_targets() {
        let root = item("root", ItemStatus::Planned);
        let edges = vec![(edge(1, "root", "ghost", EdgeType::Blocks), 1)];

        let tree = DepTreeNode::build(&root, &edges, &HashMap::new());

        assert_eq!(tree.children[0].status, None);
        let output = render(&tree, &OutputConfig::new(80, false, false));
        assert!(output.contains("ghost (blocks) (missing)"), "got: {output}");
    }

    #[test]
    fn test_tree_root_line() {
        let output = render(&sample_tree(), &OutputConfig::new(80, false, false));
        let first = output.lines().next().unwrap();
        assert_eq!(first, "◆ root [P2] Item root");
    }

    #[test]
    fn test_tree_connectors_unicode() {
        let output = render(&sample_tree(), &OutputConfig::new(80, false, false));

        assert!(output.contains("├── a (blocks) ✓"), "got:\n{output}");
        assert!(output.contains("│   └── c (requires) ○"), "got:\n{output}");
        assert!(output.contains("└── b (related) ▶"), "got:\n{output}");
    }

    #[test]
    fn test_tree_connectors_ascii() {
        let output = render(&sample_tree(), &OutputConfig::new(80, true, false));

        assert!(output.starts_with("* root"));
        assert!(output.contains("|-- a (blocks) +"), "got:\n{output}");
        assert!(output.contains("|   `-- c (requires) o"), "got:\n{output}");
        assert!(output.contains("`-- b (related) >"), "got:\n{output}");
    }

    #[test]
    fn test_tree_json_structure() {
        let json = dep_tree_json(
            &sample_tree(),
            &[edge(9, "child", "root", EdgeType::ParentChild)],
        );

        assert_eq!(json["id"], "root");
        assert_eq!(json["priority"], 2);
        let deps = json["dependencies"].as_array().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0]["type"], "blocks");
        assert_eq!(deps[0]["status"], "completed");
        assert_eq!(deps[0]["dependencies"][0]["id"], "c");

        let dependents = json["dependents"].as_array().unwrap();
        assert_eq!(dependents[0]["id"], "child");
        assert_eq!(dependents[0]["type"], "parent-child");
    }

    #[test]
    fn test_dependents_section() {
        let config = OutputConfig::new(80, false, false);
        let dependents = vec![
            edge(1, "x", "root", EdgeType::Blocks),
            edge(2, "y", "root", EdgeType::Related),
        ];
        let mut buffer = Vec::new();

        write_dependents(&mut buffer, &dependents, &config).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Depended on by (2):"));
        assert!(output.contains("└── x (blocks)"));
        assert!(output.contains("└── y (related)"));
    }

    #[test]
    fn test_dependents_section_empty() {
        let mut buffer = Vec::new();
        write_dependents(&mut buffer, &[], &OutputConfig::new(80, false, false)).unwrap();
        assert!(buffer.is_empty());
    }
}
