//! Whole-roadmap planning queries.
//!
//! Unlike the per-node traversals, these load one snapshot of every item and
//! edge into a petgraph graph and work on that copy.
//!
//! # Edge Direction Reminder
//!
//! - Edges point from **dependent -> dependency** (source depends on target)
//! - For `Blocks`/`Requires`: blocked_item -> blocker, so `edge.target()` is the blocker
//! - For `ParentChild`: child -> parent, so `Direction::Incoming` finds children

use crate::domain::{sort_by_priority, EdgeType, Item, ItemFilter, ItemId, Snapshot};
use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Maximum depth when pushing a blocked parent's state down to its children.
const MAX_BLOCKING_DEPTH: usize = 50;

/// An open item together with the open items it is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedItem {
    /// The blocked item
    pub item: Item,

    /// Unfinished targets of its `blocks`/`requires` edges, or the blocked
    /// parents it inherits its state from
    pub blocked_by: Vec<Item>,
}

/// Remaining effort on one roadmap branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchEffort {
    /// Branch name, `None` for items on no branch
    pub branch: Option<String>,

    /// Number of open items
    pub open_items: usize,

    /// Sum of `effort_days` over open items
    pub effort_days: u32,

    /// Open items with no estimate
    pub unestimated: usize,
}

/// Snapshot graph: one node per item, edges weighted by type.
pub(crate) struct PlanningGraph {
    graph: DiGraph<ItemId, EdgeType>,
    node_map: HashMap<ItemId, NodeIndex>,
    items: HashMap<ItemId, Item>,
}

impl PlanningGraph {
    pub(crate) fn build(snapshot: Snapshot) -> Self {
        let mut items = snapshot.items;
        sort_by_priority(&mut items);

        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        for item in &items {
            node_map.insert(item.id.clone(), graph.add_node(item.id.clone()));
        }
        for edge in snapshot.edges {
            if let (Some(&source), Some(&target)) =
                (node_map.get(&edge.source_id), node_map.get(&edge.target_id))
            {
                graph.add_edge(source, target, edge.edge_type);
            }
        }

        let items = items.into_iter().map(|item| (item.id.clone(), item)).collect();
        Self {
            graph,
            node_map,
            items,
        }
    }

    fn item(&self, node: NodeIndex) -> Option<&Item> {
        self.items.get(&self.graph[node])
    }

    /// Direct blockers of an open item: unfinished targets of blocking edges.
    fn direct_blockers(&self, item: &Item) -> Vec<Item> {
        let Some(&node) = self.node_map.get(&item.id) else {
            return Vec::new();
        };
        let mut blockers: Vec<Item> = self
            .graph
            .edges(node)
            .filter(|edge| edge.weight().is_blocking())
            .filter_map(|edge| self.item(edge.target()))
            .filter(|blocker| !blocker.is_terminal())
            .cloned()
            .collect();
        sort_by_priority(&mut blockers);
        blockers
    }

    /// Open items that can't start yet, by priority.
    ///
    /// Items blocked only through a `parent-child` edge list their blocked
    /// parents as blockers.
    pub(crate) fn blocked_items(&self) -> Vec<BlockedItem> {
        let blocked = self.blocked_set();
        let mut open: Vec<&Item> = self
            .items
            .values()
            .filter(|item| !item.is_terminal() && blocked.contains(&item.id))
            .collect();
        open.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        open.into_iter()
            .map(|item| {
                let mut blocked_by = self.direct_blockers(item);
                if blocked_by.is_empty() {
                    blocked_by = self.blocked_parents(item, &blocked);
                }
                BlockedItem {
                    item: item.clone(),
                    blocked_by,
                }
            })
            .collect()
    }

    /// Parents of `item` (targets of its `parent-child` edges) that are blocked.
    fn blocked_parents(&self, item: &Item, blocked: &HashSet<ItemId>) -> Vec<Item> {
        let Some(&node) = self.node_map.get(&item.id) else {
            return Vec::new();
        };
        let mut parents: Vec<Item> = self
            .graph
            .edges(node)
            .filter(|edge| *edge.weight() == EdgeType::ParentChild)
            .filter(|edge| blocked.contains(&self.graph[edge.target()]))
            .filter_map(|edge| self.item(edge.target()))
            .cloned()
            .collect();
        sort_by_priority(&mut parents);
        parents
    }

    /// Every item that can't start yet.
    ///
    /// 1. Directly: a `blocks`/`requires` edge to an unfinished item
    /// 2. Transitively: a `parent-child` edge to a blocked parent
    ///
    /// Propagation stops at [`MAX_BLOCKING_DEPTH`] so malformed hierarchies
    /// terminate.
    fn blocked_set(&self) -> HashSet<ItemId> {
        let mut blocked: HashSet<ItemId> = self
            .items
            .values()
            .filter(|item| !item.is_terminal() && !self.direct_blockers(item).is_empty())
            .map(|item| item.id.clone())
            .collect();

        let mut queue: VecDeque<(ItemId, usize)> =
            blocked.iter().map(|id| (id.clone(), 0)).collect();
        while let Some((id, depth)) = queue.pop_front() {
            if depth >= MAX_BLOCKING_DEPTH {
                continue;
            }
            let Some(&node) = self.node_map.get(&id) else {
                continue;
            };
            for edge in self.graph.edges_directed(node, Direction::Incoming) {
                if *edge.weight() == EdgeType::ParentChild {
                    let child = &self.graph[edge.source()];
                    if blocked.insert(child.clone()) {
                        queue.push_back((child.clone(), depth + 1));
                    }
                }
            }
        }

        blocked
    }

    /// Open, unblocked items matching `filter`, by priority then age.
    pub(crate) fn ready_items(&self, filter: &ItemFilter) -> Vec<Item> {
        let blocked = self.blocked_set();
        let mut ready: Vec<Item> = self
            .items
            .values()
            .filter(|item| !item.is_terminal() && !blocked.contains(&item.id))
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        sort_by_priority(&mut ready);
        if let Some(limit) = filter.limit {
            ready.truncate(limit);
        }
        ready
    }

    /// All items, every dependency before its dependents.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cycle` naming an item on a cycle if the snapshot isn't a DAG.
    pub(crate) fn planning_order(&self) -> Result<Vec<Item>> {
        let order = toposort(&self.graph, None)
            .map_err(|cycle| Error::Cycle(self.graph[cycle.node_id()].clone()))?;

        // toposort puts sources (dependents) first.
        Ok(order
            .into_iter()
            .rev()
            .filter_map(|node| self.item(node).cloned())
            .collect())
    }

    /// Remaining effort per branch, unassigned items last.
    pub(crate) fn branch_effort(&self) -> Vec<BranchEffort> {
        let mut by_branch: BTreeMap<Option<&str>, BranchEffort> = BTreeMap::new();

        for item in self.items.values().filter(|item| !item.is_terminal()) {
            let entry = by_branch
                .entry(item.branch.as_deref())
                .or_insert_with(|| BranchEffort {
                    branch: item.branch.clone(),
                    open_items: 0,
                    effort_days: 0,
                    unestimated: 0,
                });
            entry.open_items += 1;
            match item.effort_days {
                Some(days) => entry.effort_days = entry.effort_days.saturating_add(days),
                None => entry.unestimated += 1,
            }
        }

        let mut summary: Vec<BranchEffort> = by_branch.into_values().collect();
        // `None` sorts first in the map; report it last.
        if summary.first().is_some_and(|entry| entry.branch.is_none()) {
            summary.rotate_left(1);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyEdge, EdgeId, ItemStatus};
    use chrono::{Duration, Utc};
    use rstest::rstest;

    fn item(id: &str, priority: u8, status: ItemStatus) -> Item {
        // Distinct creation times keep tie-breaking deterministic.
        let created = Utc::now() - Duration::minutes(i64::from(id.as_bytes()[0]));
        Item {
            id: ItemId::new(id),
            title: id.to_uppercase(),
            description: String::new(),
            status,
            priority,
            branch: None,
            milestone: None,
            owner: None,
            effort_days: None,
            created_at: created,
            updated_at: created,
            completed_at: None,
        }
    }

    fn edge(n: usize, source: &str, target: &str, edge_type: EdgeType) -> DependencyEdge {
        DependencyEdge {
            id: EdgeId::new(format!("dep-{n:04}")),
            source_id: ItemId::new(source),
            target_id: ItemId::new(target),
            edge_type,
            created_at: Utc::now(),
        }
    }

    fn graph(items: Vec<Item>, edges: Vec<DependencyEdge>) -> PlanningGraph {
        PlanningGraph::build(Snapshot { items, edges })
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[rstest]
    #[case::blocks(EdgeType::Blocks, true)]
    #[case::requires(EdgeType::Requires, true)]
    #[case::related(EdgeType::Related, false)]
    #[case::parent_child(EdgeType::ParentChild, false)]
    fn test_only_blocking_types_block(#[case] edge_type: EdgeType, #[case] blocked: bool) {
        let g = graph(
            vec![item("a", 2, ItemStatus::Planned), item("b", 2, ItemStatus::Planned)],
            vec![edge(1, "a", "b", edge_type)],
        );

        assert_eq!(!g.blocked_items().is_empty(), blocked);
    }

    #[test]
    fn test_finished_blockers_do_not_block() {
        let g = graph(
            vec![
                item("a", 2, ItemStatus::Planned),
                item("b", 2, ItemStatus::Completed),
                item("c", 2, ItemStatus::Cancelled),
            ],
            vec![
                edge(1, "a", "b", EdgeType::Blocks),
                edge(2, "a", "c", EdgeType::Requires),
            ],
        );

        assert!(g.blocked_items().is_empty());
        assert_eq!(ids(&g.ready_items(&ItemFilter::default())), vec!["a"]);
    }

    #[test]
    fn test_blocked_parent_blocks_children() {
        let g = graph(
            vec![
                item("epic", 1, ItemStatus::Planned),
                item("task", 1, ItemStatus::Planned),
                item("gate", 0, ItemStatus::InProgress),
                item("done", 1, ItemStatus::Completed),
            ],
            vec![
                edge(1, "epic", "gate", EdgeType::Blocks),
                edge(2, "task", "epic", EdgeType::ParentChild),
                edge(3, "done", "epic", EdgeType::ParentChild),
            ],
        );

        let blocked = g.blocked_items();
        let blockers = |id: &str| {
            blocked
                .iter()
                .find(|entry| entry.item.id.as_str() == id)
                .map(|entry| ids(&entry.blocked_by))
        };
        assert_eq!(blocked.len(), 2);
        assert_eq!(blockers("epic"), Some(vec!["gate"]));
        assert_eq!(blockers("task"), Some(vec!["epic"]));

        assert_eq!(ids(&g.ready_items(&ItemFilter::default())), vec!["gate"]);
    }

    #[test]
    fn test_ready_items_respects_filter_and_limit() {
        let g = graph(
            vec![
                item("a", 3, ItemStatus::Planned),
                item("b", 0, ItemStatus::Planned),
                item("c", 1, ItemStatus::InProgress),
                item("d", 1, ItemStatus::Completed),
            ],
            vec![],
        );

        assert_eq!(ids(&g.ready_items(&ItemFilter::default())), vec!["b", "c", "a"]);

        let filter = ItemFilter {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(&g.ready_items(&filter)), vec!["b", "c"]);

        let filter = ItemFilter {
            status: Some(ItemStatus::InProgress),
            ..Default::default()
        };
        assert_eq!(ids(&g.ready_items(&filter)), vec!["c"]);
    }

    #[test]
    fn test_planning_order_puts_dependencies_first() {
        let g = graph(
            vec![
                item("launch", 0, ItemStatus::Planned),
                item("beta", 1, ItemStatus::Planned),
                item("search", 2, ItemStatus::Planned),
                item("docs", 3, ItemStatus::Planned),
            ],
            vec![
                edge(1, "launch", "beta", EdgeType::Blocks),
                edge(2, "beta", "search", EdgeType::Requires),
                edge(3, "launch", "docs", EdgeType::Related),
            ],
        );

        let order = g.planning_order().unwrap();
        let position = |id: &str| order.iter().position(|item| item.id.as_str() == id).unwrap();

        assert_eq!(order.len(), 4);
        assert!(position("search") < position("beta"));
        assert!(position("beta") < position("launch"));
        assert!(position("docs") < position("launch"));
    }

    #[test]
    fn test_planning_order_fails_on_cycle() {
        let g = graph(
            vec![item("a", 2, ItemStatus::Planned), item("b", 2, ItemStatus::Planned)],
            vec![
                edge(1, "a", "b", EdgeType::Blocks),
                edge(2, "b", "a", EdgeType::Blocks),
            ],
        );

        let err = g.planning_order().unwrap_err();
        assert!(matches!(err, Error::Cycle(ref id) if id.as_str() == "a" || id.as_str() == "b"));
    }

    #[test]
    fn test_branch_effort_sums_open_items() {
        let mut items = vec![
            item("a", 2, ItemStatus::Planned),
            item("b", 2, ItemStatus::InProgress),
            item("c", 2, ItemStatus::Completed),
            item("d", 2, ItemStatus::Planned),
            item("e", 2, ItemStatus::Planned),
        ];
        items[0].branch = Some("platform".into());
        items[0].effort_days = Some(3);
        items[1].branch = Some("platform".into());
        items[1].effort_days = Some(5);
        items[2].branch = Some("platform".into());
        items[2].effort_days = Some(8);
        items[3].branch = Some("growth".into());
        items[4].effort_days = Some(2);

        let summary = graph(items, vec![]).branch_effort();

        assert_eq!(
            summary,
            vec![
                BranchEffort {
                    branch: Some("growth".into()),
                    open_items: 1,
                    effort_days: 0,
                    unestimated: 1,
                },
                BranchEffort {
                    branch: Some("platform".into()),
                    open_items: 2,
                    effort_days: 8,
                    unestimated: 0,
                },
                BranchEffort {
                    branch: None,
                    open_items: 1,
                    effort_days: 2,
                    unestimated: 0,
                },
            ]
        );
    }
}
