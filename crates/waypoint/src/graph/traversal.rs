//! Store-queried graph traversals.
//!
//! None of these functions hold a graph in memory. Each node's outgoing
//! edges are fetched from the store when the node is first expanded, so a
//! traversal costs one `edges_with_source` call per reachable node.
//!
//! Depth-first walks use an explicit stack of [`Frame`]s instead of
//! recursion; each frame remembers the children still to explore.

use crate::domain::{DependencyEdge, ItemId};
use crate::error::Result;
use crate::store::ItemStore;
use std::collections::{HashMap, HashSet, VecDeque};

/// A node on the DFS stack and the children it has not explored yet.
struct Frame {
    node: ItemId,
    pending: Vec<ItemId>,
}

impl Frame {
    async fn open(store: &dyn ItemStore, node: ItemId) -> Result<Self> {
        // Reversed so `pop()` visits children in edge-id order.
        let pending = store
            .edges_with_source(&node)
            .await?
            .into_iter()
            .rev()
            .map(|edge| edge.target_id)
            .collect();
        Ok(Self { node, pending })
    }
}

/// Returns `true` if following one or more edges from `start` reaches `goal`.
///
/// Classic DFS with an "on stack" set (cleared when backtracking) and a
/// "fully visited" set. Nodes in either set are not expanded again, which
/// bounds the walk to O(V+E) over the subgraph reachable from `start`.
pub(crate) async fn reaches(store: &dyn ItemStore, start: &ItemId, goal: &ItemId) -> Result<bool> {
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut on_stack: HashSet<ItemId> = HashSet::from([start.clone()]);
    let mut stack = vec![Frame::open(store, start.clone()).await?];

    while let Some(frame) = stack.last_mut() {
        match frame.pending.pop() {
            Some(next) => {
                if next == *goal {
                    return Ok(true);
                }
                if visited.contains(&next) || on_stack.contains(&next) {
                    continue;
                }
                on_stack.insert(next.clone());
                stack.push(Frame::open(store, next).await?);
            }
            None => {
                if let Some(done) = stack.pop() {
                    on_stack.remove(&done.node);
                    visited.insert(done.node);
                }
            }
        }
    }

    Ok(false)
}

/// Returns `true` if adding `source -> target` would close a cycle.
///
/// That is the case when `source == target`, or when `target` already
/// reaches `source`.
pub(crate) async fn would_create_cycle(
    store: &dyn ItemStore,
    source: &ItemId,
    target: &ItemId,
) -> Result<bool> {
    if source == target {
        return Ok(true);
    }
    reaches(store, target, source).await
}

/// Every cycle met by a DFS from `start`.
///
/// The current path is kept explicitly. Reaching a node that is already on
/// the path records the path slice from that node to the current node as one
/// cycle; the walk does not continue past the repeated node. Fully explored
/// nodes are never expanded twice, so several cycles may be reported but the
/// walk stays O(V+E).
pub(crate) async fn find_cycles_from(store: &dyn ItemStore, start: &ItemId) -> Result<Vec<Vec<ItemId>>> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut path: Vec<ItemId> = vec![start.clone()];
    let mut position: HashMap<ItemId, usize> = HashMap::from([(start.clone(), 0)]);
    let mut stack = vec![Frame::open(store, start.clone()).await?];

    while let Some(frame) = stack.last_mut() {
        match frame.pending.pop() {
            Some(next) => {
                if let Some(&index) = position.get(&next) {
                    cycles.push(path[index..].to_vec());
                    continue;
                }
                if visited.contains(&next) {
                    continue;
                }
                position.insert(next.clone(), path.len());
                path.push(next.clone());
                stack.push(Frame::open(store, next).await?);
            }
            None => {
                if let Some(done) = stack.pop() {
                    path.pop();
                    position.remove(&done.node);
                    visited.insert(done.node);
                }
            }
        }
    }

    Ok(cycles)
}

/// Breadth-first walk of everything `root` depends on, transitively.
///
/// Returns each reached edge with its depth (1 for direct dependencies).
/// Every item is reported once, via the first edge that reaches it.
pub(crate) async fn dependency_tree(
    store: &dyn ItemStore,
    root: &ItemId,
    max_depth: Option<usize>,
) -> Result<Vec<(DependencyEdge, usize)>> {
    let mut result = Vec::new();
    let mut seen: HashSet<ItemId> = HashSet::from([root.clone()]);
    let mut queue: VecDeque<(ItemId, usize)> = VecDeque::from([(root.clone(), 0)]);

    while let Some((node, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for edge in store.edges_with_source(&node).await? {
            if seen.insert(edge.target_id.clone()) {
                queue.push_back((edge.target_id.clone(), depth + 1));
                result.push((edge, depth + 1));
            }
        }
    }

    Ok(result)
}
