//! Core in-memory data structures.
//!
//! Everything here is synchronous and runs under the store's data mutex, so
//! each public operation is a single critical section.

use crate::domain::{DependencyEdge, EdgeId, Item, ItemId, NewDependency, NewItem};
use crate::error::{Error, Result, StorageError};
use crate::id_generation::{IdGenerator, IdGeneratorConfig, EDGE_ID_PREFIX};
use chrono::Utc;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Inner storage structure (not thread-safe).
///
/// # Graph Representation
///
/// `graph` is an adjacency index over item ids with edges directed from
/// **dependent to dependency** and the [`EdgeId`] as weight. The edge
/// records themselves live in `edges`. A `StableDiGraph` keeps indices valid
/// across removals, so `node_map` and `edge_map` never need rebuilding.
pub(crate) struct InMemoryStoreInner {
    pub(super) items: HashMap<ItemId, Item>,
    pub(super) edges: HashMap<EdgeId, DependencyEdge>,
    graph: StableDiGraph<ItemId, EdgeId>,
    node_map: HashMap<ItemId, NodeIndex>,
    edge_map: HashMap<EdgeId, EdgeIndex>,
    item_ids: IdGenerator,
    edge_ids: IdGenerator,
    prefix: String,
}

impl InMemoryStoreInner {
    /// Create a new empty storage instance
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            items: HashMap::new(),
            edges: HashMap::new(),
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
            edge_map: HashMap::new(),
            item_ids: generator(&prefix, 0),
            edge_ids: generator(EDGE_ID_PREFIX, 0),
            prefix,
        }
    }

    pub(super) fn generate_item_id(&mut self, new_item: &NewItem) -> Result<ItemId> {
        if crosses_length_threshold(self.item_ids.database_size(), self.items.len()) {
            self.item_ids = generator(&self.prefix, self.items.len());
            for id in self.items.keys() {
                self.item_ids.register_id(id.as_str());
            }
        }

        let id = self
            .item_ids
            .generate(&[
                &new_item.title,
                &new_item.description,
                new_item.owner.as_deref().unwrap_or(""),
            ])
            .map_err(StorageError::from)?;
        Ok(ItemId::new(id))
    }

    fn generate_edge_id(&mut self, edge: &NewDependency) -> Result<EdgeId> {
        if crosses_length_threshold(self.edge_ids.database_size(), self.edges.len()) {
            self.edge_ids = generator(EDGE_ID_PREFIX, self.edges.len());
            for id in self.edges.keys() {
                self.edge_ids.register_id(id.as_str());
            }
        }

        let id = self
            .edge_ids
            .generate(&[edge.source_id.as_str(), edge.target_id.as_str()])
            .map_err(StorageError::from)?;
        Ok(EdgeId::new(id))
    }

    /// Assign an id to `new_edge` and insert it.
    ///
    /// The id is handed back to the generator if the insert is refused.
    pub(super) fn insert_new_edge(&mut self, new_edge: NewDependency) -> Result<DependencyEdge> {
        let id = self.generate_edge_id(&new_edge)?;
        let edge = DependencyEdge {
            id: id.clone(),
            source_id: new_edge.source_id,
            target_id: new_edge.target_id,
            edge_type: new_edge.edge_type,
            created_at: Utc::now(),
        };
        if let Err(err) = self.add_edge(edge.clone()) {
            self.edge_ids.release_id(id.as_str());
            return Err(err);
        }
        Ok(edge)
    }

    /// Insert an item and its graph node. Returns `false` if the id is taken.
    pub(super) fn add_item(&mut self, item: Item) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        let node = self.graph.add_node(item.id.clone());
        self.node_map.insert(item.id.clone(), node);
        self.item_ids.register_id(item.id.as_str());
        self.items.insert(item.id.clone(), item);
        true
    }

    /// Insert an edge, checking endpoints and pair uniqueness only.
    pub(super) fn add_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        let source = self.node(&edge.source_id)?;
        let target = self.node(&edge.target_id)?;

        if self.graph.find_edge(source, target).is_some() {
            return Err(Error::DuplicateEdge {
                source_id: edge.source_id,
                target_id: edge.target_id,
            });
        }
        if self.edges.contains_key(&edge.id) {
            return Err(StorageError::InvalidFormat(format!("edge id {} is already in use", edge.id)).into());
        }

        let index = self.graph.add_edge(source, target, edge.id.clone());
        self.edge_map.insert(edge.id.clone(), index);
        self.edge_ids.register_id(edge.id.as_str());
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    pub(super) fn remove_edge(&mut self, id: &EdgeId) -> Option<DependencyEdge> {
        let index = self.edge_map.remove(id)?;
        self.graph.remove_edge(index);
        self.edge_ids.release_id(id.as_str());
        self.edges.remove(id)
    }

    /// Remove every edge touching `id`; a single pass under the caller's lock.
    pub(super) fn remove_edges_for(&mut self, id: &ItemId) -> Vec<DependencyEdge> {
        let mut touching: Vec<EdgeId> = self
            .edge_ids_directed(id, Direction::Outgoing)
            .into_iter()
            .chain(self.edge_ids_directed(id, Direction::Incoming))
            .collect();
        touching.sort();
        touching.dedup();

        touching
            .iter()
            .filter_map(|edge_id| self.remove_edge(edge_id))
            .collect()
    }

    pub(super) fn remove_item(&mut self, id: &ItemId) -> Option<(Item, Vec<DependencyEdge>)> {
        if !self.items.contains_key(id) {
            return None;
        }
        let removed_edges = self.remove_edges_for(id);
        if let Some(node) = self.node_map.remove(id) {
            self.graph.remove_node(node);
        }
        self.item_ids.release_id(id.as_str());
        self.items.remove(id).map(|item| (item, removed_edges))
    }

    /// Edges leaving (`Outgoing`) or entering (`Incoming`) an item, sorted by id.
    pub(super) fn edges_directed(&self, id: &ItemId, direction: Direction) -> Vec<DependencyEdge> {
        let mut edges: Vec<DependencyEdge> = self
            .edge_ids_directed(id, direction)
            .iter()
            .filter_map(|edge_id| self.edges.get(edge_id).cloned())
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }

    fn edge_ids_directed(&self, id: &ItemId, direction: Direction) -> Vec<EdgeId> {
        let Some(&node) = self.node_map.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, direction)
            .map(|edge| edge.weight().clone())
            .collect()
    }

    fn node(&self, id: &ItemId) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| Error::InvalidReference(id.to_string()))
    }
}

fn generator(prefix: &str, database_size: usize) -> IdGenerator {
    IdGenerator::new(IdGeneratorConfig {
        prefix: prefix.to_string(),
        database_size,
    })
}

/// ID length changes at 500 and 1500 records; only then is the generator rebuilt.
fn crosses_length_threshold(old_size: usize, current_size: usize) -> bool {
    matches!(
        (old_size, current_size),
        (0..=500, 501..) | (0..=1500, 1501..) | (501.., 0..=500) | (1501.., 0..=1500)
    )
}
