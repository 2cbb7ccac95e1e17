//! Dependency graph manager.
//!
//! [`DependencyManager`] owns the rules for dependency edges between roadmap
//! items: every edge is created here, and creation refuses dangling
//! references, duplicate pairs and anything that would close a cycle. The
//! manager keeps no graph of its own. Per-node queries go to the store one
//! node at a time; whole-roadmap planning queries load one snapshot.
//!
//! # Concurrency
//!
//! Every read-check-write sequence runs under the store's advisory edge
//! lock ([`ItemStore::lock_edges`]). Two managers over clones of one store
//! therefore can't interleave their cycle checks and jointly create a cycle.
//! Pure reads take no lock.
//!
//! # Example
//!
//! ```
//! use waypoint::domain::{EdgeType, NewItem};
//! use waypoint::error::Error;
//! use waypoint::graph::DependencyManager;
//! use waypoint::store::{InMemoryStore, ItemStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> waypoint::error::Result<()> {
//! let mut manager = DependencyManager::new(Box::new(InMemoryStore::new("road".into())));
//! let beta = manager.store_mut().create_item(NewItem::titled("Public beta")).await?;
//! let search = manager.store_mut().create_item(NewItem::titled("Search backend")).await?;
//!
//! manager.create_dependency(&beta.id, &search.id, EdgeType::Blocks).await?;
//! let err = manager.create_dependency(&search.id, &beta.id, EdgeType::Blocks).await;
//! assert!(matches!(err, Err(Error::CycleDetected { .. })));
//! # Ok(())
//! # }
//! ```

mod planning;
mod traversal;

pub use planning::{BlockedItem, BranchEffort};

use crate::domain::{DependencyEdge, EdgeId, EdgeType, Item, ItemFilter, ItemId, NewDependency};
use crate::error::{Error, Result};
use crate::store::ItemStore;
use planning::PlanningGraph;

/// Enforces and queries the dependency graph stored in an [`ItemStore`].
pub struct DependencyManager {
    store: Box<dyn ItemStore>,
}

impl DependencyManager {
    /// Wrap a store.
    pub fn new(store: Box<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for item operations.
    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    /// Mutable access to the underlying store.
    ///
    /// Edge mutations made directly on the store bypass the checks done here.
    pub fn store_mut(&mut self) -> &mut dyn ItemStore {
        self.store.as_mut()
    }

    /// Give the store back.
    pub fn into_store(self) -> Box<dyn ItemStore> {
        self.store
    }

    /// Would adding `source -> target` close a cycle?
    ///
    /// True when `source == target` or when `target` already reaches
    /// `source`. Reads only.
    pub async fn would_create_cycle(&self, source: &ItemId, target: &ItemId) -> Result<bool> {
        traversal::would_create_cycle(self.store(), source, target).await
    }

    /// Record that `source` depends on `target`.
    ///
    /// Checks run in the order listed below, all under the store's edge lock.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidReference` if either id is empty or not a stored item
    /// - `Error::DuplicateEdge` if `source -> target` already exists
    /// - `Error::CycleDetected` if the edge would close a cycle (including a self-loop)
    ///
    /// Nothing is written when any check fails.
    pub async fn create_dependency(
        &mut self,
        source: &ItemId,
        target: &ItemId,
        edge_type: EdgeType,
    ) -> Result<DependencyEdge> {
        let _guard = self.store.lock_edges().await;

        for id in [source, target] {
            if id.is_blank() {
                return Err(Error::InvalidReference("empty item id".to_string()));
            }
            if self.store.get_item(id).await?.is_none() {
                return Err(Error::InvalidReference(id.to_string()));
            }
        }

        let existing = self.store.edges_with_source(source).await?;
        if existing.iter().any(|edge| edge.target_id == *target) {
            return Err(Error::DuplicateEdge {
                source_id: source.clone(),
                target_id: target.clone(),
            });
        }

        if traversal::would_create_cycle(self.store(), source, target).await? {
            tracing::warn!(%source, %target, "Rejected dependency that would create a cycle");
            return Err(Error::CycleDetected {
                source_id: source.clone(),
                target_id: target.clone(),
            });
        }

        let edge = self
            .store
            .insert_edge(NewDependency {
                source_id: source.clone(),
                target_id: target.clone(),
                edge_type,
            })
            .await?;

        tracing::debug!(edge_id = %edge.id, %source, %target, %edge_type, "Created dependency");
        Ok(edge)
    }

    /// Edges where `item` is the source (what it depends on), by edge id.
    ///
    /// Unknown items have no edges.
    pub async fn list_dependencies(
        &self,
        item: &ItemId,
        type_filter: Option<EdgeType>,
    ) -> Result<Vec<DependencyEdge>> {
        let edges = self.store.edges_with_source(item).await?;
        Ok(filter_by_type(edges, type_filter))
    }

    /// Edges where `item` is the target (what depends on it), by edge id.
    ///
    /// Unknown items have no edges.
    pub async fn list_dependents(
        &self,
        item: &ItemId,
        type_filter: Option<EdgeType>,
    ) -> Result<Vec<DependencyEdge>> {
        let edges = self.store.edges_with_target(item).await?;
        Ok(filter_by_type(edges, type_filter))
    }

    /// Cycles reachable from `item`, each as the list of items along it.
    ///
    /// Edges made through [`Self::create_dependency`] never form cycles, so a
    /// non-empty result means data was imported or edited around the checks.
    pub async fn find_all_cycles(&self, item: &ItemId) -> Result<Vec<Vec<ItemId>>> {
        let cycles = traversal::find_cycles_from(self.store(), item).await?;
        tracing::debug!(%item, cycles = cycles.len(), "Searched for cycles");
        Ok(cycles)
    }

    /// Does a path of one or more edges lead from `item` back to itself?
    pub async fn is_in_cycle(&self, item: &ItemId) -> Result<bool> {
        traversal::reaches(self.store(), item, item).await
    }

    /// Change an edge's descriptive type; endpoints are immutable.
    ///
    /// # Errors
    ///
    /// - `Error::EdgeNotFound` if the edge doesn't exist
    pub async fn update_dependency_type(
        &mut self,
        edge_id: &EdgeId,
        edge_type: EdgeType,
    ) -> Result<DependencyEdge> {
        let _guard = self.store.lock_edges().await;
        let edge = self.store.update_edge_type(edge_id, edge_type).await?;
        tracing::debug!(%edge_id, %edge_type, "Updated dependency type");
        Ok(edge)
    }

    /// Remove one edge.
    ///
    /// # Errors
    ///
    /// - `Error::EdgeNotFound` if the edge doesn't exist
    pub async fn delete_dependency(&mut self, edge_id: &EdgeId) -> Result<DependencyEdge> {
        let _guard = self.store.lock_edges().await;
        let edge = self.store.delete_edge(edge_id).await?;
        tracing::debug!(%edge_id, source = %edge.source_id, target = %edge.target_id, "Deleted dependency");
        Ok(edge)
    }

    /// Remove every edge touching `item`, in one store operation.
    pub async fn delete_all_for_item(&mut self, item: &ItemId) -> Result<Vec<DependencyEdge>> {
        let _guard = self.store.lock_edges().await;
        let removed = self.store.delete_edges_for_item(item).await?;
        tracing::debug!(%item, removed = removed.len(), "Deleted dependencies of item");
        Ok(removed)
    }

    /// Delete an item together with its edges.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if the item doesn't exist
    pub async fn delete_item(&mut self, item: &ItemId) -> Result<Vec<DependencyEdge>> {
        let _guard = self.store.lock_edges().await;
        let removed = self.store.delete_item(item).await?;
        tracing::debug!(%item, removed_edges = removed.len(), "Deleted item");
        Ok(removed)
    }

    /// Everything `item` depends on, transitively, with depths.
    ///
    /// `max_depth` of `None` walks the whole reachable subgraph.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if the item doesn't exist
    pub async fn dependency_tree(
        &self,
        item: &ItemId,
        max_depth: Option<usize>,
    ) -> Result<Vec<(DependencyEdge, usize)>> {
        if self.store.get_item(item).await?.is_none() {
            return Err(Error::ItemNotFound(item.clone()));
        }
        traversal::dependency_tree(self.store(), item, max_depth).await
    }

    /// Open items waiting on unfinished `blocks`/`requires` targets, directly
    /// or through a blocked `parent-child` parent.
    pub async fn blocked_items(&self) -> Result<Vec<BlockedItem>> {
        Ok(self.planning_graph().await?.blocked_items())
    }

    /// Open items nothing unfinished is holding back.
    ///
    /// Children of a blocked item (via `parent-child`) count as blocked too.
    pub async fn ready_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        Ok(self.planning_graph().await?.ready_items(filter))
    }

    /// Every item, each after everything it depends on.
    ///
    /// # Errors
    ///
    /// - `Error::Cycle` if the stored edges contain a cycle
    pub async fn planning_order(&self) -> Result<Vec<Item>> {
        self.planning_graph().await?.planning_order()
    }

    /// Open effort per branch.
    pub async fn branch_effort(&self) -> Result<Vec<BranchEffort>> {
        Ok(self.planning_graph().await?.branch_effort())
    }

    async fn planning_graph(&self) -> Result<PlanningGraph> {
        let snapshot = self.store.export_all().await?;
        Ok(PlanningGraph::build(snapshot))
    }
}

fn filter_by_type(edges: Vec<DependencyEdge>, type_filter: Option<EdgeType>) -> Vec<DependencyEdge> {
    match type_filter {
        Some(edge_type) => edges
            .into_iter()
            .filter(|edge| edge.edge_type == edge_type)
            .collect(),
        None => edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewItem, Snapshot};
    use crate::store::{InMemoryStore, MockStore, MOCK_ITEM_ID};
    use rstest::{fixture, rstest};

    #[fixture]
    fn manager() -> DependencyManager {
        DependencyManager::new(Box::new(InMemoryStore::new("road".into())))
    }

    async fn items(manager: &mut DependencyManager, titles: &[&str]) -> Vec<ItemId> {
        let mut ids = Vec::new();
        for title in titles {
            let item = manager.store_mut().create_item(NewItem::titled(*title)).await.unwrap();
            ids.push(item.id);
        }
        ids
    }

    #[rstest]
    #[tokio::test]
    async fn test_chain_then_closing_edge_is_rejected(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B", "C"]).await;
        let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

        manager.create_dependency(a, b, EdgeType::Blocks).await.unwrap();
        manager.create_dependency(b, c, EdgeType::Blocks).await.unwrap();

        let err = manager.create_dependency(c, a, EdgeType::Blocks).await.unwrap_err();
        assert!(matches!(err, Error::CycleDetected { ref source_id, ref target_id } if source_id == c && target_id == a));
        assert!(manager.list_dependencies(c, None).await.unwrap().is_empty());

        let dependents: Vec<_> = manager
            .list_dependents(c, None)
            .await
            .unwrap()
            .into_iter()
            .map(|edge| (edge.source_id, edge.target_id))
            .collect();
        assert_eq!(dependents, [(b.clone(), c.clone())]);
        let dependencies: Vec<_> = manager
            .list_dependencies(a, None)
            .await
            .unwrap()
            .into_iter()
            .map(|edge| (edge.source_id, edge.target_id))
            .collect();
        assert_eq!(dependencies, [(a.clone(), b.clone())]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_duplicate_pair_is_rejected(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B"]).await;

        manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();
        let err = manager
            .create_dependency(&ids[0], &ids[1], EdgeType::Related)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateEdge { .. }));
        assert_eq!(manager.list_dependencies(&ids[0], None).await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_reverse_edge_is_a_cycle(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B"]).await;

        manager.create_dependency(&ids[0], &ids[1], EdgeType::Requires).await.unwrap();
        let err = manager
            .create_dependency(&ids[1], &ids[0], EdgeType::Requires)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn test_self_loop_is_a_cycle(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A"]).await;
        let err = manager
            .create_dependency(&ids[0], &ids[0], EdgeType::Blocks)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[rstest]
    #[case::empty_source("", "known")]
    #[case::empty_target("known", "")]
    #[case::missing_source("road-zzzz", "known")]
    #[case::missing_target("known", "road-zzzz")]
    #[tokio::test]
    async fn test_invalid_references(
        mut manager: DependencyManager,
        #[case] source: &str,
        #[case] target: &str,
    ) {
        let known = items(&mut manager, &["Known"]).await.remove(0);
        let resolve = |raw: &str| if raw == "known" { known.clone() } else { ItemId::new(raw) };

        let err = manager
            .create_dependency(&resolve(source), &resolve(target), EdgeType::Blocks)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_reference_check_runs_before_cycle_check(mut manager: DependencyManager) {
        let missing = ItemId::new("road-zzzz");
        let err = manager
            .create_dependency(&missing, &missing, EdgeType::Blocks)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_item_cascades(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["X", "Y"]).await;
        let (x, y) = (&ids[0], &ids[1]);
        manager.create_dependency(x, y, EdgeType::Blocks).await.unwrap();

        let removed = manager.delete_item(x).await.unwrap();

        assert_eq!(removed.len(), 1);
        assert!(manager.list_dependents(y, None).await.unwrap().is_empty());
        assert!(manager.list_dependencies(x, None).await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_all_for_item_removes_both_directions(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B", "C"]).await;
        manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();
        manager.create_dependency(&ids[1], &ids[2], EdgeType::Blocks).await.unwrap();

        let removed = manager.delete_all_for_item(&ids[1]).await.unwrap();

        assert_eq!(removed.len(), 2);
        assert!(manager.store().all_edges().await.unwrap().is_empty());
        assert!(manager.store().get_item(&ids[1]).await.unwrap().is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn test_deleted_edge_can_be_recreated(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B"]).await;
        let edge = manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();

        manager.delete_dependency(&edge.id).await.unwrap();
        assert!(matches!(
            manager.delete_dependency(&edge.id).await,
            Err(Error::EdgeNotFound(_))
        ));

        // Reverse direction is legal now.
        manager.create_dependency(&ids[1], &ids[0], EdgeType::Blocks).await.unwrap();
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_type_keeps_endpoints(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B"]).await;
        let edge = manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();

        let updated = manager
            .update_dependency_type(&edge.id, EdgeType::Related)
            .await
            .unwrap();

        assert_eq!(updated.edge_type, EdgeType::Related);
        assert_eq!((updated.source_id, updated.target_id), (edge.source_id, edge.target_id));
        assert!(matches!(
            manager.update_dependency_type(&EdgeId::new("dep-none"), EdgeType::Blocks).await,
            Err(Error::EdgeNotFound(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_filters_by_type_and_is_stable(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B", "C", "D"]).await;
        manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();
        manager.create_dependency(&ids[0], &ids[2], EdgeType::Related).await.unwrap();
        manager.create_dependency(&ids[0], &ids[3], EdgeType::Blocks).await.unwrap();

        let first = manager.list_dependencies(&ids[0], None).await.unwrap();
        let second = manager.list_dependencies(&ids[0], None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let blocks = manager
            .list_dependencies(&ids[0], Some(EdgeType::Blocks))
            .await
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|edge| edge.edge_type == EdgeType::Blocks));

        let dependents = manager.list_dependents(&ids[2], None).await.unwrap();
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].source_id, ids[0]);

        assert!(manager
            .list_dependencies(&ItemId::new("road-none"), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_imported_cycle_is_reported(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B"]).await;
        let edge = manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();

        // Smuggle in the reverse edge the way a hand-edited file would.
        let mut reverse = edge.clone();
        reverse.id = EdgeId::new("dep-back");
        reverse.source_id = ids[1].clone();
        reverse.target_id = ids[0].clone();
        let warnings = manager
            .store_mut()
            .import(Snapshot {
                items: vec![],
                edges: vec![reverse],
            })
            .await
            .unwrap();
        assert!(warnings.is_empty());

        let cycles = manager.find_all_cycles(&ids[0]).await.unwrap();
        assert_eq!(cycles, vec![vec![ids[0].clone(), ids[1].clone()]]);
        assert!(manager.is_in_cycle(&ids[1]).await.unwrap());
        assert!(matches!(manager.planning_order().await, Err(Error::Cycle(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_acyclic_graph_reports_no_cycles(mut manager: DependencyManager) {
        let ids = items(&mut manager, &["A", "B", "C"]).await;
        manager.create_dependency(&ids[0], &ids[1], EdgeType::Blocks).await.unwrap();
        manager.create_dependency(&ids[0], &ids[2], EdgeType::Blocks).await.unwrap();
        manager.create_dependency(&ids[1], &ids[2], EdgeType::Blocks).await.unwrap();

        for id in &ids {
            assert!(manager.find_all_cycles(id).await.unwrap().is_empty());
            assert!(!manager.is_in_cycle(id).await.unwrap());
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_dependency_tree_requires_known_item(manager: DependencyManager) {
        assert!(matches!(
            manager.dependency_tree(&ItemId::new("road-none"), None).await,
            Err(Error::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let mut manager = DependencyManager::new(Box::new(MockStore::new()));
        let mock = ItemId::new(MOCK_ITEM_ID);

        // Self-loop is refused before the store is ever asked to write.
        assert!(matches!(
            manager.create_dependency(&mock, &mock, EdgeType::Blocks).await,
            Err(Error::CycleDetected { .. })
        ));
        assert!(matches!(
            manager.delete_item(&mock).await,
            Err(Error::Storage(_))
        ));

        let edges_before = manager.store().all_edges().await.unwrap();
        assert!(matches!(
            manager.delete_all_for_item(&mock).await,
            Err(Error::Storage(_))
        ));
        assert_eq!(manager.store().all_edges().await.unwrap(), edges_before);
        assert!(manager.store().get_item(&mock).await.unwrap().is_some());
    }
}
