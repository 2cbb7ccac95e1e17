//! ItemStore trait implementation for the in-memory store.

use super::InMemoryStore;
use crate::domain::{
    sort_by_priority, DependencyEdge, EdgeId, EdgeType, Item, ItemFilter, ItemId, ItemStatus,
    ItemUpdate, NewDependency, NewItem, Snapshot,
};
use crate::error::{Error, Result};
use crate::store::{EdgeWriteGuard, ImportWarning, ItemStore};
use async_trait::async_trait;
use chrono::Utc;
use petgraph::Direction;

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn edges_with_source(&self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        let inner = self.lock().await;
        Ok(inner.edges_directed(id, Direction::Outgoing))
    }

    async fn edges_with_target(&self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        let inner = self.lock().await;
        Ok(inner.edges_directed(id, Direction::Incoming))
    }

    async fn get_edge(&self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        let inner = self.lock().await;
        Ok(inner.edges.get(id).cloned())
    }

    async fn all_edges(&self) -> Result<Vec<DependencyEdge>> {
        let inner = self.lock().await;
        let mut edges: Vec<DependencyEdge> = inner.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(edges)
    }

    async fn insert_edge(&mut self, new_edge: NewDependency) -> Result<DependencyEdge> {
        let mut inner = self.lock().await;
        inner.insert_new_edge(new_edge)
    }

    async fn update_edge_type(
        &mut self,
        id: &EdgeId,
        edge_type: EdgeType,
    ) -> Result<DependencyEdge> {
        let mut inner = self.lock().await;

        let edge = inner
            .edges
            .get_mut(id)
            .ok_or_else(|| Error::EdgeNotFound(id.clone()))?;
        edge.edge_type = edge_type;

        Ok(edge.clone())
    }

    async fn delete_edge(&mut self, id: &EdgeId) -> Result<DependencyEdge> {
        let mut inner = self.lock().await;
        inner
            .remove_edge(id)
            .ok_or_else(|| Error::EdgeNotFound(id.clone()))
    }

    async fn delete_edges_for_item(&mut self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        let mut inner = self.lock().await;
        Ok(inner.remove_edges_for(id))
    }

    async fn lock_edges(&self) -> EdgeWriteGuard {
        self.edge_lock.clone().lock_owned().await
    }

    async fn create_item(&mut self, new_item: NewItem) -> Result<Item> {
        let mut inner = self.lock().await;

        new_item.validate().map_err(Error::Validation)?;

        let id = inner.generate_item_id(&new_item)?;
        let now = Utc::now();
        let item = Item {
            id,
            title: new_item.title,
            description: new_item.description,
            status: ItemStatus::Planned,
            priority: new_item.priority,
            branch: new_item.branch,
            milestone: new_item.milestone,
            owner: new_item.owner,
            effort_days: new_item.effort_days,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        inner.add_item(item.clone());

        Ok(item)
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        let inner = self.lock().await;
        Ok(inner.items.get(id).cloned())
    }

    async fn update_item(&mut self, id: &ItemId, updates: ItemUpdate) -> Result<Item> {
        let mut inner = self.lock().await;

        let current = inner
            .items
            .get(id)
            .ok_or_else(|| Error::ItemNotFound(id.clone()))?;

        // Work on a copy so a failed validation leaves the stored item untouched.
        let mut item = current.clone();
        if let Some(title) = updates.title {
            item.title = title;
        }
        if let Some(description) = updates.description {
            item.description = description;
        }
        if let Some(status) = updates.status {
            item.status = status;
            item.completed_at = match status {
                ItemStatus::Completed => item.completed_at.or_else(|| Some(Utc::now())),
                _ => None,
            };
        }
        if let Some(priority) = updates.priority {
            item.priority = priority;
        }
        if let Some(branch) = updates.branch {
            item.branch = branch;
        }
        if let Some(milestone) = updates.milestone {
            item.milestone = milestone;
        }
        if let Some(owner) = updates.owner {
            item.owner = owner;
        }
        if let Some(effort_days) = updates.effort_days {
            item.effort_days = effort_days;
        }

        item.validate().map_err(Error::Validation)?;
        item.updated_at = Utc::now();

        inner.items.insert(id.clone(), item.clone());
        Ok(item)
    }

    async fn delete_item(&mut self, id: &ItemId) -> Result<Vec<DependencyEdge>> {
        let mut inner = self.lock().await;
        let (_item, removed_edges) = inner
            .remove_item(id)
            .ok_or_else(|| Error::ItemNotFound(id.clone()))?;
        Ok(removed_edges)
    }

    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let inner = self.lock().await;

        let mut items: Vec<Item> = inner
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();

        sort_by_priority(&mut items);

        if let Some(limit) = filter.limit {
            items.truncate(limit);
        }

        Ok(items)
    }

    async fn import(&mut self, snapshot: Snapshot) -> Result<Vec<ImportWarning>> {
        let mut inner = self.lock().await;
        let mut warnings = Vec::new();

        // All nodes first, so edge order within the snapshot doesn't matter.
        for item in snapshot.items {
            let id = item.id.clone();
            if !inner.add_item(item) {
                warnings.push(ImportWarning::DuplicateItem { id });
            }
        }

        for edge in snapshot.edges {
            let (edge_id, source, target) =
                (edge.id.clone(), edge.source_id.clone(), edge.target_id.clone());
            match inner.add_edge(edge) {
                Ok(()) => {}
                Err(Error::InvalidReference(_)) => warnings.push(ImportWarning::OrphanedEdge {
                    edge_id,
                    source,
                    target,
                }),
                Err(_) => warnings.push(ImportWarning::DuplicateEdge {
                    edge_id,
                    source,
                    target,
                }),
            }
        }

        Ok(warnings)
    }

    async fn export_all(&self) -> Result<Snapshot> {
        let inner = self.lock().await;

        let mut items: Vec<Item> = inner.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        let mut edges: Vec<DependencyEdge> = inner.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Snapshot { items, edges })
    }

    async fn save(&self) -> Result<()> {
        // Nothing to flush without a backing file.
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
