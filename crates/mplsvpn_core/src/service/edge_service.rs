//! Provider edge use-case service.
//!
//! Provider edges are not tenant-scoped and carry no associations, so this
//! facade is thin: plain create/update/delete plus projections.

use crate::model::edge::{ProviderEdge, ProviderEdgeId};
use crate::repo::edge_repo::{ProviderEdgeListQuery, ProviderEdgeRepository};
use crate::repo::{ProjectionMap, StoreResult};
use log::info;
use serde::Deserialize;

/// Create payload for one provider edge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProviderEdgeRequest {
    #[serde(default)]
    pub name: String,
}

/// Update payload for one provider edge.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProviderEdgeRequest {
    pub name: String,
}

/// Provider edge service facade over repository implementations.
pub struct ProviderEdgeService<R: ProviderEdgeRepository> {
    repo: R,
}

impl<R: ProviderEdgeRepository> ProviderEdgeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one provider edge. The name must be non-blank.
    pub fn create_provider_edge(
        &self,
        request: CreateProviderEdgeRequest,
    ) -> StoreResult<ProviderEdge> {
        let edge = ProviderEdge::new(request.name);
        let id = self.repo.create_provider_edge(&edge)?;

        let edge = self.repo.get_provider_edge(id)?;
        info!("event=edge_create module=service status=ok provideredge_id={id}");
        Ok(edge)
    }

    /// Gets one provider edge projection by id.
    pub fn get_provider_edge(
        &self,
        id: ProviderEdgeId,
        fields: Option<&[&str]>,
    ) -> StoreResult<ProjectionMap> {
        Ok(self.repo.get_provider_edge(id)?.to_projection(fields))
    }

    /// Lists provider edge projections matching the query.
    pub fn list_provider_edges(
        &self,
        query: &ProviderEdgeListQuery,
        fields: Option<&[&str]>,
    ) -> StoreResult<Vec<ProjectionMap>> {
        let edges = self.repo.list_provider_edges(query)?;
        Ok(edges
            .iter()
            .map(|edge| edge.to_projection(fields))
            .collect())
    }

    /// Replaces the edge name and returns the current record.
    pub fn update_provider_edge(
        &self,
        id: ProviderEdgeId,
        request: UpdateProviderEdgeRequest,
    ) -> StoreResult<ProviderEdge> {
        self.repo.update_provider_edge_name(id, &request.name)?;

        let edge = self.repo.get_provider_edge(id)?;
        info!("event=edge_update module=service status=ok provideredge_id={id}");
        Ok(edge)
    }

    /// Deletes one provider edge.
    ///
    /// An edge still referenced by a circuit cannot be deleted; the foreign
    /// key failure propagates as a storage error.
    pub fn delete_provider_edge(&self, id: ProviderEdgeId) -> StoreResult<()> {
        self.repo.delete_provider_edge(id)?;
        info!("event=edge_delete module=service status=ok provideredge_id={id}");
        Ok(())
    }
}
