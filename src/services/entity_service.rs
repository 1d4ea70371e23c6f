use std::sync::Arc;

use serde_json::Value;

use crate::database::{EntityMeta, EntityStore, Page, QueryOptions, Record, Repository};
use crate::error::ApiError;

pub type ServiceResult<T> = Result<T, ApiError>;

/// CRUD, list and search for one entity type. Entity-specific services
/// wrap this and add their own rules.
#[derive(Clone)]
pub struct EntityService {
    repo: Repository,
}

impl EntityService {
    pub fn new(meta: &'static EntityMeta, store: Arc<dyn EntityStore>) -> Self {
        Self { repo: Repository::new(meta, store) }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn meta(&self) -> &'static EntityMeta {
        self.repo.meta()
    }

    pub async fn create(&self, body: Record) -> ServiceResult<Record> {
        Ok(self.repo.create(body).await?)
    }

    /// Paginated listing; `filter` is forwarded to the store unchanged.
    pub async fn query(&self, filter: Value, options: &QueryOptions) -> ServiceResult<Page> {
        Ok(self.repo.paginate(filter, options).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<Option<Record>> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn get_by_id_or_404(&self, id: &str) -> ServiceResult<Record> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(self.meta().not_found()))
    }

    /// Unpaginated search; an empty result is a 404 like a missing record.
    pub async fn search(&self, filter: Value) -> ServiceResult<Vec<Record>> {
        let records = self.repo.find(filter).await?;
        if records.is_empty() {
            return Err(ApiError::not_found(self.meta().not_found()));
        }
        Ok(records)
    }

    pub async fn update_by_id(&self, id: &str, patch: Record) -> ServiceResult<Record> {
        Ok(self.repo.update_by_id(id, patch).await?)
    }

    pub async fn delete_by_id(&self, id: &str) -> ServiceResult<Record> {
        Ok(self.repo.delete_by_id(id).await?)
    }
}
