use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::manager::DatabaseError;
use super::schema::{EntityMeta, ID_FIELD};
use crate::filter::FilterOrderInfo;

/// One persisted document: field name to JSON value, identity under `_id`.
pub type Record = Map<String, Value>;

/// Filter, sort and window for a `find`.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub filter: Value,
    pub sort: Vec<FilterOrderInfo>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Value) -> Self {
        Self { filter, ..Default::default() }
    }

    pub fn sort(mut self, sort: Vec<FilterOrderInfo>) -> Self {
        self.sort = sort;
        self
    }

    pub fn window(mut self, skip: u64, limit: Option<u64>) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }
}

/// The persistence backend. Filters use the operator language compiled by
/// [`crate::filter`]; every read goes to the backend.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    async fn count(&self, meta: &'static EntityMeta, filter: &Value) -> Result<u64, DatabaseError>;

    async fn find(&self, meta: &'static EntityMeta, query: &FindQuery) -> Result<Vec<Record>, DatabaseError>;

    async fn find_by_id(&self, meta: &'static EntityMeta, id: &str) -> Result<Option<Record>, DatabaseError> {
        let query = FindQuery::new(json!({ ID_FIELD: id })).window(0, Some(1));
        Ok(self.find(meta, &query).await?.into_iter().next())
    }

    /// Insert a fully prepared record and return it as stored.
    async fn insert(&self, meta: &'static EntityMeta, record: Record) -> Result<Record, DatabaseError>;

    /// Overwrite the stored record with the same `_id`.
    async fn replace(&self, meta: &'static EntityMeta, record: Record) -> Result<Record, DatabaseError>;

    async fn delete_by_id(&self, meta: &'static EntityMeta, id: &str) -> Result<bool, DatabaseError>;

    async fn delete_many(&self, meta: &'static EntityMeta, filter: &Value) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
