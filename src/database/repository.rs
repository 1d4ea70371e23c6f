use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::api::format::present;
use crate::database::manager::DatabaseError;
use crate::database::schema::{
    timestamp_now, EntityMeta, CREATED_AT_FIELD, ID_FIELD, PUBLIC_ID_FIELD, UPDATED_AT_FIELD, VERSION_FIELD,
};
use crate::database::store::{EntityStore, FindQuery, Record};
use crate::filter::{FilterOrder, FilterOrderInfo};

pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_PAGE: u64 = 1;

/// `sortBy`, `limit` and `page` as they arrive on a list request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl QueryOptions {
    /// Lenient parse from raw strings; anything non-numeric counts as absent.
    pub fn from_raw(sort_by: Option<&str>, limit: Option<&str>, page: Option<&str>) -> Self {
        Self {
            sort_by: sort_by.map(str::to_string),
            limit: limit.and_then(|s| s.trim().parse().ok()),
            page: page.and_then(|s| s.trim().parse().ok()),
        }
    }

    pub fn effective_limit(&self) -> u64 {
        positive_or(self.limit, DEFAULT_LIMIT)
    }

    pub fn effective_page(&self) -> u64 {
        positive_or(self.page, DEFAULT_PAGE)
    }
}

fn positive_or(value: Option<i64>, default: u64) -> u64 {
    match value {
        Some(v) if v > 0 => v as u64,
        _ => default,
    }
}

/// One page of presented records plus the totals needed to walk the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub results: Vec<Value>,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub total_results: u64,
}

/// Entity-scoped access to the store: pagination, CRUD with schema
/// preparation and bookkeeping fields.
#[derive(Clone)]
pub struct Repository {
    meta: &'static EntityMeta,
    store: Arc<dyn EntityStore>,
}

impl Repository {
    pub fn new(meta: &'static EntityMeta, store: Arc<dyn EntityStore>) -> Self {
        Self { meta, store }
    }

    pub fn meta(&self) -> &'static EntityMeta {
        self.meta
    }

    /// Count and fetch one page of records matching `filter`.
    ///
    /// The filter goes to the store as-is. Page numbers past the end
    /// produce empty results with accurate totals.
    pub async fn paginate(&self, filter: Value, options: &QueryOptions) -> Result<Page, DatabaseError> {
        let sort = self.parse_sort(options.sort_by.as_deref());
        let limit = options.effective_limit();
        let page = options.effective_page();
        let skip = (page - 1).saturating_mul(limit);

        let query = FindQuery::new(filter.clone()).sort(sort).window(skip, Some(limit));
        let (total_results, records) = futures::try_join!(
            self.store.count(self.meta, &filter),
            self.store.find(self.meta, &query),
        )?;

        let total_pages = total_results.div_ceil(limit);
        debug!(
            collection = self.meta.collection,
            page, limit, total_results, "paginate"
        );

        Ok(Page {
            results: records.into_iter().map(|r| present(r, self.meta)).collect(),
            page,
            limit,
            total_pages,
            total_results,
        })
    }

    /// Sort keys from `sortBy`, restricted to this entity's columns. The
    /// public `id` sorts on the stored identity.
    fn parse_sort(&self, sort_by: Option<&str>) -> Vec<FilterOrderInfo> {
        let Some(sort_by) = sort_by else {
            return vec![];
        };
        FilterOrder::parse_sort_by(sort_by)
            .into_iter()
            .map(|mut key| {
                if key.column == PUBLIC_ID_FIELD {
                    key.column = ID_FIELD.to_string();
                }
                key
            })
            .filter(|key| self.meta.has_column(&key.column))
            .collect()
    }

    pub async fn find(&self, filter: Value) -> Result<Vec<Record>, DatabaseError> {
        self.store.find(self.meta, &FindQuery::new(filter)).await
    }

    pub async fn find_one(&self, filter: Value) -> Result<Option<Record>, DatabaseError> {
        let query = FindQuery::new(filter).window(0, Some(1));
        Ok(self.store.find(self.meta, &query).await?.into_iter().next())
    }

    pub async fn count(&self, filter: &Value) -> Result<u64, DatabaseError> {
        self.store.count(self.meta, filter).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Record>, DatabaseError> {
        self.store.find_by_id(self.meta, id).await
    }

    /// Like [`get_by_id`](Self::get_by_id) but absence is `NotFound("<Entity> not found")`.
    pub async fn get_by_id_or_404(&self, id: &str) -> Result<Record, DatabaseError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(self.meta.not_found()))
    }

    pub async fn create(&self, mut body: Record) -> Result<Record, DatabaseError> {
        let now = timestamp_now();
        body.remove(PUBLIC_ID_FIELD);
        body.insert(ID_FIELD.to_string(), json!(Uuid::new_v4().to_string()));
        body.insert(VERSION_FIELD.to_string(), json!(0));
        body.insert(CREATED_AT_FIELD.to_string(), json!(now));
        body.insert(UPDATED_AT_FIELD.to_string(), json!(now));

        let record = self.meta.prepare(body)?;
        let record = self.store.insert(self.meta, record).await?;
        debug!(collection = self.meta.collection, id = ?record.get(ID_FIELD), "created");
        Ok(record)
    }

    /// Merge `patch` into the stored record and save it.
    pub async fn update_by_id(&self, id: &str, patch: Record) -> Result<Record, DatabaseError> {
        let mut record = self.get_by_id_or_404(id).await?;
        for (key, value) in patch {
            if is_managed_field(&key) {
                continue;
            }
            record.insert(key, value);
        }
        self.save(record).await
    }

    /// Write back a full record: revision bump, fresh `updatedAt`, schema
    /// preparation, replace.
    pub async fn save(&self, mut record: Record) -> Result<Record, DatabaseError> {
        let version = record.get(VERSION_FIELD).and_then(Value::as_i64).unwrap_or(0);
        record.insert(VERSION_FIELD.to_string(), json!(version + 1));
        record.insert(UPDATED_AT_FIELD.to_string(), json!(timestamp_now()));

        let record = self.meta.prepare(record)?;
        self.store.replace(self.meta, record).await
    }

    /// Delete and return the removed record.
    pub async fn delete_by_id(&self, id: &str) -> Result<Record, DatabaseError> {
        let record = self.get_by_id_or_404(id).await?;
        if !self.store.delete_by_id(self.meta, id).await? {
            return Err(DatabaseError::NotFound(self.meta.not_found()));
        }
        Ok(record)
    }

    pub async fn delete_many(&self, filter: &Value) -> Result<u64, DatabaseError> {
        self.store.delete_many(self.meta, filter).await
    }
}

fn is_managed_field(key: &str) -> bool {
    matches!(
        key,
        ID_FIELD | PUBLIC_ID_FIELD | VERSION_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD
    )
}
