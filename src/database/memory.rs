//! Process-local store with the same contract as the PostgreSQL one.
//! Collections keep insertion order; filters are evaluated by
//! [`crate::filter::matcher`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::schema::{EntityMeta, ID_FIELD};
use super::store::{EntityStore, FindQuery, Record};
use crate::filter::matcher;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_id(record: &Record) -> Option<&str> {
        record.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Reject a write that would duplicate a unique field held by another record.
    fn check_unique(meta: &EntityMeta, rows: &[Record], record: &Record) -> Result<(), DatabaseError> {
        let id = Self::record_id(record);
        for field in meta.unique_fields() {
            let Some(value) = record.get(field) else { continue };
            let taken = rows
                .iter()
                .filter(|row| Self::record_id(row) != id)
                .any(|row| row.get(field) == Some(value));
            if taken {
                return Err(DatabaseError::Duplicate { field: field.to_string() });
            }
        }
        Ok(())
    }

    fn filter_rows<'a>(rows: &'a [Record], filter: &Value) -> Result<Vec<&'a Record>, DatabaseError> {
        let mut out = Vec::new();
        for row in rows {
            if matcher::matches(row, filter)? {
                out.push(row);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn count(&self, meta: &'static EntityMeta, filter: &Value) -> Result<u64, DatabaseError> {
        let collections = self.collections.read().await;
        let rows = collections.get(meta.collection).map(Vec::as_slice).unwrap_or_default();
        Ok(Self::filter_rows(rows, filter)?.len() as u64)
    }

    async fn find(&self, meta: &'static EntityMeta, query: &FindQuery) -> Result<Vec<Record>, DatabaseError> {
        let collections = self.collections.read().await;
        let rows = collections.get(meta.collection).map(Vec::as_slice).unwrap_or_default();

        let mut matched = Self::filter_rows(rows, &query.filter)?;
        if !query.sort.is_empty() {
            // stable, so ties keep insertion order
            matched.sort_by(|a, b| matcher::compare_records(a, b, &query.sort));
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn insert(&self, meta: &'static EntityMeta, record: Record) -> Result<Record, DatabaseError> {
        let mut collections = self.collections.write().await;
        let rows = collections.entry(meta.collection).or_default();

        let id = Self::record_id(&record)
            .ok_or_else(|| DatabaseError::QueryError("record has no _id".to_string()))?;
        if rows.iter().any(|row| Self::record_id(row) == Some(id)) {
            return Err(DatabaseError::Duplicate { field: ID_FIELD.to_string() });
        }
        Self::check_unique(meta, rows, &record)?;

        rows.push(record.clone());
        Ok(record)
    }

    async fn replace(&self, meta: &'static EntityMeta, record: Record) -> Result<Record, DatabaseError> {
        let mut collections = self.collections.write().await;
        let rows = collections.entry(meta.collection).or_default();

        let id = Self::record_id(&record)
            .ok_or_else(|| DatabaseError::QueryError("record has no _id".to_string()))?
            .to_string();
        Self::check_unique(meta, rows, &record)?;

        let slot = rows
            .iter_mut()
            .find(|row| Self::record_id(row) == Some(id.as_str()))
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", meta.name, id)))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete_by_id(&self, meta: &'static EntityMeta, id: &str) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(meta.collection) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| Self::record_id(row) != Some(id));
        Ok(rows.len() < before)
    }

    async fn delete_many(&self, meta: &'static EntityMeta, filter: &Value) -> Result<u64, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(meta.collection) else {
            return Ok(0);
        };

        // evaluate first so a bad filter leaves the collection untouched
        let doomed = rows
            .iter()
            .map(|row| matcher::matches(row, filter))
            .collect::<Result<Vec<bool>, _>>()?;

        let mut flags = doomed.into_iter();
        let before = rows.len();
        rows.retain(|_| !flags.next().unwrap_or(false));
        Ok((before - rows.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::USER;
    use crate::filter::FilterOrderInfo;
    use serde_json::json;

    fn user(id: &str, name: &str, email: &str) -> Record {
        json!({ "_id": id, "name": name, "email": email }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn keeps_insertion_order_without_sort() {
        let store = MemoryStore::new();
        for (id, name) in [("3", "c"), ("1", "a"), ("2", "b")] {
            store.insert(&USER, user(id, name, &format!("{}@x.io", name))).await.unwrap();
        }
        let rows = store.find(&USER, &FindQuery::default()).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn sorts_filters_and_windows() {
        let store = MemoryStore::new();
        for (id, name) in [("1", "b"), ("2", "a"), ("3", "c"), ("4", "a")] {
            store.insert(&USER, user(id, name, &format!("{}{}@x.io", name, id))).await.unwrap();
        }

        let query = FindQuery::new(json!({ "name": { "$ne": "c" } }))
            .sort(vec![FilterOrderInfo::asc("name")])
            .window(1, Some(2));
        let rows = store.find(&USER, &query).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["_id"].as_str().unwrap()).collect();
        // a(2), a(4), b(1) -> skip one
        assert_eq!(ids, vec!["4", "1"]);
        assert_eq!(store.count(&USER, &json!({ "name": "a" })).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn enforces_unique_fields() {
        let store = MemoryStore::new();
        store.insert(&USER, user("1", "a", "same@x.io")).await.unwrap();
        let err = store.insert(&USER, user("2", "b", "same@x.io")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { ref field } if field == "email"));

        // replacing a record with its own email is fine
        store.replace(&USER, user("1", "renamed", "same@x.io")).await.unwrap();
    }

    #[tokio::test]
    async fn replace_and_delete() {
        let store = MemoryStore::new();
        store.insert(&USER, user("1", "a", "a@x.io")).await.unwrap();
        store.insert(&USER, user("2", "b", "b@x.io")).await.unwrap();

        let err = store.replace(&USER, user("9", "z", "z@x.io")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));

        assert!(store.delete_by_id(&USER, "1").await.unwrap());
        assert!(!store.delete_by_id(&USER, "1").await.unwrap());
        assert_eq!(store.delete_many(&USER, &json!({})).await.unwrap(), 1);
        assert_eq!(store.count(&USER, &Value::Null).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_id_uses_identity() {
        let store = MemoryStore::new();
        store.insert(&USER, user("1", "a", "a@x.io")).await.unwrap();
        assert!(store.find_by_id(&USER, "1").await.unwrap().is_some());
        assert!(store.find_by_id(&USER, "2").await.unwrap().is_none());
    }
}
