//! PostgreSQL-backed store. One table per entity; columns carry the JSON
//! field names so rows are read with `row_to_json` and written with
//! `jsonb_populate_record`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Row};
use tracing::debug;

use super::manager::DatabaseError;
use super::schema::{EntityMeta, ID_FIELD};
use super::store::{EntityStore, FindQuery, Record};
use crate::filter::{quote_identifier, Filter, FilterOrderInfo};

/// Hidden insertion-order column; never returned to callers.
const SEQ_COLUMN: &str = "_seq";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    fn filter_for(meta: &EntityMeta, where_data: &Value) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(meta.collection)?;
        filter.array_columns(meta.array_columns());
        filter.where_clause(where_data.clone())?;
        Ok(filter)
    }

    async fn fetch_records(&self, query: &str, params: &[Value]) -> Result<Vec<Record>, DatabaseError> {
        let mut q = sqlx::query(query);
        for p in params {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn fetch_one_record(&self, query: &str, params: &[Value]) -> Result<Option<Record>, DatabaseError> {
        Ok(self.fetch_records(query, params).await?.into_iter().next())
    }
}

#[async_trait]
impl EntityStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn count(&self, meta: &'static EntityMeta, filter: &Value) -> Result<u64, DatabaseError> {
        let sql = Self::filter_for(meta, filter)?.to_count_sql()?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn find(&self, meta: &'static EntityMeta, query: &FindQuery) -> Result<Vec<Record>, DatabaseError> {
        let mut filter = Self::filter_for(meta, &query.filter)?;
        let mut order = query.sort.clone();
        // Ties and unsorted reads fall back to insertion order
        order.push(FilterOrderInfo::asc(SEQ_COLUMN));
        filter.order(order).limit(query.limit, Some(query.skip));

        let sql = filter.to_json_sql()?;
        debug!(collection = meta.collection, sql = %sql.query, "find");
        self.fetch_records(&sql.query, &sql.params).await
    }

    async fn insert(&self, meta: &'static EntityMeta, record: Record) -> Result<Record, DatabaseError> {
        let table = quote_identifier(meta.collection);
        let columns: Vec<String> = meta.columns().into_iter().map(quote_identifier).collect();
        let column_list = columns.join(", ");
        let query = format!(
            "INSERT INTO {table} AS t ({column_list}) \
             SELECT {column_list} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING row_to_json(t) AS row"
        );

        self.fetch_one_record(&query, &[Value::Object(record)])
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", meta.collection)))
    }

    async fn replace(&self, meta: &'static EntityMeta, record: Record) -> Result<Record, DatabaseError> {
        let id = record
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DatabaseError::QueryError("record has no _id".to_string()))?;

        let table = quote_identifier(meta.collection);
        let assignments = meta
            .columns()
            .into_iter()
            .filter(|c| *c != ID_FIELD)
            .map(|c| {
                let col = quote_identifier(c);
                format!("{col} = r.{col}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "UPDATE {table} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $2) AS r \
             WHERE t.\"_id\" = $1 \
             RETURNING row_to_json(t) AS row"
        );

        self.fetch_one_record(&query, &[Value::String(id.clone()), Value::Object(record)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", meta.name, id)))
    }

    async fn delete_by_id(&self, meta: &'static EntityMeta, id: &str) -> Result<bool, DatabaseError> {
        let query = format!("DELETE FROM {} WHERE \"_id\" = $1", quote_identifier(meta.collection));
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, meta: &'static EntityMeta, filter: &Value) -> Result<u64, DatabaseError> {
        let sql = Self::filter_for(meta, filter)?.to_delete_sql()?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Record, DatabaseError> {
    let value: Value = row.try_get("row")?;
    match value {
        Value::Object(mut map) => {
            map.remove(SEQ_COLUMN);
            Ok(strip_nulls(map))
        }
        other => Err(DatabaseError::QueryError(format!("expected JSON object row, got {}", other))),
    }
}

/// Unset columns come back as SQL NULL; drop them so records look the same
/// whichever backend produced them.
fn strip_nulls(map: Map<String, Value>) -> Record {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// Unique violations become `Duplicate { field }`; the constraint is named
/// `<table>_<field>_key`.
fn map_sqlx_error(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            let field = db
                .constraint()
                .and_then(|c| c.strip_suffix("_key"))
                .and_then(|c| c.split_once('_').map(|(_, field)| field.to_string()))
                .unwrap_or_else(|| "value".to_string());
            return DatabaseError::Duplicate { field };
        }
    }
    DatabaseError::Sqlx(err)
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres has no u64
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Whole records and sub-documents go in as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
