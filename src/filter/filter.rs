use std::collections::HashSet;

use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::quote_identifier;
use super::types::{FilterOrderInfo, SqlResult};

/// Builds SELECT / COUNT / DELETE statements for one table from a filter
/// document, sort keys and a limit/offset window.
pub struct Filter {
    table_name: String,
    where_data: Value,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<u64>,
    offset: Option<u64>,
    array_columns: HashSet<String>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            where_data: Value::Null,
            order_data: vec![],
            limit: None,
            offset: None,
            array_columns: HashSet::new(),
        })
    }

    /// Columns holding arrays; equality on them means membership.
    pub fn array_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = conditions;
        Ok(self)
    }

    pub fn order(&mut self, order: Vec<FilterOrderInfo>) -> &mut Self {
        self.order_data = order;
        self
    }

    pub fn limit(&mut self, limit: Option<u64>, offset: Option<u64>) -> &mut Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// `SELECT row_to_json(t) AS row ...` so each row arrives as one JSON object.
    pub fn to_json_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT row_to_json(t) AS row".to_string(),
            format!("FROM {} AS t", quote_identifier(&self.table_name)),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = FilterWhere::generate(&self.where_data, 0, &self.array_columns)?;
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM {} WHERE {}",
            quote_identifier(&self.table_name),
            where_result.query
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!(
            "DELETE FROM {} WHERE {}",
            quote_identifier(&self.table_name),
            where_result.query
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        let starts_ok = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_');
        if !starts_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        // Postgres takes a bigint here
        let limit = self.limit.map(|l| l.min(i64::MAX as u64));
        let offset = self.offset.map(|o| o.min(i64::MAX as u64));
        match (limit, offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            (None, Some(o)) if o > 0 => format!("OFFSET {}", o),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_paged_json_select() {
        let mut filter = Filter::new("tasks").unwrap();
        filter
            .where_clause(json!({ "status": "active" }))
            .unwrap()
            .order(vec![FilterOrderInfo::desc("name")])
            .limit(Some(10), Some(20));

        let sql = filter.to_json_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM \"tasks\" AS t WHERE \"status\" = $1 ORDER BY \"name\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!("active")]);
    }

    #[test]
    fn window_is_clamped_to_bigint() {
        let mut filter = Filter::new("teams").unwrap();
        filter.limit(Some(10), Some((i64::MAX as u64 - 1).saturating_mul(10)));
        let sql = filter.to_json_sql().unwrap();
        assert!(sql.query.ends_with(&format!("LIMIT 10 OFFSET {}", i64::MAX)), "{}", sql.query);
    }

    #[test]
    fn count_ignores_window_and_order() {
        let mut filter = Filter::new("teams").unwrap();
        filter.order(vec![FilterOrderInfo::asc("name")]).limit(Some(5), Some(5));
        assert_eq!(filter.to_count_sql().unwrap().query, "SELECT COUNT(*) AS count FROM \"teams\" WHERE 1=1");
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("").is_err());
        assert!(Filter::new("1users").is_err());
        assert!(Filter::new("users; drop").is_err());
        assert!(Filter::new("_tokens").is_ok());
    }
}
