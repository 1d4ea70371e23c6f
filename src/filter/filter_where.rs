use std::collections::HashSet;

use serde_json::Value;

use super::error::FilterError;
use super::quote_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Compiles a filter document into a parameterised PostgreSQL predicate.
///
/// Parameters are numbered from `starting_param_index + 1` and accumulate
/// across nested `$and` / `$or` / `$not` groups.
pub struct FilterWhere<'a> {
    param_values: Vec<Value>,
    param_index: usize,
    array_columns: &'a HashSet<String>,
}

impl<'a> FilterWhere<'a> {
    pub fn new(starting_param_index: usize, array_columns: &'a HashSet<String>) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            array_columns,
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        array_columns: &HashSet<String>,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(starting_param_index, array_columns);
        let sql = filter_where.build(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let mut sql_conditions = vec![];
        match where_data {
            Value::Null => {}
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        sql_conditions.push(self.parse_logical_operator(key, value)?);
                    } else {
                        for condition in Self::parse_field_condition(key, value)? {
                            sql_conditions.push(self.build_sql_condition(&condition)?);
                        }
                    }
                }
            }
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }

        if sql_conditions.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(sql_conditions.join(" AND "))
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Empty conjunction is true, empty disjunction is false
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        match value {
            Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    let operator = FilterOp::from_key(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    Ok(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }]),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = quote_identifier(&condition.column);
        let is_array = self.array_columns.contains(&condition.column);
        let data = &condition.data;

        match condition.operator {
            FilterOp::Eq => match data {
                Value::Null => Ok(format!("{} IS NULL", quoted_column)),
                Value::Array(_) => Err(FilterError::InvalidOperatorData(format!(
                    "array equality is not supported on {}",
                    condition.column
                ))),
                _ if is_array => Ok(format!("{} = ANY({})", self.param(data.clone()), quoted_column)),
                _ => Ok(format!("{} = {}", quoted_column, self.param(data.clone()))),
            },
            FilterOp::Ne => match data {
                Value::Null => Ok(format!("{} IS NOT NULL", quoted_column)),
                _ if is_array => Ok(format!("NOT ({} = ANY({}))", self.param(data.clone()), quoted_column)),
                _ => Ok(format!("{} IS DISTINCT FROM {}", quoted_column, self.param(data.clone()))),
            },
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", quoted_column, self.param(data.clone()))),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", quoted_column, self.param(data.clone()))),
            FilterOp::Regex => {
                let pattern = data
                    .as_str()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$regex requires a string".to_string()))?;
                let param = self.param(Value::String(pattern.to_string()));
                if is_array {
                    Ok(format!("EXISTS (SELECT 1 FROM unnest({}) AS v WHERE v ~ {})", quoted_column, param))
                } else {
                    Ok(format!("{} ~ {}", quoted_column, param))
                }
            }
            FilterOp::In | FilterOp::NIn => {
                let values = match data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                let negate = matches!(condition.operator, FilterOp::NIn);
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                let sql = if is_array {
                    format!("{} && ARRAY[{}]", quoted_column, params.join(", "))
                } else {
                    format!("{} IN ({})", quoted_column, params.join(", "))
                };
                Ok(if negate { format!("NOT ({})", sql) } else { sql })
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => Ok(format!(
                    "{} BETWEEN {} AND {}",
                    quoted_column,
                    self.param(values[0].clone()),
                    self.param(values[1].clone())
                )),
                _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Any | FilterOp::All => {
                let values = match data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    let all = matches!(condition.operator, FilterOp::All);
                    return Ok(if all { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                let op = if matches!(condition.operator, FilterOp::Any) { "&&" } else { "@>" };
                Ok(format!("{} {} ARRAY[{}]", quoted_column, op, params.join(", ")))
            }
            FilterOp::Size => Ok(format!(
                "COALESCE(array_length({}, 1), 0) = {}",
                quoted_column,
                self.param(data.clone())
            )),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
