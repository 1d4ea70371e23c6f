//! In-process evaluation of filter documents, used by the memory store.
//! Follows document-store semantics: a scalar condition on an array field
//! matches when any element matches.

use std::cmp::Ordering;

use regex_lite::Regex;
use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FilterOp, FilterOrderInfo, SortDirection};

pub fn matches(record: &Map<String, Value>, filter: &Value) -> Result<bool, FilterError> {
    match filter {
        Value::Null => Ok(true),
        Value::Object(obj) => {
            for (key, value) in obj {
                let ok = if key.starts_with('$') {
                    match_logical(record, key, value)?
                } else {
                    match_field(record.get(key), value)?
                };
                if !ok {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
    }
}

fn match_logical(record: &Map<String, Value>, op: &str, value: &Value) -> Result<bool, FilterError> {
    match op {
        "$and" | "$or" => {
            let arr = value
                .as_array()
                .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
            if op == "$and" {
                for v in arr {
                    if !matches(record, v)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            } else {
                for v in arr {
                    if matches(record, v)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
        "$not" => Ok(!matches(record, value)?),
        _ => Err(FilterError::UnsupportedOperator(op.to_string())),
    }
}

fn match_field(field: Option<&Value>, condition: &Value) -> Result<bool, FilterError> {
    match condition {
        Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => {
            for (op_key, op_val) in obj {
                let op = FilterOp::from_key(op_key)
                    .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                if !match_operator(field, op, op_val)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(equals(field, condition)),
    }
}

fn match_operator(field: Option<&Value>, op: FilterOp, data: &Value) -> Result<bool, FilterError> {
    Ok(match op {
        FilterOp::Eq => equals(field, data),
        FilterOp::Ne => !equals(field, data),
        FilterOp::Gt => ordered(field, data, |o| o == Ordering::Greater),
        FilterOp::Gte => ordered(field, data, |o| o != Ordering::Less),
        FilterOp::Lt => ordered(field, data, |o| o == Ordering::Less),
        FilterOp::Lte => ordered(field, data, |o| o != Ordering::Greater),
        FilterOp::Like | FilterOp::ILike => {
            let pattern = data
                .as_str()
                .ok_or_else(|| FilterError::InvalidOperatorData("$like requires a string".to_string()))?;
            let re = like_to_regex(pattern, matches!(op, FilterOp::ILike))?;
            any_string(field, |s| re.is_match(s))
        }
        FilterOp::Regex => {
            let pattern = data
                .as_str()
                .ok_or_else(|| FilterError::InvalidOperatorData("$regex requires a string".to_string()))?;
            let re = Regex::new(pattern).map_err(|e| FilterError::InvalidRegex(e.to_string()))?;
            any_string(field, |s| re.is_match(s))
        }
        FilterOp::In | FilterOp::NIn => {
            let found = as_list(data).iter().any(|v| equals(field, v));
            if matches!(op, FilterOp::In) { found } else { !found }
        }
        FilterOp::Between => match data {
            Value::Array(bounds) if bounds.len() == 2 => {
                ordered(field, &bounds[0], |o| o != Ordering::Less)
                    && ordered(field, &bounds[1], |o| o != Ordering::Greater)
            }
            _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
        },
        FilterOp::Any => match field {
            Some(Value::Array(items)) => as_list(data).iter().any(|v| items.contains(v)),
            _ => false,
        },
        FilterOp::All => match field {
            Some(Value::Array(items)) => as_list(data).iter().all(|v| items.contains(v)),
            _ => false,
        },
        FilterOp::Size => match (field, data.as_u64()) {
            (Some(Value::Array(items)), Some(n)) => items.len() as u64 == n,
            _ => false,
        },
    })
}

fn equals(field: Option<&Value>, expected: &Value) -> bool {
    match (field, expected) {
        (None, Value::Null) | (Some(Value::Null), Value::Null) => true,
        (None, _) => false,
        (Some(Value::Array(items)), v) if !v.is_array() => items.contains(v),
        (Some(actual), v) => actual == v,
    }
}

fn ordered(field: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match field {
        Some(actual) if same_kind(actual, bound) => accept(compare_values(Some(actual), Some(bound))),
        _ => false,
    }
}

fn any_string(field: Option<&Value>, pred: impl Fn(&str) -> bool) -> bool {
    match field {
        Some(Value::String(s)) => pred(s),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).any(pred),
        _ => false,
    }
}

fn as_list(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    }
}

fn like_to_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, FilterError> {
    let mut re = String::from(if case_insensitive { "(?is)^" } else { "(?s)^" });
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '%' | '_' => {
                re.push_str(&regex_lite::escape(&literal));
                literal.clear();
                re.push_str(if c == '%' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    re.push_str(&regex_lite::escape(&literal));
    re.push('$');
    Regex::new(&re).map_err(|e| FilterError::InvalidRegex(e.to_string()))
}

fn same_kind(a: &Value, b: &Value) -> bool {
    type_rank(Some(a)) == type_rank(Some(b))
}

fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order over JSON values: missing/null < numbers < strings < objects
/// < arrays < booleans; same-kind values compare naturally.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let o = compare_values(Some(l), Some(r));
                if o != Ordering::Equal {
                    return o;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

/// Compare two records by a list of sort keys.
pub fn compare_records(a: &Map<String, Value>, b: &Map<String, Value>, order: &[FilterOrderInfo]) -> Ordering {
    for key in order {
        let o = compare_values(a.get(&key.column), b.get(&key.column));
        let o = match key.sort {
            SortDirection::Asc => o,
            SortDirection::Desc => o.reverse(),
        };
        if o != Ordering::Equal {
            return o;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn equality_and_missing_fields() {
        let r = record(json!({ "name": "alpha", "teamCode": null }));
        assert!(matches(&r, &json!({ "name": "alpha" })).unwrap());
        assert!(!matches(&r, &json!({ "name": "beta" })).unwrap());
        assert!(matches(&r, &json!({ "teamCode": null, "missing": null })).unwrap());
    }

    #[test]
    fn scalar_condition_matches_array_member() {
        let r = record(json!({ "_user": ["u1", "u2"] }));
        assert!(matches(&r, &json!({ "_user": "u2" })).unwrap());
        assert!(matches(&r, &json!({ "_user": { "$regex": "^u" } })).unwrap());
        assert!(!matches(&r, &json!({ "_user": "u3" })).unwrap());
    }

    #[test]
    fn or_with_regex() {
        let r = record(json!({ "name": "design review", "project": "p-1" }));
        let f = json!({ "$or": [ { "name": { "$regex": "review" } }, { "project": "nope" } ] });
        assert!(matches(&r, &f).unwrap());
        assert!(!matches(&r, &json!({ "$or": [] })).unwrap());
    }

    #[test]
    fn like_patterns() {
        let r = record(json!({ "email": "Ada@example.com" }));
        assert!(matches(&r, &json!({ "email": { "$ilike": "ada@%" } })).unwrap());
        assert!(!matches(&r, &json!({ "email": { "$like": "ada@%" } })).unwrap());
        assert!(matches(&r, &json!({ "email": { "$like": "Ad_@example.com" } })).unwrap());
    }

    #[test]
    fn range_and_membership() {
        let r = record(json!({ "hours": 4, "status": "active" }));
        assert!(matches(&r, &json!({ "hours": { "$gte": 4, "$lt": 5 } })).unwrap());
        assert!(matches(&r, &json!({ "hours": { "$between": [1, 4] } })).unwrap());
        assert!(!matches(&r, &json!({ "hours": { "$gt": "3" } })).unwrap());
        assert!(matches(&r, &json!({ "status": { "$in": ["active", "inactive"] } })).unwrap());
        assert!(matches(&r, &json!({ "status": { "$nin": ["banned"] } })).unwrap());
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let r = record(json!({ "name": "x" }));
        assert!(matches(&r, &json!({ "name": { "$regex": "(" } })).is_err());
    }

    #[test]
    fn sorts_by_multiple_keys() {
        let a = record(json!({ "status": "active", "name": "b" }));
        let b = record(json!({ "status": "active", "name": "a" }));
        let order = vec![FilterOrderInfo::asc("status"), FilterOrderInfo::desc("name")];
        assert_eq!(compare_records(&a, &b, &order), Ordering::Less);
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!("1"))), Ordering::Less);
    }
}
