//! Request shapes for every route and the field rules they share.
//!
//! Bodies and queries deserialize with unknown keys rejected; the
//! [`Validate`](crate::middleware::Validate) impls add the checks serde
//! can't express. Blank strings on optional fields count as absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::database::repository::QueryOptions;
use crate::database::schema::{is_email, is_password, parse_date};
use crate::database::store::Record;
use crate::error::ApiError;

pub mod auth;
pub mod log;
pub mod project;
pub mod task;
pub mod team;
pub mod user;

/// Field errors collected over one request, reported together.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("\"{}\" is not allowed to be empty", field));
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = present(value) {
            if !is_email(v.trim()) {
                self.add(field, format!("\"{}\" must be a valid email", field));
            }
        }
    }

    pub fn password(&mut self, field: &str, value: Option<&str>) {
        let Some(v) = value else { return };
        if v.chars().count() < 8 {
            self.add(field, "password must be at least 8 characters");
        } else if !is_password(v) {
            self.add(field, "password must contain at least 1 letter and 1 number");
        }
    }

    pub fn object_id(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = present(value) {
            if !is_object_id(v) {
                self.add(field, format!("\"{}\" must be a valid id", field));
            }
        }
    }

    pub fn object_ids(&mut self, field: &str, value: Option<&IdList>) {
        if let Some(list) = value {
            if list.ids().iter().any(|id| !is_object_id(id)) {
                self.add(field, format!("\"{}\" must contain valid ids", field));
            }
        }
    }

    pub fn date(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = present(value) {
            if parse_date(v).is_none() {
                self.add(field, format!("\"{}\" must be in ISO 8601 date format", field));
            }
        }
    }

    /// Case-insensitive; stored values are lowercased before the enum check.
    pub fn one_of(&mut self, field: &str, value: Option<&str>, choices: &[&str]) {
        if let Some(v) = present(value) {
            let v = v.trim().to_lowercase();
            if !choices.contains(&v.as_str()) {
                self.add(field, format!("\"{}\" must be one of [{}]", field, choices.join(", ")));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = self.errors.values().cloned().collect::<Vec<_>>().join(", ");
        Err(ApiError::validation_error(message, Some(self.errors.into_iter().collect())))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn is_object_id(value: &str) -> bool {
    Uuid::parse_str(value.trim()).is_ok()
}

/// Path id check; a malformed id is a 400 before any lookup.
pub fn object_id(field: &str, value: &str) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    if !is_object_id(value) {
        errors.add(field, format!("\"{}\" must be a valid id", field));
    }
    errors.finish()
}

/// A single id or a list of them; single ids are stored as one-element lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    One(String),
    Many(Vec<String>),
}

impl IdList {
    pub fn ids(&self) -> Vec<&str> {
        match self {
            IdList::One(id) if id.trim().is_empty() => vec![],
            IdList::One(id) => vec![id.as_str()],
            IdList::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }
}

/// Serialize a request struct into the record handed to a service,
/// dropping nulls and blank strings.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, ApiError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map.into_iter().filter(|(_, v)| !is_blank(v)).collect()),
        Ok(_) => Err(ApiError::bad_request("Request body must be an object")),
        Err(e) => Err(ApiError::bad_request(e.to_string())),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Number of keys the client actually sent, blank or not.
pub fn sent_keys<T: Serialize>(value: &T) -> usize {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map.values().filter(|v| !v.is_null()).count(),
        _ => 0,
    }
}

/// Update bodies must change something.
pub fn require_some<T: Serialize>(value: &T) -> Result<(), ApiError> {
    if sent_keys(value) == 0 {
        return Err(ApiError::validation_error("\"value\" must have at least 1 key", None));
    }
    Ok(())
}

/// Split a list query into the filter document and the paging options.
pub fn split_list_query<T: Serialize>(query: &T) -> Result<(Value, QueryOptions), ApiError> {
    let mut record = to_record(query)?;
    let options = QueryOptions {
        sort_by: record.remove("sortBy").and_then(|v| v.as_str().map(str::to_string)),
        limit: record.remove("limit").and_then(|v| v.as_i64()),
        page: record.remove("page").and_then(|v| v.as_i64()),
    };
    Ok((Value::Object(record), options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Listing {
        name: Option<String>,
        status: Option<String>,
        sort_by: Option<String>,
        limit: Option<i64>,
        page: Option<i64>,
    }

    #[test]
    fn collects_and_joins_errors() {
        let mut errors = FieldErrors::new();
        errors.email("email", Some("nope"));
        errors.password("password", Some("short1"));
        errors.object_id("teamCode", Some(""));
        let err = errors.finish().unwrap_err();
        let body = err.to_json();
        assert_eq!(err.status_code(), 400);
        assert_eq!(body["field_errors"]["email"], "\"email\" must be a valid email");
        assert_eq!(body["field_errors"]["password"], "password must be at least 8 characters");
        assert!(body["field_errors"].get("teamCode").is_none());
    }

    #[test]
    fn password_needs_letter_and_digit() {
        let mut errors = FieldErrors::new();
        errors.password("password", Some("abcdefgh"));
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        errors.password("password", Some("abcdefg1"));
        assert!(errors.is_empty());
    }

    #[test]
    fn path_ids_must_be_uuids() {
        assert!(object_id("userId", &Uuid::new_v4().to_string()).is_ok());
        assert_eq!(object_id("userId", "123").unwrap_err().status_code(), 400);
    }

    #[test]
    fn blank_values_are_dropped_from_records() {
        let record = to_record(&json!({ "name": "a", "teamCode": "", "status": null })).unwrap();
        assert_eq!(Value::Object(record), json!({ "name": "a" }));
    }

    #[test]
    fn list_queries_split_into_filter_and_options() {
        let (filter, options) = split_list_query(&Listing {
            name: Some("ada".into()),
            status: None,
            sort_by: Some("name:desc".into()),
            limit: Some(5),
            page: None,
        })
        .unwrap();
        assert_eq!(filter, json!({ "name": "ada" }));
        assert_eq!(options.sort_by.as_deref(), Some("name:desc"));
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.page, None);
    }

    #[test]
    fn single_ids_and_lists() {
        let one: IdList = serde_json::from_value(json!("abc")).unwrap();
        let many: IdList = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(one.ids(), vec!["abc"]);
        assert_eq!(many.ids(), vec!["a", "b"]);
        assert!(IdList::One(String::new()).ids().is_empty());
    }
}
