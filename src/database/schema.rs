//! Static per-entity field metadata and the field-level normalisation applied
//! before every write (trim, lowercase, defaults, required, enum, kind checks).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::store::Record;

pub const ID_FIELD: &str = "_id";
pub const PUBLIC_ID_FIELD: &str = "id";
pub const VERSION_FIELD: &str = "__v";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Bookkeeping columns every entity carries; never sent over the wire.
pub const BOOKKEEPING_FIELDS: &[&str] = &[VERSION_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Email,
    Password,
    Date,
    Boolean,
    /// Reference to another entity's `_id`
    Id,
    /// List of references; stored as an array column
    IdList,
    /// Embedded sub-documents, each given its own `_id`
    Subdocs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    None,
    Text(&'static str),
    Bool(bool),
    Now,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub private: bool,
    pub unique: bool,
    pub trim: bool,
    pub lowercase: bool,
    pub choices: &'static [&'static str],
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            private: false,
            unique: false,
            trim: false,
            lowercase: false,
            choices: &[],
            default: FieldDefault::None,
        }
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    /// Stripped by the redaction transform before a record leaves the service.
    pub const fn private(self) -> Self {
        Self { private: true, ..self }
    }

    pub const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    pub const fn trim(self) -> Self {
        Self { trim: true, ..self }
    }

    pub const fn lowercase(self) -> Self {
        Self { lowercase: true, ..self }
    }

    pub const fn choices(self, choices: &'static [&'static str]) -> Self {
        Self { choices, ..self }
    }

    pub const fn default_value(self, default: FieldDefault) -> Self {
        Self { default, ..self }
    }
}

/// Field metadata for one entity type.
#[derive(Debug)]
pub struct EntityMeta {
    /// Display name used in messages ("Task not found")
    pub name: &'static str,
    /// Table / collection name
    pub collection: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{entity} validation failed: {}", summarize(.field_errors))]
pub struct SchemaError {
    pub entity: &'static str,
    pub field_errors: BTreeMap<String, String>,
}

fn summarize(field_errors: &BTreeMap<String, String>) -> String {
    field_errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join(", ")
}

impl EntityMeta {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn private_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.private).map(|f| f.name)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.unique).map(|f| f.name)
    }

    pub fn array_columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::IdList)
            .map(|f| f.name)
            .collect()
    }

    /// Every persisted column: identity, declared fields, bookkeeping.
    pub fn columns(&self) -> Vec<&'static str> {
        std::iter::once(ID_FIELD)
            .chain(self.fields.iter().map(|f| f.name))
            .chain(BOOKKEEPING_FIELDS.iter().copied())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == ID_FIELD || BOOKKEEPING_FIELDS.contains(&name) || self.field(name).is_some()
    }

    pub fn not_found(&self) -> String {
        format!("{} not found", self.name)
    }

    /// Normalise and validate a full record before it is written.
    ///
    /// Unknown keys are dropped, declared fields are cast and checked, and
    /// defaults are filled for absent fields. Identity and bookkeeping
    /// columns pass through untouched.
    pub fn prepare(&self, mut record: Record) -> Result<Record, SchemaError> {
        let mut out = Map::new();
        let mut field_errors = BTreeMap::new();

        for key in std::iter::once(ID_FIELD).chain(BOOKKEEPING_FIELDS.iter().copied()) {
            if let Some(v) = record.remove(key) {
                out.insert(key.to_string(), v);
            }
        }

        for spec in self.fields {
            let value = match record.remove(spec.name) {
                Some(v) => Some(v),
                None => default_for(spec.default),
            };

            match value {
                None | Some(Value::Null) => {
                    if spec.required {
                        field_errors.insert(spec.name.to_string(), format!("Path `{}` is required.", spec.name));
                    } else if let Some(v) = value {
                        out.insert(spec.name.to_string(), v);
                    }
                }
                Some(v) => match cast_field(spec, v) {
                    Ok(v) => {
                        out.insert(spec.name.to_string(), v);
                    }
                    Err(msg) => {
                        field_errors.insert(spec.name.to_string(), msg);
                    }
                },
            }
        }

        if field_errors.is_empty() {
            Ok(out)
        } else {
            Err(SchemaError { entity: self.name, field_errors })
        }
    }
}

fn default_for(default: FieldDefault) -> Option<Value> {
    match default {
        FieldDefault::None => None,
        FieldDefault::Text(s) => Some(Value::String(s.to_string())),
        FieldDefault::Bool(b) => Some(Value::Bool(b)),
        FieldDefault::Now => Some(Value::String(timestamp_now())),
    }
}

fn cast_field(spec: &FieldSpec, value: Value) -> Result<Value, String> {
    match spec.kind {
        FieldKind::String | FieldKind::Email | FieldKind::Password => {
            let s = cast_string(spec, &value)?;
            if spec.required && s.is_empty() {
                return Err(format!("Path `{}` is required.", spec.name));
            }
            if !spec.choices.is_empty() && !spec.choices.contains(&s.as_str()) {
                return Err(format!("`{}` is not a valid enum value for path `{}`.", s, spec.name));
            }
            match spec.kind {
                FieldKind::Email if !is_email(&s) => Err("Invalid email".to_string()),
                FieldKind::Password if s.chars().count() < 8 => {
                    Err(format!("Path `{}` is shorter than the minimum allowed length (8).", spec.name))
                }
                FieldKind::Password if !is_password(&s) => {
                    Err("Password must contain at least one letter and one number".to_string())
                }
                _ => Ok(Value::String(s)),
            }
        }
        FieldKind::Date => value
            .as_str()
            .and_then(parse_date)
            .map(Value::String)
            .ok_or_else(|| format!("Cast to date failed for value {} at path `{}`", value, spec.name)),
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(value),
            other => Err(format!("Cast to Boolean failed for value {} at path `{}`", other, spec.name)),
        },
        FieldKind::Id => cast_id(spec, &value).map(Value::String),
        FieldKind::IdList => {
            // A single id is promoted to a one-element list
            let items = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            items
                .iter()
                .map(|v| cast_id(spec, v).map(Value::String))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldKind::Subdocs => {
            let items = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(Value::Object(normalize_subdoc(spec, map))),
                    other => Err(format!("Cast to embedded failed for value {} at path `{}`", other, spec.name)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn cast_string(spec: &FieldSpec, value: &Value) -> Result<String, String> {
    let mut s = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(format!("Cast to string failed for value {} at path `{}`", other, spec.name)),
    };
    if spec.trim {
        s = s.trim().to_string();
    }
    if spec.lowercase {
        s = s.to_lowercase();
    }
    Ok(s)
}

fn cast_id(spec: &FieldSpec, value: &Value) -> Result<String, String> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(|id| id.to_string())
        .ok_or_else(|| format!("Cast to ObjectId failed for value {} at path `{}`", value, spec.name))
}

fn normalize_subdoc(spec: &FieldSpec, mut map: Map<String, Value>) -> Map<String, Value> {
    if !map.contains_key(ID_FIELD) {
        map.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    for (key, value) in map.iter_mut() {
        if key == ID_FIELD {
            continue;
        }
        if let Value::String(s) = value {
            if spec.trim {
                *s = s.trim().to_string();
            }
            if spec.lowercase {
                *s = s.to_lowercase();
            }
        }
    }
    map
}

/// Current time in the format all records use for timestamps.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(s: &str) -> Option<String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn is_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !local.chars().any(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// At least one letter and one digit.
pub fn is_password(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_digit()) && password.chars().any(|c| c.is_ascii_alphabetic())
}
