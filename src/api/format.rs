//! Store-to-wire conversion for entity records.

use serde_json::{Map, Value};

use crate::database::schema::{EntityMeta, BOOKKEEPING_FIELDS, ID_FIELD, PUBLIC_ID_FIELD};
use crate::database::Record;

/// Convert a stored record into its public representation.
///
/// The identity moves from `_id` to `id`, private fields and bookkeeping
/// (`__v`, `createdAt`, `updatedAt`) are dropped, and nested sub-records
/// carrying an `_id` get the same rename.
pub fn present(record: Record, meta: &EntityMeta) -> Value {
    let mut out = Map::with_capacity(record.len());
    for (key, value) in record {
        if BOOKKEEPING_FIELDS.contains(&key.as_str()) || meta.private_fields().any(|f| f == key) {
            continue;
        }
        if key == ID_FIELD {
            out.insert(PUBLIC_ID_FIELD.to_string(), value);
        } else {
            out.insert(key, rename_nested(value));
        }
    }
    Value::Object(out)
}

pub fn present_all(records: Vec<Record>, meta: &EntityMeta) -> Vec<Value> {
    records.into_iter().map(|r| present(r, meta)).collect()
}

fn rename_nested(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map = map
                .into_iter()
                .map(|(k, v)| {
                    let k = if k == ID_FIELD { PUBLIC_ID_FIELD.to_string() } else { k };
                    (k, rename_nested(v))
                })
                .collect();
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(rename_nested).collect()),
        other => other,
    }
}
