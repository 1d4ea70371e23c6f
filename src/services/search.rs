//! Filter documents for the entity search endpoints.
//!
//! Terms match as case-insensitive substrings: stored text is lowercased
//! on write, so terms are lowercased and regex-escaped here. Absent or
//! empty terms are skipped; no terms at all matches everything.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::database::schema::parse_date;

/// `{ "$regex": <escaped term> }`, or `None` for a blank term.
pub fn contains(term: Option<&str>) -> Option<Value> {
    let term = term?.trim();
    if term.is_empty() {
        return None;
    }
    Some(json!({ "$regex": regex_lite::escape(&term.to_lowercase()) }))
}

fn exact(term: Option<&str>) -> Option<Value> {
    let term = term?.trim();
    (!term.is_empty()).then(|| Value::String(term.to_lowercase()))
}

fn and_of(conditions: Vec<(&str, Value)>) -> Value {
    let map: Map<String, Value> = conditions.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Value::Object(map)
}

fn or_of(alternatives: Vec<(&str, Value)>) -> Option<Value> {
    if alternatives.is_empty() {
        return None;
    }
    let branches: Vec<Value> = alternatives.into_iter().map(|(k, v)| json!({ k: v })).collect();
    Some(json!({ "$or": branches }))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSearch {
    pub name: Option<String>,
}

impl UserSearch {
    pub fn to_filter(&self) -> Value {
        let conditions = contains(self.name.as_deref()).map(|v| ("name", v)).into_iter().collect();
        and_of(conditions)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TeamSearch {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

impl TeamSearch {
    /// Name substring, exact status, and a window where `startDate` is on or
    /// after the given start and `endDate` on or before the given end.
    pub fn to_filter(&self) -> Value {
        let mut conditions = vec![];
        if let Some(v) = contains(self.name.as_deref()) {
            conditions.push(("name", v));
        }
        if let Some(v) = exact(self.status.as_deref()) {
            conditions.push(("status", v));
        }
        if let Some(start) = self.start_date.as_deref().and_then(parse_date) {
            conditions.push(("startDate", json!({ "$gte": start })));
        }
        if let Some(end) = self.end_date.as_deref().and_then(parse_date) {
            conditions.push(("endDate", json!({ "$lte": end })));
        }
        and_of(conditions)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSearch {
    pub name: Option<String>,
}

impl ProjectSearch {
    pub fn to_filter(&self) -> Value {
        let conditions = contains(self.name.as_deref()).map(|v| ("name", v)).into_iter().collect();
        and_of(conditions)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSearch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub project: Option<String>,
    pub user: Option<String>,
    pub status: Option<String>,
}

impl TaskSearch {
    /// Any of name, code, project or assignee matching, narrowed by status.
    pub fn to_filter(&self) -> Value {
        let mut alternatives = vec![];
        if let Some(v) = contains(self.name.as_deref()) {
            alternatives.push(("name", v));
        }
        if let Some(v) = contains(self.code.as_deref()) {
            alternatives.push(("code", v));
        }
        if let Some(v) = contains(self.project.as_deref()) {
            alternatives.push(("project", v));
        }
        if let Some(v) = contains(self.user.as_deref()) {
            alternatives.push(("_user", v));
        }

        let mut filter = or_of(alternatives).unwrap_or_else(|| json!({}));
        if let Some(status) = exact(self.status.as_deref()) {
            filter["status"] = status;
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_terms_match_everything() {
        assert_eq!(UserSearch::default().to_filter(), json!({}));
        assert_eq!(TaskSearch { name: Some("  ".into()), ..Default::default() }.to_filter(), json!({}));
    }

    #[test]
    fn terms_are_lowercased_and_escaped() {
        let filter = ProjectSearch { name: Some("Alpha.v2 (beta)".into()) }.to_filter();
        assert_eq!(filter, json!({ "name": { "$regex": "alpha\\.v2 \\(beta\\)" } }));
    }

    #[test]
    fn task_terms_are_alternatives() {
        let filter = TaskSearch {
            name: Some("build".into()),
            user: Some("abc".into()),
            status: Some("Active".into()),
            ..Default::default()
        }
        .to_filter();
        assert_eq!(
            filter,
            json!({
                "$or": [
                    { "name": { "$regex": "build" } },
                    { "_user": { "$regex": "abc" } }
                ],
                "status": "active"
            })
        );
    }

    #[test]
    fn team_dates_bound_the_window() {
        let filter = TeamSearch {
            start_date: Some("2024-01-01".into()),
            end_date: Some("not a date".into()),
            ..Default::default()
        }
        .to_filter();
        assert_eq!(filter, json!({ "startDate": { "$gte": "2024-01-01T00:00:00.000Z" } }));
    }
}
