use serde::{Deserialize, Serialize};

use super::{require_some, FieldErrors};
use crate::database::models::user::ROLES;
use crate::database::models::MEMBER_STATUSES;
use crate::error::ApiError;
use crate::middleware::Validate;
use crate::services::UserSearch;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SkillBody {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateUserBody {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub team_code: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<SkillBody>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for CreateUserBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("lastName", &self.last_name);
        errors.required("email", &self.email);
        errors.email("email", Some(&self.email));
        errors.password("password", Some(&self.password));
        errors.required("role", &self.role);
        errors.one_of("role", Some(&self.role), ROLES);
        errors.object_id("teamCode", self.team_code.as_deref());
        errors.one_of("status", self.status.as_deref(), MEMBER_STATUSES);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateUserBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub team_code: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<SkillBody>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateUserBody {
    /// Whether the body changes fields only user managers may set.
    pub fn touches_access(&self) -> bool {
        [&self.role, &self.status]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

impl Validate for UpdateUserBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_some(self)?;
        let mut errors = FieldErrors::new();
        errors.email("email", self.email.as_deref());
        errors.password("password", self.password.as_deref().filter(|p| !p.is_empty()));
        errors.one_of("role", self.role.as_deref(), ROLES);
        errors.object_id("teamCode", self.team_code.as_deref());
        errors.one_of("status", self.status.as_deref(), MEMBER_STATUSES);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub team_code: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl Validate for ListUsersQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.object_id("teamCode", self.team_code.as_deref());
        errors.finish()
    }
}

impl Validate for UserSearch {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validations::{split_list_query, to_record};
    use serde_json::json;

    fn create_body(extra: serde_json::Value) -> serde_json::Value {
        let mut body = json!({
            "name": "Grace",
            "lastName": "Hopper",
            "email": "grace@example.com",
            "password": "password1",
            "role": "user"
        });
        if let (Some(map), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            map.extend(extra.clone());
        }
        body
    }

    #[test]
    fn create_rejects_unknown_role() {
        let body: CreateUserBody = serde_json::from_value(create_body(json!({ "role": "root" }))).unwrap();
        let err = body.validate().unwrap_err().to_json();
        assert_eq!(err["field_errors"]["role"], "\"role\" must be one of [user, admin]");
    }

    #[test]
    fn create_allows_blank_team_code() {
        let body: CreateUserBody =
            serde_json::from_value(create_body(json!({ "teamCode": "", "status": "" }))).unwrap();
        assert!(body.validate().is_ok());
        let record = to_record(&body).unwrap();
        assert!(!record.contains_key("teamCode"));
        assert!(!record.contains_key("status"));
    }

    #[test]
    fn role_and_status_are_access_fields() {
        let rename: UpdateUserBody = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert!(!rename.touches_access());
        let blank: UpdateUserBody = serde_json::from_value(json!({ "role": " " })).unwrap();
        assert!(!blank.touches_access());
        let promote: UpdateUserBody = serde_json::from_value(json!({ "role": "admin" })).unwrap();
        assert!(promote.touches_access());
        let retire: UpdateUserBody = serde_json::from_value(json!({ "status": "inactive" })).unwrap();
        assert!(retire.touches_access());
    }

    #[test]
    fn update_requires_a_key() {
        let empty = UpdateUserBody::default();
        assert_eq!(empty.validate().unwrap_err().status_code(), 400);

        let body: UpdateUserBody = serde_json::from_value(json!({ "name": "grace" })).unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn list_query_rejects_foreign_keys() {
        assert!(serde_json::from_value::<ListUsersQuery>(json!({ "password": "x" })).is_err());

        let query: ListUsersQuery = serde_json::from_value(json!({ "role": "admin", "limit": 3 })).unwrap();
        let (filter, options) = split_list_query(&query).unwrap();
        assert_eq!(filter, json!({ "role": "admin" }));
        assert_eq!(options.limit, Some(3));
    }
}
