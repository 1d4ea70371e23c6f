use serde::{Deserialize, Serialize};

use super::{require_some, FieldErrors, IdList};
use crate::database::models::WORK_STATUSES;
use crate::error::ApiError;
use crate::middleware::Validate;
use crate::services::TaskSearch;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskBody {
    pub name: String,
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default, rename = "_user")]
    pub users: Option<IdList>,
    #[serde(default)]
    pub logs: Option<IdList>,
    #[serde(default)]
    pub status: Option<String>,
    /// Older clients send the team here; tasks don't store it.
    #[serde(default, rename = "teamCode", skip_serializing)]
    pub team_code: Option<String>,
}

impl Validate for CreateTaskBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("code", &self.code);
        errors.required("description", &self.description);
        errors.object_id("teamCode", self.team_code.as_deref());
        check_task_refs(&mut errors, self.project.as_deref(), self.users.as_ref(), self.logs.as_ref());
        errors.one_of("status", self.status.as_deref(), WORK_STATUSES);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default, rename = "_user")]
    pub users: Option<IdList>,
    #[serde(default)]
    pub logs: Option<IdList>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for UpdateTaskBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_some(self)?;
        let mut errors = FieldErrors::new();
        check_task_refs(&mut errors, self.project.as_deref(), self.users.as_ref(), self.logs.as_ref());
        errors.one_of("status", self.status.as_deref(), WORK_STATUSES);
        errors.finish()
    }
}

fn check_task_refs(errors: &mut FieldErrors, project: Option<&str>, users: Option<&IdList>, logs: Option<&IdList>) {
    errors.object_id("project", project);
    errors.object_ids("_user", users);
    errors.object_ids("logs", logs);
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub project: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl Validate for ListTasksQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.object_id("project", self.project.as_deref());
        errors.finish()
    }
}

impl Validate for TaskSearch {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validations::to_record;
    use serde_json::json;

    #[test]
    fn team_code_is_accepted_but_not_stored() {
        let body: CreateTaskBody = serde_json::from_value(json!({
            "name": "wire",
            "code": "T-1",
            "description": "wiring",
            "teamCode": "",
            "project": ""
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        let record = to_record(&body).unwrap();
        assert!(!record.contains_key("teamCode"));
        assert!(!record.contains_key("project"));
    }

    #[test]
    fn project_must_be_an_id() {
        let body: UpdateTaskBody = serde_json::from_value(json!({ "project": "apollo" })).unwrap();
        let err = body.validate().unwrap_err().to_json();
        assert!(err["field_errors"]["project"].is_string());
    }
}
