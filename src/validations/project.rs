use serde::{Deserialize, Serialize};

use super::{require_some, FieldErrors, IdList};
use crate::database::models::WORK_STATUSES;
use crate::error::ApiError;
use crate::middleware::Validate;
use crate::services::ProjectSearch;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectBody {
    pub name: String,
    pub description: String,
    #[serde(default, rename = "_tasks")]
    pub tasks: Option<IdList>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for CreateProjectBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("description", &self.description);
        errors.object_ids("_tasks", self.tasks.as_ref());
        errors.one_of("status", self.status.as_deref(), WORK_STATUSES);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "_tasks")]
    pub tasks: Option<IdList>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for UpdateProjectBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_some(self)?;
        let mut errors = FieldErrors::new();
        errors.object_ids("_tasks", self.tasks.as_ref());
        errors.one_of("status", self.status.as_deref(), WORK_STATUSES);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ListProjectsQuery {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "_tasks")]
    pub tasks: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl Validate for ListProjectsQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.object_id("_tasks", self.tasks.as_deref());
        errors.finish()
    }
}

impl Validate for ProjectSearch {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
