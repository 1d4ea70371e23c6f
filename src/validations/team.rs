use serde::{Deserialize, Serialize};

use super::{require_some, FieldErrors};
use crate::database::models::MEMBER_STATUSES;
use crate::error::ApiError;
use crate::middleware::Validate;
use crate::services::TeamSearch;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateTeamBody {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for CreateTeamBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        check_team_fields(&mut errors, self.start_date.as_deref(), self.end_date.as_deref(), self.status.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateTeamBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for UpdateTeamBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_some(self)?;
        let mut errors = FieldErrors::new();
        check_team_fields(&mut errors, self.start_date.as_deref(), self.end_date.as_deref(), self.status.as_deref());
        errors.finish()
    }
}

fn check_team_fields(errors: &mut FieldErrors, start: Option<&str>, end: Option<&str>, status: Option<&str>) {
    errors.date("startDate", start);
    errors.date("endDate", end);
    errors.one_of("status", status, MEMBER_STATUSES);
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ListTeamsQuery {
    pub name: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl Validate for ListTeamsQuery {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

impl Validate for TeamSearch {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.date("startDate", self.start_date.as_deref());
        errors.date("endDate", self.end_date.as_deref());
        errors.finish()
    }
}
