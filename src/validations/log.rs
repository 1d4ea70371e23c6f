use serde::{Deserialize, Serialize};

use super::{require_some, FieldErrors};
use crate::error::ApiError;
use crate::middleware::Validate;

/// Create and update share one shape; every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LogBody {
    #[serde(default, rename = "employee_code")]
    pub employee_code: Option<String>,
    #[serde(default)]
    pub logged_time: Option<String>,
    #[serde(default)]
    pub log_start_date: Option<String>,
}

impl Validate for LogBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.object_id("employee_code", self.employee_code.as_deref());
        errors.date("loggedTime", self.logged_time.as_deref());
        errors.date("logStartDate", self.log_start_date.as_deref());
        errors.finish()
    }
}

/// Patch bodies additionally need at least one key.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UpdateLogBody(pub LogBody);

impl Validate for UpdateLogBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_some(&self.0)?;
        self.0.validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ListLogsQuery {
    #[serde(rename = "employee_code")]
    pub employee_code: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl Validate for ListLogsQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.object_id("employee_code", self.employee_code.as_deref());
        errors.finish()
    }
}
