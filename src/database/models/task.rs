use crate::database::schema::{EntityMeta, FieldDefault, FieldKind, FieldSpec};

use super::WORK_STATUSES;

pub static TASK: EntityMeta = EntityMeta {
    name: "Task",
    collection: "tasks",
    fields: &[
        FieldSpec::new("code", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("name", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("description", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("project", FieldKind::Id),
        // assignees
        FieldSpec::new("_user", FieldKind::IdList),
        FieldSpec::new("logs", FieldKind::IdList),
        FieldSpec::new("status", FieldKind::String)
            .trim()
            .lowercase()
            .choices(WORK_STATUSES)
            .default_value(FieldDefault::Text("active")),
    ],
};
