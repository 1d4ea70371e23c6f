use crate::database::schema::{EntityMeta, FieldDefault, FieldKind, FieldSpec};

use super::WORK_STATUSES;

pub static PROJECT: EntityMeta = EntityMeta {
    name: "Project",
    collection: "projects",
    fields: &[
        FieldSpec::new("name", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("description", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("_tasks", FieldKind::IdList),
        FieldSpec::new("status", FieldKind::String)
            .trim()
            .lowercase()
            .choices(WORK_STATUSES)
            .default_value(FieldDefault::Text("active")),
    ],
};
