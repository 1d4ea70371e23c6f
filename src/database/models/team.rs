use crate::database::schema::{EntityMeta, FieldDefault, FieldKind, FieldSpec};

use super::MEMBER_STATUSES;

pub static TEAM: EntityMeta = EntityMeta {
    name: "Team",
    collection: "teams",
    fields: &[
        FieldSpec::new("name", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("startDate", FieldKind::Date),
        FieldSpec::new("endDate", FieldKind::Date),
        FieldSpec::new("status", FieldKind::String)
            .trim()
            .lowercase()
            .choices(MEMBER_STATUSES)
            .default_value(FieldDefault::Text("active")),
    ],
};
