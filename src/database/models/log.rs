use crate::database::schema::{EntityMeta, FieldKind, FieldSpec};

pub static LOG: EntityMeta = EntityMeta {
    name: "Log",
    collection: "logs",
    fields: &[
        FieldSpec::new("employee_code", FieldKind::Id),
        FieldSpec::new("loggedTime", FieldKind::Date),
        FieldSpec::new("logStartDate", FieldKind::Date),
    ],
};
