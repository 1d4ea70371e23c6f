use crate::database::schema::{EntityMeta, FieldDefault, FieldKind, FieldSpec};

use super::MEMBER_STATUSES;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

pub static USER: EntityMeta = EntityMeta {
    name: "User",
    collection: "users",
    fields: &[
        FieldSpec::new("name", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("lastName", FieldKind::String).required().trim().lowercase(),
        FieldSpec::new("email", FieldKind::Email).required().unique().trim().lowercase(),
        FieldSpec::new("password", FieldKind::Password).required().trim().private(),
        FieldSpec::new("joinDate", FieldKind::Date).default_value(FieldDefault::Now),
        FieldSpec::new("role", FieldKind::String)
            .choices(ROLES)
            .default_value(FieldDefault::Text(ROLE_USER)),
        FieldSpec::new("teamCode", FieldKind::Id),
        FieldSpec::new("skills", FieldKind::Subdocs).trim().lowercase(),
        FieldSpec::new("status", FieldKind::String)
            .trim()
            .lowercase()
            .choices(MEMBER_STATUSES)
            .default_value(FieldDefault::Text("active")),
        FieldSpec::new("isEmailVerified", FieldKind::Boolean).default_value(FieldDefault::Bool(false)),
    ],
};
