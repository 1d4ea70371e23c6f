use crate::database::schema::{EntityMeta, FieldDefault, FieldKind, FieldSpec};

pub const TOKEN_TYPES: &[&str] = &["refresh", "resetPassword", "verifyEmail"];

/// Persisted refresh / one-time tokens. `token` holds a SHA-256 digest,
/// never the signed JWT itself.
pub static TOKEN: EntityMeta = EntityMeta {
    name: "Token",
    collection: "tokens",
    fields: &[
        FieldSpec::new("token", FieldKind::String).required(),
        FieldSpec::new("user", FieldKind::Id).required(),
        FieldSpec::new("type", FieldKind::String).required().choices(TOKEN_TYPES),
        FieldSpec::new("expires", FieldKind::Date).required(),
        FieldSpec::new("blacklisted", FieldKind::Boolean).default_value(FieldDefault::Bool(false)),
    ],
};
