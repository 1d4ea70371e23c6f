use serde::{Deserialize, Serialize};

use crate::database::models::user::ROLE_ADMIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Right {
    GetUsers,
    ManageUsers,
}

/// Rights granted to a role; unknown roles get none.
pub fn role_rights(role: &str) -> &'static [Right] {
    match role {
        ROLE_ADMIN => &[Right::GetUsers, Right::ManageUsers],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything_user_nothing() {
        assert_eq!(role_rights("admin"), &[Right::GetUsers, Right::ManageUsers]);
        assert!(role_rights("user").is_empty());
        assert!(role_rights("root").is_empty());
    }
}
