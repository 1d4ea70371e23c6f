//! Field metadata for every persisted entity.

pub mod log;
pub mod project;
pub mod task;
pub mod team;
pub mod token;
pub mod user;

pub use log::LOG;
pub use project::PROJECT;
pub use task::TASK;
pub use team::TEAM;
pub use token::TOKEN;
pub use user::USER;

use super::schema::EntityMeta;

/// Lifecycle states shared by users and teams.
pub const MEMBER_STATUSES: &[&str] = &["active", "inactive", "deleted", "banned"];

/// Lifecycle states for work items, which can also be completed.
pub const WORK_STATUSES: &[&str] = &["active", "inactive", "deleted", "banned", "completed"];

pub static ALL: &[&EntityMeta] = &[&USER, &TEAM, &PROJECT, &TASK, &LOG, &TOKEN];
