//! Wire-facing helpers shared by handlers and the repository.
pub mod format;
