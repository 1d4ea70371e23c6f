pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod matcher;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use filter_order::FilterOrder;
pub use types::*;

/// Quote a column or table identifier for PostgreSQL.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
