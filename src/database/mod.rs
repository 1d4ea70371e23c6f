pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod schema;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{Page, QueryOptions, Repository};
pub use schema::{EntityMeta, SchemaError};
pub use store::{EntityStore, FindQuery, Record};
