//! Database Layer
//!
//! libsql-backed persistence for spaces, pages and attachment metadata.
//!
//! # Modules
//!
//! - [`database`] - Connection management, schema and raw SQL
//! - [`node_store`] - `NodeStore` trait consumed by services
//! - [`libsql_store`] - `NodeStore` implementation over `DatabaseService`

mod database;
mod error;
mod libsql_store;
mod node_store;

pub use database::{DatabaseService, DbCreateImageParams, DbCreateNodeParams, DbUpdateNodeParams};
pub use error::DatabaseError;
pub use libsql_store::LibsqlStore;
pub use node_store::NodeStore;
