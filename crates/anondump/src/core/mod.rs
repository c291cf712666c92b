//! Core abstractions shared by the selector and the converter pipeline.
//!
//! - [`schema`]: Table and column metadata
//! - [`value`]: SQL value representation
//! - [`result`]: Materialized query results and row views
//! - [`traits`]: Dialect and query executor traits
//! - [`identifier`]: Identifier validation and quoting

pub mod identifier;
pub mod result;
pub mod schema;
pub mod traits;
pub mod value;

pub use result::{ResultSet, Row};
pub use schema::{Column, Table};
pub use traits::{Dialect, QueryExecutor, SelectQueryOptions};
pub use value::{SqlNullType, SqlValue};
