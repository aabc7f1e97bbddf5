//! # shopdash-database
//!
//! Database access for ShopDash. There is no pool. Every
//! operation opens one connection with the caller's credentials, runs one
//! statement or one introspection call, and closes it.
//!
//! - `connection`: engine-specific connect and execute
//! - `dialect`: identifier quoting
//! - `statement`: parameterized SELECT/INSERT/UPDATE/DELETE builders
//! - `rows`: dynamically typed result snapshots
//! - `introspect`: table, column, and primary-key discovery
//! - `constraint`: enumerated-value extraction from stored DDL

pub mod connection;
pub mod constraint;
pub mod dialect;
pub mod introspect;
pub mod rows;
pub mod statement;

pub use connection::{Connector, DbConnection};
pub use constraint::{ConstraintExtractor, parse_enumerated_values};
pub use dialect::Dialect;
pub use introspect::{
    ColumnInfo, EngineIntrospector, NumericClass, SchemaIntrospector, TableSchema, numeric_class,
};
pub use rows::{TableSnapshot, cells_match};
pub use statement::{BoundParam, Statement};
