//! # Mortar ORM
//!
//! A fluent SQL statement builder with a small ORM layer on top of `sqlx`.
//!
//! Statements are assembled clause by clause through typed builders, so an
//! out-of-order chain such as `.limit(1).where_clause(..)` does not compile.
//! Values are inlined as SQL literals when the statement is rendered. Query
//! results are mapped into structs (via `#[derive(Model)]`), maps, scalars or
//! vectors of them.
//!
//! ```rust,ignore
//! use mortar_orm::{Conn, Database, Model};
//!
//! #[derive(Debug, Default, Model)]
//! struct Employee {
//!     emp_no: i32,
//!     #[orm("first_name")]
//!     name: String,
//! }
//!
//! let db = Database::connect("sqlite::memory:").await?;
//!
//! let mut employees: Vec<Employee> = Vec::new();
//! db.select(&["emp_no", "first_name"])
//!     .from(&["employees"])
//!     .where_clause("emp_no > ?", 10000)
//!     .order_by(&["emp_no"])
//!     .query(&mut employees)
//!     .await?;
//! ```
//!
//! [`MockDb`] stands in for a live connection in tests by comparing the
//! statements run against a queue of expected ones.

extern crate self as mortar_orm;

pub use mortar_orm_macro::Model;

pub mod clause;
pub mod database;
pub mod errors;
pub mod mock;
pub mod model;
pub mod reflect;
pub mod resolver;
pub mod rows;
pub mod statement;
pub mod tag;
pub mod temporal;
pub mod transaction;
pub mod types;
pub mod value;

pub use clause::{Clause, JoinKind, ModelRepr};
pub use database::{Canned, Conn, Database, DatabaseBuilder, Drivers, ExecResult, QueryOutput};
pub use errors::{Error, Result};
pub use mock::{MockDb, MockTx};
pub use reflect::{Field, Kind, Reflect, Shape};
pub use rows::{RowSet, Rows, parse_rows};
pub use statement::{
    AlterTableStmt, CreateIndexStmt, CreateTableStmt, DeleteStmt, DropIndexStmt, DropTableStmt, InsertStmt,
    SelectStmt, Statement, StatementKind, UpdateStmt, alter_table, create_index, create_table, create_unique_index,
    delete, drop_index, drop_table, insert, select, update,
};
pub use tag::Tag;
pub use transaction::Transaction;
pub use value::{IntoValues, Value};
