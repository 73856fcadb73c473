//! # pgtuple
//!
//! Typed query construction and row hydration for Postgres.
//!
//! ## Features
//!
//! - **Declared schemas**: tables are declared once as typed columns; no reflection
//! - **Typed predicates**: `users.id.eq(5)` binds a parameter, `orders.user_id.eq_col(&users.id)` does not
//! - **Deterministic SQL**: builders compile to `$n`-placeholder SQL plus parameters, numbered once per statement
//! - **Tuple results**: joins and scalar expressions hydrate into typed tuples
//! - **Transaction-friendly**: pass a transaction anywhere a `Connection` is expected
//! - **Query logging**: `TracingConnection` logs every statement via `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use pgtuple::prelude::*;
//!
//! struct Users {
//!     schema: Arc<TableSchema>,
//!     id: Column<Users, i32>,
//!     name: Column<Users, String>,
//!     age: Column<Users, Option<i32>>,
//! }
//!
//! impl Table for Users {
//!     fn schema(&self) -> &Arc<TableSchema> {
//!         &self.schema
//!     }
//! }
//!
//! let mut t = TableBuilder::new("users");
//! let users = Users {
//!     id: t.column("id", primary())?,
//!     name: t.column("name", column())?,
//!     age: t.column("age", column())?,
//!     schema: t.finish()?,
//! };
//!
//! users.create().if_not_exists().execute(&client).await?;
//!
//! let user = users
//!     .filter(users.id.eq(5))
//!     .fetch_one(&client)
//!     .await?;
//! ```

pub mod client;
pub mod column;
pub mod error;
pub mod ident;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod table;
pub mod value;

#[cfg(feature = "tracing")]
pub mod trace;

pub use client::{Connection, parse_row_count};
pub use column::{Column, ColumnBuilder, ColumnDescriptor, column, default, foreign, primary};
pub use error::{OrmError, OrmResult};
pub use record::Record;
pub use table::{Entity, Table, TableBuilder, TableSchema};
pub use value::{SqlValue, Value, ValueType};

pub use qb::{
    ColumnExpr, CompiledQuery, CountColumn, CreateQb, DeleteQb, FetchQb, InsertQb, JoinQb, Joiner,
    MaxColumn, Op, Order, SelectQb, SqlQb, UpdateQb, WhereQuery, count, count_all, max,
};

#[cfg(feature = "tracing")]
pub use trace::{TraceConfig, TracingConnection};
