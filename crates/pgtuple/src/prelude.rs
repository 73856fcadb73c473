//! Convenient imports for typical `pgtuple` usage.
//!
//! ```ignore
//! use pgtuple::prelude::*;
//! ```

pub use std::sync::Arc;

pub use crate::{
    Column, Connection, Entity, FetchQb, Joiner, OrmError, OrmResult, Order, SqlQb, Table,
    TableBuilder, TableSchema, Value, column, count, count_all, default, foreign, max, primary,
};

#[cfg(feature = "tracing")]
pub use crate::{TraceConfig, TracingConnection};
