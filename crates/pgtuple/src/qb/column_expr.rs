//! Scalar expressions that can be projected next to whole relations.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::column::{Column, ColumnDescriptor};
use crate::error::OrmResult;
use crate::qb::traits::CompiledQuery;
use crate::value::{SqlValue, Value, decode_value};

/// A scalar SQL fragment usable as an extra tuple slot.
///
/// Expressions never bind parameters. They only appear through
/// [`SelectQb::project`](crate::qb::SelectQb::project) /
/// [`JoinQb::project`](crate::qb::JoinQb::project).
pub trait ColumnExpr: Send + Sync + 'static {
    /// Rust type of the projected value.
    type Output: Send;

    /// The fragment, e.g. `max(orders.total)`.
    fn to_sql(&self) -> String;

    /// Fragment plus its (always empty) parameter list.
    fn compile(&self) -> CompiledQuery {
        CompiledQuery::new(self.to_sql(), Vec::new())
    }

    /// Convert the value found under `alias`.
    fn decode(alias: &str, value: Value) -> OrmResult<Self::Output>;
}

/// `max(column)`; `None` when no rows contribute.
pub struct MaxColumn<V> {
    column: Arc<ColumnDescriptor>,
    _marker: PhantomData<fn() -> V>,
}

impl<V: SqlValue> MaxColumn<V> {
    pub fn new<T>(column: &Column<T, V>) -> Self {
        Self {
            column: Arc::clone(column.descriptor()),
            _marker: PhantomData,
        }
    }
}

impl<V: SqlValue> ColumnExpr for MaxColumn<V> {
    type Output = Option<V>;

    fn to_sql(&self) -> String {
        format!("max({})", self.column.full_name())
    }

    fn decode(alias: &str, value: Value) -> OrmResult<Option<V>> {
        decode_value(alias, value)
    }
}

/// `count(column)` or `count(*)`.
pub struct CountColumn {
    column: Option<Arc<ColumnDescriptor>>,
}

impl CountColumn {
    pub fn new<T, V>(column: &Column<T, V>) -> Self {
        Self {
            column: Some(Arc::clone(column.descriptor())),
        }
    }

    /// `count(*)`
    pub fn all() -> Self {
        Self { column: None }
    }
}

impl ColumnExpr for CountColumn {
    type Output = i64;

    fn to_sql(&self) -> String {
        match &self.column {
            Some(column) => format!("count({})", column.full_name()),
            None => "count(*)".to_string(),
        }
    }

    fn decode(alias: &str, value: Value) -> OrmResult<i64> {
        decode_value(alias, value)
    }
}

pub fn max<T, V: SqlValue>(column: &Column<T, V>) -> MaxColumn<V> {
    MaxColumn::new(column)
}

pub fn count<T, V>(column: &Column<T, V>) -> CountColumn {
    CountColumn::new(column)
}

pub fn count_all() -> CountColumn {
    CountColumn::all()
}
