//! SELECT over one table.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::column::{Column, ColumnDescriptor};
use crate::error::OrmResult;
use crate::qb::column_expr::ColumnExpr;
use crate::qb::expr::{ColumnStyle, Joiner, WhereClauses, WhereQuery};
use crate::qb::join::{JoinQb, Rel, Scalar};
use crate::qb::param::ParamList;
use crate::qb::traits::{CompiledQuery, FetchQb, SqlQb};
use crate::record::Record;
use crate::table::{Entity, TableSchema};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Clause state of a select, independent of its result type.
#[derive(Debug, Clone)]
pub(crate) struct SelectState {
    pub(crate) schema: Arc<TableSchema>,
    pub(crate) clauses: WhereClauses,
    pub(crate) order: Option<(Arc<ColumnDescriptor>, Order)>,
    pub(crate) group_by: Vec<Arc<ColumnDescriptor>>,
    pub(crate) limit: Option<u64>,
}

impl SelectState {
    pub(crate) fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            clauses: WhereClauses::new(),
            order: None,
            group_by: Vec::new(),
            limit: None,
        }
    }

    pub(crate) fn order_by(&mut self, column: Arc<ColumnDescriptor>, order: Order) {
        self.order = Some((column, order));
    }

    pub(crate) fn group_by(&mut self, column: Arc<ColumnDescriptor>) {
        if !self.group_by.contains(&column) {
            self.group_by.push(column);
        }
    }

    /// Whether anything beyond where clauses has been set.
    pub(crate) fn has_tail(&self) -> bool {
        self.order.is_some() || !self.group_by.is_empty() || self.limit.is_some()
    }

    /// Append group by, order by and limit, in that order.
    pub(crate) fn append_tail(&self, sql: &mut String, style: ColumnStyle) {
        if !self.group_by.is_empty() {
            let cols: Vec<String> = self.group_by.iter().map(|c| style.render(c)).collect();
            sql.push_str(" group by ");
            sql.push_str(&cols.join(", "));
        }
        if let Some((column, order)) = &self.order {
            sql.push_str(&format!(" order by {} {}", style.render(column), order.as_sql()));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" limit {limit}"));
        }
    }
}

/// SELECT builder for table `T`; rows hydrate into [`Entity<T>`].
///
/// ```ignore
/// let adults = users
///     .filter(users.age.le(65))
///     .and_where(users.name.ne("root".to_string()))
///     .order_by_desc(&users.age)
///     .limit(10)
///     .fetch(&client)
///     .await?;
/// ```
pub struct SelectQb<T> {
    state: SelectState,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SelectQb<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SelectQb<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQb").field("state", &self.state).finish()
    }
}

impl<T> SelectQb<T> {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            state: SelectState::new(schema),
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_state(self) -> SelectState {
        self.state
    }

    // ==================== WHERE ====================

    /// First predicate.
    pub fn filter(mut self, pred: WhereQuery) -> Self {
        self.state.clauses.first(pred);
        self
    }

    /// Later predicate joined with AND.
    pub fn and_where(mut self, pred: WhereQuery) -> Self {
        self.state.clauses.push(Joiner::And, pred);
        self
    }

    /// Later predicate joined with OR.
    pub fn or_where(mut self, pred: WhereQuery) -> Self {
        self.state.clauses.push(Joiner::Or, pred);
        self
    }

    /// Later predicate with an explicit joiner.
    pub fn where_with(mut self, joiner: Joiner, pred: WhereQuery) -> Self {
        self.state.clauses.push(joiner, pred);
        self
    }

    // ==================== Ordering & Grouping ====================

    /// Replace the ordering.
    pub fn order_by<V>(mut self, column: &Column<T, V>, order: Order) -> Self {
        self.state.order_by(Arc::clone(column.descriptor()), order);
        self
    }

    pub fn order_by_asc<V>(self, column: &Column<T, V>) -> Self {
        self.order_by(column, Order::Asc)
    }

    pub fn order_by_desc<V>(self, column: &Column<T, V>) -> Self {
        self.order_by(column, Order::Desc)
    }

    /// Add a grouping column; repeats are ignored.
    pub fn group_by<V>(mut self, column: &Column<T, V>) -> Self {
        self.state.group_by(Arc::clone(column.descriptor()));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.state.limit = Some(n);
        self
    }

    // ==================== Tuple projections ====================

    /// Join another table's select; its predicates become the `on` condition.
    ///
    /// `self` stays usable on its own.
    pub fn join<U>(&self, other: SelectQb<U>) -> JoinQb<(Rel<T>, Rel<U>)> {
        JoinQb::<(Rel<T>,)>::new(self.state.clone()).push_relation(other.into_state())
    }

    /// Add a scalar expression (e.g. an aggregate) as a second tuple slot.
    pub fn project<X: ColumnExpr>(&self, expr: X) -> JoinQb<(Rel<T>, Scalar<X>)> {
        JoinQb::<(Rel<T>,)>::new(self.state.clone()).push_scalar(&expr)
    }
}

impl<T> SqlQb for SelectQb<T> {
    fn compile(&self) -> OrmResult<CompiledQuery> {
        self.state.clauses.check()?;

        let state = &self.state;
        let cols: Vec<&str> = state.schema.column_names().collect();
        let mut sql = format!("select {} from {}", cols.join(", "), state.schema.name());

        let mut params = ParamList::new();
        state.clauses.append_where(&mut sql, ColumnStyle::Bare, &mut params);
        state.append_tail(&mut sql, ColumnStyle::Bare);

        Ok(CompiledQuery::new(sql, params.into_values()))
    }
}

impl<T> FetchQb for SelectQb<T> {
    type Output = Entity<T>;

    fn hydrate(&self, record: Record) -> OrmResult<Entity<T>> {
        Entity::from_values(Arc::clone(&self.state.schema), record)
    }
}
