//! Tuple selects: joined relations and scalar expressions in one result.
//!
//! The result shape is tracked in the type. `users.select().join(orders.select()...)`
//! is a `JoinQb<(Rel<Users>, Rel<Orders>)>` whose rows hydrate into
//! `(Entity<Users>, Entity<Orders>)`; projecting `max(&orders.total)` on top
//! widens it to `JoinQb<(Rel<Users>, Rel<Orders>, Scalar<MaxColumn<f64>>)>`.
//! Shapes go up to six slots.
//!
//! ```ignore
//! let rows = users
//!     .select()
//!     .join(orders.filter(orders.user_id.eq_col(&users.id)))
//!     .filter(users.age.lt(30))
//!     .fetch(&client)
//!     .await?;
//! for (user, order) in rows { /* ... */ }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::qb::column_expr::ColumnExpr;
use crate::qb::expr::{ColumnStyle, Joiner, WhereQuery};
use crate::qb::hydrate::{SlotShape, SlotValue, relation_alias, scalar_alias, split_record};
use crate::qb::param::ParamList;
use crate::qb::select::{Order, SelectQb, SelectState};
use crate::qb::traits::{CompiledQuery, FetchQb, SqlQb};
use crate::record::Record;
use crate::table::Entity;

/// Slot holding a whole row of table `T`.
pub struct Rel<T>(PhantomData<fn() -> T>);

/// Slot holding the value of expression `X`.
pub struct Scalar<X>(PhantomData<fn() -> X>);

/// One typed position of a tuple result.
pub trait Slot {
    type Output: Send;

    fn decode(value: SlotValue) -> OrmResult<Self::Output>;
}

impl<T> Slot for Rel<T> {
    type Output = Entity<T>;

    fn decode(value: SlotValue) -> OrmResult<Entity<T>> {
        match value {
            SlotValue::Relation { schema, values } => Entity::from_values(schema, values),
            SlotValue::Scalar { alias, .. } => {
                Err(OrmError::decode(alias, "expected a relation slot"))
            }
        }
    }
}

impl<X: ColumnExpr> Slot for Scalar<X> {
    type Output = X::Output;

    fn decode(value: SlotValue) -> OrmResult<X::Output> {
        match value {
            SlotValue::Scalar { alias, value } => X::decode(&alias, value),
            SlotValue::Relation { schema, .. } => Err(OrmError::decode(
                relation_alias(schema.name(), "*"),
                "expected a scalar slot",
            )),
        }
    }
}

/// A tuple of slots and the tuple it hydrates into.
pub trait TupleShape {
    type Output: Send;

    const WIDTH: usize;

    fn decode(slots: Vec<SlotValue>) -> OrmResult<Self::Output>;
}

/// Appending slot `N` to a shape.
pub trait Push<N: Slot> {
    type Next: TupleShape;
}

fn next_slot(slots: &mut std::vec::IntoIter<SlotValue>) -> OrmResult<SlotValue> {
    slots
        .next()
        .ok_or_else(|| OrmError::decode("*", "result row has fewer slots than the projection"))
}

macro_rules! impl_tuple_shape {
    ($width:expr; $($s:ident),+) => {
        impl<$($s: Slot),+> TupleShape for ($($s,)+) {
            type Output = ($($s::Output,)+);

            const WIDTH: usize = $width;

            fn decode(slots: Vec<SlotValue>) -> OrmResult<Self::Output> {
                if slots.len() != $width {
                    return Err(OrmError::decode(
                        "*",
                        format!("expected {} slots, got {}", $width, slots.len()),
                    ));
                }
                let mut slots = slots.into_iter();
                Ok(($($s::decode(next_slot(&mut slots)?)?,)+))
            }
        }
    };
}

impl_tuple_shape!(2; A, B);
impl_tuple_shape!(3; A, B, C);
impl_tuple_shape!(4; A, B, C, D);
impl_tuple_shape!(5; A, B, C, D, E);
impl_tuple_shape!(6; A, B, C, D, E, F);

macro_rules! impl_push {
    ($($s:ident),+) => {
        impl<$($s: Slot,)+ N: Slot> Push<N> for ($($s,)+) {
            type Next = ($($s,)+ N);
        }
    };
}

impl_push!(A, B);
impl_push!(A, B, C);
impl_push!(A, B, C, D);
impl_push!(A, B, C, D, E);

/// A projected slot after the base relation.
#[derive(Debug, Clone)]
enum Projected {
    /// Joined select; its predicates are the `on` condition.
    Relation(SelectState),
    /// Expression fragment.
    Scalar(String),
}

/// SELECT over a base relation plus joined relations and scalar expressions.
///
/// Where/order/group/limit calls apply to the whole statement and are
/// written against fully qualified columns.
pub struct JoinQb<S> {
    base: SelectState,
    joined: Vec<Projected>,
    build_error: Option<String>,
    _shape: PhantomData<fn() -> S>,
}

impl<S> Clone for JoinQb<S> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            joined: self.joined.clone(),
            build_error: self.build_error.clone(),
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for JoinQb<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinQb")
            .field("base", &self.base)
            .field("joined", &self.joined)
            .field("build_error", &self.build_error)
            .finish()
    }
}

impl<S> JoinQb<S> {
    pub(crate) fn new(base: SelectState) -> JoinQb<S> {
        Self {
            base,
            joined: Vec::new(),
            build_error: None,
            _shape: PhantomData,
        }
    }

    fn widen<S2>(self) -> JoinQb<S2> {
        JoinQb {
            base: self.base,
            joined: self.joined,
            build_error: self.build_error,
            _shape: PhantomData,
        }
    }

    fn record_error(&mut self, message: String) {
        if self.build_error.is_none() {
            self.build_error = Some(message);
        }
    }

    /// Relations already projected, base first.
    fn relations(&self) -> impl Iterator<Item = &SelectState> {
        std::iter::once(&self.base).chain(self.joined.iter().filter_map(|slot| match slot {
            Projected::Relation(state) => Some(state),
            Projected::Scalar(_) => None,
        }))
    }

    /// Why `other` cannot join this select: a table already in it, or a
    /// column alias that would be read back into the wrong slot.
    fn clash(&self, other: &SelectState) -> Option<String> {
        let table = other.schema.name();
        if self
            .relations()
            .any(|state| state.schema.name().eq_ignore_ascii_case(table))
        {
            return Some(format!(
                "{table} is already part of this select; a table cannot be joined to itself"
            ));
        }
        let taken: Vec<String> = self
            .relations()
            .flat_map(|state| {
                state
                    .schema
                    .columns()
                    .iter()
                    .map(move |c| relation_alias(state.schema.name(), c.name()).to_ascii_lowercase())
            })
            .collect();
        other
            .schema
            .columns()
            .iter()
            .map(|c| relation_alias(table, c.name()))
            .find(|alias| taken.contains(&alias.to_ascii_lowercase()))
            .map(|alias| format!("joining {table} makes the column alias {alias} ambiguous"))
    }

    pub(crate) fn push_relation<S2>(mut self, other: SelectState) -> JoinQb<S2> {
        if let Some(message) = self.clash(&other) {
            self.record_error(message);
        }
        let table = other.schema.name().to_string();
        if other.clauses.is_empty() {
            self.record_error(format!("join with {table} has no on condition"));
        }
        if other.has_tail() {
            self.record_error(format!(
                "joined select on {table} may only carry predicates, not order/group/limit"
            ));
        }
        self.joined.push(Projected::Relation(other));
        self.widen()
    }

    pub(crate) fn push_scalar<S2, X: ColumnExpr>(mut self, expr: &X) -> JoinQb<S2> {
        self.joined.push(Projected::Scalar(expr.to_sql()));
        self.widen()
    }

    /// Join another table's select as the next slot.
    pub fn join<U>(self, other: SelectQb<U>) -> JoinQb<S::Next>
    where
        S: Push<Rel<U>>,
    {
        self.push_relation(other.into_state())
    }

    /// Project a scalar expression as the next slot.
    pub fn project<X: ColumnExpr>(self, expr: X) -> JoinQb<S::Next>
    where
        S: Push<Scalar<X>>,
    {
        self.push_scalar(&expr)
    }

    // ==================== WHERE ====================

    /// First predicate.
    pub fn filter(mut self, pred: WhereQuery) -> Self {
        self.base.clauses.first(pred);
        self
    }

    /// Later predicate joined with AND.
    pub fn and_where(mut self, pred: WhereQuery) -> Self {
        self.base.clauses.push(Joiner::And, pred);
        self
    }

    /// Later predicate joined with OR.
    pub fn or_where(mut self, pred: WhereQuery) -> Self {
        self.base.clauses.push(Joiner::Or, pred);
        self
    }

    /// Later predicate with an explicit joiner.
    pub fn where_with(mut self, joiner: Joiner, pred: WhereQuery) -> Self {
        self.base.clauses.push(joiner, pred);
        self
    }

    // ==================== Ordering & Grouping ====================

    /// Replace the ordering; any projected relation's column may be used.
    pub fn order_by<U, V>(mut self, column: &Column<U, V>, order: Order) -> Self {
        self.base.order_by(Arc::clone(column.descriptor()), order);
        self
    }

    pub fn order_by_asc<U, V>(self, column: &Column<U, V>) -> Self {
        self.order_by(column, Order::Asc)
    }

    pub fn order_by_desc<U, V>(self, column: &Column<U, V>) -> Self {
        self.order_by(column, Order::Desc)
    }

    pub fn group_by<U, V>(mut self, column: &Column<U, V>) -> Self {
        self.base.group_by(Arc::clone(column.descriptor()));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.base.limit = Some(n);
        self
    }

    fn shape(&self) -> Vec<SlotShape> {
        let mut shape = Vec::with_capacity(self.joined.len() + 1);
        shape.push(SlotShape::Relation(Arc::clone(&self.base.schema)));
        for slot in &self.joined {
            shape.push(match slot {
                Projected::Relation(state) => SlotShape::Relation(Arc::clone(&state.schema)),
                Projected::Scalar(_) => SlotShape::Scalar,
            });
        }
        shape
    }

    fn projection(&self) -> Vec<String> {
        let relation = |state: &SelectState, out: &mut Vec<String>| {
            for column in state.schema.columns() {
                out.push(format!(
                    "{} as {}",
                    column.full_name(),
                    relation_alias(state.schema.name(), column.name())
                ));
            }
        };

        let mut cols = Vec::new();
        relation(&self.base, &mut cols);
        for (i, slot) in self.joined.iter().enumerate() {
            match slot {
                Projected::Relation(state) => relation(state, &mut cols),
                Projected::Scalar(sql) => cols.push(format!("{sql} as {}", scalar_alias(i + 1))),
            }
        }
        cols
    }
}

impl<S> SqlQb for JoinQb<S> {
    fn compile(&self) -> OrmResult<CompiledQuery> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::validation(err.clone()));
        }
        self.base.clauses.check()?;
        for slot in &self.joined {
            if let Projected::Relation(state) = slot {
                state.clauses.check()?;
            }
        }

        let mut sql = format!(
            "select {} from {}",
            self.projection().join(", "),
            self.base.schema.name()
        );

        // Join conditions take the first placeholders, base predicates follow.
        let mut params = ParamList::new();
        for slot in &self.joined {
            if let Projected::Relation(state) = slot {
                let on = state.clauses.build(ColumnStyle::Qualified, &mut params);
                sql.push_str(&format!(" inner join {} on {}", state.schema.name(), on));
            }
        }
        self.base
            .clauses
            .append_where(&mut sql, ColumnStyle::Qualified, &mut params);
        self.base.append_tail(&mut sql, ColumnStyle::Qualified);

        Ok(CompiledQuery::new(sql, params.into_values()))
    }
}

impl<S: TupleShape> FetchQb for JoinQb<S> {
    type Output = S::Output;

    fn hydrate(&self, record: Record) -> OrmResult<S::Output> {
        S::decode(split_record(&self.shape(), record)?)
    }
}
