//! UPDATE builder.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::column::{Column, ColumnDescriptor};
use crate::error::{OrmError, OrmResult};
use crate::qb::expr::{ColumnStyle, Joiner, WhereClauses, WhereQuery};
use crate::qb::param::ParamList;
use crate::qb::traits::{CompiledQuery, FetchQb, SqlQb};
use crate::record::Record;
use crate::table::{Entity, TableSchema};
use crate::value::{SqlValue, Value};

/// UPDATE builder for table `T`; `returning *` rows hydrate into [`Entity<T>`].
///
/// Set values take the first placeholders, where predicates continue the
/// numbering:
///
/// ```ignore
/// users.update().set(&users.name, "Bob".to_string()).filter(users.id.eq(5));
/// // update users set name=$1 where id = $2 returning *
/// ```
pub struct UpdateQb<T> {
    schema: Arc<TableSchema>,
    sets: Vec<(Arc<ColumnDescriptor>, Value)>,
    clauses: WhereClauses,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for UpdateQb<T> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            sets: self.sets.clone(),
            clauses: self.clauses.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for UpdateQb<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQb")
            .field("table", &self.schema.name())
            .field("sets", &self.sets)
            .field("clauses", &self.clauses)
            .finish()
    }
}

impl<T> UpdateQb<T> {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            sets: Vec::new(),
            clauses: WhereClauses::new(),
            _marker: PhantomData,
        }
    }

    /// Assign a column; setting the same column again replaces the value.
    pub fn set<V: SqlValue>(mut self, column: &Column<T, V>, value: impl Into<V>) -> Self {
        let value = value.into().into_value();
        let existing = self
            .sets
            .iter()
            .position(|(c, _)| c.as_ref() == column.descriptor().as_ref());
        match existing {
            Some(i) => self.sets[i].1 = value,
            None => self.sets.push((Arc::clone(column.descriptor()), value)),
        }
        self
    }

    /// First predicate.
    pub fn filter(mut self, pred: WhereQuery) -> Self {
        self.clauses.first(pred);
        self
    }

    /// Later predicate joined with AND.
    pub fn and_where(mut self, pred: WhereQuery) -> Self {
        self.clauses.push(Joiner::And, pred);
        self
    }

    /// Later predicate joined with OR.
    pub fn or_where(mut self, pred: WhereQuery) -> Self {
        self.clauses.push(Joiner::Or, pred);
        self
    }

    /// Later predicate with an explicit joiner.
    pub fn where_with(mut self, joiner: Joiner, pred: WhereQuery) -> Self {
        self.clauses.push(joiner, pred);
        self
    }
}

impl<T> SqlQb for UpdateQb<T> {
    fn compile(&self) -> OrmResult<CompiledQuery> {
        if self.sets.is_empty() {
            return Err(OrmError::validation(format!(
                "update {} has no set values",
                self.schema.name()
            )));
        }
        self.clauses.check()?;

        let mut params = ParamList::new();
        let sets: Vec<String> = self
            .sets
            .iter()
            .map(|(column, value)| format!("{}=${}", column.name(), params.push(value.clone())))
            .collect();

        let mut sql = format!("update {} set {}", self.schema.name(), sets.join(", "));
        self.clauses.append_where(&mut sql, ColumnStyle::Bare, &mut params);
        sql.push_str(" returning *");

        Ok(CompiledQuery::new(sql, params.into_values()))
    }
}

impl<T> FetchQb for UpdateQb<T> {
    type Output = Entity<T>;

    fn hydrate(&self, record: Record) -> OrmResult<Entity<T>> {
        Entity::from_values(Arc::clone(&self.schema), record)
    }
}
