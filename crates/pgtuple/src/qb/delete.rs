//! DELETE builder.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::OrmResult;
use crate::qb::expr::{ColumnStyle, Joiner, WhereClauses, WhereQuery};
use crate::qb::param::ParamList;
use crate::qb::traits::{CompiledQuery, SqlQb};
use crate::table::TableSchema;

/// DELETE builder for table `T`.
///
/// Without predicates every row is deleted. [`SqlQb::execute`] returns the
/// number of deleted rows.
pub struct DeleteQb<T> {
    schema: Arc<TableSchema>,
    clauses: WhereClauses,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DeleteQb<T> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            clauses: self.clauses.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for DeleteQb<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteQb")
            .field("table", &self.schema.name())
            .field("clauses", &self.clauses)
            .finish()
    }
}

impl<T> DeleteQb<T> {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            clauses: WhereClauses::new(),
            _marker: PhantomData,
        }
    }

    pub fn filter(mut self, pred: WhereQuery) -> Self {
        self.clauses.first(pred);
        self
    }

    pub fn and_where(mut self, pred: WhereQuery) -> Self {
        self.clauses.push(Joiner::And, pred);
        self
    }

    pub fn or_where(mut self, pred: WhereQuery) -> Self {
        self.clauses.push(Joiner::Or, pred);
        self
    }

    pub fn where_with(mut self, joiner: Joiner, pred: WhereQuery) -> Self {
        self.clauses.push(joiner, pred);
        self
    }
}

impl<T> SqlQb for DeleteQb<T> {
    fn compile(&self) -> OrmResult<CompiledQuery> {
        self.clauses.check()?;

        let mut params = ParamList::new();
        let mut sql = format!("delete from {}", self.schema.name());
        self.clauses.append_where(&mut sql, ColumnStyle::Bare, &mut params);

        Ok(CompiledQuery::new(sql, params.into_values()))
    }
}
