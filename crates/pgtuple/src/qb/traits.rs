//! Trait definitions for query builders.

use std::future::Future;

use crate::client::{Connection, parse_row_count};
use crate::error::OrmResult;
use crate::record::Record;
use crate::value::Value;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

/// Base trait for all statement builders.
pub trait SqlQb: Sync {
    /// Compile the current state.
    ///
    /// Pure: the same state always compiles to the same text and parameters.
    /// Builder misuse recorded while chaining is returned here as
    /// [`OrmError::Validation`](crate::OrmError::Validation).
    fn compile(&self) -> OrmResult<CompiledQuery>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> OrmResult<String> {
        self.compile().map(|q| q.sql)
    }

    /// Run the statement and return the affected-row count.
    ///
    /// The count is read from the connection's command status; statuses that
    /// carry none (DDL) give 0.
    fn execute(&self, conn: &impl Connection) -> impl Future<Output = OrmResult<u64>> + Send {
        async move {
            let query = self.compile()?;
            let status = conn.execute(&query.sql, &query.params).await?;
            Ok(parse_row_count(&status))
        }
    }
}

/// Builders whose rows hydrate into typed results.
pub trait FetchQb: SqlQb {
    type Output: Send;

    /// Decode one result row.
    fn hydrate(&self, record: Record) -> OrmResult<Self::Output>;

    /// Run and hydrate every row.
    fn fetch(
        &self,
        conn: &impl Connection,
    ) -> impl Future<Output = OrmResult<Vec<Self::Output>>> + Send {
        async move {
            let query = self.compile()?;
            let rows = conn.fetch(&query.sql, &query.params).await?;
            rows.into_iter().map(|r| self.hydrate(r)).collect()
        }
    }

    /// Run and hydrate the first row; `None` when there is no row.
    fn fetch_one(
        &self,
        conn: &impl Connection,
    ) -> impl Future<Output = OrmResult<Option<Self::Output>>> + Send {
        async move {
            let query = self.compile()?;
            let row = conn.fetch_one(&query.sql, &query.params).await?;
            row.map(|r| self.hydrate(r)).transpose()
        }
    }
}
