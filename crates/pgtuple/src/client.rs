//! The connection trait statements are executed through.

use std::future::Future;

use tokio_postgres::types::ToSql;

use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::value::Value;

/// A database connection able to run compiled statements.
///
/// Implemented for `tokio_postgres::Client`, `tokio_postgres::Transaction`
/// and references to any implementor, so builders run the same way inside
/// and outside a transaction.
pub trait Connection: Send + Sync {
    /// Run a statement and return its command status (e.g. `UPDATE 3`).
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<String>> + Send;

    /// Run a query and return all rows.
    fn fetch(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Record>>> + Send;

    /// Run a query and return the first row, if any.
    fn fetch_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Record>>> + Send {
        async move {
            let rows = self.fetch(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }
}

/// Row count from the last whitespace-separated token of a command status.
///
/// Statuses without a count (`CREATE TABLE`) yield 0.
pub fn parse_row_count(status: &str) -> u64 {
    status
        .split_whitespace()
        .next_back()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

/// Rebuild a command status from the statement text and its affected-row count.
///
/// tokio-postgres reports only the count, so the tag is taken from the leading
/// keyword. Commands that carry no count keep just the tag.
pub(crate) fn command_status(sql: &str, rows: u64) -> String {
    let mut words = sql.split_whitespace();
    let tag = words.next().unwrap_or_default().to_ascii_uppercase();
    match tag.as_str() {
        "INSERT" => format!("INSERT 0 {rows}"),
        "UPDATE" | "DELETE" | "SELECT" | "MERGE" | "MOVE" | "FETCH" | "COPY" => {
            format!("{tag} {rows}")
        }
        _ => match words.next() {
            Some(object) => format!("{tag} {}", object.to_ascii_uppercase()),
            None => tag,
        },
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn into_records(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Record>> {
    rows.iter().map(Record::from_row).collect()
}

impl Connection for tokio_postgres::Client {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<String> {
        let rows = tokio_postgres::Client::execute(self, sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        Ok(command_status(sql, rows))
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let rows = tokio_postgres::Client::query(self, sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        into_records(rows)
    }

    async fn fetch_one(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Record>> {
        let row = tokio_postgres::Client::query_opt(self, sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        row.as_ref().map(Record::from_row).transpose()
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<String> {
        let rows = tokio_postgres::Transaction::execute(self, sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        Ok(command_status(sql, rows))
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        into_records(rows)
    }

    async fn fetch_one(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Record>> {
        let row = tokio_postgres::Transaction::query_opt(self, sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        row.as_ref().map(Record::from_row).transpose()
    }
}

impl<C: Connection> Connection for &C {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<String>> + Send {
        (**self).execute(sql, params)
    }

    fn fetch(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Record>>> + Send {
        (**self).fetch(sql, params)
    }

    fn fetch_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Record>>> + Send {
        (**self).fetch_one(sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_from_status() {
        assert_eq!(parse_row_count("UPDATE 3"), 3);
        assert_eq!(parse_row_count("INSERT 0 1"), 1);
        assert_eq!(parse_row_count("DELETE 0"), 0);
        assert_eq!(parse_row_count("CREATE TABLE"), 0);
        assert_eq!(parse_row_count(""), 0);
    }

    #[test]
    fn status_from_statement() {
        assert_eq!(command_status("insert into users (id) values ($1)", 1), "INSERT 0 1");
        assert_eq!(command_status("update users set name=$1", 4), "UPDATE 4");
        assert_eq!(command_status("delete from users", 2), "DELETE 2");
        assert_eq!(command_status("create table users (id integer)", 0), "CREATE TABLE");
    }
}
