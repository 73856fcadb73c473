//! SQL logging through `tracing`.
//!
//! Wrap any [`Connection`] in a [`TracingConnection`] to emit one event per
//! statement on target `pgtuple.sql`. Enable via the crate feature
//! `pgtuple = { features = ["tracing"] }` (on by default).

use std::time::{Duration, Instant};

use tracing::Level;

use crate::client::Connection;
use crate::error::OrmResult;
use crate::record::Record;
use crate::value::Value;

/// Logging knobs for [`TracingConnection`].
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Level for ordinary statements.
    pub level: Level,
    /// Truncate long SQL strings (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements at least this slow are logged at WARN.
    pub slow_query_threshold: Option<Duration>,
    /// Include bound parameter values.
    pub log_params: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_query_threshold: None,
            log_params: false,
        }
    }
}

impl TraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn log_params(mut self, enabled: bool) -> Self {
        self.log_params = enabled;
        self
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.chars().count() > max => {
                let cut: String = sql.chars().take(max).collect();
                format!("{cut}...").into()
            }
            _ => sql.into(),
        }
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold.is_some_and(|t| elapsed >= t)
    }
}

/// A [`Connection`] that logs every statement it runs.
#[derive(Debug, Clone)]
pub struct TracingConnection<C> {
    inner: C,
    config: TraceConfig,
}

impl<C: Connection> TracingConnection<C> {
    pub fn new(inner: C) -> Self {
        Self::with_config(inner, TraceConfig::default())
    }

    pub fn with_config(inner: C, config: TraceConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn emit<T>(
        &self,
        op: &'static str,
        sql: &str,
        params: &[Value],
        elapsed: Duration,
        result: &OrmResult<T>,
        outcome: impl Fn(&T) -> String,
    ) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN => tracing::warn!($($field)*),
                    Level::INFO => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.config.truncate_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let param_count = params.len();
        let params = if self.config.log_params {
            let shown: Vec<String> = params.iter().map(ToString::to_string).collect();
            format!("[{}]", shown.join(", "))
        } else {
            "-".to_string()
        };

        match result {
            Ok(value) => {
                let level = if self.config.is_slow(elapsed) {
                    Level::WARN
                } else {
                    self.config.level
                };
                emit_at_level!(
                    level,
                    target: "pgtuple.sql",
                    op,
                    param_count,
                    params = %params,
                    elapsed_ms,
                    outcome = %outcome(value),
                    "{}",
                    sql
                );
            }
            Err(err) => {
                tracing::error!(
                    target: "pgtuple.sql",
                    op,
                    params = %params,
                    elapsed_ms,
                    error = %err,
                    "{}",
                    sql
                );
            }
        }
    }
}

impl<C: Connection> Connection for TracingConnection<C> {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<String> {
        let start = Instant::now();
        let result = self.inner.execute(sql, params).await;
        self.emit("execute", sql, params, start.elapsed(), &result, |status| {
            status.clone()
        });
        result
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let start = Instant::now();
        let result = self.inner.fetch(sql, params).await;
        self.emit("fetch", sql, params, start.elapsed(), &result, |rows| {
            format!("rows={}", rows.len())
        });
        result
    }

    async fn fetch_one(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Record>> {
        let start = Instant::now();
        let result = self.inner.fetch_one(sql, params).await;
        self.emit("fetch_one", sql, params, start.elapsed(), &result, |row| {
            format!("rows={}", usize::from(row.is_some()))
        });
        result
    }
}
