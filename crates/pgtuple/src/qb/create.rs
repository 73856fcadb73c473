//! CREATE TABLE from a declared schema.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::OrmResult;
use crate::qb::traits::{CompiledQuery, SqlQb};
use crate::table::TableSchema;

/// DDL builder for table `T`. Binds no parameters.
pub struct CreateQb<T> {
    schema: Arc<TableSchema>,
    if_not_exists: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CreateQb<T> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            if_not_exists: self.if_not_exists,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for CreateQb<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateQb")
            .field("table", &self.schema.name())
            .field("if_not_exists", &self.if_not_exists)
            .finish()
    }
}

impl<T> CreateQb<T> {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            if_not_exists: false,
            _marker: PhantomData,
        }
    }

    /// Emit `create table if not exists`.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }
}

impl<T> SqlQb for CreateQb<T> {
    fn compile(&self) -> OrmResult<CompiledQuery> {
        let defs: Vec<String> = self
            .schema
            .columns()
            .iter()
            .map(|column| {
                let mut def = format!("{} {}", column.name(), column.storage_type());
                if !column.nullable() {
                    def.push_str(" not null");
                }
                if column.is_primary_key() {
                    def.push_str(" primary key");
                }
                if let Some(target) = column.references() {
                    def.push_str(&format!(" references {}({})", target.table(), target.name()));
                }
                def
            })
            .collect();

        let sql = format!(
            "create table {}{} ({})",
            if self.if_not_exists { "if not exists " } else { "" },
            self.schema.name(),
            defs.join(", ")
        );
        Ok(CompiledQuery::new(sql, Vec::new()))
    }
}
