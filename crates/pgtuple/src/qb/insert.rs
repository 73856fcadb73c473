//! INSERT of one entity.

use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::qb::param::ParamList;
use crate::qb::traits::{CompiledQuery, SqlQb};
use crate::table::Entity;

/// INSERT builder for one [`Entity<T>`].
///
/// Every column of the table is written, in declaration order. A column left
/// unset on the entity takes its default provider's value. An unset column
/// without a provider fails to compile, nullable or not; declare it with
/// `default(|| None)` to write NULL when it is left out.
pub struct InsertQb<T> {
    entity: Entity<T>,
}

impl<T> Clone for InsertQb<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
        }
    }
}

impl<T> std::fmt::Debug for InsertQb<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertQb").field("entity", &self.entity).finish()
    }
}

impl<T> InsertQb<T> {
    pub fn new(entity: Entity<T>) -> Self {
        Self { entity }
    }

    /// Run and return the inserted row.
    ///
    /// An insert always returns its own row; getting none back is reported as
    /// [`OrmError::Invariant`].
    pub async fn fetch_one(&self, conn: &impl Connection) -> OrmResult<Entity<T>> {
        let query = self.compile()?;
        let row = conn.fetch_one(&query.sql, &query.params).await?;
        match row {
            Some(record) => Entity::from_values(std::sync::Arc::clone(self.entity.schema()), record),
            None => Err(OrmError::Invariant(format!(
                "insert into {} returned no row",
                self.entity.schema().name()
            ))),
        }
    }

    /// Run and return every returned row.
    pub async fn fetch(&self, conn: &impl Connection) -> OrmResult<Vec<Entity<T>>> {
        let query = self.compile()?;
        let rows = conn.fetch(&query.sql, &query.params).await?;
        rows.into_iter()
            .map(|r| Entity::from_values(std::sync::Arc::clone(self.entity.schema()), r))
            .collect()
    }
}

impl<T> SqlQb for InsertQb<T> {
    fn compile(&self) -> OrmResult<CompiledQuery> {
        let schema = self.entity.schema();
        let mut params = ParamList::new();
        let mut names = Vec::with_capacity(schema.columns().len());
        let mut placeholders = Vec::with_capacity(schema.columns().len());

        for column in schema.columns() {
            let value = match self.entity.value(column.name()) {
                Some(v) => v.clone(),
                None => match column.default_value() {
                    Some(v) => v,
                    None => {
                        return Err(OrmError::validation(format!(
                            "insert into {}: column '{}' has no value and no default",
                            schema.name(),
                            column.name()
                        )));
                    }
                },
            };
            names.push(column.name());
            placeholders.push(format!("${}", params.push(value)));
        }

        let sql = format!(
            "insert into {} ({}) values ({}) returning *",
            schema.name(),
            names.join(", "),
            placeholders.join(", ")
        );
        Ok(CompiledQuery::new(sql, params.into_values()))
    }
}
