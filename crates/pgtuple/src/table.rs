//! Table schemas, the [`Table`] trait and entity instances.
//!
//! A table is declared once, column by column, through a [`TableBuilder`]:
//!
//! ```ignore
//! struct Users {
//!     schema: Arc<TableSchema>,
//!     id: Column<Users, i32>,
//!     name: Column<Users, String>,
//!     age: Column<Users, Option<i32>>,
//! }
//!
//! impl Users {
//!     fn declare() -> OrmResult<Self> {
//!         let mut t = TableBuilder::new("users");
//!         let id = t.column("id", primary())?;
//!         let name = t.column("name", column())?;
//!         let age = t.column("age", default(|| Some(0)))?;
//!         Ok(Self { schema: t.finish()?, id, name, age })
//!     }
//! }
//!
//! impl Table for Users {
//!     fn schema(&self) -> &Arc<TableSchema> {
//!         &self.schema
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::column::{Column, ColumnBuilder, ColumnDescriptor};
use crate::error::{OrmError, OrmResult};
use crate::ident::{IdentKind, MAX_IDENT_LEN, validate_ident};
use crate::qb::{
    CreateQb, DeleteQb, InsertQb, SelectQb, UpdateQb, WhereQuery, relation_alias,
};
use crate::value::{SqlValue, Value, decode_value};

/// Name and ordered columns of one table.
#[derive(Debug)]
pub struct TableSchema {
    name: String,
    columns: Vec<Arc<ColumnDescriptor>>,
}

impl TableSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Arc<ColumnDescriptor>] {
        &self.columns
    }

    /// Look up a column by name.
    ///
    /// Names are written into SQL unquoted, so PostgreSQL reports `userId` back
    /// as `userid`; the folded spelling finds the column too.
    pub fn column(&self, name: &str) -> Option<&Arc<ColumnDescriptor>> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .or_else(|| self.columns.iter().find(|c| c.name().eq_ignore_ascii_case(name)))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }
}

impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.columns == other.columns
    }
}

/// Declares a [`TableSchema`] one column at a time.
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    columns: Vec<Arc<ColumnDescriptor>>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Attach a column named `name`, returning its typed handle.
    pub fn column<T, V: SqlValue>(
        &mut self,
        name: &str,
        builder: ColumnBuilder<V>,
    ) -> OrmResult<Column<T, V>> {
        if self.columns.iter().any(|c| c.name().eq_ignore_ascii_case(name)) {
            return Err(OrmError::configuration(format!(
                "duplicate column '{name}' in table '{}'",
                self.name
            )));
        }
        let column: Column<T, V> = builder.name(name).table(self.name.as_str()).build()?;

        let alias = relation_alias(&self.name, name);
        if alias.len() > MAX_IDENT_LEN {
            return Err(OrmError::configuration(format!(
                "join alias '{alias}' of {}.{name} is longer than {MAX_IDENT_LEN} bytes",
                self.name
            )));
        }
        self.columns.push(Arc::clone(column.descriptor()));
        Ok(column)
    }

    pub fn finish(self) -> OrmResult<Arc<TableSchema>> {
        validate_ident(IdentKind::Table, &self.name)?;
        if self.columns.is_empty() {
            return Err(OrmError::configuration(format!(
                "table '{}' has no columns",
                self.name
            )));
        }
        Ok(Arc::new(TableSchema {
            name: self.name,
            columns: self.columns,
        }))
    }
}

/// A declared table and the entry point to its statement builders.
pub trait Table: Sized + Send + Sync + 'static {
    fn schema(&self) -> &Arc<TableSchema>;

    fn select(&self) -> SelectQb<Self> {
        SelectQb::new(Arc::clone(self.schema()))
    }

    /// `select` with a first predicate.
    fn filter(&self, pred: WhereQuery) -> SelectQb<Self> {
        self.select().filter(pred)
    }

    fn update(&self) -> UpdateQb<Self> {
        UpdateQb::new(Arc::clone(self.schema()))
    }

    fn delete(&self) -> DeleteQb<Self> {
        DeleteQb::new(Arc::clone(self.schema()))
    }

    fn create(&self) -> CreateQb<Self> {
        CreateQb::new(Arc::clone(self.schema()))
    }

    /// An empty instance to fill in before inserting.
    fn entity(&self) -> Entity<Self> {
        Entity::new(Arc::clone(self.schema()))
    }
}

/// One row of table `T`: column name to value.
///
/// Instances built by the caller may leave columns unset (inserts fall back
/// to column defaults); instances hydrated from results carry every column.
pub struct Entity<T> {
    schema: Arc<TableSchema>,
    values: HashMap<String, Value>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Entity<T> {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Build from result values, which must cover exactly the schema's columns.
    pub fn from_values(
        schema: Arc<TableSchema>,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> OrmResult<Self> {
        let mut map = HashMap::with_capacity(schema.columns().len());
        for (key, value) in values {
            let Some(column) = schema.column(&key) else {
                return Err(OrmError::decode(
                    key,
                    format!("not a column of table '{}'", schema.name()),
                ));
            };
            let name = column.name().to_string();
            match value.value_type() {
                None if !column.nullable() => {
                    return Err(OrmError::decode(name, "unexpected NULL in a not null column"));
                }
                Some(ty) if !column.value_type().accepts(ty) => {
                    return Err(OrmError::decode(
                        name,
                        format!("expected {}, got {ty}", column.value_type()),
                    ));
                }
                _ => {}
            }
            if map.insert(name.clone(), value).is_some() {
                return Err(OrmError::decode(name, "column appears twice in one row"));
            }
        }
        if let Some(missing) = schema.column_names().find(|c| !map.contains_key(*c)) {
            return Err(OrmError::decode(
                missing,
                format!("missing from result row for table '{}'", schema.name()),
            ));
        }
        Ok(Self {
            schema,
            values: map,
            _marker: PhantomData,
        })
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn get<V: SqlValue>(&self, column: &Column<T, V>) -> OrmResult<V> {
        match self.values.get(column.name()) {
            Some(v) => decode_value(column.name(), v.clone()),
            None if V::NULLABLE => decode_value(column.name(), Value::Null),
            None => Err(OrmError::decode(column.name(), "value is not set")),
        }
    }

    pub fn set<V: SqlValue>(&mut self, column: &Column<T, V>, value: impl Into<V>) -> &mut Self {
        self.values
            .insert(column.name().to_string(), value.into().into_value());
        self
    }

    /// Chained form of [`set`](Self::set).
    pub fn with<V: SqlValue>(mut self, column: &Column<T, V>, value: impl Into<V>) -> Self {
        self.set(column, value);
        self
    }

    /// Raw value of a column, if set.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set values in schema column order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .columns()
            .iter()
            .filter_map(|c| self.values.get(c.name()).map(|v| (c.name(), v)))
    }

    pub fn insert(&self) -> InsertQb<T> {
        InsertQb::new(self.clone())
    }
}

impl<T> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            values: self.values.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Entity<T> {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl<T> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (name, value) in self.values() {
            s.field(name, value);
        }
        s.finish()
    }
}

impl<T> Serialize for Entity<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.values() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
