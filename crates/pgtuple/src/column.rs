//! Column descriptors, typed column handles and the column builder.
//!
//! A [`ColumnDescriptor`] is the immutable metadata of one table field. It is
//! created once through a [`ColumnBuilder`] while the table is declared and is
//! shared (never copied) by every builder and predicate that mentions it.
//!
//! [`Column<T, V>`] is the typed handle users hold: `T` is the declaring table
//! type and `V` the Rust value type. Comparisons on it produce [`WhereQuery`]s:
//!
//! ```ignore
//! users.id.eq(5)               // users.id = $n
//! orders.user_id.eq_col(&users.id) // orders.user_id = users.id
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::ident::{IdentKind, validate_ident};
use crate::qb::expr::{Op, WhereQuery};
use crate::value::{SqlValue, Value, ValueType};

/// Produces a column's value when an inserted entity leaves it unset.
pub type DefaultProvider = Arc<dyn Fn() -> Value + Send + Sync>;

/// Immutable metadata for one table field.
pub struct ColumnDescriptor {
    table: String,
    name: String,
    value_type: ValueType,
    storage_type: String,
    default: Option<DefaultProvider>,
    nullable: bool,
    primary: bool,
    references: Option<Arc<ColumnDescriptor>>,
}

impl ColumnDescriptor {
    /// Name of the owning table.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `table.column`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Storage type emitted by `create table` (e.g. `integer`, `text`).
    pub fn storage_type(&self) -> &str {
        &self.storage_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary
    }

    /// Invoke the default provider, if any.
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(|provider| provider())
    }

    /// The column this one references (foreign key).
    pub fn references(&self) -> Option<&Arc<ColumnDescriptor>> {
        self.references.as_ref()
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("table", &self.table)
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("storage_type", &self.storage_type)
            .field("has_default", &self.default.is_some())
            .field("nullable", &self.nullable)
            .field("primary", &self.primary)
            .field(
                "references",
                &self.references.as_ref().map(|r| r.full_name()),
            )
            .finish()
    }
}

// Descriptors are identified by where they live.
impl PartialEq for ColumnDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.name == other.name
    }
}

/// Typed handle to a column of table `T` holding values of type `V`.
pub struct Column<T, V> {
    desc: Arc<ColumnDescriptor>,
    _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V> Clone for Column<T, V> {
    fn clone(&self) -> Self {
        Self {
            desc: Arc::clone(&self.desc),
            _marker: PhantomData,
        }
    }
}

impl<T, V> fmt::Debug for Column<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.desc.full_name()).finish()
    }
}

impl<T, V> Column<T, V> {
    pub(crate) fn from_descriptor(desc: Arc<ColumnDescriptor>) -> Self {
        Self {
            desc,
            _marker: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &Arc<ColumnDescriptor> {
        &self.desc
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn full_name(&self) -> String {
        self.desc.full_name()
    }

    fn compare_col<U, W>(&self, op: Op, other: &Column<U, W>) -> WhereQuery {
        WhereQuery::column(Arc::clone(&self.desc), op, Arc::clone(&other.desc))
    }

    /// `self = other` (column-to-column, binds no parameter)
    pub fn eq_col<U, W>(&self, other: &Column<U, W>) -> WhereQuery {
        self.compare_col(Op::Eq, other)
    }

    /// `self != other`
    pub fn ne_col<U, W>(&self, other: &Column<U, W>) -> WhereQuery {
        self.compare_col(Op::Ne, other)
    }

    /// `self < other`
    pub fn lt_col<U, W>(&self, other: &Column<U, W>) -> WhereQuery {
        self.compare_col(Op::Lt, other)
    }

    /// `self <= other`
    pub fn le_col<U, W>(&self, other: &Column<U, W>) -> WhereQuery {
        self.compare_col(Op::Le, other)
    }
}

impl<T, V: SqlValue> Column<T, V> {
    fn compare(&self, op: Op, value: V) -> WhereQuery {
        WhereQuery::literal(Arc::clone(&self.desc), op, value.into_value())
    }

    /// `self = $n`
    pub fn eq(&self, value: impl Into<V>) -> WhereQuery {
        self.compare(Op::Eq, value.into())
    }

    /// `self != $n`
    pub fn ne(&self, value: impl Into<V>) -> WhereQuery {
        self.compare(Op::Ne, value.into())
    }

    /// `self < $n`
    pub fn lt(&self, value: impl Into<V>) -> WhereQuery {
        self.compare(Op::Lt, value.into())
    }

    /// `self <= $n`
    pub fn le(&self, value: impl Into<V>) -> WhereQuery {
        self.compare(Op::Le, value.into())
    }
}

/// `column = value`
pub fn eq<T, V: SqlValue>(column: &Column<T, V>, value: impl Into<V>) -> WhereQuery {
    column.eq(value)
}

/// `column != value`
pub fn ne<T, V: SqlValue>(column: &Column<T, V>, value: impl Into<V>) -> WhereQuery {
    column.ne(value)
}

/// `column < value`
pub fn lt<T, V: SqlValue>(column: &Column<T, V>, value: impl Into<V>) -> WhereQuery {
    column.lt(value)
}

/// `column <= value`
pub fn le<T, V: SqlValue>(column: &Column<T, V>, value: impl Into<V>) -> WhereQuery {
    column.le(value)
}

/// Builder for a [`ColumnDescriptor`].
///
/// The value type comes from `V`; name and table must be supplied before
/// [`ColumnBuilder::build`]. [`TableBuilder::column`](crate::table::TableBuilder::column)
/// fills both in.
pub struct ColumnBuilder<V> {
    name: Option<String>,
    table: Option<String>,
    storage_type: Option<String>,
    default: Option<DefaultProvider>,
    primary: bool,
    foreign: Option<Arc<ColumnDescriptor>>,
    _marker: PhantomData<fn() -> V>,
}

impl<V: SqlValue> Default for ColumnBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SqlValue> ColumnBuilder<V> {
    pub fn new() -> Self {
        Self {
            name: None,
            table: None,
            storage_type: None,
            default: None,
            primary: false,
            foreign: None,
            _marker: PhantomData,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Override the storage type (defaults to the value type's natural one).
    pub fn storage_type(mut self, storage_type: impl Into<String>) -> Self {
        self.storage_type = Some(storage_type.into());
        self
    }

    /// Value used by inserts that leave this column unset.
    pub fn default(mut self, provider: impl Fn() -> V + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(move || provider().into_value()));
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Reference another column; its value type must match at [`build`](Self::build).
    pub fn foreign<U, W>(mut self, column: &Column<U, W>) -> Self {
        self.foreign = Some(Arc::clone(column.descriptor()));
        self
    }

    /// Reference a column by descriptor.
    pub fn references(mut self, column: Arc<ColumnDescriptor>) -> Self {
        self.foreign = Some(column);
        self
    }

    /// Build the untyped descriptor.
    pub fn build_descriptor(self) -> OrmResult<ColumnDescriptor> {
        let name = self
            .name
            .ok_or_else(|| OrmError::configuration("column has no name"))?;
        let table = self
            .table
            .ok_or_else(|| OrmError::configuration(format!("column '{name}' has no table")))?;

        validate_ident(IdentKind::Table, &table)?;
        validate_ident(IdentKind::Column, &name)?;

        let storage_type = match self.storage_type {
            Some(ty) => {
                let valid = ty
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || " _(),".contains(c));
                if !valid || !V::VALUE_TYPE.fits_storage(&ty) {
                    return Err(OrmError::configuration(format!(
                        "{table}.{name}: storage type '{ty}' cannot hold {} values",
                        V::VALUE_TYPE
                    )));
                }
                ty
            }
            None => V::VALUE_TYPE.storage_type().to_string(),
        };

        if let Some(foreign) = &self.foreign {
            if foreign.value_type() != V::VALUE_TYPE {
                return Err(OrmError::configuration(format!(
                    "{table}.{name} ({}) does not match the foreign key type of {} ({})",
                    V::VALUE_TYPE,
                    foreign.full_name(),
                    foreign.value_type()
                )));
            }
        }

        Ok(ColumnDescriptor {
            table,
            name,
            value_type: V::VALUE_TYPE,
            storage_type,
            default: self.default,
            nullable: V::NULLABLE,
            primary: self.primary,
            references: self.foreign,
        })
    }

    /// Build a typed column handle owned by table type `T`.
    pub fn build<T>(self) -> OrmResult<Column<T, V>> {
        Ok(Column::from_descriptor(Arc::new(self.build_descriptor()?)))
    }
}

/// A plain column builder.
pub fn column<V: SqlValue>() -> ColumnBuilder<V> {
    ColumnBuilder::new()
}

/// A primary key column builder.
pub fn primary<V: SqlValue>() -> ColumnBuilder<V> {
    ColumnBuilder::new().primary()
}

/// A column builder referencing `column`.
pub fn foreign<V: SqlValue, U, W>(column: &Column<U, W>) -> ColumnBuilder<V> {
    ColumnBuilder::new().foreign(column)
}

/// A column builder with a default provider.
pub fn default<V: SqlValue>(provider: impl Fn() -> V + Send + Sync + 'static) -> ColumnBuilder<V> {
    ColumnBuilder::new().default(provider)
}
