//! Dynamic SQL values and the typed conversions around them.
//!
//! [`Value`] is what compiled statements carry as parameters and what result
//! records carry as column values. [`SqlValue`] connects a Rust type to its
//! [`ValueType`] tag, its default storage type and its nullability.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type};

use crate::error::{OrmError, OrmResult};

/// Value-type tag of a column or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Text,
    Bytes,
    Json,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
}

impl ValueType {
    /// Default PostgreSQL storage type used in `create table`.
    pub fn storage_type(self) -> &'static str {
        match self {
            ValueType::Bool => "boolean",
            ValueType::SmallInt => "smallint",
            ValueType::Int => "integer",
            ValueType::BigInt => "bigint",
            ValueType::Real => "real",
            ValueType::Double => "double precision",
            ValueType::Text => "text",
            ValueType::Bytes => "bytea",
            ValueType::Json => "jsonb",
            ValueType::Uuid => "uuid",
            ValueType::Date => "date",
            ValueType::Timestamp => "timestamp",
            ValueType::TimestampTz => "timestamptz",
        }
    }

    /// PostgreSQL type names whose values bind from and decode into this type.
    fn storage_names(self) -> &'static [&'static str] {
        match self {
            ValueType::Bool => &["boolean", "bool"],
            ValueType::SmallInt => &["smallint", "int2", "smallserial", "serial2"],
            ValueType::Int => &["integer", "int", "int4", "serial", "serial4"],
            ValueType::BigInt => &["bigint", "int8", "bigserial", "serial8"],
            ValueType::Real => &["real", "float4"],
            ValueType::Double => &["double precision", "float8", "float"],
            ValueType::Text => &[
                "text",
                "varchar",
                "character varying",
                "char",
                "character",
                "bpchar",
                "name",
            ],
            ValueType::Bytes => &["bytea"],
            ValueType::Json => &["jsonb", "json"],
            ValueType::Uuid => &["uuid"],
            ValueType::Date => &["date"],
            ValueType::Timestamp => &["timestamp", "timestamp without time zone"],
            ValueType::TimestampTz => &["timestamptz", "timestamp with time zone"],
        }
    }

    /// Whether a column declared as `storage_type` holds values of this type.
    ///
    /// Type modifiers are ignored: `varchar(32)` and `timestamp(3) with time zone`
    /// match on their base names.
    pub fn fits_storage(self, storage_type: &str) -> bool {
        let mut base = String::with_capacity(storage_type.len());
        let mut depth = 0usize;
        for c in storage_type.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if depth == 0 => base.push(c.to_ascii_lowercase()),
                _ => {}
            }
        }
        let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
        self.storage_names().contains(&base.as_str())
    }

    /// Whether a value of type `other` decodes into this type.
    ///
    /// Wider numeric types accept their lossless narrower encodings.
    pub fn accepts(self, other: ValueType) -> bool {
        use ValueType::*;
        self == other
            || matches!(
                (self, other),
                (BigInt, Int | SmallInt) | (Double, Real)
            )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_type())
    }
}

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl Value {
    /// The tag of this value, `None` for NULL.
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ValueType::Bool,
            Value::SmallInt(_) => ValueType::SmallInt,
            Value::Int(_) => ValueType::Int,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Real(_) => ValueType::Real,
            Value::Double(_) => ValueType::Double,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Json(_) => ValueType::Json,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Date(_) => ValueType::Date,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::TimestampTz(_) => ValueType::TimestampTz,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn type_name(&self) -> String {
        match self.value_type() {
            Some(ty) => ty.to_string(),
            None => "NULL".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Json(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::TimestampTz(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Bind a typed value, refusing parameter types the value cannot encode.
fn encode<T: ToSql>(
    value: &T,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if !T::accepts(ty) {
        return Err(format!(
            "cannot bind a {} value to a parameter of type {}",
            std::any::type_name::<T>(),
            ty
        )
        .into());
    }
    value.to_sql(ty, out)
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => encode(v, ty, out),
            Value::SmallInt(v) => encode(v, ty, out),
            Value::Int(v) => encode(v, ty, out),
            Value::BigInt(v) => encode(v, ty, out),
            Value::Real(v) => encode(v, ty, out),
            Value::Double(v) => encode(v, ty, out),
            Value::Text(v) => encode(v, ty, out),
            Value::Bytes(v) => encode(v, ty, out),
            Value::Json(v) => encode(v, ty, out),
            Value::Uuid(v) => encode(v, ty, out),
            Value::Date(v) => encode(v, ty, out),
            Value::Timestamp(v) => encode(v, ty, out),
            Value::TimestampTz(v) => encode(v, ty, out),
        }
    }

    // The concrete check happens per variant in `encode`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// A Rust type that can be stored in a column.
///
/// `Option<V>` marks the column nullable; every other implementation is `not null`.
pub trait SqlValue: Sized + Send + Sync + 'static {
    /// Value-type tag shared by all columns of this Rust type.
    const VALUE_TYPE: ValueType;

    /// Whether the type admits NULL.
    const NULLABLE: bool = false;

    /// Convert into a dynamic value.
    fn into_value(self) -> Value;

    /// Convert from a dynamic value, describing the mismatch on failure.
    fn from_value(value: Value) -> Result<Self, String>;
}

/// Decode a value for `column`, mapping mismatches to [`OrmError::Decode`].
pub fn decode_value<V: SqlValue>(column: &str, value: Value) -> OrmResult<V> {
    V::from_value(value).map_err(|message| OrmError::decode(column, message))
}

fn mismatch(expected: ValueType, got: &Value) -> String {
    match got {
        Value::Null => format!("unexpected NULL for a not null {expected} value"),
        other => format!("expected {expected}, got {}", other.type_name()),
    }
}

macro_rules! impl_sql_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl SqlValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Result<Self, String> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch(ValueType::$variant, &other)),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_sql_value! {
    bool => Bool,
    i16 => SmallInt,
    i32 => Int,
    f32 => Real,
    String => Text,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
    uuid::Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
}

// Wider numeric types also accept lossless narrower encodings (e.g. `count(*)`
// is bigint, `max(smallint_col)` is smallint).
impl SqlValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::BigInt;

    fn into_value(self) -> Value {
        Value::BigInt(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::BigInt(v) => Ok(v),
            Value::Int(v) => Ok(i64::from(v)),
            Value::SmallInt(v) => Ok(i64::from(v)),
            other => Err(mismatch(ValueType::BigInt, &other)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl SqlValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;

    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Double(v) => Ok(v),
            Value::Real(v) => Ok(f64::from(v)),
            other => Err(mismatch(ValueType::Double, &other)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl<V: SqlValue> SqlValue for Option<V> {
    const VALUE_TYPE: ValueType = V::VALUE_TYPE;
    const NULLABLE: bool = true;

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }
}
