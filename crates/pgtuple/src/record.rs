//! Result rows as ordered `alias -> value` mappings.

use serde::Serialize;
use serde::ser::SerializeMap;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// One result row.
///
/// Entries keep the left-to-right order of the SQL projection; hydration of
/// tuple results depends on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((column.into(), value.into()));
    }

    /// First value stored under `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Convert a tokio-postgres row, decoding each column by its wire type.
    pub fn from_row(row: &Row) -> OrmResult<Self> {
        let mut entries = Vec::with_capacity(row.len());
        for (i, col) in row.columns().iter().enumerate() {
            let name = col.name();
            let value = match *col.type_() {
                Type::BOOL => get::<bool>(row, i, name)?.map_or(Value::Null, Value::Bool),
                Type::INT2 => get::<i16>(row, i, name)?.map_or(Value::Null, Value::SmallInt),
                Type::INT4 => get::<i32>(row, i, name)?.map_or(Value::Null, Value::Int),
                Type::INT8 => get::<i64>(row, i, name)?.map_or(Value::Null, Value::BigInt),
                Type::FLOAT4 => get::<f32>(row, i, name)?.map_or(Value::Null, Value::Real),
                Type::FLOAT8 => get::<f64>(row, i, name)?.map_or(Value::Null, Value::Double),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    get::<String>(row, i, name)?.map_or(Value::Null, Value::Text)
                }
                Type::BYTEA => get::<Vec<u8>>(row, i, name)?.map_or(Value::Null, Value::Bytes),
                Type::JSON | Type::JSONB => {
                    get::<serde_json::Value>(row, i, name)?.map_or(Value::Null, Value::Json)
                }
                Type::UUID => get::<uuid::Uuid>(row, i, name)?.map_or(Value::Null, Value::Uuid),
                Type::DATE => {
                    get::<chrono::NaiveDate>(row, i, name)?.map_or(Value::Null, Value::Date)
                }
                Type::TIMESTAMP => get::<chrono::NaiveDateTime>(row, i, name)?
                    .map_or(Value::Null, Value::Timestamp),
                Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, i, name)?
                    .map_or(Value::Null, Value::TimestampTz),
                ref other => {
                    return Err(OrmError::decode(
                        name,
                        format!("unsupported column type {other}"),
                    ));
                }
            };
            entries.push((name.to_string(), value));
        }
        Ok(Self { entries })
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize, column: &str) -> OrmResult<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| OrmError::decode(column, e.to_string()))
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
