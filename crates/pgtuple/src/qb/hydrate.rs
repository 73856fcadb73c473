//! Splitting flat tuple-projection rows back into their slots.
//!
//! A tuple select aliases every relation column as `table_<relation>_<column>`
//! and every scalar expression as `extra_<ordinal>`, where the ordinal is the
//! slot's position in the projection. Rows come back in projection order, so
//! slots are recovered by walking the row left to right:
//!
//! - a relation slot takes the run of consecutive keys that are aliases of its
//!   own columns, each column at most once;
//! - a scalar slot takes exactly the next key, which must be its alias.
//!
//! Keys are matched against whole aliases, never a prefix, so `users` does not
//! claim the columns of `users_meta`. PostgreSQL folds the unquoted aliases to
//! lower case, so the comparison ignores ASCII case.

use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::table::TableSchema;
use crate::value::Value;

/// Alias of a relation column in a tuple projection.
pub fn relation_alias(relation: &str, column: &str) -> String {
    format!("table_{relation}_{column}")
}

/// Alias of the scalar expression in slot `ordinal`.
pub fn scalar_alias(ordinal: usize) -> String {
    format!("extra_{ordinal}")
}

/// What one projection slot expects.
#[derive(Debug, Clone)]
pub(crate) enum SlotShape {
    Relation(Arc<TableSchema>),
    Scalar,
}

/// The raw content of one slot, ready for typed decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// Column values of one relation, keyed by bare column name.
    Relation {
        schema: Arc<TableSchema>,
        values: Vec<(String, Value)>,
    },
    /// The value of one scalar expression.
    Scalar { alias: String, value: Value },
}

/// The column of `schema` whose alias is `key`, unless the slot already holds it.
fn slot_column(schema: &TableSchema, key: &str, taken: &[(String, Value)]) -> Option<String> {
    schema
        .columns()
        .iter()
        .find(|c| relation_alias(schema.name(), c.name()).eq_ignore_ascii_case(key))
        .map(|c| c.name().to_string())
        .filter(|name| !taken.iter().any(|(seen, _)| seen == name))
}

/// Split `record` into one [`SlotValue`] per slot of `shape`.
pub(crate) fn split_record(shape: &[SlotShape], record: Record) -> OrmResult<Vec<SlotValue>> {
    let mut entries = record.into_iter().peekable();
    let mut slots = Vec::with_capacity(shape.len());

    for (ordinal, slot) in shape.iter().enumerate() {
        match slot {
            SlotShape::Relation(schema) => {
                let mut values: Vec<(String, Value)> = Vec::new();
                while let Some(column) = entries
                    .peek()
                    .and_then(|(key, _)| slot_column(schema, key, &values))
                {
                    if let Some((_, value)) = entries.next() {
                        values.push((column, value));
                    }
                }

                if values.is_empty() {
                    return Err(OrmError::decode(
                        relation_alias(schema.name(), "*"),
                        format!("no columns for relation slot {ordinal}"),
                    ));
                }
                slots.push(SlotValue::Relation {
                    schema: Arc::clone(schema),
                    values,
                });
            }
            SlotShape::Scalar => {
                let alias = scalar_alias(ordinal);
                match entries.next() {
                    Some((key, value)) if key.eq_ignore_ascii_case(&alias) => {
                        slots.push(SlotValue::Scalar { alias, value });
                    }
                    Some((key, _)) => {
                        return Err(OrmError::decode(
                            key,
                            format!("expected scalar slot {alias}"),
                        ));
                    }
                    None => return Err(OrmError::decode(alias, "missing from result row")),
                }
            }
        }
    }

    if let Some((key, _)) = entries.next() {
        return Err(OrmError::decode(key, "not part of the projection"));
    }
    Ok(slots)
}
