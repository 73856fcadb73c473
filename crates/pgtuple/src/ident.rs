//! SQL identifier checks for declared table and column names.
//!
//! Builders splice table and column names into SQL text unquoted, so every name
//! must match `[A-Za-z_][A-Za-z0-9_$]*`. Violations are configuration errors
//! raised while the schema is declared, never while a query is compiled.

use crate::error::{OrmError, OrmResult};

/// Which kind of name is being checked (used in error messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Table,
    Column,
}

impl IdentKind {
    fn label(self) -> &'static str {
        match self {
            IdentKind::Table => "table",
            IdentKind::Column => "column",
        }
    }
}

/// Longest identifier PostgreSQL keeps; longer ones are silently truncated.
pub const MAX_IDENT_LEN: usize = 63;

/// Validate a bare (unquoted, undotted) identifier.
pub fn validate_ident(kind: IdentKind, name: &str) -> OrmResult<()> {
    let mut chars = name.chars();

    match chars.next() {
        None => {
            return Err(OrmError::configuration(format!(
                "{} name cannot be empty",
                kind.label()
            )));
        }
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(OrmError::configuration(format!(
                "invalid start character '{c}' in {} name '{name}'",
                kind.label()
            )));
        }
    }

    if let Some(c) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(OrmError::configuration(format!(
            "invalid character '{c}' in {} name '{name}'",
            kind.label()
        )));
    }

    if name.len() > MAX_IDENT_LEN {
        return Err(OrmError::configuration(format!(
            "{} name '{name}' is longer than {MAX_IDENT_LEN} bytes",
            kind.label()
        )));
    }

    Ok(())
}
