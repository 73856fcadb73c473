//! Positional parameter storage shared by every clause of one statement.

use crate::value::Value;

/// Parameters of one statement, in placeholder order.
///
/// `push` hands out the next `$n`, so clauses compiled one after another into
/// the same list never restart numbering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.params
    }
}
