//! Predicates and clause groups for WHERE / JOIN ON conditions.
//!
//! A [`WhereQuery`] compares a column either with a literal, which binds the
//! next `$n` placeholder, or with another column, which renders as a fully
//! qualified reference and binds nothing. [`WhereClauses`] keeps the ordered
//! `(joiner, predicate)` pairs of one builder and checks the call sequence.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::column::ColumnDescriptor;
use crate::error::{OrmError, OrmResult};
use crate::qb::param::ParamList;
use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Le,
    Ne,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Ne => "!=",
        }
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound as a parameter.
    Value(Value),
    /// Rendered as `table.column`.
    Column(Arc<ColumnDescriptor>),
}

/// How the left-hand column of a predicate is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStyle {
    /// `name`, for statements over a single table.
    Bare,
    /// `table.name`, for joined selects.
    Qualified,
}

impl ColumnStyle {
    pub(crate) fn render(self, column: &ColumnDescriptor) -> String {
        match self {
            ColumnStyle::Bare => column.name().to_string(),
            ColumnStyle::Qualified => column.full_name(),
        }
    }
}

/// One comparison: `column op value`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereQuery {
    column: Arc<ColumnDescriptor>,
    value: Operand,
    op: Op,
}

impl WhereQuery {
    /// Compare with a literal.
    pub fn literal(column: Arc<ColumnDescriptor>, op: Op, value: Value) -> Self {
        Self {
            column,
            value: Operand::Value(value),
            op,
        }
    }

    /// Compare with another column.
    pub fn column(column: Arc<ColumnDescriptor>, op: Op, other: Arc<ColumnDescriptor>) -> Self {
        Self {
            column,
            value: Operand::Column(other),
            op,
        }
    }

    pub fn target(&self) -> &Arc<ColumnDescriptor> {
        &self.column
    }

    pub fn value(&self) -> &Operand {
        &self.value
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// Whether compiling this predicate binds a parameter.
    pub fn binds_param(&self) -> bool {
        matches!(self.value, Operand::Value(_))
    }

    /// Render into SQL, pushing a literal onto `params`.
    pub fn build(&self, style: ColumnStyle, params: &mut ParamList) -> String {
        let lhs = style.render(&self.column);
        let rhs = match &self.value {
            Operand::Value(v) => format!("${}", params.push(v.clone())),
            Operand::Column(c) => c.full_name(),
        };
        format!("{} {} {}", lhs, self.op.as_sql(), rhs)
    }
}

/// Logical connective between a predicate and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn as_sql(self) -> &'static str {
        match self {
            Joiner::And => "and",
            Joiner::Or => "or",
        }
    }
}

impl fmt::Display for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Joiner {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" | "AND" => Ok(Joiner::And),
            "or" | "OR" => Ok(Joiner::Or),
            other => Err(OrmError::validation(format!(
                "unknown joiner '{other}', expected and/or"
            ))),
        }
    }
}

/// Ordered clause groups of one builder.
///
/// The first predicate goes in through [`first`](Self::first) and every later
/// one through [`push`](Self::push) with an explicit joiner. A call out of
/// sequence is remembered and returned by [`check`](Self::check).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClauses {
    clauses: Vec<(Joiner, WhereQuery)>,
    error: Option<String>,
}

impl WhereClauses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Joiner, WhereQuery)> {
        self.clauses.iter()
    }

    /// Add the first predicate.
    pub fn first(&mut self, pred: WhereQuery) {
        if !self.clauses.is_empty() && self.error.is_none() {
            self.error = Some(format!(
                "filter({}) is not the first predicate; use and_where/or_where",
                pred.column.full_name()
            ));
        }
        self.clauses.push((Joiner::And, pred));
    }

    /// Add a later predicate with its joiner.
    pub fn push(&mut self, joiner: Joiner, pred: WhereQuery) {
        if self.clauses.is_empty() && self.error.is_none() {
            self.error = Some(format!(
                "{joiner}_where({}) has no preceding predicate; use filter first",
                pred.column.full_name()
            ));
        }
        self.clauses.push((joiner, pred));
    }

    /// Surface a misordered call sequence.
    pub fn check(&self) -> OrmResult<()> {
        match &self.error {
            Some(e) => Err(OrmError::validation(e.clone())),
            None => Ok(()),
        }
    }

    /// Render `a = $1 and b < $2 ...`; empty when there are no clauses.
    ///
    /// The first joiner is never emitted.
    pub fn build(&self, style: ColumnStyle, params: &mut ParamList) -> String {
        let mut sql = String::new();
        for (i, (joiner, pred)) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(joiner.as_sql());
                sql.push(' ');
            }
            sql.push_str(&pred.build(style, params));
        }
        sql
    }

    /// Append ` where ...` to `sql` if there is anything to filter on.
    pub(crate) fn append_where(&self, sql: &mut String, style: ColumnStyle, params: &mut ParamList) {
        if self.is_empty() {
            return;
        }
        sql.push_str(" where ");
        sql.push_str(&self.build(style, params));
    }
}
