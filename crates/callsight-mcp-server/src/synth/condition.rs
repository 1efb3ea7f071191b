//! Where-clause expression tree.
//!
//! Queries are composed from condition nodes instead of ad hoc string
//! concatenation so that quoting and escaping live in exactly one place.
//! Whether a literal renders quoted or bare is decided when the condition
//! is built, from the field's declared type, never from the runtime shape
//! of the value.

use std::fmt;

/// A typed literal in a filter position.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// Quoted, escaped string literal.
    Str(String),
    /// Bare enum identifier. Surrounding quotes from the caller are
    /// stripped at construction; the boundary layer cannot be trusted to
    /// pass bare values.
    Enum(String),
    Int(i64),
    Float(f64),
    IntList(Vec<i64>),
    Bool(bool),
}

impl Literal {
    pub fn enum_value(raw: &str) -> Self {
        Literal::Enum(strip_quotes(raw).to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(value) => write!(f, "\"{}\"", escape_string(value)),
            Literal::Enum(value) => write!(f, "{value}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value}"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::IntList(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Comparison operators supported by the downstream filter grammar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Op {
    Eq,
    Ilike,
    In,
    Gte,
    Lte,
    IsNull,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "_eq",
            Op::Ilike => "_ilike",
            Op::In => "_in",
            Op::Gte => "_gte",
            Op::Lte => "_lte",
            Op::IsNull => "_is_null",
        }
    }
}

/// A logical fragment of a `where` clause: a leaf comparison, a combinator
/// over nested conditions, or a nested relation scope.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Leaf {
        field: String,
        op: Op,
        value: Literal,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    /// Scope a condition under a relation field, e.g.
    /// `interview: {started_at: {_gte: ...}}`.
    Nested { field: String, inner: Box<Condition> },
}

impl Condition {
    pub fn leaf(field: impl Into<String>, op: Op, value: Literal) -> Self {
        Condition::Leaf {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn nested(field: impl Into<String>, inner: Condition) -> Self {
        Condition::Nested {
            field: field.into(),
            inner: Box::new(inner),
        }
    }

    /// Case-insensitive contains search on a text field.
    pub fn contains(field: impl Into<String>, phrase: &str) -> Self {
        Condition::leaf(field, Op::Ilike, Literal::Str(format!("%{phrase}%")))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf { field, op, value } => {
                write!(f, "{field}: {{{}: {value}}}", op.as_str())
            }
            Condition::And(conditions) => write_combinator(f, "_and", conditions),
            Condition::Or(conditions) => write_combinator(f, "_or", conditions),
            Condition::Nested { field, inner } => write!(f, "{field}: {{{inner}}}"),
        }
    }
}

fn write_combinator(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    conditions: &[Condition],
) -> fmt::Result {
    write!(f, "{keyword}: [")?;
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{{{condition}}}")?;
    }
    write!(f, "]")
}

/// Render a list of top-level conditions as the body of a `where` argument.
pub fn render_where(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}
