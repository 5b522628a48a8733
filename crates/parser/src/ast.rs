//! Typed abstract syntax tree for the query language.

use types::Value;

/// A literal with its type known at parse time. This is how the executor
/// recovers the property type without inspecting runtime strings.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Int(i) => Value::Int(*i),
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }
}

/// `(var:Label {key: literal, ...})` with every part optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub label: Option<String>,
    pub properties: Vec<(String, Literal)>,
}

/// `[var:TYPE {key: literal, ...}]` with every part optional at the
/// grammar level; the executor requires the type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelPattern {
    pub variable: Option<String>,
    pub ty: Option<String>,
    pub properties: Vec<(String, Literal)>,
}

/// A node pattern, optionally followed by `-[rel]->(node)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub start: NodePattern,
    pub rel: Option<(RelPattern, NodePattern)>,
}

/// `var.key = literal`, shared by WHERE (predicate) and SET (assignment).
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyExpr {
    pub variable: String,
    pub key: String,
    pub value: Literal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    Create(Vec<Pattern>),
    Match(Vec<Pattern>),
    Where(PropertyExpr),
    Set(Vec<PropertyExpr>),
    Delete(Vec<String>),
    Return(Vec<String>),
}

/// A parsed query: clauses in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}
