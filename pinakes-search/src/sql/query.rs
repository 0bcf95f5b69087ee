//! Abstract query tree
//!
//! Queries are plain owned values built with chaining methods. A query never
//! holds dialect-specific text: rendering happens in [`super::Compiler`].

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// VALUES
// ============================================================================

/// A literal or bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            SqlValue::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(v) => Some(f64::from(*v)),
            SqlValue::BigInt(v) => Some(*v as f64),
            SqlValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::BigInt(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

// ============================================================================
// COLUMNS AND SOURCES
// ============================================================================

/// A possibly qualified column reference such as `t1.id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub qualifier: Option<String>,
    pub name: String,
}

impl Column {
    pub fn new(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Parse `qualifier.name` or a bare `name`.
    pub fn parse(text: &str) -> Self {
        match text.rsplit_once('.') {
            Some((qualifier, name)) => Self::new(qualifier, name),
            None => Self::bare(text),
        }
    }
}

impl From<&str> for Column {
    fn from(text: &str) -> Self {
        Column::parse(text)
    }
}

impl From<String> for Column {
    fn from(text: String) -> Self {
        Column::parse(&text)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}.{}", qualifier, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    Column {
        column: Column,
        alias: Option<String>,
    },
    CountDistinct {
        column: Column,
        alias: String,
    },
}

impl SelectItem {
    /// Name of the output column this item produces.
    pub fn output_name(&self) -> &str {
        match self {
            SelectItem::Column { alias: Some(alias), .. } => alias,
            SelectItem::Column { column, .. } => &column.name,
            SelectItem::CountDistinct { alias, .. } => alias,
        }
    }
}

/// What a query or join reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    Table { name: String, alias: Option<String> },
    SubQuery { query: Box<Query>, alias: String },
}

impl Source {
    pub fn table(name: impl Into<String>) -> Self {
        Source::Table {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Source::Table {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn subquery(query: Query, alias: impl Into<String>) -> Self {
        Source::SubQuery {
            query: Box::new(query),
            alias: alias.into(),
        }
    }

    /// The name other clauses use to qualify this source's columns.
    pub fn reference_name(&self) -> &str {
        match self {
            Source::Table {
                alias: Some(alias), ..
            } => alias,
            Source::Table { name, .. } => name,
            Source::SubQuery { alias, .. } => alias,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A join on a single column equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub source: Source,
    pub left: Column,
    pub right: Column,
}

// ============================================================================
// CONDITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Le,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }
}

/// A `WHERE` condition. Conditions of one query are AND-ed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Compare {
        column: Column,
        op: CompareOp,
        value: SqlValue,
    },
    Columns {
        left: Column,
        op: CompareOp,
        right: Column,
    },
    In {
        column: Column,
        values: Vec<SqlValue>,
    },
    /// `LOWER(column) LIKE pattern`, with `\` escaping `%` and `_`.
    Like { column: Column, pattern: String },
    Regex { column: Column, pattern: String },
    /// Approximate match; `threshold` is a similarity in `0.0..=1.0`.
    Fuzzy {
        column: Column,
        value: String,
        threshold: f64,
    },
    Exists(Box<Query>),
}

impl Condition {
    pub fn eq(column: impl Into<Column>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn compare(column: impl Into<Column>, op: CompareOp, value: impl Into<SqlValue>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn columns_eq(left: impl Into<Column>, right: impl Into<Column>) -> Self {
        Condition::Columns {
            left: left.into(),
            op: CompareOp::Eq,
            right: right.into(),
        }
    }

    pub fn in_list<V: Into<SqlValue>>(
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn like(column: impl Into<Column>, pattern: impl Into<String>) -> Self {
        Condition::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn regex(column: impl Into<Column>, pattern: impl Into<String>) -> Self {
        Condition::Regex {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn fuzzy(column: impl Into<Column>, value: impl Into<String>, threshold: f64) -> Self {
        Condition::Fuzzy {
            column: column.into(),
            value: value.into(),
            threshold,
        }
    }

    pub fn exists(query: Query) -> Self {
        Condition::Exists(Box::new(query))
    }
}

// ============================================================================
// QUERY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOp {
    Union,
    Intersect,
}

/// A named common table expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    pub query: Query,
}

/// A `SELECT` statement, optionally chained with set operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub ctes: Vec<Cte>,
    pub from: Source,
    pub select: Vec<SelectItem>,
    pub distinct: bool,
    pub joins: Vec<Join>,
    pub conditions: Vec<Condition>,
    pub combined: Vec<(SetOp, Query)>,
    pub order_by: Vec<Column>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Query {
    pub fn from_source(from: Source) -> Self {
        Self {
            ctes: Vec::new(),
            from,
            select: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            conditions: Vec::new(),
            combined: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn from_table(name: impl Into<String>) -> Self {
        Self::from_source(Source::table(name))
    }

    pub fn from_aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::from_source(Source::aliased(name, alias))
    }

    pub fn from_subquery(query: Query, alias: impl Into<String>) -> Self {
        Self::from_source(Source::subquery(query, alias))
    }

    pub fn select(mut self, column: impl Into<Column>) -> Self {
        self.select.push(SelectItem::Column {
            column: column.into(),
            alias: None,
        });
        self
    }

    pub fn select_as(mut self, column: impl Into<Column>, alias: impl Into<String>) -> Self {
        self.select.push(SelectItem::Column {
            column: column.into(),
            alias: Some(alias.into()),
        });
        self
    }

    pub fn select_count_distinct(
        mut self,
        column: impl Into<Column>,
        alias: impl Into<String>,
    ) -> Self {
        self.select.push(SelectItem::CountDistinct {
            column: column.into(),
            alias: alias.into(),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(mut self, source: Source, left: impl Into<Column>, right: impl Into<Column>) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            source,
            left: left.into(),
            right: right.into(),
        });
        self
    }

    pub fn left_join(
        mut self,
        source: Source,
        left: impl Into<Column>,
        right: impl Into<Column>,
    ) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            source,
            left: left.into(),
            right: right.into(),
        });
        self
    }

    /// Add a condition unless an equal one is already present.
    pub fn filter(mut self, condition: Condition) -> Self {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
        self
    }

    /// Add a join unless the same source is already joined.
    pub fn join_once(self, source: Source, left: impl Into<Column>, right: impl Into<Column>) -> Self {
        if self
            .joins
            .iter()
            .any(|j| j.source.reference_name() == source.reference_name())
        {
            return self;
        }
        self.join(source, left, right)
    }

    pub fn with(mut self, name: impl Into<String>, query: Query) -> Self {
        self.ctes.push(Cte {
            name: name.into(),
            query,
        });
        self
    }

    pub fn union(mut self, other: Query) -> Self {
        self.combined.push((SetOp::Union, other));
        self
    }

    pub fn intersect(mut self, other: Query) -> Self {
        self.combined.push((SetOp::Intersect, other));
        self
    }

    pub fn order_by(mut self, column: impl Into<Column>) -> Self {
        self.order_by.push(column.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Output column names, in select order.
    pub fn output_names(&self) -> Vec<&str> {
        self.select.iter().map(SelectItem::output_name).collect()
    }
}
