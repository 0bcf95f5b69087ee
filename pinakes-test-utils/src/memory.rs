//! In-memory query evaluation
//!
//! [`MemoryDatabase`] evaluates query trees directly, without rendering
//! SQL: sources, CTEs, inner and left joins, correlated `EXISTS`, set
//! operations, ordering and paging. Text comparisons follow the compiled
//! SQL: LIKE lowercases the column, fuzzy matching uses trigram similarity.

use async_trait::async_trait;
use pinakes_core::{PinakesError, PinakesResult};
use pinakes_search::sql::{
    Column, CompareOp, Compiler, Condition, Dialect, JoinKind, Query, SelectItem, SetOp, Source,
    SqlValue,
};
use pinakes_search::{QueryExecutor, SqlRow};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

// ============================================================================
// DATABASE
// ============================================================================

/// Named tables of rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: BTreeMap<String, Vec<SqlRow>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `table` exists, possibly empty.
    pub fn create_table(&mut self, table: &str) {
        self.tables.entry(table.to_string()).or_default();
    }

    pub fn insert(&mut self, table: &str, row: SqlRow) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn rows(&self, table: &str) -> &[SqlRow] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn evaluate(&self, query: &Query) -> PinakesResult<Vec<SqlRow>> {
        Evaluator { db: self }.query(query, &HashMap::new(), &[])
    }
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// Query executor over a [`MemoryDatabase`].
///
/// The dialect only decides how the search engine shapes its queries; the
/// evaluation is the same for both. Every fetched query is recorded in its
/// rendered form.
pub struct MemoryExecutor {
    db: MemoryDatabase,
    dialect: Dialect,
    executed: Mutex<Vec<String>>,
}

impl MemoryExecutor {
    pub fn new(db: MemoryDatabase) -> Self {
        Self {
            db,
            dialect: Dialect::Postgres,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }

    /// SQL of every query fetched so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch(&self, query: &Query) -> PinakesResult<Vec<SqlRow>> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(Compiler::new(self.dialect).inline(query));
        }
        self.db.evaluate(query)
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

type Ctes = HashMap<String, Vec<SqlRow>>;

/// A source row visible under `name`; `None` is the null row of an
/// unmatched left join.
#[derive(Debug, Clone)]
struct Binding {
    name: String,
    row: Option<SqlRow>,
}

struct Evaluator<'a> {
    db: &'a MemoryDatabase,
}

impl Evaluator<'_> {
    fn query(&self, query: &Query, ctes: &Ctes, outer: &[Binding]) -> PinakesResult<Vec<SqlRow>> {
        let mut scope = ctes.clone();
        for cte in &query.ctes {
            let rows = self.query(&cte.query, &scope, outer)?;
            scope.insert(cte.name.clone(), rows);
        }

        let (name, rows) = self.source(&query.from, &scope, outer)?;
        let mut tuples: Vec<Vec<Binding>> = rows
            .into_iter()
            .map(|row| {
                vec![Binding {
                    name: name.clone(),
                    row: Some(row),
                }]
            })
            .collect();

        for join in &query.joins {
            let (name, rows) = self.source(&join.source, &scope, outer)?;
            let mut joined = Vec::new();
            for tuple in tuples {
                let mut matched = false;
                for row in &rows {
                    let mut candidate = tuple.clone();
                    candidate.push(Binding {
                        name: name.clone(),
                        row: Some(row.clone()),
                    });
                    let left = lookup(&candidate, outer, &join.left)?;
                    let right = lookup(&candidate, outer, &join.right)?;
                    if sql_eq(&left, &right) {
                        joined.push(candidate);
                        matched = true;
                    }
                }
                if !matched && join.kind == JoinKind::Left {
                    let mut candidate = tuple;
                    candidate.push(Binding {
                        name: name.clone(),
                        row: None,
                    });
                    joined.push(candidate);
                }
            }
            tuples = joined;
        }

        let mut kept = Vec::new();
        for tuple in tuples {
            if self.matches_all(&query.conditions, &tuple, &scope, outer)? {
                kept.push(tuple);
            }
        }

        let mut keyed = Vec::with_capacity(kept.len());
        for tuple in kept {
            let key = query
                .order_by
                .iter()
                .map(|column| lookup(&tuple, outer, column))
                .collect::<PinakesResult<Vec<_>>>()?;
            keyed.push((key, tuple));
        }
        keyed.sort_by(|a, b| compare_keys(&a.0, &b.0));

        let count = query.select.iter().find_map(|item| match item {
            SelectItem::CountDistinct { column, alias } => Some((column, alias)),
            SelectItem::Column { .. } => None,
        });
        let mut rows = match count {
            Some((column, alias)) => {
                let mut seen: Vec<SqlValue> = Vec::new();
                for (_, tuple) in &keyed {
                    let value = lookup(tuple, outer, column)?;
                    if !value.is_null() && !seen.iter().any(|s| sql_eq(s, &value)) {
                        seen.push(value);
                    }
                }
                vec![SqlRow::new().with(alias.clone(), seen.len() as i64)]
            }
            None => keyed
                .iter()
                .map(|(_, tuple)| project(&query.select, tuple, outer))
                .collect::<PinakesResult<Vec<_>>>()?,
        };

        if query.distinct {
            rows = distinct(rows);
        }

        for (op, other) in &query.combined {
            let other_rows = self.query(other, &scope, outer)?;
            rows = match op {
                SetOp::Union => distinct(rows.into_iter().chain(other_rows).collect()),
                SetOp::Intersect => distinct(
                    rows.into_iter()
                        .filter(|row| other_rows.iter().any(|o| same_values(row, o)))
                        .collect(),
                ),
            };
        }

        let offset = query.offset.map_or(0, |o| o.max(0) as usize);
        let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    fn source(
        &self,
        source: &Source,
        ctes: &Ctes,
        outer: &[Binding],
    ) -> PinakesResult<(String, Vec<SqlRow>)> {
        match source {
            Source::Table { name, alias } => {
                let rows = match ctes.get(name) {
                    Some(rows) => rows.clone(),
                    None => self
                        .db
                        .tables
                        .get(name)
                        .cloned()
                        .ok_or_else(|| PinakesError::database(format!("unknown table {}", name)))?,
                };
                Ok((alias.clone().unwrap_or_else(|| name.clone()), rows))
            }
            Source::SubQuery { query, alias } => Ok((alias.clone(), self.query(query, ctes, outer)?)),
        }
    }

    fn matches_all(
        &self,
        conditions: &[Condition],
        tuple: &[Binding],
        ctes: &Ctes,
        outer: &[Binding],
    ) -> PinakesResult<bool> {
        for condition in conditions {
            if !self.condition(condition, tuple, ctes, outer)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn condition(
        &self,
        condition: &Condition,
        tuple: &[Binding],
        ctes: &Ctes,
        outer: &[Binding],
    ) -> PinakesResult<bool> {
        Ok(match condition {
            Condition::Compare { column, op, value } => {
                let actual = lookup(tuple, outer, column)?;
                match (value.is_null(), op) {
                    (true, CompareOp::Eq) => actual.is_null(),
                    (true, CompareOp::Ne) => !actual.is_null(),
                    (true, _) => false,
                    (false, _) => compare(&actual, *op, value),
                }
            }
            Condition::Columns { left, op, right } => compare(
                &lookup(tuple, outer, left)?,
                *op,
                &lookup(tuple, outer, right)?,
            ),
            Condition::In { column, values } => {
                let actual = lookup(tuple, outer, column)?;
                values.iter().any(|v| sql_eq(&actual, v))
            }
            Condition::Like { column, pattern } => match lookup(tuple, outer, column)? {
                SqlValue::Text(text) => like_regex(pattern)?.is_match(&text.to_lowercase()),
                _ => false,
            },
            Condition::Regex { column, pattern } => {
                let re = Regex::new(pattern)
                    .map_err(|e| PinakesError::invalid_input(format!("bad pattern: {}", e)))?;
                match lookup(tuple, outer, column)? {
                    SqlValue::Text(text) => re.is_match(&text),
                    _ => false,
                }
            }
            Condition::Fuzzy {
                column,
                value,
                threshold,
            } => match lookup(tuple, outer, column)? {
                SqlValue::Text(text) => trigram_similarity(&text, value) >= *threshold,
                _ => false,
            },
            Condition::Exists(query) => {
                let mut env = tuple.to_vec();
                env.extend(outer.iter().cloned());
                !self.query(query, ctes, &env)?.is_empty()
            }
        })
    }
}

fn lookup(tuple: &[Binding], outer: &[Binding], column: &Column) -> PinakesResult<SqlValue> {
    let unknown = || PinakesError::database(format!("unknown column {}", column));
    match &column.qualifier {
        Some(qualifier) => {
            let binding = tuple
                .iter()
                .chain(outer)
                .find(|b| &b.name == qualifier)
                .ok_or_else(unknown)?;
            match &binding.row {
                Some(row) => row.get(&column.name).cloned().ok_or_else(unknown),
                None => Ok(SqlValue::Null),
            }
        }
        None => tuple
            .iter()
            .chain(outer)
            .find_map(|b| b.row.as_ref().and_then(|row| row.get(&column.name)))
            .cloned()
            .ok_or_else(unknown),
    }
}

fn project(select: &[SelectItem], tuple: &[Binding], outer: &[Binding]) -> PinakesResult<SqlRow> {
    let mut row = SqlRow::new();
    if select.is_empty() {
        for binding in tuple {
            if let Some(source) = &binding.row {
                for (name, value) in source.columns() {
                    row.push(name, value.clone());
                }
            }
        }
        return Ok(row);
    }
    for item in select {
        match item {
            SelectItem::Column { column, .. } => {
                row.push(item.output_name(), lookup(tuple, outer, column)?);
            }
            SelectItem::CountDistinct { .. } => {
                return Err(PinakesError::invalid_input(
                    "COUNT(DISTINCT) mixed with plain columns",
                ));
            }
        }
    }
    Ok(row)
}

fn numeric(value: &SqlValue) -> Option<f64> {
    match value {
        SqlValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

/// SQL comparison; `None` when either side is null or the types differ.
fn sql_cmp(a: &SqlValue, b: &SqlValue) -> Option<Ordering> {
    match (a, b) {
        (SqlValue::Text(x), SqlValue::Text(y)) => Some(x.cmp(y)),
        _ => numeric(a)?.partial_cmp(&numeric(b)?),
    }
}

fn sql_eq(a: &SqlValue, b: &SqlValue) -> bool {
    sql_cmp(a, b) == Some(Ordering::Equal)
}

fn compare(a: &SqlValue, op: CompareOp, b: &SqlValue) -> bool {
    match sql_cmp(a, b) {
        None => false,
        Some(ordering) => match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        },
    }
}

/// Ascending, nulls first.
fn compare_keys(a: &[SqlValue], b: &[SqlValue]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => sql_cmp(x, y).unwrap_or(Ordering::Equal),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Positional value equality; set operations ignore column names.
fn same_values(a: &SqlRow, b: &SqlRow) -> bool {
    a.len() == b.len()
        && a.columns().zip(b.columns()).all(|((_, x), (_, y))| {
            (x.is_null() && y.is_null()) || sql_eq(x, y)
        })
}

fn distinct(rows: Vec<SqlRow>) -> Vec<SqlRow> {
    let mut out: Vec<SqlRow> = Vec::with_capacity(rows.len());
    for row in rows {
        if !out.iter().any(|r| same_values(r, &row)) {
            out.push(row);
        }
    }
    out
}

/// Compile a LIKE pattern with `\` escapes into an anchored regex.
fn like_regex(pattern: &str) -> PinakesResult<Regex> {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push_str(&regex::escape(&next.to_string()));
                }
            }
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| PinakesError::invalid_input(format!("bad LIKE pattern: {}", e)))
}

/// Trigram similarity as computed by `pg_trgm`: words are lowercased and
/// padded with two leading blanks and one trailing blank.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}

fn trigrams(text: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!("  {} ", word).chars().collect();
        for window in padded.windows(3) {
            out.insert(window.iter().collect());
        }
    }
    out
}
