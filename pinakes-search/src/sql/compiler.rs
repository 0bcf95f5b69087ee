//! Dialect-specific SQL rendering
//!
//! The compiler walks a [`Query`] and produces either parameterized SQL plus
//! its bound values ([`Compiler::compile`]) or a fully inlined statement for
//! logs and tests ([`Compiler::inline`]).

use super::query::{
    Column, CompareOp, Condition, JoinKind, Query, SelectItem, SetOp, Source, SqlValue,
};
use pinakes_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DIALECT
// ============================================================================

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
}

impl Dialect {
    /// Whether the dialect has a native `INTERSECT` operator.
    pub fn supports_intersect(&self) -> bool {
        match self {
            Dialect::Postgres => true,
            Dialect::MySql => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
        }
    }

    fn quote(&self, ident: &str) -> String {
        if ident == "*" {
            return ident.to_string();
        }
        match self {
            Dialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql => "?".to_string(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            other => Err(ConfigError::InvalidValue {
                field: "dialect".to_string(),
                value: other.to_string(),
                reason: "expected 'postgres' or 'mysql'".to_string(),
            }),
        }
    }
}

// ============================================================================
// COMPILER
// ============================================================================

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    dialect: Dialect,
}

impl Compiler {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render `query` with placeholders for every value.
    pub fn compile(&self, query: &Query) -> CompiledQuery {
        let mut renderer = Renderer {
            dialect: self.dialect,
            inline: false,
            params: Vec::new(),
        };
        let sql = renderer.query(query);
        CompiledQuery {
            sql,
            params: renderer.params,
        }
    }

    /// Render `query` with literal values substituted.
    pub fn inline(&self, query: &Query) -> String {
        let mut renderer = Renderer {
            dialect: self.dialect,
            inline: true,
            params: Vec::new(),
        };
        renderer.query(query)
    }
}

struct Renderer {
    dialect: Dialect,
    inline: bool,
    params: Vec<SqlValue>,
}

impl Renderer {
    fn query(&mut self, query: &Query) -> String {
        let mut sql = String::new();

        if !query.ctes.is_empty() {
            let ctes: Vec<String> = query
                .ctes
                .iter()
                .map(|cte| format!("{} AS ({})", self.ident(&cte.name), self.query(&cte.query)))
                .collect();
            sql.push_str("WITH ");
            sql.push_str(&ctes.join(", "));
            sql.push(' ');
        }

        sql.push_str("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }
        if query.select.is_empty() {
            sql.push('*');
        } else {
            let items: Vec<String> = query.select.iter().map(|item| self.select_item(item)).collect();
            sql.push_str(&items.join(", "));
        }

        sql.push_str(" FROM ");
        let from = self.source(&query.from);
        sql.push_str(&from);

        for join in &query.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            let source = self.source(&join.source);
            sql.push_str(&format!(
                " {} {} ON {} = {}",
                keyword,
                source,
                self.column(&join.left),
                self.column(&join.right)
            ));
        }

        if !query.conditions.is_empty() {
            let conditions: Vec<String> =
                query.conditions.iter().map(|c| self.condition(c)).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        for (op, other) in &query.combined {
            sql.push_str(match op {
                SetOp::Union => " UNION ",
                SetOp::Intersect => " INTERSECT ",
            });
            let other = self.query(other);
            sql.push_str(&other);
        }

        if !query.order_by.is_empty() {
            let columns: Vec<String> = query.order_by.iter().map(|c| self.column(c)).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&columns.join(", "));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    fn ident(&self, ident: &str) -> String {
        self.dialect.quote(ident)
    }

    fn column(&self, column: &Column) -> String {
        match &column.qualifier {
            Some(qualifier) => format!("{}.{}", self.ident(qualifier), self.ident(&column.name)),
            None => self.ident(&column.name),
        }
    }

    fn select_item(&self, item: &SelectItem) -> String {
        match item {
            SelectItem::Column {
                column,
                alias: Some(alias),
            } => format!("{} AS {}", self.column(column), self.ident(alias)),
            SelectItem::Column { column, alias: None } => self.column(column),
            SelectItem::CountDistinct { column, alias } => format!(
                "COUNT(DISTINCT {}) AS {}",
                self.column(column),
                self.ident(alias)
            ),
        }
    }

    fn source(&mut self, source: &Source) -> String {
        match source {
            Source::Table { name, alias: None } => self.ident(name),
            Source::Table {
                name,
                alias: Some(alias),
            } => format!("{} AS {}", self.ident(name), self.ident(alias)),
            Source::SubQuery { query, alias } => {
                format!("({}) AS {}", self.query(query), self.ident(alias))
            }
        }
    }

    fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Compare { column, op, value } => {
                let column = self.column(column);
                if value.is_null() {
                    let test = if *op == CompareOp::Ne { "IS NOT NULL" } else { "IS NULL" };
                    return format!("{} {}", column, test);
                }
                format!("{} {} {}", column, op.symbol(), self.value(value))
            }
            Condition::Columns { left, op, right } => {
                format!("{} {} {}", self.column(left), op.symbol(), self.column(right))
            }
            Condition::In { column, values } => {
                if values.is_empty() {
                    return "1 = 0".to_string();
                }
                let values: Vec<String> = values.iter().map(|v| self.value(v)).collect();
                format!("{} IN ({})", self.column(column), values.join(", "))
            }
            Condition::Like { column, pattern } => {
                let pattern = self.value(&SqlValue::Text(pattern.clone()));
                format!("LOWER({}) LIKE {}", self.column(column), pattern)
            }
            Condition::Regex { column, pattern } => {
                let pattern = self.value(&SqlValue::Text(pattern.clone()));
                match self.dialect {
                    Dialect::Postgres => format!("{} ~ {}", self.column(column), pattern),
                    Dialect::MySql => format!("{} REGEXP {}", self.column(column), pattern),
                }
            }
            Condition::Fuzzy {
                column,
                value,
                threshold,
            } => {
                let value = self.value(&SqlValue::Text(value.clone()));
                match self.dialect {
                    // pg_trgm
                    Dialect::Postgres => format!(
                        "similarity({}, {}) >= {}",
                        self.column(column),
                        value,
                        threshold
                    ),
                    Dialect::MySql => {
                        format!("SOUNDEX({}) = SOUNDEX({})", self.column(column), value)
                    }
                }
            }
            Condition::Exists(query) => format!("EXISTS ({})", self.query(query)),
        }
    }

    fn value(&mut self, value: &SqlValue) -> String {
        if self.inline {
            return self.literal(value);
        }
        self.params.push(value.clone());
        self.dialect.placeholder(self.params.len())
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::BigInt(v) => v.to_string(),
            SqlValue::Float(v) if v.fract() == 0.0 => format!("{:.0}", v),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Bool(v) => {
                let text = match (self.dialect, *v) {
                    (Dialect::Postgres, true) => "TRUE",
                    (Dialect::Postgres, false) => "FALSE",
                    (Dialect::MySql, true) => "1",
                    (Dialect::MySql, false) => "0",
                };
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Source;

    fn token_query(n: usize, pattern: &str) -> Query {
        let alias = format!("t{}", n);
        Query::from_aliased("auteurs", alias.clone())
            .select(Column::new(alias.clone(), "id"))
            .distinct()
            .join(
                Source::table("eix_occurrence"),
                "eix_occurrence.target_id",
                Column::new(alias, "id"),
            )
            .join(
                Source::table("eix_token"),
                "eix_occurrence.token_id",
                "eix_token.id",
            )
            .filter(Condition::in_list("eix_occurrence.field", ["aunam", "aanam"]))
            .filter(Condition::like("eix_token.value", pattern))
    }

    #[test]
    fn test_inline_mysql_token_query() {
        let sql = Compiler::new(Dialect::MySql).inline(&token_query(1, "%he%"));
        assert_eq!(
            sql,
            "SELECT DISTINCT `t1`.`id` FROM `auteurs` AS `t1` \
             INNER JOIN `eix_occurrence` ON `eix_occurrence`.`target_id` = `t1`.`id` \
             INNER JOIN `eix_token` ON `eix_occurrence`.`token_id` = `eix_token`.`id` \
             WHERE `eix_occurrence`.`field` IN ('aunam', 'aanam') \
             AND LOWER(`eix_token`.`value`) LIKE '%he%'"
        );
    }

    #[test]
    fn test_compile_postgres_numbers_placeholders() {
        let compiled = Compiler::new(Dialect::Postgres).compile(&token_query(1, "%he%"));
        assert!(compiled
            .sql
            .ends_with("WHERE \"eix_occurrence\".\"field\" IN ($1, $2) AND LOWER(\"eix_token\".\"value\") LIKE $3"));
        assert_eq!(
            compiled.params,
            vec![
                SqlValue::from("aunam"),
                SqlValue::from("aanam"),
                SqlValue::from("%he%")
            ]
        );
    }

    #[test]
    fn test_compile_mysql_uses_question_marks() {
        let compiled = Compiler::new(Dialect::MySql).compile(&token_query(2, "he%"));
        assert_eq!(compiled.sql.matches('?').count(), 3);
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn test_ctes_set_ops_and_paging() {
        let query = Query::from_subquery(
            token_query(1, "%he%").union(token_query(2, "%an%")),
            "q",
        )
        .select("q.id")
        .with("s0", token_query(3, "x%"))
        .order_by("q.id")
        .limit(20)
        .offset(20);
        let sql = Compiler::new(Dialect::MySql).inline(&query);
        assert!(sql.starts_with("WITH `s0` AS (SELECT DISTINCT `t3`.`id`"));
        assert!(sql.contains(" UNION SELECT DISTINCT `t2`.`id`"));
        assert!(sql.ends_with(") AS `q` ORDER BY `q`.`id` LIMIT 20 OFFSET 20"));
    }

    #[test]
    fn test_count_distinct() {
        let query = Query::from_subquery(token_query(1, "%he%"), "q")
            .select_count_distinct("q.id", "total");
        let sql = Compiler::new(Dialect::Postgres).inline(&query);
        assert!(sql.starts_with("SELECT COUNT(DISTINCT \"q\".\"id\") AS \"total\" FROM ("));
    }

    #[test]
    fn test_regex_and_fuzzy_per_dialect() {
        let query = Query::from_table("eix_token")
            .select("id")
            .filter(Condition::regex("eix_token.value", "^h.+"))
            .filter(Condition::fuzzy("eix_token.value", "helene", 0.6));
        let pg = Compiler::new(Dialect::Postgres).inline(&query);
        assert!(pg.contains("\"eix_token\".\"value\" ~ '^h.+'"));
        assert!(pg.contains("similarity(\"eix_token\".\"value\", 'helene') >= 0.6"));

        let my = Compiler::new(Dialect::MySql).inline(&query);
        assert!(my.contains("`eix_token`.`value` REGEXP '^h.+'"));
        assert!(my.contains("SOUNDEX(`eix_token`.`value`) = SOUNDEX('helene')"));
    }

    #[test]
    fn test_literals() {
        let query = Query::from_table("pix_date")
            .select("target_id")
            .filter(Condition::compare("pix_date.date_val", CompareOp::Ge, 1400.0))
            .filter(Condition::eq("pix_date.source", "l'an"))
            .filter(Condition::eq("pix_date.note", SqlValue::Null));
        let sql = Compiler::new(Dialect::MySql).inline(&query);
        assert!(sql.contains("`pix_date`.`date_val` >= 1400"));
        assert!(sql.contains("'l''an'"));
        assert!(sql.contains("`pix_date`.`note` IS NULL"));
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("oracle".parse::<Dialect>().is_err());
        assert!(Dialect::Postgres.supports_intersect());
        assert!(!Dialect::MySql.supports_intersect());
    }
}
