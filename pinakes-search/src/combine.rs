//! Identifier query combination
//!
//! Per-token subqueries are combined into one query yielding the distinct
//! ids of matching entities. OR uses `UNION`. AND uses `INTERSECT` where the
//! dialect has it; otherwise each subquery becomes a named CTE `s{i}` and the
//! entity table is inner-joined to every one of them on id.

use crate::sql::{Column, Cte, Query, Source};
use pinakes_core::{PinakesError, PinakesResult};

/// Alias of the entity table in the join emulation of `INTERSECT`.
const EMULATION_ALIAS: &str = "qs";

/// A query yielding one `id` column without duplicates.
///
/// `ctes` holds the named subqueries the query refers to when AND was
/// emulated; they must be attached to every statement embedding `query`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierQuery {
    pub query: Query,
    pub ctes: Vec<Cte>,
}

impl IdentifierQuery {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            ctes: Vec::new(),
        }
    }

    pub fn is_emulated(&self) -> bool {
        !self.ctes.is_empty()
    }

    /// Prepend this query's CTEs to `statement`.
    pub fn attach_ctes(&self, mut statement: Query) -> Query {
        let mut ctes = self.ctes.clone();
        ctes.append(&mut statement.ctes);
        statement.ctes = ctes;
        statement
    }
}

/// Combine `subqueries` into an identifier query.
///
/// `supports_intersect` is the target dialect's capability; it only matters
/// when AND-combining two or more subqueries.
pub fn combine(
    subqueries: Vec<Query>,
    match_any: bool,
    supports_intersect: bool,
    entity_table: &str,
) -> PinakesResult<IdentifierQuery> {
    let mut iter = subqueries.into_iter();
    let Some(first) = iter.next() else {
        return Err(PinakesError::invalid_input(
            "at least one subquery is required to build an identifier query",
        ));
    };
    let rest: Vec<Query> = iter.collect();

    if rest.is_empty() {
        return Ok(IdentifierQuery::new(first));
    }

    if match_any {
        let query = rest.into_iter().fold(first, Query::union);
        return Ok(IdentifierQuery::new(query));
    }

    if supports_intersect {
        let query = rest.into_iter().fold(first, Query::intersect);
        return Ok(IdentifierQuery::new(query));
    }

    Ok(emulate_intersect(
        std::iter::once(first).chain(rest),
        entity_table,
    ))
}

fn emulate_intersect(subqueries: impl Iterator<Item = Query>, entity_table: &str) -> IdentifierQuery {
    let mut query = Query::from_aliased(entity_table, EMULATION_ALIAS)
        .select(Column::new(EMULATION_ALIAS, "id"));
    let mut ctes = Vec::new();
    for (i, subquery) in subqueries.enumerate() {
        let name = format!("s{}", i);
        query = query.join(
            Source::table(name.clone()),
            Column::new(EMULATION_ALIAS, "id"),
            Column::new(name.clone(), "id"),
        );
        ctes.push(Cte {
            name,
            query: subquery,
        });
    }
    IdentifierQuery { query, ctes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{Compiler, Dialect};

    fn subquery(n: usize) -> Query {
        let alias = format!("t{}", n);
        Query::from_aliased("auteurs", alias.clone())
            .select(Column::new(alias, "id"))
            .distinct()
    }

    fn render(query: &Query) -> String {
        Compiler::new(Dialect::MySql).inline(query)
    }

    #[test]
    fn test_zero_subqueries_is_invalid() {
        let err = combine(Vec::new(), false, true, "auteurs").unwrap_err();
        assert!(matches!(err, PinakesError::InvalidInput { .. }));
    }

    #[test]
    fn test_single_subquery_is_identity() {
        let id = combine(vec![subquery(1)], false, false, "auteurs").unwrap();
        assert_eq!(id.query, subquery(1));
        assert!(!id.is_emulated());
    }

    #[test]
    fn test_match_any_unions() {
        let id = combine(vec![subquery(1), subquery(2)], true, false, "auteurs").unwrap();
        assert!(!id.is_emulated());
        assert_eq!(
            render(&id.query),
            "SELECT DISTINCT `t1`.`id` FROM `auteurs` AS `t1` \
             UNION SELECT DISTINCT `t2`.`id` FROM `auteurs` AS `t2`"
        );
    }

    #[test]
    fn test_match_all_intersects_natively() {
        let id = combine(vec![subquery(1), subquery(2)], false, true, "auteurs").unwrap();
        assert!(!id.is_emulated());
        assert!(render(&id.query).contains(" INTERSECT SELECT DISTINCT `t2`.`id`"));
    }

    #[test]
    fn test_match_all_emulated_without_intersect() {
        let id = combine(
            vec![subquery(1), subquery(2), subquery(3)],
            false,
            false,
            "auteurs",
        )
        .unwrap();
        assert!(id.is_emulated());
        assert_eq!(
            id.ctes.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["s0", "s1", "s2"]
        );
        assert_eq!(
            render(&id.query),
            "SELECT `qs`.`id` FROM `auteurs` AS `qs` \
             INNER JOIN `s0` ON `qs`.`id` = `s0`.`id` \
             INNER JOIN `s1` ON `qs`.`id` = `s1`.`id` \
             INNER JOIN `s2` ON `qs`.`id` = `s2`.`id`"
        );
    }

    #[test]
    fn test_emulation_uses_entity_table() {
        let id = combine(vec![subquery(1), subquery(2)], false, false, "oeuvres").unwrap();
        assert!(render(&id.query).starts_with("SELECT `qs`.`id` FROM `oeuvres` AS `qs`"));
    }

    #[test]
    fn test_match_any_never_emulates() {
        let id = combine(vec![subquery(1), subquery(2)], true, false, "auteurs").unwrap();
        assert!(id.ctes.is_empty());
    }

    #[test]
    fn test_attach_ctes_goes_first() {
        let id = combine(vec![subquery(1), subquery(2)], false, false, "auteurs").unwrap();
        let statement = Query::from_subquery(id.query.clone(), "q")
            .select("q.id")
            .with("extra", subquery(9));
        let statement = id.attach_ctes(statement);
        let names: Vec<&str> = statement.ctes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["s0", "s1", "extra"]);
    }
}
