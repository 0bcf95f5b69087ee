//! Paged search query builder
//!
//! Turns a request into its identifier, data and count queries:
//!
//! 1. one subquery per kept token (or the non-text query when there is no
//!    text), each the entity's non-text query joined to the text index;
//! 2. the subqueries combined into an [`IdentifierQuery`];
//! 3. a page query joining the ids to the entity table, sorted and cut to
//!    the requested page;
//! 4. the data query left-joining the page to the one-to-many tables, and
//!    the count query over the distinct ids.

use crate::combine::{combine, IdentifierQuery};
use crate::predicate::{table_alias, EntityQueryBuilder};
use crate::request::TextBasedRequest;
use crate::schema;
use crate::scope::FieldCode;
use crate::sql::{Column, Compiler, Condition, Dialect, Query, Source};
use crate::token::{Token, TokenParser};
use pinakes_core::{EntityId, PagingOptions, PinakesError, PinakesResult};

/// Alias of the identifier query inside data and count queries.
pub const ID_QUERY_ALIAS: &str = "q";
/// Alias of the page subquery inside the data query.
pub const PAGE_ALIAS: &str = "p";
/// Alias of the entity table inside the page subquery.
const ENTITY_ALIAS: &str = "e";
/// Output column of the count query.
pub const TOTAL_COLUMN: &str = "total";

/// The three queries of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQueries {
    pub id: IdentifierQuery,
    pub data: Query,
    pub count: Query,
}

pub struct PagedQueryBuilder<B> {
    builder: B,
    dialect: Dialect,
    parser: TokenParser,
}

impl<B: EntityQueryBuilder> PagedQueryBuilder<B> {
    pub fn new(builder: B, dialect: Dialect) -> Self {
        Self {
            builder,
            dialect,
            parser: TokenParser::new(),
        }
    }

    pub fn with_parser(mut self, parser: TokenParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Build the identifier, data and count queries for `request`.
    pub fn build(&self, request: Option<&B::Request>) -> PinakesResult<SearchQueries> {
        let request = require(request)?;
        let id = self.id_query(request)?;
        let data = self.data_query_for(request.paging(), &id, false);
        let count = self.count_query(&id);

        if tracing::enabled!(tracing::Level::DEBUG) {
            let compiler = Compiler::new(self.dialect);
            tracing::debug!(
                entity = %self.builder.kind(),
                id_sql = %compiler.inline(&id.query),
                data_sql = %compiler.inline(&data),
                count_sql = %compiler.inline(&count),
                "Built search queries"
            );
        }

        Ok(SearchQueries { id, data, count })
    }

    /// Build the identifier query for `request`.
    pub fn id_query(&self, request: &B::Request) -> PinakesResult<IdentifierQuery> {
        request.validate()?;
        let base = request.text_request();
        let tokens = self.parser.normalize(base.text.as_deref());

        let subqueries = if tokens.is_empty() {
            vec![self.builder.non_text_query(request, 1)]
        } else {
            let fields = self.builder.fields(request)?;
            tokens
                .iter()
                .enumerate()
                .map(|(i, token)| self.token_query(request, i + 1, token, &fields))
                .collect()
        };

        combine(
            subqueries,
            base.match_any,
            self.dialect.supports_intersect(),
            self.builder.table(),
        )
    }

    /// The non-text query numbered `ordinal`, restricted to entities having
    /// an occurrence of `token` in one of `fields`.
    pub fn token_query(
        &self,
        request: &B::Request,
        ordinal: usize,
        token: &Token,
        fields: &[FieldCode],
    ) -> Query {
        let alias = table_alias(ordinal);
        let field = Column::new(schema::OCCURRENCES, "field");
        let query = self
            .builder
            .non_text_query(request, ordinal)
            .join(
                Source::table(schema::OCCURRENCES),
                Column::new(schema::OCCURRENCES, "target_id"),
                Column::new(alias, "id"),
            )
            .join(
                Source::table(schema::TOKENS),
                Column::new(schema::OCCURRENCES, "token_id"),
                Column::new(schema::TOKENS, "id"),
            );

        let query = match fields {
            [single] => query.filter(Condition::eq(field, single.code())),
            _ => query.filter(Condition::in_list(field, fields.iter().map(|f| f.code()))),
        };
        query.filter(token.condition(Column::new(schema::TOKENS, "value")))
    }

    /// Data query for `request` over `id_query`.
    pub fn data_query(
        &self,
        request: Option<&B::Request>,
        id_query: &IdentifierQuery,
    ) -> PinakesResult<Query> {
        let request = require(request)?;
        Ok(self.data_query_for(request.paging(), id_query, false))
    }

    /// Count of the distinct ids of `id_query`.
    pub fn count_query(&self, id_query: &IdentifierQuery) -> Query {
        let count = Query::from_subquery(id_query.query.clone(), ID_QUERY_ALIAS)
            .select_count_distinct(Column::new(ID_QUERY_ALIAS, "id"), TOTAL_COLUMN);
        id_query.attach_ctes(count)
    }

    /// Data query of the single entity `id`, including detail columns.
    pub fn detail_query(&self, id: EntityId) -> Query {
        let alias = table_alias(1);
        let id_query = Query::from_aliased(self.builder.table(), alias.clone())
            .select(Column::new(alias.clone(), "id"))
            .filter(Condition::eq(Column::new(alias, "id"), id));
        self.data_query_for(PagingOptions::unpaged(), &IdentifierQuery::new(id_query), true)
    }

    fn data_query_for(
        &self,
        paging: PagingOptions,
        id_query: &IdentifierQuery,
        detail: bool,
    ) -> Query {
        let mut page = Query::from_subquery(id_query.query.clone(), ID_QUERY_ALIAS).join(
            Source::aliased(self.builder.table(), ENTITY_ALIAS),
            Column::new(ENTITY_ALIAS, "id"),
            Column::new(ID_QUERY_ALIAS, "id"),
        );
        page = self.builder.scalar_columns(page, ENTITY_ALIAS);
        if detail {
            page = self.builder.detail_columns(page, ENTITY_ALIAS);
        }
        if paging.is_paged() {
            page = page
                .order_by(Column::new(ENTITY_ALIAS, self.builder.sort_column()))
                .order_by(Column::new(ENTITY_ALIAS, "id"))
                .limit(i64::from(paging.page_size));
            let skip = paging.skip_count();
            if skip > 0 {
                page = page.offset(skip);
            }
        }

        let data = Query::from_subquery(page, PAGE_ALIAS)
            .order_by(Column::new(PAGE_ALIAS, self.builder.sort_key()))
            .order_by(Column::new(PAGE_ALIAS, "id"));
        let data = self.builder.related_columns(data, PAGE_ALIAS, detail);
        id_query.attach_ctes(data)
    }
}

pub(crate) fn require<R>(request: Option<&R>) -> PinakesResult<&R> {
    request.ok_or_else(|| PinakesError::invalid_input("search request is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{AuthorQueryBuilder, WorkQueryBuilder};
    use crate::request::{AuthorSearchRequest, TextRequest, WorkSearchRequest};
    use crate::token::TokenOperator;

    fn authors(dialect: Dialect) -> PagedQueryBuilder<AuthorQueryBuilder> {
        PagedQueryBuilder::new(AuthorQueryBuilder::new(), dialect)
    }

    fn inline(dialect: Dialect, query: &Query) -> String {
        Compiler::new(dialect).inline(query)
    }

    fn author_request(text: &str) -> AuthorSearchRequest {
        AuthorSearchRequest::new(TextRequest::new(text).with_paging(1, 20))
    }

    #[test]
    fn test_missing_request_is_rejected() {
        let err = authors(Dialect::MySql).build(None).unwrap_err();
        assert!(matches!(err, PinakesError::InvalidInput { .. }));

        let id = IdentifierQuery::new(Query::from_table("auteurs"));
        assert!(authors(Dialect::MySql).data_query(None, &id).is_err());
    }

    #[test]
    fn test_single_token_id_query() {
        let queries = authors(Dialect::MySql).build(Some(&author_request("*=he"))).unwrap();
        assert_eq!(
            inline(Dialect::MySql, &queries.id.query),
            "SELECT DISTINCT `t1`.`id` FROM `auteurs` AS `t1` \
             INNER JOIN `eix_occurrence` ON `eix_occurrence`.`target_id` = `t1`.`id` \
             INNER JOIN `eix_token` ON `eix_occurrence`.`token_id` = `eix_token`.`id` \
             WHERE `eix_occurrence`.`field` IN ('aunam', 'aanam') \
             AND LOWER(`eix_token`.`value`) LIKE '%he%'"
        );
    }

    #[test]
    fn test_implicit_and_explicit_contains_agree() {
        let builder = authors(Dialect::MySql);
        let explicit = builder.build(Some(&author_request("*=he"))).unwrap();
        let implicit = builder.build(Some(&author_request("he"))).unwrap();
        assert_eq!(explicit.id, implicit.id);
    }

    #[test]
    fn test_default_operator_equals_when_configured() {
        let builder = authors(Dialect::MySql)
            .with_parser(TokenParser::new().with_default_operator(TokenOperator::Equals));
        let queries = builder.build(Some(&author_request("He"))).unwrap();
        assert!(inline(Dialect::MySql, &queries.id.query)
            .ends_with("AND `eix_token`.`value` = 'he'"));
    }

    #[test]
    fn test_single_field_scope_uses_equality() {
        let mut request = author_request("*=he");
        request.base = request.base.with_scope("aunot");
        let queries = authors(Dialect::MySql).build(Some(&request)).unwrap();
        assert!(inline(Dialect::MySql, &queries.id.query)
            .contains("WHERE `eix_occurrence`.`field` = 'aunot' AND"));
    }

    #[test]
    fn test_foreign_scope_is_rejected() {
        let mut request = author_request("*=he");
        request.base = request.base.with_scope("wkttl");
        let err = authors(Dialect::MySql).build(Some(&request)).unwrap_err();
        assert!(matches!(err, PinakesError::UnknownFieldCode { .. }));
    }

    #[test]
    fn test_empty_text_equals_non_text_query() {
        let builder = authors(Dialect::MySql);
        let request = AuthorSearchRequest {
            century_min: 15,
            ..AuthorSearchRequest::new(TextRequest::default())
        };
        let id = builder.id_query(&request).unwrap();
        assert_eq!(id.query, builder.builder().non_text_query(&request, 1));
        assert!(id.ctes.is_empty());
    }

    #[test]
    fn test_skipped_tokens_do_not_count() {
        let builder = authors(Dialect::MySql);
        let only_skipped = builder.id_query(&author_request("=!! *=-")).unwrap();
        assert_eq!(
            only_skipped.query,
            builder.builder().non_text_query(&author_request(""), 1)
        );

        let one_kept = builder.id_query(&author_request("=!! *=he")).unwrap();
        assert!(one_kept.ctes.is_empty());
        assert!(one_kept.query.combined.is_empty());
        assert_eq!(one_kept.query.from.reference_name(), "t1");
    }

    #[test]
    fn test_many_tokens_any_unions() {
        let mut request = author_request("*=he *=an");
        request.base.match_any = true;
        let queries = authors(Dialect::MySql).build(Some(&request)).unwrap();
        let sql = inline(Dialect::MySql, &queries.id.query);
        assert!(sql.contains("LIKE '%he%' UNION SELECT DISTINCT `t2`.`id` FROM `auteurs` AS `t2`"));
        assert!(sql.ends_with("LIKE '%an%'"));
    }

    #[test]
    fn test_many_tokens_all_emulated_on_mysql() {
        let queries = authors(Dialect::MySql).build(Some(&author_request("*=he *=an"))).unwrap();
        let data = inline(Dialect::MySql, &queries.data);
        let count = inline(Dialect::MySql, &queries.count);
        for sql in [&data, &count] {
            assert!(sql.starts_with(
                "WITH `s0` AS (SELECT DISTINCT `t1`.`id` FROM `auteurs` AS `t1` \
                 INNER JOIN `eix_occurrence` ON `eix_occurrence`.`target_id` = `t1`.`id` \
                 INNER JOIN `eix_token` ON `eix_occurrence`.`token_id` = `eix_token`.`id` \
                 WHERE `eix_occurrence`.`field` IN ('aunam', 'aanam') \
                 AND LOWER(`eix_token`.`value`) LIKE '%he%'), \
                 `s1` AS (SELECT DISTINCT `t2`.`id`"
            ));
            assert!(sql.contains(
                "(SELECT `qs`.`id` FROM `auteurs` AS `qs` \
                 INNER JOIN `s0` ON `qs`.`id` = `s0`.`id` \
                 INNER JOIN `s1` ON `qs`.`id` = `s1`.`id`) AS `q`"
            ));
        }
    }

    #[test]
    fn test_many_tokens_all_intersect_on_postgres() {
        let queries = authors(Dialect::Postgres)
            .build(Some(&author_request("*=he *=an")))
            .unwrap();
        assert!(queries.data.ctes.is_empty());
        let sql = inline(Dialect::Postgres, &queries.id.query);
        assert!(sql.contains(" INTERSECT SELECT DISTINCT \"t2\".\"id\""));
    }

    #[test]
    fn test_count_query() {
        let queries = authors(Dialect::MySql).build(Some(&author_request("*=he"))).unwrap();
        let sql = inline(Dialect::MySql, &queries.count);
        assert!(sql.starts_with("SELECT COUNT(DISTINCT `q`.`id`) AS `total` FROM (SELECT DISTINCT `t1`.`id`"));
        assert!(sql.ends_with(") AS `q`"));
    }

    #[test]
    fn test_data_query_first_page() {
        let queries = authors(Dialect::MySql).build(Some(&author_request("*=he"))).unwrap();
        let sql = inline(Dialect::MySql, &queries.data);
        assert!(sql.starts_with(
            "SELECT `p`.`id`, `p`.`name`, `p`.`century`, `p`.`dates`, `p`.`note`, \
             `p`.`is_category`, `aa`.`nom` AS `alias`, `k`.`id` AS `keyword_id`, \
             `k`.`keyword` AS `keyword_value` FROM (SELECT `e`.`id`, `e`.`nom` AS `name`"
        ));
        assert!(sql.contains(
            ") AS `q` INNER JOIN `auteurs` AS `e` ON `e`.`id` = `q`.`id` \
             ORDER BY `e`.`nom`, `e`.`id` LIMIT 20) AS `p` \
             LEFT JOIN `auteurs_alias` AS `aa` ON `aa`.`id_auteur` = `p`.`id`"
        ));
        assert!(sql.ends_with("ORDER BY `p`.`name`, `p`.`id`, `aa`.`nom`, `k`.`keyword`"));
    }

    #[test]
    fn test_data_query_second_page_offsets() {
        let request = AuthorSearchRequest::new(TextRequest::new("*=he").with_paging(2, 20));
        let queries = authors(Dialect::MySql).build(Some(&request)).unwrap();
        assert!(inline(Dialect::MySql, &queries.data).contains("LIMIT 20 OFFSET 20) AS `p`"));
    }

    #[test]
    fn test_data_query_unpaged() {
        let request = AuthorSearchRequest::new(TextRequest::new("*=he").with_paging(3, 0));
        let queries = authors(Dialect::MySql).build(Some(&request)).unwrap();
        let sql = inline(Dialect::MySql, &queries.data);
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("OFFSET"));
    }

    #[test]
    fn test_work_detail_query() {
        let builder = PagedQueryBuilder::new(WorkQueryBuilder::new(), Dialect::Postgres);
        let query = builder.detail_query(42);
        let compiled = Compiler::new(Dialect::Postgres).compile(&query);
        assert!(compiled.sql.contains("WHERE \"t1\".\"id\" = $1"));
        assert_eq!(compiled.params, vec![crate::sql::SqlValue::Int(42)]);
        assert!(query.output_names().contains(&"team"));
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_work_search_uses_work_scope() {
        let builder = PagedQueryBuilder::new(WorkQueryBuilder::new(), Dialect::MySql);
        let request = WorkSearchRequest::new(TextRequest::new("^=vita"));
        let queries = builder.build(Some(&request)).unwrap();
        let sql = inline(Dialect::MySql, &queries.id.query);
        assert!(sql.contains("IN ('wkttl', 'wattl')"));
        assert!(sql.ends_with("LIKE 'vita%'"));
    }
}
