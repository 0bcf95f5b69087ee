//! Search facade
//!
//! Runs the queries built by the paged builders through a [`QueryExecutor`]
//! and turns their rows into consolidated result pages.

use crate::config::SearchConfig;
use crate::consolidate::{consolidate, Consolidate};
use crate::executor::QueryExecutor;
use crate::lookup::{keyword_query, relation_type_query};
use crate::paged::{require, PagedQueryBuilder};
use crate::predicate::{AuthorQueryBuilder, EntityQueryBuilder, WorkQueryBuilder};
use crate::request::{AuthorSearchRequest, LookupRequest, TextBasedRequest, WorkSearchRequest};
use crate::results::{AuthorResult, WorkDetailResult, WorkResult};
use crate::rows::{read_rows, CountRow, FromSqlRow};
use crate::sql::Query;
use crate::token::TokenParser;
use pinakes_core::{DataPage, EntityId, EntityKind, LookupResult, PinakesResult};

pub struct Searcher<E> {
    executor: E,
    config: SearchConfig,
    authors: PagedQueryBuilder<AuthorQueryBuilder>,
    works: PagedQueryBuilder<WorkQueryBuilder>,
}

impl<E: QueryExecutor> Searcher<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, SearchConfig::default())
    }

    pub fn with_config(executor: E, config: SearchConfig) -> Self {
        let dialect = executor.dialect();
        let parser = || TokenParser::new().with_default_operator(config.default_operator);
        Self {
            authors: PagedQueryBuilder::new(AuthorQueryBuilder, dialect).with_parser(parser()),
            works: PagedQueryBuilder::new(WorkQueryBuilder, dialect).with_parser(parser()),
            executor,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn author_queries(&self) -> &PagedQueryBuilder<AuthorQueryBuilder> {
        &self.authors
    }

    pub fn work_queries(&self) -> &PagedQueryBuilder<WorkQueryBuilder> {
        &self.works
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    /// One page of authors matching `request`.
    pub async fn search_authors(
        &self,
        request: Option<&AuthorSearchRequest>,
    ) -> PinakesResult<DataPage<AuthorResult>> {
        let mut request = require(request)?.clone();
        request.base.paging = self.config.clamp(request.base.paging);
        self.search::<_, AuthorResult>(&self.authors, &request).await
    }

    /// One page of works matching `request`.
    pub async fn search_works(
        &self,
        request: Option<&WorkSearchRequest>,
    ) -> PinakesResult<DataPage<WorkResult>> {
        let mut request = require(request)?.clone();
        request.base.paging = self.config.clamp(request.base.paging);
        self.search::<_, WorkResult>(&self.works, &request).await
    }

    async fn search<B, C>(
        &self,
        builder: &PagedQueryBuilder<B>,
        request: &B::Request,
    ) -> PinakesResult<DataPage<C>>
    where
        B: EntityQueryBuilder,
        C: Consolidate,
        C::Row: FromSqlRow,
    {
        let queries = builder.build(Some(request))?;
        let paging = request.paging();

        let total = self.count(&queries.count).await?;
        if total == 0 {
            tracing::debug!(entity = %builder.builder().kind(), "No matches");
            return Ok(DataPage::empty(paging));
        }

        let rows = self.executor.fetch(&queries.data).await?;
        let items: Vec<C> = consolidate(read_rows::<C::Row>(&rows)?);
        tracing::debug!(
            entity = %builder.builder().kind(),
            total,
            rows = rows.len(),
            items = items.len(),
            "Search complete"
        );
        Ok(DataPage::new(paging, total, items))
    }

    async fn count(&self, query: &Query) -> PinakesResult<i64> {
        let rows = self.executor.fetch(query).await?;
        match rows.first() {
            Some(row) => Ok(CountRow::from_row(row)?.total),
            None => Ok(0),
        }
    }

    // ========================================================================
    // DETAILS
    // ========================================================================

    /// The author `id` with aliases and keywords, if it exists.
    pub async fn author_detail(&self, id: EntityId) -> PinakesResult<Option<AuthorResult>> {
        self.detail::<_, AuthorResult>(&self.authors, id).await
    }

    /// The work `id` with its detail fields, authors and keywords, if it
    /// exists.
    pub async fn work_detail(&self, id: EntityId) -> PinakesResult<Option<WorkDetailResult>> {
        self.detail::<_, WorkDetailResult>(&self.works, id).await
    }

    async fn detail<B, C>(
        &self,
        builder: &PagedQueryBuilder<B>,
        id: EntityId,
    ) -> PinakesResult<Option<C>>
    where
        B: EntityQueryBuilder,
        C: Consolidate,
        C::Row: FromSqlRow,
    {
        let rows = self.executor.fetch(&builder.detail_query(id)).await?;
        let results: Vec<C> = consolidate(read_rows::<C::Row>(&rows)?);
        tracing::debug!(
            entity = %builder.builder().kind(),
            id,
            found = !results.is_empty(),
            "Detail fetched"
        );
        Ok(results.into_iter().next())
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    /// Keywords attached to at least one entity of `target`.
    pub async fn keywords(
        &self,
        target: EntityKind,
        request: Option<&LookupRequest>,
    ) -> PinakesResult<Vec<LookupResult>> {
        let rows = self.executor.fetch(&keyword_query(target, request)).await?;
        read_rows(&rows)
    }

    /// Relation types labelled by their child role, or parent role when
    /// `child` is false.
    pub async fn relation_types(
        &self,
        child: bool,
        request: Option<&LookupRequest>,
    ) -> PinakesResult<Vec<LookupResult>> {
        let rows = self.executor.fetch(&relation_type_query(child, request)).await?;
        read_rows(&rows)
    }
}
