//! Search Scenario Tests
//!
//! End-to-end searches over a small indexed catalog, run through the
//! in-memory executor in both dialects: text matching per operator, text
//! scopes, non-text filters, paging, details and lookups.

use pinakes_core::{EntityId, EntityKind, PinakesError};
use pinakes_search::sql::Dialect;
use pinakes_search::{
    AuthorSearchRequest, LookupRequest, SearchConfig, Searcher, TextRequest, TokenOperator,
    WorkSearchRequest,
};
use pinakes_test_utils::{AuthorFixture, CatalogFixture, MemoryExecutor, WorkFixture};

// ============================================================================
// FIXTURE
// ============================================================================

const DIALECTS: [Dialect; 2] = [Dialect::Postgres, Dialect::MySql];

fn catalog() -> CatalogFixture {
    CatalogFixture::new()
        .keyword(1, "hagiographie")
        .keyword(2, "homilétique")
        .keyword(3, "exégèse")
        .role(1, "auteur")
        .role(2, "traducteur")
        .relation_type(1, "traduction de", "traduit par")
        .relation_type(2, "commentaire de", "commenté par")
        .author(
            AuthorFixture::new(1, "Augustinus Hipponensis")
                .alias("Augustin d'Hippone")
                .alias("Aurelius Augustinus")
                .century("04")
                .keyword(2),
        )
        .author(
            AuthorFixture::new(2, "Beda Venerabilis")
                .century("08")
                .keyword(1)
                .in_category(10),
        )
        .author(AuthorFixture::new(3, "Alcuinus").century("08").keyword(1))
        .author(AuthorFixture::new(10, "Doctores Ecclesiae").category())
        .work(
            WorkFixture::new(1, "Sermo de sancto Stephano")
                .author(1, Some(1))
                .keyword(2)
                .century("05")
                .incipit("Hodie natalem")
                .team("IRHT")
                .dictyon(4500),
        )
        .work(
            WorkFixture::new(2, "Vita sancti Cuthberti")
                .alias_title("Vita Cuthberti prosaica")
                .author(2, Some(1))
                .keyword(1)
                .century("08"),
        )
        .work(
            WorkFixture::new(3, "Vita sancti Cuthberti metrica")
                .author(2, Some(1))
                .author(3, Some(2))
                .keyword(1)
                .century("08"),
        )
        .work(
            WorkFixture::new(4, "Epistola ad Karolum")
                .author(3, Some(1))
                .century("09"),
        )
        .relation(2, 3, 1)
        .identifier(2, 1, 2, "BHL 2021")
}

fn searcher(dialect: Dialect) -> Searcher<MemoryExecutor> {
    Searcher::new(catalog().executor(dialect))
}

async fn work_ids(searcher: &Searcher<MemoryExecutor>, request: WorkSearchRequest) -> Vec<EntityId> {
    let page = searcher.search_works(Some(&request)).await.unwrap();
    page.items.iter().map(|w| w.id).collect()
}

async fn author_ids(
    searcher: &Searcher<MemoryExecutor>,
    request: AuthorSearchRequest,
) -> Vec<EntityId> {
    let page = searcher.search_authors(Some(&request)).await.unwrap();
    page.items.iter().map(|a| a.id).collect()
}

fn works(text: &str) -> WorkSearchRequest {
    WorkSearchRequest::new(TextRequest::new(text))
}

fn authors(text: &str) -> AuthorSearchRequest {
    AuthorSearchRequest::new(TextRequest::new(text))
}

// ============================================================================
// TEXT MATCHING
// ============================================================================

#[tokio::test]
async fn test_author_name_and_alias_match() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        let page = searcher.search_authors(Some(&authors("augustin"))).await.unwrap();
        assert_eq!(page.total, 1);
        let author = &page.items[0];
        assert_eq!(author.id, 1);
        assert_eq!(author.aliases, vec!["Augustin d'Hippone", "Aurelius Augustinus"]);
        assert_eq!(author.keywords.len(), 1);
        assert_eq!(author.keywords[0].value, "homilétique");
    }
}

#[tokio::test]
async fn test_all_tokens_must_match() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        assert_eq!(work_ids(&searcher, works("vita cuthberti")).await, vec![2, 3]);
        assert!(work_ids(&searcher, works("vita stephano")).await.is_empty());
    }
}

#[tokio::test]
async fn test_disjoint_author_tokens_find_nothing() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        assert_eq!(author_ids(&searcher, authors("beda")).await, vec![2]);
        assert_eq!(author_ids(&searcher, authors("alcuinus")).await, vec![3]);

        let page = searcher
            .search_authors(Some(&authors("beda alcuinus")))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }
}

#[tokio::test]
async fn test_invalid_pattern_token_is_ignored() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        let page = searcher
            .search_authors(Some(&authors("beda ~=(")))
            .await
            .unwrap();
        assert_eq!(page.items.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(page.total, 1);
    }
}

#[tokio::test]
async fn test_any_token_may_match() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        let request = WorkSearchRequest::new(TextRequest::new("vita stephano").with_match_any(true));
        assert_eq!(work_ids(&searcher, request).await, vec![1, 2, 3]);
    }
}

#[tokio::test]
async fn test_diacritics_and_case_are_folded() {
    let searcher = searcher(Dialect::Postgres);
    assert_eq!(work_ids(&searcher, works("CUTHBÉRTI")).await, vec![2, 3]);
}

#[tokio::test]
async fn test_operators() {
    let searcher = searcher(Dialect::Postgres);
    assert_eq!(work_ids(&searcher, works("?=vit*")).await, vec![2, 3]);
    assert!(work_ids(&searcher, works("=vit")).await.is_empty());
    assert_eq!(work_ids(&searcher, works("=vita")).await, vec![2, 3]);
    assert_eq!(work_ids(&searcher, works("^=steph")).await, vec![1]);
    assert_eq!(work_ids(&searcher, works("$=olum")).await, vec![4]);
    assert_eq!(work_ids(&searcher, works("~=^karol")).await, vec![4]);
    assert_eq!(
        author_ids(&searcher, authors("%=augustinvs:0.4")).await,
        vec![1]
    );
}

#[tokio::test]
async fn test_default_operator_from_config() {
    let config = SearchConfig {
        default_operator: TokenOperator::Equals,
        ..SearchConfig::default()
    };
    let searcher = Searcher::with_config(catalog().executor(Dialect::MySql), config);
    assert!(work_ids(&searcher, works("vit")).await.is_empty());
    assert_eq!(work_ids(&searcher, works("*=vit")).await, vec![2, 3]);
}

#[tokio::test]
async fn test_tokens_without_operand_are_ignored() {
    let searcher = searcher(Dialect::MySql);
    // "..." filters to nothing and must not turn the AND into an empty result
    assert_eq!(work_ids(&searcher, works("cuthberti ...")).await, vec![2, 3]);
}

// ============================================================================
// TEXT SCOPE
// ============================================================================

#[tokio::test]
async fn test_scope_restricts_fields() {
    let searcher = searcher(Dialect::Postgres);
    assert!(work_ids(&searcher, works("hodie")).await.is_empty());

    let request = WorkSearchRequest::new(TextRequest::new("hodie").with_scope("wkinc"));
    assert_eq!(work_ids(&searcher, request).await, vec![1]);

    let request = WorkSearchRequest::new(TextRequest::new("prosaica").with_scope("wkttl"));
    assert!(work_ids(&searcher, request).await.is_empty());
    assert_eq!(work_ids(&searcher, works("prosaica")).await, vec![2]);
}

#[tokio::test]
async fn test_foreign_scope_is_rejected() {
    let searcher = searcher(Dialect::Postgres);
    let request = WorkSearchRequest::new(TextRequest::new("vita").with_scope("aunam"));
    let result = searcher.search_works(Some(&request)).await;
    assert!(matches!(result, Err(PinakesError::UnknownFieldCode { .. })));
}

// ============================================================================
// NON-TEXT FILTERS
// ============================================================================

#[tokio::test]
async fn test_work_filters() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);

        let mut request = WorkSearchRequest::default();
        request.century_min = 8;
        request.century_max = 8;
        assert_eq!(work_ids(&searcher, request).await, vec![2, 3]);

        let mut request = WorkSearchRequest::default();
        request.author_id = Some(2);
        assert_eq!(work_ids(&searcher, request).await, vec![2, 3]);

        let mut request = WorkSearchRequest::default();
        request.dictyon_id = Some(4500);
        assert_eq!(work_ids(&searcher, request).await, vec![1]);

        let mut request = WorkSearchRequest::default();
        request.keyword_ids = vec![2];
        assert_eq!(work_ids(&searcher, request).await, vec![1]);

        let mut request = WorkSearchRequest::default();
        request.relation_ids = vec![1];
        assert_eq!(work_ids(&searcher, request).await, vec![3]);

        let mut request = WorkSearchRequest::default();
        request.relation_target_id = Some(2);
        assert_eq!(work_ids(&searcher, request).await, vec![3]);

        let mut request = WorkSearchRequest::default();
        request.external_id_type = Some(2);
        request.external_id_value = Some("BHL 2021".to_string());
        assert_eq!(work_ids(&searcher, request).await, vec![2]);
    }
}

#[tokio::test]
async fn test_author_filters() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);

        let mut request = AuthorSearchRequest::default();
        request.keyword_ids = vec![1];
        assert_eq!(author_ids(&searcher, request).await, vec![3, 2]);

        let mut request = AuthorSearchRequest::default();
        request.parent_id = Some(10);
        assert_eq!(author_ids(&searcher, request).await, vec![2]);

        let mut request = AuthorSearchRequest::default();
        request.is_category = Some(true);
        assert_eq!(author_ids(&searcher, request).await, vec![10]);

        let mut request = AuthorSearchRequest::default();
        request.century_max = 5;
        assert_eq!(author_ids(&searcher, request).await, vec![1]);
    }
}

#[tokio::test]
async fn test_text_and_filters_combine() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        let mut request = works("vita cuthberti");
        request.author_id = Some(3);
        assert_eq!(work_ids(&searcher, request).await, vec![3]);
    }
}

// ============================================================================
// PAGING
// ============================================================================

#[tokio::test]
async fn test_pages_follow_sort_order() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);

        let first = WorkSearchRequest::new(TextRequest::default().with_paging(1, 2));
        let page = searcher.search_works(Some(&first)).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.page_count(), 2);
        assert_eq!(page.items.iter().map(|w| w.id).collect::<Vec<_>>(), vec![4, 1]);

        let second = WorkSearchRequest::new(TextRequest::default().with_paging(2, 2));
        assert_eq!(work_ids(&searcher, second).await, vec![2, 3]);

        let beyond = WorkSearchRequest::new(TextRequest::default().with_paging(3, 2));
        let page = searcher.search_works(Some(&beyond)).await.unwrap();
        assert_eq!(page.total, 4);
        assert!(page.items.is_empty());
    }
}

#[tokio::test]
async fn test_page_counts_entities_not_rows() {
    // work 3 has two authors and would take two rows if paged after joining
    let searcher = searcher(Dialect::Postgres);
    let request = WorkSearchRequest::new(TextRequest::new("cuthberti").with_paging(1, 2));
    let page = searcher.search_works(Some(&request)).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].authors.len(), 2);
}

#[tokio::test]
async fn test_no_match_skips_data_query() {
    let searcher = searcher(Dialect::MySql);
    let page = searcher.search_works(Some(&works("nihil"))).await.unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(searcher.executor().executed().len(), 1);
}

// ============================================================================
// DETAILS
// ============================================================================

#[tokio::test]
async fn test_work_detail() {
    for dialect in DIALECTS {
        let searcher = searcher(dialect);
        let work = searcher.work_detail(1).await.unwrap().unwrap();
        assert_eq!(work.work.title, "Sermo de sancto Stephano");
        assert_eq!(work.incipit.as_deref(), Some("Hodie natalem"));
        assert_eq!(work.team.as_deref(), Some("IRHT"));
        assert_eq!(work.work.authors.len(), 1);
        assert_eq!(work.work.authors[0].role.as_deref(), Some("auteur"));

        assert_eq!(searcher.work_detail(99).await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_author_detail() {
    let searcher = searcher(Dialect::Postgres);
    let author = searcher.author_detail(1).await.unwrap().unwrap();
    assert_eq!(author.name, "Augustinus Hipponensis");
    assert_eq!(author.aliases.len(), 2);
    assert!(!author.is_category);
    assert_eq!(searcher.author_detail(42).await.unwrap(), None);
}

// ============================================================================
// LOOKUPS
// ============================================================================

#[tokio::test]
async fn test_keyword_lookup_lists_used_keywords() {
    let searcher = searcher(Dialect::Postgres);
    let keywords = searcher.keywords(EntityKind::Author, None).await.unwrap();
    assert_eq!(keywords.iter().map(|k| k.id).collect::<Vec<_>>(), vec![1, 2]);

    let request = LookupRequest::new("Hag");
    let keywords = searcher.keywords(EntityKind::Work, Some(&request)).await.unwrap();
    assert_eq!(keywords.len(), 1);
    assert_eq!(keywords[0].value, "hagiographie");
}

#[tokio::test]
async fn test_keyword_lookup_prefix_with_diacritics() {
    let catalog = CatalogFixture::new()
        .keyword(1, "homilétique")
        .keyword(2, "Éloge")
        .keyword(3, "hagiographie")
        .author(AuthorFixture::new(1, "Petrus Chrysologus").keyword(1).keyword(2));
    for dialect in DIALECTS {
        let searcher = Searcher::new(catalog.clone().executor(dialect));
        let all = searcher.keywords(EntityKind::Author, None).await.unwrap();
        assert_eq!(all.len(), 2);

        for (prefix, expected) in [
            ("homilé", "homilétique"),
            ("HOMILÉ", "homilétique"),
            ("Élo", "Éloge"),
            ("élo", "Éloge"),
        ] {
            let request = LookupRequest::new(prefix);
            let found = searcher.keywords(EntityKind::Author, Some(&request)).await.unwrap();
            assert_eq!(
                found.iter().map(|k| k.value.as_str()).collect::<Vec<_>>(),
                vec![expected],
                "prefix {prefix}"
            );
        }
    }
}

#[tokio::test]
async fn test_relation_type_lookup() {
    let searcher = searcher(Dialect::MySql);
    let children = searcher.relation_types(true, None).await.unwrap();
    assert_eq!(
        children.iter().map(|t| t.value.as_str()).collect::<Vec<_>>(),
        vec!["commentaire de", "traduction de"]
    );
    let request = LookupRequest::new("trad").with_limit(1);
    let parents = searcher.relation_types(false, Some(&request)).await.unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].value, "traduit par");
}
