//! Pinakes Test Utilities
//!
//! Shared test infrastructure for the Pinakes workspace:
//! - an in-memory query executor evaluating query trees without a database
//! - catalog fixtures indexed the way the indexers fill the index tables
//! - proptest generators for catalogs and requests

pub mod fixture;
pub mod memory;

pub use fixture::{AuthorFixture, CatalogFixture, WorkFixture};
pub use memory::{trigram_similarity, MemoryDatabase, MemoryExecutor};

// Re-export the types tests use most
pub use pinakes_core::{DataPage, EntityId, EntityKind, PagingOptions, PinakesError, PinakesResult};
pub use pinakes_search::{
    AuthorResult, AuthorSearchRequest, LookupRequest, Searcher, TextRequest, WorkDetailResult,
    WorkResult, WorkSearchRequest,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// Latin-ish words the generated catalogs are built from, so that
    /// generated search text actually hits indexed tokens.
    pub const VOCABULARY: [&str; 12] = [
        "sermo", "vita", "sancti", "epistola", "homilia", "beati", "martyrium", "liber",
        "passio", "translatio", "miracula", "augustini",
    ];

    pub fn arb_word() -> impl Strategy<Value = String> {
        prop::sample::select(VOCABULARY.to_vec()).prop_map(str::to_string)
    }

    /// A title of one to four vocabulary words.
    pub fn arb_title() -> impl Strategy<Value = String> {
        prop::collection::vec(arb_word(), 1..5).prop_map(|words| words.join(" "))
    }

    /// Search text: one to three words, sometimes prefix-matched.
    pub fn arb_search_text() -> impl Strategy<Value = String> {
        prop::collection::vec((arb_word(), any::<bool>()), 1..4).prop_map(|tokens| {
            tokens
                .into_iter()
                .map(|(word, prefix)| {
                    if prefix {
                        format!("^={}", &word[..3])
                    } else {
                        word
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    /// A catalog of works with distinct ids and generated titles, and a few
    /// authors named from the vocabulary.
    pub fn arb_catalog() -> impl Strategy<Value = CatalogFixture> {
        (
            prop::collection::vec(arb_title(), 0..12),
            prop::collection::vec(arb_title(), 0..6),
        )
            .prop_map(|(work_titles, author_names)| {
                let mut catalog = CatalogFixture::new();
                for (i, title) in work_titles.into_iter().enumerate() {
                    catalog = catalog.work(WorkFixture::new(i as EntityId + 1, title));
                }
                for (i, name) in author_names.into_iter().enumerate() {
                    catalog = catalog.author(AuthorFixture::new(i as EntityId + 1, name));
                }
                catalog
            })
    }

    pub fn arb_paging() -> impl Strategy<Value = PagingOptions> {
        (1i32..4, prop_oneof![Just(0i32), 1i32..6])
            .prop_map(|(page_number, page_size)| PagingOptions::new(page_number, page_size))
    }
}
