//! Search requests
//!
//! Every search request shares the text part ([`TextRequest`]) and adds its
//! entity-specific filters. Zero-valued century bounds and empty id lists
//! mean "no filter".

use crate::scope::parse_scope_list;
use pinakes_core::{EntityId, PagingOptions, PinakesError, PinakesResult};
use serde::{Deserialize, Serialize};

/// Text, scope, combination mode and paging of a search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRequest {
    #[serde(flatten)]
    pub paging: PagingOptions,
    /// Space-separated tokens, each optionally operator-prefixed.
    pub text: Option<String>,
    /// Field codes restricting where tokens match; empty means the default.
    pub text_scope: Vec<String>,
    /// OR the tokens instead of AND-ing them.
    pub match_any: bool,
}

impl TextRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_paging(mut self, page_number: i32, page_size: i32) -> Self {
        self.paging = PagingOptions::new(page_number, page_size);
        self
    }

    pub fn with_match_any(mut self, match_any: bool) -> Self {
        self.match_any = match_any;
        self
    }

    /// Set the scope from a comma-delimited list of codes.
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.text_scope = parse_scope_list(scope);
        self
    }
}

/// Common view of the requests the paged builders accept.
pub trait TextBasedRequest {
    fn text_request(&self) -> &TextRequest;

    fn paging(&self) -> PagingOptions {
        self.text_request().paging
    }

    fn validate(&self) -> PinakesResult<()> {
        let paging = self.paging();
        if paging.is_paged() && paging.page_number < 1 {
            return Err(PinakesError::invalid_input(format!(
                "page number must be at least 1, got {}",
                paging.page_number
            )));
        }
        Ok(())
    }
}

// ============================================================================
// AUTHORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorSearchRequest {
    #[serde(flatten)]
    pub base: TextRequest,
    /// Only categories (`true`) or only real authors (`false`).
    pub is_category: Option<bool>,
    pub century_min: i32,
    pub century_max: i32,
    pub keyword_ids: Vec<EntityId>,
    /// Only authors filed under this category author.
    pub parent_id: Option<EntityId>,
}

impl AuthorSearchRequest {
    pub fn new(base: TextRequest) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }
}

impl TextBasedRequest for AuthorSearchRequest {
    fn text_request(&self) -> &TextRequest {
        &self.base
    }
}

// ============================================================================
// WORKS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkSearchRequest {
    #[serde(flatten)]
    pub base: TextRequest,
    pub author_id: Option<EntityId>,
    /// Only works contained in this manuscript.
    pub dictyon_id: Option<EntityId>,
    pub century_min: i32,
    pub century_max: i32,
    pub keyword_ids: Vec<EntityId>,
    /// Only works that are the child of a relation of one of these types.
    pub relation_ids: Vec<EntityId>,
    /// Restricts the relation filter to this parent work.
    pub relation_target_id: Option<EntityId>,
    pub external_id_type: Option<EntityId>,
    /// Restricts the external identifier filter to this value.
    pub external_id_value: Option<String>,
}

impl WorkSearchRequest {
    pub fn new(base: TextRequest) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }
}

impl TextBasedRequest for WorkSearchRequest {
    fn text_request(&self) -> &TextRequest {
        &self.base
    }
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Default number of vocabulary entries returned by a lookup.
pub const DEFAULT_LOOKUP_LIMIT: i32 = 20;

/// Prefix filter and cap for vocabulary lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupRequest {
    pub text: Option<String>,
    /// Maximum entries; zero or less means no limit.
    pub limit: i32,
}

impl Default for LookupRequest {
    fn default() -> Self {
        Self {
            text: None,
            limit: DEFAULT_LOOKUP_LIMIT,
        }
    }
}

impl LookupRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }
}
