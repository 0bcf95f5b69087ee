//! Consolidated search results

use pinakes_core::{EntityId, LookupResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthorResult {
    pub id: EntityId,
    pub name: String,
    /// Distinct alternative names, in first-seen order.
    pub aliases: Vec<String>,
    pub century: Option<String>,
    pub dates: Option<String>,
    pub note: Option<String>,
    /// True for category pseudo-authors used to group real authors.
    pub is_category: bool,
    /// Distinct keywords by id, in first-seen order.
    pub keywords: Vec<LookupResult>,
}

/// An author of a work, with the role the author plays in it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkResultAuthor {
    pub id: EntityId,
    pub name: String,
    pub role_id: Option<EntityId>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkResult {
    pub id: EntityId,
    pub title: String,
    pub titulus: Option<String>,
    pub century: Option<String>,
    pub dates: Option<String>,
    pub place: Option<String>,
    pub note: Option<String>,
    /// Distinct authors by id, in first-seen order.
    pub authors: Vec<WorkResultAuthor>,
    pub keywords: Vec<LookupResult>,
}

/// A work with the fields shown only on its detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkDetailResult {
    #[serde(flatten)]
    pub work: WorkResult,
    pub incipit: Option<String>,
    pub desinit: Option<String>,
    pub dates_note: Option<String>,
    pub place_note: Option<String>,
    pub manager: Option<String>,
    pub team: Option<String>,
}
