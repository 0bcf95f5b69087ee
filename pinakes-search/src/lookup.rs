//! Vocabulary lookup queries
//!
//! Lookups feed filter pickers: the keywords actually attached to authors
//! or works, and the relation type labels. Both return `id`/`value` rows
//! ordered by value, optionally restricted to a prefix. Prefixes are
//! compared case-insensitively against the stored labels, diacritics
//! included.

use crate::request::LookupRequest;
use crate::schema;
use crate::sql::{Column, Condition, Query};
use crate::text::{CompositeTextFilter, TextFilter};
use crate::token::escape_like;
use pinakes_core::EntityKind;

/// Keywords linked to at least one entity of `target`.
pub fn keyword_query(target: EntityKind, request: Option<&LookupRequest>) -> Query {
    let (link_table, link_column) = match target {
        EntityKind::Author => (schema::KEYWORDS_AUTHORS, "id_auteur"),
        EntityKind::Work => (schema::KEYWORDS_WORKS, "id_oeuvre"),
    };
    let linked = Query::from_aliased(link_table, "kl")
        .select(Column::new("kl", link_column))
        .filter(Condition::columns_eq("kl.id_keyword", "k.id"));

    let query = Query::from_aliased(schema::KEYWORDS, "k")
        .select("k.id")
        .select_as("k.keyword", "value")
        .filter(Condition::exists(linked))
        .order_by("k.keyword");
    restrict(query, "k.keyword", request)
}

/// Relation types labelled with their child role, or their parent role
/// when `child` is false.
pub fn relation_type_query(child: bool, request: Option<&LookupRequest>) -> Query {
    let label = if child { "rt.child_role" } else { "rt.parent_role" };
    let query = Query::from_aliased(schema::RELATION_TYPES, "rt")
        .select("rt.id")
        .select_as(label, "value")
        .order_by(label);
    restrict(query, label, request)
}

fn restrict(mut query: Query, column: &str, request: Option<&LookupRequest>) -> Query {
    let defaults = LookupRequest::default();
    let request = request.unwrap_or(&defaults);
    if let Some(text) = request.text.as_deref() {
        let prefix = CompositeTextFilter::lookup().apply(text);
        if !prefix.is_empty() {
            query = query.filter(Condition::like(column, format!("{}%", escape_like(&prefix))));
        }
    }
    if request.limit > 0 {
        query = query.limit(i64::from(request.limit));
    }
    query
}
