//! Author query builder

use super::{base_query, century_filter, table_alias, EntityQueryBuilder};
use crate::request::AuthorSearchRequest;
use crate::schema;
use crate::sql::{Column, Condition, Query, Source};
use pinakes_core::{DateField, EntityKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorQueryBuilder;

impl AuthorQueryBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl EntityQueryBuilder for AuthorQueryBuilder {
    type Request = AuthorSearchRequest;

    fn kind(&self) -> EntityKind {
        EntityKind::Author
    }

    fn table(&self) -> &'static str {
        schema::AUTHORS
    }

    fn sort_column(&self) -> &'static str {
        "nom"
    }

    fn sort_key(&self) -> &'static str {
        "name"
    }

    fn non_text_query(&self, request: &AuthorSearchRequest, ordinal: usize) -> Query {
        let t = table_alias(ordinal);
        let id = Column::new(t.as_str(), "id");
        let mut query = base_query(schema::AUTHORS, &t);

        if let Some(is_category) = request.is_category {
            query = query.filter(Condition::eq(
                Column::new(t.as_str(), "is_categorie"),
                i32::from(is_category),
            ));
        }

        query = century_filter(
            query,
            &t,
            DateField::Author,
            request.century_min,
            request.century_max,
        );

        if !request.keyword_ids.is_empty() {
            query = query
                .join(
                    Source::table(schema::KEYWORDS_AUTHORS),
                    id.clone(),
                    Column::new(schema::KEYWORDS_AUTHORS, "id_auteur"),
                )
                .filter(Condition::in_list(
                    Column::new(schema::KEYWORDS_AUTHORS, "id_keyword"),
                    request.keyword_ids.iter().copied(),
                ));
        }

        if let Some(parent_id) = request.parent_id {
            query = query
                .join(
                    Source::table(schema::AUTHOR_CATEGORIES),
                    id,
                    Column::new(schema::AUTHOR_CATEGORIES, "id_auteur"),
                )
                .filter(Condition::eq(
                    Column::new(schema::AUTHOR_CATEGORIES, "id_categorie"),
                    parent_id,
                ));
        }

        query
    }

    fn scalar_columns(&self, query: Query, alias: &str) -> Query {
        query
            .select(Column::new(alias, "id"))
            .select_as(Column::new(alias, "nom"), "name")
            .select_as(Column::new(alias, "siecle"), "century")
            .select(Column::new(alias, "dates"))
            .select_as(Column::new(alias, "remarque"), "note")
            .select_as(Column::new(alias, "is_categorie"), "is_category")
    }

    fn related_columns(&self, query: Query, page: &str, _detail: bool) -> Query {
        let page_id = Column::new(page, "id");
        ["id", "name", "century", "dates", "note", "is_category"]
            .into_iter()
            .fold(query, |q, name| q.select(Column::new(page, name)))
            .select_as("aa.nom", "alias")
            .select_as("k.id", "keyword_id")
            .select_as("k.keyword", "keyword_value")
            .left_join(
                Source::aliased(schema::AUTHOR_ALIASES, "aa"),
                "aa.id_auteur",
                page_id.clone(),
            )
            .left_join(
                Source::aliased(schema::KEYWORDS_AUTHORS, "ka"),
                "ka.id_auteur",
                page_id,
            )
            .left_join(Source::aliased(schema::KEYWORDS, "k"), "k.id", "ka.id_keyword")
            .order_by("aa.nom")
            .order_by("k.keyword")
    }
}
