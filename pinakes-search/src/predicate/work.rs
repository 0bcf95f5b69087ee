//! Work query builder

use super::{base_query, century_filter, table_alias, EntityQueryBuilder};
use crate::request::WorkSearchRequest;
use crate::schema;
use crate::sql::{Column, Condition, Query, Source};
use pinakes_core::{DateField, EntityKind};

const SCALAR_NAMES: [&str; 7] = ["id", "title", "titulus", "century", "dates", "place", "note"];

const DETAIL_NAMES: [&str; 6] = [
    "incipit",
    "desinit",
    "dates_note",
    "place_note",
    "manager",
    "team",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkQueryBuilder;

impl WorkQueryBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl EntityQueryBuilder for WorkQueryBuilder {
    type Request = WorkSearchRequest;

    fn kind(&self) -> EntityKind {
        EntityKind::Work
    }

    fn table(&self) -> &'static str {
        schema::WORKS
    }

    fn sort_column(&self) -> &'static str {
        "titre"
    }

    fn sort_key(&self) -> &'static str {
        "title"
    }

    fn non_text_query(&self, request: &WorkSearchRequest, ordinal: usize) -> Query {
        let t = table_alias(ordinal);
        let id = Column::new(t.as_str(), "id");
        let mut query = base_query(schema::WORKS, &t);

        if let Some(author_id) = request.author_id {
            query = query
                .join(
                    Source::table(schema::WORK_AUTHORS),
                    id.clone(),
                    Column::new(schema::WORK_AUTHORS, "id_oeuvre"),
                )
                .filter(Condition::eq(
                    Column::new(schema::WORK_AUTHORS, "id_auteur"),
                    author_id,
                ));
        }

        if let Some(dictyon_id) = request.dictyon_id {
            query = query
                .join(
                    Source::table(schema::WORK_MANUSCRIPTS),
                    id.clone(),
                    Column::new(schema::WORK_MANUSCRIPTS, "id_oeuvre"),
                )
                .filter(Condition::eq(
                    Column::new(schema::WORK_MANUSCRIPTS, "id_manuscrit"),
                    dictyon_id,
                ));
        }

        query = century_filter(
            query,
            &t,
            DateField::Work,
            request.century_min,
            request.century_max,
        );

        if !request.keyword_ids.is_empty() {
            query = query
                .join(
                    Source::table(schema::KEYWORDS_WORKS),
                    id.clone(),
                    Column::new(schema::KEYWORDS_WORKS, "id_oeuvre"),
                )
                .filter(Condition::in_list(
                    Column::new(schema::KEYWORDS_WORKS, "id_keyword"),
                    request.keyword_ids.iter().copied(),
                ));
        }

        if !request.relation_ids.is_empty() || request.relation_target_id.is_some() {
            query = query.join(
                Source::table(schema::RELATIONS),
                id.clone(),
                Column::new(schema::RELATIONS, "id_child"),
            );
            if !request.relation_ids.is_empty() {
                query = query.filter(Condition::in_list(
                    Column::new(schema::RELATIONS, "id_type"),
                    request.relation_ids.iter().copied(),
                ));
            }
            if let Some(target_id) = request.relation_target_id {
                query = query.filter(Condition::eq(
                    Column::new(schema::RELATIONS, "id_parent"),
                    target_id,
                ));
            }
        }

        if let Some(id_type) = request.external_id_type {
            query = query
                .join(
                    Source::table(schema::WORK_IDENTIFIERS),
                    id,
                    Column::new(schema::WORK_IDENTIFIERS, "id_oeuvre"),
                )
                .join(
                    Source::table(schema::IDENTIFIERS),
                    Column::new(schema::WORK_IDENTIFIERS, "id_identifiant"),
                    Column::new(schema::IDENTIFIERS, "id"),
                )
                .filter(Condition::eq(
                    Column::new(schema::IDENTIFIERS, "id_type"),
                    id_type,
                ));
            if let Some(value) = request.external_id_value.as_deref().filter(|v| !v.is_empty()) {
                query = query.filter(Condition::eq(
                    Column::new(schema::IDENTIFIERS, "valeur"),
                    value,
                ));
            }
        }

        query
    }

    fn scalar_columns(&self, query: Query, alias: &str) -> Query {
        query
            .select(Column::new(alias, "id"))
            .select_as(Column::new(alias, "titre"), "title")
            .select(Column::new(alias, "titulus"))
            .select_as(Column::new(alias, "siecle"), "century")
            .select(Column::new(alias, "dates"))
            .select_as(Column::new(alias, "lieu"), "place")
            .select_as(Column::new(alias, "remarque"), "note")
    }

    fn detail_columns(&self, query: Query, alias: &str) -> Query {
        query
            .select(Column::new(alias, "incipit"))
            .select(Column::new(alias, "desinit"))
            .select_as(Column::new(alias, "remarque_dates"), "dates_note")
            .select_as(Column::new(alias, "remarque_lieu"), "place_note")
            .select_as(Column::new(alias, "responsable"), "manager")
            .select_as(Column::new(alias, "equipe"), "team")
    }

    fn related_columns(&self, query: Query, page: &str, detail: bool) -> Query {
        let page_id = Column::new(page, "id");
        let mut query = SCALAR_NAMES
            .into_iter()
            .fold(query, |q, name| q.select(Column::new(page, name)));
        if detail {
            query = DETAIL_NAMES
                .into_iter()
                .fold(query, |q, name| q.select(Column::new(page, name)));
        }
        query
            .select_as("wa.id", "author_id")
            .select_as("wa.nom", "author_name")
            .select_as("wl.id_role", "author_role_id")
            .select_as("r.nom", "author_role")
            .select_as("k.id", "keyword_id")
            .select_as("k.keyword", "keyword_value")
            .left_join(
                Source::aliased(schema::WORK_AUTHORS, "wl"),
                "wl.id_oeuvre",
                page_id.clone(),
            )
            .left_join(Source::aliased(schema::AUTHORS, "wa"), "wa.id", "wl.id_auteur")
            .left_join(Source::aliased(schema::ROLES, "r"), "r.id", "wl.id_role")
            .left_join(
                Source::aliased(schema::KEYWORDS_WORKS, "ko"),
                "ko.id_oeuvre",
                page_id,
            )
            .left_join(Source::aliased(schema::KEYWORDS, "k"), "k.id", "ko.id_keyword")
            .order_by("wa.nom")
            .order_by("k.keyword")
    }
}
