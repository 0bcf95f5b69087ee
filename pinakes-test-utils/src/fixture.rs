//! Catalog fixtures
//!
//! [`CatalogFixture`] builds a small catalog the way the indexers would
//! leave it: catalog tables, the text index (`eix_token`/`eix_occurrence`)
//! filled from the indexed fields, and the date index (`pix_date`) filled
//! from century expressions.

use crate::memory::{MemoryDatabase, MemoryExecutor};
use pinakes_core::{DateField, DateIndexEntry, EntityId};
use pinakes_search::schema;
use pinakes_search::sql::Dialect;
use pinakes_search::{CompositeTextFilter, FieldCode, SqlRow, TextFilter};
use std::collections::HashMap;

/// An author record.
#[derive(Debug, Clone, Default)]
pub struct AuthorFixture {
    pub id: EntityId,
    pub name: String,
    pub century: Option<String>,
    pub dates: Option<String>,
    pub note: Option<String>,
    pub is_category: bool,
    pub aliases: Vec<String>,
    pub keyword_ids: Vec<EntityId>,
    pub category_ids: Vec<EntityId>,
}

impl AuthorFixture {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn century(mut self, century: &str) -> Self {
        self.century = Some(century.to_string());
        self
    }

    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn category(mut self) -> Self {
        self.is_category = true;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn keyword(mut self, keyword_id: EntityId) -> Self {
        self.keyword_ids.push(keyword_id);
        self
    }

    /// File this author under the category author `category_id`.
    pub fn in_category(mut self, category_id: EntityId) -> Self {
        self.category_ids.push(category_id);
        self
    }
}

/// A work record.
#[derive(Debug, Clone, Default)]
pub struct WorkFixture {
    pub id: EntityId,
    pub title: String,
    pub titulus: Option<String>,
    pub century: Option<String>,
    pub place: Option<String>,
    pub note: Option<String>,
    pub incipit: Option<String>,
    pub desinit: Option<String>,
    pub team: Option<String>,
    pub alias_titles: Vec<String>,
    /// `(author id, role id)`
    pub authors: Vec<(EntityId, Option<EntityId>)>,
    pub keyword_ids: Vec<EntityId>,
    pub dictyon_ids: Vec<EntityId>,
}

impl WorkFixture {
    pub fn new(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn titulus(mut self, titulus: &str) -> Self {
        self.titulus = Some(titulus.to_string());
        self
    }

    pub fn century(mut self, century: &str) -> Self {
        self.century = Some(century.to_string());
        self
    }

    pub fn place(mut self, place: &str) -> Self {
        self.place = Some(place.to_string());
        self
    }

    pub fn incipit(mut self, incipit: &str) -> Self {
        self.incipit = Some(incipit.to_string());
        self
    }

    pub fn desinit(mut self, desinit: &str) -> Self {
        self.desinit = Some(desinit.to_string());
        self
    }

    pub fn team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    pub fn alias_title(mut self, title: &str) -> Self {
        self.alias_titles.push(title.to_string());
        self
    }

    pub fn author(mut self, author_id: EntityId, role_id: Option<EntityId>) -> Self {
        self.authors.push((author_id, role_id));
        self
    }

    pub fn keyword(mut self, keyword_id: EntityId) -> Self {
        self.keyword_ids.push(keyword_id);
        self
    }

    pub fn dictyon(mut self, dictyon_id: EntityId) -> Self {
        self.dictyon_ids.push(dictyon_id);
        self
    }
}

/// Builder for an indexed in-memory catalog.
#[derive(Debug, Clone)]
pub struct CatalogFixture {
    db: MemoryDatabase,
    token_ids: HashMap<String, EntityId>,
    next_id: EntityId,
}

const TABLES: [&str; 17] = [
    schema::AUTHORS,
    schema::AUTHOR_ALIASES,
    schema::AUTHOR_CATEGORIES,
    schema::WORKS,
    schema::WORK_AUTHORS,
    schema::WORK_MANUSCRIPTS,
    schema::ROLES,
    schema::KEYWORDS,
    schema::KEYWORDS_AUTHORS,
    schema::KEYWORDS_WORKS,
    schema::RELATIONS,
    schema::RELATION_TYPES,
    schema::IDENTIFIERS,
    schema::WORK_IDENTIFIERS,
    schema::OCCURRENCES,
    schema::TOKENS,
    schema::DATES,
];

impl Default for CatalogFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogFixture {
    pub fn new() -> Self {
        let mut db = MemoryDatabase::new();
        for table in TABLES {
            db.create_table(table);
        }
        Self {
            db,
            token_ids: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn keyword(mut self, id: EntityId, keyword: &str) -> Self {
        self.db.insert(
            schema::KEYWORDS,
            SqlRow::new().with("id", id).with("keyword", keyword),
        );
        self
    }

    pub fn role(mut self, id: EntityId, name: &str) -> Self {
        self.db.insert(
            schema::ROLES,
            SqlRow::new().with("id", id).with("nom", name),
        );
        self
    }

    pub fn relation_type(mut self, id: EntityId, child_role: &str, parent_role: &str) -> Self {
        self.db.insert(
            schema::RELATION_TYPES,
            SqlRow::new()
                .with("id", id)
                .with("child_role", child_role)
                .with("parent_role", parent_role),
        );
        self
    }

    /// Link `child` to `parent` with relation type `type_id`.
    pub fn relation(mut self, parent: EntityId, child: EntityId, type_id: EntityId) -> Self {
        self.db.insert(
            schema::RELATIONS,
            SqlRow::new()
                .with("id_parent", parent)
                .with("id_child", child)
                .with("id_type", type_id),
        );
        self
    }

    /// Attach external identifier `id` of type `type_id` to `work_id`.
    pub fn identifier(
        mut self,
        work_id: EntityId,
        id: EntityId,
        type_id: EntityId,
        value: &str,
    ) -> Self {
        self.db.insert(
            schema::IDENTIFIERS,
            SqlRow::new()
                .with("id", id)
                .with("id_type", type_id)
                .with("valeur", value),
        );
        self.db.insert(
            schema::WORK_IDENTIFIERS,
            SqlRow::new()
                .with("id_oeuvre", work_id)
                .with("id_identifiant", id),
        );
        self
    }

    pub fn author(mut self, author: AuthorFixture) -> Self {
        self.db.insert(
            schema::AUTHORS,
            SqlRow::new()
                .with("id", author.id)
                .with("nom", author.name.as_str())
                .with("siecle", author.century.clone())
                .with("dates", author.dates.clone())
                .with("remarque", author.note.clone())
                .with("is_categorie", i32::from(author.is_category)),
        );
        self.index(FieldCode::AuthorName, author.id, &author.name);
        for (i, alias) in author.aliases.iter().enumerate() {
            self.db.insert(
                schema::AUTHOR_ALIASES,
                SqlRow::new()
                    .with("id", author.id * 100 + i as EntityId)
                    .with("id_auteur", author.id)
                    .with("nom", alias.as_str()),
            );
            self.index(FieldCode::AuthorAlias, author.id, alias);
        }
        for keyword_id in &author.keyword_ids {
            self.db.insert(
                schema::KEYWORDS_AUTHORS,
                SqlRow::new()
                    .with("id_auteur", author.id)
                    .with("id_keyword", *keyword_id),
            );
        }
        for category_id in &author.category_ids {
            self.db.insert(
                schema::AUTHOR_CATEGORIES,
                SqlRow::new()
                    .with("id_auteur", author.id)
                    .with("id_categorie", *category_id),
            );
        }

        if let Some(note) = &author.note {
            self.index(FieldCode::AuthorNote, author.id, note);
        }
        if let Some(century) = &author.century {
            self.index_date(DateField::Author, author.id, century);
        }
        self
    }

    pub fn work(mut self, work: WorkFixture) -> Self {
        self.db.insert(
            schema::WORKS,
            SqlRow::new()
                .with("id", work.id)
                .with("titre", work.title.as_str())
                .with("titulus", work.titulus.clone())
                .with("siecle", work.century.clone())
                .with("dates", Option::<String>::None)
                .with("lieu", work.place.clone())
                .with("remarque", work.note.clone())
                .with("incipit", work.incipit.clone())
                .with("desinit", work.desinit.clone())
                .with("remarque_dates", Option::<String>::None)
                .with("remarque_lieu", Option::<String>::None)
                .with("responsable", Option::<String>::None)
                .with("equipe", work.team.clone()),
        );
        for (author_id, role_id) in &work.authors {
            self.db.insert(
                schema::WORK_AUTHORS,
                SqlRow::new()
                    .with("id_oeuvre", work.id)
                    .with("id_auteur", *author_id)
                    .with("id_role", *role_id),
            );
        }
        for keyword_id in &work.keyword_ids {
            self.db.insert(
                schema::KEYWORDS_WORKS,
                SqlRow::new()
                    .with("id_oeuvre", work.id)
                    .with("id_keyword", *keyword_id),
            );
        }
        for dictyon_id in &work.dictyon_ids {
            self.db.insert(
                schema::WORK_MANUSCRIPTS,
                SqlRow::new()
                    .with("id_oeuvre", work.id)
                    .with("id_manuscrit", *dictyon_id),
            );
        }

        self.index(FieldCode::WorkTitle, work.id, &work.title);
        for title in &work.alias_titles {
            self.index(FieldCode::WorkAliasTitle, work.id, title);
        }
        let optional = [
            (FieldCode::WorkTitulus, &work.titulus),
            (FieldCode::WorkIncipit, &work.incipit),
            (FieldCode::WorkDesinit, &work.desinit),
            (FieldCode::WorkPlace, &work.place),
            (FieldCode::WorkNote, &work.note),
        ];
        for (field, text) in optional {
            if let Some(text) = text {
                self.index(field, work.id, text);
            }
        }
        if let Some(century) = &work.century {
            self.index_date(DateField::Work, work.id, century);
        }
        self
    }

    /// The catalog built so far.
    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }

    pub fn build(self) -> MemoryDatabase {
        self.db
    }

    pub fn executor(self, dialect: Dialect) -> MemoryExecutor {
        MemoryExecutor::new(self.db).with_dialect(dialect)
    }

    /// Record one occurrence per distinct normalized token of `text`.
    fn index(&mut self, field: FieldCode, target_id: EntityId, text: &str) {
        let normalized = CompositeTextFilter::standard().apply(text);
        let mut seen: Vec<&str> = Vec::new();
        for value in normalized.split_whitespace() {
            if seen.contains(&value) {
                continue;
            }
            seen.push(value);
            let token_id = self.token_id(value);
            self.db.insert(
                schema::OCCURRENCES,
                SqlRow::new()
                    .with("token_id", token_id)
                    .with("field", field.code())
                    .with("target_id", target_id),
            );
        }
    }

    fn token_id(&mut self, value: &str) -> EntityId {
        if let Some(id) = self.token_ids.get(value) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.token_ids.insert(value.to_string(), id);
        self.db.insert(
            schema::TOKENS,
            SqlRow::new().with("id", id).with("value", value),
        );
        id
    }

    fn index_date(&mut self, field: DateField, target_id: EntityId, century: &str) {
        for entry in DateIndexEntry::build_all(field, [(target_id, century)]) {
            self.db.insert(
                schema::DATES,
                SqlRow::new()
                    .with("field", entry.field.code())
                    .with("target_id", entry.target_id)
                    .with("date_txt", entry.date_txt)
                    .with("date_val", entry.date_val)
                    .with("source", entry.source),
            );
        }
    }
}
