//! Result consolidation
//!
//! Data queries return one row per combination of an entity's related
//! records. Consolidation folds each contiguous run of rows sharing an id
//! into one result, collecting related records without duplicates.
//!
//! Rows of one entity must be contiguous. The data query's ordering
//! guarantees this; an interleaved stream yields one result per run.

use crate::results::{AuthorResult, WorkDetailResult, WorkResult, WorkResultAuthor};
use crate::rows::{AuthorRow, WorkDetailRow, WorkRow};
use pinakes_core::{EntityId, LookupResult};

/// A result built from a run of denormalized rows.
pub trait Consolidate: Sized {
    type Row;

    fn row_id(row: &Self::Row) -> EntityId;

    fn id(&self) -> EntityId;

    /// A result holding `row`'s scalar columns and no related records.
    fn start(row: &Self::Row) -> Self;

    /// Add `row`'s related records not yet present.
    fn absorb(&mut self, row: &Self::Row);

    /// Rows that consolidate back into `self`.
    fn flatten(&self) -> Vec<Self::Row>;
}

/// Fold `rows` into results, one per run of equal ids.
pub fn consolidate<C, I>(rows: I) -> Vec<C>
where
    C: Consolidate,
    I: IntoIterator<Item = C::Row>,
{
    rows.into_iter().fold(Vec::new(), |mut results: Vec<C>, row| {
        let row_id = C::row_id(&row);
        match results.last_mut() {
            Some(current) if current.id() == row_id => current.absorb(&row),
            _ => {
                let mut next = C::start(&row);
                next.absorb(&row);
                results.push(next);
            }
        }
        results
    })
}

/// Flatten every result back into rows, in order.
pub fn flatten<C: Consolidate>(results: &[C]) -> Vec<C::Row> {
    results.iter().flat_map(|r| r.flatten()).collect()
}

fn push_keyword(keywords: &mut Vec<LookupResult>, id: Option<EntityId>, value: &Option<String>) {
    if let Some(id) = id {
        if !keywords.iter().any(|k| k.id == id) {
            keywords.push(LookupResult {
                id,
                value: value.clone().unwrap_or_default(),
            });
        }
    }
}

// ============================================================================
// AUTHORS
// ============================================================================

impl Consolidate for AuthorResult {
    type Row = AuthorRow;

    fn row_id(row: &AuthorRow) -> EntityId {
        row.id
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn start(row: &AuthorRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            aliases: Vec::new(),
            century: row.century.clone(),
            dates: row.dates.clone(),
            note: row.note.clone(),
            is_category: row.is_category,
            keywords: Vec::new(),
        }
    }

    fn absorb(&mut self, row: &AuthorRow) {
        if let Some(alias) = &row.alias {
            if !self.aliases.contains(alias) {
                self.aliases.push(alias.clone());
            }
        }
        push_keyword(&mut self.keywords, row.keyword_id, &row.keyword_value);
    }

    fn flatten(&self) -> Vec<AuthorRow> {
        let count = self.aliases.len().max(self.keywords.len()).max(1);
        (0..count)
            .map(|i| {
                let keyword = self.keywords.get(i);
                AuthorRow {
                    id: self.id,
                    name: self.name.clone(),
                    century: self.century.clone(),
                    dates: self.dates.clone(),
                    note: self.note.clone(),
                    is_category: self.is_category,
                    alias: self.aliases.get(i).cloned(),
                    keyword_id: keyword.map(|k| k.id),
                    keyword_value: keyword.map(|k| k.value.clone()),
                }
            })
            .collect()
    }
}

// ============================================================================
// WORKS
// ============================================================================

impl Consolidate for WorkResult {
    type Row = WorkRow;

    fn row_id(row: &WorkRow) -> EntityId {
        row.id
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn start(row: &WorkRow) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            titulus: row.titulus.clone(),
            century: row.century.clone(),
            dates: row.dates.clone(),
            place: row.place.clone(),
            note: row.note.clone(),
            authors: Vec::new(),
            keywords: Vec::new(),
        }
    }

    fn absorb(&mut self, row: &WorkRow) {
        if let Some(author_id) = row.author_id {
            if !self.authors.iter().any(|a| a.id == author_id) {
                self.authors.push(WorkResultAuthor {
                    id: author_id,
                    name: row.author_name.clone().unwrap_or_default(),
                    role_id: row.author_role_id,
                    role: row.author_role.clone(),
                });
            }
        }
        push_keyword(&mut self.keywords, row.keyword_id, &row.keyword_value);
    }

    fn flatten(&self) -> Vec<WorkRow> {
        let count = self.authors.len().max(self.keywords.len()).max(1);
        (0..count)
            .map(|i| {
                let author = self.authors.get(i);
                let keyword = self.keywords.get(i);
                WorkRow {
                    id: self.id,
                    title: self.title.clone(),
                    titulus: self.titulus.clone(),
                    century: self.century.clone(),
                    dates: self.dates.clone(),
                    place: self.place.clone(),
                    note: self.note.clone(),
                    author_id: author.map(|a| a.id),
                    author_name: author.map(|a| a.name.clone()),
                    author_role_id: author.and_then(|a| a.role_id),
                    author_role: author.and_then(|a| a.role.clone()),
                    keyword_id: keyword.map(|k| k.id),
                    keyword_value: keyword.map(|k| k.value.clone()),
                }
            })
            .collect()
    }
}

impl Consolidate for WorkDetailResult {
    type Row = WorkDetailRow;

    fn row_id(row: &WorkDetailRow) -> EntityId {
        row.work.id
    }

    fn id(&self) -> EntityId {
        self.work.id
    }

    fn start(row: &WorkDetailRow) -> Self {
        Self {
            work: WorkResult::start(&row.work),
            incipit: row.incipit.clone(),
            desinit: row.desinit.clone(),
            dates_note: row.dates_note.clone(),
            place_note: row.place_note.clone(),
            manager: row.manager.clone(),
            team: row.team.clone(),
        }
    }

    fn absorb(&mut self, row: &WorkDetailRow) {
        self.work.absorb(&row.work);
    }

    fn flatten(&self) -> Vec<WorkDetailRow> {
        self.work
            .flatten()
            .into_iter()
            .map(|work| WorkDetailRow {
                work,
                incipit: self.incipit.clone(),
                desinit: self.desinit.clone(),
                dates_note: self.dates_note.clone(),
                place_note: self.place_note.clone(),
                manager: self.manager.clone(),
                team: self.team.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn author_row(id: EntityId, alias: Option<&str>, keyword: Option<(EntityId, &str)>) -> AuthorRow {
        AuthorRow {
            id,
            name: format!("author {}", id),
            alias: alias.map(str::to_string),
            keyword_id: keyword.map(|k| k.0),
            keyword_value: keyword.map(|k| k.1.to_string()),
            ..AuthorRow::default()
        }
    }

    #[test]
    fn test_empty_stream() {
        let results: Vec<AuthorResult> = consolidate(Vec::new());
        assert!(results.is_empty());
    }

    #[test]
    fn test_cross_product_is_deduplicated() {
        // two aliases x two keywords
        let rows = vec![
            author_row(1, Some("a"), Some((10, "x"))),
            author_row(1, Some("a"), Some((11, "y"))),
            author_row(1, Some("b"), Some((10, "x"))),
            author_row(1, Some("b"), Some((11, "y"))),
            author_row(2, None, None),
        ];
        let results: Vec<AuthorResult> = consolidate(rows);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].aliases, vec!["a", "b"]);
        assert_eq!(
            results[0].keywords.iter().map(|k| k.id).collect::<Vec<_>>(),
            vec![10, 11]
        );
        assert!(results[1].aliases.is_empty());
        assert!(results[1].keywords.is_empty());
    }

    #[test]
    fn test_interleaved_stream_splits_runs() {
        let rows = vec![
            author_row(1, Some("a"), None),
            author_row(2, None, None),
            author_row(1, Some("b"), None),
        ];
        let results: Vec<AuthorResult> = consolidate(rows);
        assert_eq!(
            results.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 1]
        );
    }

    #[test]
    fn test_work_authors_distinct_by_id_first_role_wins() {
        let row = |author_id: EntityId, role: &str| WorkRow {
            id: 5,
            title: "Vita".to_string(),
            author_id: Some(author_id),
            author_name: Some(format!("author {}", author_id)),
            author_role_id: Some(1),
            author_role: Some(role.to_string()),
            ..WorkRow::default()
        };
        let results: Vec<WorkResult> =
            consolidate(vec![row(3, "auteur"), row(3, "traducteur"), row(4, "auteur")]);
        assert_eq!(results.len(), 1);
        let authors = &results[0].authors;
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].role.as_deref(), Some("auteur"));
        assert_eq!(authors[1].id, 4);
    }

    #[test]
    fn test_work_detail_keeps_detail_fields() {
        let row = WorkDetailRow {
            work: WorkRow {
                id: 9,
                title: "Homilia".to_string(),
                keyword_id: Some(2),
                keyword_value: Some("homilétique".to_string()),
                ..WorkRow::default()
            },
            incipit: Some("In principio".to_string()),
            team: Some("IRHT".to_string()),
            ..WorkDetailRow::default()
        };
        let results: Vec<WorkDetailResult> = consolidate(vec![row.clone(), row]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].incipit.as_deref(), Some("In principio"));
        assert_eq!(results[0].work.keywords.len(), 1);
    }

    fn arb_author_rows() -> impl Strategy<Value = Vec<AuthorRow>> {
        prop::collection::vec(
            (
                1i32..6,
                prop::option::of("[a-c]"),
                prop::option::of(1i32..4),
            ),
            0..30,
        )
        .prop_map(|mut rows| {
            rows.sort_by_key(|r| r.0);
            rows.into_iter()
                .map(|(id, alias, keyword)| AuthorRow {
                    id,
                    name: format!("author {}", id),
                    alias,
                    keyword_id: keyword,
                    keyword_value: keyword.map(|k| format!("kw{}", k)),
                    ..AuthorRow::default()
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Re-flattening consolidated results and consolidating again
        /// yields the same results.
        #[test]
        fn prop_consolidation_is_idempotent(rows in arb_author_rows()) {
            let once: Vec<AuthorResult> = consolidate(rows);
            let twice: Vec<AuthorResult> = consolidate(flatten(&once));
            prop_assert_eq!(once, twice);
        }

        /// Sorted rows give one result per distinct id.
        #[test]
        fn prop_one_result_per_id(rows in arb_author_rows()) {
            let mut ids: Vec<EntityId> = rows.iter().map(|r| r.id).collect();
            ids.dedup();
            let results: Vec<AuthorResult> = consolidate(rows);
            prop_assert_eq!(results.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
        }
    }
}
