//! Catalog schema names
//!
//! Table names of the imported catalog and of the index tables written by
//! the indexers. Column names are spelled out where the tables are queried.

// ============================================================================
// CATALOG
// ============================================================================

/// Authors and author categories (`id, nom, siecle, dates, remarque, is_categorie`).
pub const AUTHORS: &str = "auteurs";

/// Alternative author names (`id_auteur, nom`).
pub const AUTHOR_ALIASES: &str = "auteurs_alias";

/// Author to category links (`id_auteur, id_categorie`).
pub const AUTHOR_CATEGORIES: &str = "auteurs_categories";

/// Works (`id, titre, titulus, siecle, dates, lieu, remarque, incipit, desinit,
/// remarque_dates, remarque_lieu, responsable, equipe`).
pub const WORKS: &str = "oeuvres";

/// Work to author links with the author's role (`id_oeuvre, id_auteur, id_role`).
pub const WORK_AUTHORS: &str = "oeuvres_auteurs";

/// Work to manuscript links (`id_oeuvre, id_manuscrit`).
pub const WORK_MANUSCRIPTS: &str = "oeuvres_manuscrits";

/// Author roles (`id, nom`).
pub const ROLES: &str = "roles";

/// Keyword vocabulary (`id, keyword`).
pub const KEYWORDS: &str = "keywords";

/// Keyword to author links (`id_auteur, id_keyword`).
pub const KEYWORDS_AUTHORS: &str = "keywords_auteurs";

/// Keyword to work links (`id_oeuvre, id_keyword`).
pub const KEYWORDS_WORKS: &str = "keywords_oeuvres";

/// Relations between works (`id_parent, id_child, id_type`).
pub const RELATIONS: &str = "relations";

/// Relation types (`id, child_role, parent_role`).
pub const RELATION_TYPES: &str = "relations_types";

/// External identifiers (`id, id_type, valeur`).
pub const IDENTIFIERS: &str = "identifiants";

/// Work to external identifier links (`id_oeuvre, id_identifiant`).
pub const WORK_IDENTIFIERS: &str = "identifiants_oeuvres";

// ============================================================================
// INDEXES
// ============================================================================

/// Text occurrences (`target_id, field, token_id`).
pub const OCCURRENCES: &str = "eix_occurrence";

/// Indexed token values (`id, value`).
pub const TOKENS: &str = "eix_token";

/// Parsed dates (`field, target_id, date_txt, date_val, source`).
pub const DATES: &str = "pix_date";
