//! Listing query construction.
//!
//! A [`ListQuery`] is a conjunction of [`Predicate`]s plus a [`Sort`]. It can
//! be rendered to parameterised SQL or evaluated against an in-memory [`Note`].

use std::cmp::Ordering;

use crate::models::{NOTE_COLUMNS, Note};

/// Which slice of the notes table a listing covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    /// Every note outside the trash
    #[default]
    All,
    /// Important notes outside the trash
    Important,
    /// Notes in the trash
    Deleted,
}

impl Filter {
    /// Unknown values fall back to [`Filter::All`].
    pub fn parse(value: &str) -> Self {
        match value {
            "important" => Self::Important,
            "deleted" => Self::Deleted,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sort {
    /// Last modified first
    #[default]
    Newest,
    /// Last modified last
    Oldest,
    /// Title, A to Z
    AlphaAsc,
    /// Title, Z to A
    AlphaDesc,
    /// Important first, then last modified first
    Important,
}

impl Sort {
    /// Unknown values fall back to [`Sort::Newest`].
    pub fn parse(value: &str) -> Self {
        match value {
            "oldest" => Self::Oldest,
            "alpha-asc" => Self::AlphaAsc,
            "alpha-desc" => Self::AlphaDesc,
            "important" => Self::Important,
            _ => Self::Newest,
        }
    }

    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "updated_at DESC, id DESC",
            Self::Oldest => "updated_at ASC, id ASC",
            Self::AlphaAsc => "title ASC, id ASC",
            Self::AlphaDesc => "title DESC, id DESC",
            Self::Important => "important DESC, updated_at DESC, id DESC",
        }
    }

    /// Same ordering as [`Sort::order_by`], for notes already in memory.
    ///
    /// Titles compare by code point here; Postgres orders them by the column
    /// collation, so mixed-case or non-ASCII titles may sort differently.
    pub fn compare(self, a: &Note, b: &Note) -> Ordering {
        match self {
            Self::Newest => b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)),
            Self::Oldest => a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)),
            Self::AlphaAsc => a.title.cmp(&b.title).then(a.id.cmp(&b.id)),
            Self::AlphaDesc => b.title.cmp(&a.title).then(b.id.cmp(&a.id)),
            Self::Important => b
                .important
                .cmp(&a.important)
                .then(b.updated_at.cmp(&a.updated_at))
                .then(b.id.cmp(&a.id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Deleted(bool),
    Important,
    /// Case-insensitive substring match on title, content or any tag.
    /// Holds the term as typed; both sides are lowercased when compared.
    Search(String),
}

impl Predicate {
    /// Renders the predicate, using `$next` for its parameter if it needs one.
    fn render(&self, next: usize) -> (String, Option<String>) {
        match self {
            Self::Deleted(deleted) => (format!("deleted = {deleted}"), None),
            Self::Important => ("important = TRUE".to_string(), None),
            Self::Search(term) => (
                format!(
                    "(LOWER(title) LIKE LOWER(${next}) OR LOWER(content) LIKE LOWER(${next}) OR EXISTS \
                     (SELECT 1 FROM jsonb_array_elements_text(COALESCE(tags, '[]'::jsonb)) AS tag \
                     WHERE LOWER(tag) LIKE LOWER(${next})))"
                ),
                Some(format!("%{}%", escape_like(term))),
            ),
        }
    }

    pub fn matches(&self, note: &Note) -> bool {
        match self {
            Self::Deleted(deleted) => note.deleted == *deleted,
            Self::Important => note.important,
            Self::Search(term) => {
                let term = term.to_lowercase();
                note.title.to_lowercase().contains(&term)
                    || note.content.to_lowercase().contains(&term)
                    || note.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
            }
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    predicates: Vec<Predicate>,
    sort: Sort,
}

impl ListQuery {
    pub fn new(filter: Filter, search: Option<&str>, sort: Sort) -> Self {
        let mut predicates = match filter {
            Filter::All => vec![Predicate::Deleted(false)],
            Filter::Important => vec![Predicate::Important, Predicate::Deleted(false)],
            Filter::Deleted => vec![Predicate::Deleted(true)],
        };

        if let Some(term) = search.map(str::trim).filter(|term| !term.is_empty()) {
            predicates.push(Predicate::Search(term.to_string()));
        }

        Self { predicates, sort }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub const fn sort(&self) -> Sort {
        self.sort
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(note))
    }

    /// Renders the full `SELECT` statement and its positional parameters.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::with_capacity(self.predicates.len());
        let mut params = Vec::new();

        for predicate in &self.predicates {
            let (clause, param) = predicate.render(params.len() + 1);
            clauses.push(clause);
            params.extend(param);
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes{where_clause} ORDER BY {}",
            self.sort.order_by()
        );

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration, Utc};

    fn note(id: i64, title: &str, important: bool, deleted: bool, age_secs: i64) -> Note {
        let updated_at = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_000 - age_secs);
        Note {
            id,
            title: title.to_string(),
            content: format!("content of {title}"),
            tags: vec!["Work".to_string()],
            important,
            deleted,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at,
        }
    }

    #[test]
    fn unknown_filter_and_sort_fall_back_to_defaults() {
        assert_eq!(Filter::parse("everything"), Filter::All);
        assert_eq!(Filter::parse(""), Filter::All);
        assert_eq!(Sort::parse("random"), Sort::Newest);
        assert_eq!(Sort::parse("alpha-desc"), Sort::AlphaDesc);
    }

    #[test]
    fn all_filter_excludes_trash() {
        let (sql, params) = ListQuery::new(Filter::All, None, Sort::Newest).to_sql();

        assert!(sql.contains("WHERE deleted = false"));
        assert!(sql.ends_with("ORDER BY updated_at DESC, id DESC"));
        assert!(params.is_empty());
    }

    #[test]
    fn important_filter_requires_flag_and_excludes_trash() {
        let query = ListQuery::new(Filter::Important, None, Sort::Important);
        let (sql, _) = query.to_sql();

        assert!(sql.contains("important = TRUE AND deleted = false"));
        assert!(sql.ends_with("ORDER BY important DESC, updated_at DESC, id DESC"));

        assert!(query.matches(&note(1, "a", true, false, 0)));
        assert!(!query.matches(&note(2, "b", true, true, 0)));
        assert!(!query.matches(&note(3, "c", false, false, 0)));
    }

    #[test]
    fn deleted_filter_only_matches_trash() {
        let query = ListQuery::new(Filter::Deleted, None, Sort::Oldest);

        assert!(query.to_sql().0.contains("WHERE deleted = true"));
        assert!(query.matches(&note(1, "a", false, true, 0)));
        assert!(!query.matches(&note(2, "b", false, false, 0)));
    }

    #[test]
    fn search_is_combined_with_filter_and_parameterised() {
        let query = ListQuery::new(Filter::All, Some("  MiLk "), Sort::AlphaAsc);
        let (sql, params) = query.to_sql();

        assert!(sql.contains("deleted = false AND (LOWER(title) LIKE LOWER($1)"));
        assert!(sql.contains("WHERE LOWER(tag) LIKE LOWER($1)"));
        assert_eq!(params, vec!["%MiLk%".to_string()]);
        assert_eq!(query.predicates().len(), 2);
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = ListQuery::new(Filter::All, Some("   "), Sort::Newest);

        assert_eq!(query.predicates(), &[Predicate::Deleted(false)]);
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let (_, params) = ListQuery::new(Filter::All, Some("50%_off\\"), Sort::Newest).to_sql();

        assert_eq!(params, vec!["%50\\%\\_off\\\\%".to_string()]);
    }

    #[test]
    fn search_matches_title_content_and_tags_case_insensitively() {
        let shopping = note(1, "Shopping", false, false, 0);

        assert!(Predicate::Search("shop".to_string()).matches(&shopping));
        assert!(Predicate::Search("content of".to_string()).matches(&shopping));
        assert!(Predicate::Search("work".to_string()).matches(&shopping));
        assert!(!Predicate::Search("gym".to_string()).matches(&shopping));
    }

    #[test]
    fn search_matches_non_ascii_titles_in_any_case() {
        let cyrillic = note(1, "Покупки", false, false, 0);
        let query = ListQuery::new(Filter::All, Some("ПОКУПКИ"), Sort::Newest);

        assert!(query.matches(&cyrillic));
        assert!(Predicate::Search("покупки".to_string()).matches(&cyrillic));
        assert_eq!(query.to_sql().1, vec!["%ПОКУПКИ%".to_string()]);
    }

    #[test]
    fn sort_compare_agrees_with_order_by() {
        let mut notes = vec![
            note(1, "beta", false, false, 30),
            note(2, "alpha", true, false, 10),
            note(3, "gamma", false, false, 20),
        ];

        notes.sort_by(|a, b| Sort::Newest.compare(a, b));
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), [2, 3, 1]);

        notes.sort_by(|a, b| Sort::Oldest.compare(a, b));
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), [1, 3, 2]);

        notes.sort_by(|a, b| Sort::AlphaDesc.compare(a, b));
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), [3, 1, 2]);

        notes.sort_by(|a, b| Sort::Important.compare(a, b));
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), [2, 3, 1]);
    }
}
