//! Entry ordering
//!
//! Every ordering is stable. Sort keys are computed once per entry up front, so author names
//! and inherited years are resolved before any comparison runs.

use crate::model::Entry;
use crate::options::SortStyle;
use crate::{Database, Diagnostics};
use std::cmp::Ordering;

/// Precomputed comparison data for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Last names in author order; empty when the entry has no authors
    pub surnames: Vec<String>,
    /// Unquoted title
    pub title: String,
    /// Year, inherited through crossref; empty when unknown
    pub year: String,
}

impl SortKey {
    /// Compute the key of `entry`
    pub fn new(db: &Database, entry: &Entry, diag: &mut Diagnostics) -> Self {
        Self {
            surnames: entry.authors(diag).iter().map(|a| a.last.clone()).collect(),
            title: entry.title().to_string(),
            year: db.year(entry),
        }
    }

    /// Surname sequences position by position; entries without authors go last
    #[must_use]
    pub fn cmp_author(&self, other: &Self) -> Ordering {
        match (self.surnames.is_empty(), other.surnames.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.surnames.cmp(&other.surnames),
        }
    }

    /// Title, then oldest first
    #[must_use]
    pub fn cmp_title(&self, other: &Self) -> Ordering {
        self.title
            .cmp(&other.title)
            .then_with(|| self.cmp_year_asc(other))
    }

    /// Oldest first, unknown years last, then by author
    #[must_use]
    pub fn cmp_year_asc(&self, other: &Self) -> Ordering {
        self.cmp_year(other, false)
    }

    /// Newest first, unknown years last, then by author
    #[must_use]
    pub fn cmp_year_desc(&self, other: &Self) -> Ordering {
        self.cmp_year(other, true)
    }

    fn cmp_year(&self, other: &Self, descending: bool) -> Ordering {
        let by_year = match (self.year.is_empty(), other.year.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_years(&self.year, &other.year);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
        };
        by_year.then_with(|| self.cmp_author(other))
    }

    /// Compare under `style`
    #[must_use]
    pub fn compare(&self, other: &Self, style: SortStyle) -> Ordering {
        match style {
            SortStyle::Author => self.cmp_author(other),
            SortStyle::Title => self.cmp_title(other),
            SortStyle::YearAsc => self.cmp_year_asc(other),
            SortStyle::YearDesc => self.cmp_year_desc(other),
        }
    }
}

/// Numeric when both years are integers, lexicographic otherwise
pub(crate) fn compare_years(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Stable-sort the entries of `db` and rebuild its key index
pub fn sort_entries(db: &mut Database, style: SortStyle, diag: &mut Diagnostics) {
    let keys: Vec<SortKey> = db
        .entries()
        .iter()
        .map(|e| SortKey::new(db, e, diag))
        .collect();

    let mut keyed: Vec<(SortKey, Entry)> = keys
        .into_iter()
        .zip(std::mem::take(db.entries_mut()))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.compare(b, style));

    *db.entries_mut() = keyed.into_iter().map(|(_, e)| e).collect();
    db.reindex();
    tracing::debug!(sort = %style, "sorted entries");
}
