//! Author list re-rendering

use super::{update_field, Transform};
use crate::model::Author;
use crate::options::AuthorFormat;
use crate::text::{self, Delimiter};
use crate::{Database, Diagnostics};

/// Render a decomposed author list in `format`
///
/// Authors with no name parts at all are dropped.
#[must_use]
pub fn format_author_list(authors: &[Author], format: AuthorFormat) -> String {
    let names: Vec<String> = authors
        .iter()
        .filter(|a| !a.is_empty())
        .map(|a| format_author(a, format))
        .collect();
    text::replace_all(&names.join(" and "), "  ", " ")
}

fn format_author(author: &Author, format: AuthorFormat) -> String {
    let surname = join_parts(&[&author.von, &author.last]);
    match format {
        AuthorFormat::Space => join_parts(&[&author.first, &surname]),
        AuthorFormat::Comma if author.first.is_empty() => surname,
        AuthorFormat::Comma => format!("{surname}, {}", author.first),
    }
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrite every `author` field in one name format
#[derive(Debug, Clone, Copy)]
pub struct FormatAuthors {
    format: AuthorFormat,
}

impl FormatAuthors {
    /// Render authors in `format`
    #[must_use]
    pub const fn new(format: AuthorFormat) -> Self {
        Self { format }
    }
}

impl Transform for FormatAuthors {
    fn name(&self) -> &str {
        "format-authors"
    }

    fn apply(&self, db: &mut Database, diag: &mut Diagnostics) {
        for entry in db.entries_mut() {
            let Some(value) = entry.get("author") else {
                continue;
            };
            let delim = match text::unquote(value).0 {
                Delimiter::None => Delimiter::Braces,
                delim => delim,
            };

            let authors = entry.authors(diag).to_vec();
            let rendered = delim.wrap(&format_author_list(&authors, self.format));
            if update_field(entry, "author", rendered, "reformatted authors") {
                entry.prime_authors(authors);
            }
        }
    }
}
