//! Data models for BibTeX items

use crate::text;
use crate::Diagnostics;
use std::cell::OnceCell;
use std::fmt;

/// A BibTeX entry (article, book, etc.)
///
/// Field values keep their original outer delimiter (`{...}` or `"..."`); bare values such as
/// `1999` or `jan` are stored as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Entry type (article, book, inproceedings, etc.)
    pub ty: EntryType,
    /// Citation key
    pub key: String,
    /// Fields in input order, names lowercased
    pub fields: Vec<Field>,
    /// Key of the entry named by `crossref`, once resolved against the database index
    pub(crate) ref_key: Option<String>,
    /// Parsed `author` field, computed on first use
    authors: OnceCell<Vec<Author>>,
}

impl Entry {
    /// Create a new entry without fields
    #[must_use]
    pub fn new(ty: EntryType, key: impl Into<String>) -> Self {
        Self {
            ty,
            key: key.into(),
            fields: Vec::new(),
            ref_key: None,
            authors: OnceCell::new(),
        }
    }

    /// Get the entry type
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        self.ty
    }

    /// Get the citation key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get a raw (still delimited) field value by lowercased name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Get a field value with its outer delimiters removed
    #[must_use]
    pub fn get_unquoted(&self, name: &str) -> Option<&str> {
        self.get(name).map(text::unquoted)
    }

    /// Whether the entry itself carries `name`
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Get all fields
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Set a field, replacing any earlier value; returns the previous value
    ///
    /// Parsed authors stay cached when only the outer delimiter of `author` changes.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            if name == "author" && text::unquoted(&field.value) != text::unquoted(&value) {
                self.authors = OnceCell::new();
            }
            Some(std::mem::replace(&mut field.value, value))
        } else {
            if name == "author" {
                self.authors = OnceCell::new();
            }
            self.fields.push(Field { name, value });
            None
        }
    }

    /// Remove a field, returning its value
    pub fn remove_field(&mut self, name: &str) -> Option<String> {
        let pos = self.fields.iter().position(|f| f.name == name)?;
        if name == "author" {
            self.authors = OnceCell::new();
        }
        Some(self.fields.remove(pos).value)
    }

    /// Unquoted title, or an empty string
    #[must_use]
    pub fn title(&self) -> &str {
        self.get_unquoted("title").unwrap_or("")
    }

    /// Key of the resolved crossref target, if any
    #[must_use]
    pub fn crossref_key(&self) -> Option<&str> {
        self.ref_key.as_deref()
    }

    /// Parsed authors, decomposed on first call and cached afterwards
    ///
    /// Entries without an `author` field have no authors. Name-parsing warnings are reported
    /// only on the call that fills the cache.
    pub fn authors(&self, diag: &mut Diagnostics) -> &[Author] {
        self.authors.get_or_init(|| match self.get("author") {
            Some(value) => crate::names::parse_authors(value, &self.key, diag),
            None => Vec::new(),
        })
    }

    /// Authors if they were already parsed
    #[must_use]
    pub fn cached_authors(&self) -> Option<&[Author]> {
        self.authors.get().map(Vec::as_slice)
    }

    /// Replace the author cache without re-parsing
    pub(crate) fn prime_authors(&mut self, authors: Vec<Author>) {
        self.authors = OnceCell::from(authors);
    }
}

/// BibTeX entry type
///
/// This is the closed set of categories the tool accepts; items of any other type are dropped
/// with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Article from a journal
    Article,
    /// Book with publisher
    Book,
    /// Printed work without a named publisher
    Booklet,
    /// Legacy alias of inproceedings
    Conference,
    /// Part of a book
    InBook,
    /// Part of a book with its own title
    InCollection,
    /// Article in conference proceedings
    InProceedings,
    /// Technical documentation
    Manual,
    /// Master's thesis
    MastersThesis,
    /// Miscellaneous
    Misc,
    /// `PhD` thesis
    PhdThesis,
    /// Conference proceedings
    Proceedings,
    /// Technical report
    TechReport,
    /// Unpublished work
    Unpublished,
}

impl EntryType {
    /// Parse from string (case-insensitive); `None` for types outside the schema
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let ty = match s.to_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "booklet" => Self::Booklet,
            "conference" => Self::Conference,
            "inbook" => Self::InBook,
            "incollection" => Self::InCollection,
            "inproceedings" => Self::InProceedings,
            "manual" => Self::Manual,
            "mastersthesis" => Self::MastersThesis,
            "misc" => Self::Misc,
            "phdthesis" => Self::PhdThesis,
            "proceedings" => Self::Proceedings,
            "techreport" => Self::TechReport,
            "unpublished" => Self::Unpublished,
            _ => return None,
        };
        Some(ty)
    }

    /// Get required fields for this entry type
    ///
    /// An item like `author|editor` is satisfied by either field.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Article => &["author", "title", "journal", "year"],
            Self::Book => &["author|editor", "title", "publisher", "year"],
            Self::Booklet | Self::Manual => &["title"],
            Self::Conference | Self::InProceedings => &["author", "title", "booktitle", "year"],
            Self::InBook => &["author|editor", "title", "chapter|pages", "publisher", "year"],
            Self::InCollection => &["author", "title", "booktitle", "publisher", "year"],
            Self::MastersThesis | Self::PhdThesis => &["author", "title", "school", "year"],
            Self::Misc => &[],
            Self::Proceedings => &["title", "year"],
            Self::TechReport => &["author", "title", "institution", "year"],
            Self::Unpublished => &["author", "title", "note"],
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::Booklet => "booklet",
            Self::Conference => "conference",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Manual => "manual",
            Self::MastersThesis => "mastersthesis",
            Self::Misc => "misc",
            Self::PhdThesis => "phdthesis",
            Self::Proceedings => "proceedings",
            Self::TechReport => "techreport",
            Self::Unpublished => "unpublished",
        };
        f.write_str(name)
    }
}

/// A field in a BibTeX entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name, lowercased
    pub name: String,
    /// Field value including its outer delimiter
    pub value: String,
}

impl Field {
    /// Create a new field
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One decomposed personal name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    /// Given names
    pub first: String,
    /// Lowercase particles such as "van" or "de la"
    pub von: String,
    /// Family name
    pub last: String,
}

impl Author {
    /// Placeholder used for "and others"
    pub const OTHERS: &'static str = "others";

    /// Build an author from its three parts
    #[must_use]
    pub fn new(first: &str, von: &str, last: &str) -> Self {
        Self {
            first: first.to_string(),
            von: von.to_string(),
            last: last.to_string(),
        }
    }

    /// Whether this is the `others` placeholder
    #[must_use]
    pub fn is_others(&self) -> bool {
        self.last == Self::OTHERS
    }

    /// Whether all three parts are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.von.is_empty() && self.last.is_empty()
    }
}

/// `@string{tag = value}` definition, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringAbbreviation {
    /// Abbreviation name, lowercased
    pub tag: String,
    /// Value including its outer delimiter
    pub value: String,
}

/// `@comment{...}` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment(pub String);

/// `@preamble{...}` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble(pub String);
