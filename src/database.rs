//! BibTeX database representation
//!
//! The database owns every parsed item. Cross-references between entries are stored as keys
//! and resolved through the case-insensitive key index on demand, so entries never point at
//! each other directly.

use crate::model::{Comment, Entry, EntryType, Preamble, StringAbbreviation};
use crate::parser::{self, ParsedItem};
use crate::{text, Diagnostics, Result};
use ahash::AHashMap;
use std::collections::BTreeSet;
use std::path::Path;

/// A parsed BibTeX database
#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Bibliography entries
    entries: Vec<Entry>,
    /// String definitions, in input order
    strings: Vec<StringAbbreviation>,
    /// Preambles
    preambles: Vec<Preamble>,
    /// Comments
    comments: Vec<Comment>,
    /// Lowercased key -> position in `entries`
    key_index: AHashMap<String, usize>,
    /// Input file name, `None` for stdin
    source: Option<String>,
    /// Input size in bytes
    input_size: usize,
}

impl Database {
    /// Create a new empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a BibTeX database from a string
    ///
    /// Builds the key index and links crossrefs; duplicate keys and dangling crossrefs are
    /// reported as warnings.
    pub fn parse(input: &str, diag: &mut Diagnostics) -> Result<Self> {
        let items = parser::parse_bibtex(input, diag)?;
        let mut db = Self::new();

        for item in items {
            match item {
                ParsedItem::Entry(entry) => db.entries.push(entry),
                ParsedItem::String(abbrv) => db.strings.push(abbrv),
                ParsedItem::Preamble(p) => db.preambles.push(p),
                ParsedItem::Comment(c) => db.comments.push(c),
            }
        }

        db.input_size = input.len();
        db.build_key_index(diag);
        db.resolve_crossrefs(diag);
        Ok(db)
    }

    /// Parse a BibTeX database from a file
    pub fn parse_file(path: impl AsRef<Path>, diag: &mut Diagnostics) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut db = Self::parse(&content, diag)?;
        db.source = Some(path.display().to_string());
        Ok(db)
    }

    /// Get all entries
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Get mutable access to all entries
    ///
    /// Call [`Database::build_key_index`] afterwards if keys changed.
    #[must_use]
    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }

    /// Get all string definitions
    #[must_use]
    pub fn strings(&self) -> &[StringAbbreviation] {
        &self.strings
    }

    /// Get all preambles
    #[must_use]
    pub fn preambles(&self) -> &[Preamble] {
        &self.preambles
    }

    /// Get all comments
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Name of the input file, if it came from one
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Record where the input came from
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Size of the parsed input in bytes
    #[must_use]
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    /// Rebuild the case-insensitive key index
    ///
    /// The first entry with a given key wins; later duplicates are reported and stay
    /// unreachable through the index.
    pub fn build_key_index(&mut self, diag: &mut Diagnostics) {
        for key in self.reindex() {
            diag.warn(format!("duplicate entry key '{key}'"));
        }
    }

    /// Rebuild the key index without reporting; returns the keys that were shadowed
    pub(crate) fn reindex(&mut self) -> Vec<String> {
        self.key_index.clear();
        let mut duplicates = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let lower = entry.key.to_lowercase();
            if self.key_index.contains_key(&lower) {
                duplicates.push(entry.key.clone());
            } else {
                self.key_index.insert(lower, i);
            }
        }
        duplicates
    }

    /// Link every `crossref` field to its target, warning about the ones that do not resolve
    pub fn resolve_crossrefs(&mut self, diag: &mut Diagnostics) {
        for (key, target) in self.link_crossrefs() {
            diag.warn(format!("non-existing crossref '{target}' in {key}"));
        }
    }

    /// Link every `crossref` field to its target; returns `(key, target)` for dangling links
    pub(crate) fn link_crossrefs(&mut self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for i in 0..self.entries.len() {
            let Some(target) = self.entries[i]
                .get_unquoted("crossref")
                .map(|t| text::trim(t).to_string())
            else {
                self.entries[i].ref_key = None;
                continue;
            };

            let resolved = self.find_by_key(&target).map(|e| e.key.clone());
            if resolved.is_none() {
                dangling.push((self.entries[i].key.clone(), target));
            }
            self.entries[i].ref_key = resolved;
        }
        dangling
    }

    /// Position of the entry with `key` (case-insensitive)
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.key_index.get(&key.to_lowercase()).copied()
    }

    /// Find an entry by key (case-insensitive)
    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&Entry> {
        self.position(key).map(|i| &self.entries[i])
    }

    /// Find entries by type
    #[must_use]
    pub fn find_by_type(&self, ty: EntryType) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.ty == ty).collect()
    }

    /// The entry `entry` inherits fields from, if its crossref resolved
    #[must_use]
    pub fn crossref_target(&self, entry: &Entry) -> Option<&Entry> {
        entry.crossref_key().and_then(|k| self.find_by_key(k))
    }

    /// Field names present on the entry or on its crossref target
    #[must_use]
    pub fn field_names<'a>(&'a self, entry: &'a Entry) -> BTreeSet<&'a str> {
        let mut names: BTreeSet<&str> = entry.fields.iter().map(|f| f.name.as_str()).collect();
        if let Some(target) = self.crossref_target(entry) {
            names.extend(target.fields.iter().map(|f| f.name.as_str()));
        }
        names
    }

    /// Unquoted year of the entry, falling back to its crossref target; empty when unknown
    #[must_use]
    pub fn year(&self, entry: &Entry) -> String {
        entry
            .get_unquoted("year")
            .or_else(|| self.crossref_target(entry).and_then(|t| t.get_unquoted("year")))
            .map(|y| text::trim(y).to_string())
            .unwrap_or_default()
    }

    /// Add an entry; the key index is not updated
    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Add a string definition
    pub fn add_string(&mut self, abbrv: StringAbbreviation) {
        self.strings.push(abbrv);
    }

    /// Add a preamble
    pub fn add_preamble(&mut self, preamble: Preamble) {
        self.preambles.push(preamble);
    }

    /// Add a comment
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Get statistics about the database
    #[must_use]
    pub fn stats(&self) -> DatabaseStats {
        let mut type_counts = AHashMap::new();
        for entry in &self.entries {
            *type_counts.entry(entry.ty.to_string()).or_insert(0) += 1;
        }

        DatabaseStats {
            total_entries: self.entries.len(),
            total_strings: self.strings.len(),
            total_preambles: self.preambles.len(),
            total_comments: self.comments.len(),
            entries_by_type: type_counts,
        }
    }

    /// Log the end-of-run summary at info level and return it
    pub fn log_details(&self, diag: &Diagnostics) -> String {
        let stats = self.stats();
        let kb = (self.input_size + 512) / 1024;
        let mut msg = format!(
            "Successfully parsed {} ({kb}KB):",
            self.source.as_deref().unwrap_or("stdin")
        );
        if stats.total_preambles > 0 {
            msg.push_str(&format!("\n  {} preambles", stats.total_preambles));
        }
        if stats.total_strings > 0 {
            msg.push_str(&format!("\n  {} string abbreviations", stats.total_strings));
        }
        if stats.total_entries > 0 {
            msg.push_str(&format!("\n  {} bib entries", stats.total_entries));
        }
        if diag.warning_count() > 0 {
            msg.push_str(&format!("\nThere were {} warnings", diag.warning_count()));
        }

        tracing::info!("{msg}");
        msg
    }
}

/// Statistics about a database
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Total number of string definitions
    pub total_strings: usize,
    /// Total number of preambles
    pub total_preambles: usize,
    /// Total number of comments
    pub total_comments: usize,
    /// Entry counts by type
    pub entries_by_type: AHashMap<String, usize>,
}

/// Builder for creating databases programmatically
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    db: Database,
}

impl DatabaseBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    #[must_use]
    pub fn entry(mut self, entry: Entry) -> Self {
        self.db.entries.push(entry);
        self
    }

    /// Add a string definition
    #[must_use]
    pub fn string(mut self, tag: &str, value: &str) -> Self {
        self.db.strings.push(StringAbbreviation {
            tag: tag.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Add a preamble
    #[must_use]
    pub fn preamble(mut self, text: &str) -> Self {
        self.db.preambles.push(Preamble(text.to_string()));
        self
    }

    /// Add a comment
    #[must_use]
    pub fn comment(mut self, text: &str) -> Self {
        self.db.comments.push(Comment(text.to_string()));
        self
    }

    /// Build the database, indexing keys and linking crossrefs
    pub fn build(self, diag: &mut Diagnostics) -> Database {
        let mut db = self.db;
        db.build_key_index(diag);
        db.resolve_crossrefs(diag);
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn entry(ty: EntryType, key: &str, fields: &[(&str, &str)]) -> Entry {
        let mut e = Entry::new(ty, key);
        e.fields = fields.iter().map(|(n, v)| Field::new(*n, *v)).collect();
        e
    }

    #[test]
    fn test_database_parse() {
        let input = r#"
            @string{me = "John Doe"}

            @article{test2023,
                author = me,
                title = "Test Article",
                year = 2023
            }
        "#;

        let mut diag = Diagnostics::new();
        let db = Database::parse(input, &mut diag).unwrap();
        assert_eq!(db.entries().len(), 1);
        assert_eq!(db.strings().len(), 1);
        assert_eq!(db.strings()[0].value, "\"John Doe\"");

        let entry = &db.entries()[0];
        assert_eq!(entry.get("author"), Some("me"));
        assert_eq!(db.year(entry), "2023");
    }

    #[test]
    fn test_key_lookup_is_case_insensitive() {
        let mut diag = Diagnostics::new();
        let db = DatabaseBuilder::new()
            .entry(entry(EntryType::Misc, "Knuth84", &[]))
            .build(&mut diag);

        assert_eq!(db.find_by_key("knuth84").map(Entry::key), Some("Knuth84"));
        assert_eq!(db.find_by_key("KNUTH84").map(Entry::key), Some("Knuth84"));
        assert!(db.find_by_key("knuth85").is_none());
    }

    #[test]
    fn test_duplicate_keys_warn() {
        let mut diag = Diagnostics::new();
        let db = DatabaseBuilder::new()
            .entry(entry(EntryType::Misc, "a", &[("title", "{First}")]))
            .entry(entry(EntryType::Misc, "A", &[("title", "{Second}")]))
            .build(&mut diag);

        assert_eq!(diag.warning_count(), 1);
        assert!(diag.has_warning("duplicate entry key 'A'"));
        assert_eq!(db.find_by_key("a").map(Entry::title), Some("First"));
    }

    #[test]
    fn test_crossref_inheritance() {
        let mut diag = Diagnostics::new();
        let db = DatabaseBuilder::new()
            .entry(entry(
                EntryType::InProceedings,
                "paper",
                &[("title", "{P}"), ("crossref", "{Conf99}")],
            ))
            .entry(entry(
                EntryType::Proceedings,
                "conf99",
                &[("booktitle", "{Proc}"), ("year", "1999")],
            ))
            .build(&mut diag);

        let paper = &db.entries()[0];
        assert_eq!(paper.crossref_key(), Some("conf99"));
        assert_eq!(db.year(paper), "1999");
        let names = db.field_names(paper);
        assert!(names.contains("booktitle"));
        assert!(names.contains("crossref"));
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_dangling_crossref_warns() {
        let mut diag = Diagnostics::new();
        let db = DatabaseBuilder::new()
            .entry(entry(EntryType::InProceedings, "paper", &[("crossref", "{nowhere}")]))
            .build(&mut diag);

        assert!(db.entries()[0].crossref_key().is_none());
        assert!(diag.has_warning("non-existing crossref 'nowhere' in paper"));
        assert_eq!(db.year(&db.entries()[0]), "");
    }

    #[test]
    fn test_database_stats() {
        let input = r#"
            @string{ieee = "IEEE"}
            @preamble{"Test preamble"}
            @comment{This is a formal comment that works}
            @article{a1, title = "Article 1"}
            @article{a2, title = "Article 2"}
            @book{b1, title = "Book 1"}
        "#;

        let mut diag = Diagnostics::new();
        let db = Database::parse(input, &mut diag).unwrap();
        let stats = db.stats();

        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_strings, 1);
        assert_eq!(stats.total_preambles, 1);
        assert_eq!(stats.total_comments, 1);
        assert_eq!(stats.entries_by_type.get("article"), Some(&2));
        assert_eq!(stats.entries_by_type.get("book"), Some(&1));
    }

    #[test]
    fn test_log_details() {
        let mut diag = Diagnostics::new();
        let mut db = Database::parse("@misc{a, title = {T}}", &mut diag).unwrap();
        db.set_source("refs.bib");
        diag.warn("something");

        let summary = db.log_details(&diag);
        assert_eq!(
            summary,
            "Successfully parsed refs.bib (0KB):\n  1 bib entries\nThere were 1 warnings"
        );
    }
}
