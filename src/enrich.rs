//! Field enrichment from an external record source
//!
//! Each entry's title is normalized and looked up in a [`RecordSource`]. The candidate records
//! that come back are parsed as BibTeX, narrowed down by authors, year and type, and if exactly
//! one survives, the fields the entry lacks are copied from it. Lookup failures on one entry
//! are reported as warnings and do not stop the others.

use crate::model::{Entry, EntryType};
use crate::parser::parse_entry;
use crate::sort::compare_years;
use crate::text::{self, Delimiter};
use crate::{Database, Diagnostics, Error, Result};
use ahash::AHashMap;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Titles are compared on at most this many characters
pub const MAX_TITLE_LEN: usize = 256;

/// Prefix for record URLs that are given as paths relative to the source's site
pub const LOCAL_URL_BASE: &str = "http://dblp.uni-trier.de/";

/// URL prefixes a DOI can be read off from
pub const DOI_PREFIXES: &[&str] = &[
    "http://dx.doi.org/",
    "http://doi.acm.org/",
    "http://doi.ieeecomputersociety.org/",
];

/// One stored record: its key, normalized title and `@type{...}` text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Key of the record inside the source
    pub key: String,
    /// Title, normalized with [`normalize_title`]
    pub title: String,
    /// The record as BibTeX
    pub content: String,
}

/// Lookup interface of an external bibliography store
pub trait RecordSource {
    /// Number of records in the store
    fn row_count(&self) -> Result<usize>;

    /// Records whose normalized title equals `title`
    fn find_by_title(&self, title: &str) -> Result<Vec<SourceRecord>>;

    /// The record stored under `key`
    fn find_by_key(&self, key: &str) -> Result<Option<SourceRecord>>;
}

/// Lowercased alphabetic characters of the first [`MAX_TITLE_LEN`] characters of `title`
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .take(MAX_TITLE_LEN)
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .take(MAX_TITLE_LEN)
        .collect()
}

/// Record source backed by a JSON array of `{ "key", "title", "content" }` objects
#[derive(Debug, Clone, Default)]
pub struct JsonRecordSource {
    records: Vec<SourceRecord>,
    by_title: AHashMap<String, Vec<usize>>,
    by_key: AHashMap<String, usize>,
}

impl JsonRecordSource {
    /// Load a store from a JSON file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Source(format!(
                "record store '{}' not found",
                path.display()
            )));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Load a store from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<SourceRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Build a store from records; titles are normalized on the way in
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = SourceRecord>) -> Self {
        let mut source = Self::default();
        for mut record in records {
            record.title = normalize_title(&record.title);
            let i = source.records.len();
            source
                .by_title
                .entry(record.title.clone())
                .or_default()
                .push(i);
            source.by_key.entry(record.key.clone()).or_insert(i);
            source.records.push(record);
        }
        source
    }
}

impl RecordSource for JsonRecordSource {
    fn row_count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn find_by_title(&self, title: &str) -> Result<Vec<SourceRecord>> {
        Ok(self
            .by_title
            .get(&normalize_title(title))
            .map(|ids| ids.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default())
    }

    fn find_by_key(&self, key: &str) -> Result<Option<SourceRecord>> {
        Ok(self.by_key.get(key).map(|&i| self.records[i].clone()))
    }
}

/// Record source backed by an SQLite database holding a `BE(dblp_key, title, content)` table
///
/// Titles in the table are stored in [`normalize_title`] form.
#[derive(Debug)]
pub struct SqliteRecordSource {
    conn: Connection,
}

impl SqliteRecordSource {
    /// Open an existing database read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Source(format!(
                "record store '{}' not found",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Use an already open connection
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, arg: &str) -> Result<Vec<SourceRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([arg], |row| {
            Ok(SourceRecord {
                key: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
            })
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

impl RecordSource for SqliteRecordSource {
    fn row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM BE", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn find_by_title(&self, title: &str) -> Result<Vec<SourceRecord>> {
        self.query(
            "SELECT dblp_key, title, content FROM BE WHERE title = ?1",
            &normalize_title(title),
        )
    }

    fn find_by_key(&self, key: &str) -> Result<Option<SourceRecord>> {
        let records = self.query(
            "SELECT dblp_key, title, content FROM BE WHERE dblp_key = ?1",
            key,
        )?;
        Ok(records.into_iter().next())
    }
}

/// Open the record store at `path`: a `.json` file as [`JsonRecordSource`], anything else as
/// an SQLite database
pub fn open_record_source(path: impl AsRef<Path>) -> Result<Box<dyn RecordSource>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(Box::new(JsonRecordSource::open(path)?))
    } else {
        Ok(Box::new(SqliteRecordSource::open(path)?))
    }
}

/// Fill in missing fields of every entry from `source`
///
/// Returns the number of entries that received at least one field.
pub fn sync_database(
    db: &mut Database,
    source: &dyn RecordSource,
    diag: &mut Diagnostics,
) -> usize {
    match source.row_count() {
        Ok(rows) => tracing::debug!(rows, "connected to record source"),
        Err(e) => {
            diag.warn(format!("record source error: {e}"));
            return 0;
        }
    }

    let mut updated = 0;
    for i in 0..db.entries().len() {
        match sync_entry(db, i, source, diag) {
            Ok(true) => updated += 1,
            Ok(false) => {}
            Err(e) => {
                let key = &db.entries()[i].key;
                diag.warn(format!("cannot sync {key}: {e}"));
            }
        }
    }
    updated
}

/// Look up, filter and merge for the entry at `index`; `Ok(true)` if fields were added
fn sync_entry(
    db: &mut Database,
    index: usize,
    source: &dyn RecordSource,
    diag: &mut Diagnostics,
) -> Result<bool> {
    let entry = &db.entries()[index];
    let records = source.find_by_title(&normalize_title(entry.title()))?;
    if records.is_empty() {
        if entry.ty != EntryType::Misc {
            diag.warn(format!("no records found for {} in record source", entry.key));
        }
        return Ok(false);
    }

    let candidates = records
        .iter()
        .map(|r| build_candidate(r, source, diag, true))
        .collect::<Result<Vec<_>>>()?;

    let Some(chosen) = filter_candidates(db, entry, candidates, diag) else {
        return Ok(false);
    };

    let entry = &mut db.entries_mut()[index];
    let mut changed = false;
    for field in chosen.fields {
        if !entry.has_field(&field.name) {
            tracing::debug!(key = %entry.key, field = %field.name, "updating field from record source");
            entry.set_field(field.name, field.value);
            changed = true;
        }
    }
    Ok(changed)
}

/// Parse a record and tidy it up for merging
///
/// With `follow_crossref`, a `crossref` is looked up in the source and its fields are merged
/// into the candidate; the `crossref` field itself never survives.
fn build_candidate(
    record: &SourceRecord,
    source: &dyn RecordSource,
    diag: &mut Diagnostics,
    follow_crossref: bool,
) -> Result<Entry> {
    let mut entry = parse_entry(&record.content, diag).map_err(|e| {
        Error::Source(format!("cannot parse content of record '{}': {e}", record.key))
    })?;

    if let Some(target) = entry.remove_field("crossref") {
        let target = text::trim(text::unquoted(&target)).to_string();
        match source.find_by_key(&target)? {
            Some(parent) if follow_crossref => {
                let parent = build_candidate(&parent, source, diag, false)?;
                for field in parent.fields {
                    if !entry.has_field(&field.name) {
                        entry.set_field(field.name, field.value);
                    }
                }
            }
            Some(_) => {}
            None => diag.warn(format!(
                "no reference entry in record source for crossref='{target}'"
            )),
        }
    }

    fix_local_url(&mut entry, "url");
    fix_local_url(&mut entry, "ee");
    extract_doi(&mut entry, diag);
    Ok(entry)
}

/// Prefix a site-relative `field` value with [`LOCAL_URL_BASE`]
pub fn fix_local_url(entry: &mut Entry, field: &str) {
    let Some(value) = entry.get(field) else {
        return;
    };
    let (delim, url) = text::unquote(value);
    if ["http:", "https:", "ftp:"].iter().any(|p| url.starts_with(p)) {
        return;
    }
    let delim = match delim {
        Delimiter::None => Delimiter::Quotes,
        delim => delim,
    };
    let fixed = delim.wrap(&format!("{LOCAL_URL_BASE}{url}"));
    entry.set_field(field, fixed);
}

/// Derive a `doi` field from an `ee` URL with a known DOI prefix
pub fn extract_doi(entry: &mut Entry, diag: &mut Diagnostics) {
    if entry.has_field("doi") {
        return;
    }
    let Some(value) = entry.get("ee") else {
        return;
    };
    let (delim, ee) = text::unquote(value);
    if !ee.contains("doi") {
        return;
    }

    let delim = match delim {
        Delimiter::None => Delimiter::Braces,
        delim => delim,
    };
    match DOI_PREFIXES.iter().find_map(|p| ee.strip_prefix(p)) {
        Some(doi) => {
            let doi = delim.wrap(doi);
            entry.set_field("doi", doi);
        }
        None => diag.warn(format!("cannot extract doi from string '{ee}'")),
    }
}

fn surnames(entry: &Entry, diag: &mut Diagnostics) -> Vec<String> {
    entry
        .authors(diag)
        .iter()
        .map(|a| a.last.to_lowercase())
        .collect()
}

fn candidate_year(entry: &Entry) -> &str {
    entry.get_unquoted("year").map(text::trim).unwrap_or("")
}

/// Narrow `candidates` down to the single record that matches `entry`
///
/// Authors always have to match; year and type only break remaining ties.
fn filter_candidates(
    db: &Database,
    entry: &Entry,
    mut candidates: Vec<Entry>,
    diag: &mut Diagnostics,
) -> Option<Entry> {
    let key = &entry.key;
    let author = entry.get("author").unwrap_or("");
    let wanted = surnames(entry, diag);
    candidates.retain(|c| surnames(c, diag) == wanted);
    if candidates.is_empty() {
        diag.warn(format!("can't find a record for {key} with author={author}"));
        return None;
    }

    let year = db.year(entry);
    if candidates.len() > 1 {
        if candidates
            .iter()
            .any(|c| compare_years(candidate_year(c), &year) == Ordering::Greater)
        {
            diag.warn(format!("found a newer version of the paper for '{key}'"));
        }
        candidates.retain(|c| candidate_year(c) == year);
        if candidates.is_empty() {
            diag.warn(format!("can't find a record for {key} with year={year}"));
            return None;
        }
    }

    if candidates.len() > 1 {
        candidates.retain(|c| c.ty == entry.ty);
        if candidates.is_empty() {
            diag.warn(format!("can't find a record for {key} with type={}", entry.ty));
            return None;
        }
    }

    if candidates.len() > 1 {
        diag.warn(format!(
            "{} records for {key} with author={author} and year={year}",
            candidates.len()
        ));
        return None;
    }
    candidates.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, title: &str, content: &str) -> SourceRecord {
        SourceRecord {
            key: key.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn source() -> JsonRecordSource {
        JsonRecordSource::from_records([
            record(
                "conf/x/Smith99",
                "A Study of Things",
                "@inproceedings{conf/x/Smith99, author = {John Smith}, title = {A Study of Things}, \
                 year = {1999}, pages = {1-10}, crossref = {conf/x/1999}, \
                 ee = {http://doi.acm.org/10.1145/123}, url = {db/conf/x/x99.html}}",
            ),
            record(
                "conf/x/1999",
                "Proceedings of X",
                "@proceedings{conf/x/1999, title = {Proceedings of X}, booktitle = {X 99}, \
                 publisher = {ACM}, year = {1999}}",
            ),
            record(
                "journals/y/Smith01",
                "Twice Published",
                "@article{journals/y/Smith01, author = {John Smith}, title = {Twice Published}, \
                 year = {2001}, journal = {Y}}",
            ),
            record(
                "conf/y/Smith00",
                "Twice Published",
                "@inproceedings{conf/y/Smith00, author = {John Smith}, title = {Twice Published}, \
                 year = {2000}, booktitle = {Y}}",
            ),
        ])
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("A {Study} of Things, 2nd ed."), "astudyofthingsnded");
        assert_eq!(normalize_title(&"x".repeat(400)).len(), MAX_TITLE_LEN);
    }

    #[test]
    fn test_json_source() {
        let json = r#"[{"key": "k1", "title": "Hello, World!", "content": "@misc{k1}"}]"#;
        let source = JsonRecordSource::from_json(json).unwrap();
        assert_eq!(source.row_count().unwrap(), 1);
        assert_eq!(source.find_by_title("hello world").unwrap().len(), 1);
        assert_eq!(source.find_by_key("k1").unwrap().unwrap().title, "helloworld");
        assert!(source.find_by_key("k2").unwrap().is_none());
    }

    #[test]
    fn test_missing_store_is_an_error() {
        let err = JsonRecordSource::open("/nonexistent/store.json").unwrap_err();
        assert!(matches!(err, Error::Source(_)));
        let err = SqliteRecordSource::open("/nonexistent/dblp.db").unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    fn sqlite_store(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("dblp.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE BE (dblp_key TEXT PRIMARY KEY, title TEXT, content TEXT);",
        )
        .unwrap();
        for r in [
            record(
                "conf/x/Smith99",
                "astudyofthings",
                "@inproceedings{conf/x/Smith99, author = {John Smith}, \
                 title = {A Study of Things}, crossref = {conf/x/1999}}",
            ),
            record(
                "conf/x/1999",
                "proceedingsofx",
                "@proceedings{conf/x/1999, title = {Proceedings of X}, booktitle = {X 99}, \
                 year = {1999}}",
            ),
        ] {
            conn.execute(
                "INSERT INTO BE (dblp_key, title, content) VALUES (?1, ?2, ?3)",
                [&r.key, &r.title, &r.content],
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn test_sqlite_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteRecordSource::open(sqlite_store(dir.path())).unwrap();

        assert_eq!(source.row_count().unwrap(), 2);
        let found = source.find_by_title("A Study of Things").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "conf/x/Smith99");
        assert_eq!(
            source.find_by_key("conf/x/1999").unwrap().map(|r| r.title),
            Some("proceedingsofx".to_string())
        );
        assert!(source.find_by_key("conf/x/2000").unwrap().is_none());
    }

    #[test]
    fn test_sync_from_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let source = open_record_source(sqlite_store(dir.path())).unwrap();

        let mut diag = Diagnostics::new();
        let mut db = Database::parse(
            "@inproceedings{smith, author = {Smith, John}, title = {A Study of Things}}",
            &mut diag,
        )
        .unwrap();

        assert_eq!(sync_database(&mut db, source.as_ref(), &mut diag), 1);
        assert_eq!(db.entries()[0].get("year"), Some("{1999}"));
        assert_eq!(db.entries()[0].get("booktitle"), Some("{X 99}"));
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_open_record_source_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("records.json");
        std::fs::write(&json, r#"[{"key": "k", "title": "T", "content": "@misc{k}"}]"#).unwrap();
        assert_eq!(open_record_source(&json).unwrap().row_count().unwrap(), 1);

        let not_sqlite = dir.path().join("records.db");
        std::fs::write(&not_sqlite, "not a database").unwrap();
        let source = open_record_source(&not_sqlite);
        assert!(source.and_then(|s| s.row_count()).is_err());
    }

    #[test]
    fn test_sync_merges_missing_fields() {
        let mut diag = Diagnostics::new();
        let mut db = Database::parse(
            "@inproceedings{smith, author = {Smith, J.}, title = {A Study of Things}, \
             pages = {3--4}}",
            &mut diag,
        )
        .unwrap();

        assert_eq!(sync_database(&mut db, &source(), &mut diag), 1);
        let entry = &db.entries()[0];
        assert_eq!(entry.get("pages"), Some("{3--4}"));
        assert_eq!(entry.get("year"), Some("{1999}"));
        assert_eq!(entry.get("booktitle"), Some("{X 99}"));
        assert_eq!(entry.get("doi"), Some("{10.1145/123}"));
        assert_eq!(
            entry.get("url"),
            Some("{http://dblp.uni-trier.de/db/conf/x/x99.html}")
        );
        assert!(!entry.has_field("crossref"));
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_sync_breaks_ties_by_year() {
        let mut diag = Diagnostics::new();
        let mut db = Database::parse(
            "@inproceedings{s, author = {John Smith}, title = {Twice Published}, year = 2000}",
            &mut diag,
        )
        .unwrap();

        assert_eq!(sync_database(&mut db, &source(), &mut diag), 1);
        assert_eq!(db.entries()[0].get("booktitle"), Some("{Y}"));
        assert!(diag.has_warning("found a newer version of the paper for 's'"));
    }

    #[test]
    fn test_sync_author_mismatch_warns() {
        let mut diag = Diagnostics::new();
        let mut db = Database::parse(
            "@article{s, author = {Jane Doe}, title = {Twice Published}}",
            &mut diag,
        )
        .unwrap();

        assert_eq!(sync_database(&mut db, &source(), &mut diag), 0);
        assert!(diag.has_warning("can't find a record for s with author={Jane Doe}"));
    }

    #[test]
    fn test_no_records_for_misc_is_silent() {
        let mut diag = Diagnostics::new();
        let mut db = Database::parse(
            "@misc{m, title = {Unknown}}\n@article{a, title = {Unknown}}",
            &mut diag,
        )
        .unwrap();

        sync_database(&mut db, &source(), &mut diag);
        assert_eq!(diag.warnings(), ["no records found for a in record source".to_string()]);
    }

    #[test]
    fn test_unresolved_candidate_crossref_still_used() {
        let store = JsonRecordSource::from_records([record(
            "k",
            "Lonely",
            "@inproceedings{k, author = {A Nobody}, title = {Lonely}, crossref = {gone}, year = 2005}",
        )]);
        let mut diag = Diagnostics::new();
        let mut db =
            Database::parse("@inproceedings{n, author = {A Nobody}, title = {Lonely}}", &mut diag)
                .unwrap();

        assert_eq!(sync_database(&mut db, &store, &mut diag), 1);
        assert_eq!(db.entries()[0].get("year"), Some("2005"));
        assert!(!db.entries()[0].has_field("crossref"));
        assert!(diag.has_warning("no reference entry in record source for crossref='gone'"));
    }

    #[test]
    fn test_extract_doi_unknown_prefix() {
        let mut diag = Diagnostics::new();
        let mut entry = Entry::new(EntryType::Misc, "k");
        entry.set_field("ee", "{https://example.org/doi/1}");
        extract_doi(&mut entry, &mut diag);
        assert!(!entry.has_field("doi"));
        assert!(diag.has_warning("cannot extract doi from string"));
    }
}
