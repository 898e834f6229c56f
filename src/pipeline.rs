//! End-to-end processing of a parsed database
//!
//! Stages run in a fixed order: required-field validation, enrichment, normalization
//! transforms, key generation, sorting, and finally the run summary. Every stage after
//! parsing only produces warnings, so a run over a parsed database always completes.

use crate::enrich::{self, RecordSource};
use crate::keys::{self, KeyRenames};
use crate::options::TidyOptions;
use crate::transform::TransformPipeline;
use crate::{sort, validate, Database, Diagnostics};

/// What a run did
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Missing required fields reported by validation
    pub missing_fields: usize,
    /// Entries that received fields from the record source
    pub synced: usize,
    /// Keys changed by key generation
    pub renames: KeyRenames,
    /// The run summary as logged
    pub summary: String,
}

/// Run every stage enabled in `options`
///
/// The record store named by `options.sync_db` is opened here (JSON for a `.json` file, SQLite
/// otherwise); a store that cannot be opened is reported as a warning and enrichment is
/// skipped.
pub fn run(db: &mut Database, options: &TidyOptions, diag: &mut Diagnostics) -> Report {
    let source = options
        .sync_db
        .as_ref()
        .and_then(|path| match enrich::open_record_source(path) {
            Ok(source) => Some(source),
            Err(e) => {
                diag.warn(format!("record store error: {e}"));
                None
            }
        });

    run_with_source(db, options, source.as_deref(), diag)
}

/// Run every stage enabled in `options`, enriching from `source` when given
pub fn run_with_source(
    db: &mut Database,
    options: &TidyOptions,
    source: Option<&dyn RecordSource>,
    diag: &mut Diagnostics,
) -> Report {
    let mut report = Report {
        missing_fields: validate::check_required_fields(db, diag),
        ..Report::default()
    };

    if let Some(source) = source {
        report.synced = enrich::sync_database(db, source, diag);
    }

    TransformPipeline::from_options(options).execute(db, diag);

    if let Some(style) = options.keys {
        report.renames = keys::generate_keys(db, style, diag);
    }

    if let Some(style) = options.sort {
        sort::sort_entries(db, style, diag);
    }

    report.summary = db.log_details(diag);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{KeyStyle, SortStyle};

    #[test]
    fn test_run_all_stages() {
        let input = "@article{b, author = {Zed, A.}, title = {T}, journal = {J}, year = 2001}\n\
                     @article{a, author = {Adams, B.}, title = {U}, journal = {J}, year = 1999}";
        let mut diag = Diagnostics::new();
        let mut db = Database::parse(input, &mut diag).unwrap();

        let options = TidyOptions::preset()
            .with_keys(KeyStyle::Alpha)
            .with_sort(SortStyle::Author);
        let report = run(&mut db, &options, &mut diag);

        let keys: Vec<&str> = db.entries().iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["Ada99", "Zed01"]);
        assert_eq!(db.entries()[0].get("author"), Some("\"B. Adams\""));
        assert_eq!(report.renames.len(), 2);
        assert_eq!(report.missing_fields, 0);
        assert!(report.summary.contains("2 bib entries"));
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_name_warnings_reported_once_per_entry() {
        use crate::enrich::{JsonRecordSource, SourceRecord};
        use crate::options::{AuthorFormat, DelimiterStyle};

        let store = JsonRecordSource::from_records([SourceRecord {
            key: "r".to_string(),
            title: "Lonely Paper".to_string(),
            content: "@misc{r, author = {Nobody}, title = {Lonely Paper}, year = 2004}".to_string(),
        }]);
        let mut diag = Diagnostics::new();
        let mut db =
            Database::parse("@misc{n, author = {Nobody}, title = {Lonely Paper}}", &mut diag)
                .unwrap();
        let options = TidyOptions::new()
            .with_delimiters(DelimiterStyle::Quotes)
            .with_author_format(AuthorFormat::Space);

        let report = run_with_source(&mut db, &options, Some(&store), &mut diag);
        assert_eq!(report.synced, 1);
        assert_eq!(db.entries()[0].get("author"), Some("\"Nobody\""));
        assert_eq!(
            diag.warnings(),
            [
                "empty first name for author 'Nobody' in n".to_string(),
                "empty first name for author 'Nobody' in r".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_store_is_a_warning() {
        let mut diag = Diagnostics::new();
        let mut db = Database::parse("@misc{m}", &mut diag).unwrap();
        let options = TidyOptions::new().with_sync_db("/nonexistent/records.json");

        let report = run(&mut db, &options, &mut diag);
        assert_eq!(report.synced, 0);
        assert!(diag.has_warning("record store error"));
        assert!(report.summary.contains("There were 1 warnings"));
    }
}
