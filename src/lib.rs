//! # bibstyle
//!
//! A BibTeX canonicalizer: parses a bibliography database, links crossrefs, normalizes field
//! values, regenerates citation keys, sorts entries and writes the result back in a
//! deterministic layout.
//!
//! ## Features
//!
//! - Brace- and quote-aware parser with line-numbered fatal errors
//! - Case-insensitive key index with crossref inheritance for years and required fields
//! - First / von / last author name decomposition
//! - Delimiter, special-character, page-range, padding and author-format transforms
//! - `alpha` and `abstract` key styles with collision lettering
//! - Optional enrichment of missing fields from an external record store
//!
//! Recoverable problems never abort a run; they are collected in a [`Diagnostics`] value
//! that every stage writes to.
//!
//! ## Example
//!
//! ```
//! use bibstyle::{pipeline, Database, Diagnostics, KeyStyle, TidyOptions};
//!
//! let input = r#"
//!     @article{einstein,
//!         author = "Einstein, Albert",
//!         title = {Zur Elektrodynamik bewegter Körper},
//!         journal = "Annalen der Physik",
//!         pages = {891-921},
//!         year = 1905
//!     }
//! "#;
//!
//! let mut diag = Diagnostics::new();
//! let mut db = Database::parse(input, &mut diag)?;
//! assert_eq!(db.entries().len(), 1);
//!
//! let options = TidyOptions::preset().with_keys(KeyStyle::Alpha);
//! pipeline::run(&mut db, &options, &mut diag);
//!
//! let entry = &db.entries()[0];
//! assert_eq!(entry.key(), "Ein05");
//! assert_eq!(entry.get("author"), Some("\"Albert Einstein\""));
//! assert_eq!(entry.get("pages"), Some("\"891--921\""));
//! assert_eq!(entry.get("title"), Some("\"Zur Elektrodynamik bewegter K{\\\"o}rper\""));
//! assert_eq!(diag.warning_count(), 0);
//!
//! let output = bibstyle::to_string(&db)?;
//! assert!(output.starts_with("@article{Ein05,\n  author       = \"Albert Einstein\",\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    missing_debug_implementations
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod diagnostics;
pub mod enrich;
pub mod error;
pub mod keys;
pub mod model;
pub mod names;
pub mod options;
pub mod parser;
pub mod pipeline;
pub mod sort;
pub mod text;
pub mod transform;
pub mod validate;

mod database;
mod writer;

pub use database::{Database, DatabaseBuilder, DatabaseStats};
pub use diagnostics::Diagnostics;
pub use enrich::{
    open_record_source, JsonRecordSource, RecordSource, SourceRecord, SqliteRecordSource,
};
pub use error::{Error, Result};
pub use keys::{rewrite_citations, KeyRenames};
pub use model::{Author, Comment, Entry, EntryType, Field, Preamble, StringAbbreviation};
pub use options::{AuthorFormat, DelimiterStyle, KeyStyle, SortStyle, TidyOptions};
pub use pipeline::Report;
pub use writer::{backup, backup_path, to_file, to_string, write_with_backup, Writer, WriterConfig};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::{
        Database, DatabaseBuilder, Diagnostics, Entry, EntryType, Error, Result, TidyOptions,
    };
}

/// Parse a BibTeX database from a string
pub fn parse(input: &str, diag: &mut Diagnostics) -> Result<Database> {
    Database::parse(input, diag)
}

/// Parse a BibTeX database from a file
pub fn parse_file(path: impl AsRef<std::path::Path>, diag: &mut Diagnostics) -> Result<Database> {
    Database::parse_file(path, diag)
}
