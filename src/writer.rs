//! BibTeX writer for serializing databases
//!
//! Output is deterministic: preambles, string abbreviations, entries, then comments, with a
//! blank line between groups and between entries. Fields are written in a fixed priority
//! order, with unlisted fields following alphabetically.

use crate::model::{Comment, Entry, Field, Preamble, StringAbbreviation};
use crate::{Database, Error, Result};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Field names in output order; anything else follows alphabetically
pub const TAG_ORDER: &[&str] = &[
    "author",
    "title",
    "year",
    "journal",
    "booktitle",
    "volume",
    "number",
    "pages",
    "publisher",
    "editor",
    "series",
    "address",
    "month",
    "organization",
    "institution",
    "howpublished",
    "isbn",
    "url",
    "ee",
    "doi",
];

/// Configuration for writing BibTeX
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Indentation string (default: "  ")
    pub indent: String,
    /// Column width field names are padded to (default: 12)
    pub tag_width: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            tag_width: 12,
        }
    }
}

/// BibTeX writer
#[derive(Debug)]
pub struct Writer<W: Write> {
    writer: W,
    config: WriterConfig,
}

impl<W: Write> Writer<W> {
    /// Create a new writer with default configuration
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            config: WriterConfig::default(),
        }
    }

    /// Create a new writer with custom configuration
    pub const fn with_config(writer: W, config: WriterConfig) -> Self {
        Self { writer, config }
    }

    /// Write a complete database
    pub fn write_database(&mut self, db: &Database) -> io::Result<()> {
        let mut started = false;

        if !db.preambles().is_empty() {
            for preamble in db.preambles() {
                self.write_preamble(preamble)?;
            }
            started = true;
        }

        if !db.strings().is_empty() {
            self.separate(started)?;
            for abbrv in db.strings() {
                self.write_string(abbrv)?;
            }
            started = true;
        }

        for entry in db.entries() {
            self.separate(started)?;
            self.write_entry(entry)?;
            started = true;
        }

        if !db.comments().is_empty() {
            self.separate(started)?;
            for comment in db.comments() {
                self.write_comment(comment)?;
            }
        }

        self.writer.flush()
    }

    fn separate(&mut self, started: bool) -> io::Result<()> {
        if started {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Write a single entry
    pub fn write_entry(&mut self, entry: &Entry) -> io::Result<()> {
        writeln!(self.writer, "@{}{{{},", entry.ty, entry.key)?;
        for field in ordered_fields(entry) {
            writeln!(
                self.writer,
                "{}{:<width$} = {},",
                self.config.indent,
                field.name,
                field.value,
                width = self.config.tag_width
            )?;
        }
        writeln!(self.writer, "}}")
    }

    /// Write a string definition
    fn write_string(&mut self, abbrv: &StringAbbreviation) -> io::Result<()> {
        writeln!(self.writer, "@string{{{} = {}}}", abbrv.tag, abbrv.value)
    }

    /// Write a preamble
    fn write_preamble(&mut self, preamble: &Preamble) -> io::Result<()> {
        writeln!(self.writer, "@preamble{{{}}}", preamble.0)
    }

    fn write_comment(&mut self, comment: &Comment) -> io::Result<()> {
        writeln!(self.writer, "@comment{{{}}}", comment.0)
    }
}

fn tag_rank(name: &str) -> usize {
    TAG_ORDER
        .iter()
        .position(|t| *t == name)
        .unwrap_or(TAG_ORDER.len())
}

/// Fields of `entry` in output order
#[must_use]
pub fn ordered_fields(entry: &Entry) -> Vec<&Field> {
    let mut fields: Vec<&Field> = entry.fields().iter().collect();
    fields.sort_by(|a, b| {
        tag_rank(&a.name)
            .cmp(&tag_rank(&b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
    fields
}

/// Convenience function to write a database to a string
pub fn to_string(db: &Database) -> Result<String> {
    let mut buf = Vec::new();
    let mut writer = Writer::new(&mut buf);
    writer.write_database(db)?;
    String::from_utf8(buf).map_err(|e| Error::IoError(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Convenience function to write a database to a file
pub fn to_file(db: &Database, path: impl AsRef<Path>) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = Writer::new(io::BufWriter::new(file));
    writer.write_database(db)?;
    Ok(())
}

/// `path` with `.orig` appended to its file name
#[must_use]
pub fn backup_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(".orig");
    PathBuf::from(name)
}

/// Copy an existing file at `path` to its `.orig` backup; returns the backup path if one was made
pub fn backup(path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let orig = backup_path(path);
    std::fs::copy(path, &orig)?;
    tracing::debug!(backup = %orig.display(), "saved original file");
    Ok(Some(orig))
}

/// Write `db` over `path`, keeping the previous content as `<path>.orig`
pub fn write_with_backup(db: &Database, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    // render first so a failure leaves the original untouched
    let output = to_string(db)?;
    backup(path)?;
    std::fs::write(path, output)?;
    Ok(())
}
