//! Run configuration
//!
//! [`TidyOptions`] selects which stages of the pipeline run. Every stage is off by default;
//! [`TidyOptions::preset`] turns on the common set.

use crate::text::Delimiter;
use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Outer delimiter style for field values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DelimiterStyle {
    /// `{value}`
    Braces,
    /// `"value"`
    Quotes,
}

impl DelimiterStyle {
    /// The delimiter pair this style writes
    #[must_use]
    pub const fn delimiter(self) -> Delimiter {
        match self {
            Self::Braces => Delimiter::Braces,
            Self::Quotes => Delimiter::Quotes,
        }
    }
}

/// Citation key synthesis convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum KeyStyle {
    /// Author initials and a two-digit year, e.g. `Knu84`
    Alpha,
    /// First surname and the full year, e.g. `knuth-1984`
    Abstract,
}

/// Entry ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SortStyle {
    /// By surname sequence
    Author,
    /// By title
    Title,
    /// Oldest first
    YearAsc,
    /// Newest first
    YearDesc,
}

/// Author list rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum AuthorFormat {
    /// `First von Last`
    Space,
    /// `von Last, First`
    Comma,
}

macro_rules! option_names {
    ($ty:ident, $option:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Command-line spelling of this value
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(Error::InvalidOption {
                        option: $option,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

option_names!(DelimiterStyle, "field-delimiters", { Braces => "braces", Quotes => "quotes" });
option_names!(KeyStyle, "keys", { Alpha => "alpha", Abstract => "abstract" });
option_names!(SortStyle, "sort", {
    Author => "author",
    Title => "title",
    YearAsc => "year-asc",
    YearDesc => "year-desc",
});
option_names!(AuthorFormat, "format-author", { Space => "space", Comma => "comma" });

/// Which pipeline stages run, and how
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TidyOptions {
    /// Canonical outer delimiter, if delimiters are rewritten
    pub delimiters: Option<DelimiterStyle>,
    /// Replace non-ASCII characters with LaTeX spellings
    pub replace_unicode: bool,
    /// Normalize page ranges to `a--b`
    pub fix_pages: bool,
    /// Collapse whitespace in prose fields
    pub fix_padding: bool,
    /// Author list rendering, if authors are rewritten
    pub author_format: Option<AuthorFormat>,
    /// Key synthesis style, if keys are regenerated
    pub keys: Option<KeyStyle>,
    /// Entry ordering, if entries are sorted
    pub sort: Option<SortStyle>,
    /// Record store used to fill in missing fields
    pub sync_db: Option<PathBuf>,
}

impl TidyOptions {
    /// Options with every stage disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The common cleanup set: quote delimiters, special characters, page ranges, padding,
    /// `First von Last` authors and newest-first order
    #[must_use]
    pub fn preset() -> Self {
        Self::new()
            .with_delimiters(DelimiterStyle::Quotes)
            .with_replace_unicode(true)
            .with_fix_pages(true)
            .with_fix_padding(true)
            .with_author_format(AuthorFormat::Space)
            .with_sort(SortStyle::YearDesc)
    }

    /// Set the delimiter style
    #[must_use]
    pub fn with_delimiters(mut self, style: DelimiterStyle) -> Self {
        self.delimiters = Some(style);
        self
    }

    /// Toggle special-character replacement
    #[must_use]
    pub fn with_replace_unicode(mut self, enabled: bool) -> Self {
        self.replace_unicode = enabled;
        self
    }

    /// Toggle the page-range fix
    #[must_use]
    pub fn with_fix_pages(mut self, enabled: bool) -> Self {
        self.fix_pages = enabled;
        self
    }

    /// Toggle the padding fix
    #[must_use]
    pub fn with_fix_padding(mut self, enabled: bool) -> Self {
        self.fix_padding = enabled;
        self
    }

    /// Set the author format
    #[must_use]
    pub fn with_author_format(mut self, format: AuthorFormat) -> Self {
        self.author_format = Some(format);
        self
    }

    /// Set the key style
    #[must_use]
    pub fn with_keys(mut self, style: KeyStyle) -> Self {
        self.keys = Some(style);
        self
    }

    /// Set the sort order
    #[must_use]
    pub fn with_sort(mut self, style: SortStyle) -> Self {
        self.sort = Some(style);
        self
    }

    /// Set the record store path
    #[must_use]
    pub fn with_sync_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.sync_db = Some(path.into());
        self
    }
}
