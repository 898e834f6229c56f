//! Field normalization transforms
//!
//! - [`Transform`] - the trait implemented by every normalization step
//! - [`TransformPipeline`] - ordered collection of transforms to execute
//!
//! Each transform rewrites field values in place and is a no-op for values that are already
//! in canonical form, so running one twice gives the same result as running it once. The
//! pipeline built from [`TidyOptions`] always runs them in the same order: delimiters,
//! special characters, page dashes, padding, author format.

mod authors;
mod delimiters;
mod pages;
mod padding;
mod unicode;

pub use authors::{format_author_list, FormatAuthors};
pub use delimiters::{convert_delimiters, ConvertDelimiters};
pub use pages::{fix_pages, FixPagesDash};
pub use padding::{FixPadding, PROSE_FIELDS};
pub use unicode::{to_latex, ReplaceUnicode};

use crate::model::Entry;
use crate::options::TidyOptions;
use crate::{Database, Diagnostics};

/// A single in-place normalization over every entry of a database
pub trait Transform {
    /// Human-readable name, used for logging
    fn name(&self) -> &str;

    /// Apply the transformation
    fn apply(&self, db: &mut Database, diag: &mut Diagnostics);
}

/// A pipeline of transforms to execute in order
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create a new empty pipeline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline for the transforms enabled in `options`
    #[must_use]
    pub fn from_options(options: &TidyOptions) -> Self {
        let mut pipeline = Self::new();
        if let Some(style) = options.delimiters {
            pipeline.push(Box::new(ConvertDelimiters::new(style)));
        }
        if options.replace_unicode {
            pipeline.push(Box::new(ReplaceUnicode));
        }
        if options.fix_pages {
            pipeline.push(Box::new(FixPagesDash));
        }
        if options.fix_padding {
            pipeline.push(Box::new(FixPadding));
        }
        if let Some(format) = options.author_format {
            pipeline.push(Box::new(FormatAuthors::new(format)));
        }
        pipeline
    }

    /// Add a transform to the end of the pipeline
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Get the number of transforms in the pipeline
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the pipeline is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Execute all transforms in insertion order
    pub fn execute(&self, db: &mut Database, diag: &mut Diagnostics) {
        for transform in &self.transforms {
            tracing::debug!(transform = transform.name(), "Running transform");
            transform.apply(db, diag);
        }
    }

    /// List the names of all transforms in execution order
    #[must_use]
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.transform_names()).finish()
    }
}

/// Store `value` under `tag` if it differs from the current one; logs the change at debug level
pub(crate) fn update_field(entry: &mut Entry, tag: &str, value: String, what: &str) -> bool {
    if entry.get(tag) == Some(value.as_str()) {
        return false;
    }
    tracing::debug!(key = %entry.key, field = tag, "{what}");
    entry.set_field(tag, value);
    true
}
