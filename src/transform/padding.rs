//! Whitespace padding removal for prose fields

use super::{update_field, Transform};
use crate::text;
use crate::{Database, Diagnostics};

/// Fields whose values are free text and get their whitespace collapsed
pub const PROSE_FIELDS: &[&str] = &[
    "title",
    "booktitle",
    "journal",
    "publisher",
    "series",
    "address",
    "organization",
    "institution",
    "howpublished",
];

/// Collapse runs of whitespace and line breaks inside prose fields
///
/// Works on the value inside its outer delimiters, so padding next to them is trimmed too.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixPadding;

impl Transform for FixPadding {
    fn name(&self) -> &str {
        "fix-padding"
    }

    fn apply(&self, db: &mut Database, _diag: &mut Diagnostics) {
        for entry in db.entries_mut() {
            for tag in PROSE_FIELDS {
                if let Some(value) = entry.get(tag) {
                    let (delim, inner) = text::unquote(value);
                    let collapsed = delim.wrap(&text::collapse_whitespace(inner));
                    update_field(entry, tag, collapsed, "removed whitespace padding");
                }
            }
        }
    }
}
