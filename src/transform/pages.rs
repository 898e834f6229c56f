//! Page range dash normalization

use super::{update_field, Transform};
use crate::text::{self, Delimiter};
use crate::{Database, Diagnostics};

/// Canonical `start--end` form of a `pages` value, or `None` when it is not a numeric range
///
/// The inner text is split on spaces and hyphens; exactly two integer tokens make a range.
/// The outer delimiters are kept as found.
#[must_use]
pub fn fix_pages(value: &str) -> Option<String> {
    let (delim, inner) = text::unquote(value);
    let tokens = text::split_any(inner, &[' ', '-']);
    match tokens.as_slice() {
        [start, end] if text::is_integer(start) && text::is_integer(end) => {
            let range = format!("{start}--{end}");
            Some(match delim {
                Delimiter::None => range,
                delim => delim.wrap(&range),
            })
        }
        _ => None,
    }
}

/// Rewrite numeric page ranges to use a double dash
#[derive(Debug, Clone, Copy, Default)]
pub struct FixPagesDash;

impl Transform for FixPagesDash {
    fn name(&self) -> &str {
        "fix-pages"
    }

    fn apply(&self, db: &mut Database, _diag: &mut Diagnostics) {
        for entry in db.entries_mut() {
            if let Some(fixed) = entry.get("pages").and_then(fix_pages) {
                update_field(entry, "pages", fixed, "fixed page range");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_dash() {
        assert_eq!(fix_pages("{12-34}").as_deref(), Some("{12--34}"));
        assert_eq!(fix_pages("\"12 - 34\"").as_deref(), Some("\"12--34\""));
        assert_eq!(fix_pages("{12---34}").as_deref(), Some("{12--34}"));
    }

    #[test]
    fn test_already_canonical() {
        assert_eq!(fix_pages("{12--34}").as_deref(), Some("{12--34}"));
    }

    #[test]
    fn test_non_numeric_is_left_alone() {
        assert_eq!(fix_pages("{xii-xiv}"), None);
        assert_eq!(fix_pages("{12}"), None);
        assert_eq!(fix_pages("{1-2-3}"), None);
    }
}
