//! Outer delimiter canonicalization

use super::{update_field, Transform};
use crate::options::DelimiterStyle;
use crate::text::{self, Delimiter};
use crate::{Database, Diagnostics};

/// Coerce every delimited field value to one delimiter style
#[derive(Debug, Clone, Copy)]
pub struct ConvertDelimiters {
    style: DelimiterStyle,
}

impl ConvertDelimiters {
    /// Convert to `style`
    #[must_use]
    pub const fn new(style: DelimiterStyle) -> Self {
        Self { style }
    }
}

impl Transform for ConvertDelimiters {
    fn name(&self) -> &str {
        "convert-delimiters"
    }

    fn apply(&self, db: &mut Database, _diag: &mut Diagnostics) {
        let target = self.style.delimiter();
        for entry in db.entries_mut() {
            let converted: Vec<(String, String)> = entry
                .fields
                .iter()
                .filter_map(|f| {
                    convert_delimiters(&f.name, &f.value, target).map(|v| (f.name.clone(), v))
                })
                .collect();

            for (tag, value) in converted {
                update_field(entry, &tag, value, "converted field delimiters");
            }
        }
    }
}

/// Canonical form of one field value, or `None` when the value is left alone
///
/// Delimited values get `target` as their outer pair; `title` is unwrapped down to its core
/// first so nested wrappers like `{{Title}}` collapse. Bare integers are wrapped; other bare
/// values (abbreviation references) are kept. A value whose inside holds a bare `"` keeps
/// braces, since it could not be quoted safely.
#[must_use]
pub fn convert_delimiters(tag: &str, value: &str, target: Delimiter) -> Option<String> {
    let inner = if text::is_single_group(value) {
        let mut inner = text::unquoted(value);
        if tag == "title" {
            while text::is_single_group(inner) {
                inner = text::trim(text::unquoted(inner));
            }
        }
        inner
    } else if text::is_integer(value) {
        value
    } else {
        return None;
    };

    let target = if target == Delimiter::Quotes && text::has_bare_quote(inner) {
        Delimiter::Braces
    } else {
        target
    };
    Some(target.wrap(inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_quotes() {
        assert_eq!(
            convert_delimiters("journal", "{Nature}", Delimiter::Quotes).as_deref(),
            Some("\"Nature\"")
        );
        assert_eq!(
            convert_delimiters("year", "1999", Delimiter::Quotes).as_deref(),
            Some("\"1999\"")
        );
        assert_eq!(convert_delimiters("month", "jan", Delimiter::Quotes), None);
    }

    #[test]
    fn test_convert_to_braces() {
        assert_eq!(
            convert_delimiters("author", "\"Knuth, D.\"", Delimiter::Braces).as_deref(),
            Some("{Knuth, D.}")
        );
    }

    #[test]
    fn test_title_is_unwrapped() {
        assert_eq!(
            convert_delimiters("title", "{{Deep Nesting}}", Delimiter::Braces).as_deref(),
            Some("{Deep Nesting}")
        );
        assert_eq!(
            convert_delimiters("title", "\"{Quoted}\"", Delimiter::Braces).as_deref(),
            Some("{Quoted}")
        );
        assert_eq!(
            convert_delimiters("title", "{{DNA} Sequencing}", Delimiter::Quotes).as_deref(),
            Some("\"{DNA} Sequencing\"")
        );
    }

    #[test]
    fn test_non_title_keeps_inner_braces() {
        assert_eq!(
            convert_delimiters("booktitle", "{{Proc}}", Delimiter::Quotes).as_deref(),
            Some("\"{Proc}\"")
        );
    }

    #[test]
    fn test_split_groups_are_not_delimiters() {
        assert_eq!(
            convert_delimiters("note", "{A} # {B}", Delimiter::Quotes),
            None
        );
    }

    #[test]
    fn test_bare_quote_keeps_braces() {
        assert_eq!(
            convert_delimiters("note", "{He said \"hi\"}", Delimiter::Quotes).as_deref(),
            Some("{He said \"hi\"}")
        );
    }

    #[test]
    fn test_idempotent() {
        let once = convert_delimiters("title", "{{X}}", Delimiter::Quotes).unwrap();
        let twice = convert_delimiters("title", &once, Delimiter::Quotes).unwrap();
        assert_eq!(once, twice);
    }
}
