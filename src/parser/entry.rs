//! Item parsing for BibTeX

use super::{lexer, ParsedItem};
use crate::model::{Comment, Entry, EntryType, Preamble, StringAbbreviation};
use crate::{text, Diagnostics, Error, Result};

/// Parse one segmented item (`@type{...}`, possibly preceded by stray text)
///
/// Returns `Ok(None)` for items that are skipped with a warning.
pub fn parse_item(s: &str, line: usize, diag: &mut Diagnostics) -> Result<Option<ParsedItem>> {
    if s.is_empty() {
        return Ok(None);
    }

    if !s.starts_with('@') {
        let Some(at) = super::delimiter::find_byte(s.as_bytes(), b'@', 0) else {
            diag.warn(format!("unrecognized content '{s}'"));
            return Ok(None);
        };
        let ignored = &s[..at];
        diag.warn(format!("unrecognized content '{}'", text::trim(ignored)));
        let line = line + ignored.matches('\n').count();
        return parse_item(text::trim(&s[at..]), line, diag);
    }

    let (ty, content) = lexer::split_type_content(s, line)?;

    let item = match ty.as_str() {
        "string" => {
            let segments = lexer::split_segments(content, line)?;
            if segments.len() != 1 {
                return Err(Error::parse(line, "invalid string abbreviation", s));
            }
            let (tag, value) = lexer::parse_field(segments[0], "@string", line)?;
            ParsedItem::String(StringAbbreviation { tag, value })
        }
        "comment" => ParsedItem::Comment(Comment(content.to_string())),
        "preamble" => ParsedItem::Preamble(Preamble(content.to_string())),
        _ => match EntryType::parse(&ty) {
            Some(entry_type) => ParsedItem::Entry(parse_entry_body(entry_type, content, line, diag)?),
            None => {
                diag.warn(format!("ignoring unrecognized entry `{ty}'"));
                return Ok(None);
            }
        },
    };

    Ok(Some(item))
}

/// Parse the body of an entry (key and fields)
fn parse_entry_body(
    ty: EntryType,
    content: &str,
    line: usize,
    diag: &mut Diagnostics,
) -> Result<Entry> {
    let segments = lexer::split_segments(content, line)?;
    let Some((key, fields)) = segments.split_first() else {
        return Err(Error::parse(line, "invalid entry without key", content));
    };

    let mut entry = Entry::new(ty, *key);
    for segment in fields {
        let (tag, value) = lexer::parse_field(segment, key, line)?;
        if entry.has_field(&tag) {
            diag.warn(format!("duplicate field '{tag}' in {key}"));
        }
        entry.set_field(tag, value);
    }

    Ok(entry)
}

/// Parse a standalone bibliography entry, e.g. a record handed back by an enrichment source
pub fn parse_entry(input: &str, diag: &mut Diagnostics) -> Result<Entry> {
    match parse_item(text::trim(input), 1, diag)? {
        Some(ParsedItem::Entry(entry)) => Ok(entry),
        _ => Err(Error::parse(1, "not a bibliography entry", input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_entry() {
        let input = r#"@article{einstein1905,
            author = "Albert Einstein",
            title = {Zur Elektrodynamik bewegter Körper},
            year = 1905
        }"#;

        let mut diag = Diagnostics::new();
        let entry = parse_entry(input, &mut diag).unwrap();
        assert_eq!(entry.ty, EntryType::Article);
        assert_eq!(entry.key, "einstein1905");
        assert_eq!(entry.fields.len(), 3);

        assert_eq!(entry.fields[0].name, "author");
        assert_eq!(entry.fields[0].value, "\"Albert Einstein\"");
        assert_eq!(entry.fields[1].name, "title");
        assert_eq!(entry.fields[1].value, "{Zur Elektrodynamik bewegter Körper}");
        assert_eq!(entry.fields[2].name, "year");
        assert_eq!(entry.fields[2].value, "1905");
    }

    #[test]
    fn test_parse_entry_with_trailing_comma() {
        let input = r#"@book{knuth1984,
            author = "Donald Knuth",
            title = "The TeXbook",
            year = 1984,
        }"#;

        let mut diag = Diagnostics::new();
        let entry = parse_entry(input, &mut diag).unwrap();
        assert_eq!(entry.fields.len(), 3);
    }

    #[test]
    fn test_duplicate_field_overwrites() {
        let mut diag = Diagnostics::new();
        let entry = parse_entry("@misc{k, note = {one}, NOTE = {two}}", &mut diag).unwrap();
        assert_eq!(entry.get("note"), Some("{two}"));
        assert_eq!(entry.fields.len(), 1);
        assert!(diag.has_warning("duplicate field 'note' in k"));
    }

    #[test]
    fn test_string_abbreviation() {
        let mut diag = Diagnostics::new();
        let item = parse_item("@STRING{ACM = {ACM Press}}", 1, &mut diag).unwrap();
        assert_eq!(
            item,
            Some(ParsedItem::String(StringAbbreviation {
                tag: "acm".to_string(),
                value: "{ACM Press}".to_string(),
            }))
        );
    }

    #[test]
    fn test_string_abbreviation_with_two_pairs_is_fatal() {
        let mut diag = Diagnostics::new();
        let result = parse_item("@string{a = {x}, b = {y}}", 1, &mut diag);
        assert!(matches!(result, Err(Error::ParseError { .. })));
    }

    #[test]
    fn test_comment_is_opaque() {
        let mut diag = Diagnostics::new();
        let item = parse_item("@comment{ anything, even = this }", 1, &mut diag).unwrap();
        assert_eq!(
            item,
            Some(ParsedItem::Comment(Comment("anything, even = this".to_string())))
        );
    }

    #[test]
    fn test_not_an_entry() {
        let mut diag = Diagnostics::new();
        assert!(parse_entry("@comment{x}", &mut diag).is_err());
    }
}
