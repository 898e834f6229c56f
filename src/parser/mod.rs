//! BibTeX parser implementation
//!
//! Parsing runs in two layers. The segmenter walks the input tracking brace depth and cuts it
//! into top-level items each time the depth drops back to zero. Each item is then split into
//! its type, key and fields by [`entry::parse_item`].

pub mod delimiter;
pub mod entry;
pub mod lexer;

use crate::model::{Comment, Entry, Preamble, StringAbbreviation};
use crate::{text, Diagnostics, Error, Result};

pub use entry::parse_entry;

/// Internal parser result type
pub type PResult<'a, O> = winnow::PResult<O, winnow::error::ContextError>;

/// A parsed item from the BibTeX file
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedItem {
    /// A bibliography entry
    Entry(Entry),
    /// A string definition
    String(StringAbbreviation),
    /// A preamble
    Preamble(Preamble),
    /// A comment
    Comment(Comment),
}

/// Parse a complete BibTeX database into top-level items
///
/// Brace mismatches are fatal; unrecognized text and unknown entry types are reported to
/// `diag` and skipped.
pub fn parse_bibtex(input: &str, diag: &mut Diagnostics) -> Result<Vec<ParsedItem>> {
    let bytes = input.as_bytes();
    let mut items = Vec::new();

    let mut depth = 0usize;
    let mut line = 1;
    let mut start = 0;
    let mut start_line = 1;
    let mut pos = 0;

    while let Some((i, byte)) = delimiter::find_structural(bytes, pos) {
        match byte {
            b'\n' => line += 1,
            b'{' => depth += 1,
            _ => {
                if depth == 0 {
                    return Err(Error::UnbalancedBraces { line });
                }
                depth -= 1;
                if depth == 0 {
                    let raw = &input[start..=i];
                    let item_line = start_line + leading_lines(raw);
                    if let Some(item) = entry::parse_item(text::trim(raw), item_line, diag)? {
                        items.push(item);
                    }
                    start = i + 1;
                    start_line = line;
                }
            }
        }
        pos = i + 1;
    }

    if depth != 0 {
        return Err(Error::UnbalancedBraces { line });
    }

    let trailing = text::trim(&input[start..]);
    if !trailing.is_empty() {
        diag.warn(format!("unrecognized content '{trailing}'"));
    }

    Ok(items)
}

/// Number of line breaks in the whitespace before an item starts
fn leading_lines(raw: &str) -> usize {
    let lead = raw.len() - raw.trim_start_matches([' ', '\n', '\t', '\r']).len();
    raw[..lead].matches('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryType;

    fn parse(input: &str) -> (Result<Vec<ParsedItem>>, Diagnostics) {
        let mut diag = Diagnostics::new();
        let items = parse_bibtex(input, &mut diag);
        (items, diag)
    }

    #[test]
    fn test_segments_items() {
        let (items, diag) = parse(
            "@string{ieee = \"IEEE\"}\n@article{a, title = {T {nested}}}\n@comment{c}\n@preamble{p}",
        );
        let items = items.unwrap();
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], ParsedItem::String(_)));
        match &items[1] {
            ParsedItem::Entry(e) => {
                assert_eq!(e.ty, EntryType::Article);
                assert_eq!(e.get("title"), Some("{T {nested}}"));
            }
            _ => panic!("Expected entry"),
        }
        assert_eq!(items[2], ParsedItem::Comment(Comment("c".to_string())));
        assert_eq!(items[3], ParsedItem::Preamble(Preamble("p".to_string())));
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_unbalanced_close_reports_line() {
        let (items, _) = parse("@misc{a, title = {x}}\n\n}\n");
        match items {
            Err(Error::UnbalancedBraces { line }) => assert_eq!(line, 3),
            other => panic!("Expected brace error, got {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_item_is_fatal() {
        let (items, _) = parse("@misc{a,\n title = {x}\n");
        assert!(matches!(items, Err(Error::UnbalancedBraces { line: 3 })));
    }

    #[test]
    fn test_leading_garbage_warns() {
        let (items, diag) = parse("some notes\n@misc{a, title = {x}}");
        assert_eq!(items.unwrap().len(), 1);
        assert!(diag.has_warning("unrecognized content 'some notes'"));
    }

    #[test]
    fn test_trailing_garbage_warns() {
        let (items, diag) = parse("@misc{a, title = {x}}\ntrailing words\n");
        assert_eq!(items.unwrap().len(), 1);
        assert!(diag.has_warning("unrecognized content 'trailing words'"));
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let (items, diag) = parse("@online{a, title = {x}}\n@misc{b, title = {y}}");
        assert_eq!(items.unwrap().len(), 1);
        assert!(diag.has_warning("ignoring unrecognized entry `online'"));
    }

    #[test]
    fn test_error_line_of_item() {
        let (items, _) = parse("@misc{a, title = {x}}\n\n@misc{b,\n title {y}}");
        match items {
            Err(Error::ParseError { line, message, .. }) => {
                assert_eq!(line, 3);
                assert!(message.contains("invalid field"));
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }
}
