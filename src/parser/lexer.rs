//! Lexical analysis for a single BibTeX item

use super::PResult;
use crate::text::{self, Delimiter};
use crate::{Error, Result};
use winnow::combinator::preceded;
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse the `@type` header up to (not including) the opening brace
pub fn item_type<'a>(input: &mut &'a str) -> PResult<'a, &'a str> {
    preceded('@', take_while(0.., |c: char| c != '{')).parse_next(input)
}

/// Split `@type{content}` into the lowercased type and the trimmed content
pub fn split_type_content(item: &str, line: usize) -> Result<(String, &str)> {
    let mut rest = item;
    let ty = item_type
        .parse_next(&mut rest)
        .map_err(|_| Error::parse(line, "invalid item", item))?;

    let body = rest
        .strip_prefix('{')
        .and_then(|b| b.rfind('}').map(|end| &b[..end]))
        .ok_or_else(|| Error::parse(line, "invalid item", item))?;

    Ok((text::trim(ty).to_lowercase(), text::trim(body)))
}

/// Split item content on commas that sit outside any delimited value
///
/// A value opened by `{` ends at the matching brace; one opened by `"` ends at the next
/// unescaped `"` outside braces. Empty segments are dropped.
pub fn split_segments(s: &str, line: usize) -> Result<Vec<&str>> {
    let bytes = s.as_bytes();
    let mut result = Vec::new();
    let mut start = 0;
    let mut inside = false;
    let mut quote = 0u8;
    let mut depth = 0i32;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }

        if !inside && (b == b'{' || b == b'"') {
            inside = true;
            quote = b;
            continue;
        }
        if inside && quote == b'{' && depth == 0 {
            inside = false;
            continue;
        }
        if inside && quote == b'"' && b == b'"' && depth == 0 && !escaped(bytes, i) {
            inside = false;
            continue;
        }

        if !inside && b == b',' {
            if depth != 0 {
                return Err(Error::parse(line, "curly braces do not match", s));
            }
            push_segment(&mut result, &s[start..i]);
            start = i + 1;
        }
    }

    if depth != 0 {
        return Err(Error::parse(line, "curly braces do not match", s));
    }
    if inside {
        return Err(Error::parse(line, "invalid quotes", s));
    }
    push_segment(&mut result, &s[start..]);

    Ok(result)
}

fn escaped(bytes: &[u8], i: usize) -> bool {
    i > 0 && bytes[i - 1] == b'\\'
}

fn push_segment<'a>(result: &mut Vec<&'a str>, segment: &'a str) {
    let segment = text::trim(segment);
    if !segment.is_empty() {
        result.push(segment);
    }
}

/// Parse a `tag = value` segment
///
/// The tag is lowercased. A delimited value keeps its delimiter pair but has the inside
/// trimmed. `owner` names the entry for error messages.
pub fn parse_field(segment: &str, owner: &str, line: usize) -> Result<(String, String)> {
    let Some(eq) = segment.find('=') else {
        return Err(Error::parse(
            line,
            format!("invalid field '{segment}' in {owner}"),
            segment,
        ));
    };

    let tag = text::trim(&segment[..eq]).to_lowercase();
    let value = text::trim(&segment[eq + 1..]);
    if tag.is_empty() || value.is_empty() {
        return Err(Error::parse(
            line,
            format!("invalid field '{segment}' in {owner}"),
            segment,
        ));
    }

    let value = match text::unquote(value) {
        (Delimiter::None, bare) => bare.to_string(),
        (delim, inner) => delim.wrap(text::trim(inner)),
    };

    Ok((tag, value))
}
