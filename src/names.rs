//! Author name decomposition
//!
//! Splits an `author` field into people and each person into first / von / last parts. Two
//! input conventions are recognized: `von Last, First` when the name holds a comma, and
//! `First von Last` otherwise. The von part is detected by lowercase initials, which is a
//! heuristic: corporate names like "International Business Machines" come out as a plain
//! first/last split, and that is accepted rather than special-cased.

use crate::model::Author;
use crate::text;
use crate::Diagnostics;

/// Split a raw (possibly delimited) author field into decomposed names
///
/// People are separated by a literal lowercase ` and ` outside of braces.
pub fn parse_authors(value: &str, key: &str, diag: &mut Diagnostics) -> Vec<Author> {
    split_author_list(text::unquoted(value))
        .into_iter()
        .map(|name| parse_author(&name, key, diag))
        .collect()
}

/// Split on ` and ` at brace depth zero
#[must_use]
pub fn split_author_list(s: &str) -> Vec<String> {
    let s: String = s
        .chars()
        .map(|c| if matches!(c, '\n' | '\t' | '\r') { ' ' } else { c })
        .collect();

    let mut result = Vec::new();
    let mut cur = String::new();
    let mut depth = 0i32;
    let mut rest = s.as_str();

    while let Some(c) = rest.chars().next() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ' ' if depth == 0 && rest.starts_with(" and ") => {
                result.push(text::trim(&cur).to_string());
                cur.clear();
                rest = &rest[" and ".len()..];
                continue;
            }
            _ => {}
        }
        cur.push(c);
        rest = &rest[c.len_utf8()..];
    }

    result.push(text::trim(&cur).to_string());
    result
}

/// Decompose a single name
pub fn parse_author(input: &str, key: &str, diag: &mut Diagnostics) -> Author {
    let s = normalize_name(input);

    let mut author = if s.contains(',') {
        parse_comma_form(&s, key, diag)
    } else {
        parse_space_form(&s)
    };

    author.first = tidy(&author.first);
    author.von = tidy(&author.von);
    author.last = tidy(&author.last);

    diag.warn_unless(!author.last.is_empty(), || {
        format!("empty last name for author '{input}' in {key}")
    });
    diag.warn_unless(!author.first.is_empty() || author.is_others(), || {
        format!("empty first name for author '{input}' in {key}")
    });
    author
}

/// `~` becomes a space and a `.` directly followed by a letter gets a space after it
fn normalize_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '~' => out.push(' '),
            '.' if chars.peek().is_some_and(|n| n.is_alphabetic()) => out.push_str(". "),
            _ => out.push(c),
        }
    }
    out
}

fn starts_lowercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_lowercase)
}

fn tokens(s: &str) -> Vec<&str> {
    text::split_any(s, &[' ', '\n', '\r', '\t'])
}

/// `von Last, First`
fn parse_comma_form(s: &str, key: &str, diag: &mut Diagnostics) -> Author {
    let parts = text::split_any(s, &[',']);
    diag.warn_unless(parts.len() == 2, || {
        format!("cannot parse author '{s}' in {key}")
    });

    let prefix = tokens(parts.first().copied().unwrap_or(""));
    let first = parts.get(1).copied().unwrap_or("");

    // von runs up to the first token that does not start lowercase
    let (von, last) = match prefix.iter().position(|t| !starts_lowercase(t)) {
        Some(p) if p > 0 => (&prefix[..p], &prefix[p..]),
        _ => (&prefix[..0], &prefix[..]),
    };

    Author {
        first: first.to_string(),
        von: von.join(" "),
        last: last.join(" "),
    }
}

/// `First von Last`
fn parse_space_form(s: &str) -> Author {
    let tokens = tokens(s);
    let n = tokens.len();
    if n == 0 {
        return Author::default();
    }

    match tokens.iter().position(|t| starts_lowercase(t)) {
        Some(start) if start + 1 < n => Author {
            first: tokens[..start].join(" "),
            von: tokens[start..n - 1].join(" "),
            last: tokens[n - 1].to_string(),
        },
        // trailing lowercase token: it is the family name ("others" lands here)
        Some(start) => Author {
            first: tokens[..start].join(" "),
            von: String::new(),
            last: tokens[start..].join(" "),
        },
        None => Author {
            first: tokens[..n - 1].join(" "),
            von: String::new(),
            last: tokens[n - 1].to_string(),
        },
    }
}

fn tidy(s: &str) -> String {
    text::replace_all(text::trim(s), "  ", " ")
}
