//! Text utilities shared by the parser and the transforms
//!
//! Field values are kept with their outer delimiters attached (`{...}` or `"..."`), so most of
//! these helpers are about taking that wrapper off and putting it back on.

use crate::parser::PResult;
use std::fmt;
use winnow::ascii::digit1;
use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::one_of;

/// Outer delimiter of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `{ ... }`
    Braces,
    /// `" ... "`
    Quotes,
    /// Bare value (number or abbreviation reference)
    None,
}

impl Delimiter {
    /// Opening delimiter text
    #[must_use]
    pub const fn open(self) -> &'static str {
        match self {
            Self::Braces => "{",
            Self::Quotes => "\"",
            Self::None => "",
        }
    }

    /// Closing delimiter text
    #[must_use]
    pub const fn close(self) -> &'static str {
        match self {
            Self::Braces => "}",
            Self::Quotes => "\"",
            Self::None => "",
        }
    }

    /// Wrap `inner` in this delimiter pair
    #[must_use]
    pub fn wrap(self, inner: &str) -> String {
        let mut out = String::with_capacity(inner.len() + 2);
        out.push_str(self.open());
        out.push_str(inner);
        out.push_str(self.close());
        out
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Braces => write!(f, "braces"),
            Self::Quotes => write!(f, "quotes"),
            Self::None => write!(f, "none"),
        }
    }
}

const PADDING: [char; 4] = [' ', '\n', '\t', '\r'];

/// Trim spaces, tabs and line breaks from both ends
#[must_use]
pub fn trim(s: &str) -> &str {
    s.trim_matches(PADDING.as_slice())
}

/// Split off the outer delimiter pair, if the value carries one
///
/// Only checks the first and last character; see [`is_single_group`] for the stricter test.
#[must_use]
pub fn unquote(s: &str) -> (Delimiter, &str) {
    if s.len() <= 1 {
        return (Delimiter::None, s);
    }
    if s.starts_with('{') && s.ends_with('}') {
        (Delimiter::Braces, &s[1..s.len() - 1])
    } else if s.starts_with('"') && s.ends_with('"') {
        (Delimiter::Quotes, &s[1..s.len() - 1])
    } else {
        (Delimiter::None, s)
    }
}

/// Value with its outer delimiters removed
#[must_use]
pub fn unquoted(s: &str) -> &str {
    unquote(s).1
}

/// Whether the outer delimiters of `s` enclose the whole value as one group
///
/// `{A} and {B}` starts and ends with braces but is two groups, so this returns `false` for it.
#[must_use]
pub fn is_single_group(s: &str) -> bool {
    match unquote(s) {
        (Delimiter::Braces, _) => {
            let mut depth = 0usize;
            for (i, b) in s.bytes().enumerate() {
                match b {
                    b'{' => depth += 1,
                    b'}' => {
                        if depth == 0 {
                            return false;
                        }
                        depth -= 1;
                        if depth == 0 {
                            return i == s.len() - 1;
                        }
                    }
                    _ => {}
                }
            }
            false
        }
        (Delimiter::Quotes, inner) => !has_bare_quote(inner),
        (Delimiter::None, _) => false,
    }
}

/// Whether `s` contains a `"` outside of any brace group
#[must_use]
pub fn has_bare_quote(s: &str) -> bool {
    let mut depth = 0i32;
    let mut prev = '\0';
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            '"' if depth == 0 && prev != '\\' => return true,
            _ => {}
        }
        prev = c;
    }
    false
}

/// Split on any of `separators`, dropping empty pieces
#[must_use]
pub fn split_any<'a>(s: &'a str, separators: &[char]) -> Vec<&'a str> {
    s.split(separators).filter(|p| !p.is_empty()).collect()
}

/// Optionally signed run of decimal digits
fn integer<'a>(input: &mut &'a str) -> PResult<'a, &'a str> {
    (opt(one_of(['+', '-'])), digit1)
        .recognize()
        .parse_next(input)
}

/// Whether the whole of `s` is an integer literal
#[must_use]
pub fn is_integer(s: &str) -> bool {
    integer.parse(s).is_ok()
}

/// Replace every occurrence of `search` until none is left
#[must_use]
pub fn replace_all(s: &str, search: &str, replacement: &str) -> String {
    let mut out = s.to_string();
    while out.contains(search) {
        out = out.replace(search, replacement);
    }
    out
}

/// Turn line breaks and tabs into spaces, squeeze repeated spaces, and trim
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    let spaced: String = s
        .chars()
        .map(|c| if matches!(c, '\n' | '\t' | '\r') { ' ' } else { c })
        .collect();
    trim(&replace_all(&spaced, "  ", " ")).to_string()
}

/// Alphabetic characters of `s`, skipping braces and LaTeX control sequences
///
/// `{\v{C}}ech` yields `C e c h`; `{\"O}zt` yields `O z t`.
pub fn plain_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    let mut chars = s.chars().peekable();
    std::iter::from_fn(move || {
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.peek() {
                    Some(n) if n.is_alphabetic() => {
                        while chars.peek().is_some_and(|n| n.is_alphabetic()) {
                            chars.next();
                        }
                    }
                    Some(_) => {
                        chars.next();
                    }
                    None => {}
                }
            } else if c.is_alphabetic() {
                return Some(c);
            }
        }
        None
    })
}
