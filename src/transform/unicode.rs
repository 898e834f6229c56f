//! Special character replacement
//!
//! Non-ASCII characters are rewritten to their LaTeX spelling. Ligatures, dashes, typographic
//! quotes and a few symbols come from a fixed table; accented letters are decomposed (NFD) and
//! each combining mark is mapped to its accent command. Characters with no known spelling are
//! left untouched.

use super::{update_field, Transform};
use crate::{Database, Diagnostics};
use ahash::AHashMap;
use lazy_static::lazy_static;
use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SPECIAL_CHARS: AHashMap<char, &'static str> = [
        ('ß', "{\\ss}"),
        ('æ', "{\\ae}"),
        ('Æ', "{\\AE}"),
        ('ø', "{\\o}"),
        ('Ø', "{\\O}"),
        ('å', "{\\aa}"),
        ('Å', "{\\AA}"),
        ('œ', "{\\oe}"),
        ('Œ', "{\\OE}"),
        ('ł', "{\\l}"),
        ('Ł', "{\\L}"),
        ('ı', "{\\i}"),
        ('đ', "{\\dj}"),
        ('Đ', "{\\DJ}"),
        ('þ', "{\\th}"),
        ('Þ', "{\\TH}"),
        ('ð', "{\\dh}"),
        ('Ð', "{\\DH}"),
        ('–', "--"),
        ('—', "---"),
        ('‘', "`"),
        ('’', "'"),
        ('“', "``"),
        ('”', "''"),
        ('„', ",,"),
        ('…', "{\\ldots}"),
        ('\u{a0}', "~"),
        ('§', "{\\S}"),
        ('¶', "{\\P}"),
        ('©', "{\\copyright}"),
        ('®', "{\\textregistered}"),
        ('™', "{\\texttrademark}"),
        ('°', "{\\textdegree}"),
        ('¡', "{!`}"),
        ('¿', "{?`}"),
        ('€', "{\\texteuro}"),
        ('£', "{\\pounds}"),
        ('«', "{\\guillemotleft}"),
        ('»', "{\\guillemotright}"),
        ('×', "{$\\times$}"),
        ('±', "{$\\pm$}"),
        ('µ', "{$\\mu$}"),
    ]
    .into_iter()
    .collect();
}

/// Accent command for a combining mark, and whether the command takes a braced argument
fn accent(mark: char) -> Option<(&'static str, bool)> {
    let accent = match mark {
        '\u{300}' => ("`", false),
        '\u{301}' => ("'", false),
        '\u{302}' => ("^", false),
        '\u{303}' => ("~", false),
        '\u{304}' => ("=", false),
        '\u{307}' => (".", false),
        '\u{308}' => ("\"", false),
        '\u{306}' => ("u", true),
        '\u{30a}' => ("r", true),
        '\u{30b}' => ("H", true),
        '\u{30c}' => ("v", true),
        '\u{323}' => ("d", true),
        '\u{327}' => ("c", true),
        '\u{328}' => ("k", true),
        _ => return None,
    };
    Some(accent)
}

/// LaTeX spelling of a precomposed accented letter such as `é` or `Č`
fn accented(c: char) -> Option<String> {
    let mut parts = std::iter::once(c).nfd();
    let base = parts.next().filter(char::is_ascii_alphabetic)?;
    let mut spelled = base.to_string();
    let mut any = false;
    for mark in parts {
        let (cmd, braced) = accent(mark)?;
        spelled = if braced {
            format!("\\{cmd}{{{spelled}}}")
        } else {
            format!("\\{cmd}{spelled}")
        };
        any = true;
    }
    any.then(|| format!("{{{spelled}}}"))
}

/// Rewrite non-ASCII characters of `s` to LaTeX; borrows when nothing changes
#[must_use]
pub fn to_latex(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(latex) = SPECIAL_CHARS.get(&c) {
            out.push_str(latex);
        } else if let Some(latex) = accented(c) {
            out.push_str(&latex);
        } else {
            out.push(c);
        }
    }

    if out == s {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(out)
    }
}

/// Replace special characters in every field value
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceUnicode;

impl Transform for ReplaceUnicode {
    fn name(&self) -> &str {
        "replace-unicode"
    }

    fn apply(&self, db: &mut Database, _diag: &mut Diagnostics) {
        for entry in db.entries_mut() {
            let replaced: Vec<(String, String)> = entry
                .fields
                .iter()
                .filter_map(|f| match to_latex(&f.value) {
                    Cow::Owned(v) => Some((f.name.clone(), v)),
                    Cow::Borrowed(_) => None,
                })
                .collect();

            for (tag, value) in replaced {
                update_field(entry, &tag, value, "replaced special characters");
            }
        }
    }
}
