//! Citation key synthesis
//!
//! New keys are built from the decomposed authors and the (possibly inherited) year. Entries
//! whose generated keys collide are told apart by letter suffixes, crossref fields that named
//! a renamed entry are updated, and the key index is rebuilt. The old-to-new table can then be
//! applied to the `\cite` commands of a LaTeX document with [`rewrite_citations`].

use crate::model::{Author, Entry};
use crate::options::KeyStyle;
use crate::parser::PResult;
use crate::text::{self, Delimiter};
use crate::{Database, Diagnostics};
use ahash::AHashMap;
use memchr::memmem;
use winnow::ascii::multispace0;
use winnow::combinator::{opt, repeat};
use winnow::prelude::*;
use winnow::token::{take_until, take_while};

/// Old key -> new key, for every entry whose key changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRenames {
    map: AHashMap<String, String>,
    lower: AHashMap<String, String>,
}

impl KeyRenames {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rename; the first rename of a key wins
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let old = old.into();
        let new = new.into();
        self.lower.entry(old.to_lowercase()).or_insert_with(|| new.clone());
        self.map.entry(old).or_insert(new);
    }

    /// New key for `old`, matched exactly first and case-insensitively second
    #[must_use]
    pub fn get(&self, old: &str) -> Option<&str> {
        self.map
            .get(old)
            .or_else(|| self.lower.get(&old.to_lowercase()))
            .map(String::as_str)
    }

    /// Number of renamed keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no key changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(old, new)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(o, n)| (o.as_str(), n.as_str()))
    }
}

/// `Knu84` style: surname letters or author initials, then a two-digit year
#[must_use]
pub fn alpha_key(authors: &[Author], year: &str) -> String {
    let year = if year.chars().count() == 4 {
        year.chars().skip(2).collect()
    } else {
        year.to_string()
    };

    let initial = |a: &Author| text::plain_letters(&a.last).next();
    let code: String = match authors {
        [] => String::new(),
        [only] => text::plain_letters(&only.last).take(3).collect(),
        many => {
            let mut code: String = many
                .iter()
                .take(5)
                .filter(|a| !a.is_others())
                .filter_map(initial)
                .collect();
            if many.len() == 6 {
                code.extend(many.get(5).filter(|a| !a.is_others()).and_then(initial));
            } else if many.len() > 6 {
                code.push('+');
            }
            code
        }
    };

    code + &year
}

/// `Knuth-1984` style: first surname token and the full year
///
/// Empty when there is no usable surname.
#[must_use]
pub fn abstract_key(authors: &[Author], year: &str) -> String {
    let surname: String = authors
        .first()
        .and_then(|a| text::split_any(&a.last, &[' ']).first().copied())
        .map(|t| text::plain_letters(t).collect())
        .unwrap_or_default();

    if surname.is_empty() || year.is_empty() {
        surname
    } else {
        format!("{surname}-{year}")
    }
}

/// Key for one entry in `style`, or `None` when the entry has no `author` field
pub fn generate_key(
    db: &Database,
    entry: &Entry,
    style: KeyStyle,
    diag: &mut Diagnostics,
) -> Option<String> {
    if !entry.has_field("author") {
        return None;
    }
    let year = db.year(entry);
    let authors = entry.authors(diag);
    Some(match style {
        KeyStyle::Alpha => alpha_key(authors, &year),
        KeyStyle::Abstract => abstract_key(authors, &year),
    })
}

/// Letter suffix for the `n`th (0-based) member of a collision group: `a`..`z`, `aa`, `ab`, ...
#[must_use]
pub fn collision_suffix(n: usize) -> String {
    let mut n = n + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Regenerate the keys of every entry with authors
///
/// Entries are grouped by generated key (entries without authors by their current key, which
/// they keep). A group of one takes the bare key; larger groups get suffixes in input order.
/// Crossref fields are redirected to renamed targets and the key index is rebuilt.
pub fn generate_keys(db: &mut Database, style: KeyStyle, diag: &mut Diagnostics) -> KeyRenames {
    let mut generated = Vec::with_capacity(db.entries().len());
    for entry in db.entries() {
        let key = match generate_key(db, entry, style, diag) {
            Some(key) if key.is_empty() => {
                diag.warn(format!("cannot generate key for {}, keeping it", entry.key));
                None
            }
            key => key,
        };
        generated.push(key);
    }

    // group members in input order, groups in order of first appearance
    let mut group_of: AHashMap<String, usize> = AHashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, entry) in db.entries().iter().enumerate() {
        let base = generated[i].as_deref().unwrap_or(&entry.key).to_lowercase();
        let next = groups.len();
        let g = *group_of.entry(base).or_insert(next);
        if g == next {
            groups.push(Vec::new());
        }
        groups[g].push(i);
    }

    let mut renames = KeyRenames::new();
    for group in &groups {
        for (n, &i) in group.iter().enumerate() {
            let Some(base) = generated[i].take() else {
                continue;
            };
            let new_key = if group.len() > 1 {
                base + &collision_suffix(n)
            } else {
                base
            };

            let entry = &mut db.entries_mut()[i];
            if entry.key != new_key {
                tracing::debug!(old = %entry.key, new = %new_key, "modified key");
                renames.insert(entry.key.clone(), new_key.clone());
                entry.key = new_key;
            }
        }
    }

    if !renames.is_empty() {
        rename_crossrefs(db, &renames);
        for key in db.reindex() {
            if renames.iter().any(|(_, new)| new.eq_ignore_ascii_case(&key)) {
                diag.warn(format!("duplicate entry key '{key}'"));
            }
        }
        db.link_crossrefs();
    }

    renames
}

/// Point `crossref` fields at the new keys of renamed targets, keeping their delimiters
fn rename_crossrefs(db: &mut Database, renames: &KeyRenames) {
    for entry in db.entries_mut() {
        let Some(value) = entry.get("crossref") else {
            continue;
        };
        let (delim, target) = text::unquote(value);
        let Some(new_target) = renames.get(text::trim(target)) else {
            continue;
        };
        let value = match delim {
            Delimiter::None => Delimiter::Braces.wrap(new_target),
            delim => delim.wrap(new_target),
        };
        tracing::debug!(key = %entry.key, crossref = %value, "redirected crossref");
        entry.set_field("crossref", value);
    }
}

/// `\cite`, optional variant letters and `*`, optional `[...]` arguments, then `{`
fn cite_prefix<'a>(input: &mut &'a str) -> PResult<'a, &'a str> {
    (
        "\\cite",
        take_while(0.., |c: char| c.is_ascii_alphabetic()),
        opt('*'),
        repeat::<_, _, (), _, _>(0.., (multispace0, '[', take_until(0.., "]"), ']')),
        multispace0,
        '{',
    )
        .recognize()
        .parse_next(input)
}

/// Comma-separated key list up to the closing `}`
fn cite_keys<'a>(input: &mut &'a str) -> PResult<'a, &'a str> {
    let keys = take_while(0.., |c: char| c != '}' && c != '{').parse_next(input)?;
    '}'.parse_next(input)?;
    Ok(keys)
}

/// Map the keys of every `\cite` command in `tex` through `renames`
///
/// Returns the rewritten document and the number of keys replaced. Whitespace around keys
/// and everything outside the key lists is preserved.
#[must_use]
pub fn rewrite_citations(tex: &str, renames: &KeyRenames) -> (String, usize) {
    let mut out = String::with_capacity(tex.len());
    let mut replaced = 0;
    let mut copied = 0;

    for start in memmem::find_iter(tex.as_bytes(), b"\\cite") {
        if start < copied {
            continue;
        }
        let mut rest = &tex[start..];
        let Ok(prefix) = cite_prefix.parse_next(&mut rest) else {
            continue;
        };
        let Ok(keys) = cite_keys.parse_next(&mut rest) else {
            continue;
        };

        out.push_str(&tex[copied..start]);
        out.push_str(prefix);
        let mapped: Vec<String> = keys
            .split(',')
            .map(|raw| {
                let key = text::trim(raw);
                match renames.get(key) {
                    Some(new) if !key.is_empty() => {
                        replaced += 1;
                        raw.replacen(key, new, 1)
                    }
                    _ => raw.to_string(),
                }
            })
            .collect();
        out.push_str(&mapped.join(","));
        out.push('}');
        copied = tex.len() - rest.len();
    }

    out.push_str(&tex[copied..]);
    (out, replaced)
}
