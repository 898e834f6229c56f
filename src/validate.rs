//! Required-field checks

use crate::{Database, Diagnostics};

/// Warn about every entry that lacks a field its type requires
///
/// Fields inherited through a resolved crossref count as present. Entries whose crossref
/// does not resolve are skipped, since their field set is unknown. Returns the number of
/// missing fields reported.
pub fn check_required_fields(db: &Database, diag: &mut Diagnostics) -> usize {
    let mut missing = 0;
    for entry in db.entries() {
        if entry.has_field("crossref") && db.crossref_target(entry).is_none() {
            continue;
        }

        let present = db.field_names(entry);
        for required in entry.ty.required_fields() {
            if !required.split('|').any(|f| present.contains(f)) {
                diag.warn(format!("missing required field '{required}' in {}", entry.key));
                missing += 1;
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &str) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let db = Database::parse(input, &mut diag).unwrap();
        check_required_fields(&db, &mut diag);
        diag
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let diag = check("@article{a, author = {X Y}, title = {T}}");
        assert!(diag.has_warning("missing required field 'journal' in a"));
        assert!(diag.has_warning("missing required field 'year' in a"));
        assert_eq!(diag.warning_count(), 2);
    }

    #[test]
    fn test_alternatives() {
        let diag = check("@book{b, editor = {E D}, title = {T}, publisher = {P}, year = 2000}");
        assert_eq!(diag.warning_count(), 0);

        let diag = check("@book{b, title = {T}, publisher = {P}, year = 2000}");
        assert!(diag.has_warning("missing required field 'author|editor' in b"));
    }

    #[test]
    fn test_inherited_fields() {
        let diag = check(
            "@inproceedings{p, author = {A B}, title = {T}, crossref = {c}}\n\
             @proceedings{c, title = {Proc}, booktitle = {Proc}, year = 1999}",
        );
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_dangling_crossref_is_not_checked() {
        let diag = check("@inproceedings{p, title = {T}, crossref = {gone}}");
        assert_eq!(diag.warnings(), ["non-existing crossref 'gone' in p".to_string()]);
    }

    #[test]
    fn test_misc_requires_nothing() {
        assert_eq!(check("@misc{m}").warning_count(), 0);
    }
}
