// SPDX-License-Identifier: GPL-3.0-or-later

//! Query normalization for catalog searches.
//!
//! Catalog search endpoints are picky about punctuation, bracketed annotations
//! ("(Live)", "[Remastered]") and the many spellings of "featuring". A query is
//! expanded into at most three variants that are tried in order:
//! 1. the query exactly as typed
//! 2. its normalized form
//! 3. the query with any "feat. ..." suffix removed

use lazy_static::lazy_static;
use regex::Regex;

/// Upper bound on the number of variants produced for one query.
pub const MAX_VARIANTS: usize = 3;

lazy_static! {
    static ref BRACKETED: Regex =
        Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("bracket regex is valid");
    static ref FEATURING_TOKEN: Regex =
        Regex::new(r"\b(?:featuring|feat|ft)(?:\.\s*|\s+|$)").expect("featuring regex is valid");
    static ref FEATURING_SUFFIX: Regex =
        Regex::new(r"(?i)\s*[(\[]?\s*\b(?:featuring|feat|ft)(?:\.|\s|$).*$")
            .expect("featuring suffix regex is valid");
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\s-]").expect("charset regex is valid");
    static ref SEPARATORS: Regex = Regex::new(r"[\s-]+").expect("separator regex is valid");
}

/// Lower-case the query, drop bracketed annotations, fold the spellings of
/// "featuring" into `feat`, strip punctuation and collapse separators.
///
/// Total: any input yields a (possibly empty) string.
pub fn normalize(query: &str) -> String {
    let lowered = query.to_lowercase();
    let without_brackets = BRACKETED.replace_all(&lowered, " ");
    let featuring = FEATURING_TOKEN.replace_all(&without_brackets, "feat ");
    let cleaned = DISALLOWED.replace_all(&featuring, "");
    SEPARATORS.replace_all(&cleaned, " ").trim().to_string()
}

/// Remove a trailing "feat. X" / "(ft. X)" / "featuring X" credit.
pub fn strip_featuring(query: &str) -> String {
    FEATURING_SUFFIX.replace(query, "").trim().to_string()
}

/// Expand a query into ordered, de-duplicated search variants.
///
/// Returns an empty list for blank input; otherwise the first entry is always
/// the original query.
pub fn generate_variants(query: &str) -> Vec<String> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut variants = Vec::with_capacity(MAX_VARIANTS);
    variants.push(query.to_string());

    for candidate in [normalize(query), strip_featuring(query)] {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize("  Hey   Jude "), "hey jude");
    }

    #[test]
    fn normalize_strips_bracketed_annotations() {
        assert_eq!(
            normalize("Bohemian Rhapsody (Remastered 2011) [Live]"),
            "bohemian rhapsody"
        );
    }

    #[test]
    fn normalize_folds_featuring_spellings() {
        assert_eq!(normalize("Lean On featuring MØ"), "lean on feat m");
        assert_eq!(normalize("Lean On ft. Mo"), "lean on feat mo");
        assert_eq!(normalize("Lean On Feat. Mo"), "lean on feat mo");
    }

    #[test]
    fn normalize_separates_featuring_without_space() {
        assert_eq!(normalize("Song feat.X"), "song feat x");
        assert_eq!(normalize("Song ft.X"), "song feat x");
        assert_eq!(normalize("Song feat."), "song feat");
        assert_eq!(normalize("Aftermath"), "aftermath");
    }

    #[test]
    fn normalize_removes_punctuation_and_collapses_hyphens() {
        assert_eq!(normalize("Don't Stop -- Me Now!"), "dont stop me now");
        assert_eq!(normalize("AC/DC - T.N.T."), "acdc tnt");
    }

    #[test]
    fn normalize_is_total() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize("(only brackets)"), "");
    }

    #[test]
    fn strip_featuring_removes_credit_suffix() {
        assert_eq!(strip_featuring("Lean On (feat. MØ)"), "Lean On");
        assert_eq!(strip_featuring("Stay ft. Justin Bieber"), "Stay");
        assert_eq!(strip_featuring("Empire State Of Mind featuring Alicia Keys"), "Empire State Of Mind");
        assert_eq!(strip_featuring("Hey Jude"), "Hey Jude");
        assert_eq!(strip_featuring("Song feat.X"), "Song");
    }

    #[test]
    fn strip_featuring_ignores_words_containing_ft() {
        assert_eq!(strip_featuring("Left Outside Alone"), "Left Outside Alone");
    }

    #[test]
    fn variants_for_blank_query_are_empty() {
        assert!(generate_variants("").is_empty());
        assert!(generate_variants("   \t").is_empty());
    }

    #[test]
    fn variants_start_with_original() {
        let variants = generate_variants("Hey Jude");
        assert_eq!(variants, vec!["Hey Jude".to_string(), "hey jude".to_string()]);
    }

    #[test]
    fn variants_skip_duplicates() {
        assert_eq!(generate_variants("hey jude"), vec!["hey jude".to_string()]);
    }

    #[test]
    fn variants_include_featuring_stripped_form() {
        let variants = generate_variants("Lean On (feat. MØ)");
        assert_eq!(
            variants,
            vec![
                "Lean On (feat. MØ)".to_string(),
                "lean on".to_string(),
                "Lean On".to_string(),
            ]
        );
    }

    #[test]
    fn variants_are_bounded_and_unique() {
        let inputs = [
            "Hey Jude",
            "a",
            "Song ft. Someone (Live) [2020]",
            "!!!",
            "déjà vu",
            "x featuring y",
            "  padded  ",
        ];
        for input in inputs {
            let variants = generate_variants(input);
            assert!(!variants.is_empty() && variants.len() <= MAX_VARIANTS, "{input}");
            assert_eq!(variants[0], input);
            let mut deduped = variants.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), variants.len(), "{input}");
        }
    }
}
