//! Name normalization used for guest lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// None when the regex engine was built without Unicode property tables
static DIACRITIC_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\p{Diacritic}+").ok());

/// Decompose and drop diacritical marks, e.g. "Émile" -> "Emile".
pub fn strip_diacritics(input: &str) -> String {
    let decomposed: String = input.nfd().collect();
    match DIACRITIC_RE.as_ref() {
        Some(re) => re.replace_all(&decomposed, "").into_owned(),
        None => strip_combining_marks(&decomposed),
    }
}

/// Fallback that only removes combining marks.
pub fn strip_combining_marks(decomposed: &str) -> String {
    decomposed
        .chars()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Case-fold, strip diacritics and collapse whitespace.
///
/// Lower-casing happens before decomposition so that characters whose
/// lower-case form carries a combining mark (e.g. 'İ') are fully stripped in
/// one pass, which keeps the function idempotent.
pub fn normalize_name(input: &str) -> String {
    let stripped = strip_diacritics(&input.to_lowercase());
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Looser comparison key used when matching names against live sheet rows.
pub fn normalize_cell(input: &str) -> String {
    input.trim().to_lowercase()
}
