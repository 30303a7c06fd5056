//! Search-term normalization.
//!
//! Two different raw terms that normalize identically must land on the same
//! cache entry, so every component that keys anything by a term goes through
//! [`normalize_term`] and [`slugify`].
//!
//! [`strip_qualifiers`] produces the single deterministic fallback term used
//! when the catalog's full-text search chokes on preparation words
//! ("finely chopped yellow onion" → "yellow onion").

/// Multi-word qualifiers removed before single-word stopwords.
const QUALIFIER_PHRASES: &[&str] = &[
    "low sodium",
    "low-sodium",
    "reduced sodium",
    "reduced-sodium",
    "no salt added",
    "low fat",
    "low-fat",
    "reduced fat",
    "reduced-fat",
    "fat free",
    "fat-free",
    "to taste",
    "room temperature",
    "at room temperature",
    "for garnish",
    "for serving",
    "cut into",
    "bite size",
    "bite-size",
];

/// Preparation and qualifier words that do not change product identity.
const QUALIFIER_WORDS: &[&str] = &[
    "sliced",
    "diced",
    "chopped",
    "minced",
    "grated",
    "shredded",
    "crushed",
    "peeled",
    "cubed",
    "julienned",
    "halved",
    "quartered",
    "trimmed",
    "rinsed",
    "drained",
    "softened",
    "melted",
    "beaten",
    "divided",
    "packed",
    "optional",
    "finely",
    "roughly",
    "coarsely",
    "thinly",
    "thickly",
    "freshly",
    "fresh",
    "organic",
    "large",
    "medium",
    "small",
    "extra",
    "pieces",
    "about",
    "and",
    "or",
    "of",
];

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize_term(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn an already-normalized string into a storage-key-safe slug.
///
/// Runs of non-alphanumeric characters collapse to a single `-`; leading and
/// trailing dashes are dropped. An input with no alphanumerics yields `"_"`
/// so the key is never empty.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}

/// Split text into lowercase alphanumeric tokens.
pub fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// True if `phrase` occurs in `haystack` as a run of whole words.
///
/// Both sides are tokenized, so punctuation and case are ignored:
/// `contains_word("Chicken, Breast", "chicken breast")` holds while
/// `contains_word("chickpeas", "chick")` does not.
pub fn contains_word(haystack: &str, phrase: &str) -> bool {
    let hay = tokens(haystack);
    let needle = tokens(phrase);
    if needle.is_empty() || needle.len() > hay.len() {
        return false;
    }
    hay.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Remove preparation/qualifier words from a term.
///
/// The result is normalized. It may equal the normalized input (nothing to
/// strip) or be empty (the term was nothing but qualifiers); callers treat
/// both as "no fallback available".
pub fn strip_qualifiers(raw: &str) -> String {
    let mut text = format!(" {} ", normalize_term(raw).replace(',', " "));
    for phrase in QUALIFIER_PHRASES {
        let padded = format!(" {} ", phrase);
        while text.contains(&padded) {
            text = text.replace(&padded, " ");
        }
    }
    text.split_whitespace()
        .filter(|w| !QUALIFIER_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_term("  Boneless   Chicken\tBreast "), "boneless chicken breast");
    }

    #[test]
    fn test_equivalent_terms_share_slug() {
        let a = slugify(&normalize_term("Greek  Yogurt"));
        let b = slugify(&normalize_term(" greek yogurt"));
        assert_eq!(a, b);
        assert_eq!(a, "greek-yogurt");
    }

    #[test]
    fn test_slugify_punctuation() {
        assert_eq!(slugify("ben & jerry's"), "ben-jerry-s");
        assert_eq!(slugify("--"), "_");
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("Boneless Skinless Chicken Breast", "chicken breast"));
        assert!(contains_word("Eggs, Large", "eggs"));
        assert!(!contains_word("Chickpeas", "chick"));
        assert!(!contains_word("Egg", ""));
    }

    #[test]
    fn test_strip_qualifiers() {
        assert_eq!(strip_qualifiers("finely chopped yellow onion"), "yellow onion");
        assert_eq!(strip_qualifiers("Low-Sodium chicken broth"), "chicken broth");
        assert_eq!(strip_qualifiers("organic baby spinach"), "baby spinach");
        assert_eq!(strip_qualifiers("butter, softened"), "butter");
        assert_eq!(strip_qualifiers("chopped"), "");
        assert_eq!(strip_qualifiers("ground beef"), "ground beef");
    }
}
