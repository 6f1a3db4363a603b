//! Slug generation
//!
//! Transliterating slugify used for module slugs and taxonomy slugs. The
//! Cyrillic table mirrors the one the legacy data was migrated with, so
//! re-imported records keep their historical slugs.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static TRANSLIT: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('а', "a"),
        ('б', "b"),
        ('в', "v"),
        ('г', "g"),
        ('д', "d"),
        ('е', "e"),
        ('ё', "yo"),
        ('ж', "zh"),
        ('з', "z"),
        ('и', "i"),
        ('й', "y"),
        ('к', "k"),
        ('л', "l"),
        ('м', "m"),
        ('н', "n"),
        ('о', "o"),
        ('п', "p"),
        ('р', "r"),
        ('с', "s"),
        ('т', "t"),
        ('у', "u"),
        ('ф', "f"),
        ('х', "h"),
        ('ц', "ts"),
        ('ч', "ch"),
        ('ш', "sh"),
        ('щ', "sch"),
        ('ъ', ""),
        ('ы', "y"),
        ('ь', ""),
        ('э', "e"),
        ('ю', "yu"),
        ('я', "ya"),
    ])
});

/// Transliterate Cyrillic script to Latin, leaving other characters as-is.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match TRANSLIT.get(&ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

/// Produce a URL-friendly slug: transliterated, lowercase, ASCII
/// alphanumerics with single dashes, capped at `max_length`.
pub fn slugify(text: &str, max_length: usize) -> String {
    let transliterated = transliterate(text);

    let mut slug = String::with_capacity(transliterated.len());
    let mut prev_dash = true; // Suppress a leading dash
    for ch in transliterated.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > max_length {
        slug.truncate(max_length);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Candidate slugs for collision resolution: `base`, `base-2`, `base-3`…
/// An empty base falls back to `module`.
pub fn slug_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    let base = if base.is_empty() { "module" } else { base };
    (1u32..).map(move |i| {
        if i == 1 {
            base.to_string()
        } else {
            format!("{}-{}", base, i)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transliterate_cyrillic() {
        assert_eq!(transliterate("Щука"), "schuka");
        assert_eq!(transliterate("Яндекс"), "yandeks");
        assert_eq!(transliterate("объём"), "obyom");
        assert_eq!(transliterate("GigaChat"), "gigachat");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("GigaChat Pro", 50), "gigachat-pro");
        assert_eq!(slugify("Распознавание речи", 50), "raspoznavanie-rechi");
        assert_eq!(slugify("  spaces -- and ** symbols  ", 50), "spaces-and-symbols");
        assert_eq!(slugify("", 50), "");
    }

    #[test]
    fn test_slugify_truncates_cleanly() {
        let slug = slugify("a b c d e f", 5);
        assert!(slug.len() <= 5);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slug_candidates() {
        let mut candidates = slug_candidates("giga");
        assert_eq!(candidates.next().unwrap(), "giga");
        assert_eq!(candidates.next().unwrap(), "giga-2");
        assert_eq!(candidates.next().unwrap(), "giga-3");

        let mut empty = slug_candidates("");
        assert_eq!(empty.next().unwrap(), "module");
        assert_eq!(empty.next().unwrap(), "module-2");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn slugs_are_url_safe(text in ".{0,64}") {
            let slug = slugify(&text, 50);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(slug.len() <= 50);
        }

        #[test]
        fn slugify_is_idempotent(text in "[a-zA-Z0-9 ]{0,40}") {
            let once = slugify(&text, 50);
            prop_assert_eq!(slugify(&once, 50), once.clone());
        }
    }
}
