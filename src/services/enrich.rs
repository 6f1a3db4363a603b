//! Derived taxonomy fields
//!
//! The module "availability" and "usage status" views prefer a tag from the
//! corresponding category. Legacy records imported from the text-based
//! source never got those tags backfilled, so the detail record's free-text
//! column acts as a fallback: the raw text becomes the value, a
//! transliterated form the secondary display value, and `0` stands in for
//! the missing tag reference.

use serde::{Deserialize, Serialize};

use crate::models::{TagCategory, TagWithCategory};
use crate::services::slug::transliterate;

/// Canonical name of the availability category
pub const AVAILABILITY_CATEGORY: &str = "Availability";
/// Canonical name of the usage-status category
pub const USAGE_STATUS_CATEGORY: &str = "Usage status";

/// A derived field value, either tag-backed (`id` > 0) or synthesized from
/// legacy detail text (`id` == 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedValue {
    pub id: i64,
    pub value: String,
    pub display: String,
}

/// Active tags of the module whose category answers to `category_name`
/// (canonical name, slug or alias), duplicate-free.
pub fn tags_in_category<'a>(
    tags: &'a [TagWithCategory],
    categories: &[TagCategory],
    category_name: &str,
) -> Vec<&'a TagWithCategory> {
    let category = categories.iter().find(|c| c.matches_name(category_name));

    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .filter(|t| match category {
            Some(c) => t.tag.category_id == c.id,
            // No category on record: fall back to comparing the attached name
            None => t.category_name.eq_ignore_ascii_case(category_name),
        })
        .filter(|t| seen.insert(t.tag.id))
        .collect()
}

/// Derive a field from the preferred category tag, falling back to legacy
/// detail text. Returns `None` when neither source has a value.
pub fn derive_field(
    tags: &[TagWithCategory],
    categories: &[TagCategory],
    category_name: &str,
    fallback_text: &str,
) -> Option<EnrichedValue> {
    if let Some(tag) = tags_in_category(tags, categories, category_name).first() {
        return Some(EnrichedValue {
            id: tag.tag.id,
            value: tag.tag.name.clone(),
            display: tag.tag.name.clone(),
        });
    }

    let fallback = fallback_text.trim();
    if fallback.is_empty() {
        return None;
    }

    Some(EnrichedValue {
        id: 0,
        value: fallback.to_string(),
        display: transliterate(fallback),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;

    fn category(id: i64, name: &str, aliases: &[&str]) -> TagCategory {
        let mut c = TagCategory::new(name.to_string(), name.to_lowercase().replace(' ', "-"));
        c.id = id;
        c.aliases = aliases.iter().map(|a| a.to_string()).collect();
        c
    }

    fn tag(id: i64, category_id: i64, category_name: &str, name: &str) -> TagWithCategory {
        let mut t = Tag::new(category_id, name.to_string(), name.to_lowercase());
        t.id = id;
        TagWithCategory {
            tag: t,
            category_name: category_name.to_string(),
        }
    }

    #[test]
    fn test_tags_in_category_matches_alias() {
        let categories = vec![
            category(1, "Availability", &["Доступность"]),
            category(2, "Service type", &[]),
        ];
        let tags = vec![
            tag(10, 1, "Availability", "Open"),
            tag(11, 2, "Service type", "API"),
        ];

        let via_name = tags_in_category(&tags, &categories, "Availability");
        assert_eq!(via_name.len(), 1);
        assert_eq!(via_name[0].tag.id, 10);

        let via_alias = tags_in_category(&tags, &categories, "Доступность");
        assert_eq!(via_alias.len(), 1);
        assert_eq!(via_alias[0].tag.id, 10);
    }

    #[test]
    fn test_tags_in_category_deduplicates() {
        let categories = vec![category(1, "Availability", &[])];
        let tags = vec![
            tag(10, 1, "Availability", "Open"),
            tag(10, 1, "Availability", "Open"),
        ];
        assert_eq!(tags_in_category(&tags, &categories, "Availability").len(), 1);
    }

    #[test]
    fn test_derive_field_prefers_tag() {
        let categories = vec![category(1, "Availability", &[])];
        let tags = vec![tag(10, 1, "Availability", "Open")];

        let derived = derive_field(&tags, &categories, "Availability", "ignored text").unwrap();
        assert_eq!(derived.id, 10);
        assert_eq!(derived.value, "Open");
    }

    #[test]
    fn test_derive_field_fallback_transliterates() {
        let categories = vec![category(1, "Availability", &[])];

        let derived = derive_field(&[], &categories, "Availability", "Открытый доступ").unwrap();
        assert_eq!(derived.id, 0, "placeholder id marks the missing tag");
        assert_eq!(derived.value, "Открытый доступ");
        assert_eq!(derived.display, "otkrytyy dostup");
    }

    #[test]
    fn test_derive_field_empty_sources() {
        let categories = vec![category(1, "Availability", &[])];
        assert_eq!(derive_field(&[], &categories, "Availability", "   "), None);
    }
}
