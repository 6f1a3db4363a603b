//! Tag taxonomy model
//!
//! A two-level controlled taxonomy: every `Tag` belongs to exactly one
//! `TagCategory`. Tags are soft-deleted via `is_active`; assignments to
//! modules go through the `ModuleTagAssignment` join entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback color used when a tag carries no explicit color
pub const DEFAULT_TAG_COLOR: &str = "#999999";

/// Tag category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCategory {
    /// Unique identifier
    pub id: i64,
    /// Canonical name, unique
    pub name: String,
    /// URL-friendly slug, unique
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Ordering weight, lower sorts first
    pub sort_order: i64,
    /// Soft-deletion flag
    pub is_active: bool,
    /// Legacy/localized names this category also answers to
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Minimum tags per module assignment (0 = no minimum)
    pub min_tags: i64,
    /// Maximum tags per module assignment
    pub max_tags: i64,
}

impl TagCategory {
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            slug,
            description: String::new(),
            sort_order: 0,
            is_active: true,
            aliases: Vec::new(),
            min_tags: 0,
            max_tags: 10,
        }
    }

    /// Check whether the category answers to the given name.
    ///
    /// Matches the canonical name, the slug, and any alias, case-insensitively.
    pub fn matches_name(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        if self.name.to_lowercase() == needle || self.slug.to_lowercase() == needle {
            return true;
        }
        self.aliases.iter().any(|a| a.to_lowercase() == needle)
    }
}

/// Tag entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Owning category
    pub category_id: i64,
    /// Tag name
    pub name: String,
    /// URL-friendly slug, unique per category
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// HEX color, may be empty
    #[serde(default)]
    pub color: String,
    /// Soft-deletion flag
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub approved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(category_id: i64, name: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            category_id,
            name,
            slug,
            description: String::new(),
            color: String::new(),
            is_active: true,
            created_by: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The tag color, falling back to the default grey
    pub fn color_or_default(&self) -> &str {
        if self.color.is_empty() {
            DEFAULT_TAG_COLOR
        } else {
            &self.color
        }
    }
}

/// Tag with its category name attached, as returned by module tag lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCategory {
    #[serde(flatten)]
    pub tag: Tag,
    pub category_name: String,
}

/// Tag with usage count for popularity listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithUsage {
    #[serde(flatten)]
    pub tag: Tag,
    pub category_name: String,
    /// Number of modules carrying this tag
    pub usage_count: i64,
}

/// Join entity recording who assigned which tag to which module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleTagAssignment {
    pub id: i64,
    pub module_id: i64,
    pub tag_id: i64,
    pub assigned_by: Option<i64>,
    pub assigned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_matches_canonical_name() {
        let category = TagCategory::new("Availability".to_string(), "availability".to_string());
        assert!(category.matches_name("Availability"));
        assert!(category.matches_name("availability"));
        assert!(category.matches_name(" AVAILABILITY "));
        assert!(!category.matches_name("Status"));
    }

    #[test]
    fn test_category_matches_alias() {
        let mut category = TagCategory::new("Availability".to_string(), "availability".to_string());
        category.aliases = vec!["Доступность".to_string()];
        assert!(category.matches_name("Доступность"));
        assert!(category.matches_name("доступность"));
    }

    #[test]
    fn test_tag_color_fallback() {
        let mut tag = Tag::new(1, "NLP".to_string(), "nlp".to_string());
        assert_eq!(tag.color_or_default(), DEFAULT_TAG_COLOR);
        tag.color = "#ff0000".to_string();
        assert_eq!(tag.color_or_default(), "#ff0000");
    }
}
