//! AI module model
//!
//! This module provides:
//! - `AiModule` entity representing a cataloged AI service/model
//! - `ModuleStatus` enum for the moderation lifecycle
//! - `AiModuleDetail` one-to-one extension with free-text technical fields
//! - Input types for creating and updating modules
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AI module entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModule {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-friendly slug, unique and immutable once set
    pub slug: String,
    /// Developing company
    pub company: String,
    /// Country of origin
    pub country: String,
    /// Parameter count, always > 0
    pub params_count: i64,
    /// Short task description
    pub short_description: String,
    /// Moderation status
    pub status: ModuleStatus,
    /// Owning user ID
    pub created_by: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Publication timestamp, set on approval
    pub published_at: Option<DateTime<Utc>>,
    /// SEO description
    #[serde(default)]
    pub meta_description: String,
    /// Version string
    #[serde(default)]
    pub version: String,
    /// License, e.g. MIT, Apache 2.0
    #[serde(default)]
    pub license: String,
}

impl AiModule {
    /// Create a new module in draft status owned by the given user.
    pub fn new(
        name: String,
        slug: String,
        company: String,
        country: String,
        params_count: i64,
        short_description: String,
        created_by: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            slug,
            company,
            country,
            params_count,
            short_description,
            status: ModuleStatus::Draft,
            created_by,
            created_at: now,
            updated_at: now,
            published_at: None,
            meta_description: String::new(),
            version: String::new(),
            license: String::new(),
        }
    }
}

/// Module moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// Being edited by its creator, not submitted yet
    Draft,
    /// Submitted and waiting for an admin decision
    OnReview,
    /// Approved and publicly visible
    Active,
    /// Rejected by an admin with a comment
    Rejected,
    /// Removed from public view after publication
    Blocked,
}

impl Default for ModuleStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ModuleStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Draft => "draft",
            ModuleStatus::OnReview => "on_review",
            ModuleStatus::Active => "active",
            ModuleStatus::Rejected => "rejected",
            ModuleStatus::Blocked => "blocked",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ModuleStatus::Draft),
            "on_review" => Some(ModuleStatus::OnReview),
            "active" => Some(ModuleStatus::Active),
            "rejected" => Some(ModuleStatus::Rejected),
            "blocked" => Some(ModuleStatus::Blocked),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn display(&self) -> &'static str {
        match self {
            ModuleStatus::Draft => "Draft",
            ModuleStatus::OnReview => "On Review",
            ModuleStatus::Active => "Active",
            ModuleStatus::Rejected => "Rejected",
            ModuleStatus::Blocked => "Blocked",
        }
    }
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One-to-one detail record for a module.
///
/// Created lazily on first detail submission. The `ability` and
/// `usage_status` columns hold legacy free text used as a fallback when the
/// corresponding taxonomy tags were never assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiModuleDetail {
    pub id: i64,
    pub module_id: i64,
    pub description: String,
    pub technical_info: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub training_data_description: String,
    /// Quality metrics as a JSON object
    #[serde(default = "default_json_map")]
    pub metrics: serde_json::Value,
    /// Supported languages as a JSON array
    #[serde(default = "default_json_list")]
    pub supported_languages: serde_json::Value,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub installation_guide: String,
    /// Legacy availability text, superseded by the Availability tag category
    #[serde(default)]
    pub ability: String,
    /// Legacy usage-status text, superseded by the Usage status tag category
    #[serde(default)]
    pub usage_status: String,
}

fn default_json_map() -> serde_json::Value {
    serde_json::json!({})
}

fn default_json_list() -> serde_json::Value {
    serde_json::json!([])
}

/// A like on a module, unique per (user, module)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModuleLike {
    pub id: i64,
    pub user_id: i64,
    pub module_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Module together with its aggregate annotations for list/detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleWithMeta {
    #[serde(flatten)]
    pub module: AiModule,
    /// Number of likes
    pub like_count: i64,
}

/// Input for the detail record (create or update)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailInput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technical_info: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub training_data_description: String,
    #[serde(default = "default_json_map")]
    pub metrics: serde_json::Value,
    #[serde(default = "default_json_list")]
    pub supported_languages: serde_json::Value,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub installation_guide: String,
    #[serde(default)]
    pub ability: String,
    #[serde(default)]
    pub usage_status: String,
}

/// Input for creating a new module
#[derive(Debug, Clone, Deserialize)]
pub struct CreateModuleInput {
    pub name: String,
    pub company: String,
    pub country: String,
    pub params_count: i64,
    pub short_description: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub license: String,
    /// Nested detail record
    #[serde(default)]
    pub details: Option<DetailInput>,
    /// Tag IDs to assign
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    /// Nested publications
    #[serde(default)]
    pub publications: Vec<crate::models::publication::CreatePublicationInput>,
}

/// Input for updating an existing module
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateModuleInput {
    pub name: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub params_count: Option<i64>,
    pub short_description: Option<String>,
    pub meta_description: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub details: Option<DetailInput>,
    /// When present, the full tag set is replaced
    pub tag_ids: Option<Vec<i64>>,
}

impl UpdateModuleInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.company.is_some()
            || self.country.is_some()
            || self.params_count.is_some()
            || self.short_description.is_some()
            || self.meta_description.is_some()
            || self.version.is_some()
            || self.license.is_some()
            || self.details.is_some()
            || self.tag_ids.is_some()
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamping per_page to 1..=100
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Map the items into another type, keeping pagination intact
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_new_starts_as_draft() {
        let module = AiModule::new(
            "GigaChat".to_string(),
            "gigachat".to_string(),
            "Sber".to_string(),
            "Russia".to_string(),
            29_000_000_000,
            "Conversational LLM".to_string(),
            1,
        );

        assert_eq!(module.id, 0);
        assert_eq!(module.status, ModuleStatus::Draft);
        assert!(module.published_at.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ModuleStatus::Draft,
            ModuleStatus::OnReview,
            ModuleStatus::Active,
            ModuleStatus::Rejected,
            ModuleStatus::Blocked,
        ] {
            assert_eq!(ModuleStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ModuleStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_list_params_clamping() {
        let params = ListParams::new(0, 1000);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_paged_result_total_pages() {
        let params = ListParams::new(2, 10);
        let result: PagedResult<i32> = PagedResult::new(vec![1, 2, 3], 23, &params);
        assert_eq!(result.total_pages(), 3);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_update_input_has_changes() {
        let empty = UpdateModuleInput::default();
        assert!(!empty.has_changes());

        let input = UpdateModuleInput {
            name: Some("New name".to_string()),
            ..Default::default()
        };
        assert!(input.has_changes());
    }
}
