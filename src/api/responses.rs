//! Shared API response types
//!
//! Explicit per-endpoint response shapes with `From` conversions from the
//! domain models; what a client sees is exactly what the struct declares.

use serde::{Deserialize, Serialize};

use crate::models::{
    AiModuleDetail, AiModuleFile, Country, ModuleWithMeta, PagedResult, Publication, Tag,
    TagCategory, TagWithCategory, TagWithUsage, User,
};
use crate::services::{EnrichedValue, ModuleFull};

// ============================================================================
// Tag response types
// ============================================================================

/// Tag info embedded in module responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInfo {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub category_name: String,
}

impl From<TagWithCategory> for TagInfo {
    fn from(t: TagWithCategory) -> Self {
        Self {
            id: t.tag.id,
            name: t.tag.name.clone(),
            slug: t.tag.slug.clone(),
            color: t.tag.color_or_default().to_string(),
            category_name: t.category_name,
        }
    }
}

/// Full tag response for the tag endpoints
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub color: String,
    pub category_name: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<i64>,
}

impl From<TagWithUsage> for TagResponse {
    fn from(t: TagWithUsage) -> Self {
        Self {
            id: t.tag.id,
            name: t.tag.name.clone(),
            slug: t.tag.slug.clone(),
            description: t.tag.description.clone(),
            color: t.tag.color_or_default().to_string(),
            category_name: t.category_name,
            is_active: t.tag.is_active,
            usage_count: Some(t.usage_count),
        }
    }
}

impl From<Tag> for TagResponse {
    fn from(t: Tag) -> Self {
        let color = t.color_or_default().to_string();
        Self {
            id: t.id,
            name: t.name,
            slug: t.slug,
            description: t.description,
            color,
            category_name: String::new(),
            is_active: t.is_active,
            usage_count: None,
        }
    }
}

/// Category response
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sort_order: i64,
    pub min_tags: i64,
    pub max_tags: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl From<TagCategory> for CategoryResponse {
    fn from(c: TagCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            sort_order: c.sort_order,
            min_tags: c.min_tags,
            max_tags: c.max_tags,
            aliases: c.aliases,
        }
    }
}

// ============================================================================
// User response types
// ============================================================================

/// Brief user info embedded in module responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBrief {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
}

impl From<&User> for UserBrief {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            organization: u.organization.clone(),
        }
    }
}

/// Public user profile response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub country: String,
    pub role: String,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            organization: u.organization.clone(),
            country: u.country.clone(),
            role: u.role.to_string(),
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Module response types
// ============================================================================

/// Module response for list views
#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub company: String,
    pub country: String,
    pub params_count: i64,
    pub short_description: String,
    pub status: String,
    pub status_display: String,
    pub version: String,
    pub license: String,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
    pub published_at: Option<String>,
    pub like_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

impl From<ModuleWithMeta> for ModuleResponse {
    fn from(m: ModuleWithMeta) -> Self {
        let module = m.module;
        Self {
            id: module.id,
            name: module.name,
            slug: module.slug,
            company: module.company,
            country: module.country,
            params_count: module.params_count,
            short_description: module.short_description,
            status: module.status.to_string(),
            status_display: module.status.display().to_string(),
            version: module.version,
            license: module.license,
            created_by: module.created_by,
            created_at: module.created_at.to_rfc3339(),
            updated_at: module.updated_at.to_rfc3339(),
            published_at: module.published_at.map(|dt| dt.to_rfc3339()),
            like_count: m.like_count,
            tags: None,
            is_liked: None,
        }
    }
}

impl ModuleResponse {
    /// Attach tag info to the response
    pub fn with_tags(mut self, tags: Vec<TagWithCategory>) -> Self {
        self.tags = Some(tags.into_iter().map(TagInfo::from).collect());
        self
    }
}

/// Detail record embedded in the full module response
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub description: String,
    pub technical_info: String,
    pub architecture: String,
    pub training_data_description: String,
    pub metrics: serde_json::Value,
    pub supported_languages: serde_json::Value,
    pub requirements: String,
    pub installation_guide: String,
}

impl From<AiModuleDetail> for DetailResponse {
    fn from(d: AiModuleDetail) -> Self {
        Self {
            description: d.description,
            technical_info: d.technical_info,
            architecture: d.architecture,
            training_data_description: d.training_data_description,
            metrics: d.metrics,
            supported_languages: d.supported_languages,
            requirements: d.requirements,
            installation_guide: d.installation_guide,
        }
    }
}

/// Publication response
#[derive(Debug, Serialize)]
pub struct PublicationResponse {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub authors: String,
    pub authors_list: Vec<String>,
    pub journal_conference: String,
    pub publication_date: Option<String>,
    pub doi: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_url: Option<String>,
    pub formatted_citation: String,
    pub citation_count: i64,
    pub created_at: String,
}

impl From<Publication> for PublicationResponse {
    fn from(p: Publication) -> Self {
        let authors_list = p.authors_list();
        let citation_url = p.citation_url();
        let formatted_citation = p.format_citation();
        Self {
            id: p.id,
            module_id: p.module_id,
            title: p.title,
            authors: p.authors,
            authors_list,
            journal_conference: p.journal_conference,
            publication_date: p.publication_date.map(|d| d.to_string()),
            doi: p.doi,
            url: p.url,
            citation_url,
            formatted_citation,
            citation_count: p.citation_count,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Module file response
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub module_id: i64,
    pub name: String,
    pub file_type: String,
    pub file_type_display: String,
    pub description: String,
    pub size: i64,
    pub size_display: String,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: String,
}

impl From<AiModuleFile> for FileResponse {
    fn from(f: AiModuleFile) -> Self {
        let size_display = f.size_display();
        Self {
            id: f.id,
            module_id: f.module_id,
            name: f.name,
            file_type: f.file_type.to_string(),
            file_type_display: f.file_type.display().to_string(),
            description: f.description,
            size: f.size,
            size_display,
            uploaded_by: f.uploaded_by,
            uploaded_at: f.uploaded_at.to_rfc3339(),
        }
    }
}

/// Full module response for the detail endpoint
#[derive(Debug, Serialize)]
pub struct ModuleDetailResponse {
    #[serde(flatten)]
    pub module: ModuleResponse,
    pub meta_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailResponse>,
    pub publications: Vec<PublicationResponse>,
    pub files: Vec<FileResponse>,
    /// Tags grouped by category name
    pub tags_by_category: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<EnrichedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_status: Option<EnrichedValue>,
}

impl From<ModuleFull> for ModuleDetailResponse {
    fn from(full: ModuleFull) -> Self {
        let meta_description = full.module.module.meta_description.clone();
        let is_liked = full.is_liked;

        let mut grouped: std::collections::BTreeMap<String, Vec<serde_json::Value>> =
            std::collections::BTreeMap::new();
        for tag in &full.tags {
            grouped
                .entry(tag.category_name.clone())
                .or_default()
                .push(serde_json::json!({
                    "id": tag.tag.id,
                    "name": tag.tag.name,
                    "color": tag.tag.color_or_default(),
                }));
        }

        let mut module = ModuleResponse::from(full.module).with_tags(full.tags);
        module.is_liked = Some(is_liked);

        Self {
            module,
            meta_description,
            details: full.detail.map(DetailResponse::from),
            publications: full
                .publications
                .into_iter()
                .map(PublicationResponse::from)
                .collect(),
            files: full.files.into_iter().map(FileResponse::from).collect(),
            tags_by_category: serde_json::json!(grouped),
            availability: full.availability,
            usage_status: full.usage_status,
        }
    }
}

// ============================================================================
// Country and pagination response types
// ============================================================================

/// Country response
#[derive(Debug, Serialize)]
pub struct CountryResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_brics_member: bool,
    pub flag_emoji: String,
}

impl From<Country> for CountryResponse {
    fn from(c: Country) -> Self {
        Self {
            id: c.id,
            name: c.name,
            code: c.code,
            is_brics_member: c.is_brics_member,
            flag_emoji: c.flag_emoji,
        }
    }
}

/// Generic paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub results: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn from_paged<S, F: FnMut(S) -> T>(paged: PagedResult<S>, f: F) -> Self {
        let total = paged.total;
        let page = paged.page;
        let page_size = paged.per_page;
        let total_pages = paged.total_pages();
        Self {
            results: paged.items.into_iter().map(f).collect(),
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiModule, ListParams, ModuleStatus};

    fn sample_module() -> ModuleWithMeta {
        let mut module = AiModule::new(
            "M".to_string(),
            "m".to_string(),
            "C".to_string(),
            "Russia".to_string(),
            10,
            "d".to_string(),
            1,
        );
        module.id = 5;
        module.status = ModuleStatus::Active;
        ModuleWithMeta {
            module,
            like_count: 3,
        }
    }

    #[test]
    fn test_module_response_basic() {
        let response = ModuleResponse::from(sample_module());
        assert_eq!(response.id, 5);
        assert_eq!(response.status, "active");
        assert_eq!(response.status_display, "Active");
        assert_eq!(response.like_count, 3);
        assert!(response.tags.is_none());
    }

    #[test]
    fn test_paginated_response_mapping() {
        let paged = PagedResult::new(vec![sample_module()], 11, &ListParams::new(2, 5));
        let response = PaginatedResponse::from_paged(paged, ModuleResponse::from);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.total, 11);
        assert_eq!(response.page, 2);
        assert_eq!(response.total_pages, 3);
    }
}
