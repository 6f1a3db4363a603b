//! Publication service
//!
//! Read surface for publications; creation happens through the module
//! interface or the bulk import command.

use std::sync::Arc;

use crate::db::repositories::{PublicationFilter, PublicationRepository};
use crate::models::{CreatePublicationInput, ListParams, PagedResult, Publication};
use crate::services::error::{ServiceError, ServiceResult};

/// Publication service
pub struct PublicationService {
    repo: Arc<dyn PublicationRepository>,
}

impl PublicationService {
    pub fn new(repo: Arc<dyn PublicationRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        filter: &PublicationFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<Publication>> {
        Ok(self.repo.list(filter, params).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Publication> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Publication not found: {}", id)))
    }

    pub async fn for_module(&self, module_id: i64) -> ServiceResult<Vec<Publication>> {
        Ok(self.repo.for_module(module_id).await?)
    }

    /// Create a publication attached to a module.
    pub async fn create(
        &self,
        module_id: i64,
        input: &CreatePublicationInput,
        added_by: Option<i64>,
    ) -> ServiceResult<Publication> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("Publication title is required"));
        }

        let mut publication = Publication::new(module_id, input.title.trim().to_string());
        publication.authors = input.authors.clone();
        publication.journal_conference = input.journal_conference.clone();
        publication.publication_date = input.publication_date;
        publication.doi = input.doi.clone();
        publication.url = input.url.clone();
        publication.citation_count = input.citation_count;
        publication.added_by = added_by;

        Ok(self.repo.create(&publication).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxPublicationRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> PublicationService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('u', 'u@e.com', 'h', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO modules (name, slug, company, country, params_count,
             short_description, created_by, created_at, updated_at)
             VALUES ('m', 'm', 'c', 'Russia', 1, 'd', 1, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        PublicationService::new(SqlxPublicationRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let service = setup().await;

        let empty = CreatePublicationInput {
            title: "   ".to_string(),
            authors: String::new(),
            journal_conference: String::new(),
            publication_date: None,
            doi: String::new(),
            url: String::new(),
            citation_count: 0,
        };
        assert!(matches!(
            service.create(1, &empty, Some(1)).await,
            Err(ServiceError::Validation(_))
        ));

        let valid = CreatePublicationInput {
            title: "Scaling laws".to_string(),
            ..empty
        };
        let created = service.create(1, &valid, Some(1)).await.unwrap();
        assert_eq!(created.title, "Scaling laws");
        assert_eq!(service.for_module(1).await.unwrap().len(), 1);
    }
}
