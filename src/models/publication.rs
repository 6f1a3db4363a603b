//! Publication model
//!
//! Scientific publications attached to AI modules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A publication associated with one AI module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    /// Free-text author list, comma separated
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub journal_conference: String,
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub citation_count: i64,
    pub added_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Publication {
    pub fn new(module_id: i64, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            module_id,
            title,
            authors: String::new(),
            journal_conference: String::new(),
            publication_date: None,
            doi: String::new(),
            url: String::new(),
            citation_count: 0,
            added_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Split the free-text author field into a trimmed list
    pub fn authors_list(&self) -> Vec<String> {
        self.authors
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Resolvable citation link: DOI preferred, plain URL otherwise
    pub fn citation_url(&self) -> Option<String> {
        if !self.doi.is_empty() {
            Some(format!("https://doi.org/{}", self.doi))
        } else if !self.url.is_empty() {
            Some(self.url.clone())
        } else {
            None
        }
    }

    /// A short human-readable citation line
    pub fn format_citation(&self) -> String {
        let mut parts = Vec::new();
        if !self.authors.is_empty() {
            parts.push(self.authors.clone());
        }
        parts.push(format!("\"{}\"", self.title));
        if !self.journal_conference.is_empty() {
            parts.push(self.journal_conference.clone());
        }
        if let Some(date) = self.publication_date {
            parts.push(date.format("%Y").to_string());
        }
        parts.join(", ")
    }
}

/// Input for creating a publication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePublicationInput {
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub journal_conference: String,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub citation_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authors_list_splits_and_trims() {
        let mut publication = Publication::new(1, "Scaling Laws".to_string());
        publication.authors = "Ivanov A., Petrova B. , ".to_string();
        assert_eq!(publication.authors_list(), vec!["Ivanov A.", "Petrova B."]);
    }

    #[test]
    fn test_citation_url_prefers_doi() {
        let mut publication = Publication::new(1, "Paper".to_string());
        assert_eq!(publication.citation_url(), None);

        publication.url = "https://example.org/paper".to_string();
        assert_eq!(
            publication.citation_url().as_deref(),
            Some("https://example.org/paper")
        );

        publication.doi = "10.1000/xyz".to_string();
        assert_eq!(
            publication.citation_url().as_deref(),
            Some("https://doi.org/10.1000/xyz")
        );
    }

    #[test]
    fn test_format_citation() {
        let mut publication = Publication::new(1, "Attention".to_string());
        publication.authors = "Vaswani et al.".to_string();
        publication.journal_conference = "NeurIPS".to_string();
        publication.publication_date = NaiveDate::from_ymd_opt(2017, 6, 12);
        assert_eq!(
            publication.format_citation(),
            "Vaswani et al., \"Attention\", NeurIPS, 2017"
        );
    }
}
