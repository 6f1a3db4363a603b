//! Country reference directory

use serde::{Deserialize, Serialize};

/// A country in the reference directory.
///
/// Modules store the country as a plain string; this table backs dropdowns,
/// analytics grouping and the BRICS membership flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    /// Full name, unique
    pub name: String,
    /// ISO 3166-1 alpha-3 code, unique
    pub code: String,
    pub is_brics_member: bool,
    #[serde(default)]
    pub flag_emoji: String,
}

impl Country {
    pub fn new(name: String, code: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            code,
            is_brics_member: true,
            flag_emoji: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_new() {
        let country = Country::new("Brazil".to_string(), "BRA".to_string());
        assert_eq!(country.id, 0);
        assert!(country.is_brics_member);
    }
}
