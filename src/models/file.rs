//! Module file model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to an AI module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModuleFile {
    pub id: i64,
    pub module_id: i64,
    /// Original file name
    pub name: String,
    /// Path of the stored blob relative to the upload directory
    pub path: String,
    pub file_type: FileType,
    #[serde(default)]
    pub description: String,
    /// Size in bytes, computed on upload
    pub size: i64,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

impl AiModuleFile {
    /// Human-readable size, e.g. "1.5 MB"
    pub fn size_display(&self) -> String {
        format_file_size(self.size)
    }
}

/// File type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Documentation
    Doc,
    /// Model weights
    Model,
    /// Dataset
    Dataset,
    /// Source code
    Code,
    /// Anything else
    Other,
}

impl Default for FileType {
    fn default() -> Self {
        Self::Other
    }
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Doc => "doc",
            FileType::Model => "model",
            FileType::Dataset => "dataset",
            FileType::Code => "code",
            FileType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "doc" => Some(FileType::Doc),
            "model" => Some(FileType::Model),
            "dataset" => Some(FileType::Dataset),
            "code" => Some(FileType::Code),
            "other" => Some(FileType::Other),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn display(&self) -> &'static str {
        match self {
            FileType::Doc => "Documentation",
            FileType::Model => "Model File",
            FileType::Dataset => "Dataset",
            FileType::Code => "Code",
            FileType::Other => "Other",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format a byte count into a human-readable size
pub fn format_file_size(size_bytes: i64) -> String {
    if size_bytes <= 0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", size_bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_round_trip() {
        for t in [
            FileType::Doc,
            FileType::Model,
            FileType::Dataset,
            FileType::Code,
            FileType::Other,
        ] {
            assert_eq!(FileType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(FileType::from_str("weights"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
