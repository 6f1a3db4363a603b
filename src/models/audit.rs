//! Audit log model
//!
//! Append-only record of who performed which action on which entity. The
//! subject is a tagged reference (`EntityRef`) over a closed set of entity
//! kinds, resolved through an explicit per-kind table lookup instead of any
//! reflection-based scheme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of entity kinds an audit entry may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Module,
    ModuleFile,
    Tag,
    TagCategory,
    Publication,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Module => "module",
            EntityKind::ModuleFile => "module_file",
            EntityKind::Tag => "tag",
            EntityKind::TagCategory => "tag_category",
            EntityKind::Publication => "publication",
            EntityKind::User => "user",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "module" => Some(EntityKind::Module),
            "module_file" => Some(EntityKind::ModuleFile),
            "tag" => Some(EntityKind::Tag),
            "tag_category" => Some(EntityKind::TagCategory),
            "publication" => Some(EntityKind::Publication),
            "user" => Some(EntityKind::User),
            _ => None,
        }
    }

    /// Database table holding entities of this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Module => "modules",
            EntityKind::ModuleFile => "module_files",
            EntityKind::Tag => "tags",
            EntityKind::TagCategory => "tag_categories",
            EntityKind::Publication => "publications",
            EntityKind::User => "users",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tagged reference to an auditable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    pub fn module(id: i64) -> Self {
        Self {
            kind: EntityKind::Module,
            id,
        }
    }

    pub fn user(id: i64) -> Self {
        Self {
            kind: EntityKind::User,
            id,
        }
    }

    pub fn tag(id: i64) -> Self {
        Self {
            kind: EntityKind::Tag,
            id,
        }
    }

    pub fn publication(id: i64) -> Self {
        Self {
            kind: EntityKind::Publication,
            id,
        }
    }

    pub fn module_file(id: i64) -> Self {
        Self {
            kind: EntityKind::ModuleFile,
            id,
        }
    }
}

/// Audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Approve,
    Reject,
    Block,
    Unblock,
    Like,
    Unlike,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Approve => "approve",
            AuditAction::Reject => "reject",
            AuditAction::Block => "block",
            AuditAction::Unblock => "unblock",
            AuditAction::Like => "like",
            AuditAction::Unlike => "unlike",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(AuditAction::Create),
            "update" => Some(AuditAction::Update),
            "delete" => Some(AuditAction::Delete),
            "approve" => Some(AuditAction::Approve),
            "reject" => Some(AuditAction::Reject),
            "block" => Some(AuditAction::Block),
            "unblock" => Some(AuditAction::Unblock),
            "like" => Some(AuditAction::Like),
            "unlike" => Some(AuditAction::Unlike),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub entity: EntityRef,
    pub action: AuditAction,
    pub performed_by: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub comment: String,
    /// Field values before the action
    pub old_values: serde_json::Value,
    /// Field values after the action
    pub new_values: serde_json::Value,
    pub ip_address: Option<String>,
}

/// Input for appending an audit entry
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub entity: EntityRef,
    pub action: AuditAction,
    pub performed_by: Option<i64>,
    pub comment: String,
    pub old_values: serde_json::Value,
    pub new_values: serde_json::Value,
    pub ip_address: Option<String>,
}

impl NewAuditEntry {
    pub fn new(entity: EntityRef, action: AuditAction) -> Self {
        Self {
            entity,
            action,
            performed_by: None,
            comment: String::new(),
            old_values: serde_json::json!({}),
            new_values: serde_json::json!({}),
            ip_address: None,
        }
    }

    pub fn by(mut self, user_id: i64) -> Self {
        self.performed_by = Some(user_id);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_values(mut self, old: serde_json::Value, new: serde_json::Value) -> Self {
        self.old_values = old;
        self.new_values = new;
        self
    }

    pub fn from_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trip() {
        for kind in [
            EntityKind::Module,
            EntityKind::ModuleFile,
            EntityKind::Tag,
            EntityKind::TagCategory,
            EntityKind::Publication,
            EntityKind::User,
        ] {
            assert_eq!(EntityKind::from_str(kind.as_str()), Some(kind));
            assert!(!kind.table_name().is_empty());
        }
        assert_eq!(EntityKind::from_str("session"), None);
    }

    #[test]
    fn test_audit_action_round_trip() {
        for action in [
            AuditAction::Create,
            AuditAction::Update,
            AuditAction::Delete,
            AuditAction::Approve,
            AuditAction::Reject,
            AuditAction::Block,
            AuditAction::Unblock,
            AuditAction::Like,
            AuditAction::Unlike,
        ] {
            assert_eq!(AuditAction::from_str(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_new_entry_builder() {
        let entry = NewAuditEntry::new(EntityRef::module(7), AuditAction::Reject)
            .by(3)
            .with_comment("missing license")
            .from_ip(Some("10.0.0.1".to_string()));

        assert_eq!(entry.entity, EntityRef::module(7));
        assert_eq!(entry.performed_by, Some(3));
        assert_eq!(entry.comment, "missing license");
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
    }
}
