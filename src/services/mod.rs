//! Business logic layer
//!
//! Services sit between the API handlers and the repositories: they own
//! validation, permissions, the moderation state machine, caching and
//! audit/notification side effects.

pub mod analytics;
pub mod audit;
pub mod auth;
pub mod email;
pub mod enrich;
pub mod error;
pub mod export;
pub mod file;
pub mod module;
pub mod password;
pub mod permissions;
pub mod publication;
pub mod slug;
pub mod tag;
pub mod user;

pub use analytics::AnalyticsService;
pub use audit::AuditService;
pub use auth::{AuthService, Claims, TokenPair};
pub use email::EmailService;
pub use enrich::EnrichedValue;
pub use error::{ServiceError, ServiceResult};
pub use file::FileService;
pub use module::{ExportRow, LikeOutcome, ModuleFull, ModuleService};
pub use publication::PublicationService;
pub use tag::{CategoryWithTags, TagService};
pub use user::{UserAccountStats, UserService};
