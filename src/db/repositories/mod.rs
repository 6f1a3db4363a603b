//! Repository layer
//!
//! One repository per aggregate, each a trait plus a sqlx implementation.

pub mod analytics;
pub mod audit;
pub mod country;
pub mod file;
pub mod module;
pub mod publication;
pub mod tag;
pub mod token;
pub mod user;

pub use analytics::{AnalyticsRepository, SqlxAnalyticsRepository};
pub use audit::{AuditRepository, SqlxAuditRepository};
pub use country::{CountryRepository, SqlxCountryRepository};
pub use file::{FileRepository, SqlxFileRepository};
pub use module::{
    ModuleFilter, ModuleOrdering, ModuleRepository, ModuleVisibility, SqlxModuleRepository,
};
pub use publication::{PublicationFilter, PublicationRepository, SqlxPublicationRepository};
pub use tag::{SqlxTagRepository, TagFilter, TagRepository};
pub use token::{RevokedTokenRepository, SqlxRevokedTokenRepository};
pub use user::{SqlxUserRepository, UserFilter, UserRepository};
