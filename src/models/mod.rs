//! Domain models for the AI module registry

pub mod audit;
pub mod country;
pub mod file;
pub mod module;
pub mod publication;
pub mod tag;
pub mod user;

pub use audit::{AuditAction, AuditEntry, EntityKind, EntityRef, NewAuditEntry};
pub use country::Country;
pub use file::{format_file_size, AiModuleFile, FileType};
pub use module::{
    AiModule, AiModuleDetail, AiModuleLike, CreateModuleInput, DetailInput, ListParams,
    ModuleStatus, ModuleWithMeta, PagedResult, UpdateModuleInput,
};
pub use publication::{CreatePublicationInput, Publication};
pub use tag::{
    ModuleTagAssignment, Tag, TagCategory, TagWithCategory, TagWithUsage, DEFAULT_TAG_COLOR,
};
pub use user::{CreateUserInput, UpdateProfileInput, User, UserRole};
