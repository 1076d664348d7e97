//! Domain types shared by the audit trail and its reversal handlers.

#![forbid(unsafe_code)]

mod audit;
mod directory;
mod patch;

pub use audit::{AuditAction, AuditLogTarget, EntityType};
pub use directory::{AuditedEntity, Label, Privilege, Role, User};
pub use patch::{apply_merge_patch, reverse_merge_patch};
