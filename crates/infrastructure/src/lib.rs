//! Infrastructure adapters for audit trail ports.

#![forbid(unsafe_code)]

mod in_memory_assignment_store;
mod in_memory_audit_log_store;
mod in_memory_directory;
mod in_memory_entity_store;
mod postgres_audit_log_store;

#[cfg(test)]
mod reversal_scenarios;

pub use in_memory_assignment_store::{InMemoryAssignmentStore, RelationKind};
pub use in_memory_audit_log_store::InMemoryAuditLogStore;
pub use in_memory_directory::InMemoryDirectory;
pub use in_memory_entity_store::InMemoryEntityStore;
pub use postgres_audit_log_store::PostgresAuditLogStore;
