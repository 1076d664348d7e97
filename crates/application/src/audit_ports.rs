mod entries;
mod payload;
mod store;

pub use entries::{AuditLogEntry, NewAuditLogEntry};
pub use payload::{decode_payload, encode_payload};
pub use store::AuditLogStore;
