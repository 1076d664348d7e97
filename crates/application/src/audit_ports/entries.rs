use chrono::{DateTime, Utc};
use rewind_core::AuditLogId;
use rewind_domain::{AuditAction, AuditLogTarget};

/// Audit log entry as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Store-assigned identifier.
    pub id: AuditLogId,
    /// Subject of the entry; batch markers carry no entity id.
    pub target: AuditLogTarget,
    /// Recorded action.
    pub action: AuditAction,
    /// Text payload able to invert the action.
    pub backward_data: Option<String>,
    /// Text payload describing the applied change.
    pub forward_data: Option<String>,
    /// Timestamp shared by every entry of one logical operation.
    pub timestamp: DateTime<Utc>,
    /// Grouping parent, created before this entry.
    pub parent_id: Option<AuditLogId>,
}

/// Audit log entry submitted to the store before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditLogEntry {
    /// Subject of the entry.
    pub target: AuditLogTarget,
    /// Recorded action.
    pub action: AuditAction,
    /// Serialized backward payload.
    pub backward_data: Option<String>,
    /// Serialized forward payload.
    pub forward_data: Option<String>,
    /// Operation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Grouping parent.
    pub parent_id: Option<AuditLogId>,
}

impl NewAuditLogEntry {
    /// Attaches the store-assigned id.
    #[must_use]
    pub fn into_entry(self, id: AuditLogId) -> AuditLogEntry {
        AuditLogEntry {
            id,
            target: self.target,
            action: self.action,
            backward_data: self.backward_data,
            forward_data: self.forward_data,
            timestamp: self.timestamp,
            parent_id: self.parent_id,
        }
    }
}
