use rewind_core::AuditLogId;
use rewind_domain::{AuditAction, AuditLogTarget, EntityType};
use serde::de::DeserializeOwned;

use crate::AuditTrailError;
use crate::audit_ports::{AuditLogEntry, decode_payload};

/// Runtime view of one audit entry handed to an action handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRequest {
    /// Entry being reverted.
    pub id: AuditLogId,
    /// Recorded subject.
    pub target: AuditLogTarget,
    /// Recorded action.
    pub action: AuditAction,
    /// Recorded backward payload.
    pub backward_data: Option<String>,
    /// Parent for compensating entries, not the entry's original parent.
    pub parent_id: Option<AuditLogId>,
}

impl RevertRequest {
    /// Projects a stored entry, filing compensation under `parent_id`.
    #[must_use]
    pub fn from_entry(entry: AuditLogEntry, parent_id: Option<AuditLogId>) -> Self {
        Self {
            id: entry.id,
            target: entry.target,
            action: entry.action,
            backward_data: entry.backward_data,
            parent_id,
        }
    }

    /// Returns the recorded subject id.
    pub fn entity_id(&self) -> Result<&str, AuditTrailError> {
        self.target.entity_id().ok_or_else(|| {
            AuditTrailError::revert_failed_without_cause(self, "audit log entry has no entity id")
        })
    }

    /// Returns the recorded concrete entity type.
    pub fn entity_type(&self) -> Result<EntityType, AuditTrailError> {
        self.target.entity_type().ok_or_else(|| {
            AuditTrailError::revert_failed_without_cause(self, "audit log entry has no entity type")
        })
    }

    /// Decodes the backward payload.
    pub fn decode_backward_data<T: DeserializeOwned>(&self) -> Result<T, AuditTrailError> {
        let payload = self.backward_data.as_deref().ok_or_else(|| {
            AuditTrailError::revert_failed_without_cause(self, "audit log entry has no backward data")
        })?;

        decode_payload(payload).map_err(|error| {
            AuditTrailError::revert_failed(self, "failed to deserialize backward data", error)
        })
    }
}
