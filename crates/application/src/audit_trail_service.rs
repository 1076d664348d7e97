//! Session facade that threads one `(timestamp, parent)` context through the
//! audit entries written by a logical operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rewind_core::AuditLogId;
use rewind_domain::{AuditAction, AuditLogTarget, EntityType};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::audit_ports::{AuditLogStore, NewAuditLogEntry, encode_payload};
use crate::AuditTrailError;

/// Typed "no payload" argument for [`AuditTrailBuilder::create_log`].
pub const NO_PAYLOAD: Option<&'static Value> = None;

/// Creates one [`AuditTrailBuilder`] per logical top-level operation.
#[derive(Clone)]
pub struct AuditTrailFactory {
    audit_log_store: Arc<dyn AuditLogStore>,
}

impl AuditTrailFactory {
    /// Creates a factory writing to the provided store.
    #[must_use]
    pub fn new(audit_log_store: Arc<dyn AuditLogStore>) -> Self {
        Self { audit_log_store }
    }

    /// Starts a session stamped with the current time.
    #[must_use]
    pub fn begin(&self, parent_id: Option<AuditLogId>) -> AuditTrailBuilder {
        self.begin_at(Utc::now(), parent_id)
    }

    /// Starts a session stamped with `timestamp`.
    #[must_use]
    pub fn begin_at(
        &self,
        timestamp: DateTime<Utc>,
        parent_id: Option<AuditLogId>,
    ) -> AuditTrailBuilder {
        AuditTrailBuilder {
            audit_log_store: self.audit_log_store.clone(),
            timestamp,
            parent_id,
        }
    }
}

/// Short-lived writer for the entries of one logical operation.
///
/// Every entry carries the session timestamp and the current parent. Not meant
/// to outlive the operation that created it.
pub struct AuditTrailBuilder {
    audit_log_store: Arc<dyn AuditLogStore>,
    timestamp: DateTime<Utc>,
    parent_id: Option<AuditLogId>,
}

impl AuditTrailBuilder {
    /// Returns the timestamp shared by every entry of this session.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the parent new entries are filed under.
    #[must_use]
    pub fn parent_id(&self) -> Option<&AuditLogId> {
        self.parent_id.as_ref()
    }

    /// Rebinds the parent for subsequently created entries.
    pub fn update_parent_id(&mut self, parent_id: Option<AuditLogId>) {
        self.parent_id = parent_id;
    }

    /// Writes one entry under the current parent and returns its id.
    pub async fn create_log<B, F>(
        &self,
        target: AuditLogTarget,
        action: AuditAction,
        backward_data: Option<&B>,
        forward_data: Option<&F>,
    ) -> Result<AuditLogId, AuditTrailError>
    where
        B: Serialize + Sync + ?Sized,
        F: Serialize + Sync + ?Sized,
    {
        self.create_log_at(self.timestamp, target, action, backward_data, forward_data)
            .await
    }

    /// Writes one entry stamped with `timestamp` instead of the session time,
    /// for changes that report when they took effect.
    pub async fn create_log_at<B, F>(
        &self,
        timestamp: DateTime<Utc>,
        target: AuditLogTarget,
        action: AuditAction,
        backward_data: Option<&B>,
        forward_data: Option<&F>,
    ) -> Result<AuditLogId, AuditTrailError>
    where
        B: Serialize + Sync + ?Sized,
        F: Serialize + Sync + ?Sized,
    {
        let backward_data = match backward_data.map(encode_payload).transpose() {
            Ok(payload) => payload,
            Err(error) => return Err(write_failed(target, error)),
        };
        let forward_data = match forward_data.map(encode_payload).transpose() {
            Ok(payload) => payload,
            Err(error) => return Err(write_failed(target, error)),
        };

        self.submit(NewAuditLogEntry {
            target,
            action,
            backward_data,
            forward_data,
            timestamp,
            parent_id: self.parent_id.clone(),
        })
        .await
    }

    /// Writes a batch marker entry under the current parent.
    pub async fn create_batch_log(
        &self,
        entity_type: Option<EntityType>,
        action: AuditAction,
    ) -> Result<AuditLogId, AuditTrailError> {
        self.submit(NewAuditLogEntry {
            target: AuditLogTarget::batch(entity_type),
            action,
            backward_data: None,
            forward_data: None,
            timestamp: self.timestamp,
            parent_id: self.parent_id.clone(),
        })
        .await
    }

    /// Applies the grouping rule for operations over `subject_count` subjects.
    ///
    /// More than one subject opens a batch marker and rebinds the parent to
    /// it; otherwise the parent is left untouched and `None` is returned.
    pub async fn group_subjects(
        &mut self,
        subject_count: usize,
        entity_type: Option<EntityType>,
        action: AuditAction,
    ) -> Result<Option<AuditLogId>, AuditTrailError> {
        if subject_count <= 1 {
            return Ok(None);
        }

        let marker_id = self.create_batch_log(entity_type, action).await?;
        self.update_parent_id(Some(marker_id.clone()));
        Ok(Some(marker_id))
    }

    async fn submit(&self, entry: NewAuditLogEntry) -> Result<AuditLogId, AuditTrailError> {
        let target = entry.target.clone();
        let action = entry.action;

        let id = self
            .audit_log_store
            .create(entry)
            .await
            .map_err(|error| write_failed(target, error))?;

        debug!(
            audit_log_id = %id,
            action = %action,
            parent_id = ?self.parent_id.as_ref().map(AuditLogId::as_str),
            "audit log entry created"
        );

        Ok(id)
    }
}

fn write_failed(
    target: AuditLogTarget,
    cause: impl Into<crate::audit_error::BoxedCause>,
) -> AuditTrailError {
    AuditTrailError::CreateAuditLogEntryFailed {
        target,
        cause: cause.into(),
    }
}
