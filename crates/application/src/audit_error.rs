use std::error::Error as StdError;

use rewind_core::{AppError, AuditLogId};
use rewind_domain::{AuditAction, AuditLogTarget, EntityType};
use thiserror::Error;

use crate::reversal_service::RevertRequest;

/// Boxed cause attached to audit trail failures.
pub type BoxedCause = Box<dyn StdError + Send + Sync>;

/// Failures raised while writing or reverting audit trails.
#[derive(Debug, Error)]
pub enum AuditTrailError {
    /// No reversal handler is registered for the entity type.
    #[error("no reversal handler registered for entity type '{0}'")]
    UnknownEntityType(EntityType),

    /// The entity reversal handler has no handler for the action.
    #[error("reversal of '{action}' is not supported for entity type '{entity_type}'")]
    UnsupportedAction {
        /// Entity type whose handler was consulted.
        entity_type: EntityType,
        /// Action that has no handler.
        action: AuditAction,
    },

    /// Two reversal handlers claim the same entity type.
    #[error(
        "entity type '{entity_type}' has two reversal handlers: '{existing}' and '{duplicate}'"
    )]
    DuplicateHandler {
        /// Contested entity type.
        entity_type: EntityType,
        /// Name of the handler registered first.
        existing: String,
        /// Name of the rejected handler.
        duplicate: String,
    },

    /// One entity reversal handler registers the same action twice.
    #[error("reversal handler '{handler}' registers action '{action}' twice")]
    DuplicateAction {
        /// Name of the entity reversal handler.
        handler: String,
        /// Action registered twice.
        action: AuditAction,
    },

    /// The entry could not be reverted.
    #[error("failed to revert audit log entry '{}': {message}", .request.id)]
    RevertFailed {
        /// Request being processed when the failure occurred.
        request: Box<RevertRequest>,
        /// Human-readable failure description.
        message: String,
        /// Underlying failure, if any.
        #[source]
        cause: Option<BoxedCause>,
    },

    /// An audit entry could not be written.
    #[error("failed to create audit log entry for {target:?}: {cause}")]
    CreateAuditLogEntryFailed {
        /// Subject of the entry that was being written.
        target: AuditLogTarget,
        /// Serialization or store failure.
        #[source]
        cause: BoxedCause,
    },

    /// A referenced audit entry does not exist.
    #[error("audit log entry '{0}' does not exist")]
    AuditEntryNotFound(AuditLogId),

    /// A store or domain collaborator failed.
    #[error(transparent)]
    Collaborator(#[from] AppError),
}

impl AuditTrailError {
    /// Creates a [`AuditTrailError::RevertFailed`] error with a cause.
    pub fn revert_failed(
        request: &RevertRequest,
        message: impl Into<String>,
        cause: impl Into<BoxedCause>,
    ) -> Self {
        Self::RevertFailed {
            request: Box::new(request.clone()),
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Creates a [`AuditTrailError::RevertFailed`] error without a cause.
    pub fn revert_failed_without_cause(request: &RevertRequest, message: impl Into<String>) -> Self {
        Self::RevertFailed {
            request: Box::new(request.clone()),
            message: message.into(),
            cause: None,
        }
    }

    /// Returns whether the error signals a wiring defect rather than a
    /// runtime condition.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEntityType(_)
                | Self::UnsupportedAction { .. }
                | Self::DuplicateHandler { .. }
                | Self::DuplicateAction { .. }
        )
    }
}

impl From<AuditTrailError> for AppError {
    fn from(error: AuditTrailError) -> Self {
        match error {
            AuditTrailError::Collaborator(error) => error,
            AuditTrailError::AuditEntryNotFound(_) => AppError::NotFound(error.to_string()),
            AuditTrailError::RevertFailed { .. } => AppError::Conflict(error.to_string()),
            AuditTrailError::UnknownEntityType(_)
            | AuditTrailError::UnsupportedAction { .. }
            | AuditTrailError::DuplicateHandler { .. }
            | AuditTrailError::DuplicateAction { .. }
            | AuditTrailError::CreateAuditLogEntryFailed { .. } => {
                AppError::Internal(error.to_string())
            }
        }
    }
}
