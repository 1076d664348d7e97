use async_trait::async_trait;
use rewind_core::AppResult;
use rewind_domain::EntityType;

/// Entity on the owning side of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentSubject {
    /// Subject entity type.
    pub entity_type: EntityType,
    /// Subject identifier.
    pub entity_id: String,
}

impl AssignmentSubject {
    /// Creates a subject reference.
    #[must_use]
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
        }
    }
}

/// Result of an assign or unassign call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// The relation set changed.
    Changed {
        /// Related ids the call actually added or removed.
        related_ids: Vec<String>,
    },
    /// The relation set was left untouched.
    Skipped {
        /// Why the call was a no-op.
        reason: String,
    },
}

/// Domain use cases for one relation kind (user roles, role privileges,
/// entity labels).
///
/// Both operations must be safe to call again with the original operand set.
#[async_trait]
pub trait AssignmentUseCases: Send + Sync {
    /// Adds `related_ids` to the subject.
    async fn assign(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) -> AppResult<AssignmentOutcome>;

    /// Removes `related_ids` from the subject.
    async fn unassign(
        &self,
        subject: &AssignmentSubject,
        related_ids: &[String],
    ) -> AppResult<AssignmentOutcome>;
}
