use async_trait::async_trait;

use crate::{AuditTrailBuilder, AuditTrailError};

use super::RevertRequest;

mod assignment;
mod batch;
mod lifecycle;

pub use assignment::AssignmentReversal;
pub use batch::{BatchAssignmentReversal, BatchRemoveReversal};
pub use lifecycle::{CreateReversal, RemoveReversal, UpdateReversal};

/// Inverts exactly one `(entity type, action)` pair.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Performs the inverse domain operation for `request`, filing any
    /// compensating entries through `trail`.
    async fn revert(
        &self,
        request: &RevertRequest,
        trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError>;
}
