//! Application services and ports for recording and reverting audit trails.

#![forbid(unsafe_code)]

mod audit_error;
mod audit_ports;
mod audit_trail_service;
mod audit_tree_service;
mod directory_ports;
mod reversal_service;
mod revert_actions_service;

#[cfg(test)]
mod test_support;

pub use audit_error::{AuditTrailError, BoxedCause};
pub use audit_ports::{
    AuditLogEntry, AuditLogStore, NewAuditLogEntry, decode_payload, encode_payload,
};
pub use audit_trail_service::{AuditTrailBuilder, AuditTrailFactory, NO_PAYLOAD};
pub use audit_tree_service::{AuditTree, AuditTreeService};
pub use directory_ports::{
    AssignmentOutcome, AssignmentSubject, AssignmentUseCases, EntityUseCases, RemoveOutcome,
    RestoreOutcome,
};
pub use reversal_service::{
    ActionHandler, AssignmentReversal, BatchAssignmentReversal, BatchRemoveReversal,
    CreateReversal, EntityReversalHandler, RemoveReversal, ReversalDependencies,
    ReversalRegistry, RevertRequest, UpdateReversal, standard_registry,
    standard_reversal_handlers,
};
pub use revert_actions_service::RevertActionsService;
