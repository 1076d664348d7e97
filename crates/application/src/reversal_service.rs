//! Two-level dispatch from a recorded audit entry to the handler that knows
//! how to invert it: entity type first, then action.

mod handlers;
mod registry;
mod request;
mod wiring;

pub use handlers::{
    ActionHandler, AssignmentReversal, BatchAssignmentReversal, BatchRemoveReversal,
    CreateReversal, RemoveReversal, UpdateReversal,
};
pub use registry::{EntityReversalHandler, ReversalRegistry};
pub use request::RevertRequest;
pub use wiring::{ReversalDependencies, standard_registry, standard_reversal_handlers};
