mod assignments;
mod entities;

pub use assignments::{AssignmentOutcome, AssignmentSubject, AssignmentUseCases};
pub use entities::{EntityUseCases, RemoveOutcome, RestoreOutcome};
