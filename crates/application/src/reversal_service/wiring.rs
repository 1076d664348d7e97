use std::sync::Arc;

use rewind_domain::{AuditAction, AuditedEntity, EntityType, Label, Privilege, Role, User};

use crate::AuditTrailError;
use crate::audit_ports::AuditLogStore;
use crate::directory_ports::{AssignmentUseCases, EntityUseCases};

use super::{
    AssignmentReversal, BatchAssignmentReversal, BatchRemoveReversal, CreateReversal,
    EntityReversalHandler, RemoveReversal, ReversalRegistry, UpdateReversal,
};

/// Collaborators needed by the standard reversal handlers.
#[derive(Clone)]
pub struct ReversalDependencies {
    /// Audit store used to enumerate batch children.
    pub audit_log_store: Arc<dyn AuditLogStore>,
    /// User lifecycle use cases.
    pub users: Arc<dyn EntityUseCases<User>>,
    /// Role lifecycle use cases.
    pub roles: Arc<dyn EntityUseCases<Role>>,
    /// Privilege lifecycle use cases.
    pub privileges: Arc<dyn EntityUseCases<Privilege>>,
    /// Label lifecycle use cases.
    pub labels: Arc<dyn EntityUseCases<Label>>,
    /// User to role relation.
    pub user_roles: Arc<dyn AssignmentUseCases>,
    /// Role to privilege relation.
    pub role_privileges: Arc<dyn AssignmentUseCases>,
    /// Any entity to label relation.
    pub entity_labels: Arc<dyn AssignmentUseCases>,
}

/// Builds one dispatch table per entity type plus the all-entities table.
pub fn standard_reversal_handlers(
    dependencies: &ReversalDependencies,
) -> Result<Vec<EntityReversalHandler>, AuditTrailError> {
    let label_assignment = Arc::new(AssignmentReversal::new(
        dependencies.entity_labels.clone(),
    ));
    let label_actions = EntityReversalHandler::new("label-assignment-reversal", EntityType::Label)
        .with_action(AuditAction::AssignLabels, label_assignment.clone())?
        .with_action(AuditAction::UnassignLabels, label_assignment)?;

    let user_roles = Arc::new(AssignmentReversal::new(dependencies.user_roles.clone()));
    let users = lifecycle_handler(
        "user-reversal",
        dependencies.audit_log_store.clone(),
        dependencies.users.clone(),
    )?
    .with_action(AuditAction::AssignRoles, user_roles.clone())?
    .with_action(AuditAction::UnassignRoles, user_roles)?
    .merge(&label_actions)?;

    let role_privileges = Arc::new(AssignmentReversal::new(
        dependencies.role_privileges.clone(),
    ));
    let roles = lifecycle_handler(
        "role-reversal",
        dependencies.audit_log_store.clone(),
        dependencies.roles.clone(),
    )?
    .with_action(AuditAction::AssignPrivileges, role_privileges.clone())?
    .with_action(AuditAction::UnassignPrivileges, role_privileges)?
    .merge(&label_actions)?;

    let privileges = lifecycle_handler(
        "privilege-reversal",
        dependencies.audit_log_store.clone(),
        dependencies.privileges.clone(),
    )?;

    let labels = lifecycle_handler(
        "label-reversal",
        dependencies.audit_log_store.clone(),
        dependencies.labels.clone(),
    )?;

    let batch_labels = Arc::new(BatchAssignmentReversal::new(
        dependencies.audit_log_store.clone(),
        dependencies.entity_labels.clone(),
    ));
    let all_entities = EntityReversalHandler::new("all-entities-reversal", EntityType::All)
        .with_action(AuditAction::BatchAssignLabels, batch_labels.clone())?
        .with_action(AuditAction::BatchUnassignLabels, batch_labels)?;

    Ok(vec![users, roles, privileges, labels, all_entities])
}

/// Builds the registry for the standard handler set.
pub fn standard_registry(
    dependencies: &ReversalDependencies,
) -> Result<ReversalRegistry, AuditTrailError> {
    ReversalRegistry::new(standard_reversal_handlers(dependencies)?)
}

fn lifecycle_handler<E: AuditedEntity>(
    name: &str,
    audit_log_store: Arc<dyn AuditLogStore>,
    entities: Arc<dyn EntityUseCases<E>>,
) -> Result<EntityReversalHandler, AuditTrailError> {
    let create = Arc::new(CreateReversal::new(entities.clone()));

    EntityReversalHandler::new(name, E::ENTITY_TYPE)
        .with_action(AuditAction::Create, create.clone())?
        .with_action(AuditAction::Restore, create)?
        .with_action(
            AuditAction::Update,
            Arc::new(UpdateReversal::new(entities.clone())),
        )?
        .with_action(
            AuditAction::Remove,
            Arc::new(RemoveReversal::new(entities.clone())),
        )?
        .with_action(
            AuditAction::BatchRemove,
            Arc::new(BatchRemoveReversal::new(audit_log_store, entities)),
        )
}
