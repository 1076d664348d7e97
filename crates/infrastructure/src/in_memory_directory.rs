use std::sync::Arc;

use rewind_application::{
    AuditTrailError, AuditTrailFactory, AuditTreeService, ReversalDependencies,
    RevertActionsService, standard_registry,
};
use rewind_domain::{Label, Privilege, Role, User};

use crate::{InMemoryAssignmentStore, InMemoryAuditLogStore, InMemoryEntityStore, RelationKind};

/// Complete in-memory directory sharing one audit log store.
pub struct InMemoryDirectory {
    /// Audit log shared by every store.
    pub audit_log_store: Arc<InMemoryAuditLogStore>,
    /// User accounts.
    pub users: Arc<InMemoryEntityStore<User>>,
    /// Roles.
    pub roles: Arc<InMemoryEntityStore<Role>>,
    /// Privileges.
    pub privileges: Arc<InMemoryEntityStore<Privilege>>,
    /// Labels.
    pub labels: Arc<InMemoryEntityStore<Label>>,
    /// User to role relation.
    pub user_roles: Arc<InMemoryAssignmentStore>,
    /// Role to privilege relation.
    pub role_privileges: Arc<InMemoryAssignmentStore>,
    /// Entity to label relation.
    pub entity_labels: Arc<InMemoryAssignmentStore>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        let audit_log_store = Arc::new(InMemoryAuditLogStore::new());
        let audit_trail = AuditTrailFactory::new(audit_log_store.clone());

        Self {
            users: Arc::new(InMemoryEntityStore::new(audit_trail.clone())),
            roles: Arc::new(InMemoryEntityStore::new(audit_trail.clone())),
            privileges: Arc::new(InMemoryEntityStore::new(audit_trail.clone())),
            labels: Arc::new(InMemoryEntityStore::new(audit_trail.clone())),
            user_roles: Arc::new(InMemoryAssignmentStore::new(
                RelationKind::UserRoles,
                audit_trail.clone(),
            )),
            role_privileges: Arc::new(InMemoryAssignmentStore::new(
                RelationKind::RolePrivileges,
                audit_trail.clone(),
            )),
            entity_labels: Arc::new(InMemoryAssignmentStore::new(
                RelationKind::EntityLabels,
                audit_trail,
            )),
            audit_log_store,
        }
    }

    /// Returns the collaborators of the standard reversal handlers.
    #[must_use]
    pub fn reversal_dependencies(&self) -> ReversalDependencies {
        ReversalDependencies {
            audit_log_store: self.audit_log_store.clone(),
            users: self.users.clone(),
            roles: self.roles.clone(),
            privileges: self.privileges.clone(),
            labels: self.labels.clone(),
            user_roles: self.user_roles.clone(),
            role_privileges: self.role_privileges.clone(),
            entity_labels: self.entity_labels.clone(),
        }
    }

    /// Builds the revert service over this directory.
    pub fn revert_actions_service(&self) -> Result<RevertActionsService, AuditTrailError> {
        let registry = standard_registry(&self.reversal_dependencies())?;

        Ok(RevertActionsService::new(
            self.audit_log_store.clone(),
            Arc::new(registry),
            AuditTrailFactory::new(self.audit_log_store.clone()),
        ))
    }

    /// Builds the tree service over this directory's audit log.
    #[must_use]
    pub fn audit_tree_service(&self) -> AuditTreeService {
        AuditTreeService::new(self.audit_log_store.clone())
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}
