use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rewind_core::AppError;
use serde::{Deserialize, Serialize};

/// Entity kinds that appear as audit log subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Directory user account.
    User,
    /// Role that bundles privileges.
    Role,
    /// Single grantable privilege.
    Privilege,
    /// Label attachable to any other entity.
    Label,
    /// Synthetic key for markers grouping heterogeneous entities.
    #[serde(rename = "*")]
    All,
}

impl EntityType {
    /// Returns a stable storage value for the entity type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
            Self::Privilege => "privilege",
            Self::Label => "label",
            Self::All => "*",
        }
    }

    /// Returns every entity type, including the synthetic `All` key.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EntityType] = &[
            EntityType::User,
            EntityType::Role,
            EntityType::Privilege,
            EntityType::Label,
            EntityType::All,
        ];

        ALL
    }

    /// Returns every action logged against this entity type that must be
    /// revertible.
    #[must_use]
    pub fn revertible_actions(&self) -> &'static [AuditAction] {
        use AuditAction::*;

        match self {
            Self::User => &[
                Create,
                Update,
                Remove,
                Restore,
                BatchRemove,
                AssignRoles,
                UnassignRoles,
                AssignLabels,
                UnassignLabels,
            ],
            Self::Role => &[
                Create,
                Update,
                Remove,
                Restore,
                BatchRemove,
                AssignPrivileges,
                UnassignPrivileges,
                AssignLabels,
                UnassignLabels,
            ],
            Self::Privilege | Self::Label => &[Create, Update, Remove, Restore, BatchRemove],
            Self::All => &[BatchAssignLabels, BatchUnassignLabels],
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "role" => Ok(Self::Role),
            "privilege" => Ok(Self::Privilege),
            "label" => Ok(Self::Label),
            "*" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown entity type '{value}'"
            ))),
        }
    }
}

/// Stable audit action identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Entity was created.
    Create,
    /// Entity fields were changed.
    Update,
    /// Entity was removed; backward data holds its snapshot.
    Remove,
    /// Entity was restored from a snapshot.
    Restore,
    /// Marker grouping several removals of one entity type.
    BatchRemove,
    /// Roles were assigned to a user.
    AssignRoles,
    /// Roles were removed from a user.
    UnassignRoles,
    /// Privileges were assigned to a role.
    AssignPrivileges,
    /// Privileges were removed from a role.
    UnassignPrivileges,
    /// Labels were attached to an entity.
    AssignLabels,
    /// Labels were detached from an entity.
    UnassignLabels,
    /// Marker grouping label assignments over heterogeneous entities.
    BatchAssignLabels,
    /// Marker grouping label removals over heterogeneous entities.
    BatchUnassignLabels,
    /// Marker grouping several reverted entries.
    RevertBatch,
    /// Marker grouping the compensation of one `BatchRemove`.
    RevertBatchRemove,
    /// Marker grouping the compensation of one `BatchAssignLabels`.
    RevertBatchAssignLabels,
    /// Marker grouping the compensation of one `BatchUnassignLabels`.
    RevertBatchUnassignLabels,
}

impl AuditAction {
    /// Returns a stable storage value for the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Remove => "REMOVE",
            Self::Restore => "RESTORE",
            Self::BatchRemove => "BATCH_REMOVE",
            Self::AssignRoles => "ASSIGN_ROLES",
            Self::UnassignRoles => "UNASSIGN_ROLES",
            Self::AssignPrivileges => "ASSIGN_PRIVILEGES",
            Self::UnassignPrivileges => "UNASSIGN_PRIVILEGES",
            Self::AssignLabels => "ASSIGN_LABELS",
            Self::UnassignLabels => "UNASSIGN_LABELS",
            Self::BatchAssignLabels => "BATCH_ASSIGN_LABELS",
            Self::BatchUnassignLabels => "BATCH_UNASSIGN_LABELS",
            Self::RevertBatch => "REVERT_BATCH",
            Self::RevertBatchRemove => "REVERT_BATCH_REMOVE",
            Self::RevertBatchAssignLabels => "REVERT_BATCH_ASSIGN_LABELS",
            Self::RevertBatchUnassignLabels => "REVERT_BATCH_UNASSIGN_LABELS",
        }
    }

    /// Returns every known action.
    #[must_use]
    pub fn all() -> &'static [Self] {
        use AuditAction::*;

        const ALL: &[AuditAction] = &[
            Create,
            Update,
            Remove,
            Restore,
            BatchRemove,
            AssignRoles,
            UnassignRoles,
            AssignPrivileges,
            UnassignPrivileges,
            AssignLabels,
            UnassignLabels,
            BatchAssignLabels,
            BatchUnassignLabels,
            RevertBatch,
            RevertBatchRemove,
            RevertBatchAssignLabels,
            RevertBatchUnassignLabels,
        ];

        ALL
    }

    /// Returns the opposite relation action for assign/unassign pairs.
    #[must_use]
    pub fn inverse_assignment(&self) -> Option<Self> {
        match self {
            Self::AssignRoles => Some(Self::UnassignRoles),
            Self::UnassignRoles => Some(Self::AssignRoles),
            Self::AssignPrivileges => Some(Self::UnassignPrivileges),
            Self::UnassignPrivileges => Some(Self::AssignPrivileges),
            Self::AssignLabels => Some(Self::UnassignLabels),
            Self::UnassignLabels => Some(Self::AssignLabels),
            _ => None,
        }
    }

    /// Returns whether the action is only ever written on batch markers.
    #[must_use]
    pub fn is_batch_marker(&self) -> bool {
        matches!(
            self,
            Self::BatchRemove
                | Self::BatchAssignLabels
                | Self::BatchUnassignLabels
                | Self::RevertBatch
                | Self::RevertBatchRemove
                | Self::RevertBatchAssignLabels
                | Self::RevertBatchUnassignLabels
        )
    }
}

impl Display for AuditAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}

/// Subject of one audit log entry.
///
/// A target without an entity id is a batch marker: a grouping node with no
/// single subject. A target without an entity type is not bound to a concrete
/// domain type and resolves to [`EntityType::All`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogTarget {
    entity_type: Option<EntityType>,
    entity_id: Option<String>,
    display_name: Option<String>,
}

impl AuditLogTarget {
    /// Creates a target pointing at one concrete entity.
    #[must_use]
    pub fn entity(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
            display_name: None,
        }
    }

    /// Creates a batch marker target, optionally bound to one entity type.
    #[must_use]
    pub fn batch(entity_type: Option<EntityType>) -> Self {
        Self {
            entity_type,
            entity_id: None,
            display_name: None,
        }
    }

    /// Rebuilds a target from stored parts.
    #[must_use]
    pub fn from_parts(
        entity_type: Option<EntityType>,
        entity_id: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            display_name,
        }
    }

    /// Attaches a human-friendly name used by audit views.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Returns the recorded entity type, if any.
    #[must_use]
    pub fn entity_type(&self) -> Option<EntityType> {
        self.entity_type
    }

    /// Returns the subject identifier, if any.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns whether this target marks a grouping entry.
    #[must_use]
    pub fn is_batch_marker(&self) -> bool {
        self.entity_id.is_none()
    }

    /// Returns the key used to look up a reversal handler.
    #[must_use]
    pub fn registry_key(&self) -> EntityType {
        self.entity_type.unwrap_or(EntityType::All)
    }
}
