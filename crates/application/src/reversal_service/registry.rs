use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use rewind_domain::{AuditAction, AuditLogTarget, EntityType};
use tracing::debug;

use crate::{AuditTrailBuilder, AuditTrailError};

use super::{ActionHandler, RevertRequest};

/// Action dispatch table for one entity type.
pub struct EntityReversalHandler {
    name: String,
    entity_type: EntityType,
    action_handlers: BTreeMap<AuditAction, Arc<dyn ActionHandler>>,
}

impl EntityReversalHandler {
    /// Creates an empty dispatch table.
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            action_handlers: BTreeMap::new(),
        }
    }

    /// Registers the handler for one action.
    pub fn with_action(
        mut self,
        action: AuditAction,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<Self, AuditTrailError> {
        if self.action_handlers.contains_key(&action) {
            return Err(AuditTrailError::DuplicateAction {
                handler: self.name,
                action,
            });
        }

        self.action_handlers.insert(action, handler);
        Ok(self)
    }

    /// Imports every action of `other`, for actions recorded against this
    /// entity type but owned by an associated one.
    pub fn merge(mut self, other: &EntityReversalHandler) -> Result<Self, AuditTrailError> {
        for (action, handler) in &other.action_handlers {
            self = self.with_action(*action, handler.clone())?;
        }

        Ok(self)
    }

    /// Returns the implementation name reported in wiring errors.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the entity type this table is keyed by.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns whether the action has a handler.
    #[must_use]
    pub fn supports(&self, action: AuditAction) -> bool {
        self.action_handlers.contains_key(&action)
    }

    /// Returns every registered action in stable order.
    pub fn actions(&self) -> impl Iterator<Item = AuditAction> + '_ {
        self.action_handlers.keys().copied()
    }

    /// Dispatches the request to the handler registered for its action.
    pub async fn revert(
        &self,
        request: &RevertRequest,
        trail: &mut AuditTrailBuilder,
    ) -> Result<(), AuditTrailError> {
        let handler = self.action_handlers.get(&request.action).ok_or(
            AuditTrailError::UnsupportedAction {
                entity_type: self.entity_type,
                action: request.action,
            },
        )?;

        debug!(
            handler = %self.name,
            audit_log_id = %request.id,
            action = %request.action,
            "dispatching revert"
        );
        handler.revert(request, trail).await
    }
}

impl Debug for EntityReversalHandler {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("EntityReversalHandler")
            .field("name", &self.name)
            .field("entity_type", &self.entity_type)
            .field("actions", &self.action_handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable `entity type -> dispatch table` map built once at startup.
#[derive(Debug)]
pub struct ReversalRegistry {
    handlers: HashMap<EntityType, EntityReversalHandler>,
}

impl ReversalRegistry {
    /// Builds the registry, rejecting two handlers for one entity type.
    pub fn new(
        handlers: impl IntoIterator<Item = EntityReversalHandler>,
    ) -> Result<Self, AuditTrailError> {
        let mut by_type: HashMap<EntityType, EntityReversalHandler> = HashMap::new();

        for handler in handlers {
            if let Some(existing) = by_type.get(&handler.entity_type()) {
                return Err(AuditTrailError::DuplicateHandler {
                    entity_type: handler.entity_type(),
                    existing: existing.name().to_owned(),
                    duplicate: handler.name().to_owned(),
                });
            }
            by_type.insert(handler.entity_type(), handler);
        }

        Ok(Self { handlers: by_type })
    }

    /// Returns the dispatch table for one entity type.
    pub fn handler(&self, entity_type: EntityType) -> Result<&EntityReversalHandler, AuditTrailError> {
        self.handlers
            .get(&entity_type)
            .ok_or(AuditTrailError::UnknownEntityType(entity_type))
    }

    /// Returns the dispatch table for a recorded target; targets without a
    /// concrete type use the all-entities table.
    pub fn handler_for_target(
        &self,
        target: &AuditLogTarget,
    ) -> Result<&EntityReversalHandler, AuditTrailError> {
        self.handler(target.registry_key())
    }

    /// Returns every registered entity type.
    #[must_use]
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut entity_types: Vec<EntityType> = self.handlers.keys().copied().collect();
        entity_types.sort();
        entity_types
    }
}
