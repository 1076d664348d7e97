//! Directory entities whose lifecycle is recorded in the audit trail.
//!
//! Snapshots of these types are stored as backward data of `REMOVE` entries
//! and restored verbatim, so every field round-trips through JSON.

use rewind_core::{AppResult, NonEmptyString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{AuditLogTarget, EntityType};

/// Entity that can be snapshotted, patched and restored through the audit trail.
pub trait AuditedEntity:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Entity type recorded on audit targets.
    const ENTITY_TYPE: EntityType;

    /// Returns the stable identifier.
    fn entity_id(&self) -> &str;

    /// Returns the name shown in audit views.
    fn display_name(&self) -> Option<&str>;

    /// Built-in entities are never removed or restored by reversals.
    fn is_protected(&self) -> bool {
        false
    }

    /// Builds the audit target describing this entity.
    fn audit_target(&self) -> AuditLogTarget {
        let target = AuditLogTarget::entity(Self::ENTITY_TYPE, self.entity_id());
        match self.display_name() {
            Some(display_name) => target.with_display_name(display_name),
            None => target,
        }
    }
}

/// Directory user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: NonEmptyString,
    username: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    built_in: bool,
}

impl User {
    /// Creates an enabled user account.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            username: NonEmptyString::new(username)?,
            email: None,
            enabled: true,
            built_in: false,
        })
    }

    /// Sets the contact email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets whether the account can sign in.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Marks the account as system-managed.
    #[must_use]
    pub fn built_in(mut self) -> Self {
        self.built_in = true;
        self
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the contact email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the account can sign in.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl AuditedEntity for User {
    const ENTITY_TYPE: EntityType = EntityType::User;

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    fn display_name(&self) -> Option<&str> {
        Some(self.username.as_str())
    }

    fn is_protected(&self) -> bool {
        self.built_in
    }
}

/// Named bundle of privileges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: NonEmptyString,
    name: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    built_in: bool,
}

impl Role {
    /// Creates a custom role.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            name: NonEmptyString::new(name)?,
            description: None,
            built_in: false,
        })
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the role as system-managed.
    #[must_use]
    pub fn built_in(mut self) -> Self {
        self.built_in = true;
        self
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl AuditedEntity for Role {
    const ENTITY_TYPE: EntityType = EntityType::Role;

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    fn display_name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    fn is_protected(&self) -> bool {
        self.built_in
    }
}

/// Single grantable privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    id: NonEmptyString,
    name: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Privilege {
    /// Creates a privilege.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            name: NonEmptyString::new(name)?,
            description: None,
        })
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the privilege name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl AuditedEntity for Privilege {
    const ENTITY_TYPE: EntityType = EntityType::Privilege;

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    fn display_name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }
}

/// Free-form label attachable to users and roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    id: NonEmptyString,
    name: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

impl Label {
    /// Creates a label.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            name: NonEmptyString::new(name)?,
            color: None,
        })
    }

    /// Sets the display color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Returns the label name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the display color.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

impl AuditedEntity for Label {
    const ENTITY_TYPE: EntityType = EntityType::Label;

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    fn display_name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }
}
