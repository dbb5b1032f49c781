//! Role model shared by the catalog, the mapper and the permission facade.
//!
//! Roles are compile-time constants: the catalogs in [`catalog`] and
//! [`company`] are built once and never mutated at runtime.

pub mod catalog;
pub mod company;
pub mod mapper;

use serde::{Deserialize, Serialize};

/// Kind of organization a company represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    Organizer,
    Provider,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::Provider => "provider",
        }
    }
}

/// Provider service vertical. Role partitions differ per vertical because the
/// permission surface differs materially between, say, a caterer and a fleet
/// operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    Booking,
    Technical,
    Venue,
    Catering,
    Transport,
}

impl ProviderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Technical => "technical",
            Self::Venue => "venue",
            Self::Catering => "catering",
            Self::Transport => "transport",
        }
    }

    /// Role-id prefix used by this vertical's catalog partition.
    pub fn role_prefix(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Technical => "tech",
            Self::Venue => "venue",
            Self::Catering => "catering",
            Self::Transport => "transport",
        }
    }

    pub const ALL: [ProviderCategory; 5] = [
        Self::Booking,
        Self::Technical,
        Self::Venue,
        Self::Catering,
        Self::Transport,
    ];
}

/// Resource a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Team,
    Events,
    Offers,
    Contracts,
    Payments,
    Invoices,
    Settings,
    Tasks,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Events => "events",
            Self::Offers => "offers",
            Self::Contracts => "contracts",
            Self::Payments => "payments",
            Self::Invoices => "invoices",
            Self::Settings => "settings",
            Self::Tasks => "tasks",
        }
    }

    pub const ALL: [Resource; 8] = [
        Self::Team,
        Self::Events,
        Self::Offers,
        Self::Contracts,
        Self::Payments,
        Self::Invoices,
        Self::Settings,
        Self::Tasks,
    ];
}

/// Action on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Approve => "approve",
        }
    }

    pub const ALL: [Action; 5] = [
        Self::View,
        Self::Create,
        Self::Edit,
        Self::Delete,
        Self::Approve,
    ];
}

/// A resource together with the actions a role may take on it. A resource not
/// listed in a role's grants carries zero permissions (default-deny).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub actions: Vec<Action>,
}

impl Permission {
    pub fn new(resource: Resource, actions: &[Action]) -> Self {
        Self {
            resource,
            actions: actions.to_vec(),
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// "resource:action" strings, the shape persisted on member documents.
    pub fn as_strings(&self) -> Vec<String> {
        self.actions
            .iter()
            .map(|a| format!("{}:{}", self.resource.as_str(), a.as_str()))
            .collect()
    }
}

/// A catalog role. Immutable; defined at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub label: String,
    pub description: String,
    pub category: Option<ProviderCategory>,
    pub permissions: Vec<Permission>,
    pub is_default: bool,
}

impl Role {
    /// Grant set flattened to "resource:action" strings.
    pub fn permission_strings(&self) -> Vec<String> {
        self.permissions
            .iter()
            .flat_map(Permission::as_strings)
            .collect()
    }

    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.permissions
            .iter()
            .find(|p| p.resource == resource)
            .map(|p| p.allows(action))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_strings_flatten_resource_and_action() {
        let perm = Permission::new(Resource::Payments, &[Action::View, Action::Approve]);
        assert_eq!(perm.as_strings(), vec!["payments:view", "payments:approve"]);
    }

    #[test]
    fn role_grants_is_default_deny_for_missing_resource() {
        let role = Role {
            id: "r".into(),
            label: "R".into(),
            description: String::new(),
            category: None,
            permissions: vec![Permission::new(Resource::Events, &[Action::View])],
            is_default: false,
        };
        assert!(role.grants(Resource::Events, Action::View));
        assert!(!role.grants(Resource::Events, Action::Delete));
        assert!(!role.grants(Resource::Payments, Action::View));
    }
}
