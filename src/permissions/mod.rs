//! Permission facade.
//!
//! A memoized, default-deny view over one resolved role: the grant set is
//! flattened once when the facade is built for a role, not on every check.
//! The convenience predicates are fixed (resource, action) pairs routed
//! through [`PermissionFacade::has_permission`]; they carry no logic of their
//! own, so quick checks cannot drift from the generic checker.

use std::collections::HashSet;

use crate::roles::{Action, Resource, Role};

#[derive(Debug, Clone)]
pub struct PermissionFacade {
    role_id: String,
    role_label: String,
    grants: HashSet<(Resource, Action)>,
}

impl PermissionFacade {
    pub fn for_role(role: &Role) -> Self {
        let grants = role
            .permissions
            .iter()
            .flat_map(|p| p.actions.iter().map(|a| (p.resource, *a)))
            .collect();
        Self {
            role_id: role.id.clone(),
            role_label: role.label.clone(),
            grants,
        }
    }

    /// A facade that denies everything; used while no role is resolved.
    pub fn deny_all() -> Self {
        Self {
            role_id: String::new(),
            role_label: String::new(),
            grants: HashSet::new(),
        }
    }

    pub fn role_id(&self) -> &str {
        &self.role_id
    }

    pub fn role_label(&self) -> &str {
        &self.role_label
    }

    /// Default-deny: absence of a grant means false.
    pub fn has_permission(&self, resource: Resource, action: Action) -> bool {
        self.grants.contains(&(resource, action))
    }

    // Team
    pub fn can_view_team(&self) -> bool {
        self.has_permission(Resource::Team, Action::View)
    }
    pub fn can_manage_team(&self) -> bool {
        self.has_permission(Resource::Team, Action::Edit)
    }
    pub fn can_invite_members(&self) -> bool {
        self.has_permission(Resource::Team, Action::Create)
    }
    pub fn can_remove_members(&self) -> bool {
        self.has_permission(Resource::Team, Action::Delete)
    }

    // Events
    pub fn can_view_events(&self) -> bool {
        self.has_permission(Resource::Events, Action::View)
    }
    pub fn can_create_events(&self) -> bool {
        self.has_permission(Resource::Events, Action::Create)
    }
    pub fn can_manage_events(&self) -> bool {
        self.has_permission(Resource::Events, Action::Edit)
    }

    // Offers & contracts
    pub fn can_view_offers(&self) -> bool {
        self.has_permission(Resource::Offers, Action::View)
    }
    pub fn can_approve_offers(&self) -> bool {
        self.has_permission(Resource::Offers, Action::Approve)
    }
    pub fn can_view_contracts(&self) -> bool {
        self.has_permission(Resource::Contracts, Action::View)
    }
    pub fn can_approve_contracts(&self) -> bool {
        self.has_permission(Resource::Contracts, Action::Approve)
    }

    // Finance
    pub fn can_view_payments(&self) -> bool {
        self.has_permission(Resource::Payments, Action::View)
    }
    pub fn can_manage_finance(&self) -> bool {
        self.has_permission(Resource::Payments, Action::Approve)
    }
    pub fn can_manage_invoices(&self) -> bool {
        self.has_permission(Resource::Invoices, Action::Edit)
    }

    // Settings & tasks
    pub fn can_manage_settings(&self) -> bool {
        self.has_permission(Resource::Settings, Action::Edit)
    }
    pub fn can_view_tasks(&self) -> bool {
        self.has_permission(Resource::Tasks, Action::View)
    }
    pub fn can_manage_tasks(&self) -> bool {
        self.has_permission(Resource::Tasks, Action::Edit)
    }
}
