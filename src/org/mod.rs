//! Organization aggregator.
//!
//! [`OrganizationService`] combines the authenticated user, the persisted
//! company/membership/invitation documents (through the store adapter) and
//! the role catalogs into one UI-consumable [`Organization`] snapshot, and
//! exposes the team mutations.
//!
//! Consistency model: refresh-after-write. Every mutation re-pulls the
//! persisted state once its own write resolves; the snapshot is never
//! mutated optimistically, and on failure it stays last-known-good.
//! Concurrent mutations from different callers are not serialized against
//! each other; callers needing that queue their own mutations.

pub mod error;
pub mod snapshot;

pub use error::OrgError;
pub use snapshot::{Invitation, Organization, TeamMember};

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::permissions::PermissionFacade;
use crate::roles::{catalog, mapper, Action, OrganizationType, ProviderCategory, Resource, Role};
use crate::store::{InviteParams, MembershipStore, StoreError};

/// Snapshot of the authenticated user, as handed over by the identity layer.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    /// Legacy profile fields, used to label the temporary organization.
    pub company_name: Option<String>,
    pub org_type: Option<OrganizationType>,
    pub category: Option<ProviderCategory>,
}

/// Session lifecycle of the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    /// User has a profile but no persisted company yet.
    NeedsMigration,
    Loading,
    Ready,
    Failed,
}

struct AggregateState {
    phase: SessionPhase,
    organization: Option<Organization>,
    permissions: PermissionFacade,
}

pub struct OrganizationService {
    store: Arc<dyn MembershipStore>,
    user: AuthUser,
    config: CoreConfig,
    state: RwLock<AggregateState>,
}

impl OrganizationService {
    /// Explicit construction; inject one instance per consumer scope instead
    /// of sharing a process-wide singleton.
    pub fn new(store: Arc<dyn MembershipStore>, user: AuthUser, config: CoreConfig) -> Self {
        Self {
            store,
            user,
            config,
            state: RwLock::new(AggregateState {
                phase: SessionPhase::Uninitialized,
                organization: None,
                permissions: PermissionFacade::deny_all(),
            }),
        }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    pub async fn organization(&self) -> Option<Organization> {
        self.state.read().await.organization.clone()
    }

    /// The memoized facade for the current user's resolved role. Deny-all
    /// until a snapshot resolves.
    pub async fn permissions(&self) -> PermissionFacade {
        self.state.read().await.permissions.clone()
    }

    pub async fn has_permission(&self, resource: Resource, action: Action) -> bool {
        self.state.read().await.permissions.has_permission(resource, action)
    }

    /// Load the user's organization, migrating legacy single-user accounts on
    /// first contact.
    pub async fn initialize(&self) -> Result<(), OrgError> {
        self.set_phase(SessionPhase::Loading).await;
        let companies = match self.store.user_companies(&self.user.id).await {
            Ok(companies) => companies,
            Err(err) => return self.fail("initialize", err).await,
        };
        match companies.first() {
            Some(company) => self.load_company(company.id).await,
            None => self.migrate().await,
        }
    }

    /// Re-pull company and team data unconditionally. Idempotent.
    pub async fn refresh_organization(&self) -> Result<(), OrgError> {
        self.set_phase(SessionPhase::Loading).await;
        let companies = match self.store.user_companies(&self.user.id).await {
            Ok(companies) => companies,
            Err(err) => return self.fail("refresh", err).await,
        };
        match companies.first() {
            Some(company) => self.load_company(company.id).await,
            None => {
                self.set_phase(SessionPhase::NeedsMigration).await;
                Err(OrgError::NotReady)
            }
        }
    }

    pub async fn invite_member(
        &self,
        email: &str,
        role_id: &str,
        name: Option<String>,
        message: Option<String>,
    ) -> Result<(), OrgError> {
        let (company_id, company_name) = self.require_company().await?;
        let role = self.resolve_role(role_id).await;
        let company_role = mapper::company_role_for(&role.id);
        let params = InviteParams {
            company_id,
            email: email.to_string(),
            name,
            phone: None,
            company_role_id: company_role.id.clone(),
            role_name: role.label.clone(),
            message,
            expires_in_days: self.config.invitation_expiry_days,
        };
        self.set_phase(SessionPhase::Loading).await;
        let result = self
            .store
            .create_invitation(params, &self.user.id, &self.user.display_name, &company_name)
            .await
            .map(|invitation| {
                debug!("invited {} as {}", invitation.email, invitation.role_name);
            });
        self.after_mutation("invite_member", result).await
    }

    pub async fn update_member_role(
        &self,
        member_id: Uuid,
        role_id: &str,
    ) -> Result<(), OrgError> {
        self.require_company().await?;
        let role = self.resolve_role(role_id).await;
        let company_role = mapper::company_role_for(&role.id);
        let permissions = role.permission_strings();
        self.set_phase(SessionPhase::Loading).await;
        let result = self
            .store
            .update_member_role(member_id, &company_role.id, &role.label, permissions)
            .await
            .map(|_| ());
        self.after_mutation("update_member_role", result).await
    }

    /// The store needs both the membership-record id and the user id, so the
    /// persisted user id is resolved from the current snapshot first.
    pub async fn remove_member(&self, member_id: Uuid) -> Result<(), OrgError> {
        let (company_id, _) = self.require_company().await?;
        let user_id = {
            let state = self.state.read().await;
            state
                .organization
                .as_ref()
                .and_then(|org| org.member_by_id(member_id))
                .map(|m| m.user_id.clone())
                .ok_or_else(|| OrgError::NotFound(format!("member {member_id}")))?
        };
        self.set_phase(SessionPhase::Loading).await;
        let result = self.store.remove_member(member_id, company_id, &user_id).await;
        self.after_mutation("remove_member", result).await
    }

    pub async fn cancel_invitation(&self, invitation_id: Uuid) -> Result<(), OrgError> {
        self.require_company().await?;
        self.set_phase(SessionPhase::Loading).await;
        let result = self.store.cancel_invitation(invitation_id).await;
        self.after_mutation("cancel_invitation", result).await
    }

    pub async fn resend_invitation(&self, invitation_id: Uuid) -> Result<(), OrgError> {
        self.require_company().await?;
        self.set_phase(SessionPhase::Loading).await;
        let result = self.store.resend_invitation(invitation_id).await.map(|_| ());
        self.after_mutation("resend_invitation", result).await
    }

    async fn migrate(&self) -> Result<(), OrgError> {
        {
            let mut state = self.state.write().await;
            state.phase = SessionPhase::NeedsMigration;
            if self.config.temporary_org_enabled {
                let org = self.temporary_organization();
                if let Some(member) = org.member_for_user(&self.user.id) {
                    state.permissions = PermissionFacade::for_role(&member.role);
                }
                state.organization = Some(org);
            }
        }
        debug!("no company for user {}, running migration", self.user.id);
        match self.store.migrate_user_to_company(&self.user.id).await {
            Ok(company) => {
                self.set_phase(SessionPhase::Loading).await;
                self.load_company(company.id).await
            }
            // The temporary snapshot stays in place for rendering.
            Err(err) => self.fail("migrate", err).await,
        }
    }

    async fn load_company(&self, company_id: Uuid) -> Result<(), OrgError> {
        match self.store.company_with_members(company_id).await {
            Ok(view) => {
                let org = snapshot::build_organization(&view);
                self.install(org).await;
                Ok(())
            }
            Err(err) => self.fail("load_company", err).await,
        }
    }

    /// Install a fresh snapshot and re-memoize the permission facade if the
    /// user's resolved role changed.
    async fn install(&self, org: Organization) {
        let mut state = self.state.write().await;
        match org.member_for_user(&self.user.id) {
            Some(member) if member.role.id != state.permissions.role_id() => {
                state.permissions = PermissionFacade::for_role(&member.role);
            }
            Some(_) => {}
            None => state.permissions = PermissionFacade::deny_all(),
        }
        state.organization = Some(org);
        state.phase = SessionPhase::Ready;
    }

    /// Mark the session failed, leaving the snapshot last-known-good.
    async fn fail(&self, op: &str, err: StoreError) -> Result<(), OrgError> {
        warn!("organization {op} failed: {err}");
        self.set_phase(SessionPhase::Failed).await;
        Err(err.into())
    }

    async fn after_mutation(
        &self,
        op: &'static str,
        result: Result<(), StoreError>,
    ) -> Result<(), OrgError> {
        match result {
            Ok(()) => self.refresh_organization().await,
            Err(err) => {
                warn!("{op} failed: {err}");
                let mut state = self.state.write().await;
                // The write had no effect; the last-known-good snapshot is
                // still current.
                if state.organization.is_some() {
                    state.phase = SessionPhase::Ready;
                } else {
                    state.phase = SessionPhase::Failed;
                }
                Err(err.into())
            }
        }
    }

    async fn set_phase(&self, phase: SessionPhase) {
        self.state.write().await.phase = phase;
    }

    /// Mutations are refused until a persisted organization is loaded; the
    /// temporary placeholder is never authoritative for writes.
    async fn require_company(&self) -> Result<(Uuid, String), OrgError> {
        let state = self.state.read().await;
        match &state.organization {
            Some(org) if !org.temporary => Ok((org.id, org.name.clone())),
            _ => Err(OrgError::NotReady),
        }
    }

    async fn resolve_role(&self, role_id: &str) -> Role {
        match catalog::role_by_id(role_id) {
            Some(role) => role.clone(),
            None => {
                let (org_type, category) = self.partition().await;
                warn!("unknown role id {role_id}, using partition default");
                catalog::default_role(org_type, category).clone()
            }
        }
    }

    async fn partition(&self) -> (OrganizationType, Option<ProviderCategory>) {
        let state = self.state.read().await;
        match &state.organization {
            Some(org) => (org.org_type, org.category),
            None => (
                self.user.org_type.unwrap_or(OrganizationType::Organizer),
                self.user.category,
            ),
        }
    }

    /// Client-only placeholder rendered while migration is in flight;
    /// discarded the instant the persisted company resolves.
    fn temporary_organization(&self) -> Organization {
        let now = Utc::now();
        let org_type = self.user.org_type.unwrap_or(OrganizationType::Organizer);
        let role = catalog::default_role(org_type, self.user.category).clone();
        let name = self
            .user
            .company_name
            .clone()
            .unwrap_or_else(|| self.user.display_name.clone());
        Organization {
            // Stable id per user so re-renders do not churn.
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, self.user.id.as_bytes()),
            name,
            org_type,
            category: self.user.category,
            owner_user_id: self.user.id.clone(),
            members: vec![TeamMember {
                id: Uuid::new_v5(&Uuid::NAMESPACE_OID, self.user.email.as_bytes()),
                user_id: self.user.id.clone(),
                email: self.user.email.clone(),
                display_name: self.user.display_name.clone(),
                avatar_url: self.user.avatar_url.clone(),
                phone: self.user.phone.clone(),
                role,
                status: crate::store::MemberStatus::Active,
                invited_by: None,
                invited_at: None,
                joined_at: Some(now),
                last_active: Some(now),
            }],
            invitations: vec![],
            created_at: now,
            updated_at: now,
            temporary: true,
        }
    }
}
