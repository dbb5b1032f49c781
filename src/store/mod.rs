//! Membership store adapter.
//!
//! Everything the aggregator knows about persistence goes through
//! [`MembershipStore`]; the backing document store (and its SDK) stays behind
//! this trait. [`memory::MemoryStore`] is the in-process reference
//! implementation used by tests and demo mode.

pub mod error;
pub mod memory;
pub mod models;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use error::StoreError;
pub use models::{
    CompanyDoc, CompanyInvitationDoc, CompanyMemberDoc, CompanyPatch, CompanyView,
    InvitationStatus, InviteParams, MemberRecord, MemberStatus, NewCompany, UserDoc,
};

/// Change notification pushed to live subscribers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    CompanyChanged(CompanyDoc),
    CompanyDeleted(Uuid),
    MembersChanged(Uuid),
    MembershipChanged { company_id: Uuid, user_id: String },
    InvitationsChanged(Uuid),
}

impl StoreEvent {
    pub fn company_id(&self) -> Uuid {
        match self {
            Self::CompanyChanged(c) => c.id,
            Self::CompanyDeleted(id)
            | Self::MembersChanged(id)
            | Self::InvitationsChanged(id) => *id,
            Self::MembershipChanged { company_id, .. } => *company_id,
        }
    }
}

/// Live subscription handle. Dropping it releases the listener; leaked
/// subscriptions keep consuming backend quota and deliver stale callbacks.
pub struct Subscription {
    rx: broadcast::Receiver<StoreEvent>,
    user_filter: Option<String>,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<StoreEvent>, user_filter: Option<String>) -> Self {
        Self { rx, user_filter }
    }

    fn accepts(&self, event: &StoreEvent) -> bool {
        match &self.user_filter {
            None => true,
            Some(user) => matches!(
                event,
                StoreEvent::MembershipChanged { user_id, .. } if user_id == user
            ),
        }
    }

    /// Next matching event, skipping lagged gaps; `None` once the publisher
    /// is gone.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Persistence operations the organization aggregator depends on.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Companies the user belongs to, primary company first.
    async fn user_companies(&self, user_id: &str) -> Result<Vec<CompanyDoc>, StoreError>;

    /// The company joined with its member and invitation sub-collections,
    /// member profiles enriched from the users collection.
    async fn company_with_members(&self, company_id: Uuid) -> Result<CompanyView, StoreError>;

    async fn create_company(&self, params: NewCompany) -> Result<CompanyDoc, StoreError>;

    async fn update_company(
        &self,
        company_id: Uuid,
        patch: CompanyPatch,
    ) -> Result<CompanyDoc, StoreError>;

    async fn delete_company(&self, company_id: Uuid) -> Result<(), StoreError>;

    /// Creates a pending invitation with a fresh token and
    /// `expires_at = now + params.expires_in_days`.
    async fn create_invitation(
        &self,
        params: InviteParams,
        inviter_id: &str,
        inviter_name: &str,
        company_name: &str,
    ) -> Result<CompanyInvitationDoc, StoreError>;

    /// Transitions the invitation to accepted and creates or re-activates the
    /// member. Fails on terminal status, and on lazy expiry checked against
    /// wall-clock time at the moment of accept.
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user_id: &str,
    ) -> Result<CompanyMemberDoc, StoreError>;

    /// Invitee-initiated decline.
    async fn reject_invitation(&self, invitation_id: Uuid) -> Result<(), StoreError>;

    /// Inviter-initiated withdrawal.
    async fn cancel_invitation(&self, invitation_id: Uuid) -> Result<(), StoreError>;

    /// Re-issues token and expiry and resets status to pending.
    async fn resend_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<CompanyInvitationDoc, StoreError>;

    async fn update_member_role(
        &self,
        member_id: Uuid,
        role_id: &str,
        role_name: &str,
        permissions: Vec<String>,
    ) -> Result<CompanyMemberDoc, StoreError>;

    /// Removal needs both the membership-record id and the user id; removing
    /// the company owner is a precondition failure.
    async fn remove_member(
        &self,
        member_id: Uuid,
        company_id: Uuid,
        user_id: &str,
    ) -> Result<(), StoreError>;

    /// One-time migration for legacy single-user accounts. Idempotent: if the
    /// user already owns or belongs to a company that company is returned,
    /// otherwise one is synthesized from the user's profile fields.
    async fn migrate_user_to_company(&self, user_id: &str) -> Result<CompanyDoc, StoreError>;

    /// Company-level change feed. Consumers sharing a company share the
    /// underlying listener.
    async fn subscribe_company(&self, company_id: Uuid) -> Result<Subscription, StoreError>;

    /// Membership change feed for one user within a company.
    async fn subscribe_membership(
        &self,
        company_id: Uuid,
        user_id: &str,
    ) -> Result<Subscription, StoreError>;
}
