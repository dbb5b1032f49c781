//! In-memory membership store.
//!
//! Reference implementation of [`MembershipStore`] backing the test suite and
//! offline/demo mode. Collections live behind a single `RwLock`; change
//! notifications go out over one broadcast channel per company so consumers
//! subscribing to the same company share the listener.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::roles::{company, mapper};

use super::error::StoreError;
use super::models::{
    CompanyDoc, CompanyInvitationDoc, CompanyMemberDoc, CompanyPatch, CompanyView,
    InvitationStatus, InviteParams, MemberRecord, MemberStatus, NewCompany, UserDoc,
};
use super::{MembershipStore, StoreEvent, Subscription};

const TOKEN_LEN: usize = 32;
const CHANNEL_CAPACITY: usize = 32;
const DEFAULT_EXPIRY_DAYS: i64 = 7;

fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[derive(Default)]
struct Inner {
    companies: HashMap<Uuid, CompanyDoc>,
    members: HashMap<Uuid, CompanyMemberDoc>,
    invitations: HashMap<Uuid, CompanyInvitationDoc>,
    users: HashMap<String, UserDoc>,
}

impl Inner {
    fn companies_for_user(&self, user_id: &str) -> Vec<CompanyDoc> {
        let mut out: Vec<CompanyDoc> = self
            .companies
            .values()
            .filter(|c| {
                c.owner_user_id == user_id
                    || self
                        .members
                        .values()
                        .any(|m| m.company_id == c.id && m.user_id == user_id)
            })
            .cloned()
            .collect();
        out.sort_by_key(|c| c.created_at);
        if let Some(primary) = self.users.get(user_id).and_then(|u| u.primary_company_id) {
            if let Some(pos) = out.iter().position(|c| c.id == primary) {
                let doc = out.remove(pos);
                out.insert(0, doc);
            }
        }
        out
    }

    fn member_for(&self, company_id: Uuid, user_id: &str) -> Option<Uuid> {
        self.members
            .values()
            .find(|m| m.company_id == company_id && m.user_id == user_id)
            .map(|m| m.id)
    }
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
    channels: RwLock<HashMap<Uuid, broadcast::Sender<StoreEvent>>>,
    /// Simulated connectivity loss; every operation fails `Unavailable`.
    offline: AtomicBool,
    default_expiry_days: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_expiry_days(DEFAULT_EXPIRY_DAYS)
    }

    pub fn with_expiry_days(default_expiry_days: i64) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            channels: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            default_expiry_days,
        }
    }

    /// Seed or update a user profile document.
    pub async fn upsert_user(&self, user: UserDoc) {
        self.inner.write().await.users.insert(user.id.clone(), user);
    }

    /// Toggle simulated connectivity loss.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }

    async fn publish(&self, event: StoreEvent) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(&event.company_id()) {
            // Send only fails when no receiver is left, which is fine.
            let _ = tx.send(event);
        }
    }

    async fn sender_for(&self, company_id: Uuid) -> broadcast::Sender<StoreEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(company_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn derived_permissions(
        role_id: &str,
        role_name: &str,
        company: &CompanyDoc,
    ) -> Vec<String> {
        mapper::map_company_role(role_id, role_name, company.org_type, company.category)
            .permission_strings()
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn user_companies(&self, user_id: &str) -> Result<Vec<CompanyDoc>, StoreError> {
        self.ensure_online()?;
        Ok(self.inner.read().await.companies_for_user(user_id))
    }

    async fn company_with_members(&self, company_id: Uuid) -> Result<CompanyView, StoreError> {
        self.ensure_online()?;
        let inner = self.inner.read().await;
        let company = inner
            .companies
            .get(&company_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("company", company_id.to_string()))?;

        let mut members: Vec<MemberRecord> = inner
            .members
            .values()
            .filter(|m| m.company_id == company_id)
            .map(|m| MemberRecord {
                member: m.clone(),
                profile: inner.users.get(&m.user_id).cloned(),
            })
            .collect();
        members.sort_by_key(|r| r.member.joined_at.or(r.member.invited_at));

        let mut invitations: Vec<CompanyInvitationDoc> = inner
            .invitations
            .values()
            .filter(|i| i.company_id == company_id)
            .cloned()
            .collect();
        invitations.sort_by_key(|i| i.created_at);

        Ok(CompanyView {
            company,
            members,
            invitations,
        })
    }

    async fn create_company(&self, params: NewCompany) -> Result<CompanyDoc, StoreError> {
        self.ensure_online()?;
        let now = Utc::now();
        let company = CompanyDoc {
            id: Uuid::new_v4(),
            name: params.name,
            org_type: params.org_type,
            category: params.category,
            owner_user_id: params.owner_user_id,
            settings: params.settings,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(&company.owner_user_id) {
            user.company_ids.push(company.id);
            if user.primary_company_id.is_none() {
                user.primary_company_id = Some(company.id);
            }
        }
        inner.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn update_company(
        &self,
        company_id: Uuid,
        patch: CompanyPatch,
    ) -> Result<CompanyDoc, StoreError> {
        self.ensure_online()?;
        let updated = {
            let mut inner = self.inner.write().await;
            let company = inner
                .companies
                .get_mut(&company_id)
                .ok_or_else(|| StoreError::not_found("company", company_id.to_string()))?;
            if let Some(name) = patch.name {
                company.name = name;
            }
            if let Some(category) = patch.category {
                company.category = Some(category);
            }
            if let Some(settings) = patch.settings {
                company.settings = Some(settings);
            }
            company.updated_at = Utc::now();
            company.clone()
        };
        self.publish(StoreEvent::CompanyChanged(updated.clone())).await;
        Ok(updated)
    }

    async fn delete_company(&self, company_id: Uuid) -> Result<(), StoreError> {
        self.ensure_online()?;
        {
            let mut inner = self.inner.write().await;
            inner
                .companies
                .remove(&company_id)
                .ok_or_else(|| StoreError::not_found("company", company_id.to_string()))?;
            inner.members.retain(|_, m| m.company_id != company_id);
            inner.invitations.retain(|_, i| i.company_id != company_id);
            for user in inner.users.values_mut() {
                user.company_ids.retain(|id| *id != company_id);
                if user.primary_company_id == Some(company_id) {
                    user.primary_company_id = user.company_ids.first().copied();
                }
            }
        }
        self.publish(StoreEvent::CompanyDeleted(company_id)).await;
        Ok(())
    }

    async fn create_invitation(
        &self,
        params: InviteParams,
        inviter_id: &str,
        inviter_name: &str,
        company_name: &str,
    ) -> Result<CompanyInvitationDoc, StoreError> {
        self.ensure_online()?;
        let now = Utc::now();
        let invitation = {
            let mut inner = self.inner.write().await;
            if !inner.companies.contains_key(&params.company_id) {
                return Err(StoreError::not_found(
                    "company",
                    params.company_id.to_string(),
                ));
            }

            let already_member = inner
                .users
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(&params.email))
                .and_then(|u| inner.member_for(params.company_id, &u.id))
                .is_some();
            if already_member {
                return Err(StoreError::conflict(format!(
                    "{} is already a member of this company",
                    params.email
                )));
            }

            let already_invited = inner.invitations.values().any(|i| {
                i.company_id == params.company_id
                    && i.email.eq_ignore_ascii_case(&params.email)
                    && i.effective_status(now) == InvitationStatus::Pending
            });
            if already_invited {
                return Err(StoreError::conflict(format!(
                    "an invitation for {} is already pending",
                    params.email
                )));
            }

            let invitation = CompanyInvitationDoc {
                id: Uuid::new_v4(),
                company_id: params.company_id,
                company_name: company_name.to_string(),
                email: params.email,
                name: params.name,
                phone: params.phone,
                role_id: params.company_role_id,
                role_name: params.role_name,
                inviter_id: inviter_id.to_string(),
                inviter_name: inviter_name.to_string(),
                message: params.message,
                status: InvitationStatus::Pending,
                token: new_token(),
                created_at: now,
                expires_at: now + Duration::days(params.expires_in_days),
            };
            inner.invitations.insert(invitation.id, invitation.clone());
            invitation
        };
        self.publish(StoreEvent::InvitationsChanged(invitation.company_id))
            .await;
        Ok(invitation)
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user_id: &str,
    ) -> Result<CompanyMemberDoc, StoreError> {
        self.ensure_online()?;
        let now = Utc::now();
        let (member, company_id) = {
            let mut inner = self.inner.write().await;
            let invitation = inner
                .invitations
                .get(&invitation_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("invitation", invitation_id.to_string()))?;

            if invitation.status.is_terminal() {
                return Err(StoreError::precondition(format!(
                    "invitation is already {}",
                    invitation.status.as_str()
                )));
            }
            if invitation.is_expired(now) {
                // Lazy expiry: the stored status still reads pending; mark it
                // now that we looked.
                if let Some(stored) = inner.invitations.get_mut(&invitation_id) {
                    stored.status = InvitationStatus::Expired;
                }
                return Err(StoreError::precondition("invitation has expired"));
            }

            let company = inner
                .companies
                .get(&invitation.company_id)
                .cloned()
                .ok_or_else(|| {
                    StoreError::not_found("company", invitation.company_id.to_string())
                })?;
            let permissions =
                Self::derived_permissions(&invitation.role_id, &invitation.role_name, &company);

            let member = match inner.member_for(company.id, user_id) {
                Some(member_id) => {
                    let member = inner
                        .members
                        .get_mut(&member_id)
                        .ok_or_else(|| StoreError::not_found("member", member_id.to_string()))?;
                    member.status = MemberStatus::Active;
                    member.role_id = invitation.role_id.clone();
                    member.role_name = invitation.role_name.clone();
                    member.permissions = permissions;
                    member.joined_at = Some(now);
                    member.clone()
                }
                None => {
                    let member = CompanyMemberDoc {
                        id: Uuid::new_v4(),
                        company_id: company.id,
                        user_id: user_id.to_string(),
                        role_id: invitation.role_id.clone(),
                        role_name: invitation.role_name.clone(),
                        permissions,
                        status: MemberStatus::Active,
                        invited_by: Some(invitation.inviter_id.clone()),
                        invited_at: Some(invitation.created_at),
                        joined_at: Some(now),
                    };
                    inner.members.insert(member.id, member.clone());
                    member
                }
            };

            if let Some(stored) = inner.invitations.get_mut(&invitation_id) {
                stored.status = InvitationStatus::Accepted;
            }
            if let Some(user) = inner.users.get_mut(user_id) {
                if !user.company_ids.contains(&company.id) {
                    user.company_ids.push(company.id);
                }
                if user.primary_company_id.is_none() {
                    user.primary_company_id = Some(company.id);
                }
            }
            (member, company.id)
        };

        self.publish(StoreEvent::InvitationsChanged(company_id)).await;
        self.publish(StoreEvent::MembersChanged(company_id)).await;
        self.publish(StoreEvent::MembershipChanged {
            company_id,
            user_id: user_id.to_string(),
        })
        .await;
        Ok(member)
    }

    async fn reject_invitation(&self, invitation_id: Uuid) -> Result<(), StoreError> {
        self.cancel_invitation(invitation_id).await
    }

    async fn cancel_invitation(&self, invitation_id: Uuid) -> Result<(), StoreError> {
        self.ensure_online()?;
        let company_id = {
            let mut inner = self.inner.write().await;
            let invitation = inner
                .invitations
                .get_mut(&invitation_id)
                .ok_or_else(|| StoreError::not_found("invitation", invitation_id.to_string()))?;
            if invitation.status.is_terminal() {
                return Err(StoreError::precondition(format!(
                    "invitation is already {}",
                    invitation.status.as_str()
                )));
            }
            invitation.status = InvitationStatus::Cancelled;
            invitation.company_id
        };
        self.publish(StoreEvent::InvitationsChanged(company_id)).await;
        Ok(())
    }

    async fn resend_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<CompanyInvitationDoc, StoreError> {
        self.ensure_online()?;
        let now = Utc::now();
        let invitation = {
            let mut inner = self.inner.write().await;
            let invitation = inner
                .invitations
                .get_mut(&invitation_id)
                .ok_or_else(|| StoreError::not_found("invitation", invitation_id.to_string()))?;
            match invitation.status {
                InvitationStatus::Accepted | InvitationStatus::Cancelled => {
                    return Err(StoreError::precondition(format!(
                        "invitation is already {}",
                        invitation.status.as_str()
                    )));
                }
                InvitationStatus::Pending | InvitationStatus::Expired => {}
            }
            invitation.token = new_token();
            invitation.status = InvitationStatus::Pending;
            invitation.created_at = now;
            invitation.expires_at = now + Duration::days(self.default_expiry_days);
            invitation.clone()
        };
        debug!("re-issued invitation {} to {}", invitation.id, invitation.email);
        self.publish(StoreEvent::InvitationsChanged(invitation.company_id))
            .await;
        Ok(invitation)
    }

    async fn update_member_role(
        &self,
        member_id: Uuid,
        role_id: &str,
        role_name: &str,
        permissions: Vec<String>,
    ) -> Result<CompanyMemberDoc, StoreError> {
        self.ensure_online()?;
        let member = {
            let mut inner = self.inner.write().await;
            let member = inner
                .members
                .get_mut(&member_id)
                .ok_or_else(|| StoreError::not_found("member", member_id.to_string()))?;
            member.role_id = role_id.to_string();
            member.role_name = role_name.to_string();
            member.permissions = permissions;
            member.clone()
        };
        self.publish(StoreEvent::MembersChanged(member.company_id)).await;
        self.publish(StoreEvent::MembershipChanged {
            company_id: member.company_id,
            user_id: member.user_id.clone(),
        })
        .await;
        Ok(member)
    }

    async fn remove_member(
        &self,
        member_id: Uuid,
        company_id: Uuid,
        user_id: &str,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        {
            let mut inner = self.inner.write().await;
            let company = inner
                .companies
                .get(&company_id)
                .ok_or_else(|| StoreError::not_found("company", company_id.to_string()))?;
            if company.owner_user_id == user_id {
                return Err(StoreError::precondition(
                    "the company owner cannot be removed",
                ));
            }
            let member = inner
                .members
                .get(&member_id)
                .ok_or_else(|| StoreError::not_found("member", member_id.to_string()))?;
            if member.company_id != company_id || member.user_id != user_id {
                return Err(StoreError::precondition(
                    "member record does not match company and user",
                ));
            }
            inner.members.remove(&member_id);
            if let Some(user) = inner.users.get_mut(user_id) {
                user.company_ids.retain(|id| *id != company_id);
                if user.primary_company_id == Some(company_id) {
                    user.primary_company_id = user.company_ids.first().copied();
                }
            }
        }
        self.publish(StoreEvent::MembersChanged(company_id)).await;
        self.publish(StoreEvent::MembershipChanged {
            company_id,
            user_id: user_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn migrate_user_to_company(&self, user_id: &str) -> Result<CompanyDoc, StoreError> {
        self.ensure_online()?;
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.companies_for_user(user_id).into_iter().next() {
            debug!("migration no-op, user {user_id} already in company {}", existing.id);
            return Ok(existing);
        }

        let user = inner
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", user_id.to_string()))?;

        let org_type = user.org_type.unwrap_or(crate::roles::OrganizationType::Organizer);
        let company = CompanyDoc {
            id: Uuid::new_v4(),
            name: user.company_name.clone().unwrap_or_else(|| user.display_name.clone()),
            org_type,
            category: user.category,
            owner_user_id: user_id.to_string(),
            settings: None,
            created_at: now,
            updated_at: now,
        };

        let owner_role = company::company_role_by_id("owner")
            .unwrap_or_else(company::default_company_role);
        let permissions = Self::derived_permissions(&owner_role.id, &owner_role.label, &company);
        let member = CompanyMemberDoc {
            id: Uuid::new_v4(),
            company_id: company.id,
            user_id: user_id.to_string(),
            role_id: owner_role.id.clone(),
            role_name: owner_role.label.clone(),
            permissions,
            status: MemberStatus::Active,
            invited_by: None,
            invited_at: None,
            joined_at: Some(now),
        };

        inner.companies.insert(company.id, company.clone());
        inner.members.insert(member.id, member);
        if let Some(stored) = inner.users.get_mut(user_id) {
            stored.company_ids.push(company.id);
            stored.primary_company_id = Some(company.id);
        }
        Ok(company)
    }

    async fn subscribe_company(&self, company_id: Uuid) -> Result<Subscription, StoreError> {
        self.ensure_online()?;
        let sender = self.sender_for(company_id).await;
        Ok(Subscription::new(sender.subscribe(), None))
    }

    async fn subscribe_membership(
        &self,
        company_id: Uuid,
        user_id: &str,
    ) -> Result<Subscription, StoreError> {
        self.ensure_online()?;
        let sender = self.sender_for(company_id).await;
        Ok(Subscription::new(
            sender.subscribe(),
            Some(user_id.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{OrganizationType, ProviderCategory};

    fn user(id: &str, email: &str, name: &str) -> UserDoc {
        UserDoc {
            id: id.to_string(),
            email: email.to_string(),
            display_name: name.to_string(),
            avatar_url: None,
            phone: None,
            company_name: Some(format!("{name} Organizasyon")),
            org_type: Some(OrganizationType::Organizer),
            category: None,
            company_ids: vec![],
            primary_company_id: None,
            last_active: None,
        }
    }

    fn invite(company_id: Uuid, email: &str, days: i64) -> InviteParams {
        InviteParams {
            company_id,
            email: email.to_string(),
            name: None,
            phone: None,
            company_role_id: "team_member".to_string(),
            role_name: "Etkinlik Koordinatörü".to_string(),
            message: None,
            expires_in_days: days,
        }
    }

    async fn store_with_owner() -> (MemoryStore, CompanyDoc) {
        let store = MemoryStore::new();
        store.upsert_user(user("u-owner", "owner@x.com", "Deniz")).await;
        let company = store.migrate_user_to_company("u-owner").await.unwrap();
        (store, company)
    }

    #[tokio::test]
    async fn migration_is_idempotent() {
        let (store, company) = store_with_owner().await;
        let again = store.migrate_user_to_company("u-owner").await.unwrap();
        assert_eq!(again.id, company.id);
        assert_eq!(store.user_companies("u-owner").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn migration_uses_legacy_profile_fields() {
        let (store, company) = store_with_owner().await;
        assert_eq!(company.name, "Deniz Organizasyon");
        assert_eq!(company.owner_user_id, "u-owner");

        let view = store.company_with_members(company.id).await.unwrap();
        assert_eq!(view.members.len(), 1);
        let owner = &view.members[0].member;
        assert_eq!(owner.role_id, "owner");
        assert_eq!(owner.status, MemberStatus::Active);
        assert!(owner.permissions.contains(&"settings:delete".to_string()));
    }

    #[tokio::test]
    async fn migration_fails_without_a_profile() {
        let store = MemoryStore::new();
        let err = store.migrate_user_to_company("nobody").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn invitation_lifecycle_invite_then_accept() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;

        let invitation = store
            .create_invitation(invite(company.id, "new@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.token.len(), TOKEN_LEN);
        assert!(invitation.expires_at > invitation.created_at);

        let member = store.accept_invitation(invitation.id, "u-guest").await.unwrap();
        assert_eq!(member.status, MemberStatus::Active);
        assert_eq!(member.role_name, "Etkinlik Koordinatörü");

        let view = store.company_with_members(company.id).await.unwrap();
        assert_eq!(view.members.len(), 2);
        assert_eq!(
            view.invitations[0].status,
            InvitationStatus::Accepted
        );
    }

    #[tokio::test]
    async fn accepting_twice_is_a_precondition_failure() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;
        let invitation = store
            .create_invitation(invite(company.id, "new@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        store.accept_invitation(invitation.id, "u-guest").await.unwrap();

        let err = store.accept_invitation(invitation.id, "u-guest").await.unwrap_err();
        assert!(matches!(err, StoreError::Precondition(_)));
    }

    #[tokio::test]
    async fn lazy_expiry_blocks_accept_even_while_status_reads_pending() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;
        let invitation = store
            .create_invitation(invite(company.id, "new@x.com", -1), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        assert_eq!(invitation.status, InvitationStatus::Pending);

        let err = store.accept_invitation(invitation.id, "u-guest").await.unwrap_err();
        assert!(matches!(err, StoreError::Precondition(_)));

        // The store marked it expired on the way out.
        let view = store.company_with_members(company.id).await.unwrap();
        assert_eq!(view.invitations[0].status, InvitationStatus::Expired);
        assert_eq!(view.members.len(), 1);
    }

    #[tokio::test]
    async fn resend_resets_token_expiry_and_status() {
        let (store, company) = store_with_owner().await;
        let invitation = store
            .create_invitation(invite(company.id, "new@x.com", -1), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        let old_token = invitation.token.clone();

        let before = Utc::now();
        let reissued = store.resend_invitation(invitation.id).await.unwrap();
        assert_eq!(reissued.status, InvitationStatus::Pending);
        assert_ne!(reissued.token, old_token);
        assert!(reissued.expires_at > before + Duration::days(6));
        assert!(reissued.expires_at <= Utc::now() + Duration::days(7));
    }

    #[tokio::test]
    async fn cancelled_invitation_is_terminal() {
        let (store, company) = store_with_owner().await;
        let invitation = store
            .create_invitation(invite(company.id, "new@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        store.cancel_invitation(invitation.id).await.unwrap();

        assert!(matches!(
            store.cancel_invitation(invitation.id).await.unwrap_err(),
            StoreError::Precondition(_)
        ));
        assert!(matches!(
            store.resend_invitation(invitation.id).await.unwrap_err(),
            StoreError::Precondition(_)
        ));
    }

    #[tokio::test]
    async fn inviting_an_existing_member_conflicts() {
        let (store, company) = store_with_owner().await;
        let err = store
            .create_invitation(invite(company.id, "owner@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_pending_invitation_conflicts() {
        let (store, company) = store_with_owner().await;
        store
            .create_invitation(invite(company.id, "new@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        let err = store
            .create_invitation(invite(company.id, "new@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn owner_removal_is_blocked_and_state_unchanged() {
        let (store, company) = store_with_owner().await;
        let view = store.company_with_members(company.id).await.unwrap();
        let owner_member = view.members[0].member.clone();

        let err = store
            .remove_member(owner_member.id, company.id, "u-owner")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Precondition(_)));

        let after = store.company_with_members(company.id).await.unwrap();
        assert_eq!(after.members.len(), 1);
    }

    #[tokio::test]
    async fn removing_a_member_updates_the_user_document() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;
        let invitation = store
            .create_invitation(invite(company.id, "guest@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        let member = store.accept_invitation(invitation.id, "u-guest").await.unwrap();

        store.remove_member(member.id, company.id, "u-guest").await.unwrap();
        assert!(store.user_companies("u-guest").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn member_events_reach_company_subscribers() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;
        let mut sub = store.subscribe_company(company.id).await.unwrap();

        let invitation = store
            .create_invitation(invite(company.id, "guest@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        match sub.next().await {
            Some(StoreEvent::InvitationsChanged(id)) => assert_eq!(id, company.id),
            other => panic!("unexpected event {other:?}"),
        }

        store.accept_invitation(invitation.id, "u-guest").await.unwrap();
        assert!(sub.next().await.is_some());
    }

    #[tokio::test]
    async fn membership_subscription_filters_other_users() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;
        let mut sub = store.subscribe_membership(company.id, "u-guest").await.unwrap();

        let invitation = store
            .create_invitation(invite(company.id, "guest@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        store.accept_invitation(invitation.id, "u-guest").await.unwrap();

        match sub.next().await {
            Some(StoreEvent::MembershipChanged { user_id, .. }) => assert_eq!(user_id, "u-guest"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn offline_store_fails_every_operation() {
        let (store, company) = store_with_owner().await;
        store.set_offline(true);
        assert!(matches!(
            store.user_companies("u-owner").await.unwrap_err(),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store.company_with_members(company.id).await.unwrap_err(),
            StoreError::Unavailable(_)
        ));

        store.set_offline(false);
        assert!(store.user_companies("u-owner").await.is_ok());
    }

    #[tokio::test]
    async fn update_member_role_rewrites_the_grant_list() {
        let (store, company) = store_with_owner().await;
        store.upsert_user(user("u-guest", "guest@x.com", "Mert")).await;
        let invitation = store
            .create_invitation(invite(company.id, "guest@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();
        let member = store.accept_invitation(invitation.id, "u-guest").await.unwrap();

        let updated = store
            .update_member_role(
                member.id,
                "accountant",
                "Finans Yöneticisi",
                vec!["payments:approve".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(updated.role_id, "accountant");
        assert_eq!(updated.permissions, vec!["payments:approve"]);
    }

    #[tokio::test]
    async fn rejecting_an_invitation_closes_it() {
        let (store, company) = store_with_owner().await;
        let invitation = store
            .create_invitation(invite(company.id, "new@x.com", 7), "u-owner", "Deniz", &company.name)
            .await
            .unwrap();

        store.reject_invitation(invitation.id).await.unwrap();
        let view = store.company_with_members(company.id).await.unwrap();
        assert_eq!(view.invitations[0].status, InvitationStatus::Cancelled);
        assert!(matches!(
            store.accept_invitation(invitation.id, "u-owner").await.unwrap_err(),
            StoreError::Precondition(_)
        ));
    }

    #[tokio::test]
    async fn company_update_and_delete() {
        let (store, company) = store_with_owner().await;

        let patch = CompanyPatch {
            name: Some("Deniz Etkinlik".to_string()),
            ..CompanyPatch::default()
        };
        let updated = store.update_company(company.id, patch).await.unwrap();
        assert_eq!(updated.name, "Deniz Etkinlik");
        assert!(updated.updated_at >= company.updated_at);

        store.delete_company(company.id).await.unwrap();
        assert!(store.user_companies("u-owner").await.unwrap().is_empty());
        assert!(matches!(
            store.company_with_members(company.id).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn company_view_is_profile_enriched() {
        let store = MemoryStore::new();
        let mut provider = user("u-prov", "prov@x.com", "Ada");
        provider.org_type = Some(OrganizationType::Provider);
        provider.category = Some(ProviderCategory::Technical);
        store.upsert_user(provider).await;

        let company = store.migrate_user_to_company("u-prov").await.unwrap();
        assert_eq!(company.category, Some(ProviderCategory::Technical));

        let view = store.company_with_members(company.id).await.unwrap();
        let record = &view.members[0];
        assert_eq!(record.profile.as_ref().unwrap().email, "prov@x.com");
    }
}
