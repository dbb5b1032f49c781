//! Read models derived from persisted documents.
//!
//! An [`Organization`] is rebuilt fresh on every refresh from the joined
//! company view; it is never persisted as one document. Roles are resolved
//! through the mapper, so a team member's role is always present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::{mapper, OrganizationType, ProviderCategory, Role};
use crate::store::models::{CompanyView, InvitationStatus, MemberStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub status: MemberStatus,
    pub invited_by: Option<String>,
    pub invited_at: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub inviter_id: String,
    pub inviter_name: String,
    pub invited_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Effective status: lazy expiry already applied against wall-clock time.
    pub status: InvitationStatus,
    pub token: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub org_type: OrganizationType,
    pub category: Option<ProviderCategory>,
    pub owner_user_id: String,
    pub members: Vec<TeamMember>,
    pub invitations: Vec<Invitation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Client-only placeholder synthesized while migration is in flight.
    /// Never authoritative for decisions that gate destructive operations.
    pub temporary: bool,
}

impl Organization {
    pub fn member_by_id(&self, member_id: Uuid) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn member_for_user(&self, user_id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

/// Build the aggregate from a joined company view.
pub fn build_organization(view: &CompanyView) -> Organization {
    let now = Utc::now();
    let company = &view.company;

    let members = view
        .members
        .iter()
        .map(|record| {
            let m = &record.member;
            let role = mapper::map_company_role(
                &m.role_id,
                &m.role_name,
                company.org_type,
                company.category,
            );
            let profile = record.profile.as_ref();
            TeamMember {
                id: m.id,
                user_id: m.user_id.clone(),
                email: profile.map(|p| p.email.clone()).unwrap_or_default(),
                display_name: profile
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| m.user_id.clone()),
                avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                phone: profile.and_then(|p| p.phone.clone()),
                role: role.clone(),
                status: m.status,
                invited_by: m.invited_by.clone(),
                invited_at: m.invited_at,
                joined_at: m.joined_at,
                last_active: profile.and_then(|p| p.last_active),
            }
        })
        .collect();

    // Only invitations still effectively pending belong on the aggregate.
    let invitations = view
        .invitations
        .iter()
        .filter(|i| i.effective_status(now) == InvitationStatus::Pending)
        .map(|i| {
            let role = mapper::map_company_role(
                &i.role_id,
                &i.role_name,
                company.org_type,
                company.category,
            );
            Invitation {
                id: i.id,
                email: i.email.clone(),
                name: i.name.clone(),
                role: role.clone(),
                inviter_id: i.inviter_id.clone(),
                inviter_name: i.inviter_name.clone(),
                invited_at: i.created_at,
                expires_at: i.expires_at,
                status: i.effective_status(now),
                token: i.token.clone(),
                message: i.message.clone(),
            }
        })
        .collect();

    Organization {
        id: company.id,
        name: company.name.clone(),
        org_type: company.org_type,
        category: company.category,
        owner_user_id: company.owner_user_id.clone(),
        members,
        invitations,
        created_at: company.created_at,
        updated_at: company.updated_at,
        temporary: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{
        CompanyDoc, CompanyInvitationDoc, CompanyMemberDoc, MemberRecord, UserDoc,
    };
    use chrono::Duration;

    fn view() -> CompanyView {
        let now = Utc::now();
        let company_id = Uuid::new_v4();
        let company = CompanyDoc {
            id: company_id,
            name: "Deniz Organizasyon".into(),
            org_type: OrganizationType::Organizer,
            category: None,
            owner_user_id: "u-owner".into(),
            settings: None,
            created_at: now,
            updated_at: now,
        };
        let member = CompanyMemberDoc {
            id: Uuid::new_v4(),
            company_id,
            user_id: "u-owner".into(),
            role_id: "owner".into(),
            role_name: "Şirket Sahibi".into(),
            permissions: vec![],
            status: MemberStatus::Active,
            invited_by: None,
            invited_at: None,
            joined_at: Some(now),
        };
        let profile = UserDoc {
            id: "u-owner".into(),
            email: "owner@x.com".into(),
            display_name: "Deniz".into(),
            avatar_url: Some("https://cdn.x.com/deniz.png".into()),
            phone: None,
            company_name: None,
            org_type: None,
            category: None,
            company_ids: vec![company_id],
            primary_company_id: Some(company_id),
            last_active: Some(now),
        };
        let pending = CompanyInvitationDoc {
            id: Uuid::new_v4(),
            company_id,
            company_name: "Deniz Organizasyon".into(),
            email: "new@x.com".into(),
            name: None,
            phone: None,
            role_id: "team_member".into(),
            role_name: "Etkinlik Koordinatörü".into(),
            inviter_id: "u-owner".into(),
            inviter_name: "Deniz".into(),
            message: None,
            status: InvitationStatus::Pending,
            token: "tok-1".into(),
            created_at: now,
            expires_at: now + Duration::days(7),
        };
        let stale = CompanyInvitationDoc {
            id: Uuid::new_v4(),
            email: "old@x.com".into(),
            token: "tok-2".into(),
            created_at: now - Duration::days(10),
            expires_at: now - Duration::days(3),
            ..pending.clone()
        };
        CompanyView {
            company,
            members: vec![MemberRecord {
                member,
                profile: Some(profile),
            }],
            invitations: vec![pending, stale],
        }
    }

    #[test]
    fn members_are_profile_enriched_with_resolved_roles() {
        let org = build_organization(&view());
        let owner = org.member_for_user("u-owner").unwrap();
        assert_eq!(owner.email, "owner@x.com");
        assert_eq!(owner.display_name, "Deniz");
        assert_eq!(owner.role.id, "org_owner");
        assert!(!org.temporary);
    }

    #[test]
    fn lazily_expired_invitations_are_dropped_from_the_aggregate() {
        let org = build_organization(&view());
        assert_eq!(org.invitations.len(), 1);
        assert_eq!(org.invitations[0].email, "new@x.com");
        assert_eq!(org.invitations[0].role.id, "org_coordinator");
        assert_eq!(org.invitations[0].status, InvitationStatus::Pending);
    }

    #[test]
    fn missing_profile_degrades_to_user_id() {
        let mut v = view();
        v.members[0].profile = None;
        let org = build_organization(&v);
        let owner = &org.members[0];
        assert_eq!(owner.display_name, "u-owner");
        assert_eq!(owner.email, "");
        // Role resolution does not depend on the profile.
        assert_eq!(owner.role.id, "org_owner");
    }
}
