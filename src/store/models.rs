//! Persisted document shapes.
//!
//! These mirror the backing document-store collections (companies,
//! company_members, company_invitations, users). They are the source of truth;
//! the read models in [`crate::org::snapshot`] are derived projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::{OrganizationType, ProviderCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Pending,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Cancelled,
}

impl InvitationStatus {
    /// Accepted, expired and cancelled are terminal: no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDoc {
    pub id: Uuid,
    pub name: String,
    pub org_type: OrganizationType,
    pub category: Option<ProviderCategory>,
    pub owner_user_id: String,
    pub settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMemberDoc {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: String,
    /// Company-role catalog id; resolved to an RBAC role via the mapper.
    pub role_id: String,
    pub role_name: String,
    /// Derived "resource:action" grant list, denormalized for backend rules.
    pub permissions: Vec<String>,
    pub status: MemberStatus,
    pub invited_by: Option<String>,
    pub invited_at: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInvitationDoc {
    pub id: Uuid,
    pub company_id: Uuid,
    /// Denormalized so invitation notices render without a company fetch.
    pub company_name: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role_id: String,
    pub role_name: String,
    pub inviter_id: String,
    pub inviter_name: String,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CompanyInvitationDoc {
    /// Expiry is judged against wall-clock time at the point of use; the
    /// stored status field may lag (lazy expiry).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.status == InvitationStatus::Pending && self.is_expired(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }
}

/// User profile document, read for enrichment and legacy-migration fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    /// Legacy single-user-account fields consumed by the migration routine.
    pub company_name: Option<String>,
    pub org_type: Option<OrganizationType>,
    pub category: Option<ProviderCategory>,
    pub company_ids: Vec<Uuid>,
    pub primary_company_id: Option<Uuid>,
    pub last_active: Option<DateTime<Utc>>,
}

/// A member document joined with its user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member: CompanyMemberDoc,
    pub profile: Option<UserDoc>,
}

/// Joined company view: the company with its member and invitation
/// sub-collections resolved in one read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyView {
    pub company: CompanyDoc,
    pub members: Vec<MemberRecord>,
    pub invitations: Vec<CompanyInvitationDoc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub org_type: OrganizationType,
    pub category: Option<ProviderCategory>,
    pub owner_user_id: String,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub category: Option<ProviderCategory>,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct InviteParams {
    pub company_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Company-role catalog id persisted on the invitation.
    pub company_role_id: String,
    /// Resolved RBAC role label; authoritative for later role resolution.
    pub role_name: String,
    pub message: Option<String>,
    pub expires_in_days: i64,
}
