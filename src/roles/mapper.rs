//! Bridges the persisted company-role taxonomy and the RBAC catalog.
//!
//! Membership documents store company roles; in-app permission checks are
//! expressed in RBAC-catalog terms. The forward mapping is total: whatever the
//! input, a usable catalog role comes back.
//!
//! Resolution order:
//! 1. exact, case-insensitive label match inside the partition — documents
//!    written by this crate carry the resolved RBAC label in `role_name`, so a
//!    label hit is authoritative;
//! 2. the enumerated mapping table below (covers the full company-role ×
//!    organization-type matrix, asserted by test);
//! 3. legacy substring heuristic against catalog role ids, kept only as a
//!    last resort for records written before the table existed;
//! 4. the partition's first role.

use log::debug;

use super::catalog::{role_by_id, roles_for_organization};
use super::company::{default_company_role, CompanyRole};
use super::{OrganizationType, ProviderCategory, Role};

/// Enumerated company-role → RBAC-role mapping. Provider targets depend on the
/// vertical, so entries are resolved against the partition prefix.
fn table_target(
    company_role_id: &str,
    org_type: OrganizationType,
    category: Option<ProviderCategory>,
) -> Option<String> {
    match org_type {
        OrganizationType::Organizer => match company_role_id {
            "owner" => Some("org_owner".to_string()),
            "manager" => Some("org_admin".to_string()),
            "accountant" => Some("org_finance".to_string()),
            "team_member" => Some("org_assistant".to_string()),
            _ => None,
        },
        OrganizationType::Provider => {
            let prefix = category.unwrap_or(ProviderCategory::Booking).role_prefix();
            match company_role_id {
                "owner" => Some(format!("{prefix}_owner")),
                "manager" => Some(format!("{prefix}_manager")),
                "accountant" => Some(format!("{prefix}_finance")),
                "team_member" => Some(format!("{prefix}_staff")),
                _ => None,
            }
        }
    }
}

/// Resolve a persisted company role to an RBAC catalog role. Total: never
/// fails, never returns an absent role.
pub fn map_company_role(
    company_role_id: &str,
    company_role_name: &str,
    org_type: OrganizationType,
    category: Option<ProviderCategory>,
) -> &'static Role {
    let partition = roles_for_organization(org_type, category);

    if !company_role_name.is_empty() {
        if let Some(found) = partition
            .iter()
            .find(|r| r.label.eq_ignore_ascii_case(company_role_name))
        {
            return found;
        }
    }

    if let Some(target) = table_target(company_role_id, org_type, category) {
        if let Some(found) = role_by_id(&target) {
            return found;
        }
    }

    // Last-resort heuristic for pre-table records: does any catalog id in the
    // partition contain the company-role id? Catalog order breaks ties.
    if !company_role_id.is_empty() {
        if let Some(found) = partition.iter().find(|r| r.id.contains(company_role_id)) {
            debug!(
                "role mapping fell back to substring match: {} -> {}",
                company_role_id, found.id
            );
            return found;
        }
    }

    debug!(
        "unresolvable company role ({company_role_id}, {company_role_name}), using partition fallback"
    );
    &partition[0]
}

/// Reverse direction, used when writing membership documents: pick the company
/// role a catalog role id degrades to.
pub fn company_role_for(rbac_role_id: &str) -> &'static CompanyRole {
    let target = if rbac_role_id.contains("owner") {
        "owner"
    } else if rbac_role_id.contains("admin") || rbac_role_id.contains("manager") {
        "manager"
    } else if rbac_role_id.contains("finance") || rbac_role_id.contains("accountant") {
        "accountant"
    } else {
        return default_company_role();
    };
    super::company::company_role_by_id(target).unwrap_or_else(default_company_role)
}
