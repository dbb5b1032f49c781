//! Company role catalog.
//!
//! The persistence layer predates the RBAC catalog unification and stores a
//! smaller, flat role taxonomy on membership documents. The two catalogs are
//! bridged by [`super::mapper`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRole {
    pub id: String,
    pub label: String,
    pub description: String,
    pub is_default: bool,
}

fn company_role(id: &str, label: &str, description: &str, is_default: bool) -> CompanyRole {
    CompanyRole {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        is_default,
    }
}

static COMPANY_ROLES: Lazy<Vec<CompanyRole>> = Lazy::new(|| {
    vec![
        company_role("owner", "Şirket Sahibi", "Tüm yetkiler", false),
        company_role("manager", "Yönetici", "Ekip ve operasyon yönetimi", false),
        company_role("team_member", "Ekip Üyesi", "Standart ekip üyesi", true),
        company_role("accountant", "Muhasebeci", "Finansal işlemler", false),
    ]
});

pub fn company_roles() -> &'static [CompanyRole] {
    &COMPANY_ROLES
}

pub fn company_role_by_id(id: &str) -> Option<&'static CompanyRole> {
    COMPANY_ROLES.iter().find(|r| r.id == id)
}

/// The catalog default, assigned when no explicit company role applies.
pub fn default_company_role() -> &'static CompanyRole {
    COMPANY_ROLES
        .iter()
        .find(|r| r.is_default)
        .unwrap_or(&COMPANY_ROLES[COMPANY_ROLES.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_carries_the_four_company_roles() {
        let ids: Vec<&str> = company_roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["owner", "manager", "team_member", "accountant"]);
    }

    #[test]
    fn team_member_is_the_single_default() {
        let defaults: Vec<&CompanyRole> =
            company_roles().iter().filter(|r| r.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, "team_member");
        assert_eq!(default_company_role().id, "team_member");
    }

    #[test]
    fn lookup_by_id_round_trips() {
        for r in company_roles() {
            assert_eq!(company_role_by_id(&r.id), Some(r));
        }
        assert!(company_role_by_id("superuser").is_none());
    }
}
