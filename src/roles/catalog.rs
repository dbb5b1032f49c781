//! Static RBAC role catalog, partitioned by organization type and provider
//! vertical.
//!
//! Owner roles carry the full grant over every resource; nothing else in the
//! crate special-cases owners for permission decisions.

use once_cell::sync::Lazy;

use super::{Action, OrganizationType, Permission, ProviderCategory, Resource, Role};

fn perm(resource: Resource, actions: &[Action]) -> Permission {
    Permission::new(resource, actions)
}

fn full_grant() -> Vec<Permission> {
    Resource::ALL
        .iter()
        .map(|r| perm(*r, &Action::ALL))
        .collect()
}

fn role(
    id: &str,
    label: &str,
    description: &str,
    category: Option<ProviderCategory>,
    permissions: Vec<Permission>,
    is_default: bool,
) -> Role {
    Role {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        category,
        permissions,
        is_default,
    }
}

static ORGANIZER_ROLES: Lazy<Vec<Role>> = Lazy::new(|| {
    vec![
        role(
            "org_owner",
            "Şirket Sahibi",
            "Organizasyon şirketinin sahibi, tüm yetkilere sahiptir",
            None,
            full_grant(),
            false,
        ),
        role(
            "org_admin",
            "Yönetici",
            "Ekip ve operasyon yönetimi",
            None,
            vec![
                perm(Resource::Team, &[Action::View, Action::Create, Action::Edit, Action::Delete]),
                perm(Resource::Events, &Action::ALL),
                perm(Resource::Offers, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
                perm(Resource::Contracts, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
                perm(Resource::Payments, &[Action::View, Action::Approve]),
                perm(Resource::Invoices, &[Action::View, Action::Create, Action::Edit]),
                perm(Resource::Settings, &[Action::View, Action::Edit]),
                perm(Resource::Tasks, &Action::ALL),
            ],
            false,
        ),
        role(
            "org_coordinator",
            "Etkinlik Koordinatörü",
            "Etkinlik planlama ve tedarikçi koordinasyonu",
            None,
            vec![
                perm(Resource::Team, &[Action::View]),
                perm(Resource::Events, &[Action::View, Action::Create, Action::Edit]),
                perm(Resource::Offers, &[Action::View, Action::Create, Action::Edit]),
                perm(Resource::Contracts, &[Action::View]),
                perm(Resource::Tasks, &[Action::View, Action::Create, Action::Edit]),
            ],
            false,
        ),
        role(
            "org_finance",
            "Finans Yöneticisi",
            "Ödeme, fatura ve sözleşme onayları",
            None,
            vec![
                perm(Resource::Offers, &[Action::View]),
                perm(Resource::Contracts, &[Action::View, Action::Approve]),
                perm(Resource::Payments, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
                perm(Resource::Invoices, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
            ],
            false,
        ),
        role(
            "org_assistant",
            "Asistan",
            "Görüntüleme ve görev takibi",
            None,
            vec![
                perm(Resource::Team, &[Action::View]),
                perm(Resource::Events, &[Action::View]),
                perm(Resource::Offers, &[Action::View]),
                perm(Resource::Tasks, &[Action::View, Action::Edit]),
            ],
            true,
        ),
    ]
});

/// Shared shape of every provider partition: owner (full grant), manager,
/// finance and a default staff role. Labels are flavored per vertical.
fn provider_partition(
    category: ProviderCategory,
    owner_label: &str,
    manager_label: &str,
    staff_label: &str,
) -> Vec<Role> {
    let p = category.role_prefix();
    vec![
        role(
            &format!("{p}_owner"),
            owner_label,
            "Firma sahibi, tüm yetkilere sahiptir",
            Some(category),
            full_grant(),
            false,
        ),
        role(
            &format!("{p}_manager"),
            manager_label,
            "Operasyon ve ekip yönetimi",
            Some(category),
            vec![
                perm(Resource::Team, &[Action::View, Action::Create, Action::Edit]),
                perm(Resource::Events, &[Action::View, Action::Create, Action::Edit]),
                perm(Resource::Offers, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
                perm(Resource::Contracts, &[Action::View, Action::Create, Action::Edit]),
                perm(Resource::Payments, &[Action::View]),
                perm(Resource::Settings, &[Action::View, Action::Edit]),
                perm(Resource::Tasks, &Action::ALL),
            ],
            false,
        ),
        role(
            &format!("{p}_finance"),
            "Finans Sorumlusu",
            "Ödeme ve fatura yönetimi",
            Some(category),
            vec![
                perm(Resource::Offers, &[Action::View]),
                perm(Resource::Contracts, &[Action::View, Action::Approve]),
                perm(Resource::Payments, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
                perm(Resource::Invoices, &[Action::View, Action::Create, Action::Edit, Action::Approve]),
            ],
            false,
        ),
        role(
            &format!("{p}_staff"),
            staff_label,
            "Saha operasyonu ve görev takibi",
            Some(category),
            vec![
                perm(Resource::Events, &[Action::View]),
                perm(Resource::Offers, &[Action::View]),
                perm(Resource::Tasks, &[Action::View, Action::Edit]),
            ],
            true,
        ),
    ]
}

static BOOKING_ROLES: Lazy<Vec<Role>> = Lazy::new(|| {
    provider_partition(
        ProviderCategory::Booking,
        "Ajans Sahibi",
        "Ajans Yöneticisi",
        "Rezervasyon Temsilcisi",
    )
});

static TECHNICAL_ROLES: Lazy<Vec<Role>> = Lazy::new(|| {
    provider_partition(
        ProviderCategory::Technical,
        "Firma Sahibi",
        "Operasyon Yöneticisi",
        "Teknik Operatör",
    )
});

static VENUE_ROLES: Lazy<Vec<Role>> = Lazy::new(|| {
    provider_partition(
        ProviderCategory::Venue,
        "Mekan Sahibi",
        "Mekan Müdürü",
        "Mekan Görevlisi",
    )
});

static CATERING_ROLES: Lazy<Vec<Role>> = Lazy::new(|| {
    provider_partition(
        ProviderCategory::Catering,
        "İşletme Sahibi",
        "Operasyon Şefi",
        "Servis Görevlisi",
    )
});

static TRANSPORT_ROLES: Lazy<Vec<Role>> = Lazy::new(|| {
    provider_partition(
        ProviderCategory::Transport,
        "Firma Sahibi",
        "Filo Yöneticisi",
        "Sürücü",
    )
});

/// Roles available to an organization, in catalog order. The order is
/// authoritative: the mapper uses it for tie-breaks and the first entry is the
/// last-resort fallback role.
///
/// A provider without a category falls back to the booking partition.
pub fn roles_for_organization(
    org_type: OrganizationType,
    category: Option<ProviderCategory>,
) -> &'static [Role] {
    match org_type {
        OrganizationType::Organizer => &ORGANIZER_ROLES,
        OrganizationType::Provider => match category.unwrap_or(ProviderCategory::Booking) {
            ProviderCategory::Booking => &BOOKING_ROLES,
            ProviderCategory::Technical => &TECHNICAL_ROLES,
            ProviderCategory::Venue => &VENUE_ROLES,
            ProviderCategory::Catering => &CATERING_ROLES,
            ProviderCategory::Transport => &TRANSPORT_ROLES,
        },
    }
}

/// Look up a role by id across every partition. Callers handle absence
/// explicitly; this never panics.
pub fn role_by_id(id: &str) -> Option<&'static Role> {
    let mut partitions: Vec<&'static [Role]> = vec![&ORGANIZER_ROLES];
    for category in ProviderCategory::ALL {
        partitions.push(roles_for_organization(
            OrganizationType::Provider,
            Some(category),
        ));
    }
    partitions
        .into_iter()
        .flat_map(|p| p.iter())
        .find(|r| r.id == id)
}

/// The partition's flagged default role, or its last entry if none is flagged.
/// Partitions are non-empty by construction.
pub fn default_role(
    org_type: OrganizationType,
    category: Option<ProviderCategory>,
) -> &'static Role {
    let roles = roles_for_organization(org_type, category);
    roles
        .iter()
        .find(|r| r.is_default)
        .unwrap_or(&roles[roles.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_partitions() -> Vec<(&'static str, &'static [Role])> {
        let mut out = vec![(
            "organizer",
            roles_for_organization(OrganizationType::Organizer, None),
        )];
        for category in ProviderCategory::ALL {
            out.push((
                category.as_str(),
                roles_for_organization(OrganizationType::Provider, Some(category)),
            ));
        }
        out
    }

    #[test]
    fn organizer_partition_matches_shipped_set() {
        let roles = roles_for_organization(OrganizationType::Organizer, None);
        assert_eq!(roles.len(), 5);

        let admin = roles.iter().find(|r| r.id == "org_admin").unwrap();
        assert!(!admin.is_default);

        let assistant = roles.iter().find(|r| r.id == "org_assistant").unwrap();
        assert!(assistant.is_default);
    }

    #[test]
    fn every_role_round_trips_through_role_by_id() {
        for (_, roles) in all_partitions() {
            for r in roles {
                assert_eq!(role_by_id(&r.id), Some(r), "round-trip failed for {}", r.id);
            }
        }
    }

    #[test]
    fn exactly_one_default_per_partition() {
        for (name, roles) in all_partitions() {
            let defaults = roles.iter().filter(|r| r.is_default).count();
            assert_eq!(defaults, 1, "partition {name} has {defaults} defaults");
        }
    }

    #[test]
    fn owner_roles_carry_the_full_grant() {
        for (name, roles) in all_partitions() {
            let owner = roles
                .iter()
                .find(|r| r.id.ends_with("_owner"))
                .unwrap_or_else(|| panic!("partition {name} has no owner role"));
            for resource in Resource::ALL {
                for action in Action::ALL {
                    assert!(
                        owner.grants(resource, action),
                        "{} missing {}:{}",
                        owner.id,
                        resource.as_str(),
                        action.as_str()
                    );
                }
            }
        }
    }

    #[test]
    fn default_role_returns_the_flagged_default() {
        assert_eq!(default_role(OrganizationType::Organizer, None).id, "org_assistant");
        assert_eq!(
            default_role(OrganizationType::Provider, Some(ProviderCategory::Transport)).id,
            "transport_staff"
        );
        // Uncategorized providers fall back to the booking partition.
        assert_eq!(default_role(OrganizationType::Provider, None).id, "booking_staff");
    }

    #[test]
    fn role_ids_are_globally_unique() {
        let mut seen = std::collections::HashSet::new();
        for (_, roles) in all_partitions() {
            for r in roles {
                assert!(seen.insert(r.id.clone()), "duplicate role id {}", r.id);
            }
        }
    }
}
