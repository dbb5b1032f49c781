//! RBAC and company-membership core for the event services marketplace.
//!
//! The crate models organizations ("companies"), their members, the
//! role-to-permission mappings and the invitation lifecycle that onboards new
//! members. Persistence, identity and notification delivery are external
//! collaborators consumed through the [`store::MembershipStore`] trait.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use crewcore::config::CoreConfig;
//! use crewcore::org::{AuthUser, OrganizationService};
//! use crewcore::store::memory::MemoryStore;
//!
//! # async fn wire() -> Result<(), crewcore::org::OrgError> {
//! let store = Arc::new(MemoryStore::new());
//! let user = AuthUser {
//!     id: "user-1".into(),
//!     email: "owner@example.com".into(),
//!     display_name: "Deniz".into(),
//!     avatar_url: None,
//!     phone: None,
//!     company_name: Some("Deniz Organizasyon".into()),
//!     org_type: None,
//!     category: None,
//! };
//! let service = OrganizationService::new(store, user, CoreConfig::default());
//! service.initialize().await?;
//! let can_invite = service.permissions().await.can_invite_members();
//! # let _ = can_invite;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod org;
pub mod permissions;
pub mod roles;
pub mod store;

pub use config::CoreConfig;
pub use org::{AuthUser, OrgError, Organization, OrganizationService, SessionPhase, TeamMember};
pub use permissions::PermissionFacade;
pub use roles::{Action, OrganizationType, Permission, ProviderCategory, Resource, Role};
pub use store::{MembershipStore, StoreError};
