//! Runtime configuration.
//!
//! The role catalogs are compile-time constants; the only tunables are the
//! invitation expiry policy and the temporary-organization placeholder.

use serde::Deserialize;
use std::env;

use dotenvy::dotenv;

#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Days until a freshly issued (or re-issued) invitation expires.
    pub invitation_expiry_days: i64,
    /// Synthesize a client-only organization while migration is in flight.
    pub temporary_org_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            invitation_expiry_days: 7,
            temporary_org_enabled: true,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `CREWCORE_`-prefixed environment variables.
    pub fn load() -> anyhow::Result<Self> {
        dotenv().ok();
        let mut config = Self::default();
        if let Ok(days) = env::var("CREWCORE_INVITATION_EXPIRY_DAYS") {
            config.invitation_expiry_days = days.parse()?;
        }
        if let Ok(enabled) = env::var("CREWCORE_TEMPORARY_ORG") {
            config.temporary_org_enabled = enabled.parse()?;
        }
        if config.invitation_expiry_days < 1 {
            anyhow::bail!("invitation expiry must be at least one day");
        }
        Ok(config)
    }
}
