//! Top-level platform configuration.
//!
//! Every table and key is optional; missing values take the defaults below.

use serde::{Deserialize, Serialize};

use crate::loading::LoadingDefaults;

/// Consent persistence settings, the `[consent]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Validity of a decision that enables any optional category
    pub long_expiry_days: i64,
    /// Validity of an essential-only decision
    pub short_expiry_days: i64,
    pub preferences_key: String,
    pub expiry_key: String,
    /// Path attribute on application cookie writes
    pub cookie_path: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            long_expiry_days: 365,
            short_expiry_days: 30,
            preferences_key: "cookie_preferences".to_string(),
            expiry_key: "cookie_consent_expiry".to_string(),
            cookie_path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub loading: LoadingDefaults,
    pub consent: ConsentConfig,
}
