//! Cookie consent store.
//!
//! Two keys are persisted: the JSON preferences record and an RFC 3339
//! expiry timestamp. A read that finds missing, malformed or expired data
//! falls back to the essential-only defaults and purges what it found, so a
//! stale decision always leads back to `NoDecision` and a fresh prompt.

use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};
use nightfall_types::{ConsentConfig, CookieCategory, CookiePreferences, PreferenceUpdate};
use serde_json::Value;

use super::clock::Clock;
use super::storage::KeyValueStore;
use crate::error::{Outcome, Recovery, StorageError};

/// Where the consent lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    NoDecision,
    Decided { expires_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordRead {
    Valid(CookiePreferences),
    Missing,
    Corrupt(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpiryRead {
    Valid(DateTime<Utc>),
    Missing,
    Passed,
    Unparseable,
}

/// Parse a stored preferences record.
///
/// Unknown keys are ignored; a record needs at least one recognised category
/// field with a boolean value. `essential` is forced on.
pub(crate) fn parse_record(raw: &str) -> RecordRead {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return RecordRead::Corrupt("not JSON");
    };
    if !value.is_object() {
        return RecordRead::Corrupt("not an object");
    }
    let last_updated = value
        .get("lastUpdated")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    let Ok(fields) = serde_json::from_value::<PreferenceUpdate>(value) else {
        return RecordRead::Corrupt("unexpected field types");
    };
    if fields.field_count() == 0 {
        return RecordRead::Corrupt("no recognised fields");
    }

    let mut preferences = CookiePreferences::default();
    preferences.apply(&fields);
    preferences.last_updated = last_updated;
    RecordRead::Valid(preferences)
}

#[derive(Clone)]
pub struct ConsentStore {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    config: ConsentConfig,
}

impl std::fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConsentStore {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, config: ConsentConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ConsentConfig {
        &self.config
    }

    // --- Reads ---

    /// Current preferences plus how they were obtained.
    pub fn load_preferences(&self) -> Outcome<CookiePreferences> {
        let record = match self.read_record() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cookie preferences, using defaults");
                return Outcome::failed(CookiePreferences::default(), e);
            }
        };

        match record {
            RecordRead::Missing => {
                Outcome::recovered(CookiePreferences::default(), Recovery::Missing)
            }
            RecordRead::Corrupt(reason) => {
                tracing::warn!(reason, "Discarding corrupt cookie preferences");
                self.purge();
                Outcome::recovered(CookiePreferences::default(), Recovery::Corrupt)
            }
            RecordRead::Valid(preferences) => match self.read_expiry() {
                Ok(ExpiryRead::Valid(_)) => Outcome::ok(preferences),
                Ok(_) => {
                    tracing::info!("Cookie consent expired, clearing stored decision");
                    self.purge();
                    Outcome::recovered(CookiePreferences::default(), Recovery::Expired)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read consent expiry, using defaults");
                    Outcome::failed(CookiePreferences::default(), e)
                }
            },
        }
    }

    pub fn get_preferences(&self) -> CookiePreferences {
        self.load_preferences().into_value()
    }

    pub fn is_category_allowed(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Essential => true,
            other => self.get_preferences().allows(other),
        }
    }

    /// True when no valid, future expiry is stored. Unparseable expiries are
    /// removed; past expiries clear the whole decision.
    pub fn has_consent_expired(&self) -> bool {
        match self.read_expiry() {
            Ok(ExpiryRead::Valid(_)) => false,
            Ok(ExpiryRead::Missing) => true,
            Ok(ExpiryRead::Unparseable) => {
                tracing::warn!("Discarding unparseable consent expiry");
                self.remove_key(&self.config.expiry_key);
                true
            }
            Ok(ExpiryRead::Passed) => {
                self.purge();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read consent expiry");
                true
            }
        }
    }

    pub fn consent_state(&self) -> ConsentState {
        let expires_at = match self.read_expiry() {
            Ok(ExpiryRead::Valid(expires_at)) => expires_at,
            Ok(ExpiryRead::Missing) | Err(_) => return ConsentState::NoDecision,
            Ok(ExpiryRead::Passed | ExpiryRead::Unparseable) => {
                self.purge();
                return ConsentState::NoDecision;
            }
        };

        match self.read_record() {
            Ok(RecordRead::Valid(_)) => ConsentState::Decided { expires_at },
            Ok(RecordRead::Missing | RecordRead::Corrupt(_)) => {
                self.purge();
                ConsentState::NoDecision
            }
            Err(_) => ConsentState::NoDecision,
        }
    }

    /// True only for a valid, unexpired decision.
    pub fn has_consent_choice(&self) -> bool {
        matches!(self.consent_state(), ConsentState::Decided { .. })
    }

    // --- Mutations ---

    pub fn accept_all_cookies(&self) -> Outcome<CookiePreferences> {
        self.save(CookiePreferences::all_accepted())
    }

    pub fn accept_essential_only(&self) -> Outcome<CookiePreferences> {
        self.save(CookiePreferences::default())
    }

    /// Merge `update` over the current preferences. The expiry window follows
    /// the resulting state, not the call.
    pub fn update_preferences(&self, update: &PreferenceUpdate) -> Outcome<CookiePreferences> {
        let mut preferences = self.get_preferences();
        preferences.apply(update);
        self.save(preferences)
    }

    /// Forget the decision entirely.
    pub fn reset_consent(&self) -> Outcome<()> {
        match self.try_purge() {
            Ok(()) => Outcome::ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reset cookie consent");
                Outcome::failed((), e)
            }
        }
    }

    fn save(&self, mut preferences: CookiePreferences) -> Outcome<CookiePreferences> {
        let now = self.clock.now();
        preferences.essential = true;
        preferences.last_updated = Some(now);

        let days = if preferences.any_optional() {
            self.config.long_expiry_days
        } else {
            self.config.short_expiry_days
        };
        let window = TimeDelta::try_days(days.max(0)).unwrap_or_else(TimeDelta::zero);
        let expires_at = now.checked_add_signed(window).unwrap_or(now);

        match self.persist(&preferences, expires_at) {
            Ok(()) => {
                tracing::debug!(
                    %expires_at,
                    optional = preferences.any_optional(),
                    "Saved cookie preferences"
                );
                Outcome::ok(preferences)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist cookie preferences");
                Outcome::failed(preferences, e)
            }
        }
    }

    // --- Storage ---

    fn persist(
        &self,
        preferences: &CookiePreferences,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(preferences)?;
        self.store.set(&self.config.preferences_key, &json)?;
        self.store.set(&self.config.expiry_key, &expires_at.to_rfc3339())?;
        Ok(())
    }

    fn read_record(&self) -> Result<RecordRead, StorageError> {
        match self.store.get(&self.config.preferences_key)? {
            Some(raw) => Ok(parse_record(&raw)),
            None => Ok(RecordRead::Missing),
        }
    }

    fn read_expiry(&self) -> Result<ExpiryRead, StorageError> {
        let Some(raw) = self.store.get(&self.config.expiry_key)? else {
            return Ok(ExpiryRead::Missing);
        };
        let Ok(parsed) = DateTime::parse_from_rfc3339(raw.trim()) else {
            return Ok(ExpiryRead::Unparseable);
        };
        let expires_at = parsed.with_timezone(&Utc);
        if expires_at < self.clock.now() {
            Ok(ExpiryRead::Passed)
        } else {
            Ok(ExpiryRead::Valid(expires_at))
        }
    }

    fn try_purge(&self) -> Result<(), StorageError> {
        let first = self.store.remove(&self.config.preferences_key);
        let second = self.store.remove(&self.config.expiry_key);
        first.and(second)
    }

    fn purge(&self) {
        if let Err(e) = self.try_purge() {
            tracing::warn!(error = %e, "Failed to clear stored consent");
        }
    }

    fn remove_key(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(error = %e, key, "Failed to remove consent key");
        }
    }
}
