//! Cookie consent categories and the persisted preferences record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cookie classification used for consent gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieCategory {
    Essential,
    Functional,
    Analytics,
    Performance,
    Marketing,
}

impl CookieCategory {
    /// Human-readable label for the consent banner
    pub fn label(&self) -> &'static str {
        match self {
            CookieCategory::Essential => "Essential",
            CookieCategory::Functional => "Functional",
            CookieCategory::Analytics => "Analytics",
            CookieCategory::Performance => "Performance",
            CookieCategory::Marketing => "Marketing",
        }
    }

    /// Field name in the persisted record
    pub fn key(&self) -> &'static str {
        match self {
            CookieCategory::Essential => "essential",
            CookieCategory::Functional => "functional",
            CookieCategory::Analytics => "analytics",
            CookieCategory::Performance => "performance",
            CookieCategory::Marketing => "marketing",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.key() == key)
    }

    /// All categories (for iteration)
    pub fn all() -> &'static [CookieCategory] {
        &[
            CookieCategory::Essential,
            CookieCategory::Functional,
            CookieCategory::Analytics,
            CookieCategory::Performance,
            CookieCategory::Marketing,
        ]
    }

    /// Categories the user can toggle
    pub fn optional() -> &'static [CookieCategory] {
        &Self::all()[1..]
    }
}

/// The user's consent decision.
///
/// `essential` is always `true`: constructors and every mutation re-derive it,
/// and [`CookiePreferences::allows`] ignores the stored flag for essential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiePreferences {
    pub essential: bool,
    pub functional: bool,
    pub analytics: bool,
    pub performance: bool,
    pub marketing: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for CookiePreferences {
    fn default() -> Self {
        Self {
            essential: true,
            functional: false,
            analytics: false,
            performance: false,
            marketing: false,
            last_updated: None,
        }
    }
}

impl CookiePreferences {
    /// Every category enabled
    pub fn all_accepted() -> Self {
        Self {
            essential: true,
            functional: true,
            analytics: true,
            performance: true,
            marketing: true,
            last_updated: None,
        }
    }

    pub fn allows(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Essential => true,
            CookieCategory::Functional => self.functional,
            CookieCategory::Analytics => self.analytics,
            CookieCategory::Performance => self.performance,
            CookieCategory::Marketing => self.marketing,
        }
    }

    /// Set a category flag. Essential cannot be turned off.
    pub fn set(&mut self, category: CookieCategory, allowed: bool) {
        match category {
            CookieCategory::Essential => self.essential = true,
            CookieCategory::Functional => self.functional = allowed,
            CookieCategory::Analytics => self.analytics = allowed,
            CookieCategory::Performance => self.performance = allowed,
            CookieCategory::Marketing => self.marketing = allowed,
        }
    }

    /// True if any category beyond essential is enabled.
    pub fn any_optional(&self) -> bool {
        CookieCategory::optional().iter().any(|c| self.allows(*c))
    }

    /// Merge a partial update and re-derive `essential`.
    pub fn apply(&mut self, update: &PreferenceUpdate) {
        for category in CookieCategory::optional() {
            if let Some(allowed) = update.get(*category) {
                self.set(*category, allowed);
            }
        }
        self.essential = true;
    }
}

/// Sparse preference change. Also the lenient shape used to read stored
/// records, since every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essential: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing: Option<bool>,
}

impl PreferenceUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: CookieCategory, allowed: bool) -> Self {
        let slot = match category {
            CookieCategory::Essential => &mut self.essential,
            CookieCategory::Functional => &mut self.functional,
            CookieCategory::Analytics => &mut self.analytics,
            CookieCategory::Performance => &mut self.performance,
            CookieCategory::Marketing => &mut self.marketing,
        };
        *slot = Some(allowed);
        self
    }

    pub fn get(&self, category: CookieCategory) -> Option<bool> {
        match category {
            CookieCategory::Essential => self.essential,
            CookieCategory::Functional => self.functional,
            CookieCategory::Analytics => self.analytics,
            CookieCategory::Performance => self.performance,
            CookieCategory::Marketing => self.marketing,
        }
    }

    /// Number of category fields present
    pub fn field_count(&self) -> usize {
        CookieCategory::all()
            .iter()
            .filter(|c| self.get(**c).is_some())
            .count()
    }
}
