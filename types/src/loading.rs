//! Loading overlay options.
//!
//! Callers pass a sparse [`LoadingOptions`]; the manager merges it over the
//! process-wide [`LoadingDefaults`] to get a [`ResolvedLoadingOptions`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-call loading options. Every field is optional and falls back to the
/// configured defaults.
///
/// Durations are signed milliseconds: zero or negative means "immediate".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingOptions {
    pub minimum_load_time: Option<i64>,
    pub show_delay: Option<i64>,
    pub maximum_load_time: Option<i64>,
    pub debug: Option<bool>,
    pub message: Option<String>,
}

impl LoadingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minimum_load_time(mut self, ms: i64) -> Self {
        self.minimum_load_time = Some(ms);
        self
    }

    pub fn with_show_delay(mut self, ms: i64) -> Self {
        self.show_delay = Some(ms);
        self
    }

    pub fn with_maximum_load_time(mut self, ms: i64) -> Self {
        self.maximum_load_time = Some(ms);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Layer `self` over `base`: fields set here win, unset fields are taken
    /// from `base`.
    pub fn or(self, base: &LoadingOptions) -> LoadingOptions {
        LoadingOptions {
            minimum_load_time: self.minimum_load_time.or(base.minimum_load_time),
            show_delay: self.show_delay.or(base.show_delay),
            maximum_load_time: self.maximum_load_time.or(base.maximum_load_time),
            debug: self.debug.or(base.debug),
            message: self.message.or_else(|| base.message.clone()),
        }
    }
}

/// Process-wide loading defaults, loaded from the `[loading]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingDefaults {
    pub minimum_load_time_ms: i64,
    pub show_delay_ms: i64,
    pub maximum_load_time_ms: i64,
    pub debug: bool,
}

impl Default for LoadingDefaults {
    fn default() -> Self {
        Self {
            minimum_load_time_ms: 500,
            show_delay_ms: 300,
            maximum_load_time_ms: 5000,
            debug: false,
        }
    }
}

impl LoadingDefaults {
    /// Merge caller options over these defaults.
    pub fn resolve(&self, options: &LoadingOptions) -> ResolvedLoadingOptions {
        ResolvedLoadingOptions {
            minimum_load_time: millis(
                options.minimum_load_time.unwrap_or(self.minimum_load_time_ms),
            ),
            show_delay: millis(options.show_delay.unwrap_or(self.show_delay_ms)),
            maximum_load_time: millis(
                options.maximum_load_time.unwrap_or(self.maximum_load_time_ms),
            ),
            debug: options.debug.unwrap_or(self.debug),
            message: options.message.clone(),
        }
    }
}

/// Fully resolved options carried by a live token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLoadingOptions {
    pub minimum_load_time: Duration,
    pub show_delay: Duration,
    pub maximum_load_time: Duration,
    pub debug: bool,
    pub message: Option<String>,
}

/// Clamp signed milliseconds to a non-negative [`Duration`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use nightfall_types::loading::millis;
/// assert_eq!(millis(250), Duration::from_millis(250));
/// assert_eq!(millis(-40), Duration::ZERO);
/// ```
pub fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}
