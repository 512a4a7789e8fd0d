//! Cookie consent context and banner.

mod banner;
mod provider;

pub use banner::{ConsentBanner, CookieSettingsButton};
pub use provider::{ConsentContext, ConsentProvider, use_consent};
