//! Cookie consent: persisted category preferences with time-limited
//! validity, and consent-gated application cookies.

pub mod clock;
pub mod cookies;
pub mod storage;
mod store;


pub use clock::{Clock, FixedClock, SystemClock};
pub use cookies::{
    ConsentGate, CookieBackend, CookieJar, MemoryCookies, WriteStatus, format_cookie_date,
    parse_cookie_header,
};
pub use storage::{KeyValueStore, MemoryStore, UnavailableStore};
pub use store::{ConsentState, ConsentStore};
