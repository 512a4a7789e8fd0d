//! Category-gated application cookies over a `document.cookie`-style backend.
//!
//! Parsing is lenient per entry: a pair without `=` or with undecodable
//! percent-encoding is kept with its raw text so the remaining cookies can
//! still be read and cleared.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use hashbrown::HashMap;
use nightfall_types::{CookieCategory, CookiePreferences};

use super::clock::Clock;
use super::store::ConsentStore;
use crate::error::StorageError;

/// HTTP-date format used for the `expires` attribute
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Raw cookie access with `document.cookie` semantics.
pub trait CookieBackend {
    /// All visible cookies as `name=value; name2=value2`
    fn read_all(&self) -> Result<String, StorageError>;

    /// Apply one `name=value; attr=...` line
    fn write(&self, line: &str) -> Result<(), StorageError>;
}

/// Answers whether a category may be written.
pub trait ConsentGate {
    fn allows(&self, category: CookieCategory) -> bool;
}

impl ConsentGate for ConsentStore {
    fn allows(&self, category: CookieCategory) -> bool {
        self.is_category_allowed(category)
    }
}

impl ConsentGate for CookiePreferences {
    fn allows(&self, category: CookieCategory) -> bool {
        CookiePreferences::allows(self, category)
    }
}

#[derive(Debug, PartialEq)]
pub enum WriteStatus {
    Written,
    /// Category not consented; nothing was written
    Blocked(CookieCategory),
    Failed(StorageError),
}

fn decode_lossless(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

/// One header entry. `raw_name` is the name exactly as the backend reported
/// it and is what deletion must write back.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    raw_name: String,
    name: String,
    value: String,
}

fn parse_entries(raw: &str) -> Vec<Entry> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (raw_name, value) = match entry.split_once('=') {
                Some((name, value)) => (name.trim(), decode_lossless(value.trim())),
                None => (entry, String::new()),
            };
            Entry {
                raw_name: raw_name.to_string(),
                name: decode_lossless(raw_name),
                value,
            }
        })
        .collect()
}

/// Split a cookie header into decoded `(name, value)` pairs.
///
/// # Examples
/// ```
/// use nightfall_core::consent::parse_cookie_header;
/// let pairs = parse_cookie_header("theme=dark; flag; bad=%FF");
/// assert_eq!(pairs[0], ("theme".to_string(), "dark".to_string()));
/// assert_eq!(pairs[1], ("flag".to_string(), String::new()));
/// assert_eq!(pairs[2], ("bad".to_string(), "%FF".to_string()));
/// ```
pub fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
    parse_entries(raw)
        .into_iter()
        .map(|entry| (entry.name, entry.value))
        .collect()
}

/// Format a cookie `expires` attribute.
pub fn format_cookie_date(at: DateTime<Utc>) -> String {
    at.format(COOKIE_DATE_FORMAT).to_string()
}

pub struct CookieJar {
    backend: Rc<dyn CookieBackend>,
    clock: Rc<dyn Clock>,
    path: String,
    /// Known application cookies and their categories
    registry: RefCell<HashMap<String, CookieCategory>>,
}

impl CookieJar {
    pub fn new(
        backend: Rc<dyn CookieBackend>,
        clock: Rc<dyn Clock>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            clock,
            path: path.into(),
            registry: RefCell::new(HashMap::new()),
        }
    }

    /// Declare the category of a cookie this app may have written earlier.
    pub fn register(&self, name: impl Into<String>, category: CookieCategory) {
        self.registry.borrow_mut().insert(name.into(), category);
    }

    pub fn category_of(&self, name: &str) -> Option<CookieCategory> {
        self.registry.borrow().get(name).copied()
    }

    /// Every visible cookie. A backend failure yields an empty list.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.read_entries()
            .into_iter()
            .map(|entry| (entry.name, entry.value))
            .collect()
    }

    fn read_entries(&self) -> Vec<Entry> {
        match self.backend.read_all() {
            Ok(raw) => parse_entries(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cookies");
                Vec::new()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Write a cookie if `gate` allows `category`. Disallowed writes are
    /// skipped and logged, never an error.
    pub fn set(
        &self,
        gate: &impl ConsentGate,
        name: &str,
        value: &str,
        category: CookieCategory,
        days: i64,
    ) -> WriteStatus {
        self.register(name, category);
        if !gate.allows(category) {
            tracing::debug!(name, category = category.key(), "Cookie write blocked by consent");
            return WriteStatus::Blocked(category);
        }

        let now = self.clock.now();
        let expires = TimeDelta::try_days(days.max(0))
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(now);
        let line = format!(
            "{}={}; expires={}; path={}; SameSite=Lax",
            urlencoding::encode(name),
            urlencoding::encode(value),
            format_cookie_date(expires),
            self.path
        );
        self.write_line(&line)
    }

    /// Expire `name`. Cookies already present are expired under the name
    /// text they were read with, which may differ from the encoded form.
    pub fn delete(&self, name: &str) -> WriteStatus {
        let present: Vec<String> = self
            .read_entries()
            .into_iter()
            .filter(|entry| entry.name == name)
            .map(|entry| entry.raw_name)
            .collect();
        if present.is_empty() {
            return self.expire(&urlencoding::encode(name));
        }
        present
            .iter()
            .map(|raw_name| self.expire(raw_name))
            .find(|status| *status != WriteStatus::Written)
            .unwrap_or(WriteStatus::Written)
    }

    /// Delete registered cookies whose category `gate` no longer allows.
    /// Returns how many were deleted.
    pub fn clear_disallowed(&self, gate: &impl ConsentGate) -> usize {
        let present = self.read_entries();
        let doomed: Vec<String> = {
            let registry = self.registry.borrow();
            present
                .into_iter()
                .filter_map(|entry| {
                    let category = registry.get(&entry.name)?;
                    (!gate.allows(*category)).then_some(entry.raw_name)
                })
                .collect()
        };
        self.expire_each(doomed)
    }

    /// Delete every visible cookie. Returns how many were deleted.
    pub fn clear_all(&self) -> usize {
        let raw_names = self
            .read_entries()
            .into_iter()
            .map(|entry| entry.raw_name)
            .collect();
        self.expire_each(raw_names)
    }

    /// Write an already-past expiry for `raw_name`, verbatim.
    fn expire(&self, raw_name: &str) -> WriteStatus {
        let line = format!(
            "{}=; expires={}; path={}; SameSite=Lax",
            raw_name, EPOCH_EXPIRES, self.path
        );
        self.write_line(&line)
    }

    fn expire_each(&self, raw_names: Vec<String>) -> usize {
        raw_names
            .iter()
            .filter(|raw_name| matches!(self.expire(raw_name), WriteStatus::Written))
            .count()
    }

    fn write_line(&self, line: &str) -> WriteStatus {
        match self.backend.write(line) {
            Ok(()) => WriteStatus::Written,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to write cookie");
                WriteStatus::Failed(e)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    expires: Option<DateTime<Utc>>,
}

/// In-memory cookie backend that honours `expires` on write and read.
pub struct MemoryCookies {
    clock: Rc<dyn Clock>,
    cookies: RefCell<Vec<StoredCookie>>,
}

impl MemoryCookies {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            cookies: RefCell::new(Vec::new()),
        }
    }

    fn parse_line(line: &str) -> Option<StoredCookie> {
        let mut parts = line.split(';').map(str::trim);
        let (name, value) = parts.next()?.split_once('=')?;
        let expires = parts
            .filter_map(|attr| attr.split_once('='))
            .find(|(key, _)| key.eq_ignore_ascii_case("expires"))
            .and_then(|(_, date)| NaiveDateTime::parse_from_str(date, COOKIE_DATE_FORMAT).ok())
            .map(|naive| naive.and_utc());
        Some(StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            expires,
        })
    }
}

impl CookieBackend for MemoryCookies {
    fn read_all(&self) -> Result<String, StorageError> {
        let now = self.clock.now();
        let cookies = self.cookies.borrow();
        let visible: Vec<String> = cookies
            .iter()
            .filter(|c| c.expires.is_none_or(|at| at > now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        Ok(visible.join("; "))
    }

    fn write(&self, line: &str) -> Result<(), StorageError> {
        let cookie = Self::parse_line(line)
            .ok_or_else(|| StorageError::Backend(format!("malformed cookie line: {line}")))?;
        let mut cookies = self.cookies.borrow_mut();
        cookies.retain(|c| c.name != cookie.name);
        if cookie.expires.is_none_or(|at| at > self.clock.now()) {
            cookies.push(cookie);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::clock::FixedClock;

    fn clock() -> Rc<FixedClock> {
        Rc::new(FixedClock::new(
            DateTime::parse_from_rfc3339("2026-10-31T23:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ))
    }

    fn jar() -> (Rc<FixedClock>, Rc<MemoryCookies>, CookieJar) {
        let clock = clock();
        let backend = Rc::new(MemoryCookies::new(clock.clone()));
        let jar = CookieJar::new(backend.clone(), clock.clone(), "/");
        (clock, backend, jar)
    }

    struct RawBackend(&'static str);

    impl CookieBackend for RawBackend {
        fn read_all(&self) -> Result<String, StorageError> {
            Ok(self.0.to_string())
        }

        fn write(&self, line: &str) -> Result<(), StorageError> {
            if line.starts_with("broken=") {
                Err(StorageError::Backend("rejected".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_parse_tolerates_malformed_entries() {
        let pairs = parse_cookie_header(" a=1;;  lonely ; b=%E2%98%A0; c=%FF%FE ; d=x=y");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("lonely".to_string(), String::new()),
                ("b".to_string(), "\u{2620}".to_string()),
                ("c".to_string(), "%FF%FE".to_string()),
                ("d".to_string(), "x=y".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_writes_attributes_and_round_trips_value() {
        let (_clock, backend, jar) = jar();
        let prefs = CookiePreferences::all_accepted();
        assert_eq!(
            jar.set(&prefs, "last_story", "the raven; part 2", CookieCategory::Functional, 7),
            WriteStatus::Written
        );
        assert_eq!(jar.get("last_story").as_deref(), Some("the raven; part 2"));
        assert!(backend.read_all().unwrap().starts_with("last_story=the%20raven%3B%20part%202"));
    }

    #[test]
    fn test_write_line_format() {
        struct Capture(RefCell<Vec<String>>);
        impl CookieBackend for Capture {
            fn read_all(&self) -> Result<String, StorageError> {
                Ok(String::new())
            }
            fn write(&self, line: &str) -> Result<(), StorageError> {
                self.0.borrow_mut().push(line.to_string());
                Ok(())
            }
        }
        let capture = Rc::new(Capture(RefCell::new(Vec::new())));
        let jar = CookieJar::new(capture.clone(), clock(), "/stories");
        jar.set(&CookiePreferences::default(), "sid", "abc", CookieCategory::Essential, 1);
        assert_eq!(
            capture.0.borrow()[0],
            "sid=abc; expires=Sun, 01 Nov 2026 23:00:00 GMT; path=/stories; SameSite=Lax"
        );
    }

    #[test]
    fn test_disallowed_category_is_silent_noop() {
        let (_clock, backend, jar) = jar();
        let status = jar.set(
            &CookiePreferences::default(),
            "_ga",
            "GA1.2",
            CookieCategory::Analytics,
            365,
        );
        assert_eq!(status, WriteStatus::Blocked(CookieCategory::Analytics));
        assert_eq!(backend.read_all().unwrap(), "");
    }

    #[test]
    fn test_delete_and_expiry() {
        let (clock, _backend, jar) = jar();
        let prefs = CookiePreferences::all_accepted();
        jar.set(&prefs, "short", "1", CookieCategory::Functional, 1);
        jar.set(&prefs, "long", "2", CookieCategory::Functional, 30);

        jar.delete("long");
        assert_eq!(jar.get("long"), None);

        clock.advance(TimeDelta::days(2));
        assert_eq!(jar.get("short"), None, "Expired cookie no longer visible");
    }

    #[test]
    fn test_clear_disallowed_after_consent_narrows() {
        let (_clock, _backend, jar) = jar();
        let all = CookiePreferences::all_accepted();
        jar.set(&all, "session", "s", CookieCategory::Essential, 1);
        jar.set(&all, "_ga", "g", CookieCategory::Analytics, 1);
        jar.set(&all, "ad_id", "m", CookieCategory::Marketing, 1);

        let narrowed = CookiePreferences {
            marketing: true,
            ..CookiePreferences::default()
        };
        assert_eq!(jar.clear_disallowed(&narrowed), 1);
        assert_eq!(jar.get("_ga"), None);
        assert!(jar.get("session").is_some());
        assert!(jar.get("ad_id").is_some());
    }

    #[test]
    fn test_clear_all_continues_past_bad_entries() {
        let backend = Rc::new(RawBackend("ok=1; broken=%FF; novalue; tail=2"));
        let jar = CookieJar::new(backend, clock(), "/");
        assert_eq!(jar.entries().len(), 4);
        assert_eq!(jar.clear_all(), 3, "Only the rejected write is not counted");
    }

    #[test]
    fn test_clear_all_expires_names_under_their_raw_text() {
        let (_clock, backend, jar) = jar();
        backend.write("bad%FF=1").unwrap();
        backend.write("a@b=2").unwrap();
        backend.write("caf%C3%A9=3").unwrap();
        assert_eq!(jar.get("café").as_deref(), Some("3"));

        assert_eq!(jar.clear_all(), 3);
        assert_eq!(backend.read_all().unwrap(), "", "Every cookie must actually be gone");
    }

    #[test]
    fn test_delete_matches_decoded_name() {
        let (_clock, backend, jar) = jar();
        backend.write("a@b=2").unwrap();
        backend.write("keep=1").unwrap();

        assert_eq!(jar.delete("a@b"), WriteStatus::Written);
        assert_eq!(backend.read_all().unwrap(), "keep=1");
    }

    #[test]
    fn test_clear_disallowed_uses_raw_name() {
        let (_clock, backend, jar) = jar();
        backend.write("ad%20id=m").unwrap();
        jar.register("ad id", CookieCategory::Marketing);

        assert_eq!(jar.clear_disallowed(&CookiePreferences::default()), 1);
        assert_eq!(backend.read_all().unwrap(), "");
    }

    #[test]
    fn test_consent_store_as_gate() {
        use crate::consent::storage::MemoryStore;
        use nightfall_types::ConsentConfig;

        let clock = clock();
        let store = ConsentStore::new(
            Rc::new(MemoryStore::new()),
            clock.clone(),
            ConsentConfig::default(),
        );
        let jar = CookieJar::new(Rc::new(MemoryCookies::new(clock.clone())), clock, "/");

        assert_eq!(
            jar.set(&store, "theme", "blood-red", CookieCategory::Functional, 30),
            WriteStatus::Blocked(CookieCategory::Functional)
        );
        store.accept_all_cookies();
        assert_eq!(
            jar.set(&store, "theme", "blood-red", CookieCategory::Functional, 30),
            WriteStatus::Written
        );
        assert_eq!(jar.category_of("theme"), Some(CookieCategory::Functional));
    }
}
