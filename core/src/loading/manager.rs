//! Reference-counted loading overlay manager.
//!
//! Each `show_loading` call creates a token carrying up to three timers:
//! - show-delay: reveals the token once `show_delay` has passed
//! - watchdog: force-releases the token at `maximum_load_time`
//! - release: holds an early `hide_loading` until `minimum_load_time`
//!
//! The overlay is visible while at least one revealed token is unreleased.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use hashbrown::HashMap;
use nightfall_types::{LoadingDefaults, LoadingOptions, ResolvedLoadingOptions};

use super::scheduler::{Scheduler, TimerId};
use super::surface::OverlaySurface;

/// Opaque handle for one in-flight load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loading-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Notifications delivered to subscribers after the surface is updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingEvent {
    /// The set of unreleased tokens became non-empty (`true`) or empty
    ActivityChanged { active: bool },
    Shown { message: Option<String> },
    Hidden,
    Released { token: TokenId, forced: bool },
    MessageChanged(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    ShowDelay,
    Watchdog,
    Release,
}

#[derive(Debug, Default)]
struct TokenTimers {
    show_delay: Option<TimerId>,
    watchdog: Option<TimerId>,
    release: Option<TimerId>,
}

impl TokenTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerId> {
        match kind {
            TimerKind::ShowDelay => &mut self.show_delay,
            TimerKind::Watchdog => &mut self.watchdog,
            TimerKind::Release => &mut self.release,
        }
    }

    fn cancel_all(&mut self, scheduler: &dyn Scheduler) {
        for timer in [
            self.show_delay.take(),
            self.watchdog.take(),
            self.release.take(),
        ]
        .into_iter()
        .flatten()
        {
            scheduler.cancel(timer);
        }
    }
}

#[derive(Debug)]
struct TokenRecord {
    start: Duration,
    options: ResolvedLoadingOptions,
    /// Reveal order; `None` until the show-delay elapses
    revealed: Option<u64>,
    /// `hide_loading` accepted, waiting out the minimum duration
    releasing: bool,
    timers: TokenTimers,
}

#[derive(Debug, Default)]
struct OverlayState {
    created: bool,
    visible: bool,
    displayed_message: Option<String>,
}

/// Surface work and notifications, applied once the state borrow is released.
enum Effect {
    Create,
    Show(Option<String>),
    Hide,
    Message(Option<String>),
    Emit(LoadingEvent),
}

#[derive(Debug, Default)]
struct ManagerState {
    tokens: HashMap<TokenId, TokenRecord>,
    /// Last activity reported to listeners
    active: bool,
    next_token: u64,
    next_reveal: u64,
    overlay: OverlayState,
    explicit_message: Option<String>,
}

impl ManagerState {
    fn any_revealed(&self) -> bool {
        self.tokens.values().any(|t| t.revealed.is_some())
    }

    /// Explicit message first, else the newest revealed token's message.
    fn current_message(&self) -> Option<String> {
        if let Some(message) = &self.explicit_message {
            return Some(message.clone());
        }
        self.tokens
            .values()
            .filter_map(|t| Some((t.revealed?, t.options.message.as_ref()?)))
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, message)| message.clone())
    }

    fn take_reveal_seq(&mut self) -> u64 {
        let seq = self.next_reveal;
        self.next_reveal += 1;
        seq
    }

    /// Bring the surface in line with the token set.
    fn sync_overlay(&mut self, effects: &mut Vec<Effect>) {
        let active = !self.tokens.is_empty();
        if active != self.active {
            self.active = active;
            effects.push(Effect::Emit(LoadingEvent::ActivityChanged { active }));
        }

        let should_show = self.any_revealed();
        if should_show && !self.overlay.visible {
            if !self.overlay.created {
                self.overlay.created = true;
                effects.push(Effect::Create);
            }
            let message = self.current_message();
            self.overlay.visible = true;
            self.overlay.displayed_message = message.clone();
            effects.push(Effect::Show(message.clone()));
            effects.push(Effect::Emit(LoadingEvent::Shown { message }));
        } else if !should_show && self.overlay.visible {
            self.overlay.visible = false;
            self.overlay.displayed_message = None;
            self.explicit_message = None;
            effects.push(Effect::Hide);
            effects.push(Effect::Emit(LoadingEvent::Hidden));
        } else if self.overlay.visible {
            let message = self.current_message();
            if message != self.overlay.displayed_message {
                self.overlay.displayed_message = message.clone();
                effects.push(Effect::Message(message.clone()));
                effects.push(Effect::Emit(LoadingEvent::MessageChanged(message)));
            }
        }
    }

    fn release(
        &mut self,
        token: TokenId,
        forced: bool,
        scheduler: &dyn Scheduler,
        effects: &mut Vec<Effect>,
    ) {
        let Some(mut record) = self.tokens.remove(&token) else {
            return;
        };
        record.timers.cancel_all(scheduler);
        log_token(record.options.debug, token, "released");
        effects.push(Effect::Emit(LoadingEvent::Released { token, forced }));
        self.sync_overlay(effects);
    }
}

type Listener = Rc<dyn Fn(&LoadingEvent)>;

struct Inner {
    defaults: LoadingDefaults,
    scheduler: Rc<dyn Scheduler>,
    surface: Rc<dyn OverlaySurface>,
    state: RefCell<ManagerState>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
}

/// Process-wide loading manager.
///
/// Construct once and hand clones to consumers; clones share one token set and
/// one overlay.
#[derive(Clone)]
pub struct LoadingManager {
    inner: Rc<Inner>,
}

impl fmt::Debug for LoadingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("LoadingManager")
            .field("active", &state.tokens.len())
            .field("visible", &state.overlay.visible)
            .finish()
    }
}

impl LoadingManager {
    pub fn new(
        defaults: LoadingDefaults,
        scheduler: Rc<dyn Scheduler>,
        surface: Rc<dyn OverlaySurface>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                defaults,
                scheduler,
                surface,
                state: RefCell::new(ManagerState::default()),
                listeners: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
            }),
        }
    }

    pub fn defaults(&self) -> &LoadingDefaults {
        &self.inner.defaults
    }

    /// Start a load and return its token.
    ///
    /// The overlay appears after the show-delay unless the token is hidden
    /// first. The watchdog releases the token at `maximum_load_time` if
    /// `hide_loading` is never called.
    pub fn show_loading(&self, options: LoadingOptions) -> TokenId {
        let options = self.inner.defaults.resolve(&options);
        let start = self.inner.scheduler.now();
        let mut effects = Vec::new();
        let token = {
            let mut state = self.inner.state.borrow_mut();
            let token = TokenId(state.next_token);
            state.next_token += 1;

            let mut record = TokenRecord {
                start,
                revealed: None,
                releasing: false,
                timers: TokenTimers::default(),
                options,
            };
            record.timers.watchdog = Some(self.schedule(
                token,
                TimerKind::Watchdog,
                record.options.maximum_load_time,
            ));
            if record.options.show_delay.is_zero() {
                record.revealed = Some(state.take_reveal_seq());
            } else {
                record.timers.show_delay = Some(self.schedule(
                    token,
                    TimerKind::ShowDelay,
                    record.options.show_delay,
                ));
            }
            log_token(record.options.debug, token, "started");

            state.tokens.insert(token, record);
            state.sync_overlay(&mut effects);
            token
        };
        self.apply(effects);
        token
    }

    /// Finish a load.
    ///
    /// Unknown tokens and tokens already being hidden are ignored. A pending
    /// show-delay is cancelled. If the token is younger than its minimum load
    /// time the release is deferred by the remainder.
    pub fn hide_loading(&self, token: TokenId) {
        let now = self.inner.scheduler.now();
        let mut effects = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            let Some(record) = state.tokens.get_mut(&token) else {
                tracing::trace!(%token, "hide_loading for unknown token ignored");
                return;
            };
            if record.releasing {
                return;
            }
            if let Some(timer) = record.timers.show_delay.take() {
                self.inner.scheduler.cancel(timer);
            }

            let elapsed = now.saturating_sub(record.start);
            let minimum = record.options.minimum_load_time;
            if elapsed < minimum {
                record.releasing = true;
                record.timers.release =
                    Some(self.schedule(token, TimerKind::Release, minimum - elapsed));
                log_token(record.options.debug, token, "hold for minimum load time");
            } else {
                state.release(token, false, &*self.inner.scheduler, &mut effects);
            }
        }
        self.apply(effects);
    }

    /// Drop every token and hide the overlay immediately, bypassing minimum
    /// load times. For error recovery.
    pub fn force_hide_all_loading(&self) {
        let mut effects = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            let tokens: Vec<(TokenId, TokenRecord)> = state.tokens.drain().collect();
            if !tokens.is_empty() {
                tracing::warn!(count = tokens.len(), "Force-hiding all loading tokens");
            }
            for (token, mut record) in tokens {
                record.timers.cancel_all(&*self.inner.scheduler);
                effects.push(Effect::Emit(LoadingEvent::Released {
                    token,
                    forced: true,
                }));
            }
            state.explicit_message = None;
            state.sync_overlay(&mut effects);
        }
        self.apply(effects);
    }

    /// Override the displayed message without touching any timer.
    /// `None` falls back to the newest token message. The override is
    /// dropped when the overlay hides.
    pub fn set_message(&self, message: Option<String>) {
        let mut effects = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            state.explicit_message = message;
            state.sync_overlay(&mut effects);
        }
        self.apply(effects);
    }

    /// Number of unreleased tokens (including ones waiting out their minimum)
    pub fn active_count(&self) -> usize {
        self.inner.state.borrow().tokens.len()
    }

    pub fn is_loading(&self) -> bool {
        self.active_count() > 0
    }

    pub fn is_visible(&self) -> bool {
        self.inner.state.borrow().overlay.visible
    }

    /// True until the token is released
    pub fn is_active(&self, token: TokenId) -> bool {
        self.inner.state.borrow().tokens.contains_key(&token)
    }

    /// Message currently on the overlay
    pub fn message(&self) -> Option<String> {
        self.inner.state.borrow().overlay.displayed_message.clone()
    }

    pub fn subscribe(&self, listener: impl Fn(&LoadingEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.listeners.borrow_mut().retain(|(sub, _)| *sub != id);
    }

    fn schedule(&self, token: TokenId, kind: TimerKind, delay: Duration) -> TimerId {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    LoadingManager { inner }.on_timer(token, kind);
                }
            }),
        )
    }

    fn on_timer(&self, token: TokenId, kind: TimerKind) {
        let mut effects = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            let seq = state.next_reveal;
            let Some(record) = state.tokens.get_mut(&token) else {
                return;
            };
            record.timers.slot(kind).take();

            match kind {
                TimerKind::ShowDelay => {
                    if record.releasing || record.revealed.is_some() {
                        return;
                    }
                    record.revealed = Some(seq);
                    log_token(record.options.debug, token, "revealed");
                    state.next_reveal += 1;
                    state.sync_overlay(&mut effects);
                }
                TimerKind::Watchdog => {
                    tracing::warn!(
                        %token,
                        max_ms = record.options.maximum_load_time.as_millis() as u64,
                        "Loading exceeded maximum load time, forcing release"
                    );
                    state.release(token, true, &*self.inner.scheduler, &mut effects);
                }
                TimerKind::Release => {
                    state.release(token, false, &*self.inner.scheduler, &mut effects);
                }
            }
        }
        self.apply(effects);
    }

    /// Run the batch's surface calls, then notify listeners.
    ///
    /// A listener may call back into the manager; anything it changes
    /// supersedes the rest of the batch, so each queued event is checked
    /// against the current state before delivery.
    fn apply(&self, effects: Vec<Effect>) {
        let surface = &self.inner.surface;
        let mut events = Vec::new();
        for effect in effects {
            match effect {
                Effect::Create => surface.create(),
                Effect::Show(message) => surface.show(message.as_deref()),
                Effect::Hide => surface.hide(),
                Effect::Message(message) => surface.set_message(message.as_deref()),
                Effect::Emit(event) => events.push(event),
            }
        }
        for event in events {
            if let Some(event) = self.still_current(event) {
                self.emit(&event);
            }
        }
    }

    fn still_current(&self, event: LoadingEvent) -> Option<LoadingEvent> {
        let state = self.inner.state.borrow();
        let overlay = &state.overlay;
        match event {
            LoadingEvent::ActivityChanged { active } => {
                (state.active == active).then_some(LoadingEvent::ActivityChanged { active })
            }
            LoadingEvent::Shown { .. } => overlay.visible.then(|| LoadingEvent::Shown {
                message: overlay.displayed_message.clone(),
            }),
            LoadingEvent::Hidden => (!overlay.visible).then_some(LoadingEvent::Hidden),
            LoadingEvent::MessageChanged(message) => (overlay.visible
                && overlay.displayed_message == message)
                .then_some(LoadingEvent::MessageChanged(message)),
            released @ LoadingEvent::Released { .. } => Some(released),
        }
    }

    fn emit(&self, event: &LoadingEvent) {
        // Snapshot so listeners may subscribe/unsubscribe re-entrantly
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

fn log_token(debug: bool, token: TokenId, what: &str) {
    if debug {
        tracing::debug!(%token, "{what}");
    } else {
        tracing::trace!(%token, "{what}");
    }
}
