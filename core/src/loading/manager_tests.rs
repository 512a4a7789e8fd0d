//! Tests for the loading manager
//!
//! All timing runs on the virtual clock of `ManualScheduler`.

use std::cell::RefCell;
use std::rc::Rc;

use nightfall_types::{LoadingDefaults, LoadingOptions};

use super::manager::{LoadingEvent, LoadingManager};
use super::scheduler::ManualScheduler;
use super::surface::{RecordingSurface, SurfaceCall};

struct Harness {
    scheduler: Rc<ManualScheduler>,
    surface: Rc<RecordingSurface>,
    manager: LoadingManager,
}

fn harness() -> Harness {
    harness_with(LoadingDefaults::default())
}

fn harness_with(defaults: LoadingDefaults) -> Harness {
    let scheduler = Rc::new(ManualScheduler::new());
    let surface = Rc::new(RecordingSurface::new());
    let manager = LoadingManager::new(defaults, scheduler.clone(), surface.clone());
    Harness {
        scheduler,
        surface,
        manager,
    }
}

fn immediate() -> LoadingOptions {
    LoadingOptions::new().with_show_delay(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Show delay
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_overlay_appears_after_show_delay() {
    let h = harness();
    let _token = h.manager.show_loading(LoadingOptions::new());

    assert!(h.manager.is_loading());
    assert!(!h.manager.is_visible(), "Overlay must wait for the show delay");

    h.scheduler.advance_ms(299);
    assert!(!h.manager.is_visible());

    h.scheduler.advance_ms(1);
    assert!(h.manager.is_visible());
    assert!(h.surface.is_shown());
}

#[test]
fn test_hide_before_show_delay_never_shows_overlay() {
    let h = harness();
    let token = h.manager.show_loading(LoadingOptions::new());

    h.scheduler.advance_ms(100);
    h.manager.hide_loading(token);
    h.scheduler.advance_ms(10_000);

    assert!(!h.manager.is_loading());
    assert!(
        h.surface.calls().is_empty(),
        "Surface should never be touched, got {:?}",
        h.surface.calls()
    );
    assert_eq!(h.scheduler.pending(), 0, "All timers should be disposed");
}

#[test]
fn test_early_hide_still_holds_token_for_minimum_time() {
    let h = harness();
    let token = h.manager.show_loading(LoadingOptions::new());

    h.scheduler.advance_ms(100);
    h.manager.hide_loading(token);
    assert!(h.manager.is_active(token));

    h.scheduler.advance_ms(399);
    assert!(h.manager.is_active(token));
    h.scheduler.advance_ms(1);
    assert!(!h.manager.is_active(token));
}

#[test]
fn test_negative_show_delay_is_immediate() {
    let h = harness();
    h.manager.show_loading(LoadingOptions::new().with_show_delay(-20));
    assert!(h.manager.is_visible());
}

// ─────────────────────────────────────────────────────────────────────────────
// Minimum duration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_minimum_duration_example_scenario() {
    let h = harness();
    let token = h
        .manager
        .show_loading(LoadingOptions::new().with_show_delay(0).with_minimum_load_time(200));
    assert!(h.manager.is_visible(), "Visible at t=0");

    h.scheduler.advance_ms(50);
    h.manager.hide_loading(token);
    assert!(h.manager.is_visible(), "Still held at t=50");

    h.scheduler.advance_ms(149);
    assert!(h.manager.is_visible(), "Still held at t=199");

    h.scheduler.advance_ms(1);
    assert!(!h.manager.is_visible(), "Hidden at t=200");
    assert_eq!(h.manager.active_count(), 0);
}

#[test]
fn test_hide_after_minimum_releases_immediately() {
    let h = harness();
    let token = h.manager.show_loading(immediate());
    h.scheduler.advance_ms(800);
    h.manager.hide_loading(token);
    assert!(!h.manager.is_visible());
    assert!(!h.manager.is_loading());
}

// ─────────────────────────────────────────────────────────────────────────────
// Reference counting
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_overlapping_tokens_share_one_overlay() {
    let h = harness();
    let a = h.manager.show_loading(LoadingOptions::new());
    let b = h.manager.show_loading(LoadingOptions::new());
    h.scheduler.advance_ms(1000);
    assert!(h.manager.is_visible());

    h.manager.hide_loading(a);
    assert!(h.manager.is_visible(), "B keeps the overlay up");
    assert_eq!(h.manager.active_count(), 1);

    h.manager.hide_loading(b);
    assert!(!h.manager.is_visible());
    assert_eq!(h.surface.count(&SurfaceCall::Create), 1);
    assert_eq!(h.surface.count(&SurfaceCall::Show(None)), 1);
    assert_eq!(h.surface.count(&SurfaceCall::Hide), 1);
}

#[test]
fn test_overlay_created_once_across_cycles() {
    let h = harness();
    for _ in 0..3 {
        let token = h.manager.show_loading(immediate());
        h.scheduler.advance_ms(600);
        h.manager.hide_loading(token);
    }
    assert_eq!(h.surface.count(&SurfaceCall::Create), 1);
    assert_eq!(h.surface.count(&SurfaceCall::Show(None)), 3);
    assert_eq!(h.surface.count(&SurfaceCall::Hide), 3);
}

#[test]
fn test_interleaving_never_visible_without_active_tokens() {
    let h = harness();
    let mut tokens = Vec::new();
    // Deterministic interleaving of starts, hides and clock steps
    for step in 0..40u64 {
        if step % 3 == 0 {
            tokens.push(h.manager.show_loading(
                LoadingOptions::new()
                    .with_show_delay((step * 37 % 400) as i64)
                    .with_minimum_load_time((step * 53 % 600) as i64),
            ));
        }
        if step % 4 == 1 && !tokens.is_empty() {
            let token = tokens.remove((step as usize) % tokens.len());
            h.manager.hide_loading(token);
            h.manager.hide_loading(token);
        }
        h.scheduler.advance_ms(step * 11 % 170);

        if h.manager.is_visible() {
            assert!(h.manager.active_count() > 0, "Visible with zero tokens at step {step}");
        }
        assert_eq!(h.manager.is_visible(), h.surface.is_shown());
    }
    for token in tokens {
        h.manager.hide_loading(token);
    }
    h.scheduler.advance_ms(10_000);
    assert_eq!(h.manager.active_count(), 0);
    assert!(!h.manager.is_visible());
    assert_eq!(h.scheduler.pending(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Watchdog
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_watchdog_force_releases_forgotten_token() {
    let h = harness();
    let forced = Rc::new(RefCell::new(Vec::new()));
    let log = forced.clone();
    h.manager.subscribe(move |event| {
        if let LoadingEvent::Released { token, forced } = event {
            log.borrow_mut().push((*token, *forced));
        }
    });

    let token = h.manager.show_loading(LoadingOptions::new());
    h.scheduler.advance_ms(4999);
    assert!(h.manager.is_visible());

    h.scheduler.advance_ms(1);
    assert!(!h.manager.is_visible());
    assert!(!h.manager.is_active(token));
    assert_eq!(*forced.borrow(), vec![(token, true)]);
}

#[test]
fn test_watchdog_keeps_overlay_for_other_tokens() {
    let h = harness();
    let _stuck = h
        .manager
        .show_loading(immediate().with_maximum_load_time(1000));
    h.scheduler.advance_ms(500);
    let live = h.manager.show_loading(immediate());

    h.scheduler.advance_ms(500);
    assert_eq!(h.manager.active_count(), 1);
    assert!(h.manager.is_visible(), "Live token keeps the overlay up");

    h.manager.hide_loading(live);
    assert!(!h.manager.is_visible());
}

#[test]
fn test_watchdog_shorter_than_minimum_wins() {
    let h = harness();
    let token = h.manager.show_loading(
        immediate()
            .with_minimum_load_time(2000)
            .with_maximum_load_time(300),
    );
    h.scheduler.advance_ms(100);
    h.manager.hide_loading(token);
    h.scheduler.advance_ms(200);
    assert!(!h.manager.is_active(token));
    assert_eq!(h.scheduler.pending(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Idempotence and force-hide
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_double_hide_is_noop() {
    let h = harness();
    let a = h.manager.show_loading(immediate());
    let b = h.manager.show_loading(immediate());
    h.scheduler.advance_ms(600);

    h.manager.hide_loading(a);
    h.manager.hide_loading(a);
    assert_eq!(h.manager.active_count(), 1);
    assert!(h.manager.is_visible());

    h.manager.hide_loading(b);
    h.manager.hide_loading(b);
    assert_eq!(h.manager.active_count(), 0);
    assert_eq!(h.surface.count(&SurfaceCall::Hide), 1);
}

#[test]
fn test_double_hide_during_minimum_hold_does_not_extend() {
    let h = harness();
    let token = h.manager.show_loading(immediate().with_minimum_load_time(300));
    h.scheduler.advance_ms(100);
    h.manager.hide_loading(token);
    h.scheduler.advance_ms(100);
    h.manager.hide_loading(token);
    h.scheduler.advance_ms(100);
    assert!(!h.manager.is_active(token));
}

#[test]
fn test_force_hide_all_clears_everything() {
    let h = harness();
    let a = h.manager.show_loading(immediate());
    let _b = h.manager.show_loading(LoadingOptions::new());
    h.scheduler.advance_ms(50);
    h.manager.hide_loading(a);

    h.manager.force_hide_all_loading();
    assert_eq!(h.manager.active_count(), 0);
    assert!(!h.manager.is_visible());
    assert_eq!(h.scheduler.pending(), 0, "Every timer cancelled");

    // Stale tokens are harmless afterwards
    h.manager.hide_loading(a);
    h.scheduler.advance_ms(10_000);
    assert_eq!(h.surface.count(&SurfaceCall::Hide), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages and events
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_token_message_shown_and_explicit_override() {
    let h = harness();
    let token = h
        .manager
        .show_loading(immediate().with_message("Opening the crypt..."));
    assert_eq!(
        h.surface.calls().last(),
        Some(&SurfaceCall::Show(Some("Opening the crypt...".to_string())))
    );

    h.manager.set_message(Some("Almost there".to_string()));
    assert_eq!(h.manager.message().as_deref(), Some("Almost there"));

    h.manager.set_message(None);
    assert_eq!(h.manager.message().as_deref(), Some("Opening the crypt..."));

    h.scheduler.advance_ms(600);
    h.manager.hide_loading(token);
    assert_eq!(h.manager.message(), None);
}

#[test]
fn test_set_message_does_not_restart_timers() {
    let h = harness();
    let token = h.manager.show_loading(immediate().with_minimum_load_time(200));
    h.scheduler.advance_ms(50);
    h.manager.hide_loading(token);
    h.manager.set_message(Some("Still digging".to_string()));
    h.scheduler.advance_ms(150);
    assert!(!h.manager.is_visible());
}

#[test]
fn test_events_follow_overlay_transitions() {
    let h = harness();
    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    let sub = h.manager.subscribe(move |event| log.borrow_mut().push(event.clone()));

    let token = h.manager.show_loading(immediate());
    h.scheduler.advance_ms(600);
    h.manager.hide_loading(token);

    assert_eq!(
        *events.borrow(),
        vec![
            LoadingEvent::ActivityChanged { active: true },
            LoadingEvent::Shown { message: None },
            LoadingEvent::Released {
                token,
                forced: false
            },
            LoadingEvent::ActivityChanged { active: false },
            LoadingEvent::Hidden,
        ]
    );

    h.manager.unsubscribe(sub);
    h.manager.show_loading(immediate());
    assert_eq!(events.borrow().len(), 5);
}

#[test]
fn test_listener_may_reenter_manager() {
    let h = harness();
    let manager = h.manager.clone();
    let follow_up = Rc::new(RefCell::new(None));
    let slot = follow_up.clone();
    h.manager.subscribe(move |event| {
        if *event == LoadingEvent::Hidden && slot.borrow().is_none() {
            *slot.borrow_mut() = Some(manager.show_loading(immediate()));
        }
    });

    let token = h.manager.show_loading(immediate());
    h.scheduler.advance_ms(600);
    h.manager.hide_loading(token);

    assert!(follow_up.borrow().is_some());
    assert!(h.manager.is_visible());
}

#[test]
fn test_listener_restarting_on_release_keeps_overlay_shown() {
    let h = harness();
    let manager = h.manager.clone();
    let restarted = Rc::new(RefCell::new(None));
    let slot = restarted.clone();
    h.manager.subscribe(move |event| {
        if matches!(event, LoadingEvent::Released { .. }) && slot.borrow().is_none() {
            *slot.borrow_mut() = Some(manager.show_loading(immediate()));
        }
    });

    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    h.manager.subscribe(move |event| log.borrow_mut().push(event.clone()));

    let token = h.manager.show_loading(immediate());
    h.scheduler.advance_ms(600);
    h.manager.hide_loading(token);

    assert!(restarted.borrow().is_some());
    assert_eq!(h.manager.active_count(), 1);
    assert!(h.manager.is_visible());
    assert!(h.surface.is_shown(), "Surface calls: {:?}", h.surface.calls());
    assert!(
        !events.borrow().contains(&LoadingEvent::Hidden),
        "Stale Hidden must not reach listeners: {:?}",
        events.borrow()
    );
    assert!(!events.borrow().contains(&LoadingEvent::ActivityChanged { active: false }));
}

#[test]
fn test_activity_reported_before_overlay_is_revealed() {
    let h = harness();
    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    h.manager.subscribe(move |event| log.borrow_mut().push(event.clone()));

    let token = h.manager.show_loading(LoadingOptions::new());
    assert_eq!(*events.borrow(), vec![LoadingEvent::ActivityChanged { active: true }]);

    h.manager.hide_loading(token);
    h.scheduler.advance_ms(500);
    assert_eq!(
        events.borrow().last(),
        Some(&LoadingEvent::ActivityChanged { active: false })
    );
    assert!(!events.borrow().contains(&LoadingEvent::Hidden));
}

#[test]
fn test_configured_defaults_apply() {
    let h = harness_with(LoadingDefaults {
        show_delay_ms: 0,
        minimum_load_time_ms: 0,
        ..LoadingDefaults::default()
    });
    let token = h.manager.show_loading(LoadingOptions::new());
    assert!(h.manager.is_visible());
    h.manager.hide_loading(token);
    assert!(!h.manager.is_visible());
}

#[test]
fn test_dropped_manager_leaves_timers_inert() {
    let scheduler = Rc::new(ManualScheduler::new());
    let surface = Rc::new(RecordingSurface::new());
    {
        let manager = LoadingManager::new(
            LoadingDefaults::default(),
            scheduler.clone(),
            surface.clone(),
        );
        manager.show_loading(LoadingOptions::new());
    }
    scheduler.advance_ms(10_000);
    assert!(surface.calls().is_empty());
}
