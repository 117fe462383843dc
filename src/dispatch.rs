//! Action dispatch: turns a configured point into injected pointer events.
//!
//! `execute` gates on the point's enabled flag and target-application
//! filter, resolves the global coordinate once, then runs the bounded
//! repetition loop. Injection failures are logged and abandon the remaining
//! repetitions; nothing here ever propagates an error into the hotkey
//! pipeline that triggered it. Callers are expected to invoke `execute`
//! from a single worker thread, never from a hook callback -- the loop
//! blocks for the action's full duration.

use std::thread;
use std::time::Duration;

use crate::hotkey::process_matches;
use crate::platform::{ActiveWindow, PlatformError, PointerInjector, ScreenGeometry};
use crate::point::{ActionPoint, MouseAction};

/// Hold between consecutive events of one action (the down and up halves
/// of a click).
const BUTTON_HOLD: Duration = Duration::from_millis(50);

/// Executes configured points against one injection strategy.
pub struct ActionDispatcher {
    injector: Box<dyn PointerInjector>,
    screens: Box<dyn ScreenGeometry>,
    window: Box<dyn ActiveWindow>,
}

impl ActionDispatcher {
    pub fn new(
        injector: Box<dyn PointerInjector>,
        screens: Box<dyn ScreenGeometry>,
        window: Box<dyn ActiveWindow>,
    ) -> Self {
        Self {
            injector,
            screens,
            window,
        }
    }

    /// Performs the point's action.
    ///
    /// A disabled point or a non-matching target application returns without
    /// injecting anything; both are expected skips, not failures. The
    /// coordinate is resolved once before the loop and reused for every
    /// repetition; `delay_ms` sleeps precede every repetition except the
    /// first.
    pub fn execute(&self, point: &ActionPoint) {
        if !point.is_enabled {
            return;
        }

        if !point.target_application_name.is_empty() {
            let foreground = self.window.process_name();
            if !process_matches(&foreground, &point.target_application_name) {
                log::debug!(
                    "dispatch: skipping '{}', foreground is '{}' not '{}'",
                    point.name,
                    foreground,
                    point.target_application_name
                );
                return;
            }
        }

        let (x, y) = self.screens.resolve(point.screen_index, point.x, point.y);
        let repeats = point.repeat_count.max(1);

        for repetition in 0..repeats {
            if repetition > 0 && point.delay_ms > 0 {
                thread::sleep(Duration::from_millis(point.delay_ms));
            }
            if let Err(e) = self.inject_one(point.action, x, y) {
                log::warn!(
                    "dispatch: '{}' failed at repetition {}/{}: {}",
                    point.name,
                    repetition + 1,
                    repeats,
                    e
                );
                return;
            }
        }

        log::debug!(
            "dispatch: '{}' {:?} x{} at ({}, {})",
            point.name,
            point.action,
            repeats,
            x,
            y
        );
    }

    fn inject_one(&self, action: MouseAction, x: i32, y: i32) -> Result<(), PlatformError> {
        for (i, event) in action.events().iter().enumerate() {
            if i > 0 {
                thread::sleep(BUTTON_HOLD);
            }
            self.injector.inject(*event, x, y)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
