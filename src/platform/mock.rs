//! Recording and stub backends for tests.
//!
//! Implement the platform traits without touching any OS API so the
//! dispatch and controller logic can be exercised anywhere.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::{
    ActiveWindow, PlatformError, PointerEvent, PointerInjector, ScreenBounds, ScreenGeometry,
};

/// One recorded injection.
#[derive(Debug, Clone)]
pub struct InjectedEvent {
    pub event: PointerEvent,
    pub x: i32,
    pub y: i32,
    pub at: Instant,
}

/// Records every injected event; optionally starts failing after a quota.
#[derive(Clone)]
pub struct RecordingInjector {
    events: Arc<Mutex<Vec<InjectedEvent>>>,
    fail_after: Option<usize>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            fail_after: None,
        }
    }

    /// Succeeds for the first `count` injections, then errors.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn events(&self) -> Vec<InjectedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PointerInjector for RecordingInjector {
    fn inject(&self, event: PointerEvent, x: i32, y: i32) -> Result<(), PlatformError> {
        let mut events = self.events.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if events.len() >= limit {
                return Err(PlatformError::Injection("simulated failure".into()));
            }
        }
        events.push(InjectedEvent {
            event,
            x,
            y,
            at: Instant::now(),
        });
        Ok(())
    }
}

/// Fixed display list.
pub struct FixedScreens(pub Vec<ScreenBounds>);

impl ScreenGeometry for FixedScreens {
    fn enumerate(&self) -> Vec<ScreenBounds> {
        self.0.clone()
    }
}

/// Reports a fixed foreground process name and title.
pub struct ForegroundStub {
    name: String,
    title: String,
}

impl ForegroundStub {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: format!("{name} - window"),
        }
    }
}

impl ActiveWindow for ForegroundStub {
    fn process_name(&self) -> String {
        self.name.clone()
    }

    fn window_title(&self) -> String {
        self.title.clone()
    }
}
