//! Platform abstraction layer.
//!
//! Defines the seams the portable core talks to: `PointerInjector`
//! (synthetic mouse input), `ScreenGeometry` (display enumeration and
//! coordinate resolution), and `ActiveWindow` (foreground process/window
//! lookup). The Win32 backend lives in `windows/`; tests use the recording
//! backends in `mock`.

#[cfg(test)]
pub mod mock;
#[cfg(target_os = "windows")]
pub mod windows;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by platform backends.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Installing an OS-level hook failed. Fatal to the component that
    /// needed the hook; it cannot do its job without one.
    #[error("hook installation failed: {0}")]
    HookInstall(String),
    /// An input-injection call failed. Logged by the dispatcher, never
    /// propagated into the hotkey pipeline.
    #[error("input injection failed: {0}")]
    Injection(String),
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Pointer primitives
// ---------------------------------------------------------------------------

/// Physical mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Phase of a button event.
///
/// `Double` is a first-class phase rather than a down/up expansion because
/// the two injection strategies realize it differently: message posting has
/// a dedicated double-click window message, hardware injection sends two
/// rapid down/up pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPhase {
    Down,
    Up,
    Double,
}

/// One primitive pointer event to inject at a resolved coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub button: MouseButton,
    pub phase: ButtonPhase,
}

impl PointerEvent {
    pub const fn new(button: MouseButton, phase: ButtonPhase) -> Self {
        Self { button, phase }
    }
}

// ---------------------------------------------------------------------------
// Injection strategy
// ---------------------------------------------------------------------------

/// Which injection mechanism the dispatcher uses.
///
/// A deployment-time choice made in the settings file, not a runtime branch:
/// the two strategies have genuinely different side effects. Message posting
/// never disturbs the real cursor but only works against windows that treat
/// posted button messages as input; hardware injection works universally but
/// visibly moves the cursor and needs the confinement dance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectionStrategy {
    /// Post button messages to the window under the target coordinate.
    #[default]
    PostMessage,
    /// Hardware-level synthetic input with cursor confinement.
    SendInput,
}

// ---------------------------------------------------------------------------
// Trait seams
// ---------------------------------------------------------------------------

/// Injects a single pointer event at a global-desktop coordinate.
pub trait PointerInjector: Send {
    fn inject(&self, event: PointerEvent, x: i32, y: i32) -> Result<(), PlatformError>;
}

/// Foreground window introspection.
///
/// Both methods degrade to an empty string when the foreground window or its
/// owning process cannot be determined; callers treat an empty name as
/// "unknown, matches no target filter". Neither method ever errors.
pub trait ActiveWindow: Send {
    fn process_name(&self) -> String;
    fn window_title(&self) -> String;
}

/// Bounds of one physical display in global-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Display enumeration and screen-relative coordinate resolution.
///
/// `enumerate` is recomputed on every call -- displays can be hot-plugged,
/// so nothing here caches.
pub trait ScreenGeometry: Send {
    fn enumerate(&self) -> Vec<ScreenBounds>;

    fn screen_count(&self) -> usize {
        self.enumerate().len()
    }

    /// Maps a (screen_index, local_x, local_y) triple to a global-desktop
    /// coordinate. See [`resolve_global`] for the fallback policy.
    fn resolve(&self, screen_index: i32, local_x: i32, local_y: i32) -> (i32, i32) {
        resolve_global(&self.enumerate(), screen_index, local_x, local_y)
    }
}

/// Translates a screen-relative point by that screen's origin.
///
/// An out-of-range index (negative, or referencing a display that has since
/// been disconnected) falls back to treating the point as already being in
/// global-desktop coordinates. Saved points must stay usable across monitor
/// configuration changes, so this degrades instead of erroring.
pub fn resolve_global(
    bounds: &[ScreenBounds],
    screen_index: i32,
    local_x: i32,
    local_y: i32,
) -> (i32, i32) {
    if screen_index >= 0 {
        if let Some(screen) = bounds.get(screen_index as usize) {
            return (screen.x + local_x, screen.y + local_y);
        }
    }
    (local_x, local_y)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn two_screens() -> Vec<ScreenBounds> {
        vec![
            ScreenBounds {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            },
            ScreenBounds {
                x: 1920,
                y: -200,
                width: 2560,
                height: 1440,
            },
        ]
    }

    #[test]
    fn resolve_translates_by_screen_origin() {
        let screens = two_screens();
        assert_eq!(resolve_global(&screens, 0, 100, 50), (100, 50));
        assert_eq!(resolve_global(&screens, 1, 100, 50), (2020, -150));
    }

    /// Out-of-range indexes fall back to global coordinates unchanged.
    #[test]
    fn resolve_out_of_range_falls_back_to_global() {
        let screens = two_screens();
        assert_eq!(resolve_global(&screens, 2, 100, 50), (100, 50));
        assert_eq!(resolve_global(&screens, -1, 300, 400), (300, 400));
        assert_eq!(resolve_global(&[], 0, 7, 9), (7, 9));
    }

    #[test]
    fn trait_defaults_delegate_to_enumerate() {
        struct Fixed;
        impl ScreenGeometry for Fixed {
            fn enumerate(&self) -> Vec<ScreenBounds> {
                vec![ScreenBounds {
                    x: 10,
                    y: 20,
                    width: 800,
                    height: 600,
                }]
            }
        }
        let geo = Fixed;
        assert_eq!(geo.screen_count(), 1);
        assert_eq!(geo.resolve(0, 5, 5), (15, 25));
        assert_eq!(geo.resolve(3, 5, 5), (5, 5));
    }
}
