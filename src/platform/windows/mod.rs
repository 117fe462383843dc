//! Win32 platform backend.
//!
//! `HotkeyRegistry` (RegisterHotKey + WH_KEYBOARD_LL), foreground window
//! introspection, monitor enumeration, and the two pointer-injection
//! strategies. Factory functions return boxed trait objects for the
//! composition root.

pub mod hotkeys;
mod post_message;
mod screens;
mod send_input;
mod window_info;

use post_message::PostMessageInjector;
use screens::WindowsScreens;
use send_input::SendInputInjector;
use window_info::WindowsActiveWindow;

pub use hotkeys::HotkeyRegistry;

use crate::platform::{ActiveWindow, InjectionStrategy, PointerInjector, ScreenGeometry};

/// Returns the injector for the configured strategy.
pub fn create_injector(strategy: InjectionStrategy) -> Box<dyn PointerInjector> {
    match strategy {
        InjectionStrategy::PostMessage => Box::new(PostMessageInjector),
        InjectionStrategy::SendInput => Box::new(SendInputInjector),
    }
}

/// Returns the `GetForegroundWindow`-backed resolver.
pub fn create_active_window() -> Box<dyn ActiveWindow> {
    Box::new(WindowsActiveWindow)
}

/// Returns the `EnumDisplayMonitors`-backed geometry resolver.
pub fn create_screen_geometry() -> Box<dyn ScreenGeometry> {
    Box::new(WindowsScreens)
}
