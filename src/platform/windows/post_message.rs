//! Targeted message-posting injector (Strategy A).
//!
//! Finds the window under the resolved coordinate, translates to its client
//! space, and posts the button message with the client coordinates packed in
//! `lParam`. Never moves the real cursor and never changes focus, but only
//! works against windows that process posted button messages as real input;
//! the dispatcher reports the cases where no window accepts the post.

use windows_sys::Win32::Foundation::POINT;
use windows_sys::Win32::Graphics::Gdi::ScreenToClient;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    PostMessageW, WindowFromPoint, WM_LBUTTONDBLCLK, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MBUTTONDBLCLK, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_RBUTTONDBLCLK, WM_RBUTTONDOWN,
    WM_RBUTTONUP,
};

use crate::platform::{ButtonPhase, MouseButton, PlatformError, PointerEvent, PointerInjector};

pub struct PostMessageInjector;

impl PointerInjector for PostMessageInjector {
    fn inject(&self, event: PointerEvent, x: i32, y: i32) -> Result<(), PlatformError> {
        unsafe {
            let hwnd = WindowFromPoint(POINT { x, y });
            if hwnd.is_null() {
                return Err(PlatformError::Injection(format!(
                    "no window at ({x}, {y})"
                )));
            }

            let mut client = POINT { x, y };
            ScreenToClient(hwnd, &mut client);
            let lparam = client_lparam(client.x, client.y);

            let message = button_message(event.button, event.phase);
            if PostMessageW(hwnd, message, 0, lparam) == 0 {
                return Err(PlatformError::Injection(format!(
                    "PostMessageW({message:#06x}) at ({x}, {y}) failed"
                )));
            }

            log::debug!(
                "inject: posted {:#06x} to window under ({}, {}), client ({}, {})",
                message,
                x,
                y,
                client.x,
                client.y
            );
        }
        Ok(())
    }
}

/// Client coordinates packed as `MAKELPARAM(x, y)`.
fn client_lparam(x: i32, y: i32) -> isize {
    ((y as isize) << 16) | (x as isize & 0xFFFF)
}

/// The window message for one (button, phase) pair. The double phase posts
/// the dedicated double-click message rather than a down/up expansion.
fn button_message(button: MouseButton, phase: ButtonPhase) -> u32 {
    match (button, phase) {
        (MouseButton::Left, ButtonPhase::Down) => WM_LBUTTONDOWN,
        (MouseButton::Left, ButtonPhase::Up) => WM_LBUTTONUP,
        (MouseButton::Left, ButtonPhase::Double) => WM_LBUTTONDBLCLK,
        (MouseButton::Right, ButtonPhase::Down) => WM_RBUTTONDOWN,
        (MouseButton::Right, ButtonPhase::Up) => WM_RBUTTONUP,
        (MouseButton::Right, ButtonPhase::Double) => WM_RBUTTONDBLCLK,
        (MouseButton::Middle, ButtonPhase::Down) => WM_MBUTTONDOWN,
        (MouseButton::Middle, ButtonPhase::Up) => WM_MBUTTONUP,
        (MouseButton::Middle, ButtonPhase::Double) => WM_MBUTTONDBLCLK,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
