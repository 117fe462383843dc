//! Hardware-level injector with cursor confinement (Strategy B).
//!
//! `SendInput` mouse events reach every target, including applications that
//! ignore posted messages, but they act through the real cursor. To keep a
//! concurrent human hand on the mouse from dragging the click off target,
//! the real cursor is confined to a 1-pixel-radius box for the duration of
//! the injection: record the position, clip around it, release momentarily
//! to jump to the target, re-clip there, inject, then release and restore.
//!
//! `CursorGuard` owns the confinement and the recorded position; its `Drop`
//! releases the clip rectangle and restores the cursor, so the machine-wide
//! confinement state is unwound on every exit path. A dangling clip would
//! lock the user's cursor to a 2-pixel box indefinitely.

use std::mem;
use std::ptr;
use std::thread;
use std::time::Duration;

use windows_sys::Win32::Foundation::{POINT, RECT};
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_VIRTUALDESK, MOUSEINPUT,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    ClipCursor, GetCursorPos, GetSystemMetrics, SetCursorPos, SM_CXVIRTUALSCREEN,
    SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};

use crate::platform::{ButtonPhase, MouseButton, PlatformError, PointerEvent, PointerInjector};

/// Pause between the two down/up pairs of a synthesized double click.
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(50);

pub struct SendInputInjector;

impl PointerInjector for SendInputInjector {
    fn inject(&self, event: PointerEvent, x: i32, y: i32) -> Result<(), PlatformError> {
        // Guard drops on every path below, releasing the clip and restoring
        // the recorded position even when the move or injection fails.
        let _guard = CursorGuard::acquire()?;

        release_clip();
        if unsafe { SetCursorPos(x, y) } == 0 {
            return Err(PlatformError::Injection(format!(
                "SetCursorPos({x}, {y}) failed"
            )));
        }
        clip_around(POINT { x, y });

        match event.phase {
            ButtonPhase::Down => send_button(event.button, true, x, y),
            ButtonPhase::Up => send_button(event.button, false, x, y),
            ButtonPhase::Double => {
                send_pair(event.button, x, y)?;
                thread::sleep(DOUBLE_CLICK_GAP);
                send_pair(event.button, x, y)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cursor confinement
// ---------------------------------------------------------------------------

/// Scoped cursor confinement plus position restore.
struct CursorGuard {
    origin: POINT,
}

impl CursorGuard {
    /// Records the current cursor position and confines the cursor to a
    /// 1-pixel-radius box around it.
    fn acquire() -> Result<Self, PlatformError> {
        let mut origin = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut origin) } == 0 {
            return Err(PlatformError::Injection("GetCursorPos failed".into()));
        }
        clip_around(origin);
        Ok(Self { origin })
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        release_clip();
        unsafe {
            SetCursorPos(self.origin.x, self.origin.y);
        }
    }
}

fn clip_around(p: POINT) {
    let rect = RECT {
        left: p.x - 1,
        top: p.y - 1,
        right: p.x + 1,
        bottom: p.y + 1,
    };
    unsafe {
        ClipCursor(&rect);
    }
}

fn release_clip() {
    unsafe {
        ClipCursor(ptr::null());
    }
}

// ---------------------------------------------------------------------------
// SendInput plumbing
// ---------------------------------------------------------------------------

fn send_button(button: MouseButton, down: bool, x: i32, y: i32) -> Result<(), PlatformError> {
    let input = mouse_input(button_flags(button, down), x, y);
    let sent = unsafe { SendInput(1, &input, mem::size_of::<INPUT>() as i32) };
    if sent != 1 {
        return Err(PlatformError::Injection(format!(
            "SendInput queued {sent}/1 events"
        )));
    }
    Ok(())
}

/// One rapid down/up pair, queued in a single `SendInput` call.
fn send_pair(button: MouseButton, x: i32, y: i32) -> Result<(), PlatformError> {
    let inputs = [
        mouse_input(button_flags(button, true), x, y),
        mouse_input(button_flags(button, false), x, y),
    ];
    let sent = unsafe { SendInput(2, inputs.as_ptr(), mem::size_of::<INPUT>() as i32) };
    if sent != 2 {
        return Err(PlatformError::Injection(format!(
            "SendInput queued {sent}/2 events"
        )));
    }
    Ok(())
}

fn button_flags(button: MouseButton, down: bool) -> u32 {
    match (button, down) {
        (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
        (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
        (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
        (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
        (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
    }
}

/// Builds an `INPUT` tagged with the target coordinate, normalized to the
/// 0..=65535 virtual-desktop range `MOUSEEVENTF_ABSOLUTE` expects.
fn mouse_input(button_flags: u32, x: i32, y: i32) -> INPUT {
    let (dx, dy) = unsafe {
        let vx = GetSystemMetrics(SM_XVIRTUALSCREEN);
        let vy = GetSystemMetrics(SM_YVIRTUALSCREEN);
        let cx = GetSystemMetrics(SM_CXVIRTUALSCREEN);
        let cy = GetSystemMetrics(SM_CYVIRTUALSCREEN);
        (normalize(x, vx, cx), normalize(y, vy, cy))
    };
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK | MOUSEEVENTF_MOVE
                    | button_flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Maps a virtual-desktop coordinate to the 0..=65535 absolute range.
fn normalize(value: i32, origin: i32, extent: i32) -> i32 {
    let extent = i64::from(extent.max(1));
    ((i64::from(value) - i64::from(origin)) * 65535 / extent) as i32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
