//! Display enumeration via `EnumDisplayMonitors`.
//!
//! Re-enumerated on every call; monitors can be hot-plugged between
//! sessions and even between two hotkey presses, and the result is a handful
//! of RECTs, so nothing is cached.

use std::ptr;

use windows_sys::Win32::Foundation::{BOOL, LPARAM, RECT};
use windows_sys::Win32::Graphics::Gdi::{EnumDisplayMonitors, HDC, HMONITOR};

use crate::platform::{ScreenBounds, ScreenGeometry};

/// Enumerates physical displays through the Win32 monitor APIs.
pub struct WindowsScreens;

impl ScreenGeometry for WindowsScreens {
    fn enumerate(&self) -> Vec<ScreenBounds> {
        let mut screens: Vec<ScreenBounds> = Vec::new();
        unsafe {
            EnumDisplayMonitors(
                ptr::null_mut(),
                ptr::null(),
                Some(monitor_enum_proc),
                &mut screens as *mut Vec<ScreenBounds> as LPARAM,
            );
        }
        if screens.is_empty() {
            log::warn!("screens: monitor enumeration returned nothing");
        }
        screens
    }
}

/// Appends each monitor's bounds to the Vec passed through `lparam`.
unsafe extern "system" fn monitor_enum_proc(
    _monitor: HMONITOR,
    _hdc: HDC,
    rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let screens = &mut *(lparam as *mut Vec<ScreenBounds>);
    let r = &*rect;
    screens.push(ScreenBounds {
        x: r.left,
        y: r.top,
        width: r.right - r.left,
        height: r.bottom - r.top,
    });
    1 // continue enumeration
}
