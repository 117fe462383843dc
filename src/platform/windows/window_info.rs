//! Foreground window introspection.
//!
//! Failure policy: every path degrades to an empty string -- no foreground
//! window, a pid of 0, access denied on `OpenProcess`, or a failed query
//! all mean "unknown". Callers treat an empty name as matching no target
//! filter. The process-name lookup is also called from the keyboard hook
//! thread, so it stays a handful of bounded syscalls with no allocation
//! beyond the result.

use std::path::Path;

use windows_sys::Win32::Foundation::CloseHandle;
use windows_sys::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
};

use crate::platform::ActiveWindow;

/// Resolves the foreground window through the Win32 APIs.
pub struct WindowsActiveWindow;

impl ActiveWindow for WindowsActiveWindow {
    fn process_name(&self) -> String {
        foreground_process_name()
    }

    fn window_title(&self) -> String {
        foreground_window_title()
    }
}

/// Executable stem (no directory, no extension) of the process owning the
/// foreground window, or `""` when it cannot be determined.
pub(crate) fn foreground_process_name() -> String {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.is_null() {
            return String::new();
        }

        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, &mut pid);
        if pid == 0 {
            return String::new();
        }

        let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if process.is_null() {
            return String::new();
        }

        let mut buf = [0u16; 1024];
        let mut len = buf.len() as u32;
        let ok = QueryFullProcessImageNameW(process, PROCESS_NAME_WIN32, buf.as_mut_ptr(), &mut len);
        CloseHandle(process);
        if ok == 0 {
            return String::new();
        }

        let path = String::from_utf16_lossy(&buf[..len as usize]);
        Path::new(&path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Title of the foreground window, or `""` when it cannot be determined.
pub(crate) fn foreground_window_title() -> String {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.is_null() {
            return String::new();
        }

        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, buf.as_mut_ptr(), buf.len() as i32);
        if len <= 0 {
            return String::new();
        }
        String::from_utf16_lossy(&buf[..len as usize])
    }
}
