//! Win32 hotkey registry: RegisterHotKey + WH_KEYBOARD_LL.
//!
//! One background thread owns every OS resource: it registers a window
//! class, creates a message-only window to receive `WM_HOTKEY`, installs
//! the low-level keyboard hook, and runs the `GetMessageW` loop required
//! for both to deliver. `RegisterHotKey`/`UnregisterHotKey` must be called
//! on the thread that owns the window, so registrations travel to the loop
//! over an mpsc command channel with a `PostThreadMessageW` wake-up, and
//! the caller blocks on the reply.
//!
//! Callback storage: `WH_KEYBOARD_LL` hook procs receive no `user_info`
//! pointer, so the fired callback and the hook-channel binding table live
//! in process-globals handed over at construction. At most one
//! `HotkeyRegistry` may be Active at a time; a second construction is
//! rejected with `RegistryError::AlreadyActive`.
//!
//! Hook contract: the proc consumes a keystroke (returns 1) only when a
//! bound key fires against its matching foreground process; everything
//! else -- injected events, unbound keys, non-matching foreground -- is
//! forwarded via `CallNextHookEx`, and no panic may unwind across the
//! boundary.

use std::collections::HashMap;
use std::panic;
use std::ptr;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::System::Threading::GetCurrentThreadId;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, MOD_NOREPEAT,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GetMessageW, PostThreadMessageW, RegisterClassW, SetWindowsHookExW, TranslateMessage,
    UnhookWindowsHookEx, HC_ACTION, HWND_MESSAGE, KBDLLHOOKSTRUCT, LLKHF_INJECTED, MSG,
    WH_KEYBOARD_LL, WM_APP, WM_HOTKEY, WM_KEYDOWN, WM_QUIT, WNDCLASSW,
};

use super::window_info::foreground_process_name;
use crate::hotkey::{
    choose_channel, describe_hotkey, hook_decision, Channel, HandlerTag, HookBinding,
    HookDecision, HotkeyBackend, Modifiers, RegistryError,
};
use crate::platform::PlatformError;
use crate::point::VK_NONE;

/// Thread message that tells the loop to drain the command channel.
const WM_REGISTRY_COMMAND: u32 = WM_APP + 1;

// ---------------------------------------------------------------------------
// Process-global callback storage
// ---------------------------------------------------------------------------

/// Fired-event capability, installed at construction. Both channels emit
/// through it.
static FIRED_CALLBACK: Mutex<Option<Box<dyn Fn(HandlerTag) + Send>>> = Mutex::new(None);

/// Hook-channel bindings, consulted by the keyboard hook proc. A Vec keeps
/// the lock scope allocation-free on the hook's hot path; the table is a
/// handful of entries at most.
static HOOK_BINDINGS: Mutex<Vec<(u32, HookBinding)>> = Mutex::new(Vec::new());

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum Command {
    Register {
        id: i32,
        modifiers: u32,
        vk: u32,
        tag: HandlerTag,
        reply: mpsc::Sender<bool>,
    },
    UnregisterAll {
        reply: mpsc::Sender<()>,
    },
}

// ---------------------------------------------------------------------------
// Registry front object
// ---------------------------------------------------------------------------

/// Owns the registry thread. Active from construction until `dispose()`.
pub struct HotkeyRegistry {
    cmd_tx: mpsc::Sender<Command>,
    thread_id: u32,
    thread: Option<JoinHandle<()>>,
    /// Monotonic OS-registration id allocator.
    next_id: i32,
    disposed: bool,
}

impl HotkeyRegistry {
    /// Installs the hook and hotkey window; `on_fired` receives the tag of
    /// every triggered binding, on the registry thread, and must hand off
    /// quickly (the controller's callback is a channel send).
    ///
    /// Hook installation failure is fatal: without the hook the registry
    /// cannot honor hook-channel registrations, so construction errors
    /// instead of limping along.
    pub fn new(on_fired: Box<dyn Fn(HandlerTag) + Send>) -> Result<Self, RegistryError> {
        {
            let mut slot = FIRED_CALLBACK
                .lock()
                .map_err(|_| poisoned("fired-callback"))?;
            if slot.is_some() {
                return Err(RegistryError::AlreadyActive);
            }
            *slot = Some(on_fired);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, PlatformError>>();
        let thread = thread::spawn(move || registry_thread(cmd_rx, ready_tx));

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Self {
                cmd_tx,
                thread_id,
                thread: Some(thread),
                next_id: 1,
                disposed: false,
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                clear_globals();
                Err(e.into())
            }
            Err(_) => {
                let _ = thread.join();
                clear_globals();
                Err(RegistryError::Platform(PlatformError::Other(
                    "registry thread exited before reporting status".into(),
                )))
            }
        }
    }

    /// Transitions Active -> Disposed: releases every binding, stops the
    /// registry thread (which unhooks and destroys the window on exit), and
    /// clears the global callback slots. A second call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Err(e) = self.unregister_all() {
            log::warn!("hotkeys: unregister during dispose failed: {e}");
        }
        unsafe {
            PostThreadMessageW(self.thread_id, WM_QUIT, 0, 0);
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        clear_globals();
        self.disposed = true;
        log::info!("hotkeys: registry disposed");
    }

    fn wake_registry_thread(&self) {
        unsafe {
            PostThreadMessageW(self.thread_id, WM_REGISTRY_COMMAND, 0, 0);
        }
    }
}

impl HotkeyBackend for HotkeyRegistry {
    fn register(
        &mut self,
        modifiers: Modifiers,
        key: u32,
        target_app: &str,
        tag: HandlerTag,
    ) -> Result<bool, RegistryError> {
        if self.disposed {
            debug_assert!(false, "register called on a disposed HotkeyRegistry");
            return Err(RegistryError::Disposed);
        }
        if key == VK_NONE {
            return Ok(false);
        }

        match choose_channel(modifiers, target_app) {
            Channel::Hook => {
                let mut bindings = lock_bindings()?;
                // Last registration for a key wins, matching the batch
                // rebuild model.
                bindings.retain(|(vk, _)| *vk != key);
                bindings.push((
                    key,
                    HookBinding {
                        tag,
                        target_app: target_app.to_string(),
                    },
                ));
                log::debug!(
                    "hotkeys: {} routed through hook channel, scoped to '{}'",
                    describe_hotkey(modifiers, key),
                    target_app
                );
                Ok(true)
            }
            Channel::OsRegistration => {
                let id = self.next_id;
                self.next_id += 1;
                let (reply_tx, reply_rx) = mpsc::channel();
                self.cmd_tx
                    .send(Command::Register {
                        id,
                        modifiers: modifiers.bits(),
                        vk: key,
                        tag,
                        reply: reply_tx,
                    })
                    .map_err(|_| thread_gone())?;
                self.wake_registry_thread();
                let accepted = reply_rx.recv().map_err(|_| thread_gone())?;
                if accepted {
                    log::debug!(
                        "hotkeys: {} registered with the OS as id {}",
                        describe_hotkey(modifiers, key),
                        id
                    );
                }
                Ok(accepted)
            }
        }
    }

    fn unregister_all(&mut self) -> Result<(), RegistryError> {
        if self.disposed {
            debug_assert!(false, "unregister_all called on a disposed HotkeyRegistry");
            return Err(RegistryError::Disposed);
        }
        lock_bindings()?.clear();

        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(Command::UnregisterAll { reply: reply_tx })
            .map_err(|_| thread_gone())?;
        self.wake_registry_thread();
        reply_rx.recv().map_err(|_| thread_gone())
    }
}

impl Drop for HotkeyRegistry {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn clear_globals() {
    if let Ok(mut slot) = FIRED_CALLBACK.lock() {
        *slot = None;
    }
    if let Ok(mut bindings) = HOOK_BINDINGS.lock() {
        bindings.clear();
    }
}

fn poisoned(what: &str) -> RegistryError {
    RegistryError::Platform(PlatformError::Other(format!("{what} mutex poisoned")))
}

fn thread_gone() -> RegistryError {
    RegistryError::Platform(PlatformError::Other("registry thread is gone".into()))
}

fn lock_bindings(
) -> Result<std::sync::MutexGuard<'static, Vec<(u32, HookBinding)>>, RegistryError> {
    HOOK_BINDINGS.lock().map_err(|_| poisoned("hook-binding"))
}

// ---------------------------------------------------------------------------
// Registry thread
// ---------------------------------------------------------------------------

fn registry_thread(
    cmd_rx: mpsc::Receiver<Command>,
    ready_tx: mpsc::Sender<Result<u32, PlatformError>>,
) {
    let class_name: Vec<u16> = "ClickpointHotkeyWindow\0".encode_utf16().collect();

    unsafe {
        let instance = GetModuleHandleW(ptr::null());

        let mut class: WNDCLASSW = std::mem::zeroed();
        class.lpfnWndProc = Some(DefWindowProcW);
        class.hInstance = instance;
        class.lpszClassName = class_name.as_ptr();
        // Returns 0 when the class already exists (a previous registry in
        // this process); CreateWindowExW below decides whether that matters.
        RegisterClassW(&class);

        let hwnd = CreateWindowExW(
            0,
            class_name.as_ptr(),
            ptr::null(),
            0,
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            ptr::null_mut(),
            instance,
            ptr::null(),
        );
        if hwnd.is_null() {
            let _ = ready_tx.send(Err(PlatformError::Other(
                "CreateWindowExW failed for the hotkey window".into(),
            )));
            return;
        }

        let hook = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), ptr::null_mut(), 0);
        if hook.is_null() {
            DestroyWindow(hwnd);
            let _ = ready_tx.send(Err(PlatformError::HookInstall(
                "SetWindowsHookExW(WH_KEYBOARD_LL) failed".into(),
            )));
            return;
        }

        let _ = ready_tx.send(Ok(GetCurrentThreadId()));
        log::info!("hotkeys: WH_KEYBOARD_LL hook and hotkey window active");

        // OS-channel id -> tag table, touched only by this thread.
        let mut os_bindings: HashMap<i32, HandlerTag> = HashMap::new();

        // Message loop: required for WM_HOTKEY delivery and for the
        // low-level hook to be called. Returns 0 on WM_QUIT, -1 on error.
        let mut msg: MSG = std::mem::zeroed();
        while GetMessageW(&mut msg, ptr::null_mut(), 0, 0) > 0 {
            match msg.message {
                WM_REGISTRY_COMMAND => {
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        handle_command(hwnd, &mut os_bindings, cmd);
                    }
                }
                WM_HOTKEY => {
                    let id = msg.wParam as i32;
                    if let Some(&tag) = os_bindings.get(&id) {
                        emit_fired(tag);
                    }
                }
                _ => {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }

        log::info!("hotkeys: message loop exited");

        for id in os_bindings.keys() {
            UnregisterHotKey(hwnd, *id);
        }
        UnhookWindowsHookEx(hook);
        DestroyWindow(hwnd);
    }
}

unsafe fn handle_command(hwnd: HWND, os_bindings: &mut HashMap<i32, HandlerTag>, cmd: Command) {
    match cmd {
        Command::Register {
            id,
            modifiers,
            vk,
            tag,
            reply,
        } => {
            // MOD_NOREPEAT: holding the combination fires once per physical
            // press. The id -> tag entry is kept only when the OS accepted
            // the combination.
            let accepted = RegisterHotKey(hwnd, id, modifiers | MOD_NOREPEAT, vk) != 0;
            if accepted {
                os_bindings.insert(id, tag);
            }
            let _ = reply.send(accepted);
        }
        Command::UnregisterAll { reply } => {
            for id in os_bindings.keys() {
                UnregisterHotKey(hwnd, *id);
            }
            os_bindings.clear();
            let _ = reply.send(());
        }
    }
}

fn emit_fired(tag: HandlerTag) {
    if let Ok(slot) = FIRED_CALLBACK.lock() {
        if let Some(callback) = slot.as_ref() {
            callback(tag);
        }
    }
}

// ---------------------------------------------------------------------------
// Hook procedure
// ---------------------------------------------------------------------------

/// Low-level keyboard hook proc, called on the registry thread.
///
/// Consumes a keystroke (returns 1) only when a hook-channel binding fires;
/// every other event is forwarded so the rest of the system sees it
/// unmodified.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 && w_param as u32 == WM_KEYDOWN {
        let kb = &*(l_param as *const KBDLLHOOKSTRUCT);
        // Injected events are synthetic input, ours or another tool's;
        // never consume them.
        if kb.flags & LLKHF_INJECTED == 0 && consume_bound_key(kb.vkCode) {
            return 1;
        }
    }
    CallNextHookEx(ptr::null_mut(), n_code, w_param, l_param)
}

/// Fires a hook-channel binding when the foreground process matches its
/// target application.
///
/// Wrapped in `catch_unwind`: nothing may unwind across the hook boundary,
/// so a panic degrades to passing the keystroke through.
fn consume_bound_key(vk: u32) -> bool {
    panic::catch_unwind(|| {
        let binding = match HOOK_BINDINGS.lock() {
            Ok(bindings) => bindings
                .iter()
                .find(|(key, _)| *key == vk)
                .map(|(_, b)| b.clone()),
            Err(_) => None,
        };
        // Unbound keys skip the foreground lookup; the hook must return in
        // well under a millisecond and almost every keystroke lands here.
        if binding.is_none() {
            return false;
        }

        let foreground = foreground_process_name();
        match hook_decision(binding.as_ref(), &foreground) {
            HookDecision::Fire(tag) => {
                log::debug!("hotkeys: hook key {vk:#04x} fired against '{foreground}'");
                emit_fired(tag);
                true
            }
            HookDecision::PassThrough => false,
        }
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Disposing an already-disposed registry must be a no-op that touches
    /// no OS resource.
    #[test]
    fn dispose_twice_is_a_noop() {
        let (cmd_tx, _cmd_rx) = mpsc::channel();
        let mut registry = HotkeyRegistry {
            cmd_tx,
            thread_id: 0,
            thread: None,
            next_id: 1,
            disposed: true,
        };
        registry.dispose();
        registry.dispose();
    }
}
