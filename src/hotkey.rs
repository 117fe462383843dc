//! Hotkey registration channel logic.
//!
//! The registry binds a key through exactly one of two channels and picks
//! the channel itself; callers never choose:
//!
//! - **OS-registration channel**: the native global-hotkey facility
//!   (`RegisterHotKey`), bound to a numeric id, delivered as a message to a
//!   hidden window. Fires regardless of the foreground application, and is
//!   the only channel that accepts a modifier set.
//! - **Hook channel**: a process-wide low-level keyboard hook. Used only for
//!   unmodified single keys scoped to one target application -- broadcasting
//!   an unmodified key globally would be disruptive, so the match is gated
//!   on the foreground process at dispatch time instead.
//!
//! The decision functions here are pure so the routing rules are unit
//! tested without touching the OS; the Win32 registry in
//! `platform::windows::hotkeys` consumes them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PlatformError;

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// Hotkey modifier set.
///
/// Bit values match the Win32 `MOD_*` registration flags and the persisted
/// document's `modifiers` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const ALT: Modifiers = Modifiers(0x0001);
    pub const CONTROL: Modifiers = Modifiers(0x0002);
    pub const SHIFT: Modifiers = Modifiers(0x0004);
    pub const WIN: Modifiers = Modifiers(0x0008);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (bit, label) in [
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::WIN, "Win"),
        ] {
            if self.contains(bit) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(label)?;
                first = false;
            }
        }
        if first {
            f.write_str("None")?;
        }
        Ok(())
    }
}

/// Log-friendly "Ctrl+F2" style label for a binding.
pub fn describe_hotkey(modifiers: Modifiers, key: u32) -> String {
    let key_name = match key {
        0x30..=0x39 | 0x41..=0x5A => {
            char::from_u32(key).map(String::from).unwrap_or_default()
        }
        0x70..=0x87 => format!("F{}", key - 0x6F),
        0x20 => "Space".into(),
        0x0D => "Enter".into(),
        0x1B => "Esc".into(),
        0x09 => "Tab".into(),
        other => format!("0x{other:02X}"),
    };
    if modifiers.is_empty() {
        key_name
    } else {
        format!("{modifiers}+{key_name}")
    }
}

// ---------------------------------------------------------------------------
// Channel routing
// ---------------------------------------------------------------------------

/// Opaque handle a fired event reports back; the controller uses the
/// point's index in its list.
pub type HandlerTag = usize;

/// Which facility a registration is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Hook,
    OsRegistration,
}

/// Picks the channel for one registration.
///
/// The hook channel is used exactly when there are no modifiers and the
/// point is scoped to a target application; everything else goes through
/// the OS facility, which requires (on some configurations) a non-empty
/// modifier set and fires regardless of focus.
pub fn choose_channel(modifiers: Modifiers, target_app: &str) -> Channel {
    if modifiers.is_empty() && !target_app.is_empty() {
        Channel::Hook
    } else {
        Channel::OsRegistration
    }
}

/// A hook-channel binding: key -> handler, gated on a foreground process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookBinding {
    pub tag: HandlerTag,
    pub target_app: String,
}

/// Outcome of a hook-channel keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Emit the fired event and consume the keystroke.
    Fire(HandlerTag),
    /// Forward the keystroke to the next hook in the chain unmodified.
    PassThrough,
}

/// Case-insensitive target filter. An empty foreground name means the
/// process could not be determined and never matches.
pub fn process_matches(foreground: &str, target: &str) -> bool {
    !foreground.is_empty() && foreground.eq_ignore_ascii_case(target)
}

/// Decides whether a bound key fires given the current foreground process.
pub fn hook_decision(binding: Option<&HookBinding>, foreground: &str) -> HookDecision {
    match binding {
        Some(b) if process_matches(foreground, &b.target_app) => HookDecision::Fire(b.tag),
        _ => HookDecision::PassThrough,
    }
}

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// The registration surface the controller drives.
///
/// Implemented by the Win32 `HotkeyRegistry`; mocked in controller tests.
pub trait HotkeyBackend: Send {
    /// Binds `key` (+`modifiers`) to `tag` through the channel chosen by
    /// [`choose_channel`]. Returns `Ok(false)` when the key is the null key
    /// or the OS refuses the combination (typically owned by another
    /// process) -- never retried, the caller leaves the point unbound.
    fn register(
        &mut self,
        modifiers: Modifiers,
        key: u32,
        target_app: &str,
        tag: HandlerTag,
    ) -> Result<bool, RegistryError>;

    /// Releases every OS-channel binding and clears the hook table.
    /// Idempotent; safe when nothing is registered.
    fn unregister_all(&mut self) -> Result<(), RegistryError>;
}

/// Registry lifecycle and registration errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A second registry was constructed while one is Active. Global hooks
    /// are process-singletons; at most one registry may be Active at a time.
    #[error("a hotkey registry is already active in this process")]
    AlreadyActive,
    /// An operation was invoked after `dispose()`. Lifecycle bug in the
    /// caller; fails loudly instead of silently doing nothing.
    #[error("hotkey registry used after dispose")]
    Disposed,
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmodified_key_with_target_routes_through_hook() {
        assert_eq!(choose_channel(Modifiers::NONE, "notepad"), Channel::Hook);
    }

    /// Any modifier forces the OS channel, target application or not.
    #[test]
    fn modified_key_always_routes_through_os_channel() {
        assert_eq!(
            choose_channel(Modifiers::CONTROL, "notepad"),
            Channel::OsRegistration
        );
        assert_eq!(
            choose_channel(Modifiers::CONTROL.with(Modifiers::SHIFT), ""),
            Channel::OsRegistration
        );
    }

    #[test]
    fn unmodified_key_without_target_routes_through_os_channel() {
        assert_eq!(choose_channel(Modifiers::NONE, ""), Channel::OsRegistration);
    }

    #[test]
    fn hook_fires_only_on_matching_foreground() {
        let binding = HookBinding {
            tag: 4,
            target_app: "Notepad".into(),
        };
        assert_eq!(
            hook_decision(Some(&binding), "notepad"),
            HookDecision::Fire(4)
        );
        assert_eq!(
            hook_decision(Some(&binding), "chrome"),
            HookDecision::PassThrough
        );
    }

    /// Unknown foreground (empty string) must never match a target filter.
    #[test]
    fn unknown_foreground_passes_through() {
        let binding = HookBinding {
            tag: 0,
            target_app: "notepad".into(),
        };
        assert_eq!(hook_decision(Some(&binding), ""), HookDecision::PassThrough);
    }

    #[test]
    fn unbound_key_passes_through() {
        assert_eq!(hook_decision(None, "notepad"), HookDecision::PassThrough);
    }

    #[test]
    fn modifier_display_is_stable() {
        assert_eq!(Modifiers::NONE.to_string(), "None");
        assert_eq!(
            Modifiers::CONTROL.with(Modifiers::ALT).to_string(),
            "Ctrl+Alt"
        );
        assert_eq!(describe_hotkey(Modifiers::CONTROL, 0x71), "Ctrl+F2");
        assert_eq!(describe_hotkey(Modifiers::NONE, 0x41), "A");
    }

    #[test]
    fn modifiers_serialize_as_mod_bits() {
        let value = serde_json::to_value(Modifiers::CONTROL.with(Modifiers::SHIFT)).unwrap();
        assert_eq!(value, serde_json::json!(6));
    }
}
