//! Configured action points.
//!
//! `ActionPoint` is the unit of configuration: a screen-relative coordinate,
//! a pointer action, repetition parameters, an optional target-application
//! filter, and the hotkey bound to it. The serde field names are the
//! persisted document's field names; the point list round-trips through the
//! JSON store in `config`.

use serde::{Deserialize, Serialize};

use crate::hotkey::Modifiers;
use crate::platform::{ButtonPhase, MouseButton, PointerEvent};

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// The pointer action a point performs.
///
/// Persisted as the variant's ordinal. Each kind maps to an ordered list of
/// primitive events via [`MouseAction::events`]; adding a kind means adding
/// a table row, not new branching in the injectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MouseAction {
    LeftClick,
    RightClick,
    DoubleClick,
    /// Button-down half only; pair with a `MouseUp` point for press-and-hold
    /// or drag sequences.
    MouseDown,
    MouseUp,
    MiddleClick,
}

impl MouseAction {
    /// The primitive events this action injects, in order.
    ///
    /// The dispatcher holds for a fixed interval between consecutive events
    /// (the down/up halves of a click); a `Double` phase is a single entry
    /// and the injector decides how to realize it.
    pub const fn events(self) -> &'static [PointerEvent] {
        use ButtonPhase::{Double, Down, Up};
        use MouseButton::{Left, Middle, Right};
        const LEFT_CLICK: &[PointerEvent] = &[
            PointerEvent::new(Left, Down),
            PointerEvent::new(Left, Up),
        ];
        const RIGHT_CLICK: &[PointerEvent] = &[
            PointerEvent::new(Right, Down),
            PointerEvent::new(Right, Up),
        ];
        const DOUBLE_CLICK: &[PointerEvent] = &[PointerEvent::new(Left, Double)];
        const MOUSE_DOWN: &[PointerEvent] = &[PointerEvent::new(Left, Down)];
        const MOUSE_UP: &[PointerEvent] = &[PointerEvent::new(Left, Up)];
        const MIDDLE_CLICK: &[PointerEvent] = &[
            PointerEvent::new(Middle, Down),
            PointerEvent::new(Middle, Up),
        ];
        match self {
            MouseAction::LeftClick => LEFT_CLICK,
            MouseAction::RightClick => RIGHT_CLICK,
            MouseAction::DoubleClick => DOUBLE_CLICK,
            MouseAction::MouseDown => MOUSE_DOWN,
            MouseAction::MouseUp => MOUSE_UP,
            MouseAction::MiddleClick => MIDDLE_CLICK,
        }
    }
}

impl From<MouseAction> for u8 {
    fn from(action: MouseAction) -> u8 {
        match action {
            MouseAction::LeftClick => 0,
            MouseAction::RightClick => 1,
            MouseAction::DoubleClick => 2,
            MouseAction::MouseDown => 3,
            MouseAction::MouseUp => 4,
            MouseAction::MiddleClick => 5,
        }
    }
}

impl TryFrom<u8> for MouseAction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MouseAction::LeftClick),
            1 => Ok(MouseAction::RightClick),
            2 => Ok(MouseAction::DoubleClick),
            3 => Ok(MouseAction::MouseDown),
            4 => Ok(MouseAction::MouseUp),
            5 => Ok(MouseAction::MiddleClick),
            other => Err(format!("unknown mouse action ordinal {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Action point
// ---------------------------------------------------------------------------

/// Virtual-key code meaning "no key bound".
pub const VK_NONE: u32 = 0;

/// One configured point: coordinate, action, repetition, filter, hotkey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPoint {
    /// Coordinate relative to the display selected by `screen_index`.
    pub x: i32,
    pub y: i32,
    /// Human-readable hotkey label, kept verbatim from the editor.
    #[serde(default)]
    pub hotkey_text: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Virtual-key code; `VK_NONE` means unbound.
    #[serde(default)]
    pub key: u32,
    pub action: MouseAction,
    /// Repetitions per trigger; treated as at least 1.
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
    /// Sleep between repetitions, starting from the second one.
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub name: String,
    /// Display the coordinate is relative to; out-of-range degrades to
    /// treating (x, y) as global.
    #[serde(default)]
    pub screen_index: i32,
    /// When non-empty, execution is gated on the foreground process matching
    /// this name case-insensitively.
    #[serde(default)]
    pub target_application_name: String,
}

fn default_repeat_count() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl ActionPoint {
    pub fn new(x: i32, y: i32, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            x,
            y,
            hotkey_text: String::new(),
            modifiers: Modifiers::NONE,
            key: VK_NONE,
            action: MouseAction::LeftClick,
            repeat_count: 1,
            delay_ms: 0,
            is_enabled: true,
            name: if name.is_empty() {
                format!("Point {x},{y}")
            } else {
                name
            },
            screen_index: 0,
            target_application_name: String::new(),
        }
    }

    /// True when the point carries a key for the registry to bind.
    pub fn has_hotkey(&self) -> bool {
        self.key != VK_NONE
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_actions_expand_to_down_up_pairs() {
        let events = MouseAction::LeftClick.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PointerEvent::new(MouseButton::Left, ButtonPhase::Down));
        assert_eq!(events[1], PointerEvent::new(MouseButton::Left, ButtonPhase::Up));

        let events = MouseAction::MiddleClick.events();
        assert_eq!(events[0].button, MouseButton::Middle);
        assert_eq!(events[1].phase, ButtonPhase::Up);
    }

    /// Half-actions inject exactly one half of the left-button pair.
    #[test]
    fn half_actions_are_single_events() {
        assert_eq!(
            MouseAction::MouseDown.events(),
            &[PointerEvent::new(MouseButton::Left, ButtonPhase::Down)]
        );
        assert_eq!(
            MouseAction::MouseUp.events(),
            &[PointerEvent::new(MouseButton::Left, ButtonPhase::Up)]
        );
    }

    #[test]
    fn double_click_is_one_double_phase_event() {
        assert_eq!(
            MouseAction::DoubleClick.events(),
            &[PointerEvent::new(MouseButton::Left, ButtonPhase::Double)]
        );
    }

    /// The persisted document's field names and value encodings.
    #[test]
    fn deserializes_persisted_document_fields() {
        let doc = r#"{
            "x": 640,
            "y": 360,
            "hotkey_text": "Ctrl+F2",
            "modifiers": 2,
            "key": 113,
            "action": 1,
            "repeat_count": 3,
            "delay_ms": 100,
            "is_enabled": false,
            "name": "loot",
            "screen_index": 1,
            "target_application_name": "notepad"
        }"#;
        let point: ActionPoint = serde_json::from_str(doc).unwrap();
        assert_eq!((point.x, point.y), (640, 360));
        assert_eq!(point.modifiers, Modifiers::CONTROL);
        assert_eq!(point.key, 113);
        assert_eq!(point.action, MouseAction::RightClick);
        assert_eq!(point.repeat_count, 3);
        assert_eq!(point.delay_ms, 100);
        assert!(!point.is_enabled);
        assert_eq!(point.screen_index, 1);
        assert_eq!(point.target_application_name, "notepad");
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let point: ActionPoint =
            serde_json::from_str(r#"{"x": 1, "y": 2, "action": 0}"#).unwrap();
        assert_eq!(point.repeat_count, 1);
        assert!(point.is_enabled);
        assert_eq!(point.key, VK_NONE);
        assert!(!point.has_hotkey());
        assert!(point.target_application_name.is_empty());
    }

    #[test]
    fn unknown_action_ordinal_is_an_error() {
        let result = serde_json::from_str::<ActionPoint>(r#"{"x": 0, "y": 0, "action": 9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn action_ordinal_round_trips() {
        for action in [
            MouseAction::LeftClick,
            MouseAction::RightClick,
            MouseAction::DoubleClick,
            MouseAction::MouseDown,
            MouseAction::MouseUp,
            MouseAction::MiddleClick,
        ] {
            let ordinal = u8::from(action);
            assert_eq!(MouseAction::try_from(ordinal).unwrap(), action);
        }
    }
}
