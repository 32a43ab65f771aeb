use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraMovement;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(button) = parse_named_key(name) {
            return Some(button);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_uppercase()));
            }
            if let Some(digit) = ch.to_digit(10) {
                return Some(Self::Digit(digit as u8));
            }
        }
        if let Some(function) = name.strip_prefix('F').or_else(|| name.strip_prefix('f')) {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=25).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "Left" => Left,
        "Right" => Right,
        "Up" => Up,
        "Down" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "LeftCtrl" | "LControl" => LeftCtrl,
        "RightCtrl" | "RControl" => RightCtrl,
        "[" | "LeftBracket" => LeftBracket,
        "]" | "RightBracket" => RightBracket,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-alphanumeric keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftBracket,
    RightBracket,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "left",
            1 => "right",
            2 => "middle",
            _ => "unhandled",
        }
    }
}

/// Something the viewer does while a key is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Move(CameraMovement),
    Exit,
    Perspective,
    Orthographic,
    Wireframe,
    Fill,
    LampsOn,
    SunOn,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::Move(CameraMovement::Forward),
        Action::Move(CameraMovement::Backward),
        Action::Move(CameraMovement::Left),
        Action::Move(CameraMovement::Right),
        Action::Move(CameraMovement::Up),
        Action::Move(CameraMovement::Down),
        Action::Exit,
        Action::Perspective,
        Action::Orthographic,
        Action::Wireframe,
        Action::Fill,
        Action::LampsOn,
        Action::SunOn,
    ];

    /// Name used for this action in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Action::Move(CameraMovement::Forward) => "forward",
            Action::Move(CameraMovement::Backward) => "backward",
            Action::Move(CameraMovement::Left) => "left",
            Action::Move(CameraMovement::Right) => "right",
            Action::Move(CameraMovement::Up) => "up",
            Action::Move(CameraMovement::Down) => "down",
            Action::Exit => "exit",
            Action::Perspective => "perspective",
            Action::Orthographic => "orthographic",
            Action::Wireframe => "wireframe",
            Action::Fill => "fill",
            Action::LampsOn => "lamps_on",
            Action::SunOn => "sun_on",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("unknown key `{key}` bound to `{action}`")]
    UnknownKey { action: String, key: String },
}

/// Maps keys to actions. Each action is bound to exactly one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: BTreeMap<&'static str, (KeyCode, Action)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use CameraMovement::*;
        let defaults = [
            (KeyCode::Character('W'), Action::Move(Forward)),
            (KeyCode::Character('S'), Action::Move(Backward)),
            (KeyCode::Character('A'), Action::Move(Left)),
            (KeyCode::Character('D'), Action::Move(Right)),
            (KeyCode::Character('Q'), Action::Move(Up)),
            (KeyCode::Character('E'), Action::Move(Down)),
            (KeyCode::Named(NamedKey::Escape), Action::Exit),
            (KeyCode::Character('P'), Action::Perspective),
            (KeyCode::Character('O'), Action::Orthographic),
            (KeyCode::Named(NamedKey::Right), Action::Wireframe),
            (KeyCode::Named(NamedKey::Left), Action::Fill),
            (KeyCode::Named(NamedKey::LeftBracket), Action::LampsOn),
            (KeyCode::Named(NamedKey::RightBracket), Action::SunOn),
        ];
        Self {
            bindings: defaults
                .into_iter()
                .map(|(key, action)| (action.name(), (key, action)))
                .collect(),
        }
    }
}

impl KeyBindings {
    /// Applies `action name -> key name` overrides on top of the defaults.
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, BindingError> {
        let mut bindings = Self::default();
        for (action_name, key_name) in overrides {
            let action = Action::from_name(action_name)
                .ok_or_else(|| BindingError::UnknownAction(action_name.to_string()))?;
            let key = KeyCode::from_name(key_name).ok_or_else(|| BindingError::UnknownKey {
                action: action_name.to_string(),
                key: key_name.to_string(),
            })?;
            bindings.bind(key, action);
        }
        Ok(bindings)
    }

    pub fn bind(&mut self, key: KeyCode, action: Action) {
        self.bindings.insert(action.name(), (key, action));
    }

    pub fn key_for(&self, action: Action) -> Option<KeyCode> {
        self.bindings.get(action.name()).map(|(key, _)| *key)
    }

    /// Actions bound to `key`, in a stable order.
    pub fn actions_for(&self, key: KeyCode) -> impl Iterator<Item = Action> + '_ {
        self.bindings
            .values()
            .filter(move |(bound, _)| *bound == key)
            .map(|(_, action)| *action)
    }
}

/// Keys and buttons currently held, polled once per frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn set_mouse_button_down(&mut self, button: MouseButton) {
        self.mouse_buttons.insert(button);
    }

    pub fn set_mouse_button_up(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    pub fn is_key_down_by_name(&self, name: &str) -> bool {
        KeyCode::from_name(name).is_some_and(|key| self.is_key_down(key))
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Actions whose key is currently held, in binding order.
    pub fn held_actions<'a>(&'a self, bindings: &'a KeyBindings) -> impl Iterator<Item = Action> + 'a {
        Action::ALL
            .into_iter()
            .filter(move |action| bindings.key_for(*action).is_some_and(|key| self.is_key_down(key)))
    }
}

/// Converts absolute cursor positions into look offsets.
///
/// The first event only seeds the last position so that capturing the cursor
/// does not produce a large jump.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseTracker {
    last: Option<Vec2>,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(xoffset, yoffset)` with y reversed, since window y grows downward.
    pub fn offset(&mut self, position: Vec2) -> Vec2 {
        let last = self.last.replace(position).unwrap_or(position);
        Vec2::new(position.x - last.x, last.y - position.y)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(
            KeyCode::from_name("Space"),
            Some(KeyCode::Named(NamedKey::Space))
        );
        assert_eq!(KeyCode::from_name("a"), Some(KeyCode::Character('A')));
        assert_eq!(KeyCode::from_name("7"), Some(KeyCode::Digit(7)));
        assert_eq!(KeyCode::from_name("F12"), Some(KeyCode::Function(12)));
        assert_eq!(
            KeyCode::from_name("["),
            Some(KeyCode::Named(NamedKey::LeftBracket))
        );
        assert_eq!(KeyCode::from_name("F40"), None);
        assert_eq!(KeyCode::from_name("?"), None);
    }

    #[test]
    fn default_bindings_match_scene_controls() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.key_for(Action::Move(CameraMovement::Forward)),
            Some(KeyCode::Character('W'))
        );
        assert_eq!(
            bindings.key_for(Action::Move(CameraMovement::Up)),
            Some(KeyCode::Character('Q'))
        );
        assert_eq!(
            bindings.key_for(Action::LampsOn),
            Some(KeyCode::Named(NamedKey::LeftBracket))
        );
        let actions: Vec<_> = bindings
            .actions_for(KeyCode::Named(NamedKey::Escape))
            .collect();
        assert_eq!(actions, vec![Action::Exit]);
    }

    #[test]
    fn overrides_replace_default_keys() {
        let bindings = KeyBindings::with_overrides([("forward", "Up"), ("exit", "X")]).unwrap();
        assert_eq!(
            bindings.key_for(Action::Move(CameraMovement::Forward)),
            Some(KeyCode::Named(NamedKey::Up))
        );
        assert_eq!(bindings.key_for(Action::Exit), Some(KeyCode::Character('X')));
        assert_eq!(bindings.actions_for(KeyCode::Character('W')).count(), 0);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        assert_eq!(
            KeyBindings::with_overrides([("jump", "Space")]),
            Err(BindingError::UnknownAction("jump".into()))
        );
        assert!(matches!(
            KeyBindings::with_overrides([("forward", "Hyperspace")]),
            Err(BindingError::UnknownKey { .. })
        ));
    }

    #[test]
    fn input_state_tracks_keys() {
        let mut state = InputState::new();
        state.set_key_down(KeyCode::Named(NamedKey::Space));
        assert!(state.is_key_down_by_name("Space"));
        state.set_key_up(KeyCode::Named(NamedKey::Space));
        assert!(!state.is_key_down_by_name("Space"));
    }

    #[test]
    fn held_actions_follow_bindings() {
        let bindings = KeyBindings::default();
        let mut state = InputState::new();
        state.set_key_down(KeyCode::Character('W'));
        state.set_key_down(KeyCode::Character('D'));
        state.set_key_down(KeyCode::Character('Z'));
        let held: Vec<_> = state.held_actions(&bindings).collect();
        assert_eq!(
            held,
            vec![
                Action::Move(CameraMovement::Forward),
                Action::Move(CameraMovement::Right)
            ]
        );
    }

    #[test]
    fn first_cursor_event_is_seeded() {
        let mut tracker = MouseTracker::new();
        assert_eq!(tracker.offset(Vec2::new(640.0, 360.0)), Vec2::ZERO);
        assert_eq!(tracker.offset(Vec2::new(650.0, 350.0)), Vec2::new(10.0, 10.0));
        tracker.reset();
        assert_eq!(tracker.offset(Vec2::new(0.0, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn mouse_button_labels() {
        assert_eq!(MouseButton::LEFT.label(), "left");
        assert_eq!(MouseButton::MIDDLE.label(), "middle");
        assert_eq!(MouseButton::new(7).label(), "unhandled");
    }
}
