//! Input event types and state tracking
//!
//! The runtime does not own the window; the host forwards keyboard and
//! mouse events through the engine, which translates them into these
//! payloads and hands them to the application callbacks. Input callbacks
//! return a handled flag so the host can route unconsumed events elsewhere.

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Digit 0
    Num0,
    /// Digit 1
    Num1,
    /// Digit 2
    Num2,
    /// Digit 3
    Num3,
    /// Digit 4
    Num4,
    /// Digit 5
    Num5,
    /// Digit 6
    Num6,
    /// Digit 7
    Num7,
    /// Digit 8
    Num8,
    /// Digit 9
    Num9,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Tab key
    Tab,
    /// Backspace key
    Backspace,
    /// Shift key
    Shift,
    /// Control key
    Control,
    /// Alt key
    Alt,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Any key the mapping does not recognize
    Unknown,
}

impl KeyCode {
    /// Map a browser `KeyboardEvent.keyCode` value to a key code.
    ///
    /// Unrecognized values map to [`KeyCode::Unknown`]; that is not an
    /// error, the application simply reports the event unhandled.
    pub fn from_scancode(code: u32) -> Self {
        match code {
            8 => Self::Backspace,
            9 => Self::Tab,
            13 => Self::Enter,
            16 => Self::Shift,
            17 => Self::Control,
            18 => Self::Alt,
            27 => Self::Escape,
            32 => Self::Space,
            37 => Self::Left,
            38 => Self::Up,
            39 => Self::Right,
            40 => Self::Down,
            48 => Self::Num0,
            49 => Self::Num1,
            50 => Self::Num2,
            51 => Self::Num3,
            52 => Self::Num4,
            53 => Self::Num5,
            54 => Self::Num6,
            55 => Self::Num7,
            56 => Self::Num8,
            57 => Self::Num9,
            65 => Self::A,
            66 => Self::B,
            67 => Self::C,
            68 => Self::D,
            69 => Self::E,
            70 => Self::F,
            71 => Self::G,
            72 => Self::H,
            73 => Self::I,
            74 => Self::J,
            75 => Self::K,
            76 => Self::L,
            77 => Self::M,
            78 => Self::N,
            79 => Self::O,
            80 => Self::P,
            81 => Self::Q,
            82 => Self::R,
            83 => Self::S,
            84 => Self::T,
            85 => Self::U,
            86 => Self::V,
            87 => Self::W,
            88 => Self::X,
            89 => Self::Y,
            90 => Self::Z,
            _ => Self::Unknown,
        }
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

impl MouseButton {
    /// Map a browser `MouseEvent.button` value to a button
    pub fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Middle,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// A keyboard event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    /// The key this event refers to
    pub code: KeyCode,
    /// Shift held at event time
    pub shift: bool,
    /// Control held at event time
    pub ctrl: bool,
    /// Alt held at event time
    pub alt: bool,
}

impl Key {
    /// Create a payload with no modifiers
    pub fn new(code: KeyCode) -> Self {
        Self { code, shift: false, ctrl: false, alt: false }
    }
}

/// A mouse event payload
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mouse {
    /// Pointer x in window pixels
    pub x: f64,
    /// Pointer y in window pixels
    pub y: f64,
    /// Pointer x movement since the previous event
    pub dx: f64,
    /// Pointer y movement since the previous event
    pub dy: f64,
    /// Button involved, if any
    pub button: Option<MouseButton>,
    /// Horizontal scroll delta
    pub scroll_x: f64,
    /// Vertical scroll delta
    pub scroll_y: f64,
}

/// Tracked input state between callbacks
///
/// Applications can poll this instead of (or in addition to) handling the
/// event callbacks.
#[derive(Debug, Default)]
pub struct InputState {
    held_keys: std::collections::HashSet<KeyCode>,
    held_buttons: std::collections::HashSet<MouseButton>,
    pointer: (f64, f64),
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition
    pub fn set_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.held_keys.insert(code);
        } else {
            self.held_keys.remove(&code);
        }
    }

    /// Record a button transition
    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.held_buttons.insert(button);
        } else {
            self.held_buttons.remove(&button);
        }
    }

    /// Record the pointer position
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer = (x, y);
    }

    /// Whether a key is currently held
    pub fn key_held(&self, code: KeyCode) -> bool {
        self.held_keys.contains(&code)
    }

    /// Whether a mouse button is currently held
    pub fn button_held(&self, button: MouseButton) -> bool {
        self.held_buttons.contains(&button)
    }

    /// Whether any mouse button is currently held (a move becomes a drag)
    pub fn dragging(&self) -> bool {
        !self.held_buttons.is_empty()
    }

    /// Last known pointer position
    pub fn pointer(&self) -> (f64, f64) {
        self.pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scancode_letters_and_arrows() {
        assert_eq!(KeyCode::from_scancode(65), KeyCode::A);
        assert_eq!(KeyCode::from_scancode(90), KeyCode::Z);
        assert_eq!(KeyCode::from_scancode(38), KeyCode::Up);
        assert_eq!(KeyCode::from_scancode(255), KeyCode::Unknown);
    }

    #[test]
    fn drag_requires_a_held_button() {
        let mut state = InputState::new();
        assert!(!state.dragging());
        state.set_button(MouseButton::Left, true);
        assert!(state.dragging());
        state.set_button(MouseButton::Left, false);
        assert!(!state.dragging());
    }
}
