use serde::{Deserialize, Serialize};

/// Identifier of a physical key on the keyboard.
///
/// Letters, digits, and a small set of punctuation keys are the probe
/// candidates used for key map inference; everything else is "special"
/// and only matters for the defensive release-everything reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Ampersand,
    Asterisk,
    BackQuote,
    BraceLeft,
    BraceRight,
    CloseBracket,
    Comma,
    Dollar,
    Equals,
    Exclamation,
    Minus,
    OpenBracket,
    Period,
    Plus,
    Pound,
    Quote,
    QuoteDbl,
    Semicolon,
    Slash,
    Shift,
    Alt,
    Control,
    Enter,
    Tab,
    Space,
    Escape,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Function(u8),
}

impl KeyCode {
    pub fn is_letter(&self) -> bool {
        use KeyCode::*;
        matches!(
            self,
            A | B | C | D | E | F | G | H | I | J | K | L | M | N | O | P | Q | R | S | T | U | V
                | W | X | Y | Z
        )
    }

    pub fn is_digit(&self) -> bool {
        use KeyCode::*;
        matches!(
            self,
            Digit0 | Digit1 | Digit2 | Digit3 | Digit4 | Digit5 | Digit6 | Digit7 | Digit8 | Digit9
        )
    }

    /// Every key code the device model recognizes, in a fixed order.
    /// Used by the robot's reset and by the probe's release-everything
    /// cleanup.
    pub fn all() -> Vec<KeyCode> {
        use KeyCode::*;
        let mut codes = vec![
            A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z, Digit0,
            Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9, Ampersand,
            Asterisk, BackQuote, BraceLeft, BraceRight, CloseBracket, Comma, Dollar, Equals,
            Exclamation, Minus, OpenBracket, Period, Plus, Pound, Quote, QuoteDbl, Semicolon,
            Slash, Shift, Alt, Control, Enter, Tab, Space, Escape, Backspace, Delete, Home, End,
            PageUp, PageDown, ArrowLeft, ArrowRight, ArrowUp, ArrowDown,
        ];
        codes.extend((1..=12).map(Function));
        codes
    }
}

/// A physical key plus the three modifier flags that were held when it
/// produced a character. Immutable value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub code: KeyCode,
    pub shift: bool,
    pub alt: bool,
    pub control: bool,
}

impl Key {
    pub fn new(code: KeyCode, shift: bool, alt: bool, control: bool) -> Self {
        Self {
            code,
            shift,
            alt,
            control,
        }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, false, false, false)
    }

    pub fn shifted(code: KeyCode) -> Self {
        Self::new(code, true, false, false)
    }
}
