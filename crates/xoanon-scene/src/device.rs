use std::collections::{HashMap, HashSet};

use xoanon_core::{KeyCode, Vec2};

use crate::node::NodeId;
use crate::scene::Scene;
use crate::window::WindowId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Secondary,
    Tertiary,
}

impl MouseButton {
    /// Every button the device model recognizes.
    pub fn all() -> [MouseButton; 3] {
        [
            MouseButton::Primary,
            MouseButton::Secondary,
            MouseButton::Tertiary,
        ]
    }
}

/// What character a physical key produces, with and without shift.
///
/// The harness never trusts this table directly: the key map is inferred
/// empirically by typing keys and observing the produced text. The
/// layout exists so the headless device has something to produce.
#[derive(Clone, Debug, Default)]
pub struct KeyboardLayout {
    map: HashMap<(KeyCode, bool), char>,
}

impl KeyboardLayout {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: KeyCode, shift: bool, c: char) {
        self.map.insert((code, shift), c);
    }

    pub fn char_for(&self, code: KeyCode, shift: bool) -> Option<char> {
        self.map.get(&(code, shift)).copied()
    }

    /// A US QWERTY layout, including the keysym-style character keys
    /// (ampersand, dollar, ...) that produce their character directly.
    pub fn us_qwerty() -> Self {
        use KeyCode::*;
        let mut layout = Self::empty();

        for (i, code) in [
            A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
        ]
        .into_iter()
        .enumerate()
        {
            let lower = (b'a' + i as u8) as char;
            layout.insert(code, false, lower);
            layout.insert(code, true, lower.to_ascii_uppercase());
        }

        let digits = [
            (Digit0, '0', ')'),
            (Digit1, '1', '!'),
            (Digit2, '2', '@'),
            (Digit3, '3', '#'),
            (Digit4, '4', '$'),
            (Digit5, '5', '%'),
            (Digit6, '6', '^'),
            (Digit7, '7', '&'),
            (Digit8, '8', '*'),
            (Digit9, '9', '('),
        ];
        for (code, plain, shifted) in digits {
            layout.insert(code, false, plain);
            layout.insert(code, true, shifted);
        }

        let pairs = [
            (Minus, '-', '_'),
            (Equals, '=', '+'),
            (OpenBracket, '[', '{'),
            (CloseBracket, ']', '}'),
            (Semicolon, ';', ':'),
            (Quote, '\'', '"'),
            (BackQuote, '`', '~'),
            (Comma, ',', '<'),
            (Period, '.', '>'),
            (Slash, '/', '?'),
        ];
        for (code, plain, shifted) in pairs {
            layout.insert(code, false, plain);
            layout.insert(code, true, shifted);
        }

        // Character keysyms: the key names the character it produces.
        let keysyms = [
            (Ampersand, '&'),
            (Asterisk, '*'),
            (BraceLeft, '{'),
            (BraceRight, '}'),
            (Dollar, '$'),
            (Exclamation, '!'),
            (Plus, '+'),
            (Pound, '#'),
            (QuoteDbl, '"'),
        ];
        for (code, c) in keysyms {
            layout.insert(code, false, c);
        }

        layout.insert(Space, false, ' ');
        layout.insert(Space, true, ' ');
        layout
    }
}

/// Held keys and buttons, the pointer position, and the press target,
/// tracked the way a real input backend tracks them.
pub struct InputDevice {
    pub(crate) layout: KeyboardLayout,
    keys_down: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    pointer: Vec2,
    press_target: Option<NodeId>,
}

impl InputDevice {
    pub fn new(layout: KeyboardLayout) -> Self {
        Self {
            layout,
            keys_down: HashSet::new(),
            buttons_down: HashSet::new(),
            pointer: Vec2::default(),
            press_target: None,
        }
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn is_key_down(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }
}

/// Primitive input injection. UI-thread-only: every method takes the
/// scene by `&mut`, so only code running on the UI loop can call them.
impl Scene {
    pub fn device(&self) -> &InputDevice {
        &self.device
    }

    pub fn key_press(&mut self, code: KeyCode) {
        log::trace!("pressing {code:?}");
        self.device.keys_down.insert(code);
    }

    pub fn key_release(&mut self, code: KeyCode) {
        log::trace!("releasing {code:?}");
        self.device.keys_down.remove(&code);
    }

    /// Type a key: produce its character under the current shift state
    /// and route it to the focused editable node, if any.
    pub fn key_type(&mut self, code: KeyCode) {
        log::trace!("typing {code:?}");
        let shift = self.device.keys_down.contains(&KeyCode::Shift);
        let Some(c) = self.device.layout.char_for(code, shift) else {
            return;
        };
        let Some(focused) = self.focus else {
            return;
        };
        let Some(node) = self.nodes.get_mut(focused) else {
            return;
        };
        if !node.is_editable() {
            return;
        }
        node.text.push(c);
        let text = node.text.clone();
        if let Some(mut action) = node.on_text_change.take() {
            action(&text);
            if let Some(node) = self.nodes.get_mut(focused) {
                node.on_text_change = Some(action);
            }
        }
    }

    pub fn mouse_move(&mut self, to: Vec2) {
        log::trace!("pointing mouse at ({}, {})", to.x, to.y);
        self.device.pointer = to;
    }

    pub fn mouse_press(&mut self, button: MouseButton) {
        log::trace!("pressing mouse {button:?}");
        self.device.buttons_down.insert(button);
        if button != MouseButton::Primary {
            return;
        }

        let pointer = self.device.pointer;
        let target = self.hit_test(pointer);
        self.device.press_target = target;

        if let Some(id) = target {
            if let Some(node) = self.nodes.get(id) {
                if node.focusable && node.enabled {
                    self.focus = Some(id);
                }
            }
        }
    }

    pub fn mouse_release(&mut self, button: MouseButton) {
        log::trace!("releasing mouse {button:?}");
        self.device.buttons_down.remove(&button);
        if button != MouseButton::Primary {
            return;
        }

        let target = self.device.press_target.take();
        let pointer = self.device.pointer;
        let Some(id) = target else {
            return;
        };
        let still_inside = self
            .screen_rect(id)
            .map(|r| r.contains(pointer))
            .unwrap_or(false);
        if !still_inside {
            return;
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.enabled {
            return;
        }
        if let Some(mut action) = node.on_click.take() {
            action();
            if let Some(node) = self.nodes.get_mut(id) {
                node.on_click = Some(action);
            }
        }
    }

    /// Press and release in one step.
    pub fn mouse_click(&mut self, button: MouseButton) {
        self.mouse_press(button);
        self.mouse_release(button);
    }

    /// The deepest node under the pointer, searching windows front to
    /// back. Child bounds are not clipped by their parents; the headless
    /// scene does no layout.
    fn hit_test(&self, point: Vec2) -> Option<NodeId> {
        let front = self.frontmost_showing()?;
        if let Some(hit) = self.hit_test_window(front, point) {
            return Some(hit);
        }
        None
    }

    fn hit_test_window(&self, window: WindowId, point: Vec2) -> Option<NodeId> {
        let w = self.windows.get(window)?;
        if !w.showing {
            return None;
        }
        let root = w.root?;
        let origin = w.origin;
        self.hit_test_node(root, point, origin)
    }

    fn hit_test_node(&self, id: NodeId, point: Vec2, origin: Vec2) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        let mut hit = node.bounds.offset(origin).contains(point).then_some(id);
        for child in node.children.iter() {
            if let Some(h) = self.hit_test_node(*child, point, origin) {
                hit = Some(h);
            }
        }
        hit
    }
}
