//! Empirical key map inference.
//!
//! Static key tables lie: what character a physical key produces depends on
//! the active keyboard layout, and there is no portable way to ask. So the
//! harness finds out by experiment. For every candidate key it clicks a
//! scratch text field, clears it, types the key, and reads back whatever
//! character actually appeared; then repeats the whole pass with Shift held.
//! The result is a [`KeyMap`] that is correct by construction for whatever
//! layout the session is running under.

use std::thread;
use std::time::Duration;

use log::{debug, trace};
use xoanon_core::{Key, KeyCode, KeyMap, Result};
use xoanon_platform::UiThread;
use xoanon_scene::{MouseButton, NodeId, WindowId};

/// Settle time between injecting a keystroke and reading the text back.
const PROBE_SETTLE: Duration = Duration::from_millis(16);

/// Timeout for each read-back round trip.
const PROBE_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Keys worth probing: letters, digits, and the punctuation keys that
/// commonly move between layouts. Modifier and navigation keys produce no
/// text and are skipped.
pub fn is_probe_candidate(code: KeyCode) -> bool {
    if code.is_letter() || code.is_digit() {
        return true;
    }
    use KeyCode::*;
    matches!(
        code,
        Ampersand
            | Asterisk
            | BackQuote
            | BraceLeft
            | BraceRight
            | CloseBracket
            | Comma
            | Dollar
            | Equals
            | Exclamation
            | Minus
            | OpenBracket
            | Period
            | Plus
            | Pound
            | Quote
            | QuoteDbl
            | Semicolon
            | Slash
    )
}

/// Releases every key when dropped, so an error or panic partway through a
/// probe cannot leave Shift (or anything else) stuck down.
struct ReleaseAllKeys {
    ui: UiThread,
}

impl Drop for ReleaseAllKeys {
    fn drop(&mut self) {
        for code in KeyCode::all() {
            self.ui.run_later(move |scene| scene.key_release(code));
        }
        self.ui.request_next_pulse();
    }
}

/// Infer a key map by typing every candidate key into `input`, a scratch
/// text field inside `window`. Progress is reported through the optional
/// `status` text element.
pub fn infer_key_map(
    ui: &UiThread,
    window: WindowId,
    input: NodeId,
    status: Option<NodeId>,
) -> Result<KeyMap> {
    let _cleanup = ReleaseAllKeys { ui: ui.clone() };

    // The scratch field only receives events while its window is frontmost.
    ui.run_later(move |scene| scene.bring_to_front(window));
    ui.request_next_pulse();

    set_status(ui, status, "Generating key map...".to_string());

    let candidates: Vec<KeyCode> = KeyCode::all()
        .into_iter()
        .filter(|code| is_probe_candidate(*code))
        .collect();

    let mut map = KeyMap::empty();
    for code in candidates {
        set_status(ui, status, format!("Generating key map: checking {code:?}"));
        for shift in [false, true] {
            probe_one(ui, input, code, shift, &mut map)?;
        }
    }

    set_status(ui, status, "Generated key map.".to_string());
    debug!("generated key map of size {}", map.len());
    Ok(map)
}

fn probe_one(
    ui: &UiThread,
    input: NodeId,
    code: KeyCode,
    shift: bool,
    map: &mut KeyMap,
) -> Result<()> {
    // Click the scratch field so the keystroke lands in it, then clear
    // out whatever the previous probe left behind.
    ui.run_later(move |scene| {
        if let Some(rect) = scene.screen_rect(input) {
            scene.mouse_move(rect.center());
            scene.mouse_click(MouseButton::Primary);
        }
    });
    ui.run_later(move |scene| scene.set_node_text(input, ""));
    if shift {
        ui.run_later(|scene| scene.key_press(KeyCode::Shift));
    }
    ui.run_later(move |scene| scene.key_type(code));
    if shift {
        ui.run_later(|scene| scene.key_release(KeyCode::Shift));
    }
    ui.request_next_pulse();

    thread::sleep(PROBE_SETTLE);

    let text = ui.run_sync(PROBE_READ_TIMEOUT, move |scene| Ok(scene.node_text(input)))?;
    trace!("typed {code:?} (shift {shift}) and received {text:?}");
    if let Some(c) = text.chars().next() {
        map.insert(c, Key::new(code, shift, false, false));
    }
    Ok(())
}

fn set_status(ui: &UiThread, status: Option<NodeId>, message: String) {
    if let Some(status) = status {
        ui.run_later(move |scene| scene.set_node_label(status, message));
    }
}
