//! Scripted interaction with on-screen elements.
//!
//! A [`Robot`] is the harness's hand on the application: it clicks, types,
//! and waits by injecting synthetic device events through the UI loop.
//! Every interaction follows the same sequence: bring the element's window
//! to the front, wait until that window is both focused and showing, inject
//! the events, then pause on the calling thread so a human can follow along.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::trace;
use xoanon_core::{Error, Key, KeyCode, KeyMap, Result, Role};
use xoanon_platform::UiThread;
use xoanon_scene::{MouseButton, NodeId, Scene, WindowId};

use crate::locator;

/// Pause applied after every injected event when slow motion is enabled.
pub const SLOW_MOTION_PAUSE: Duration = Duration::from_millis(1000);

const POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct Robot {
    ui: UiThread,
    key_map: Arc<KeyMap>,
    slow_motion: AtomicBool,
    timeout: Duration,
    pause_after_mouse: Duration,
    pause_after_keyboard: Duration,
    pause_between_clicks: Duration,
}

impl Robot {
    pub fn new(ui: UiThread, key_map: Arc<KeyMap>) -> Self {
        Self {
            ui,
            key_map,
            slow_motion: AtomicBool::new(false),
            timeout: Duration::from_millis(1000),
            pause_after_mouse: Duration::from_millis(150),
            pause_after_keyboard: Duration::from_millis(48),
            pause_between_clicks: Duration::from_millis(50),
        }
    }

    /// The key map this robot types with.
    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    /// How long interactions wait for windows, elements, and loop
    /// round-trips before giving up.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timeouts shorter than a millisecond are rounded up; a zero timeout
    /// would make every wait fail vacuously.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout.max(Duration::from_millis(1));
    }

    pub fn set_pause_after_mouse(&mut self, pause: Duration) {
        self.pause_after_mouse = pause;
    }

    pub fn set_pause_after_keyboard(&mut self, pause: Duration) {
        self.pause_after_keyboard = pause;
    }

    pub fn set_pause_between_clicks(&mut self, pause: Duration) {
        self.pause_between_clicks = pause;
    }

    /// Stretch every pacing pause to a full second so interactions are
    /// observable in real time.
    pub fn slow_motion_enable(&self) {
        self.slow_motion.store(true, Ordering::SeqCst);
    }

    pub fn slow_motion_disable(&self) {
        self.slow_motion.store(false, Ordering::SeqCst);
    }

    fn mouse_pause(&self) -> Duration {
        if self.slow_motion.load(Ordering::SeqCst) {
            SLOW_MOTION_PAUSE
        } else {
            self.pause_after_mouse
        }
    }

    fn keyboard_pause(&self) -> Duration {
        if self.slow_motion.load(Ordering::SeqCst) {
            SLOW_MOTION_PAUSE
        } else {
            self.pause_after_keyboard
        }
    }

    fn click_pause(&self) -> Duration {
        if self.slow_motion.load(Ordering::SeqCst) {
            SLOW_MOTION_PAUSE
        } else {
            self.pause_between_clicks
        }
    }

    // ------------------------------------------------------------------
    // Finding elements

    pub fn find_by_id(&self, window: WindowId, id: &str) -> Result<NodeId> {
        let id = id.to_string();
        self.ui
            .run_sync(self.timeout, move |scene| {
                locator::find_by_id_in_window(scene, window, &id)
            })
    }

    pub fn find_by_id_anywhere(&self, id: &str) -> Result<NodeId> {
        let id = id.to_string();
        self.ui
            .run_sync(self.timeout, move |scene| {
                locator::find_by_id_anywhere(scene, &id)
            })
    }

    /// Find by identifier and check the element's role in the same loop
    /// turn, so the tree cannot change between the two.
    pub fn find_by_id_as(&self, window: WindowId, id: &str, role: Role) -> Result<NodeId> {
        let id = id.to_string();
        self.ui.run_sync(self.timeout, move |scene| {
            let node = locator::find_by_id_in_window(scene, window, &id)?;
            locator::require_role(scene, node, role)
        })
    }

    pub fn find_by_id_anywhere_as(&self, id: &str, role: Role) -> Result<NodeId> {
        let id = id.to_string();
        self.ui.run_sync(self.timeout, move |scene| {
            let node = locator::find_by_id_anywhere(scene, &id)?;
            locator::require_role(scene, node, role)
        })
    }

    pub fn find_by_text(&self, window: WindowId, text: &str) -> Result<NodeId> {
        let text = text.to_string();
        self.ui.run_sync(self.timeout, move |scene| {
            locator::find_by_text_in_window(scene, window, &text)
        })
    }

    pub fn find_by_text_anywhere(&self, text: &str) -> Result<NodeId> {
        let text = text.to_string();
        self.ui.run_sync(self.timeout, move |scene| {
            locator::find_by_text_anywhere(scene, &text)
        })
    }

    pub fn find_all(&self, window: WindowId, role: Role) -> Result<Vec<NodeId>> {
        self.ui.run_sync(self.timeout, move |scene| {
            Ok(locator::find_all_in_window(scene, role, window))
        })
    }

    pub fn find_all_with_tag(
        &self,
        window: WindowId,
        role: Role,
        tag: &str,
    ) -> Result<Vec<NodeId>> {
        let tag = tag.to_string();
        self.ui.run_sync(self.timeout, move |scene| {
            Ok(locator::find_all_with_tag_in_window(
                scene, role, window, &tag,
            ))
        })
    }

    // ------------------------------------------------------------------
    // Interactions

    /// Click the primary mouse button on the center of the element.
    pub fn click(&self, node: NodeId) -> Result<()> {
        self.click_with(node, MouseButton::Primary)
    }

    pub fn click_with(&self, node: NodeId, button: MouseButton) -> Result<()> {
        self.prepare(node)?;
        self.click_stroke(button);
        thread::sleep(self.mouse_pause());
        Ok(())
    }

    pub fn double_click(&self, node: NodeId) -> Result<()> {
        self.prepare(node)?;
        self.click_stroke(MouseButton::Primary);
        thread::sleep(self.click_pause());
        self.click_stroke(MouseButton::Primary);
        thread::sleep(self.mouse_pause());
        Ok(())
    }

    /// Move the pointer to the center of the element without clicking.
    pub fn point_at(&self, node: NodeId) -> Result<()> {
        self.prepare(node)?;
        thread::sleep(self.mouse_pause());
        Ok(())
    }

    /// Type a sequence of keys at the element.
    ///
    /// The element is clicked first, not merely pointed at: focus here
    /// follows clicks, and keystrokes are routed to the focused node.
    /// An element with a click action will therefore observe one click
    /// per typing call.
    pub fn type_keys(&self, node: NodeId, keys: &[Key]) -> Result<()> {
        self.prepare(node)?;
        self.click_stroke(MouseButton::Primary);
        thread::sleep(self.mouse_pause());
        for key in keys {
            trace!("typing {key:?}");
            self.type_key(*key);
        }
        Ok(())
    }

    /// Translate `text` through the key map and type it at the element.
    pub fn type_text(&self, node: NodeId, text: &str) -> Result<()> {
        let keys = self.key_map.to_keys(text)?;
        self.type_keys(node, &keys)
    }

    // ------------------------------------------------------------------
    // Waiting

    /// Poll `predicate` on the UI loop until it returns true or `timeout`
    /// elapses. Individual round-trip timeouts are retried; only the
    /// overall deadline fails the wait.
    pub fn wait_until<P>(&self, timeout: Duration, predicate: P) -> Result<()>
    where
        P: Fn(&Scene) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        let started = Instant::now();
        loop {
            let p = Arc::clone(&predicate);
            match self.ui.run_sync(POLL_INTERVAL, move |scene| Ok(p(scene))) {
                Ok(true) => return Ok(()),
                Ok(false) | Err(Error::Timeout(_)) => {}
                Err(e) => return Err(e),
            }
            if started.elapsed() >= timeout {
                return Err(Error::Timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Block until the loop has turned `frames` more times.
    pub fn wait_for_frames(&self, frames: usize) -> Result<()> {
        for _ in 0..frames {
            self.ui.run_sync(self.timeout, |_| {
                thread::sleep(POLL_INTERVAL);
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Wait until the given window is no longer showing.
    pub fn wait_for_window_to_close(&self, window: WindowId, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            let showing = self.ui.run_sync(self.timeout, move |scene| {
                Ok(scene.window(window).map(|w| w.showing).unwrap_or(false))
            })?;
            if !showing {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(Error::Timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    // ------------------------------------------------------------------
    // Recovery

    /// Release every key and mouse button and disable slow motion, leaving
    /// the device in a known state for the next test. Optionally warps the
    /// pointer to the center of a window so no element is left hovered.
    pub fn reset(&self, warp_to: Option<WindowId>) {
        self.slow_motion.store(false, Ordering::SeqCst);
        for code in KeyCode::all() {
            self.ui.run_later(move |scene| scene.key_release(code));
        }
        for button in MouseButton::all() {
            self.ui.run_later(move |scene| scene.mouse_release(button));
        }
        if let Some(window) = warp_to {
            self.ui.run_later(move |scene| {
                if let Some(w) = scene.window(window) {
                    let center = w.frame().center();
                    scene.mouse_move(center);
                }
            });
        }
        self.ui.request_next_pulse();
    }

    // ------------------------------------------------------------------
    // Internals

    /// Bring the element's window to the front, wait for it to be focused
    /// and showing, then move the pointer to the element's center.
    fn prepare(&self, node: NodeId) -> Result<()> {
        let window = self.ui.run_sync(self.timeout, move |scene| {
            let window = scene
                .window_of(node)
                .ok_or_else(|| Error::NotFound("element no longer attached".to_string()))?;
            scene.bring_to_front(window);
            Ok(window)
        })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let ready = self.ui.run_sync(self.timeout, move |scene| {
                Ok(scene
                    .window(window)
                    .map(|w| w.focused && w.showing)
                    .unwrap_or(false))
            })?;
            if ready {
                break;
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }

        self.ui.run_sync(self.timeout, move |scene| {
            let rect = scene
                .screen_rect(node)
                .ok_or_else(|| Error::NotFound("element no longer attached".to_string()))?;
            let center = rect.center();
            if !center.is_finite() {
                return Err(Error::AmbiguousGeometry {
                    x: center.x,
                    y: center.y,
                });
            }
            scene.mouse_move(center);
            Ok(())
        })
    }

    fn click_stroke(&self, button: MouseButton) {
        self.ui.run_later(move |scene| scene.mouse_press(button));
        self.ui.run_later(move |scene| scene.mouse_release(button));
        self.ui.request_next_pulse();
    }

    fn type_key(&self, key: Key) {
        if key.shift {
            self.ui.run_later(|scene| scene.key_press(KeyCode::Shift));
        }
        if key.alt {
            self.ui.run_later(|scene| scene.key_press(KeyCode::Alt));
        }
        if key.control {
            self.ui
                .run_later(|scene| scene.key_press(KeyCode::Control));
        }
        let code = key.code;
        self.ui.run_later(move |scene| scene.key_type(code));
        // Modifiers come back up in reverse order of pressing.
        if key.control {
            self.ui
                .run_later(|scene| scene.key_release(KeyCode::Control));
        }
        if key.alt {
            self.ui.run_later(|scene| scene.key_release(KeyCode::Alt));
        }
        if key.shift {
            self.ui
                .run_later(|scene| scene.key_release(KeyCode::Shift));
        }
        self.ui.request_next_pulse();
        thread::sleep(self.keyboard_pause());
    }
}
