use xoanon_core::{Rect, Vec2};

use crate::node::NodeId;

slotmap::new_key_type! {
    /// Opaque handle to a top-level window.
    pub struct WindowId;
}

/// Smallest window dimension a caller may request.
pub const WINDOW_MIN_SIZE: f32 = 16.0;
/// Largest window dimension a caller may request.
pub const WINDOW_MAX_SIZE: f32 = 3000.0;

/// A top-level window holding one node tree.
///
/// `focused` is only ever true for the frontmost showing window; robot
/// interactions poll for `focused && showing` before injecting input.
pub struct Window {
    pub title: String,
    pub origin: Vec2,
    pub width: f32,
    pub height: f32,
    pub showing: bool,
    pub focused: bool,
    pub(crate) root: Option<NodeId>,
}

impl Window {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            origin: Vec2::default(),
            width: 320.0,
            height: 240.0,
            showing: false,
            focused: false,
            root: None,
        }
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width.clamp(WINDOW_MIN_SIZE, WINDOW_MAX_SIZE);
        self.height = height.clamp(WINDOW_MIN_SIZE, WINDOW_MAX_SIZE);
    }

    /// The window frame in screen coordinates.
    pub fn frame(&self) -> Rect {
        Rect::new(self.origin.x, self.origin.y, self.width, self.height)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }
}
