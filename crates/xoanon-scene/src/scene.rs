use slotmap::SlotMap;
use xoanon_core::{Rect, Vec2};

use crate::device::{InputDevice, KeyboardLayout};
use crate::node::{Node, NodeId};
use crate::window::{Window, WindowId};

/// The live UI state: every window, every node, the focus owner, and the
/// synthetic input device. Owned and mutated exclusively by the UI loop
/// thread.
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) windows: SlotMap<WindowId, Window>,
    /// Windows in creation order; the stable enumeration order used by
    /// "search any window" lookups.
    created_order: Vec<WindowId>,
    /// Windows back-to-front; the last entry is frontmost.
    z_order: Vec<WindowId>,
    pub(crate) focus: Option<NodeId>,
    pub(crate) device: InputDevice,
}

impl Scene {
    pub fn new(layout: KeyboardLayout) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            windows: SlotMap::with_key(),
            created_order: Vec::new(),
            z_order: Vec::new(),
            focus: None,
            device: InputDevice::new(layout),
        }
    }

    // ------------------------------------------------------------------
    // Windows

    pub fn new_window(&mut self, title: impl Into<String>) -> WindowId {
        let mut window = Window::new(title);
        // Cascade new windows so their screen rects do not coincide.
        let n = self.created_order.len() as f32;
        window.origin = Vec2::new(24.0 * n, 24.0 * n);

        let id = self.windows.insert(window);
        self.created_order.push(id);
        id
    }

    pub fn show_window(&mut self, id: WindowId) {
        if let Some(w) = self.windows.get_mut(id) {
            if !w.showing {
                w.showing = true;
                self.z_order.push(id);
            }
        }
    }

    pub fn close_window(&mut self, id: WindowId) {
        if let Some(w) = self.windows.get_mut(id) {
            log::trace!("closing window {:?} ({})", id, w.title);
            w.showing = false;
            w.focused = false;
        }
        self.z_order.retain(|z| *z != id);
        if let Some(focused) = self.focus {
            if self.nodes.get(focused).map(|n| n.window) == Some(id) {
                self.focus = None;
            }
        }
    }

    /// Raise the window and give it input focus. Hidden windows are
    /// raised but never focused.
    pub fn bring_to_front(&mut self, id: WindowId) {
        self.z_order.retain(|z| *z != id);
        let showing = match self.windows.get(id) {
            Some(w) => w.showing,
            None => return,
        };
        if showing {
            self.z_order.push(id);
        }
        for (wid, w) in self.windows.iter_mut() {
            w.focused = showing && wid == id;
        }
    }

    pub fn send_to_back(&mut self, id: WindowId) {
        self.z_order.retain(|z| *z != id);
        let showing = self.windows.get(id).map(|w| w.showing).unwrap_or(false);
        if showing {
            self.z_order.insert(0, id);
        }
        if let Some(w) = self.windows.get_mut(id) {
            w.focused = false;
        }
        // Focus passes to the new frontmost window.
        if let Some(front) = self.z_order.last().copied() {
            for (wid, w) in self.windows.iter_mut() {
                w.focused = wid == front;
            }
        }
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    /// Root node of the given window, if one has been installed.
    pub fn root_of(&self, id: WindowId) -> Option<NodeId> {
        self.windows.get(id).and_then(|w| w.root)
    }

    /// All windows in creation order.
    pub fn windows_in_order(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.created_order.iter().copied()
    }

    /// Currently-showing windows in creation order; closed and hidden
    /// windows are skipped.
    pub fn showing_windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.created_order
            .iter()
            .copied()
            .filter(|id| self.windows.get(*id).map(|w| w.showing).unwrap_or(false))
    }

    pub(crate) fn frontmost_showing(&self) -> Option<WindowId> {
        self.z_order.last().copied()
    }

    // ------------------------------------------------------------------
    // Nodes

    /// Install `node` as the root of `window`, replacing any prior tree.
    pub fn set_root(&mut self, window: WindowId, node: Node) -> NodeId {
        let mut node = node;
        node.window = window;
        let old = self.windows.get_mut(window).and_then(|w| w.root.take());
        if let Some(old) = old {
            self.remove_subtree(old);
        }
        let id = self.nodes.insert(node);
        if let Some(w) = self.windows.get_mut(window) {
            w.root = Some(id);
        }
        id
    }

    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        let window = self.nodes.get(parent)?.window;
        let mut node = node;
        node.window = window;
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Some(id)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn window_of(&self, id: NodeId) -> Option<WindowId> {
        self.nodes.get(id).map(|n| n.window)
    }

    /// The node's bounds in screen coordinates: window origin plus the
    /// node's window-relative bounds. `None` when the node or its window
    /// no longer exists.
    pub fn screen_rect(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let window = self.windows.get(node.window)?;
        Some(node.bounds.offset(window.origin))
    }

    // ------------------------------------------------------------------
    // Focus and text content

    pub fn set_focus(&mut self, id: Option<NodeId>) {
        self.focus = id;
    }

    pub fn focused_node(&self) -> Option<NodeId> {
        self.focus
    }

    pub fn node_text(&self, id: NodeId) -> String {
        self.nodes.get(id).map(|n| n.text.clone()).unwrap_or_default()
    }

    /// Set text content directly, without firing the change action.
    pub fn set_node_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.text = text.into();
        }
    }

    pub fn set_node_label(&mut self, id: NodeId, label: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.label = Some(label.into());
        }
    }
}
