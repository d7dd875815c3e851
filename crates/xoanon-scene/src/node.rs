use smallvec::SmallVec;
use xoanon_core::{Rect, Role};

use crate::window::WindowId;

slotmap::new_key_type! {
    /// Opaque handle to a node in the live tree. Never owned by the
    /// harness; resolved fresh against the scene on every use.
    pub struct NodeId;
}

pub type ClickAction = Box<dyn FnMut() + Send>;
pub type TextChangeAction = Box<dyn FnMut(&str) + Send>;

/// A single element in the scene tree.
///
/// Bounds are window-relative and explicit; the headless scene performs
/// no layout. `text` is the editable content for [`Role::TextField`]
/// nodes, `label` the static text of labeled nodes (buttons, text).
pub struct Node {
    pub role: Role,
    pub id: Option<String>,
    pub label: Option<String>,
    pub text: String,
    pub style_tags: SmallVec<[String; 2]>,
    pub bounds: Rect,
    pub focusable: bool,
    pub enabled: bool,
    pub(crate) window: WindowId,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) on_click: Option<ClickAction>,
    pub(crate) on_text_change: Option<TextChangeAction>,
}

impl Node {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            id: None,
            label: None,
            text: String::new(),
            style_tags: SmallVec::new(),
            bounds: Rect::default(),
            focusable: matches!(role, Role::TextField | Role::Button),
            enabled: true,
            window: WindowId::default(),
            children: SmallVec::new(),
            on_click: None,
            on_text_change: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.style_tags.push(tag.into());
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn on_click(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.on_click = Some(Box::new(action));
        self
    }

    pub fn on_text_change(mut self, action: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_text_change = Some(Box::new(action));
        self
    }

    /// Whether typed characters are routed into this node.
    pub fn is_editable(&self) -> bool {
        matches!(self.role, Role::TextField) && self.enabled
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.style_tags.iter().any(|t| t == tag)
    }
}
