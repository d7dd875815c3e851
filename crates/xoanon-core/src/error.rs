use std::time::Duration;

use crate::semantics::Role;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside the harness.
///
/// A cache miss is deliberately absent: failing to load the key map cache
/// is a normal `None`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A locator search matched nothing.
    #[error("no matching element: {0}")]
    NotFound(String),

    /// A bounded wait elapsed before the condition or work completed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// An element resolved to a non-finite screen position, so a pointer
    /// move would be ambiguous. Typically the element is unattached or
    /// has zero bounds.
    #[error("element has a non-finite screen center ({x}, {y})")]
    AmbiguousGeometry { x: f32, y: f32 },

    /// A character has no entry in the key map.
    #[error("no key mapping is known for character {0:?}")]
    NoKeyMapping(char),

    /// An element was found but is not of the requested role.
    #[error("element has role {found:?}, expected {expected:?}")]
    RoleMismatch { expected: Role, found: Role },

    /// Work submitted to the UI loop panicked; the panic message is
    /// captured and rethrown to the waiter.
    #[error("ui loop work panicked: {0}")]
    WorkPanicked(String),

    /// The UI event loop has shut down and can accept no further work.
    #[error("the ui event loop has shut down")]
    LoopClosed,

    /// Automation against what looks like the operator's own display was
    /// refused.
    #[error(
        "refusing to run automated tests on what appears to be a local display \
         (set XOANON_REALLY_USE_LOCAL_DISPLAY=true to override)"
    )]
    DisplayNotPermitted,
}
