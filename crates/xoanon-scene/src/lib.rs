//! # Headless scene graph for the xoanon harness
//!
//! The harness drives an application through a window/scene abstraction:
//! a tree of nodes with roles, identifiers, labels, style tags, and
//! explicit screen bounds, plus a synthetic input device that injects
//! key and mouse events the way a real windowing backend would.
//!
//! Everything in this crate is owned by the single UI loop thread
//! (`xoanon-platform`); nothing here is shared across threads. Worker
//! threads hold plain [`NodeId`]/[`WindowId`] handles and resolve them
//! fresh on each submitted closure, since the tree can change between
//! calls.

pub mod device;
pub mod node;
pub mod scene;
pub mod window;

pub use device::*;
pub use node::*;
pub use scene::*;
pub use window::*;
