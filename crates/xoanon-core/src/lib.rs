//! # Core types for the xoanon harness
//!
//! Everything in this crate is a plain value: physical keys and key maps,
//! test lifecycle states, screen geometry, and the harness error taxonomy.
//! Nothing here touches the UI loop; the interesting concurrency lives in
//! `xoanon-platform` and `xoanon-harness`.
//!
//! The central type is [`KeyMap`], a mapping from produced characters to
//! the physical [`Key`] (with modifiers) that produces them. Key maps are
//! built empirically by the harness once per session, because static
//! tables are unreliable across keyboard layouts:
//!
//! ```rust
//! use xoanon_core::{Key, KeyCode, KeyMap};
//!
//! let mut map = KeyMap::empty();
//! map.insert('a', Key::plain(KeyCode::A));
//! map.insert('A', Key::shifted(KeyCode::A));
//!
//! let keys = map.to_keys("aA").unwrap();
//! assert_eq!(keys.len(), 2);
//! assert!(keys[1].shift);
//! ```

pub mod error;
pub mod geometry;
pub mod key;
pub mod keymap;
pub mod semantics;
pub mod test_info;

pub use error::*;
pub use geometry::*;
pub use key::*;
pub use keymap::*;
pub use semantics::*;
pub use test_info::*;
