//! # xoanon-harness
//!
//! UI test automation on top of the `xoanon-platform` UI loop: element
//! locators, a scripted input robot, empirical key map inference with an
//! on-disk cache, aggregated test progress, and the [`Commander`] session
//! object that ties them together.
//!
//! A typical session:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use xoanon_core::{Rect, Role};
//! use xoanon_harness::Commander;
//! use xoanon_platform::UiThread;
//! use xoanon_scene::{KeyboardLayout, Node, Scene};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ui = UiThread::spawn(Scene::new(KeyboardLayout::us_qwerty()))?;
//! let commander = Commander::boot(&ui)?;
//! let robot = commander.robot().wait()?;
//!
//! let window = commander
//!     .new_window("Login", |scene, window| {
//!         let root = scene.set_root(
//!             window,
//!             Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
//!         );
//!         scene.add_child(
//!             root,
//!             Node::new(Role::TextField)
//!                 .with_id("username")
//!                 .with_bounds(Rect::new(8.0, 8.0, 200.0, 24.0)),
//!         );
//!     })
//!     .wait()?;
//!
//! let field = robot.find_by_id(window, "username")?;
//! robot.type_text(field, "admin")?;
//! robot.wait_until(Duration::from_secs(1), move |scene| {
//!     scene.node_text(field) == "admin"
//! })?;
//!
//! commander.close_all_windows().wait()?;
//! commander.close()?;
//! ui.close();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod commander;
pub mod locator;
pub mod probe;
pub mod progress;
pub mod robot;
pub mod safety;
pub mod scheduler;

pub use cache::{KEY_MAP_CACHE_MINIMUM, KeyMapCache};
pub use commander::{COMMANDER_TITLE, Commander};
pub use progress::{ProgressBoard, ProgressSnapshot};
pub use robot::{Robot, SLOW_MOTION_PAUSE};
pub use scheduler::Scheduler;
