//! The harness session.
//!
//! A [`Commander`] owns everything a test run needs: the status window with
//! its scratch probe field, the background scheduler, the cached-or-inferred
//! key map, the progress board, and a registry of every window it has
//! created so they can all be torn down between tests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::info;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;
use xoanon_core::{ApplicationInfo, Error, KeyMap, Rect, Result, Role, TestInfo};
use xoanon_platform::{Completion, UiThread, completion};
use xoanon_scene::{Node, NodeId, Scene, WindowId};

use crate::cache::KeyMapCache;
use crate::probe;
use crate::progress::{ProgressBoard, ProgressSnapshot};
use crate::robot::Robot;
use crate::scheduler::Scheduler;

/// Title of the commander's own window.
pub const COMMANDER_TITLE: &str = "Xoanon Test Harness";

const BOOT_TIMEOUT: Duration = Duration::from_secs(30);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between a test window becoming visible and its delivery to the
/// caller, so the first interaction does not race window setup.
const WINDOW_SETTLE: Duration = Duration::from_millis(100);

/// Node handles inside the commander window. Resolved once at boot; the
/// commander tree never changes shape afterwards.
#[derive(Clone, Copy)]
struct Chrome {
    window: WindowId,
    status: NodeId,
    uptime: NodeId,
    input: NodeId,
}

/// Windows created and released over the life of the session. Mutated only
/// from inside UI-loop tasks; reads elsewhere may be momentarily stale.
#[derive(Default)]
struct WindowRegistry {
    open: Vec<WindowId>,
    created: u64,
    released: u64,
}

pub struct Commander {
    ui: UiThread,
    scheduler: Scheduler,
    chrome: Chrome,
    cache: Arc<KeyMapCache>,
    key_map: Arc<RwLock<Option<Arc<KeyMap>>>>,
    board: Arc<Mutex<ProgressBoard>>,
    windows: Arc<Mutex<WindowRegistry>>,
    execution_id: Uuid,
}

impl Commander {
    /// Start a session on the given UI loop, using the key map cache in
    /// the system temporary directory.
    pub fn boot(ui: &UiThread) -> Result<Self> {
        Self::boot_with_cache(ui, KeyMapCache::in_temp_dir())
    }

    pub fn boot_with_cache(ui: &UiThread, cache: KeyMapCache) -> Result<Self> {
        let execution_id = Uuid::new_v4();
        info!("starting harness session {execution_id}");

        let chrome = ui.run_sync(BOOT_TIMEOUT, build_chrome)?;

        let board = Arc::new(Mutex::new(ProgressBoard::new()));
        let scheduler = Scheduler::new();

        // Once a second, refresh the uptime line from the board.
        let refresh_ui = ui.clone();
        let refresh_board = Arc::clone(&board);
        let uptime = chrome.uptime;
        scheduler.schedule_at_fixed_rate(Duration::ZERO, Duration::from_secs(1), move || {
            let snapshot = refresh_board.lock().snapshot();
            refresh_ui.run_later(move |scene| {
                scene.set_node_label(uptime, render_uptime(&snapshot));
            });
        });

        Ok(Self {
            ui: ui.clone(),
            scheduler,
            chrome,
            cache: Arc::new(cache),
            key_map: Arc::new(RwLock::new(None)),
            board,
            windows: Arc::new(Mutex::new(WindowRegistry::default())),
            execution_id,
        })
    }

    pub fn ui(&self) -> &UiThread {
        &self.ui
    }

    /// The commander's own window.
    pub fn window(&self) -> WindowId {
        self.chrome.window
    }

    /// Unique identifier of this session, stamped on all of its logging.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// The session key map: the published one if available, otherwise
    /// loaded from the cache or inferred by probing. Inference runs on
    /// the background scheduler; the returned completion resolves when
    /// the map is ready.
    pub fn key_map(&self) -> Completion<Arc<KeyMap>> {
        if let Some(existing) = self.key_map.read().clone() {
            return Completion::resolved(Ok(existing));
        }

        let (completer, pending) = completion();
        let ui = self.ui.clone();
        let cache = Arc::clone(&self.cache);
        let slot = Arc::clone(&self.key_map);
        let chrome = self.chrome;
        self.scheduler.execute(move || {
            // Another request may have produced the map while this job
            // waited its turn.
            if let Some(existing) = slot.read().clone() {
                completer.complete(Ok(existing));
                return;
            }
            let result = obtain_key_map(&ui, &cache, chrome).inspect(|map| {
                *slot.write() = Some(Arc::clone(map));
            });
            completer.complete(result);
        });
        pending
    }

    /// A robot typing with the session key map. Resolves once the key map
    /// is available.
    pub fn robot(&self) -> Completion<Robot> {
        let (completer, pending) = completion();
        let key_map = self.key_map();
        let ui = self.ui.clone();
        self.scheduler.execute(move || {
            completer.complete(key_map.wait().map(|map| Robot::new(ui, map)));
        });
        pending
    }

    /// Create, show, and front a fresh window, populated by `init`. The
    /// window is registered for [`close_all_windows`](Self::close_all_windows)
    /// and delivered after a short settle delay.
    pub fn new_window<F>(&self, title: &str, init: F) -> Completion<WindowId>
    where
        F: FnOnce(&mut Scene, WindowId) + Send + 'static,
    {
        let title = title.to_string();
        let windows = Arc::clone(&self.windows);
        let created = self.ui.submit(move |scene| {
            let window = scene.new_window(title);
            init(scene, window);
            scene.show_window(window);
            scene.bring_to_front(window);
            let mut registry = windows.lock();
            registry.open.push(window);
            registry.created += 1;
            Ok(window)
        });

        let (completer, pending) = completion();
        self.scheduler.schedule(WINDOW_SETTLE, move || {
            completer.complete(created.wait());
        });
        pending
    }

    /// Close every window this session has created, in one loop turn.
    pub fn close_all_windows(&self) -> Completion<()> {
        let windows = Arc::clone(&self.windows);
        self.ui.submit(move |scene| {
            let to_close: Vec<WindowId> = {
                let mut registry = windows.lock();
                let drained: Vec<WindowId> = registry.open.drain(..).collect();
                registry.released += drained.len() as u64;
                drained
            };
            for window in to_close {
                scene.close_window(window);
            }
            Ok(())
        })
    }

    /// Windows created and released so far. Reads may lag the UI loop by
    /// a task or two.
    pub fn window_counts(&self) -> (u64, u64) {
        let registry = self.windows.lock();
        (registry.created, registry.released)
    }

    /// Report a test state change. Updates the board and the status line.
    pub fn set_test_state(&self, test: TestInfo) {
        let board = Arc::clone(&self.board);
        let status = self.chrome.status;
        self.ui.run_later(move |scene| {
            let line = format!("{}: {}", test.name, test.state.name());
            board.lock().observe(test);
            scene.set_node_label(status, line);
        });
    }

    /// Declare how many tests the run is expected to contain.
    pub fn set_test_count(&self, count: u64) {
        let board = Arc::clone(&self.board);
        self.ui.run_later(move |_| board.lock().set_total(count));
    }

    pub fn set_application_info(&self, info: ApplicationInfo) {
        let board = Arc::clone(&self.board);
        self.ui
            .run_later(move |_| board.lock().set_application(info));
    }

    /// Push the commander window behind the application's windows.
    pub fn send_to_back(&self) {
        let window = self.chrome.window;
        self.ui.run_later(move |scene| scene.send_to_back(window));
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.board.lock().snapshot()
    }

    /// Shut the session down: announce it on the status line, give the
    /// display a grace period, close the commander window, and stop the
    /// scheduler. Bounded; a wedged loop cannot hang the caller forever.
    pub fn close(&self) -> Result<()> {
        let (completer, done) = completion();
        let ui = self.ui.clone();
        let status = self.chrome.status;
        let window = self.chrome.window;
        self.scheduler.schedule(Duration::from_secs(1), move || {
            ui.run_later(move |scene| scene.set_node_label(status, "Shutting down..."));
            thread::sleep(Duration::from_millis(500));
            ui.run_later(move |scene| scene.close_window(window));
            completer.complete(Ok(()));
        });
        done.wait_timeout(CLOSE_TIMEOUT)?;
        self.scheduler.shutdown();
        info!("harness session {} closed", self.execution_id);
        Ok(())
    }
}

fn build_chrome(scene: &mut Scene) -> Result<Chrome> {
    let window = scene.new_window(COMMANDER_TITLE);
    if let Some(w) = scene.window_mut(window) {
        w.set_size(1280.0, 800.0);
    }
    scene.show_window(window);
    scene.bring_to_front(window);

    let root = scene.set_root(
        window,
        Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 1280.0, 800.0)),
    );
    let attach = |scene: &mut Scene, node: Node| {
        scene
            .add_child(root, node)
            .ok_or_else(|| Error::NotFound("commander window root".to_string()))
    };

    attach(
        scene,
        Node::new(Role::Text)
            .with_id("version")
            .with_label(format!(
                "{COMMANDER_TITLE} {}",
                env!("CARGO_PKG_VERSION")
            ))
            .with_bounds(Rect::new(16.0, 16.0, 640.0, 24.0)),
    )?;
    let status = attach(
        scene,
        Node::new(Role::Text)
            .with_id("status")
            .with_label("Waiting...")
            .with_bounds(Rect::new(16.0, 48.0, 1000.0, 24.0)),
    )?;
    let uptime = attach(
        scene,
        Node::new(Role::Text)
            .with_id("uptime")
            .with_label("")
            .with_bounds(Rect::new(16.0, 80.0, 1000.0, 24.0)),
    )?;
    let input = attach(
        scene,
        Node::new(Role::TextField)
            .with_id("probe-input")
            .with_bounds(Rect::new(16.0, 640.0, 640.0, 120.0)),
    )?;

    Ok(Chrome {
        window,
        status,
        uptime,
        input,
    })
}

fn obtain_key_map(ui: &UiThread, cache: &KeyMapCache, chrome: Chrome) -> Result<Arc<KeyMap>> {
    if let Some(cached) = cache.load() {
        return Ok(Arc::new(cached));
    }
    let inferred = probe::infer_key_map(ui, chrome.window, chrome.input, Some(chrome.status))?;
    cache.save(&inferred);
    Ok(Arc::new(inferred))
}

fn render_uptime(snapshot: &ProgressSnapshot) -> String {
    let elapsed = snapshot.elapsed.as_secs();
    match &snapshot.application {
        Some(app) => format!(
            "{} {} ({}) | {}/{} run, {} failed | up {elapsed}s",
            app.name, app.version, app.build, snapshot.executed, snapshot.total, snapshot.failed,
        ),
        None => format!(
            "{}/{} run, {} failed | up {elapsed}s",
            snapshot.executed, snapshot.total, snapshot.failed,
        ),
    }
}
