//! # The UI event loop and its dispatch bridge
//!
//! One dedicated thread owns the [`Scene`] and processes submitted
//! closures in FIFO order; every other thread talks to it through
//! [`UiThread::submit`] and friends, receiving a [`Completion`] per
//! submission. This mirrors the single-threaded event-loop model of real
//! windowing toolkits: element inspection, geometry queries, and input
//! injection all happen on the loop, never concurrently.
//!
//! ```no_run
//! use xoanon_platform::UiThread;
//! use xoanon_scene::{KeyboardLayout, Scene};
//! use std::time::Duration;
//!
//! let ui = UiThread::spawn(Scene::new(KeyboardLayout::us_qwerty()))?;
//! let count = ui.run_sync(Duration::from_secs(1), |scene| {
//!     Ok(scene.windows_in_order().count())
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod completion;

pub use completion::{Completer, Completion, completion};

use std::any::Any;
use std::cell::{Cell, UnsafeCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Sender, unbounded};
use xoanon_core::{Error, Result};
use xoanon_scene::Scene;

thread_local! {
    static ON_UI_THREAD: Cell<bool> = const { Cell::new(false) };
    // The loop installs its scene here for the lifetime of the thread.
    // Every piece of work reaches the scene through this slot, so a
    // submission made from inside running work finds it too and can
    // execute in place.
    static SCENE_SLOT: UnsafeCell<Option<Scene>> = const { UnsafeCell::new(None) };
}

/// Whether the current thread is the UI loop thread.
pub fn is_ui_thread() -> bool {
    ON_UI_THREAD.get()
}

/// Run `f` against the loop's scene. Returns `None` when the slot is
/// empty (not the UI thread, or the loop has shut down).
fn with_scene<T>(f: impl FnOnce(&mut Scene) -> T) -> Option<T> {
    SCENE_SLOT.with(|slot| {
        // Safety: the slot belongs to the UI thread alone, and every
        // access is a reborrow on that thread's single call stack.
        let scene = unsafe { (*slot.get()).as_mut() }?;
        Some(f(scene))
    })
}

enum Task {
    Work(Box<dyn FnOnce() + Send>),
    Stop,
}

/// Handle to the UI loop. Cheap to clone; every clone submits to the
/// same FIFO queue.
#[derive(Clone)]
pub struct UiThread {
    tx: Sender<Task>,
    pulses: Arc<AtomicU64>,
    join: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl UiThread {
    /// Start the loop thread, handing it ownership of the scene.
    pub fn spawn(scene: Scene) -> std::io::Result<UiThread> {
        let (tx, rx) = unbounded::<Task>();
        let pulses = Arc::new(AtomicU64::new(0));
        let loop_pulses = pulses.clone();

        let join = std::thread::Builder::new()
            .name("xoanon-ui".into())
            .spawn(move || {
                ON_UI_THREAD.set(true);
                SCENE_SLOT.with(|slot| unsafe { *slot.get() = Some(scene) });

                while let Ok(task) = rx.recv() {
                    match task {
                        Task::Stop => break,
                        Task::Work(work) => work(),
                    }
                    // One loop turn per task: the pulse counter is what
                    // wait-for-frames observes.
                    loop_pulses.fetch_add(1, Ordering::Relaxed);
                }
                SCENE_SLOT.with(|slot| unsafe { *slot.get() = None });
                log::debug!("ui loop stopped");
            })?;

        Ok(UiThread {
            tx,
            pulses,
            join: Arc::new(Mutex::new(Some(join))),
        })
    }

    /// Submit work to the loop and return a future for its result.
    ///
    /// Called from the UI thread itself — including from inside work
    /// that is already running on the loop — the work executes
    /// synchronously in place and the completion is pre-resolved.
    /// Panics inside the work are captured and surface to the waiter as
    /// [`Error::WorkPanicked`]; the loop itself never dies from them.
    pub fn submit<T, F>(&self, work: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Scene) -> Result<T> + Send + 'static,
    {
        // Parked in an Option so it survives the in-place attempt when
        // the scene slot is empty and the closure never runs.
        let mut work = Some(work);
        if is_ui_thread() {
            if let Some(result) =
                with_scene(|scene| run_caught(work.take().expect("work present"), scene))
            {
                return Completion::resolved(result);
            }
        }
        let work = work.take().expect("work not consumed");

        let (completer, completion) = completion();
        let task = Box::new(move || {
            if let Some(result) = with_scene(|scene| run_caught(work, scene)) {
                completer.complete(result);
            }
        });
        // A send failure drops the task (and with it the completer), so
        // the returned completion resolves to LoopClosed.
        let _ = self.tx.send(Task::Work(task));
        completion
    }

    /// Submit and wait up to `timeout`.
    ///
    /// On timeout the enqueued work is abandoned: it still runs on the
    /// loop and may mutate shared state after this call has returned.
    /// That race is inherent to the one-way hand-off and is accepted
    /// rather than papered over with cancellation.
    pub fn run_sync<T, F>(&self, timeout: Duration, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Scene) -> Result<T> + Send + 'static,
    {
        self.submit(work).wait_timeout(timeout)
    }

    /// Fire-and-forget submission. Panics are logged, never propagated.
    pub fn run_later<F>(&self, work: F)
    where
        F: FnOnce(&mut Scene) + Send + 'static,
    {
        let task = Box::new(move || {
            let caught =
                with_scene(|scene| catch_unwind(AssertUnwindSafe(|| work(scene))));
            if let Some(Err(panic)) = caught {
                log::error!("ui work panicked: {}", panic_message(panic));
            }
        });
        let _ = self.tx.send(Task::Work(task));
    }

    /// Ask the loop to turn once more. Queued behind pending work, so
    /// observing the pulse counter advance past this point means all
    /// previously submitted work has run.
    pub fn request_next_pulse(&self) {
        let _ = self.tx.send(Task::Work(Box::new(|| {})));
    }

    /// Number of loop turns completed so far.
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// Stop the loop and join its thread. Work submitted after this
    /// resolves to [`Error::LoopClosed`].
    pub fn close(&self) {
        let _ = self.tx.send(Task::Stop);
        let handle = self.join.lock().ok().and_then(|mut j| j.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

fn run_caught<T, F>(work: F, scene: &mut Scene) -> Result<T>
where
    F: FnOnce(&mut Scene) -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(|| work(scene))) {
        Ok(result) => result,
        Err(panic) => Err(Error::WorkPanicked(panic_message(panic))),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xoanon_scene::KeyboardLayout;

    fn spawn() -> UiThread {
        UiThread::spawn(Scene::new(KeyboardLayout::empty())).unwrap()
    }

    #[test]
    fn test_submit_returns_value() {
        let ui = spawn();
        let n = ui
            .submit(|scene| {
                scene.new_window("w");
                Ok(scene.windows_in_order().count())
            })
            .wait()
            .unwrap();
        assert_eq!(n, 1);
        ui.close();
    }

    #[test]
    fn test_submission_order_is_fifo() {
        let ui = spawn();
        for i in 0..32 {
            ui.run_later(move |scene| {
                scene.new_window(format!("w{i}"));
            });
        }
        let titles = ui
            .run_sync(Duration::from_secs(5), |scene| {
                Ok(scene
                    .windows_in_order()
                    .map(|id| scene.window(id).unwrap().title.clone())
                    .collect::<Vec<_>>())
            })
            .unwrap();
        let expected: Vec<_> = (0..32).map(|i| format!("w{i}")).collect();
        assert_eq!(titles, expected);
        ui.close();
    }

    #[test]
    fn test_panic_is_captured_not_fatal() {
        let ui = spawn();
        let result: Result<()> = ui
            .submit(|_| panic!("deliberate"))
            .wait_timeout(Duration::from_secs(5));
        match result {
            Err(Error::WorkPanicked(msg)) => assert_eq!(msg, "deliberate"),
            other => panic!("unexpected: {other:?}"),
        }
        // The loop survives and keeps serving work.
        let two = ui
            .run_sync(Duration::from_secs(5), |_| Ok(2))
            .unwrap();
        assert_eq!(two, 2);
        ui.close();
    }

    #[test]
    fn test_run_sync_times_out_and_abandons_work() {
        let ui = spawn();
        let result: Result<()> = ui.run_sync(Duration::from_millis(20), |_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        });
        match result {
            Err(Error::Timeout(_)) => {}
            other => panic!("unexpected: {other:?}"),
        }
        // The abandoned work still ran to completion; the loop is fine.
        let ok = ui.run_sync(Duration::from_secs(5), |_| Ok(true)).unwrap();
        assert!(ok);
        ui.close();
    }

    #[test]
    fn test_errors_propagate_to_waiter() {
        let ui = spawn();
        let result: Result<()> = ui
            .submit(|_| Err(Error::NotFound("nothing here".into())))
            .wait();
        match result {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "nothing here"),
            other => panic!("unexpected: {other:?}"),
        }
        ui.close();
    }

    #[test]
    fn test_closed_loop_rejects_work() {
        let ui = spawn();
        ui.close();
        let result = ui.run_sync(Duration::from_secs(1), |_| Ok(1));
        match result {
            Err(Error::LoopClosed) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_submit_from_inside_work_resolves_in_place() {
        let ui = spawn();
        let inner = ui.clone();
        let count = ui
            .run_sync(Duration::from_secs(5), move |scene| {
                scene.new_window("outer");
                let nested = inner.submit(|scene| Ok(scene.windows_in_order().count()));
                assert!(nested.is_resolved());
                nested.wait()
            })
            .unwrap();
        assert_eq!(count, 1);
        ui.close();
    }

    #[test]
    fn test_run_sync_nests_without_deadlock() {
        let ui = spawn();
        let inner = ui.clone();
        let n = ui
            .run_sync(Duration::from_secs(5), move |_| {
                inner
                    .run_sync(Duration::from_millis(100), |_| Ok(41))
                    .map(|n| n + 1)
            })
            .unwrap();
        assert_eq!(n, 42);
        ui.close();
    }

    #[test]
    fn test_pulses_advance_with_work() {
        let ui = spawn();
        let before = ui.pulses();
        ui.request_next_pulse();
        ui.run_sync(Duration::from_secs(5), |_| Ok(())).unwrap();
        assert!(ui.pulses() >= before + 1);
        ui.close();
    }
}
