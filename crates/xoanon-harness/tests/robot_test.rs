//! End-to-end robot interactions against a live UI loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use xoanon_core::{Error, Key, KeyCode, KeyMap, Rect, Role, TestInfo, TestState};
use xoanon_harness::{Commander, KeyMapCache, Robot};
use xoanon_platform::UiThread;
use xoanon_scene::{KeyboardLayout, Node, Scene, WindowId};

struct Session {
    ui: UiThread,
    commander: Commander,
    _cache_dir: tempfile::TempDir,
}

impl Session {
    fn start() -> Session {
        let cache_dir = tempfile::tempdir().unwrap();
        let ui = UiThread::spawn(Scene::new(KeyboardLayout::us_qwerty())).unwrap();
        let commander =
            Commander::boot_with_cache(&ui, KeyMapCache::new(cache_dir.path())).unwrap();
        Session {
            ui,
            commander,
            _cache_dir: cache_dir,
        }
    }

    /// A robot with a pre-built key map, so interaction tests do not pay
    /// for probing.
    fn robot(&self) -> Robot {
        Robot::new(self.ui.clone(), Arc::new(us_key_map()))
    }

    fn empty_window(&self) -> WindowId {
        self.commander
            .new_window("App", |scene, window| {
                scene.set_root(
                    window,
                    Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
                );
            })
            .wait()
            .unwrap()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.ui.close();
    }
}

fn us_key_map() -> KeyMap {
    let layout = KeyboardLayout::us_qwerty();
    let mut map = KeyMap::empty();
    for code in KeyCode::all() {
        for shift in [false, true] {
            if let Some(c) = layout.char_for(code, shift) {
                map.insert(c, Key::new(code, shift, false, false));
            }
        }
    }
    map
}

fn poll_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[test]
fn click_fires_the_button_action() {
    let session = Session::start();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&clicks);
    let window = session
        .commander
        .new_window("App", move |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::Button)
                    .with_id("go")
                    .with_label("Go")
                    .with_bounds(Rect::new(8.0, 8.0, 64.0, 24.0))
                    .on_click(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    let button = robot.find_by_id(window, "go").unwrap();
    robot.click(button).unwrap();
    assert!(poll_until(Duration::from_secs(2), || {
        clicks.load(Ordering::SeqCst) == 1
    }));
}

#[test]
fn double_click_fires_the_action_twice() {
    let session = Session::start();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&clicks);
    let window = session
        .commander
        .new_window("App", move |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::Button)
                    .with_id("twice")
                    .with_bounds(Rect::new(8.0, 8.0, 64.0, 24.0))
                    .on_click(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    let button = robot.find_by_id(window, "twice").unwrap();
    robot.double_click(button).unwrap();
    assert!(poll_until(Duration::from_secs(2), || {
        clicks.load(Ordering::SeqCst) == 2
    }));
}

#[test]
fn non_finite_geometry_fails_before_the_pointer_moves() {
    let session = Session::start();
    let window = session
        .commander
        .new_window("App", |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::Button)
                    .with_id("broken")
                    .with_bounds(Rect::new(f32::NAN, 8.0, 64.0, 24.0)),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    let button = robot.find_by_id(window, "broken").unwrap();
    match robot.click(button) {
        Err(Error::AmbiguousGeometry { .. }) => {}
        other => panic!("unexpected: {other:?}"),
    }

    // The pointer never followed the bad geometry.
    let pointer = session
        .ui
        .run_sync(Duration::from_secs(1), |scene| Ok(scene.device().pointer()))
        .unwrap();
    assert!(pointer.is_finite());
}

#[test]
fn typing_clicks_the_target_exactly_once() {
    let session = Session::start();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&clicks);
    let window = session
        .commander
        .new_window("App", move |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::TextField)
                    .with_id("field")
                    .with_bounds(Rect::new(8.0, 8.0, 200.0, 24.0))
                    .on_click(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    let field = robot.find_by_id(window, "field").unwrap();
    robot.type_text(field, "ab").unwrap();
    robot.wait_for_frames(1).unwrap();

    let text = session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            Ok(scene.node_text(field))
        })
        .unwrap();
    assert_eq!(text, "ab");
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn typed_text_lands_in_the_field() {
    let session = Session::start();
    let window = session
        .commander
        .new_window("App", |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::TextField)
                    .with_id("field")
                    .with_bounds(Rect::new(8.0, 8.0, 200.0, 24.0)),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    let field = robot.find_by_id(window, "field").unwrap();
    robot.type_text(field, "Hello!").unwrap();
    robot.wait_for_frames(1).unwrap();

    let text = session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            Ok(scene.node_text(field))
        })
        .unwrap();
    assert_eq!(text, "Hello!");
}

#[test]
fn typing_an_unmapped_character_fails_without_injecting() {
    let session = Session::start();
    let window = session
        .commander
        .new_window("App", |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::TextField)
                    .with_id("field")
                    .with_bounds(Rect::new(8.0, 8.0, 200.0, 24.0)),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    let field = robot.find_by_id(window, "field").unwrap();
    match robot.type_text(field, "héllo") {
        Err(Error::NoKeyMapping('é')) => {}
        other => panic!("unexpected: {other:?}"),
    }

    let text = session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            Ok(scene.node_text(field))
        })
        .unwrap();
    assert_eq!(text, "");
}

#[test]
fn wait_until_sees_background_updates() {
    let session = Session::start();
    let window = session.empty_window();
    let ui = session.ui.clone();
    let label = session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            let root = scene
                .root_of(window)
                .ok_or_else(|| Error::NotFound("root".to_string()))?;
            scene
                .add_child(root, Node::new(Role::Text).with_id("progress"))
                .ok_or_else(|| Error::NotFound("root".to_string()))
        })
        .unwrap();

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        ui.run_later(move |scene| scene.set_node_label(label, "done"));
    });

    let robot = session.robot();
    robot
        .wait_until(Duration::from_secs(2), move |scene| {
            scene
                .node(label)
                .and_then(|n| n.label.as_deref())
                .is_some_and(|l| l == "done")
        })
        .unwrap();
}

#[test]
fn wait_until_times_out_on_a_false_predicate() {
    let session = Session::start();
    let robot = session.robot();
    match robot.wait_until(Duration::from_millis(200), |_| false) {
        Err(Error::Timeout(_)) => {}
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn locator_reports_not_found_until_the_element_appears() {
    let session = Session::start();
    let window = session.empty_window();
    let robot = session.robot();

    assert!(matches!(
        robot.find_by_id(window, "late"),
        Err(Error::NotFound(_))
    ));

    session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            let root = scene
                .root_of(window)
                .ok_or_else(|| Error::NotFound("root".to_string()))?;
            scene
                .add_child(
                    root,
                    Node::new(Role::Button)
                        .with_id("late")
                        .with_bounds(Rect::new(8.0, 8.0, 64.0, 24.0)),
                )
                .ok_or_else(|| Error::NotFound("root".to_string()))
        })
        .unwrap();

    assert!(robot.find_by_id(window, "late").is_ok());
}

#[test]
fn typed_lookup_checks_the_role() {
    let session = Session::start();
    let window = session
        .commander
        .new_window("App", |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::Button)
                    .with_id("go")
                    .with_bounds(Rect::new(8.0, 8.0, 64.0, 24.0)),
            );
        })
        .wait()
        .unwrap();

    let robot = session.robot();
    assert!(robot.find_by_id_as(window, "go", Role::Button).is_ok());
    assert!(matches!(
        robot.find_by_id_as(window, "go", Role::TextField),
        Err(Error::RoleMismatch { .. })
    ));
}

#[test]
fn zero_timeout_is_rounded_up() {
    let session = Session::start();
    let mut robot = session.robot();
    robot.set_timeout(Duration::ZERO);
    assert_eq!(robot.timeout(), Duration::from_millis(1));
}

#[test]
fn reset_releases_everything() {
    let session = Session::start();
    session.ui.run_later(|scene| {
        scene.key_press(KeyCode::Shift);
        scene.key_press(KeyCode::A);
    });
    session.ui.request_next_pulse();

    let robot = session.robot();
    robot.reset(None);

    let ui = session.ui.clone();
    assert!(poll_until(Duration::from_secs(2), move || {
        ui.run_sync(Duration::from_secs(1), |scene| {
            Ok(!scene.device().is_key_down(KeyCode::Shift)
                && !scene.device().is_key_down(KeyCode::A))
        })
        .unwrap_or(false)
    }));
}

#[test]
fn close_all_windows_releases_every_created_window() {
    let session = Session::start();
    let first = session.empty_window();
    let second = session.empty_window();

    session.commander.close_all_windows().wait().unwrap();
    assert_eq!(session.commander.window_counts(), (2, 2));

    let still_showing = session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            let showing = |w: WindowId| scene.window(w).map(|w| w.showing).unwrap_or(false);
            Ok(showing(first) || showing(second))
        })
        .unwrap();
    assert!(!still_showing);
}

#[test]
fn test_state_reports_reach_the_board() {
    let session = Session::start();
    session.commander.set_test_count(2);
    session
        .commander
        .set_test_state(TestInfo::new("t1", "alpha", TestState::Running));
    session
        .commander
        .set_test_state(TestInfo::new("t1", "alpha", TestState::Failed));
    session
        .commander
        .set_test_state(TestInfo::new("t2", "beta", TestState::Running));

    // The reports above are queued on the loop; a synchronous round trip
    // drains them.
    session
        .ui
        .run_sync(Duration::from_secs(1), |_| Ok(()))
        .unwrap();

    let snapshot = session.commander.snapshot();
    assert_eq!(snapshot.worst, TestState::Failed);
    assert_eq!(snapshot.total, 2);
    assert_eq!(snapshot.executed, 2);
    assert_eq!(snapshot.failed, 1);
}

#[test]
fn close_hides_the_commander_window() {
    let session = Session::start();
    let window = session.commander.window();
    session.commander.close().unwrap();

    let showing = session
        .ui
        .run_sync(Duration::from_secs(1), move |scene| {
            Ok(scene.window(window).map(|w| w.showing).unwrap_or(false))
        })
        .unwrap();
    assert!(!showing);
}
