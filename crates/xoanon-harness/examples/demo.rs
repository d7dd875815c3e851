//! Drives a small login form end to end and prints the session summary.
//!
//! Run with `RUST_LOG=info cargo run --example demo -p xoanon-harness`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use xoanon_core::{Rect, Role, TestInfo, TestState};
use xoanon_harness::Commander;
use xoanon_platform::UiThread;
use xoanon_scene::{KeyboardLayout, Node, Scene};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let ui = UiThread::spawn(Scene::new(KeyboardLayout::us_qwerty()))?;
    let commander = Commander::boot(&ui)?;
    commander.set_test_count(1);

    let robot = commander.robot().wait()?;
    let logged_in = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&logged_in);
    let window = commander
        .new_window("Login", move |scene, window| {
            let root = scene.set_root(
                window,
                Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::TextField)
                    .with_id("username")
                    .with_bounds(Rect::new(8.0, 8.0, 200.0, 24.0)),
            );
            scene.add_child(
                root,
                Node::new(Role::Button)
                    .with_id("login")
                    .with_label("Log in")
                    .with_bounds(Rect::new(8.0, 40.0, 80.0, 24.0))
                    .on_click(move || flag.store(true, Ordering::SeqCst)),
            );
        })
        .wait()?;

    commander.set_test_state(TestInfo::new("demo-1", "login works", TestState::Running));

    let username = robot.find_by_id_as(window, "username", Role::TextField)?;
    robot.type_text(username, "admin")?;
    robot.wait_until(Duration::from_secs(2), move |scene| {
        scene.node_text(username) == "admin"
    })?;

    let login = robot.find_by_id_as(window, "login", Role::Button)?;
    robot.click(login)?;
    robot.wait_for_frames(2)?;

    let state = if logged_in.load(Ordering::SeqCst) {
        TestState::Succeeded
    } else {
        TestState::Failed
    };
    commander.set_test_state(TestInfo::new("demo-1", "login works", state));

    let snapshot = commander.snapshot();
    println!(
        "tests: {} run, {} failed, worst state {}",
        snapshot.executed,
        snapshot.failed,
        snapshot.worst.name()
    );

    commander.close_all_windows().wait()?;
    commander.close()?;
    ui.close();
    Ok(())
}
