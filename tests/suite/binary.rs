//! End-to-end checks against the built `labrat` binary.

use std::thread;
use std::time::Duration;

use crate::common::spawn_fixture;

/// Keeps individual iterations short so shutdown is prompt.
const BOUNDED: &str = "[depth]\nmax_depth = 2000\n";

#[test]
fn first_stdout_line_is_the_default_marker() {
    let mut fixture = spawn_fixture("");
    assert_eq!(fixture.read_line(), "busyLoop starting");
}

#[test]
fn marker_can_be_configured() {
    let mut fixture = spawn_fixture("[driver]\nmarker = \"attach now\"\n");
    assert_eq!(fixture.read_line(), "attach now");
}

#[test]
fn keeps_running_after_the_marker() {
    let mut fixture = spawn_fixture(BOUNDED);
    fixture.read_line();
    thread::sleep(Duration::from_millis(300));
    assert!(fixture.is_running());
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let mut fixture = spawn_fixture("[depth]\nexponent = -1.0\n");
    assert_eq!(fixture.read_line(), "busyLoop starting");
    assert!(fixture.is_running());
}

#[test]
fn runs_on_a_single_small_worker() {
    let mut fixture = spawn_fixture(
        "[runtime]\nworker_threads = 1\nthread_stack_size = 262144\n",
    );
    fixture.read_line();
    // Deep iterations hop onto heap segments instead of overflowing the worker.
    thread::sleep(Duration::from_millis(500));
    assert!(fixture.is_running());
}

#[cfg(unix)]
#[test]
fn sigterm_stops_at_iteration_boundary() {
    let mut fixture = spawn_fixture(BOUNDED);
    assert_eq!(fixture.read_line(), "busyLoop starting");
    thread::sleep(Duration::from_millis(50));

    fixture.signal(libc::SIGTERM);
    let (status, rest) = fixture.wait();

    assert!(status.success(), "exit status {status}");
    assert_eq!(rest, "", "marker must be the only stdout output");
}

#[cfg(unix)]
#[test]
fn sigint_right_after_marker_is_handled() {
    let mut fixture = spawn_fixture(BOUNDED);
    fixture.read_line();

    fixture.signal(libc::SIGINT);
    let (status, rest) = fixture.wait();

    assert!(status.success(), "exit status {status}");
    assert!(rest.is_empty());
}
