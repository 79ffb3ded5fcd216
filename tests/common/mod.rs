//! Shared test utilities and fixtures
//!
//! Helpers for running the `labrat` binary as the external harness would.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

/// A running `labrat` process with its stdout captured.
pub struct Fixture {
    child: Child,
    stdout: BufReader<ChildStdout>,
    _config: tempfile::NamedTempFile,
}

/// Start the binary with `config` as its TOML config file.
pub fn spawn_fixture(config: &str) -> Fixture {
    let mut file = tempfile::NamedTempFile::new().expect("create config file");
    file.write_all(config.as_bytes()).expect("write config");

    let mut child = Command::new(env!("CARGO_BIN_EXE_labrat"))
        .env("LABRAT_CONFIG", file.path())
        .env("RUST_LOG", "warn")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn labrat");
    let stdout = BufReader::new(child.stdout.take().expect("piped stdout"));

    Fixture {
        child,
        stdout,
        _config: file,
    }
}

impl Fixture {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block until the next stdout line, without its newline.
    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read stdout");
        line.trim_end_matches('\n').to_string()
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    #[cfg(unix)]
    pub fn signal(&self, signal: libc::c_int) {
        let pid = libc::pid_t::try_from(self.id()).expect("pid fits pid_t");
        let rc = unsafe { libc::kill(pid, signal) };
        assert_eq!(rc, 0, "kill({pid}, {signal}) failed");
    }

    /// Wait for exit and return the status plus everything left on stdout.
    pub fn wait(mut self) -> (ExitStatus, String) {
        let status = self.child.wait().expect("wait for labrat");
        let mut rest = String::new();
        self.stdout
            .read_to_string(&mut rest)
            .expect("read remaining stdout");
        (status, rest)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
