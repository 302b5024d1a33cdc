//! Playback process client
//!
//! Spawns a playback daemon and drives it over its stdio pipes: one
//! blocking method per protocol verb, each writing a command line and
//! reading exactly one response line. The child's stderr is drained to
//! the parent's stderr on a background thread so diagnostics stay
//! visible.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command as ProcessCommand, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{ControlError, Response};

/// How long `quit` waits for the child to exit before killing it
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Handle onto a spawned playback process
pub struct ReplayClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ReplayClient {
    /// Spawn `command` with piped stdio and wrap it.
    ///
    /// The command is typically the `relog-replayd` binary, but anything
    /// speaking the control protocol on stdio works.
    pub fn spawn(command: &mut ProcessCommand) -> Result<Self, ControlError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(ControlError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(ControlError::NotRunning)?;
        if let Some(stderr) = child.stderr.take() {
            thread::Builder::new()
                .name("relog-client-stderr".into())
                .spawn(move || {
                    for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                        eprintln!("[replayd] {line}");
                    }
                })
                .ok();
        }

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Send one raw command line and read the single response line
    pub fn request(&mut self, line: &str) -> Result<Response, ControlError> {
        writeln!(self.stdin, "{line}")?;
        self.stdin.flush()?;

        let mut response = String::new();
        if self.stdout.read_line(&mut response)? == 0 {
            return Err(ControlError::NotRunning);
        }
        Response::parse(&response)
    }

    /// `SET_SERVER host port`
    pub fn set_server(&mut self, host: &str, port: u16) -> Result<Response, ControlError> {
        self.request(&format!("SET_SERVER {host} {port}"))
    }

    /// `LOAD_CSV path`
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<Response, ControlError> {
        self.request(&format!("LOAD_CSV {}", path.as_ref().display()))
    }

    /// `SEEK t`
    pub fn seek(&mut self, seconds: f64) -> Result<Response, ControlError> {
        self.request(&format!("SEEK {seconds}"))
    }

    /// `PLAY`
    pub fn play(&mut self) -> Result<Response, ControlError> {
        self.request("PLAY")
    }

    /// `PAUSE`
    pub fn pause(&mut self) -> Result<Response, ControlError> {
        self.request("PAUSE")
    }

    /// `STOP`
    pub fn stop(&mut self) -> Result<Response, ControlError> {
        self.request("STOP")
    }

    /// `PUBLISH_ON`
    pub fn publish_on(&mut self) -> Result<Response, ControlError> {
        self.request("PUBLISH_ON")
    }

    /// `PUBLISH_OFF`
    pub fn publish_off(&mut self) -> Result<Response, ControlError> {
        self.request("PUBLISH_OFF")
    }

    /// Send `QUIT`, wait briefly for a clean exit, then kill if needed
    pub fn quit(mut self) -> Result<Response, ControlError> {
        let response = self.request("QUIT")?;

        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait()? {
                Some(_) => break,
                None if Instant::now() >= deadline => {
                    self.child.kill().ok();
                    self.child.wait()?;
                    break;
                }
                None => thread::sleep(Duration::from_millis(10)),
            }
        }
        Ok(response)
    }
}

impl Drop for ReplayClient {
    fn drop(&mut self) {
        // A client dropped without quit() must not leave the child behind
        if matches!(self.child.try_wait(), Ok(None)) {
            self.child.kill().ok();
            self.child.wait().ok();
        }
    }
}
