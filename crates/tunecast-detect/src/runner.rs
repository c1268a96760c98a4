//! Bounded execution of external scripting commands.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::DetectError;

/// Interval between exit checks while a child is running.
const POLL_STEP: Duration = Duration::from_millis(25);

/// Runs a program to completion, killing it if it outlives `timeout`.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    program: String,
    timeout: Duration,
}

impl ScriptRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Runner for the system AppleScript interpreter.
    pub fn osascript(timeout: Duration) -> Self {
        Self::new("osascript", timeout)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run an AppleScript given as source lines (one `-e` per line).
    pub fn run_applescript<S: AsRef<str>>(&self, lines: &[S]) -> Result<String, DetectError> {
        let args: Vec<&str> = lines
            .iter()
            .flat_map(|line| ["-e", line.as_ref()])
            .collect();
        self.run(&args)
    }

    /// Run the program with `args` and return its stdout, trailing
    /// whitespace trimmed.
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<String, DetectError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DetectError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Pipes are drained while the child runs so a full pipe buffer
        // cannot hold it past the timeout.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                warn!(
                    program = %self.program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Script timed out, killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                // Readers are left detached; a grandchild may still hold the pipes.
                return Err(DetectError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_STEP);
        };

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        if !status.success() {
            return Err(DetectError::Script {
                status: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&stdout).trim_end().to_string();
        debug!(
            program = %self.program,
            elapsed_ms = started.elapsed().as_millis() as u64,
            output = %stdout,
            "Script finished"
        );
        Ok(stdout)
    }
}

type Drain = Option<JoinHandle<io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain) -> Result<Vec<u8>, DetectError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::other("pipe reader panicked"))?
            .map_err(DetectError::from),
        None => Ok(Vec::new()),
    }
}
