#![forbid(unsafe_code)]

//! Drives an external tracker binary: `<tracker-bin> <verb> [args] --json`
//! (§4.8, §6). Generalized from the teacher's `codex exec` spawn-then-poll
//! pattern into a generic JSON-out CLI invocation.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::adapter::TrackerAdapter;
use crate::error::TrackerError;
use crate::model::{ClosureEvent, DependencyKind, WorkItem};

pub struct SubprocessTracker {
    binary: String,
    timeout: Duration,
}

impl SubprocessTracker {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Runs `<binary> <verb> [args] --json`. Stdout/stderr are drained on
    /// dedicated reader threads *while* the child runs, so a tracker binary
    /// that writes more than one pipe buffer of JSON before exiting never
    /// blocks on a full pipe — only the exit wait (not the read) is
    /// polled against the 30 s (configurable) deadline from §5, which is
    /// enforced by killing the child past it.
    fn invoke(&self, verb: &str, args: &[&str]) -> Result<Value, TrackerError> {
        let mut command = Command::new(&self.binary);
        command.arg(verb).args(args).arg("--json");
        command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command.spawn()?;
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());
        let started = Instant::now();

        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(TrackerError::Timeout {
                            verb: verb.to_string(),
                            after_ms: self.timeout.as_millis() as u64,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        };

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        if !status.success() {
            return Err(TrackerError::Subprocess {
                verb: verb.to_string(),
                stderr,
            });
        }

        serde_json::from_str(&stdout).map_err(|err| TrackerError::UnexpectedOutput {
            detail: err.to_string(),
        })
    }

    /// Unwraps a single-element JSON array into its one element, per the
    /// adapter's documented tolerance (§6).
    fn unwrap_single(value: Value) -> Result<Value, TrackerError> {
        match value {
            Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
            other => Ok(other),
        }
    }

    fn invoke_item(&self, verb: &str, args: &[&str]) -> Result<WorkItem, TrackerError> {
        let value = Self::unwrap_single(self.invoke(verb, args)?)?;
        serde_json::from_value(value).map_err(|err| TrackerError::UnexpectedOutput {
            detail: err.to_string(),
        })
    }
}

/// Spawns a thread that reads `pipe` to completion into a `String`, so the
/// caller can keep polling the child for exit without the pipe's buffer
/// filling up and stalling the child's write.
fn spawn_reader(pipe: Option<impl Read + Send + 'static>) -> Option<JoinHandle<String>> {
    let pipe = pipe?;
    Some(std::thread::spawn(move || {
        let mut pipe = pipe;
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    }))
}

/// Joins a reader thread, treating a panicked reader as empty output
/// rather than propagating the panic into the caller.
fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl TrackerAdapter for SubprocessTracker {
    fn create(&mut self, title: &str) -> Result<WorkItem, TrackerError> {
        self.invoke_item("create", &[title])
    }

    fn list(&self) -> Result<Vec<WorkItem>, TrackerError> {
        let value = self.invoke("list", &[])?;
        serde_json::from_value(value).map_err(|err| TrackerError::UnexpectedOutput {
            detail: err.to_string(),
        })
    }

    fn get(&self, id: &str) -> Result<WorkItem, TrackerError> {
        self.invoke_item("show", &[id])
    }

    fn update(&mut self, id: &str, title: &str) -> Result<WorkItem, TrackerError> {
        self.invoke_item("update", &[id, title])
    }

    fn close(&mut self, id: &str) -> Result<ClosureEvent, TrackerError> {
        let value = Self::unwrap_single(self.invoke("close", &[id])?)?;
        serde_json::from_value(value).map_err(|err| TrackerError::UnexpectedOutput {
            detail: err.to_string(),
        })
    }

    fn add_dependency(&mut self, id: &str, target_id: &str, kind: DependencyKind) -> Result<(), TrackerError> {
        let kind_arg = match kind {
            DependencyKind::Blocks => "blocks",
            DependencyKind::Related => "related",
            DependencyKind::ParentChild => "parent-child",
            DependencyKind::DiscoveredFrom => "discovered-from",
        };
        self.invoke("dep", &["add", id, target_id, kind_arg])?;
        Ok(())
    }

    fn list_discovered_from(&self, parent_id: &str) -> Result<Vec<WorkItem>, TrackerError> {
        let value = self.invoke("dep", &["tree", parent_id])?;
        serde_json::from_value(value).map_err(|err| TrackerError::UnexpectedOutput {
            detail: err.to_string(),
        })
    }

    fn export_snapshot(&self) -> Result<Vec<WorkItem>, TrackerError> {
        self.list()
    }
}
