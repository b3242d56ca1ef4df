//! Subprocess execution behind a trait.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// What a finished subprocess produced.
#[derive(Debug, Clone)]
pub struct CliOutput {
    /// Whether the process exited zero
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

/// Why a subprocess could not produce output.
#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    /// The binary is not on PATH
    #[error("program `{0}` not found")]
    NotFound(String),
    /// The process exceeded the configured timeout and was killed
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Any other spawn or I/O failure
    #[error("{0}")]
    Io(String),
}

/// Something that can run a program with a timeout.
pub trait SubprocessRuntime: Send + Sync {
    /// Run `program` with `args`, capturing output.
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CliOutput, SubprocessError>;
}

/// Runtime using real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSubprocessRuntime;

impl SubprocessRuntime for OsSubprocessRuntime {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CliOutput, SubprocessError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    SubprocessError::NotFound(program.to_string())
                } else {
                    SubprocessError::Io(err.to_string())
                }
            })?;

        // drain the pipes on threads; a full pipe would deadlock the child
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = std::thread::spawn(move || read_all(stdout));
        let stderr_reader = std::thread::spawn(move || read_all(stderr));

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return Ok(CliOutput {
                        success: status.success(),
                        stdout: stdout_reader.join().unwrap_or_default(),
                        stderr: stderr_reader.join().unwrap_or_default(),
                    });
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::warn!(program, "subprocess killed after timeout");
                        return Err(SubprocessError::Timeout(timeout));
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(err) => return Err(SubprocessError::Io(err.to_string())),
            }
        }
    }
}

fn read_all(pipe: Option<impl Read>) -> String {
    let mut out = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut out);
    }
    out
}
