use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};
use std::process::{Child, Command};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::status::{Fault, FaultResult};

const REAP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A program plus its fixed argument list.
///
/// Deserializes from a plain array, `["lspci", "-mm", "-nn"]`, with the
/// program first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for CommandSpec {
    type Error = String;

    fn try_from(mut parts: Vec<String>) -> Result<Self, Self::Error> {
        if parts.is_empty() || parts[0].trim().is_empty() {
            return Err("command must name a program".to_string());
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }
}

impl From<CommandSpec> for Vec<String> {
    fn from(spec: CommandSpec) -> Self {
        let mut parts = vec![spec.program];
        parts.extend(spec.args);
        parts
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes a host command and returns its combined output as text.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> FaultResult<String>;
}

/// Runs commands on the local host, one blocking attempt per call.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// `timeout_ms == 0` waits for the command indefinitely.
    pub fn new(timeout_ms: u64) -> Self {
        let timeout = if timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(timeout_ms))
        };
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn(&self, spec: &CommandSpec) -> io::Result<(Child, io::PipeReader)> {
        let (reader, writer) = io::pipe()?;
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        command.stdout(writer.try_clone()?).stderr(writer);
        let child = command.spawn()?;
        // The parent's copies of the write end live in `command`; they must be
        // closed or the reader never sees EOF.
        drop(command);
        Ok((child, reader))
    }

    /// Collect output and exit status, both bounded by one deadline.
    ///
    /// On expiry the child is killed and reaped. The reader thread is left to
    /// finish on its own; it stays blocked while any grandchild still holds
    /// the write end of the pipe.
    fn wait_output(
        &self,
        spec: &CommandSpec,
        mut child: Child,
        mut reader: io::PipeReader,
    ) -> FaultResult<(i32, Vec<u8>)> {
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let result = reader.read_to_end(&mut buf).map(|_| buf);
            let _ = sender.send(result);
        });

        let captured = match deadline {
            Some(deadline) => {
                match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(result) => result,
                    Err(_) => return Err(self.kill_timed_out(spec, &mut child)),
                }
            }
            None => receiver
                .recv()
                .unwrap_or_else(|e| Err(io::Error::new(io::ErrorKind::BrokenPipe, e))),
        };

        let output = match captured {
            Ok(output) => output,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Fault::new(e.to_string()));
            }
        };

        let status = match deadline {
            Some(deadline) => loop {
                // The pipe can close well before the process exits.
                match child.try_wait().map_err(|e| Fault::new(e.to_string()))? {
                    Some(status) => break status,
                    None if Instant::now() >= deadline => {
                        return Err(self.kill_timed_out(spec, &mut child));
                    }
                    None => thread::sleep(REAP_POLL_INTERVAL),
                }
            },
            None => child.wait().map_err(|e| Fault::new(e.to_string()))?,
        };
        Ok((status.code().unwrap_or(-1), output))
    }

    fn kill_timed_out(&self, spec: &CommandSpec, child: &mut Child) -> Fault {
        let _ = child.kill();
        let _ = child.wait();
        let millis = self.timeout.map(|t| t.as_millis()).unwrap_or_default();
        Fault::new(format!("command timed out after {}ms: {}", millis, spec))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> FaultResult<String> {
        debug!(command = %spec, "running command");

        let (child, reader) = self.spawn(spec).map_err(|e| {
            warn!(command = %spec, error = %e, "failed to spawn command");
            Fault::new(e.to_string())
        })?;

        let (exit_code, output) = self.wait_output(spec, child, reader).map_err(|fault| {
            warn!(command = %spec, reason = %fault.message, "command did not complete");
            fault
        })?;

        if exit_code != 0 {
            warn!(command = %spec, exit_code, "command exited with failure");
            return Err(Fault::execution(
                exit_code,
                String::from_utf8_lossy(&output).into_owned(),
            ));
        }

        String::from_utf8(output).map_err(|e| Fault::new(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::FaultKind;

    #[test]
    fn test_command_spec_from_array() {
        let spec: CommandSpec = serde_json::from_str(r#"["lspci", "-mm", "-nn"]"#).unwrap();
        assert_eq!(spec.program, "lspci");
        assert_eq!(spec.args, vec!["-mm", "-nn"]);
        assert_eq!(spec.to_string(), "lspci -mm -nn");
    }

    #[test]
    fn test_command_spec_rejects_empty_array() {
        let result: Result<CommandSpec, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        assert_eq!(SystemRunner::new(0).timeout(), None);
        assert_eq!(SystemRunner::new(250).timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_missing_program_is_code_zero_fault() {
        let runner = SystemRunner::new(0);
        let fault = runner
            .run(&CommandSpec::new("hwc-definitely-not-installed", Vec::<String>::new()))
            .unwrap_err();
        assert_eq!(fault.code, 0);
        assert_eq!(fault.kind, FaultKind::Execution);
        assert!(!fault.message.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_output_returned_verbatim() {
        let runner = SystemRunner::new(0);
        let output = runner
            .run(&CommandSpec::new("sh", ["-c", "printf '  a: b\\n\\n'"]))
            .unwrap();
        assert_eq!(output, "  a: b\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_stderr_is_captured_with_stdout() {
        let runner = SystemRunner::new(0);
        let output = runner
            .run(&CommandSpec::new("sh", ["-c", "echo out; echo err 1>&2"]))
            .unwrap();
        assert!(output.contains("out\n"));
        assert!(output.contains("err\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_code_and_output() {
        let runner = SystemRunner::new(0);
        let fault = runner
            .run(&CommandSpec::new("sh", ["-c", "echo 'device busy' 1>&2; exit 3"]))
            .unwrap_err();
        assert_eq!(fault.code, 3);
        assert_eq!(fault.message, "device busy\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_output_is_fault() {
        let runner = SystemRunner::new(0);
        let fault = runner
            .run(&CommandSpec::new("sh", ["-c", "printf '\\377\\376'"]))
            .unwrap_err();
        assert_eq!(fault.code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_command() {
        let runner = SystemRunner::new(100);
        let fault = runner
            .run(&CommandSpec::new("sleep", ["5"]))
            .unwrap_err();
        assert_eq!(fault.code, 0);
        assert_eq!(fault.message, "command timed out after 100ms: sleep 5");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_covers_command_that_closes_its_output() {
        let runner = SystemRunner::new(200);
        let started = Instant::now();
        let fault = runner
            .run(&CommandSpec::new("sh", ["-c", "exec >/dev/null 2>&1; sleep 3"]))
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(fault.code, 0);
        assert!(fault.message.starts_with("command timed out after 200ms: "));
    }

    #[cfg(unix)]
    #[test]
    fn test_killed_by_signal_is_code_minus_one() {
        let runner = SystemRunner::new(0);
        let fault = runner
            .run(&CommandSpec::new("sh", ["-c", "kill -9 $$"]))
            .unwrap_err();
        assert_eq!(fault.code, -1);
        assert_eq!(fault.kind, FaultKind::Execution);
    }
}
