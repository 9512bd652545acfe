//! Scoped external process execution.
//!
//! Runs one converter invocation with captured output, a timeout and a
//! cancellation token. The executor reports what happened; deciding
//! whether that counts as success is left to the caller.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::ConversionError;

/// Maximum stderr characters kept in errors and logs.
const STDERR_LIMIT: usize = 2000;

/// Outcome of a finished process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code, `None` if terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, truncated.
    pub stderr: String,
    /// Wall time.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Substitute `{input}`, `{output}` and `{format}` in an argument template.
pub fn substitute_args(
    template_args: &[String],
    input_path: &Path,
    output_path: &Path,
    format: Option<&str>,
) -> Vec<String> {
    let input_str = input_path.to_string_lossy();
    let output_str = output_path.to_string_lossy();
    let format = format.unwrap_or_default();

    template_args
        .iter()
        .map(|arg| {
            arg.replace("{input}", &input_str)
                .replace("{output}", &output_str)
                .replace("{format}", format)
        })
        .collect()
}

/// Runs external converter processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    /// Create an executor killing processes after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program` with `args`, racing completion against the timeout and
    /// `cancel`. Either of the latter kills the child.
    pub async fn run(
        &self,
        stage: &str,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, ConversionError> {
        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        debug!(stage, program, ?args, "Spawning converter");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConversionError::ConverterNotFound {
                program: program.to_string(),
            },
            _ => ConversionError::Io(e),
        })?;

        // Drain both pipes concurrently so a chatty converter cannot block on
        // a full pipe while we wait for it.
        let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));
        let readers = [stdout_task.abort_handle(), stderr_task.abort_handle()];

        // The run is finished only once both pipes hit EOF. Descendants of the
        // converter can hold them open after the child itself has exited.
        let outcome = {
            let completion = async {
                let status = child.wait().await?;
                let (stdout, stderr) = tokio::join!(stdout_task, stderr_task);
                Ok::<_, ConversionError>((status, stdout?, stderr?))
            };

            tokio::select! {
                result = completion => Ok(result),
                _ = tokio::time::sleep(self.timeout) => Err(Interrupt::TimedOut),
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            }
        };

        let (status, stdout, stderr) = match outcome {
            Ok(result) => result?,
            Err(interrupt) => {
                readers.iter().for_each(|reader| reader.abort());
                let _ = child.kill().await;
                return Err(match interrupt {
                    Interrupt::TimedOut => {
                        error!(stage, timeout_s = self.timeout.as_secs(), "Converter timed out, killed");
                        ConversionError::ConverterTimedOut {
                            stage: stage.to_string(),
                            timeout_seconds: self.timeout.as_secs(),
                        }
                    }
                    Interrupt::Cancelled => {
                        info!(stage, "Conversion cancelled, converter killed");
                        ConversionError::Cancelled
                    }
                });
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let stderr: String = stderr.chars().take(STDERR_LIMIT).collect();
        let exit_code = status.code();

        if status.success() {
            info!(stage, duration_ms, "Converter finished");
        } else {
            error!(
                stage,
                code = exit_code.unwrap_or(-1),
                duration_ms,
                stderr = %stderr.chars().take(500).collect::<String>(),
                "Converter failed"
            );
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            duration_ms,
        })
    }
}

/// Why a run stopped before the converter finished.
enum Interrupt {
    TimedOut,
    Cancelled,
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}
