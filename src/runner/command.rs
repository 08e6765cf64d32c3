//! Command execution
//!
//! Every external program (git, npm, task runners, shell commands) goes
//! through the [`Shell`] trait so the pipeline can be driven without real
//! processes.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::Context;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

/// A single program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
    /// Capture stdout/stderr instead of inheriting the terminal
    ///
    /// When streaming, stderr is still collected (and echoed) so a failure
    /// can report it.
    pub capture: bool,
}

impl CommandRequest {
    /// The command line as it would be typed
    pub fn display(&self) -> String {
        display_command(&self.program, &self.args)
    }
}

/// Outcome of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout and stderr joined, trimmed
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim().to_string();
        let err = self.stderr.trim();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Runs external programs
pub trait Shell {
    fn run(&self, request: &CommandRequest) -> ExecutionResult<CommandOutput>;
}

/// [`Shell`] backed by `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn run(&self, request: &CommandRequest) -> ExecutionResult<CommandOutput> {
        let mut command = StdCommand::new(&request.program);
        command.args(&request.args);
        command.current_dir(&request.dir);
        command.stdin(Stdio::inherit());

        let spawn_error = |e: std::io::Error| ExecutionError::Spawn {
            command: request.display(),
            error: e.to_string(),
        };

        if request.capture {
            let output = command.output().map_err(spawn_error)?;
            Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            command.stdout(Stdio::inherit());
            command.stderr(Stdio::piped());
            let mut child = command.spawn().map_err(spawn_error)?;

            let mut stderr = String::new();
            if let Some(pipe) = child.stderr.take() {
                let mut terminal = std::io::stderr();
                for line in BufReader::new(pipe).lines() {
                    let line = line.map_err(spawn_error)?;
                    let _ = writeln!(terminal, "{}", line);
                    stderr.push_str(&line);
                    stderr.push('\n');
                }
            }

            let status = child.wait().map_err(spawn_error)?;
            Ok(CommandOutput {
                code: status.code(),
                stdout: String::new(),
                stderr,
            })
        }
    }
}

/// How an invocation interacts with no-write mode and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecMode {
    /// Run even in no-write mode (read-only queries)
    pub always: bool,
    /// Treat a non-zero exit code as an error
    pub check_code: bool,
    /// Capture output instead of streaming it
    pub capture: bool,
}

impl ExecMode {
    /// A state-changing command: skipped under no-write, must succeed
    pub const WRITE: ExecMode = ExecMode {
        always: false,
        check_code: true,
        capture: true,
    };

    /// A read-only query whose stdout is parsed
    pub const QUERY: ExecMode = ExecMode {
        always: true,
        check_code: true,
        capture: true,
    };

    /// A read-only probe whose exit code is the answer
    pub const PROBE: ExecMode = ExecMode {
        always: true,
        check_code: false,
        capture: true,
    };

    pub fn streaming(mut self) -> Self {
        self.capture = false;
        self
    }
}

/// Run a program in the context's working directory
///
/// Returns `None` when the command was skipped because of no-write mode.
pub fn exec(
    ctx: &Context,
    no_write: bool,
    program: &str,
    args: &[String],
    mode: ExecMode,
) -> ExecutionResult<Option<CommandOutput>> {
    exec_in(ctx, &ctx.working_dir, no_write, program, args, mode)
}

/// Like [`exec`], in an explicit directory
pub fn exec_in(
    ctx: &Context,
    dir: &Path,
    no_write: bool,
    program: &str,
    args: &[String],
    mode: ExecMode,
) -> ExecutionResult<Option<CommandOutput>> {
    let request = CommandRequest {
        program: program.to_string(),
        args: args.to_vec(),
        dir: dir.to_path_buf(),
        capture: mode.capture,
    };

    if no_write && !mode.always {
        tracing::info!("Not actually running: {}", request.display());
        return Ok(None);
    }

    tracing::debug!("Running: {}", request.display());
    let output = ctx.shell.run(&request)?;

    if mode.check_code && !output.success() {
        return Err(ExecutionError::CommandFailed {
            command: request.display(),
            code: output.code,
            output: output.combined(),
        });
    }

    Ok(Some(output))
}

/// Run a command line through the context's interpreter (e.g. `sh -c`)
pub fn exec_shell_line(
    ctx: &Context,
    no_write: bool,
    line: &str,
    mode: ExecMode,
) -> ExecutionResult<Option<CommandOutput>> {
    let (program, base_args) = ctx
        .interpreter
        .split_first()
        .ok_or_else(|| ExecutionError::Environment("interpreter is empty".to_string()))?;

    let mut args = base_args.to_vec();
    args.push(line.to_string());
    exec(ctx, no_write, program, &args, mode)
}

/// Quote arguments that contain whitespace for display
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    for arg in args {
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            parts.push(format!("\"{}\"", arg));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// Build an owned argument list from string slices
pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
