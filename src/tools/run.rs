//! `run` and `exec`: external tasks and raw shell commands

use crate::config::{ExecOptions, ResolvedOptions, RunOptions};
use crate::error::{ExecutionError, Result};
use crate::runner::command::{exec, exec_shell_line, ExecMode};
use crate::runner::{template, Context};

/// Invoke all configured tasks through the runner in one process
pub fn run(opts: &ResolvedOptions<RunOptions>, ctx: &mut Context) -> Result<()> {
    let tasks = &opts.tool.tasks;
    if tasks.is_empty() {
        ctx.warn(format!("{}: no tasks configured", opts.step));
        return Ok(());
    }

    let mode = if opts.tool.silent {
        ExecMode::WRITE
    } else {
        ExecMode::WRITE.streaming()
    };
    tracing::info!("Run task(s) {}", tasks.join(", "));
    exec(ctx, opts.common.no_write, &opts.tool.runner, tasks, mode)?;
    Ok(())
}

/// Run a template-expanded command line through the interpreter
pub fn exec_command(opts: &ResolvedOptions<ExecOptions>, ctx: &mut Context) -> Result<()> {
    if opts.tool.cmd.trim().is_empty() {
        return Err(ExecutionError::MissingValue(format!("{}.cmd", opts.step)).into());
    }
    let line = template::expand(&opts.tool.cmd, &ctx.template_vars());

    let mode = if opts.tool.silent {
        ExecMode::WRITE
    } else {
        ExecMode::WRITE.streaming()
    };
    exec_shell_line(ctx, opts.common.no_write, &line, mode)?;
    Ok(())
}
