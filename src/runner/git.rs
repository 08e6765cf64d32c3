//! Git operations
//!
//! Thin wrappers over `git` invocations. Queries always run; anything that
//! changes the repository is skipped in no-write mode.

use crate::error::ExecutionResult;
use crate::runner::command::{args, exec, ExecMode};
use crate::runner::Context;

/// Tag reported when the repository has no tags at all
pub const NO_TAG_SENTINEL: &str = "v0.0.0";

fn query(ctx: &Context, git_args: &[&str]) -> ExecutionResult<String> {
    let output = exec(ctx, false, "git", &args(git_args), ExecMode::QUERY)?;
    Ok(output.map(|o| o.stdout.trim().to_string()).unwrap_or_default())
}

fn probe(ctx: &Context, git_args: &[&str]) -> ExecutionResult<bool> {
    let output = exec(ctx, false, "git", &args(git_args), ExecMode::PROBE)?;
    Ok(output.map(|o| o.success()).unwrap_or(false))
}

fn write(ctx: &Context, no_write: bool, git_args: Vec<String>) -> ExecutionResult<()> {
    exec(ctx, no_write, "git", &git_args, ExecMode::WRITE)?;
    Ok(())
}

/// Name of the checked out branch
pub fn current_branch(ctx: &Context) -> ExecutionResult<String> {
    query(ctx, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Whether tracked files match HEAD
pub fn is_clean(ctx: &Context) -> ExecutionResult<bool> {
    probe(ctx, &["diff-index", "--quiet", "HEAD", "--"])
}

/// Whether a push would be accepted
pub fn can_push(ctx: &Context) -> ExecutionResult<bool> {
    probe(ctx, &["push", "--dry-run"])
}

/// Fetch tags from the default remote; reports whether it worked
pub fn fetch_tags(ctx: &Context) -> ExecutionResult<bool> {
    probe(ctx, &["fetch", "--tags"])
}

/// All local tag names
pub fn list_tags(ctx: &Context) -> ExecutionResult<Vec<String>> {
    let out = query(ctx, &["tag", "--list"])?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Commit of the most recently created tag
pub fn latest_tag_commit(ctx: &Context) -> ExecutionResult<String> {
    query(ctx, &["rev-list", "--tags", "--max-count=1"])
}

/// Human readable tag name for a commit
pub fn describe_tag(ctx: &Context, commit: &str) -> ExecutionResult<String> {
    query(ctx, &["describe", "--tags", commit])
}

/// The latest tag in the repository, looked up once per run
///
/// The result is cached on the context; later calls return the cached
/// value unless `reload` is set, even if a tag was created in between.
pub fn current_tag_name(ctx: &mut Context, reload: bool) -> ExecutionResult<String> {
    if !reload {
        if let Some(name) = &ctx.current_tag_name {
            return Ok(name.clone());
        }
    }

    if !fetch_tags(ctx)? {
        ctx.warn("Could not fetch tags from remote; using local tags only");
    }

    let name = if list_tags(ctx)?.is_empty() {
        ctx.warn(format!(
            "Repository has no tags; assuming {}",
            NO_TAG_SENTINEL
        ));
        NO_TAG_SENTINEL.to_string()
    } else {
        let commit = latest_tag_commit(ctx)?;
        describe_tag(ctx, &commit)?
    };

    tracing::debug!("Current tag: {}", name);
    ctx.current_tag_name = Some(name.clone());
    Ok(name)
}

/// Stage paths
pub fn add(ctx: &Context, no_write: bool, paths: &[String]) -> ExecutionResult<()> {
    let mut git_args = args(&["add", "--"]);
    git_args.extend(paths.iter().cloned());
    write(ctx, no_write, git_args)
}

/// Commit staged changes, or every tracked modification with `all`
pub fn commit(ctx: &Context, no_write: bool, message: &str, all: bool) -> ExecutionResult<()> {
    let mut git_args = args(&["commit"]);
    if all {
        git_args.push("-a".to_string());
    }
    git_args.push("-m".to_string());
    git_args.push(message.to_string());
    write(ctx, no_write, git_args)
}

/// Create an annotated tag
pub fn tag(ctx: &Context, no_write: bool, name: &str, message: &str) -> ExecutionResult<()> {
    write(
        ctx,
        no_write,
        args(&["tag", "-a", name, "-m", message]),
    )
}

/// What a push should carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    /// The current branch only
    Branch,
    /// Only tags
    Tags,
    /// The current branch plus annotated tags reachable from it
    FollowTags,
}

/// Push to a remote; an empty remote uses git's default
pub fn push(ctx: &Context, no_write: bool, remote: &str, kind: PushKind) -> ExecutionResult<()> {
    let mut git_args = args(&["push"]);
    if kind == PushKind::FollowTags {
        git_args.push("--follow-tags".to_string());
    }
    if !remote.is_empty() {
        git_args.push(remote.to_string());
    }
    match kind {
        PushKind::Tags => git_args.push("--tags".to_string()),
        PushKind::Branch | PushKind::FollowTags => {
            if !remote.is_empty() {
                git_args.push("HEAD".to_string());
            }
        }
    }
    write(ctx, no_write, git_args)
}
