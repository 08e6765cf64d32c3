//! Tool handlers
//!
//! One handler per [`ToolType`]. Each takes its typed, resolved options and
//! the shared context, and either succeeds (possibly updating the context)
//! or fails the step.

pub mod bump;
pub mod check;
pub mod commit;
pub mod github;
pub mod npm;
pub mod replace;
pub mod run;

use crate::config::{
    resolve_typed, BumpOptions, CheckOptions, CommitOptions, ExecOptions, GithubReleaseOptions,
    NpmPublishOptions, PushOptions, ReplaceOptions, ResolvedOptions, RunOptions, TagOptions,
    ToolType, Workflow,
};
use crate::error::Result;
use crate::runner::Context;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_yaml::Value;

/// Where a step's options come from
pub struct StepSource<'a> {
    pub workflow: &'a Workflow<'a>,
    pub global: &'a IndexMap<String, Value>,
    pub force_no_write: bool,
}

/// Resolve typed options for one step
pub fn resolve_step<T: DeserializeOwned>(
    tool: ToolType,
    step: &str,
    source: &StepSource<'_>,
) -> Result<ResolvedOptions<T>> {
    Ok(resolve_typed(
        tool,
        step,
        source.workflow,
        source.global,
        source.force_no_write,
    )?)
}

/// Check that a step's merged options fit its tool type
pub fn validate_step(tool: ToolType, step: &str, source: &StepSource<'_>) -> Result<()> {
    match tool {
        ToolType::Check => resolve_step::<CheckOptions>(tool, step, source).map(drop),
        ToolType::Replace => resolve_step::<ReplaceOptions>(tool, step, source).map(drop),
        ToolType::Bump => resolve_step::<BumpOptions>(tool, step, source).map(drop),
        ToolType::Run => resolve_step::<RunOptions>(tool, step, source).map(drop),
        ToolType::Exec => resolve_step::<ExecOptions>(tool, step, source).map(drop),
        ToolType::Commit => resolve_step::<CommitOptions>(tool, step, source).map(drop),
        ToolType::Tag => resolve_step::<TagOptions>(tool, step, source).map(drop),
        ToolType::Push => resolve_step::<PushOptions>(tool, step, source).map(drop),
        ToolType::NpmPublish => resolve_step::<NpmPublishOptions>(tool, step, source).map(drop),
        ToolType::GithubRelease => {
            resolve_step::<GithubReleaseOptions>(tool, step, source).map(drop)
        }
    }
}

/// Run a step's handler with its resolved options
///
/// Returns `false` when the step is disabled and was skipped.
pub fn dispatch(
    tool: ToolType,
    step: &str,
    source: &StepSource<'_>,
    ctx: &mut Context,
) -> Result<bool> {
    macro_rules! handle {
        ($handler:path, $options:ty) => {{
            let opts = resolve_step::<$options>(tool, step, source)?;
            if !opts.common.enable {
                tracing::info!("Skipping disabled step '{}'", step);
                return Ok(false);
            }
            tracing::debug!("Running '{}' tool with {}", tool, describe(&opts.merged));
            $handler(&opts, ctx)?;
        }};
    }

    match tool {
        ToolType::Check => handle!(check::run, CheckOptions),
        ToolType::Replace => handle!(replace::run, ReplaceOptions),
        ToolType::Bump => handle!(bump::run, BumpOptions),
        ToolType::Run => handle!(run::run, RunOptions),
        ToolType::Exec => handle!(run::exec_command, ExecOptions),
        ToolType::Commit => handle!(commit::commit, CommitOptions),
        ToolType::Tag => handle!(commit::tag, TagOptions),
        ToolType::Push => handle!(commit::push, PushOptions),
        ToolType::NpmPublish => handle!(npm::run, NpmPublishOptions),
        ToolType::GithubRelease => handle!(github::run, GithubReleaseOptions),
    }
    Ok(true)
}

/// One-line JSON rendering of a step's merged options
fn describe(merged: &Value) -> String {
    serde_json::to_string(merged).unwrap_or_else(|_| "{}".to_string())
}
