//! Sequential workflow driver
//!
//! A workflow is planned up front (every step classified and its options
//! checked), then its steps are taken off a queue one at a time. The first
//! failing step ends the run; the steps after it are never started.

use crate::config::{validate_config, CommonOptions, Config, ToolType, Workflow};
use crate::error::{ConfigError, Result};
use crate::runner::manifest::manifest_version;
use crate::runner::{git, parse_version, Context};
use crate::tools::{self, StepSource};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One classified step of a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub tool: ToolType,
}

/// What a successful run did
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Steps whose handler ran
    pub executed: Vec<String>,
    /// Disabled steps
    pub skipped: Vec<String>,
    pub elapsed: Duration,
}

/// A validated, ready-to-run workflow
pub struct Pipeline<'a> {
    config: &'a Config,
    workflow: Workflow<'a>,
    steps: Vec<Step>,
    force_no_write: bool,
}

impl<'a> Pipeline<'a> {
    /// Plan a workflow
    ///
    /// Fails on an unknown workflow, an unknown tool type or options that
    /// do not fit their tool, before anything has been executed.
    pub fn new(config: &'a Config, workflow: &str, force_no_write: bool) -> Result<Self> {
        validate_config(config)?;
        let workflow = config.workflow(workflow)?;

        let steps = workflow
            .step_names()
            .map(|name| {
                Ok(Step {
                    name: name.clone(),
                    tool: ToolType::classify(name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let pipeline = Pipeline {
            config,
            workflow,
            steps,
            force_no_write,
        };
        for step in &pipeline.steps {
            tools::validate_step(step.tool, &step.name, &pipeline.source())
                .map_err(|e| e.in_step(&step.name))?;
        }
        Ok(pipeline)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn source(&self) -> StepSource<'_> {
        StepSource {
            workflow: &self.workflow,
            global: &self.config.options,
            force_no_write: self.force_no_write,
        }
    }

    /// Run every step in declaration order
    pub fn run(&self, ctx: &mut Context) -> Result<PipelineSummary> {
        let started = Instant::now();
        let source = self.source();
        let mut queue: VecDeque<&Step> = self.steps.iter().collect();
        let mut summary = PipelineSummary {
            executed: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        };

        tracing::info!(
            "Running workflow '{}' ({} step(s){})",
            self.workflow.name,
            queue.len(),
            if self.force_no_write { ", no-write" } else { "" }
        );

        while let Some(step) = queue.pop_front() {
            let ran = self
                .run_step(step, &source, ctx)
                .map_err(|e| e.in_step(&step.name))?;
            if ran {
                summary.executed.push(step.name.clone());
            } else {
                summary.skipped.push(step.name.clone());
            }
            ctx.mark_completed(&step.name);
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    fn run_step(&self, step: &Step, source: &StepSource<'_>, ctx: &mut Context) -> Result<bool> {
        let common = tools::resolve_step::<CommonOptions>(step.tool, &step.name, source)?;
        if !common.common.enable {
            tracing::info!("Skipping disabled step '{}'", step.name);
            return Ok(false);
        }

        tracing::info!("Step '{}' ({})", step.name, step.tool);
        seed_version(ctx, &common.common.manifests)?;
        git::current_tag_name(ctx, false)?;

        tools::dispatch(step.tool, &step.name, source, ctx)
    }
}

/// Seed the run's version from the first manifest seen, once
fn seed_version(ctx: &mut Context, manifests: &[String]) -> Result<()> {
    if ctx.version.is_some() {
        return Ok(());
    }
    let Some(first) = manifests.first() else {
        return Ok(());
    };

    let path = ctx.resolve_path(first);
    let manifest = ctx.manifests.get(&path, false)?;
    let text = manifest_version(manifest).unwrap_or_default().to_string();
    let version = parse_version(&text).ok_or_else(|| ConfigError::InvalidVersion {
        path: path.clone(),
        version: text.clone(),
    })?;

    tracing::debug!("Version {} from {}", version, path.display());
    ctx.orig_version = Some(version.to_string());
    ctx.version = Some(version.to_string());
    Ok(())
}
