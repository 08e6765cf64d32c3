//! `check`: assert release preconditions
//!
//! Every configured assertion runs and is reported; the step fails at the
//! end if any of them failed.

use crate::config::{CheckOptions, ResolvedOptions};
use crate::error::{ExecutionError, Result};
use crate::runner::{git, parse_version, Context};

/// Outcome of one assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub passed: bool,
    pub message: String,
}

impl Assertion {
    fn new(passed: bool, message: String) -> Self {
        if passed {
            tracing::info!("{}", message);
        } else {
            tracing::error!("{}", message);
        }
        Assertion { passed, message }
    }
}

pub fn run(opts: &ResolvedOptions<CheckOptions>, ctx: &mut Context) -> Result<()> {
    let results = evaluate(&opts.tool, ctx)?;
    let failed = results.iter().filter(|a| !a.passed).count();
    if failed > 0 {
        return Err(ExecutionError::ChecksFailed(failed).into());
    }
    Ok(())
}

/// Run every configured assertion
pub fn evaluate(opts: &CheckOptions, ctx: &mut Context) -> Result<Vec<Assertion>> {
    let mut results = Vec::new();

    if !opts.branch.is_empty() {
        let branch = git::current_branch(ctx)?;
        let allowed = opts.branch.join("', '");
        results.push(if opts.branch.contains(&branch) {
            Assertion::new(
                true,
                format!("Current branch '{}' in allowed list: '{}'.", branch, allowed),
            )
        } else {
            Assertion::new(
                false,
                format!("Current branch '{}' not in allowed list: '{}'.", branch, allowed),
            )
        });
    }

    if let Some(expect_clean) = opts.clean {
        let clean = git::is_clean(ctx)?;
        results.push(if clean == expect_clean {
            Assertion::new(
                true,
                format!("Repository is {}clean.", if clean { "" } else { "not " }),
            )
        } else {
            Assertion::new(
                false,
                format!(
                    "Repository has {}uncommitted changes.",
                    if clean { "no " } else { "" }
                ),
            )
        });
    }

    if let Some(expect_push) = opts.can_push {
        let pushable = git::can_push(ctx)?;
        results.push(Assertion::new(
            pushable == expect_push,
            format!(
                "Push is {}possible (expected {}).",
                if pushable { "" } else { "not " },
                if expect_push { "possible" } else { "not possible" }
            ),
        ));
    }

    if let Some(cmp) = opts.cmp_version {
        let tag = git::current_tag_name(ctx, false)?;
        let current = ctx.version.as_deref().and_then(parse_version);
        let tagged = parse_version(&tag);
        results.push(match (current, tagged) {
            (Some(current), Some(tagged)) => {
                let holds = cmp.holds(current.cmp_precedence(&tagged));
                Assertion::new(
                    holds,
                    format!(
                        "Version {} {} {} (latest tag {}){}.",
                        current,
                        cmp.symbol(),
                        tagged,
                        tag,
                        if holds { "" } else { " does not hold" }
                    ),
                )
            }
            (None, _) => Assertion::new(
                false,
                format!(
                    "Cannot compare versions: current version {:?} is not valid.",
                    ctx.version
                ),
            ),
            (_, None) => Assertion::new(
                false,
                format!("Cannot compare versions: tag '{}' is not a version.", tag),
            ),
        });
    }

    if !opts.allowed_modes.is_empty() {
        let mode = ctx.mode().unwrap_or_default().to_string();
        let allowed = opts.allowed_modes.join("', '");
        let ok = opts.allowed_modes.contains(&mode);
        results.push(Assertion::new(
            ok,
            format!(
                "Mode '{}' {}in allowed list: '{}'.",
                mode,
                if ok { "" } else { "not " },
                allowed
            ),
        ));
    }

    Ok(results)
}
