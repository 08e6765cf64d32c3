//! `commit`, `tag` and `push`: the git side of a release

use crate::config::{CommitOptions, PushOptions, ResolvedOptions, TagOptions};
use crate::error::Result;
use crate::runner::git::{self, PushKind};
use crate::runner::{template, Context};

pub fn commit(opts: &ResolvedOptions<CommitOptions>, ctx: &mut Context) -> Result<()> {
    let no_write = opts.common.no_write;
    let message = template::expand(&opts.tool.message, &ctx.template_vars());

    if !opts.tool.add.is_empty() {
        git::add(ctx, no_write, &opts.tool.add)?;
    }
    git::commit(ctx, no_write, &message, opts.tool.add_known)?;
    tracing::info!("Committed \"{}\"", message);
    Ok(())
}

/// Create an annotated tag and remember its name for later steps
pub fn tag(opts: &ResolvedOptions<TagOptions>, ctx: &mut Context) -> Result<()> {
    let vars = ctx.template_vars();
    let name = template::expand(&opts.tool.name, &vars);
    let message = template::expand(&opts.tool.message, &vars);

    git::tag(ctx, opts.common.no_write, &name, &message)?;
    tracing::info!("Created tag {}: \"{}\"", name, message);
    ctx.last_tag_name = Some(name);
    Ok(())
}

pub fn push(opts: &ResolvedOptions<PushOptions>, ctx: &mut Context) -> Result<()> {
    let push = &opts.tool;
    let no_write = opts.common.no_write;

    if push.tags && push.use_follow_tags {
        git::push(ctx, no_write, &push.target, PushKind::FollowTags)?;
    } else {
        git::push(ctx, no_write, &push.target, PushKind::Branch)?;
        if push.tags {
            git::push(ctx, no_write, &push.target, PushKind::Tags)?;
        }
    }
    tracing::info!(
        "Pushed {} ({})",
        if push.target.is_empty() { "default remote" } else { &push.target },
        if push.tags { "with tags" } else { "no tags" }
    );
    Ok(())
}
