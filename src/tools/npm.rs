//! `npmPublish`: publish the working tree to the npm registry

use crate::config::{NpmPublishOptions, ResolvedOptions};
use crate::error::Result;
use crate::runner::command::{args, exec, ExecMode};
use crate::runner::{template, Context};

pub fn run(opts: &ResolvedOptions<NpmPublishOptions>, ctx: &mut Context) -> Result<()> {
    let mut npm_args = args(&["publish"]);
    if let Some(tag) = opts.tool.tag.as_deref().filter(|t| !t.is_empty()) {
        npm_args.push("--tag".to_string());
        npm_args.push(tag.to_string());
    }

    exec(ctx, opts.common.no_write, "npm", &npm_args, ExecMode::WRITE.streaming())?;

    let message = template::expand(&opts.tool.message, &ctx.template_vars());
    tracing::info!("{}", message);
    Ok(())
}
