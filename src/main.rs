use colored::Colorize;
use std::process;
use tagflow::runner::Verbosity;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Silent => "off",
        Verbosity::Quiet => "tagflow=warn",
        Verbosity::Normal => "tagflow=info",
        Verbosity::Verbose => "tagflow=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    init_tracing(tagflow::cli::verbosity_from_args(&args));

    if let Err(e) = tagflow::cli::run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
