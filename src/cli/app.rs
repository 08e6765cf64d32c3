//! Main CLI application

use crate::config::{
    load_env_file, parse_config_auto, parse_config_file, validate_config, Config, ConfigStore,
    ToolType,
};
use crate::error::{ConfigError, ConfigResult, TagflowError};
use crate::runner::{Context, Pipeline, PipelineSummary, Verbosity};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Parsed configuration
    config: Config,
    /// Config file path
    config_path: PathBuf,
}

impl App {
    /// Create a new app from configuration file
    pub fn new() -> Result<Self, TagflowError> {
        let (config, config_path) = parse_config_auto()?;
        Self::from_parts(config, config_path)
    }

    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> Result<Self, TagflowError> {
        let config = parse_config_file(&path)?;
        Self::from_parts(config, path)
    }

    fn from_parts(config: Config, config_path: PathBuf) -> Result<Self, TagflowError> {
        validate_config(&config)?;
        let command = build_command(&config);
        Ok(App {
            command,
            config,
            config_path,
        })
    }

    /// Run the application with command line arguments
    pub fn run(self) -> Result<(), TagflowError> {
        let matches = self.command.clone().get_matches();
        self.run_matches(&matches)
    }

    fn run_matches(&self, matches: &ArgMatches) -> Result<(), TagflowError> {
        let verbosity = get_verbosity(matches);

        if matches.get_flag("list") {
            print_workflows(&self.config);
            return Ok(());
        }

        let target = matches
            .get_one::<String>("target")
            .map(String::as_str)
            .unwrap_or_default();
        let (workflow, args) = parse_target(target, self.config.task_name())?;
        let no_write = matches.get_flag("no-write");

        if let Some(env_path) = load_env_file(&self.config_path) {
            tracing::debug!("Loaded {}", env_path.display());
        }

        let pipeline = Pipeline::new(&self.config, &workflow, no_write)?;

        let mut ctx = Context::new()
            .with_working_dir(project_dir(&self.config_path))
            .with_config_store(ConfigStore::new(self.config.config.clone()))
            .with_invocation(&workflow, args);

        let summary = pipeline.run(&mut ctx)?;
        if verbosity > Verbosity::Silent {
            print_summary(&summary, &ctx, no_write);
        }
        Ok(())
    }
}

/// Build the clap command from configuration
fn build_command(config: &Config) -> Command {
    let name = config.task_name().to_string();
    let workflows: Vec<&str> = config.workflows.keys().map(String::as_str).collect();

    Command::new(name.clone())
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            config
                .usage
                .clone()
                .unwrap_or_else(|| "Release workflows for versioned projects".to_string()),
        )
        .after_help(format!("Workflows: {}", workflows.join(", ")))
        .arg(
            Arg::new("target")
                .value_name("TARGET")
                .help(format!("{}:<workflow>:<mode>, e.g. {}:release:patch", name, name)),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to tagflow.yml config file"),
        )
        .arg(
            Arg::new("no-write")
                .short('n')
                .long("no-write")
                .help("Report what would be done without changing anything")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List workflows and their steps")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print warnings and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Split `<task>:<workflow>:<mode>` into the workflow and its arguments
///
/// The mode becomes the first argument; an empty mode means no arguments.
pub fn parse_target(target: &str, task: &str) -> ConfigResult<(String, Vec<String>)> {
    let usage = || ConfigError::Usage {
        task: task.to_string(),
        got: target.to_string(),
    };

    let parts: Vec<&str> = target.split(':').collect();
    let [task_part, workflow, mode] = parts.as_slice() else {
        return Err(usage());
    };
    if *task_part != task || workflow.is_empty() {
        return Err(usage());
    }

    let args = if mode.is_empty() {
        Vec::new()
    } else {
        vec![mode.to_string()]
    };
    Ok((workflow.to_string(), args))
}

/// Commands and manifests are relative to the configuration file
fn project_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_workflows(config: &Config) {
    for (name, steps) in &config.workflows {
        println!("{}", name.bold());
        for step in steps.keys().filter(|k| k.as_str() != crate::config::COMMON_KEY) {
            let tool = ToolType::classify(step)
                .map(|t| t.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            println!("  {} {}", step, format!("({})", tool).dimmed());
        }
    }
}

fn print_summary(summary: &PipelineSummary, ctx: &Context, no_write: bool) {
    let mut line = format!(
        "{} {} step(s) in {:.1}s",
        "Done:".green().bold(),
        summary.executed.len(),
        summary.elapsed.as_secs_f64()
    );
    if !summary.skipped.is_empty() {
        line.push_str(&format!(", {} skipped", summary.skipped.len()));
    }
    if let Some(version) = &ctx.version {
        line.push_str(&format!(", version {}", version.cyan()));
    }
    if !ctx.warnings.is_empty() {
        line.push_str(&format!(
            ", {}",
            format!("{} warning(s)", ctx.warnings.len()).yellow()
        ));
    }
    if no_write {
        line.push_str(&format!(" {}", "(no-write: nothing was changed)".yellow()));
    }
    println!("{}", line);
}

/// Run the CLI application with provided arguments
pub fn run() -> Result<(), TagflowError> {
    // Check if --file flag is provided first
    let args: Vec<String> = env::args().collect();
    let file_path = extract_file_arg(&args);

    let app = if let Some(path) = file_path {
        App::with_config_file(path)?
    } else {
        App::new()?
    };

    app.run()
}

/// Extract --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if (args[i] == "--file" || args[i] == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}

/// Verbosity flags, read before the configuration is loaded
pub fn verbosity_from_args(args: &[String]) -> Verbosity {
    let has = |short: &str, long: &str| args.iter().any(|a| a == short || a == long);
    if has("-s", "--silent") {
        Verbosity::Silent
    } else if has("-q", "--quiet") {
        Verbosity::Quiet
    } else if has("-v", "--verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}
