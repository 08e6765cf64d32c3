//! Execution context for a workflow run
//!
//! One context is created per run and handed to every step. Steps read
//! and update the version state here; the manifest cache and the cached
//! repository tag live here too.

use crate::config::ConfigStore;
use crate::runner::command::{Shell, SystemShell};
use crate::runner::manifest::ManifestCache;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Shared state threaded through the steps of one workflow run
pub struct Context {
    /// Directory commands run in and manifests are resolved against
    pub working_dir: PathBuf,

    /// Interpreter for `exec` steps (e.g., ["sh", "-c"])
    pub interpreter: Vec<String>,

    /// Runs git, npm and friends
    pub shell: Box<dyn Shell>,

    /// Name of the running workflow
    pub workflow: String,

    /// Extra command-line tokens after the workflow name (the mode first)
    pub args: Vec<String>,

    /// Parsed manifests by path
    pub manifests: ManifestCache,

    /// Steps that finished (or were skipped) so far
    pub completed: Vec<String>,

    /// Master version when the run started
    pub orig_version: Option<String>,

    /// Master version as of the latest bump
    pub version: Option<String>,

    /// Latest repository tag, looked up once per run
    pub current_tag_name: Option<String>,

    /// Tag created by the most recent `tag` step
    pub last_tag_name: Option<String>,

    /// `owner/name`, set by `githubRelease`
    pub repo: Option<String>,

    /// Host configuration values (`bump.updateConfig` target)
    pub config_store: ConfigStore,

    /// Soft warnings raised during the run
    pub warnings: Vec<String>,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            shell: Box::new(SystemShell),
            workflow: String::new(),
            args: Vec::new(),
            manifests: ManifestCache::default(),
            completed: Vec::new(),
            orig_version: None,
            version: None,
            current_tag_name: None,
            last_tag_name: None,
            repo: None,
            config_store: ConfigStore::default(),
            warnings: Vec::new(),
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Replace the process runner
    pub fn with_shell(mut self, shell: Box<dyn Shell>) -> Self {
        self.shell = shell;
        self
    }

    /// Set the workflow name and its command-line arguments
    pub fn with_invocation(mut self, workflow: &str, args: Vec<String>) -> Self {
        self.workflow = workflow.to_string();
        self.args = args;
        self
    }

    /// Set the host configuration store
    pub fn with_config_store(mut self, store: ConfigStore) -> Self {
        self.config_store = store;
        self
    }

    /// The mode given on the command line, if any
    pub fn mode(&self) -> Option<&str> {
        self.args
            .first()
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Resolve a manifest or file path against the working directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        self.working_dir.join(path)
    }

    /// Log and record a soft warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Record a finished step
    pub fn mark_completed(&mut self, step: &str) {
        self.completed.push(step.to_string());
    }

    /// Fields available to `{%= name %}` templates
    ///
    /// Known fields that are not set yet render as empty strings.
    pub fn template_vars(&self) -> HashMap<String, String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        let mut vars = HashMap::new();
        vars.insert("version".to_string(), text(&self.version));
        vars.insert("origVersion".to_string(), text(&self.orig_version));
        vars.insert("currentTagName".to_string(), text(&self.current_tag_name));
        vars.insert("lastTagName".to_string(), text(&self.last_tag_name));
        vars.insert("repo".to_string(), text(&self.repo));
        vars.insert("workflow".to_string(), self.workflow.clone());
        vars.insert("mode".to_string(), self.mode().unwrap_or_default().to_string());
        vars.insert(
            "timestamp".to_string(),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        vars
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
