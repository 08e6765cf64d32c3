//! Common test utilities

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tagflow::error::ExecutionResult;
use tagflow::runner::{CommandOutput, CommandRequest, Context, Shell};
use tempfile::TempDir;

/// Shared log of every command line a [`ScriptedShell`] received
pub type CommandLog = Rc<RefCell<Vec<String>>>;

/// Answers commands from a script and records them
///
/// A command whose line starts with a scripted prefix gets that exit code
/// and stdout; everything else succeeds with no output.
pub struct ScriptedShell {
    log: CommandLog,
    script: Vec<(String, i32, String)>,
}

impl ScriptedShell {
    pub fn new() -> (Self, CommandLog) {
        let log = CommandLog::default();
        (
            ScriptedShell {
                log: log.clone(),
                script: Vec::new(),
            },
            log,
        )
    }

    /// A clean repository on `main` whose latest tag is `tag`
    pub fn repository(tag: &str) -> (Self, CommandLog) {
        let (shell, log) = Self::new();
        let shell = shell
            .respond("git rev-parse --abbrev-ref HEAD", 0, "main\n")
            .respond("git tag --list", 0, &format!("{}\n", tag))
            .respond("git rev-list --tags --max-count=1", 0, "deadbeef\n")
            .respond("git describe --tags deadbeef", 0, &format!("{}\n", tag));
        (shell, log)
    }

    pub fn respond(mut self, prefix: &str, code: i32, stdout: &str) -> Self {
        self.script
            .insert(0, (prefix.to_string(), code, stdout.to_string()));
        self
    }
}

impl Shell for ScriptedShell {
    fn run(&self, request: &CommandRequest) -> ExecutionResult<CommandOutput> {
        let line = request.display();
        self.log.borrow_mut().push(line.clone());

        let (code, stdout) = self
            .script
            .iter()
            .find(|(prefix, _, _)| line.starts_with(prefix.as_str()))
            .map(|(_, code, stdout)| (*code, stdout.clone()))
            .unwrap_or((0, String::new()));

        Ok(CommandOutput {
            code: Some(code),
            stdout,
            stderr: if code == 0 {
                String::new()
            } else {
                format!("{} failed", line)
            },
        })
    }
}

/// Create a temporary project with a tagflow.yml and a package.json
pub fn create_project(config: &str, version: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tagflow.yml");
    fs::write(&config_path, config).unwrap();
    write_file(
        &temp_dir,
        "package.json",
        &format!(
            "{{\n  \"name\": \"demo\",\n  \"version\": \"{}\",\n  \"description\": \"A demo\"\n}}\n",
            version
        ),
    );
    (temp_dir, config_path)
}

pub fn write_file(temp_dir: &TempDir, name: &str, content: &str) {
    let path = temp_dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn read_file(temp_dir: &TempDir, name: &str) -> String {
    fs::read_to_string(temp_dir.path().join(name)).unwrap()
}

/// Context for `workflow` with `mode`, running commands through `shell`
pub fn context(temp_dir: &TempDir, shell: ScriptedShell, workflow: &str, mode: &str) -> Context {
    let args = if mode.is_empty() {
        Vec::new()
    } else {
        vec![mode.to_string()]
    };
    Context::new()
        .with_working_dir(temp_dir.path().to_path_buf())
        .with_shell(Box::new(shell))
        .with_invocation(workflow, args)
}

/// Command lines starting with `prefix`
pub fn commands(log: &CommandLog, prefix: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|l| l.starts_with(prefix))
        .cloned()
        .collect()
}
