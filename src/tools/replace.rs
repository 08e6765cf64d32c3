//! `replace`: regex find/replace across a set of files
//!
//! Two literal tokens are built in: `@@timestamp` and `@@version`.

use crate::config::{ReplaceOptions, ResolvedOptions};
use crate::error::{ExecutionError, ExecutionResult, Result};
use crate::runner::{template, Context};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_TOKEN: &str = "@@timestamp";
const VERSION_TOKEN: &str = "@@version";

/// Replacements made in one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub matches: usize,
}

/// A compiled rule with its expanded replacement text
struct Rule {
    regex: Regex,
    replacement: String,
}

pub fn run(opts: &ResolvedOptions<ReplaceOptions>, ctx: &mut Context) -> Result<()> {
    let vars = ctx.template_vars();
    let rules = compile_rules(&opts.tool, &vars)?;
    let files = expand_files(&ctx.working_dir, &opts.tool.files)?;

    let mut reports = Vec::new();
    for path in files {
        let Ok(content) = String::from_utf8(fs::read(&path)?) else {
            ctx.warn(format!("{}: skipping non-text file {}", opts.step, path.display()));
            continue;
        };
        let (updated, matches) = apply_rules(&content, &rules);
        if matches == 0 {
            continue;
        }
        tracing::info!("Replaced {} match(es) in {}", matches, path.display());
        if !opts.common.no_write {
            fs::write(&path, updated)?;
        }
        reports.push(FileReport { path, matches });
    }

    let total: usize = reports.iter().map(|r| r.matches).sum();
    if total == 0 {
        ctx.warn(format!("{}: no matches replaced", opts.step));
    } else {
        tracing::info!(
            "{}Replaced {} match(es) in {} file(s)",
            if opts.common.no_write { "DRY-RUN: " } else { "" },
            total,
            reports.len()
        );
    }
    Ok(())
}

fn compile_rules(opts: &ReplaceOptions, vars: &HashMap<String, String>) -> ExecutionResult<Vec<Rule>> {
    let mut rules = Vec::new();
    for rule in &opts.patterns {
        let regex = Regex::new(&rule.pattern).map_err(|e| {
            ExecutionError::Replace(format!("invalid pattern '{}': {}", rule.pattern, e))
        })?;
        rules.push(Rule {
            regex,
            replacement: template::expand(&rule.replacement, vars),
        });
    }

    let mut builtin = |token: &str, field: &str| -> ExecutionResult<()> {
        let regex = Regex::new(&regex::escape(token))
            .map_err(|e| ExecutionError::Replace(e.to_string()))?;
        rules.push(Rule {
            regex,
            replacement: vars.get(field).cloned().unwrap_or_default(),
        });
        Ok(())
    };
    if opts.set_timestamp {
        builtin(TIMESTAMP_TOKEN, "timestamp")?;
    }
    if opts.set_version {
        builtin(VERSION_TOKEN, "version")?;
    }
    Ok(rules)
}

fn apply_rules(content: &str, rules: &[Rule]) -> (String, usize) {
    let mut text = content.to_string();
    let mut matches = 0;
    for rule in rules {
        let count = rule.regex.find_iter(&text).count();
        if count > 0 {
            matches += count;
            // NoExpand keeps `$` in versions and messages literal
            text = rule
                .regex
                .replace_all(&text, regex::NoExpand(&rule.replacement))
                .into_owned();
        }
    }
    (text, matches)
}

/// Expand file patterns relative to `base`
///
/// Patterns starting with `!` remove matches of earlier patterns.
pub fn expand_files(base: &Path, patterns: &[String]) -> ExecutionResult<Vec<PathBuf>> {
    let (excludes, includes): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| p.starts_with('!'));

    let mut builder = GlobSetBuilder::new();
    for pattern in &excludes {
        let glob = Glob::new(&pattern[1..]).map_err(|e| {
            ExecutionError::Replace(format!("invalid pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    let excluded: GlobSet = builder
        .build()
        .map_err(|e| ExecutionError::Replace(e.to_string()))?;

    let mut files = Vec::new();
    for pattern in includes {
        let full = base.join(pattern);
        let entries = glob::glob(&full.to_string_lossy()).map_err(|e| {
            ExecutionError::Replace(format!("invalid pattern '{}': {}", pattern, e))
        })?;
        for path in entries.flatten() {
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(base).unwrap_or(&path);
            if excluded.is_match(relative) || files.contains(&path) {
                continue;
            }
            files.push(path);
        }
    }
    Ok(files)
}
