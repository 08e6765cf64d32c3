//! Per-tool option structs and the layered option resolver
//!
//! Step options come from five layers, merged in this order (later wins):
//! built-in defaults, global `options.common`, global `options.<tool>`,
//! the workflow's `common` block and finally the step's own block.

use crate::config::merge::merge_layers;
use crate::config::types::{deserialize_string_list, ToolType, Workflow, COMMON_KEY};
use crate::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Options shared by every tool
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonOptions {
    /// Disabled steps are logged and skipped
    pub enable: bool,

    /// Report external mutations instead of performing them
    pub no_write: bool,

    /// Version manifests; the first one is the master
    #[serde(deserialize_with = "deserialize_string_list")]
    pub manifests: Vec<String>,
}

impl Default for CommonOptions {
    fn default() -> Self {
        CommonOptions {
            enable: true,
            no_write: false,
            manifests: vec!["package.json".to_string()],
        }
    }
}

/// Version comparison operators for `check.cmpVersion`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum VersionCmp {
    #[serde(rename = ">", alias = "gt")]
    Gt,
    #[serde(rename = ">=", alias = "gte")]
    Gte,
    #[serde(rename = "<", alias = "lt")]
    Lt,
    #[serde(rename = "<=", alias = "lte")]
    Lte,
    #[serde(rename = "==", alias = "eq")]
    Eq,
    #[serde(rename = "!=", alias = "neq")]
    Neq,
}

impl VersionCmp {
    pub fn symbol(&self) -> &'static str {
        match self {
            VersionCmp::Gt => ">",
            VersionCmp::Gte => ">=",
            VersionCmp::Lt => "<",
            VersionCmp::Lte => "<=",
            VersionCmp::Eq => "==",
            VersionCmp::Neq => "!=",
        }
    }

    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            VersionCmp::Gt => ordering == Greater,
            VersionCmp::Gte => ordering != Less,
            VersionCmp::Lt => ordering == Less,
            VersionCmp::Lte => ordering != Greater,
            VersionCmp::Eq => ordering == Equal,
            VersionCmp::Neq => ordering != Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckOptions {
    /// Allowed branch names (empty list disables the check)
    #[serde(deserialize_with = "deserialize_string_list")]
    pub branch: Vec<String>,

    /// Expected worktree state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,

    /// Expected outcome of `git push --dry-run`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_push: Option<bool>,

    /// Compare the current version against the latest tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmp_version: Option<VersionCmp>,

    /// Bump modes this workflow may be invoked with
    #[serde(deserialize_with = "deserialize_string_list")]
    pub allowed_modes: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            branch: vec!["main".to_string(), "master".to_string()],
            clean: None,
            can_push: None,
            cmp_version: None,
            allowed_modes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReplaceRule {
    /// Regular expression to search for
    #[serde(rename = "match")]
    pub pattern: String,

    /// Replacement template
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplaceOptions {
    /// Glob patterns; a leading `!` excludes matches
    #[serde(deserialize_with = "deserialize_string_list")]
    pub files: Vec<String>,

    pub patterns: Vec<ReplaceRule>,

    /// Replace the literal `@@timestamp` token
    pub set_timestamp: bool,

    /// Replace the literal `@@version` token
    pub set_version: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        ReplaceOptions {
            files: Vec::new(),
            patterns: Vec::new(),
            set_timestamp: true,
            set_version: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BumpOptions {
    /// Increment mode; falls back to the first command-line argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inc: Option<String>,

    /// Prerelease identifier for the `pre*` modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preid: Option<String>,

    /// Copy the master version into secondary manifests
    pub sync_version: bool,

    /// Fields copied from master into secondaries that define them
    #[serde(deserialize_with = "deserialize_string_list")]
    pub sync_fields: Vec<String>,

    /// JSON indent width
    pub space: usize,

    /// Config entry whose `version` is updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_config: Option<String>,
}

impl Default for BumpOptions {
    fn default() -> Self {
        BumpOptions {
            inc: None,
            preid: None,
            sync_version: true,
            sync_fields: Vec::new(),
            space: 2,
            update_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunOptions {
    #[serde(deserialize_with = "deserialize_string_list")]
    pub tasks: Vec<String>,

    /// Task runner program, given every task name in one invocation
    pub runner: String,

    pub silent: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            tasks: Vec::new(),
            runner: "make".to_string(),
            silent: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecOptions {
    pub cmd: String,
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommitOptions {
    /// Paths staged before committing
    #[serde(deserialize_with = "deserialize_string_list")]
    pub add: Vec<String>,

    /// Commit every tracked modified file (`git commit -a`)
    pub add_known: bool,

    pub message: String,
}

impl Default for CommitOptions {
    fn default() -> Self {
        CommitOptions {
            add: Vec::new(),
            add_known: true,
            message: "Bump version to {%= version %}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagOptions {
    pub name: String,
    pub message: String,
}

impl Default for TagOptions {
    fn default() -> Self {
        TagOptions {
            name: "v{%= version %}".to_string(),
            message: "Version {%= version %}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushOptions {
    /// Remote name; empty means git's configured default
    pub target: String,

    /// Also push tags
    pub tags: bool,

    /// Push commits and tags together with `--follow-tags`
    pub use_follow_tags: bool,
}

impl Default for PushOptions {
    fn default() -> Self {
        PushOptions {
            target: "origin".to_string(),
            tags: true,
            use_follow_tags: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NpmPublishOptions {
    pub message: String,

    /// Registry dist-tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Default for NpmPublishOptions {
    fn default() -> Self {
        NpmPublishOptions {
            message: "Released {%= version %}".to_string(),
            tag: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GithubAuth {
    pub username_var: String,
    pub password_var: String,
}

impl Default for GithubAuth {
    fn default() -> Self {
        GithubAuth {
            username_var: "GITHUB_USERNAME".to_string(),
            password_var: "GITHUB_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GithubReleaseOptions {
    /// `owner/name`; derived from the master manifest when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    pub api_url: String,
    pub auth: GithubAuth,
}

impl Default for GithubReleaseOptions {
    fn default() -> Self {
        GithubReleaseOptions {
            repo: None,
            tag_name: "{%= lastTagName %}".to_string(),
            name: "v{%= version %}".to_string(),
            body: "[Commit details](https://github.com/{%= repo %}/compare/{%= currentTagName %}...{%= lastTagName %})."
                .to_string(),
            draft: false,
            prerelease: false,
            api_url: "https://api.github.com".to_string(),
            auth: GithubAuth::default(),
        }
    }
}

/// Options for one step after all layers were merged
#[derive(Debug, Clone)]
pub struct ResolvedOptions<T> {
    /// Step name, e.g. `bump_develop`
    pub step: String,
    pub common: CommonOptions,
    pub tool: T,
    /// The merged option tree both structs were read from
    pub merged: Value,
}

impl<T: DeserializeOwned> ResolvedOptions<T> {
    /// Read typed options out of a merged option tree
    pub fn from_value(step: &str, merged: Value) -> ConfigResult<Self> {
        let invalid = |e: serde_yaml::Error| ConfigError::InvalidOptions {
            step: step.to_string(),
            error: e.to_string(),
        };
        let common: CommonOptions = serde_yaml::from_value(merged.clone()).map_err(invalid)?;
        let tool: T = serde_yaml::from_value(merged.clone()).map_err(invalid)?;
        Ok(ResolvedOptions {
            step: step.to_string(),
            common,
            tool,
            merged,
        })
    }
}

fn to_layer<T: Serialize>(value: &T) -> ConfigResult<Value> {
    serde_yaml::to_value(value).map_err(|e| ConfigError::Invalid(e.to_string()))
}

/// Built-in defaults for a tool type, including the common options
pub fn defaults_for(tool: ToolType) -> ConfigResult<Value> {
    let specific = match tool {
        ToolType::Check => to_layer(&CheckOptions::default())?,
        ToolType::Replace => to_layer(&ReplaceOptions::default())?,
        ToolType::Bump => to_layer(&BumpOptions::default())?,
        ToolType::Run => to_layer(&RunOptions::default())?,
        ToolType::Exec => to_layer(&ExecOptions::default())?,
        ToolType::Commit => to_layer(&CommitOptions::default())?,
        ToolType::Tag => to_layer(&TagOptions::default())?,
        ToolType::Push => to_layer(&PushOptions::default())?,
        ToolType::NpmPublish => to_layer(&NpmPublishOptions::default())?,
        ToolType::GithubRelease => to_layer(&GithubReleaseOptions::default())?,
    };
    let common = to_layer(&CommonOptions::default())?;
    Ok(merge_layers([&common, &specific]))
}

/// Merge every option layer for one step
///
/// Pure function of its inputs. When `force_no_write` is set the merged
/// `noWrite` is always true.
pub fn resolve(
    tool: ToolType,
    step_name: &str,
    workflow: &Workflow<'_>,
    global: &IndexMap<String, Value>,
    force_no_write: bool,
) -> ConfigResult<Value> {
    let null = Value::Null;
    let defaults = defaults_for(tool)?;
    let layers = [
        &defaults,
        global.get(COMMON_KEY).unwrap_or(&null),
        global.get(tool.as_str()).unwrap_or(&null),
        workflow.common().unwrap_or(&null),
        workflow.step(step_name).unwrap_or(&null),
    ];

    let mut merged = merge_layers(layers);
    if force_no_write {
        if let Value::Mapping(map) = &mut merged {
            map.insert(Value::from("noWrite"), Value::Bool(true));
        }
    }
    Ok(merged)
}

/// Resolve and read typed options for one step
pub fn resolve_typed<T: DeserializeOwned>(
    tool: ToolType,
    step_name: &str,
    workflow: &Workflow<'_>,
    global: &IndexMap<String, Value>,
    force_no_write: bool,
) -> ConfigResult<ResolvedOptions<T>> {
    let merged = resolve(tool, step_name, workflow, global, force_no_write)?;
    ResolvedOptions::from_value(step_name, merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;

    fn config(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    const LAYERED: &str = r#"
options:
  common:
    manifests: [global.json]
  bump:
    space: 4
    syncFields: [description]
workflows:
  release:
    common:
      manifests: [package.json, bower.json]
      noWrite: false
    bump:
      syncFields: keywords
    bump_develop:
      inc: prepatch
"#;

    #[test]
    fn test_defaults_apply_when_no_layers() {
        let cfg = config("workflows:\n  w:\n    tag: {}\n");
        let wf = cfg.workflow("w").unwrap();
        let opts: ResolvedOptions<TagOptions> =
            resolve_typed(ToolType::Tag, "tag", &wf, &cfg.options, false).unwrap();
        assert_eq!(opts.tool, TagOptions::default());
        assert_eq!(opts.common, CommonOptions::default());
    }

    #[test]
    fn test_later_layers_win() {
        let cfg = config(LAYERED);
        let wf = cfg.workflow("release").unwrap();
        let opts: ResolvedOptions<BumpOptions> =
            resolve_typed(ToolType::Bump, "bump", &wf, &cfg.options, false).unwrap();

        // global type layer
        assert_eq!(opts.tool.space, 4);
        // step layer replaces the global array, and a scalar became a list
        assert_eq!(opts.tool.sync_fields, vec!["keywords"]);
        // workflow common beats global common
        assert_eq!(opts.common.manifests, vec!["package.json", "bower.json"]);
        // untouched default
        assert!(opts.tool.sync_version);
    }

    #[test]
    fn test_suffixed_step_uses_its_own_block() {
        let cfg = config(LAYERED);
        let wf = cfg.workflow("release").unwrap();
        let opts: ResolvedOptions<BumpOptions> =
            resolve_typed(ToolType::Bump, "bump_develop", &wf, &cfg.options, false).unwrap();

        assert_eq!(opts.tool.inc.as_deref(), Some("prepatch"));
        assert_eq!(opts.tool.sync_fields, vec!["description"]);
        assert_eq!(opts.step, "bump_develop");
    }

    #[test]
    fn test_merged_tree_equals_layer_fold() {
        let cfg = config(LAYERED);
        let wf = cfg.workflow("release").unwrap();
        let merged = resolve(ToolType::Bump, "bump", &wf, &cfg.options, false).unwrap();

        let expected = merge_layers([
            &defaults_for(ToolType::Bump).unwrap(),
            &cfg.options["common"],
            &cfg.options["bump"],
            wf.common().unwrap(),
            wf.step("bump").unwrap(),
        ]);
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_force_no_write_overrides_config() {
        let cfg = config(LAYERED);
        let wf = cfg.workflow("release").unwrap();
        let opts: ResolvedOptions<BumpOptions> =
            resolve_typed(ToolType::Bump, "bump", &wf, &cfg.options, true).unwrap();
        assert!(opts.common.no_write);
    }

    #[test]
    fn test_scalar_lists_are_normalized() {
        let cfg = config(
            r#"
workflows:
  w:
    check:
      branch: develop
    commit:
      add: CHANGELOG.md
"#,
        );
        let wf = cfg.workflow("w").unwrap();
        let check: ResolvedOptions<CheckOptions> =
            resolve_typed(ToolType::Check, "check", &wf, &cfg.options, false).unwrap();
        let commit: ResolvedOptions<CommitOptions> =
            resolve_typed(ToolType::Commit, "commit", &wf, &cfg.options, false).unwrap();

        assert_eq!(check.tool.branch, vec!["develop"]);
        assert_eq!(commit.tool.add, vec!["CHANGELOG.md"]);
    }

    #[test]
    fn test_nested_auth_merges_key_by_key() {
        let cfg = config(
            r#"
options:
  githubRelease:
    auth:
      usernameVar: CI_USER
workflows:
  w:
    githubRelease:
      draft: true
"#,
        );
        let wf = cfg.workflow("w").unwrap();
        let opts: ResolvedOptions<GithubReleaseOptions> = resolve_typed(
            ToolType::GithubRelease,
            "githubRelease",
            &wf,
            &cfg.options,
            false,
        )
        .unwrap();

        assert_eq!(opts.tool.auth.username_var, "CI_USER");
        assert_eq!(opts.tool.auth.password_var, "GITHUB_TOKEN");
        assert!(opts.tool.draft);
    }

    #[test]
    fn test_cmp_version_symbols_and_aliases() {
        let cfg = config("workflows:\n  w:\n    check:\n      cmpVersion: gte\n    check_2:\n      cmpVersion: '!='\n");
        let wf = cfg.workflow("w").unwrap();
        let a: ResolvedOptions<CheckOptions> =
            resolve_typed(ToolType::Check, "check", &wf, &cfg.options, false).unwrap();
        let b: ResolvedOptions<CheckOptions> =
            resolve_typed(ToolType::Check, "check_2", &wf, &cfg.options, false).unwrap();
        assert_eq!(a.tool.cmp_version, Some(VersionCmp::Gte));
        assert_eq!(b.tool.cmp_version, Some(VersionCmp::Neq));
    }

    #[test]
    fn test_invalid_option_type_is_reported() {
        let cfg = config("workflows:\n  w:\n    bump:\n      space: lots\n");
        let wf = cfg.workflow("w").unwrap();
        let result: ConfigResult<ResolvedOptions<BumpOptions>> =
            resolve_typed(ToolType::Bump, "bump", &wf, &cfg.options, false);
        assert!(matches!(result, Err(ConfigError::InvalidOptions { .. })));
    }

    #[test]
    fn test_null_in_step_unsets_global_value() {
        let cfg = config(
            r#"
options:
  check:
    clean: true
workflows:
  w:
    check:
      clean: ~
"#,
        );
        let wf = cfg.workflow("w").unwrap();
        let opts: ResolvedOptions<CheckOptions> =
            resolve_typed(ToolType::Check, "check", &wf, &cfg.options, false).unwrap();
        assert_eq!(opts.tool.clean, None);
    }
}
