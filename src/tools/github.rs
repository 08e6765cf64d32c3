//! `githubRelease`: create a release on GitHub
//!
//! The release is created through the REST API with basic auth. Credentials
//! come from environment variables named in the options, usually filled
//! from `.env`.

use crate::config::{GithubReleaseOptions, ResolvedOptions};
use crate::error::{ExecutionError, ExecutionResult, Result};
use crate::runner::manifest::manifest_version;
use crate::runner::{template, Context};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

/// Body of a create-release request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleasePayload {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

/// Minimal client for the releases endpoint
pub struct GithubClient {
    api_url: String,
    client: reqwest::blocking::Client,
}

impl GithubClient {
    pub fn new(api_url: &str) -> ExecutionResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tagflow/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExecutionError::Http(e.to_string()))?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a release; returns the response body on HTTP 201
    pub fn create_release(
        &self,
        repo: &str,
        credentials: &Credentials,
        payload: &ReleasePayload,
    ) -> ExecutionResult<String> {
        let url = format!("{}/repos/{}/releases", self.api_url, repo);
        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.username, Some(&credentials.token))
            .header("Accept", "application/vnd.github+json")
            .json(payload)
            .send()
            .map_err(|e| ExecutionError::Http(format!("POST {}: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ExecutionError::Http(e.to_string()))?;
        if status != 201 {
            return Err(ExecutionError::ReleaseFailed { status, body });
        }
        Ok(body)
    }
}

pub fn run(opts: &ResolvedOptions<GithubReleaseOptions>, ctx: &mut Context) -> Result<()> {
    release_with(opts, ctx, |name| env::var(name).ok())
}

/// Create the release, reading credential variables through `lookup`
fn release_with(
    opts: &ResolvedOptions<GithubReleaseOptions>,
    ctx: &mut Context,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let release = &opts.tool;

    let repo = match release.repo.as_deref().filter(|r| !r.is_empty()) {
        Some(repo) => repo.to_string(),
        None => repo_from_manifest(opts, ctx)?,
    };
    ctx.repo = Some(repo.clone());

    if ctx.version.as_deref().unwrap_or_default().is_empty() {
        return Err(ExecutionError::MissingValue("version".to_string()).into());
    }
    let vars = ctx.template_vars();
    let payload = ReleasePayload {
        tag_name: template::expand(&release.tag_name, &vars),
        name: template::expand(&release.name, &vars),
        body: template::expand(&release.body, &vars),
        draft: release.draft,
        prerelease: release.prerelease,
    };
    if payload.tag_name.is_empty() {
        return Err(ExecutionError::MissingValue(
            "tag name (run a tag step first or set tagName)".to_string(),
        )
        .into());
    }

    let creds = credentials(release, lookup);

    if opts.common.no_write {
        if creds.is_err() {
            ctx.warn(format!(
                "{} / {} not set; a real run would fail",
                release.auth.username_var, release.auth.password_var
            ));
        }
        tracing::info!(
            "DRY-RUN: would create release on {}: {}",
            repo,
            serde_json::to_string(&payload)?
        );
        return Ok(());
    }

    let creds = creds?;
    let client = GithubClient::new(&release.api_url)?;
    client.create_release(&repo, &creds, &payload)?;
    tracing::info!("Created release {} on {}", payload.name, repo);
    Ok(())
}

/// Read credentials through `lookup`, typically the process environment
fn credentials(
    opts: &GithubReleaseOptions,
    lookup: impl Fn(&str) -> Option<String>,
) -> ExecutionResult<Credentials> {
    let get = |name: &str| {
        lookup(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ExecutionError::Environment(format!("{} is not set", name)))
    };
    Ok(Credentials {
        username: get(&opts.auth.username_var)?,
        token: get(&opts.auth.password_var)?,
    })
}

fn repo_from_manifest(
    opts: &ResolvedOptions<GithubReleaseOptions>,
    ctx: &mut Context,
) -> Result<String> {
    let manifest = opts
        .common
        .manifests
        .first()
        .ok_or_else(|| ExecutionError::MissingValue("manifests".to_string()))?;
    let path = ctx.resolve_path(manifest);
    let manifest = ctx.manifests.get(&path, false)?;
    tracing::debug!(
        "Reading repository from {} (version {:?})",
        path.display(),
        manifest_version(manifest)
    );

    let url = match manifest.get("repository") {
        Some(Value::String(url)) => Some(url.as_str()),
        Some(Value::Object(repo)) => repo.get("url").and_then(Value::as_str),
        _ => None,
    };
    url.and_then(parse_github_repo).ok_or_else(|| {
        ExecutionError::MissingValue(format!(
            "GitHub repository (set repo or a github.com repository in {})",
            path.display()
        ))
        .into()
    })
}

/// Extract `owner/name` from a repository URL or shorthand
pub fn parse_github_repo(url: &str) -> Option<String> {
    static URL: OnceLock<Regex> = OnceLock::new();
    static SHORT: OnceLock<Regex> = OnceLock::new();
    let url_re = URL.get_or_init(|| {
        Regex::new(r"github\.com[:/]([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").unwrap()
    });
    let short_re =
        SHORT.get_or_init(|| Regex::new(r"^(?:github:)?([\w.-]+)/([\w.-]+)$").unwrap());

    let url = url.trim();
    url_re
        .captures(url)
        .or_else(|| short_re.captures(url))
        .map(|caps| format!("{}/{}", &caps[1], &caps[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommonOptions, GithubAuth};
    use crate::error::TagflowError;
    use httpmock::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolved(tool: GithubReleaseOptions, no_write: bool) -> ResolvedOptions<GithubReleaseOptions> {
        ResolvedOptions {
            step: "githubRelease".to_string(),
            common: CommonOptions {
                no_write,
                ..Default::default()
            },
            tool,
            merged: serde_yaml::Value::Null,
        }
    }

    fn ctx(temp: &TempDir) -> Context {
        fs::write(
            temp.path().join("package.json"),
            r#"{"version":"1.1.0","repository":{"type":"git","url":"git+https://github.com/acme/widget.git"}}"#,
        )
        .unwrap();
        let mut ctx = Context::new().with_working_dir(temp.path().to_path_buf());
        ctx.version = Some("1.1.0".to_string());
        ctx.current_tag_name = Some("v1.0.0".to_string());
        ctx.last_tag_name = Some("v1.1.0".to_string());
        ctx
    }

    fn auth(suffix: &str) -> GithubAuth {
        GithubAuth {
            username_var: format!("TAGFLOW_TEST_GH_USER_{}", suffix),
            password_var: format!("TAGFLOW_TEST_GH_TOKEN_{}", suffix),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_github_repo() {
        let cases = [
            ("https://github.com/acme/widget", "acme/widget"),
            ("git+https://github.com/acme/widget.git", "acme/widget"),
            ("git@github.com:acme/widget.git", "acme/widget"),
            ("github:acme/widget", "acme/widget"),
            ("acme/widget.js", "acme/widget.js"),
        ];
        for (url, expected) in cases {
            assert_eq!(parse_github_repo(url).as_deref(), Some(expected), "{}", url);
        }
        assert!(parse_github_repo("https://gitlab.com/acme/widget/tree/main").is_none());
    }

    #[test]
    fn test_credentials_lookup() {
        let opts = GithubReleaseOptions::default();
        let creds = credentials(&opts, |name| Some(format!("{}-value", name))).unwrap();
        assert_eq!(creds.username, "GITHUB_USERNAME-value");
        assert_eq!(creds.token, "GITHUB_TOKEN-value");

        let missing = credentials(&opts, |_| None);
        assert!(matches!(missing, Err(ExecutionError::Environment(_))));
    }

    #[test]
    fn test_dry_run_makes_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(201);
        });

        let temp = TempDir::new().unwrap();
        let mut ctx = ctx(&temp);
        let tool = GithubReleaseOptions {
            api_url: server.base_url(),
            auth: auth("DRY"),
            ..Default::default()
        };
        release_with(&resolved(tool, true), &mut ctx, no_env).unwrap();

        mock.assert_calls(0);
        assert_eq!(ctx.repo.as_deref(), Some("acme/widget"));
        assert_eq!(ctx.warnings.len(), 1);
    }

    #[test]
    fn test_creates_release() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widget/releases")
                .header_exists("authorization")
                .json_body(serde_json::json!({
                    "tag_name": "v1.1.0",
                    "name": "v1.1.0",
                    "body": "[Commit details](https://github.com/acme/widget/compare/v1.0.0...v1.1.0).",
                    "draft": false,
                    "prerelease": false
                }));
            then.status(201).body(r#"{"id": 1}"#);
        });

        let temp = TempDir::new().unwrap();
        let mut ctx = ctx(&temp);
        let auth = auth("OK");
        let (user_var, token_var) = (auth.username_var.clone(), auth.password_var.clone());
        let env = move |name: &str| {
            if name == user_var {
                Some("octocat".to_string())
            } else if name == token_var {
                Some("secret".to_string())
            } else {
                None
            }
        };
        let tool = GithubReleaseOptions {
            api_url: server.base_url(),
            auth,
            ..Default::default()
        };

        release_with(&resolved(tool, false), &mut ctx, env).unwrap();
        mock.assert();
    }

    #[test]
    fn test_non_201_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/repos/acme/widget/releases");
            then.status(422).body("already_exists");
        });

        let client = GithubClient::new(&server.base_url()).unwrap();
        let creds = Credentials {
            username: "u".to_string(),
            token: "t".to_string(),
        };
        let payload = ReleasePayload {
            tag_name: "v1.1.0".to_string(),
            name: "v1.1.0".to_string(),
            body: String::new(),
            draft: false,
            prerelease: false,
        };
        match client.create_release("acme/widget", &creds, &payload) {
            Err(ExecutionError::ReleaseFailed { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "already_exists");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_credentials_fail() {
        let temp = TempDir::new().unwrap();
        let mut ctx = ctx(&temp);
        let tool = GithubReleaseOptions {
            repo: Some("acme/widget".to_string()),
            auth: auth("MISSING"),
            ..Default::default()
        };
        let err = release_with(&resolved(tool, false), &mut ctx, no_env).unwrap_err();
        assert!(matches!(
            err,
            TagflowError::Execution(ExecutionError::Environment(_))
        ));
    }

    #[test]
    fn test_requires_tag_name() {
        let temp = TempDir::new().unwrap();
        let mut ctx = ctx(&temp);
        ctx.last_tag_name = None;
        let err = release_with(&resolved(GithubReleaseOptions::default(), true), &mut ctx, no_env)
            .unwrap_err();
        assert!(matches!(
            err,
            TagflowError::Execution(ExecutionError::MissingValue(_))
        ));
    }
}
