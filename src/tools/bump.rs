//! `bump`: increment the master version and synchronize secondary manifests
//!
//! All manifests are updated in memory first; nothing is written until
//! every manifest has been validated.

use crate::config::{BumpOptions, ConfigSink, ResolvedOptions};
use crate::error::{ConfigError, ExecutionError, Result};
use crate::runner::manifest::{manifest_version, write_manifest};
use crate::runner::{parse_version, BumpMode, Context};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub fn run(opts: &ResolvedOptions<BumpOptions>, ctx: &mut Context) -> Result<()> {
    let bump = &opts.tool;
    if bump.sync_fields.iter().any(|f| f == "version") {
        return Err(ConfigError::SyncVersionField.into());
    }
    let mode = bump_mode(bump, ctx)?;
    let preid = bump.preid.as_deref();

    let paths: Vec<PathBuf> = opts
        .common
        .manifests
        .iter()
        .map(|m| ctx.resolve_path(m))
        .collect();
    let (master_path, secondary_paths) = paths
        .split_first()
        .ok_or_else(|| ExecutionError::MissingValue("manifests".to_string()))?;

    let mut master = ctx.manifests.get(master_path, false)?.clone();
    let orig = checked_version(master_path, &master)?
        .ok_or_else(|| ConfigError::InvalidVersion {
            path: master_path.clone(),
            version: String::new(),
        })?;
    let next = mode.apply(&orig, preid);
    set_version(&mut master, &next.to_string());
    tracing::info!(
        "Bumping version in {} from {} to {} ({})",
        master_path.display(),
        orig,
        next,
        mode
    );

    let mut updated = vec![(master_path.clone(), master.clone())];
    for path in secondary_paths {
        let mut manifest = ctx.manifests.get(path, false)?.clone();
        match checked_version(path, &manifest)? {
            None => ctx.warn(format!(
                "{} has no version; not bumping it",
                path.display()
            )),
            Some(current) => {
                let target = if bump.sync_version {
                    next.clone()
                } else {
                    mode.apply(&current, preid)
                };
                tracing::info!(
                    "Bumping version in {} from {} to {}",
                    path.display(),
                    current,
                    target
                );
                set_version(&mut manifest, &target.to_string());
            }
        }
        sync_fields(&master, &mut manifest, &bump.sync_fields, path);
        updated.push((path.clone(), manifest));
    }

    let version = next.to_string();
    if let Some(key) = &bump.update_config {
        ctx.config_store.update_version(key, &version)?;
        tracing::debug!("Set config.{}.version to {}", key, version);
    }

    for (path, manifest) in updated {
        if opts.common.no_write {
            tracing::info!("DRY-RUN: not writing {}", path.display());
        } else {
            write_manifest(&path, &manifest, bump.space)?;
        }
        ctx.manifests.insert(&path, manifest);
    }

    if ctx.orig_version.is_none() {
        ctx.orig_version = Some(orig.to_string());
    }
    ctx.version = Some(version);
    Ok(())
}

/// The increment mode from options, falling back to the command-line mode
fn bump_mode(opts: &BumpOptions, ctx: &Context) -> Result<BumpMode> {
    let mode = opts
        .inc
        .as_deref()
        .filter(|m| !m.is_empty())
        .or_else(|| ctx.mode())
        .ok_or_else(|| ConfigError::MissingBumpMode(BumpMode::known_list()))?;
    Ok(mode.parse::<BumpMode>()?)
}

/// Parse the manifest version; absent is fine, malformed is fatal
fn checked_version(path: &Path, manifest: &Value) -> Result<Option<semver::Version>> {
    match manifest_version(manifest) {
        None => Ok(None),
        Some(text) => parse_version(text).map(Some).ok_or_else(|| {
            ConfigError::InvalidVersion {
                path: path.to_path_buf(),
                version: text.to_string(),
            }
            .into()
        }),
    }
}

fn set_version(manifest: &mut Value, version: &str) {
    if let Value::Object(map) = manifest {
        map.insert("version".to_string(), Value::from(version));
    }
}

/// Copy `fields` from master into a secondary that already defines them
fn sync_fields(master: &Value, secondary: &mut Value, fields: &[String], path: &Path) {
    let Value::Object(target) = secondary else {
        return;
    };
    for field in fields {
        let (Some(source), Some(current)) = (master.get(field), target.get_mut(field)) else {
            continue;
        };
        if current != source {
            tracing::info!("Synchronized '{}' in {}", field, path.display());
            *current = source.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommonOptions, ConfigStore};
    use crate::error::TagflowError;
    use std::fs;
    use tempfile::TempDir;

    fn write(temp: &TempDir, name: &str, json: &str) {
        fs::write(temp.path().join(name), json).unwrap();
    }

    fn read(temp: &TempDir, name: &str) -> Value {
        serde_json::from_str(&fs::read_to_string(temp.path().join(name)).unwrap()).unwrap()
    }

    fn opts(manifests: &[&str], tool: BumpOptions, no_write: bool) -> ResolvedOptions<BumpOptions> {
        ResolvedOptions {
            step: "bump".to_string(),
            common: CommonOptions {
                enable: true,
                no_write,
                manifests: manifests.iter().map(|m| m.to_string()).collect(),
            },
            tool,
            merged: serde_yaml::Value::Null,
        }
    }

    fn ctx(temp: &TempDir, mode: &str) -> Context {
        Context::new()
            .with_working_dir(temp.path().to_path_buf())
            .with_invocation("release", vec![mode.to_string()])
    }

    #[test]
    fn test_bump_master_from_mode_argument() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"name":"demo","version":"1.2.3"}"#);
        let mut ctx = ctx(&temp, "minor");

        run(&opts(&["package.json"], BumpOptions::default(), false), &mut ctx).unwrap();

        assert_eq!(read(&temp, "package.json")["version"], "1.3.0");
        assert_eq!(ctx.version.as_deref(), Some("1.3.0"));
        assert_eq!(ctx.orig_version.as_deref(), Some("1.2.3"));
        let text = fs::read_to_string(temp.path().join("package.json")).unwrap();
        assert!(text.starts_with("{\n  \"name\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_inc_option_wins_over_argument() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);
        let mut ctx = ctx(&temp, "minor");
        let tool = BumpOptions {
            inc: Some("major".to_string()),
            ..Default::default()
        };
        run(&opts(&["package.json"], tool, false), &mut ctx).unwrap();
        assert_eq!(ctx.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_sync_secondaries() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.9.9","description":"new text"}"#);
        write(&temp, "bower.json", r#"{"version":"1.9.9","description":"old text"}"#);
        write(&temp, "extra.json", r#"{"name":"no version here"}"#);
        let mut ctx = ctx(&temp, "major");
        let tool = BumpOptions {
            sync_fields: vec!["description".to_string()],
            ..Default::default()
        };

        run(
            &opts(&["package.json", "bower.json", "extra.json"], tool, false),
            &mut ctx,
        )
        .unwrap();

        assert_eq!(read(&temp, "package.json")["version"], "2.0.0");
        let bower = read(&temp, "bower.json");
        assert_eq!(bower["version"], "2.0.0");
        assert_eq!(bower["description"], "new text");

        let extra = read(&temp, "extra.json");
        assert!(extra.get("version").is_none());
        assert!(extra.get("description").is_none());
        assert_eq!(ctx.warnings.len(), 1);
    }

    #[test]
    fn test_independent_secondary_increment() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);
        write(&temp, "plugin.json", r#"{"version":"0.4.0"}"#);
        let mut ctx = ctx(&temp, "patch");
        let tool = BumpOptions {
            sync_version: false,
            ..Default::default()
        };
        run(&opts(&["package.json", "plugin.json"], tool, false), &mut ctx).unwrap();
        assert_eq!(read(&temp, "plugin.json")["version"], "0.4.1");
    }

    #[test]
    fn test_no_write_keeps_disk_content() {
        let temp = TempDir::new().unwrap();
        let original = r#"{"version":"1.2.3"}"#;
        write(&temp, "package.json", original);
        let mut ctx = ctx(&temp, "patch");

        run(&opts(&["package.json"], BumpOptions::default(), true), &mut ctx).unwrap();

        assert_eq!(ctx.version.as_deref(), Some("1.2.4"));
        let on_disk = fs::read_to_string(temp.path().join("package.json")).unwrap();
        assert_eq!(on_disk, original);
    }

    #[test]
    fn test_zero_mode_keeps_version() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);
        let mut ctx = ctx(&temp, "zero");
        run(&opts(&["package.json"], BumpOptions::default(), false), &mut ctx).unwrap();
        assert_eq!(ctx.version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_sync_version_field_is_rejected() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);
        let mut ctx = ctx(&temp, "patch");
        let tool = BumpOptions {
            sync_fields: vec!["version".to_string()],
            ..Default::default()
        };
        let err = run(&opts(&["package.json"], tool, false), &mut ctx).unwrap_err();
        assert!(matches!(err, TagflowError::Config(ConfigError::SyncVersionField)));
    }

    #[test]
    fn test_missing_and_unknown_modes() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);

        let mut no_mode = Context::new().with_working_dir(temp.path().to_path_buf());
        let err = run(&opts(&["package.json"], BumpOptions::default(), false), &mut no_mode)
            .unwrap_err();
        assert!(matches!(err, TagflowError::Config(ConfigError::MissingBumpMode(_))));

        let mut bad_mode = ctx(&temp, "huge");
        let err = run(&opts(&["package.json"], BumpOptions::default(), false), &mut bad_mode)
            .unwrap_err();
        assert!(matches!(
            err,
            TagflowError::Config(ConfigError::InvalidBumpMode { .. })
        ));
    }

    #[test]
    fn test_invalid_secondary_version_writes_nothing() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);
        write(&temp, "bower.json", r#"{"version":"latest"}"#);
        let mut ctx = ctx(&temp, "patch");

        let err = run(
            &opts(&["package.json", "bower.json"], BumpOptions::default(), false),
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TagflowError::Config(ConfigError::InvalidVersion { .. })
        ));
        assert_eq!(read(&temp, "package.json")["version"], "1.2.3");
    }

    #[test]
    fn test_update_config_sink() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", r#"{"version":"1.2.3"}"#);
        let store = ConfigStore::new(serde_yaml::from_str("pkg:\n  version: 1.2.3\n").unwrap());
        let mut context = ctx(&temp, "patch").with_config_store(store);
        let tool = BumpOptions {
            update_config: Some("pkg".to_string()),
            ..Default::default()
        };
        run(&opts(&["package.json"], tool.clone(), false), &mut context).unwrap();
        assert_eq!(
            context.config_store.get("pkg.version").and_then(|v| v.as_str()),
            Some("1.2.4")
        );

        let mut missing = ctx(&temp, "patch");
        let err = run(&opts(&["package.json"], tool, false), &mut missing).unwrap_err();
        assert!(matches!(
            err,
            TagflowError::Config(ConfigError::MissingConfigEntry(_))
        ));
    }
}
