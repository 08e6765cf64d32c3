//! Semantic version parsing and increment rules

use crate::error::{ConfigError, ConfigResult};
use semver::{Prerelease, Version};
use std::fmt;
use std::str::FromStr;

/// How a bump step changes the master version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpMode {
    Major,
    Minor,
    Patch,
    Premajor,
    Preminor,
    Prepatch,
    Prerelease,
    /// Keep the version, only synchronize manifests
    Zero,
}

impl BumpMode {
    pub const ALL: [BumpMode; 8] = [
        BumpMode::Major,
        BumpMode::Minor,
        BumpMode::Patch,
        BumpMode::Premajor,
        BumpMode::Preminor,
        BumpMode::Prepatch,
        BumpMode::Prerelease,
        BumpMode::Zero,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BumpMode::Major => "major",
            BumpMode::Minor => "minor",
            BumpMode::Patch => "patch",
            BumpMode::Premajor => "premajor",
            BumpMode::Preminor => "preminor",
            BumpMode::Prepatch => "prepatch",
            BumpMode::Prerelease => "prerelease",
            BumpMode::Zero => "zero",
        }
    }

    pub fn known_list() -> String {
        BumpMode::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Apply this mode to a version
    ///
    /// Follows the npm increment rules: releasing a prerelease of the same
    /// level drops the prerelease instead of incrementing again.
    pub fn apply(&self, version: &Version, preid: Option<&str>) -> Version {
        let mut next = version.clone();
        next.build = semver::BuildMetadata::EMPTY;
        let is_pre = !version.pre.is_empty();

        match self {
            BumpMode::Zero => return version.clone(),
            BumpMode::Major => {
                if !(is_pre && version.minor == 0 && version.patch == 0) {
                    next.major += 1;
                }
                next.minor = 0;
                next.patch = 0;
                next.pre = Prerelease::EMPTY;
            }
            BumpMode::Minor => {
                if !(is_pre && version.patch == 0) {
                    next.minor += 1;
                }
                next.patch = 0;
                next.pre = Prerelease::EMPTY;
            }
            BumpMode::Patch => {
                if !is_pre {
                    next.patch += 1;
                }
                next.pre = Prerelease::EMPTY;
            }
            BumpMode::Premajor => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
                next.pre = first_prerelease(preid);
            }
            BumpMode::Preminor => {
                next.minor += 1;
                next.patch = 0;
                next.pre = first_prerelease(preid);
            }
            BumpMode::Prepatch => {
                next.patch += 1;
                next.pre = first_prerelease(preid);
            }
            BumpMode::Prerelease => {
                if is_pre {
                    next.pre = next_prerelease(&version.pre, preid);
                } else {
                    next.patch += 1;
                    next.pre = first_prerelease(preid);
                }
            }
        }
        next
    }
}

impl FromStr for BumpMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        BumpMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidBumpMode {
                mode: s.to_string(),
                expected: BumpMode::known_list(),
            })
    }
}

impl fmt::Display for BumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a version, tolerating a leading `v` or `=`
pub fn parse_version(text: &str) -> Option<Version> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('='))
        .unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

fn prerelease(text: &str) -> Prerelease {
    Prerelease::new(text).unwrap_or(Prerelease::EMPTY)
}

fn first_prerelease(preid: Option<&str>) -> Prerelease {
    match preid {
        Some(id) if !id.is_empty() => prerelease(&format!("{}.0", id)),
        _ => prerelease("0"),
    }
}

fn next_prerelease(current: &Prerelease, preid: Option<&str>) -> Prerelease {
    let mut parts: Vec<String> = current.as_str().split('.').map(String::from).collect();

    if let Some(id) = preid.filter(|id| !id.is_empty()) {
        if parts.first().map(String::as_str) != Some(id) {
            return first_prerelease(Some(id));
        }
    }

    match parts.iter().rposition(|p| p.parse::<u64>().is_ok()) {
        Some(idx) => {
            let n: u64 = parts[idx].parse().unwrap_or(0);
            parts[idx] = (n + 1).to_string();
        }
        None => parts.push("0".to_string()),
    }
    prerelease(&parts.join("."))
}
