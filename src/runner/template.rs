//! Message templates
//!
//! Templates use `{%= name %}` placeholders, a syntax no shell or YAML tool
//! expands on its own. Unknown names are left in place verbatim.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%=\s*([A-Za-z_][A-Za-z0-9_]*)\s*%\}").unwrap())
}

/// Expand `{%= name %}` placeholders from `vars`
///
/// Expansion is single pass: values are never re-expanded.
pub fn expand(template: &str, vars: &HashMap<String, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                tracing::debug!("Unknown template field '{}'", &caps[1]);
                caps[0].to_string()
            }
        })
        .into_owned()
}
