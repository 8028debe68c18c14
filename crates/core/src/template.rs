//! `{placeholder}` substitution for role instructions and step descriptions.
//!
//! Placeholders are `{identifier}` where the identifier starts with a letter
//! or underscore and continues with letters, digits, `_` or `-`. `{{` and `}}`
//! produce literal braces. Any other brace is left untouched, so JSON-ish
//! snippets in a description survive rendering.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

#[allow(clippy::unwrap_used)]
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_-]*)\}").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("missing value for template variable '{0}'")]
    MissingVariable(String),
}

/// Names referenced by `template`, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in TOKEN.captures_iter(template) {
        if let Some(name) = caps.get(1) {
            if !names.iter().any(|n| n == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

/// Substitute every placeholder in `template` with its value from `params`.
pub fn render(template: &str, params: &IndexMap<String, String>) -> Result<String, TemplateError> {
    let mut missing = None;
    let rendered = TOKEN.replace_all(template, |caps: &Captures<'_>| match caps.get(1) {
        Some(name) => match params.get(name.as_str()) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| name.as_str().to_string());
                String::new()
            }
        },
        None if &caps[0] == "{{" => "{".to_string(),
        None => "}".to_string(),
    });

    match missing {
        Some(name) => Err(TemplateError::MissingVariable(name)),
        None => Ok(rendered.into_owned()),
    }
}
