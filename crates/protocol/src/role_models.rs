//! Role models for `.promptline/roles/*.md`.
//!
//! A role is the persona a pipeline step is executed as. Roles are defined
//! as Markdown files with YAML front matter.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Optional abilities a role can be granted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// The role may read the visible text of web pages referenced by URL in
    /// its step description.
    FetchPage,
}

/// A named persona with a fixed instruction template.
///
/// The front matter carries the metadata and the goal; the Markdown body is
/// the backstory. Both may contain `{placeholder}` variables that are filled
/// in from run inputs and pipeline constants.
///
/// # Example
///
/// ```markdown
/// ---
/// name: joke-judge
/// title: Joke Judge
/// goal: Rate jokes on a scale of 1-10 with constructive feedback
/// color: magenta
/// ---
///
/// You are an experienced comedy critic who has judged comedy shows for decades.
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RoleSpec {
    /// Unique identifier, referenced by pipeline steps.
    pub name: String,

    /// Human-readable persona name used in the instructions.
    ///
    /// Falls back to `name` when empty.
    #[serde(default)]
    pub title: String,

    /// What the role is trying to achieve.
    pub goal: String,

    /// Optional abilities (e.g. `fetch-page`).
    #[serde(default)]
    pub capabilities: Vec<Capability>,

    /// UI color hint.
    #[serde(default)]
    pub color: String,

    /// Markdown body of the role file, not part of the front matter.
    #[serde(skip)]
    pub backstory: String,
}

impl RoleSpec {
    /// Whether this role has been granted `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Display name of the persona.
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            self.title.trim()
        }
    }

    /// The unrendered instruction template: persona, goal and backstory.
    pub fn instructions_template(&self) -> String {
        let mut text = format!(
            "You are the {}.\nYour goal: {}",
            self.display_name(),
            self.goal.trim()
        );
        let backstory = self.backstory.trim();
        if !backstory.is_empty() {
            text.push_str("\n\n");
            text.push_str(backstory);
        }
        text
    }
}
