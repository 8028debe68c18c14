//! Pipeline configuration models for `.promptline/pipelines/*.yaml`.
//!
//! This module defines the structure of pipeline definition files that
//! chain role-bound prompt steps together.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// What an input holds. Decides how its value is normalized before a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    #[default]
    Text,
    /// A web page address. A bare host such as `acme.com` gets `https://`.
    Url,
}

/// A user-facing input field of a pipeline.
///
/// In YAML an input can be written as a bare name (a required field labelled
/// after its name) or as a full mapping:
///
/// ```yaml
/// inputs:
///   - url
///   - name: recipient
///     label: Recipient name
///     required: false
///     default: the CEO
/// ```
#[derive(Serialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct InputSpec {
    /// Template variable name.
    pub name: String,

    /// Label shown in the form. Defaults to the name.
    pub label: String,

    /// Whether a non-blank value must be supplied.
    pub required: bool,

    /// Value used when the input is left blank.
    pub default: Option<String>,

    /// Example value shown in an empty field.
    pub placeholder: Option<String>,

    /// What the value holds.
    pub kind: InputKind,
}

impl InputSpec {
    /// A required input labelled after its name.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            required: true,
            default: None,
            placeholder: None,
            kind: InputKind::Text,
        }
    }

    /// An optional input with no default.
    pub fn optional(name: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// The same input, holding a web address.
    pub fn url(self) -> Self {
        Self {
            kind: InputKind::Url,
            ..self
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInput {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default = "default_required")]
        required: bool,
        #[serde(default)]
        default: Option<String>,
        #[serde(default)]
        placeholder: Option<String>,
        #[serde(default)]
        kind: InputKind,
    },
}

fn default_required() -> bool {
    true
}

impl<'de> Deserialize<'de> for InputSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match RawInput::deserialize(deserializer)? {
            RawInput::Name(name) => Ok(InputSpec::required(&name)),
            RawInput::Full {
                name,
                label,
                required,
                default,
                placeholder,
                kind,
            } => Ok(InputSpec {
                label: label.unwrap_or_else(|| name.clone()),
                name,
                required,
                default,
                placeholder,
                kind,
            }),
        }
    }
}

/// One unit of work bound to exactly one role.
///
/// `context` lists the ids of the earlier steps whose artifacts are handed to
/// this step verbatim. A step with an empty context sees no earlier output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct StepSpec {
    /// Unique id within the pipeline.
    pub id: String,

    /// Name of the role executing this step.
    pub role: String,

    /// Description template; may reference inputs and pipeline vars.
    pub description: String,

    /// What the output should look like. Forwarded to the model as a hint,
    /// never enforced.
    #[serde(default)]
    pub expected_output: String,

    /// Ids of predecessor steps, in the order their output is presented.
    #[serde(default)]
    pub context: Vec<String>,
}

/// Enables the email delivery surface for a pipeline's final artifact.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct MailSpec {
    /// Subject used when the artifact carries no `Subject:` line.
    #[serde(default = "default_subject")]
    pub default_subject: String,
}

fn default_subject() -> String {
    "Message from promptline".to_string()
}

impl Default for MailSpec {
    fn default() -> Self {
        Self {
            default_subject: default_subject(),
        }
    }
}

/// Defines a full pipeline: its inputs, constants and ordered steps.
///
/// # Example
///
/// ```yaml
/// name: joke-teller
/// title: Joke Teller
/// description: A comedian writes a joke and a judge rates it.
/// inputs:
///   - name: joke_type
///     label: What type of jokes do you want to hear?
/// steps:
///   - id: joke
///     role: comedian
///     description: Create a hilarious {joke_type} joke.
///     expected-output: A funny joke of the requested type
///   - id: judge
///     role: joke-judge
///     description: Review the joke and rate it out of 10.
///     context: [joke]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineSpec {
    /// Unique name identifying this pipeline.
    pub name: String,

    /// Human-readable title. Defaults to the name.
    #[serde(default)]
    pub title: String,

    /// Short description shown in listings.
    #[serde(default)]
    pub description: String,

    /// Form inputs, in display order.
    #[serde(default)]
    pub inputs: Vec<InputSpec>,

    /// Names of optional inputs of which at least one must be filled in.
    #[serde(default)]
    pub at_least_one_of: Vec<String>,

    /// Pipeline-level constants available to every template.
    #[serde(default)]
    pub vars: IndexMap<String, String>,

    /// Model identifier override (e.g. `groq/llama-3.1-8b-instant`).
    #[serde(default)]
    pub model: Option<String>,

    /// Sampling temperature override.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Output length override.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Present when the final artifact may be sent by email.
    #[serde(default)]
    pub mail: Option<MailSpec>,

    /// Steps in execution order.
    pub steps: Vec<StepSpec>,
}

impl PipelineSpec {
    /// Title for display, falling back to the name.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&StepSpec> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Names of every role referenced by a step, in first-use order.
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !names.contains(&step.role.as_str()) {
                names.push(&step.role);
            }
        }
        names
    }
}
