//! Pre-flight checks of a run.
//!
//! Everything that can be known before the first completion call is checked
//! here: pipeline structure, role references, required inputs and template
//! variables. A `PreparedRun` holds the fully rendered role instructions and
//! step descriptions, so execution itself cannot fail on a template.

use crate::error::PipelineError;
use crate::template::{self, TemplateError};
use pl_protocol::pipeline_models::{InputKind, PipelineSpec, StepSpec};
use pl_protocol::role_models::RoleSpec;
use pl_protocol::run_models::Parameters;
use std::collections::HashSet;

/// A step with its templates rendered.
#[derive(Debug, Clone)]
pub struct PreparedStep<'a> {
    pub spec: &'a StepSpec,
    pub role: &'a RoleSpec,
    pub instructions: String,
    pub description: String,
}

/// A validated run, ready to execute.
#[derive(Debug, Clone)]
pub struct PreparedRun<'a> {
    pub steps: Vec<PreparedStep<'a>>,
}

/// Check `pipeline` against `roles` and `inputs` and render every template.
///
/// # Errors
///
/// - `InvalidPipeline`: no steps, duplicate step ids, unknown role, context
///   naming an unknown, later or repeated step, or `at-least-one-of` naming
///   an undeclared input.
/// - `Validation`: a required input is missing or blank, none of the
///   `at-least-one-of` inputs is filled in, a URL input is not a web
///   address, or a template references a variable that is neither an input
///   nor a pipeline var.
pub fn prepare<'a>(
    pipeline: &'a PipelineSpec,
    roles: &'a [RoleSpec],
    inputs: &Parameters,
) -> Result<PreparedRun<'a>, PipelineError> {
    check_structure(pipeline)?;

    let resolved_roles = pipeline
        .steps
        .iter()
        .map(|step| {
            roles.iter().find(|r| r.name == step.role).ok_or_else(|| {
                PipelineError::invalid(
                    &pipeline.name,
                    format!("step '{}' uses unknown role '{}'", step.id, step.role),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let inputs = resolve_inputs(pipeline, inputs)?;
    let mut params = pipeline.vars.clone();
    for (name, value) in &inputs {
        params.insert(name.clone(), value.clone());
    }

    let render = |template: &str, what: &str| {
        template::render(template, &params).map_err(|TemplateError::MissingVariable(name)| {
            PipelineError::Validation(format!(
                "{what} references '{{{name}}}', which is neither an input nor a pipeline variable"
            ))
        })
    };

    let mut steps = Vec::with_capacity(pipeline.steps.len());
    for (spec, role) in pipeline.steps.iter().zip(resolved_roles) {
        let instructions = render(
            &role.instructions_template(),
            &format!("role '{}'", role.name),
        )?;
        let description = render(&spec.description, &format!("step '{}'", spec.id))?;
        steps.push(PreparedStep {
            spec,
            role,
            instructions,
            description,
        });
    }

    Ok(PreparedRun { steps })
}

fn check_structure(pipeline: &PipelineSpec) -> Result<(), PipelineError> {
    let invalid = |reason: String| PipelineError::invalid(&pipeline.name, reason);

    if pipeline.steps.is_empty() {
        return Err(invalid("pipeline has no steps".to_string()));
    }

    let mut earlier: HashSet<&str> = HashSet::new();
    for step in &pipeline.steps {
        if step.id.trim().is_empty() {
            return Err(invalid("a step has an empty id".to_string()));
        }

        let mut seen_context: HashSet<&str> = HashSet::new();
        for dep in &step.context {
            if !seen_context.insert(dep) {
                return Err(invalid(format!(
                    "step '{}' lists '{dep}' in its context twice",
                    step.id
                )));
            }
            if earlier.contains(dep.as_str()) {
                continue;
            }
            return Err(invalid(if pipeline.step(dep).is_some() {
                format!(
                    "step '{}' uses '{dep}' as context, but '{dep}' does not run before it",
                    step.id
                )
            } else {
                format!("step '{}' uses unknown step '{dep}' as context", step.id)
            }));
        }

        if !earlier.insert(&step.id) {
            return Err(invalid(format!("duplicate step id '{}'", step.id)));
        }
    }

    for name in &pipeline.at_least_one_of {
        if !pipeline.inputs.iter().any(|input| &input.name == name) {
            return Err(invalid(format!(
                "at-least-one-of names '{name}', which is not an input"
            )));
        }
    }
    Ok(())
}

/// Apply defaults, enforce required inputs and normalize URL inputs.
/// Undeclared inputs pass through.
fn resolve_inputs(pipeline: &PipelineSpec, given: &Parameters) -> Result<Parameters, PipelineError> {
    let mut resolved = Parameters::new();

    for input in &pipeline.inputs {
        let value = given
            .get(&input.name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());

        let value = match (value, &input.default) {
            (Some(value), _) => value.to_string(),
            (None, Some(default)) => default.clone(),
            (None, None) if input.required => {
                return Err(PipelineError::Validation(format!(
                    "'{}' is required",
                    input.label
                )));
            }
            (None, None) => String::new(),
        };
        let value = match input.kind {
            InputKind::Url if !value.is_empty() => web_address(&input.label, &value)?,
            _ => value,
        };
        resolved.insert(input.name.clone(), value);
    }

    let filled = |name: &String| resolved.get(name).is_some_and(|v| !v.is_empty());
    if !pipeline.at_least_one_of.is_empty() && !pipeline.at_least_one_of.iter().any(filled) {
        let labels: Vec<String> = pipeline
            .at_least_one_of
            .iter()
            .filter_map(|name| pipeline.inputs.iter().find(|i| &i.name == name))
            .map(|input| format!("'{}'", input.label))
            .collect();
        return Err(PipelineError::Validation(format!(
            "at least one of {} is required",
            labels.join(", ")
        )));
    }

    for (name, value) in given {
        if !resolved.contains_key(name) {
            resolved.insert(name.clone(), value.clone());
        }
    }
    Ok(resolved)
}

/// `value` as an http(s) address. A bare host gets `https://`.
fn web_address(label: &str, value: &str) -> Result<String, PipelineError> {
    let not_an_address = || {
        PipelineError::Validation(format!(
            "'{label}' must be a web address such as https://example.com"
        ))
    };

    if value.chars().any(char::is_whitespace) {
        return Err(not_an_address());
    }
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(value.to_string());
    }
    if value.contains("://") || !value.contains('.') {
        return Err(not_an_address());
    }
    Ok(format!("https://{value}"))
}
