//! Test fixtures for creating sample configurations and test data.

#![allow(dead_code)]

use pl_protocol::pipeline_models::{InputSpec, PipelineSpec, StepSpec};
use pl_protocol::role_models::{Capability, RoleSpec};
use pl_protocol::run_models::Parameters;
use tempfile::TempDir;

/// Create a temporary project directory with a `.promptline/` configuration.
///
/// The project contains:
/// - `config.toml` selecting the `mock/echo` model
/// - roles `comedian`, `joke-judge` and `analyst` (with `fetch-page`)
/// - pipelines `joke-teller` (two steps) and `site-review` (one step)
///
/// Returns a TempDir that must be kept alive for the test duration.
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path().join(".promptline");

    std::fs::create_dir_all(root.join("roles"))?;
    std::fs::create_dir_all(root.join("pipelines"))?;

    std::fs::write(
        root.join("config.toml"),
        r#"
[llm]
model = "mock/echo"
temperature = 0.2
max-tokens = 256
"#,
    )?;

    std::fs::write(
        root.join("roles/comedian.md"),
        r#"---
name: comedian
title: joke teller
goal: Tell hilarious jokes
color: yellow
---
You are a professional comedian."#,
    )?;
    std::fs::write(
        root.join("roles/joke-judge.md"),
        r#"---
name: joke-judge
title: joke judge
goal: Rate jokes on a scale of 1-10
---
You are an experienced comedy critic."#,
    )?;
    std::fs::write(
        root.join("roles/analyst.md"),
        r#"---
name: analyst
goal: Summarize websites
capabilities: [fetch-page]
---
You read landing pages."#,
    )?;

    std::fs::write(
        root.join("pipelines/joke-teller.yaml"),
        r#"
name: joke-teller
title: Joke Teller
inputs:
  - name: joke_type
    label: Joke type
steps:
  - id: joke
    role: comedian
    description: Create a hilarious {joke_type} joke.
  - id: judge
    role: joke-judge
    description: Review the joke and rate it out of 10.
    context: [joke]
"#,
    )?;
    std::fs::write(
        root.join("pipelines/site-review.yaml"),
        r#"
name: site-review
inputs:
  - url
mail:
  default-subject: Site review
steps:
  - id: analyze
    role: analyst
    description: Analyze {url}
"#,
    )?;

    Ok(temp_dir)
}

pub fn create_test_role(name: &str) -> RoleSpec {
    RoleSpec {
        name: name.to_string(),
        title: String::new(),
        goal: format!("Goal of {name}"),
        capabilities: vec![],
        color: String::new(),
        backstory: String::new(),
    }
}

pub fn create_fetching_role(name: &str) -> RoleSpec {
    RoleSpec {
        capabilities: vec![Capability::FetchPage],
        ..create_test_role(name)
    }
}

pub fn create_test_step(id: &str, role: &str, description: &str, context: &[&str]) -> StepSpec {
    StepSpec {
        id: id.to_string(),
        role: role.to_string(),
        description: description.to_string(),
        expected_output: String::new(),
        context: context.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn create_test_pipeline(name: &str, inputs: Vec<InputSpec>, steps: Vec<StepSpec>) -> PipelineSpec {
    PipelineSpec {
        name: name.to_string(),
        title: String::new(),
        description: String::new(),
        inputs,
        at_least_one_of: vec![],
        vars: Parameters::new(),
        model: None,
        temperature: None,
        max_tokens: None,
        mail: None,
        steps,
    }
}

/// The two-step joke pipeline used by the README walkthrough.
pub fn create_joke_pipeline() -> (PipelineSpec, Vec<RoleSpec>) {
    let pipeline = create_test_pipeline(
        "joke-teller",
        vec![InputSpec::required("joke_type")],
        vec![
            create_test_step("joke", "comedian", "Create a hilarious {joke_type} joke.", &[]),
            create_test_step(
                "judge",
                "joke-judge",
                "Review the joke and rate it out of 10.",
                &["joke"],
            ),
        ],
    );
    let roles = vec![create_test_role("comedian"), create_test_role("joke-judge")];
    (pipeline, roles)
}

pub fn params(pairs: &[(&str, &str)]) -> Parameters {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
