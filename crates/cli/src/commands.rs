//! Subcommand implementations.

use crate::cli::{RunArgs, SendArgs};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use colored::Colorize;
use pl_core::config::{load_config, AppConfig, PROJECT_DIR};
use pl_core::init::{generate_project, InitOptions};
use pl_core::mail::{MailRequest, Mailer};
use pl_core::providers::LlmOverrides;
use pl_core::runtime::Runtime;
use pl_core::PipelineError;
use pl_protocol::ipc::Event;
use pl_protocol::pipeline_models::{MailSpec, PipelineSpec};
use pl_protocol::run_models::{Parameters, RunOutcome};
use std::fs;
use std::path::Path;
use tokio::sync::mpsc;

pub async fn init(root: &Path, force: bool, minimal: bool) -> Result<()> {
    let files = generate_project(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;

    println!(
        "{} {}",
        "Initialized".green().bold(),
        root.join(PROJECT_DIR).display()
    );
    for file in files {
        println!("  {file}");
    }
    Ok(())
}

pub async fn list(root: &Path) -> Result<()> {
    let config = load_config(root).await?;
    print!("{}", format_listing(&config));
    Ok(())
}

fn format_listing(config: &AppConfig) -> String {
    if config.pipelines.is_empty() && config.roles.is_empty() {
        return "No pipelines found. Run `promptline init` to create a project.\n".to_string();
    }

    let mut out = format!("{}\n", "Pipelines".bold());
    for pipeline in &config.pipelines {
        out.push_str(&format!(
            "  {} {:<24} {}\n",
            format!("{:<18}", pipeline.name).cyan(),
            pipeline.display_title(),
            format_inputs(pipeline)
        ));
    }

    out.push_str(&format!("\n{}\n", "Roles".bold()));
    for role in &config.roles {
        out.push_str(&format!(
            "  {} {}\n",
            format!("{:<18}", role.name).cyan(),
            role.display_name()
        ));
    }
    out
}

/// Input names, required ones marked with `*`.
fn format_inputs(pipeline: &PipelineSpec) -> String {
    pipeline
        .inputs
        .iter()
        .map(|input| {
            if input.required {
                format!("{}*", input.name)
            } else {
                input.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn run(root: &Path, overrides: LlmOverrides, args: RunArgs) -> Result<()> {
    let config = load_config(root).await?;
    let runtime = Runtime::from_config(config, overrides);

    let pipeline = runtime
        .config()
        .pipeline(&args.pipeline)
        .ok_or_else(|| PipelineError::Validation(format!("unknown pipeline '{}'", args.pipeline)))?;
    let engine = runtime.engine_for(pipeline)?;
    let inputs: Parameters = args.inputs.into_iter().collect();

    let (events_tx, events_rx) = mpsc::channel(64);
    let progress = tokio::spawn(report_progress(events_rx));
    let result = engine
        .run(pipeline, &runtime.config().roles, &inputs, &events_tx)
        .await;
    drop(events_tx);
    let _ = progress.await;
    let outcome = result?;

    if let Some(path) = &args.output {
        fs::write(path, outcome.final_text())
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        eprintln!("{} {}", "Saved".green(), path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", format_outcome(&outcome, args.steps));
    }
    Ok(())
}

/// Step progress on stderr, so stdout carries only the result.
async fn report_progress(mut events_rx: mpsc::Receiver<Event>) {
    let mut total = 0;
    while let Some(event) = events_rx.recv().await {
        match event {
            Event::RunStarted {
                pipeline,
                total_steps,
                ..
            } => {
                total = total_steps;
                eprintln!("{} {pipeline}", "Running".bold());
            }
            Event::StepStarted {
                step_index,
                step_id,
                role,
                ..
            } => {
                eprintln!("  [{}/{total}] {step_id} ({role})", step_index + 1);
            }
            _ => {}
        }
    }
}

fn format_outcome(outcome: &RunOutcome, with_steps: bool) -> String {
    let mut out = String::new();
    if with_steps {
        for artifact in outcome.intermediate() {
            out.push_str(&format!(
                "{}\n{}\n\n",
                format!("== {} ({}) ==", artifact.step_id, artifact.role).dimmed(),
                artifact.text.trim_end()
            ));
        }
        if let Some(last) = outcome.artifacts.last() {
            out.push_str(&format!(
                "{}\n",
                format!("== {} ({}) ==", last.step_id, last.role).bold()
            ));
        }
    }
    out.push_str(outcome.final_text().trim_end());
    out.push('\n');
    out
}

pub async fn send(root: &Path, args: SendArgs) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .wrap_err_with(|| format!("failed to read {}", args.file.display()))?;
    let config = load_config(root).await?;
    let mailer = Mailer::smtp(config.global.mail.clone());

    let request = MailRequest {
        from: args.from,
        password: args.password,
        to: args.to,
        text,
        default_subject: args
            .subject
            .unwrap_or_else(|| MailSpec::default().default_subject),
    };

    let receipt = mailer.send(&request).await?;
    println!(
        "{} to {} (subject: {})",
        "Email sent".green().bold(),
        receipt.to,
        receipt.subject
    );
    Ok(())
}
