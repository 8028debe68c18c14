//! Command line arguments.

use clap::{Args, Parser, Subcommand};
use pl_core::providers::LlmOverrides;
use pl_protocol::ipc::REDACTED;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "promptline")]
#[command(about = "Run multi-role LLM prompt pipelines", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project root containing `.promptline/`
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Model id, e.g. groq/llama-3.3-70b-versatile
    #[arg(long, global = true, value_name = "ID")]
    pub model: Option<String>,

    /// API key for the model's provider. Read from the environment otherwise.
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    #[arg(long, global = true, value_name = "F")]
    pub temperature: Option<f32>,

    #[arg(long, global = true, value_name = "N")]
    pub max_tokens: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn overrides(&self) -> LlmOverrides {
        LlmOverrides {
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create `.promptline/` with the bundled roles and pipelines
    Init {
        /// Overwrite an existing `.promptline/`
        #[arg(long)]
        force: bool,

        /// Only the joke-teller pipeline and its roles
        #[arg(long)]
        minimal: bool,
    },

    /// Show the configured pipelines and roles
    List,

    /// Run a pipeline and print its final result
    Run(RunArgs),

    /// Email a saved result
    Send(SendArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline name
    pub pipeline: String,

    /// Input value, repeatable
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub inputs: Vec<(String, String)>,

    /// Also print the intermediate step results
    #[arg(long)]
    pub steps: bool,

    /// Print the run outcome as JSON
    #[arg(long, conflicts_with = "steps")]
    pub json: bool,

    /// Write the final result to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct SendArgs {
    /// Text file with the message; a leading `Subject:` line becomes the subject
    pub file: PathBuf,

    /// Sender address, also the relay login
    #[arg(long)]
    pub from: String,

    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Relay password (an app password for Gmail)
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Subject used when the file has no `Subject:` line
    #[arg(long)]
    pub subject: Option<String>,
}

impl fmt::Debug for SendArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendArgs")
            .field("file", &self.file)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("password", &REDACTED)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Parse `key=value`. The value may itself contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("joke_type=dad jokes").unwrap(),
            ("joke_type".to_string(), "dad jokes".to_string())
        );
        assert_eq!(
            parse_key_val("url=https://x.io/?a=b").unwrap(),
            ("url".to_string(), "https://x.io/?a=b".to_string())
        );
        assert_eq!(
            parse_key_val("genre=").unwrap(),
            ("genre".to_string(), String::new())
        );
        assert!(parse_key_val("no-equals").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["promptline"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.root.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "promptline",
            "run",
            "joke-teller",
            "-i",
            "joke_type=puns",
            "--model",
            "mock/echo",
            "--temperature",
            "0.2",
            "--steps",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.model.as_deref(), Some("mock/echo"));
        assert_eq!(overrides.temperature, Some(0.2));
        assert_eq!(overrides.max_tokens, None);

        match cli.command {
            Some(Command::Run(args)) => {
                assert_eq!(args.pipeline, "joke-teller");
                assert_eq!(args.inputs, vec![("joke_type".to_string(), "puns".to_string())]);
                assert!(args.steps);
                assert!(!args.json);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_json_conflicts_with_steps() {
        let result = Cli::try_parse_from(["promptline", "run", "x", "--json", "--steps"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_send_password_flag() {
        let cli = Cli::try_parse_from([
            "promptline",
            "send",
            "out.txt",
            "--from",
            "me@example.com",
            "--to",
            "you@example.com",
            "--password",
            "secret",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Send(args)) => {
                assert_eq!(args.file, PathBuf::from("out.txt"));
                assert_eq!(args.password, "secret");
                assert!(args.subject.is_none());
                assert!(!format!("{args:?}").contains("secret"));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }
}
