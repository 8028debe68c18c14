mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Command};
use color_eyre::eyre::eyre;
use pl_core::config::load_config;
use pl_core::runtime::Runtime;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let overrides = cli.overrides();

    match cli.command {
        // When `promptline` is called without a command, launch the TUI
        None => {
            logging::init_file(&root)?;
            let config = load_config(&root).await?;
            let runtime = Runtime::from_config(config, overrides);
            pl_tui::run_app(runtime, root)
                .await
                .map_err(|e| eyre!(e))
        }
        Some(command) => {
            logging::init_stderr();
            match command {
                Command::Init { force, minimal } => commands::init(&root, force, minimal).await,
                Command::List => commands::list(&root).await,
                Command::Run(args) => commands::run(&root, overrides, args).await,
                Command::Send(args) => commands::send(&root, args).await,
            }
        }
    }
}
