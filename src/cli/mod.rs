//! Command-line interface definition and dispatch for ringside.
//!
//! Arguments are parsed with [`clap`] derive. `ask` and `chat` go through a
//! [`chat::ChatSession`]; `actions` talks to the lookups directly.

mod actions;

use crate::{chat, config, output, provider};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

/// Top-level CLI structure for ringside.
#[derive(Parser)]
#[command(
    name = "ringside",
    about = "A terminal chat assistant for event schedules and boxing records"
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question and exit
    Ask {
        /// Question text (joined with spaces)
        prompt: Vec<String>,
        /// Model name, or provider/model shorthand
        #[arg(short, long)]
        model: Option<String>,
        /// Provider to use (openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Show function calls and raw lookup results
        #[arg(long)]
        show_calls: bool,
    },
    /// Open the interactive chat REPL
    Chat {
        /// Provider to use (openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model name, or provider/model shorthand
        #[arg(short, long)]
        model: Option<String>,
        /// Show function calls and raw lookup results
        #[arg(long)]
        show_calls: bool,
    },
    /// Inspect or run the lookup actions directly
    Actions {
        #[command(subcommand)]
        action: ActionsCommand,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `actions` command.
#[derive(Subcommand)]
pub enum ActionsCommand {
    /// Print every action's function spec as JSON
    List,
    /// Run one action with JSON arguments and print its result
    Run {
        /// Action name, e.g. query_dazn_event_schedule
        name: String,
        /// Arguments as a JSON object
        args: String,
    },
}

/// `ringside config` subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config path and the effective settings
    Show,
}

/// Parses `std::env::args`; clap exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            prompt,
            model,
            provider: provider_name,
            show_calls,
        } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: ringside ask \"your question here\"");
            }

            let config = config::Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            let mut session = chat::ChatSession::from_config(&config, &selection, show_calls)?;

            println!(
                "{} [model: {}]",
                crate::constants::APP_NAME.bold().cyan(),
                selection.model.yellow(),
            );
            println!();
            println!("{} {}", ">".green().bold(), prompt);
            println!();

            let mut renderer = output::StdoutRenderer::new();
            session.turn(&prompt, &mut renderer).await?;
            Ok(())
        }
        Commands::Chat {
            provider: provider_name,
            model,
            show_calls,
        } => {
            let mut config = config::Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            config.model = selection.model.clone();
            chat::run_chat(config, &selection, show_calls).await
        }
        Commands::Actions { action } => actions::handle_actions(action).await,
        Commands::Config { action } => {
            let config = config::Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = config::Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    let toml_str = toml::to_string_pretty(&config)?;
                    println!("{}", toml_str);
                }
            }
            Ok(())
        }
    }
}
