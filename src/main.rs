use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use confsearch::config::DEFAULT_CONFIG_FILE;

mod cmd;

#[derive(Parser)]
#[command(name = "confsearch")]
#[command(version, about = "Retrieval-augmented question answering service")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Path to confsearch.toml. Defaults apply when the file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack ranked passages into a prompt under a length budget
    Pack {
        /// Question placed in the prompt footer
        #[arg(short, long)]
        query: String,

        /// Budget; the rendered prompt must stay strictly below it (defaults to prompt_limit)
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Instruction text placed before the context (defaults to the configured preamble)
        #[arg(long)]
        preamble: Option<String>,

        /// Measure the budget in approximate tokens instead of characters
        #[arg(long)]
        tokens: bool,

        /// Print a JSON object with prompt, used and length
        #[arg(long)]
        json: bool,

        /// Passages file: a JSON array of strings or blank-line separated text (stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Run the HTTP service against a local fixture index
    Serve {
        /// Port to serve on (overrides config and CONFSEARCH_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Prompt budget in characters (overrides config and PROMPT_LIMIT)
        #[arg(long)]
        prompt_limit: Option<i64>,

        /// JSON array of ranked matches served for every query
        #[arg(long)]
        fixtures: PathBuf,
    },
    /// View, validate or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration (file + environment)
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default confsearch.toml
    Init,
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "Failed to load .env file");
        }
    }

    match &cli.command {
        Commands::Pack {
            query,
            limit,
            preamble,
            tokens,
            json,
            file,
        } => {
            let config = cmd::load_config(&cli.config)?;
            cmd::cmd_pack(
                &config,
                cmd::PackArgs {
                    query,
                    limit: *limit,
                    preamble: preamble.as_deref(),
                    tokens: *tokens,
                    json: *json,
                    file: file.as_deref(),
                },
            )?;
        }
        Commands::Serve {
            port,
            prompt_limit,
            fixtures,
        } => {
            let mut config = cmd::load_config(&cli.config)?;
            config.apply_cli(*port, *prompt_limit);
            cmd::cmd_serve(config, fixtures).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&cli.config, command.clone())?,
    }

    Ok(())
}
