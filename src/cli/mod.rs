//! CLI module for xdiag
//!
//! Provides commands:
//! - `run`: probe the X API with the configured credentials and print a report
//! - `env`: show which credentials are set, without calling the API

use clap::{Args, Parser, Subcommand};

use crate::settings::AppConfig;

pub mod env;
pub mod run;

/// X API credential and access-tier diagnostics
#[derive(Parser, Debug)]
#[command(name = "xdiag")]
#[command(about = "Check X API credentials and guess the access tier")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the diagnostic probes
    Run(RunArgs),
    /// Show the credential overview only
    Env,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Account to resolve, read and list followings for
    #[arg(long)]
    pub handle: Option<String>,

    /// Recent-search query
    #[arg(long)]
    pub query: Option<String>,

    /// Write a JSON digest of fetched posts
    #[arg(long)]
    pub artifact: bool,

    /// Directory for the JSON digest
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Use a scripted client instead of the network
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => {
            let code = run::run(args, config).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Some(Commands::Env) => env::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
