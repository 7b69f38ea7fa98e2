mod commands;
mod config;
mod context;
mod error;
mod locator;
mod output;
mod sas;
mod secrets;
mod selection;
mod traits;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{InspectCommand, SignCommand};
use config::Config;
use context::Context;
use sas::PermissionLevel;
use selection::Selection;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sasgen")]
#[command(about = "Rewrite Azure Blob Storage URIs in text files as time-limited SAS URLs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace selected blob URIs in a file with signed SAS URLs
    Sign {
        /// File containing the highlighted URIs
        file: PathBuf,

        /// Byte range of a highlighted URI, as START..END (repeatable)
        #[arg(short, long = "select", value_name = "START..END")]
        select: Vec<Selection>,

        /// Storage account key; skips the key prompt for every account
        #[arg(short, long, env = "AZURE_STORAGE_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Validity preset label (e.g. "1 hour"); skips the validity prompt
        #[arg(long, value_name = "PRESET")]
        validity: Option<String>,

        /// Permission level; skips the permission prompt
        #[arg(long, value_enum)]
        permissions: Option<PermissionLevel>,
    },

    /// Parse blob URIs and show the account, container and blob they name
    Inspect {
        /// URIs to inspect
        #[arg(required = true)]
        uris: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let ctx = Context::new();

    if let Err(err) = run(&ctx, cli.command) {
        // One generic notice; the chain below is the detail view.
        output::error("Operation failed");
        for cause in err.chain() {
            output::dimmed(&format!("  {}", cause));
        }
        std::process::exit(1);
    }
}

fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Sign {
            file,
            select,
            key,
            validity,
            permissions,
        } => {
            let config = Config::load(&*ctx.fs)?;
            SignCommand::execute(
                ctx,
                &config,
                &file,
                &select,
                key.as_deref(),
                validity.as_deref(),
                permissions,
            )
        }
        Commands::Inspect { uris } => InspectCommand::execute(ctx, &uris),
    }
}
