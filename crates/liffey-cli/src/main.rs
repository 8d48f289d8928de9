#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "liffey")]
#[command(author, version, about = "An on-demand ES module development server", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted logs (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the dev server (the default command)
    Dev {
        /// Application entry point, relative to the project root
        entry: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long, default_value_t = liffey_core::config::DEFAULT_PORT)]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Open the browser automatically
        #[arg(long)]
        open: bool,

        /// Explicit config file path (overrides auto-discovery)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json);

    let cwd = match cli.cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().into_diagnostic()?,
    };

    match cli.command {
        Some(Commands::Version) => {
            commands::version::run(cli.json);
            Ok(())
        }
        Some(Commands::Dev {
            entry,
            port,
            host,
            open,
            config,
        }) => {
            commands::dev::run(commands::dev::DevAction {
                entry,
                cwd,
                port,
                host,
                open,
                config,
            })
            .await
        }
        // Bare `liffey` starts the dev server with defaults
        None => {
            commands::dev::run(commands::dev::DevAction {
                entry: None,
                cwd,
                port: liffey_core::config::DEFAULT_PORT,
                host: String::from("localhost"),
                open: false,
                config: None,
            })
            .await
        }
    }
}
