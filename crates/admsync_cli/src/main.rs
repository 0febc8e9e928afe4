//! AdmSync CLI
//!
//! Offline tools for inspecting exports and sync scripts.
//!
//! # Commands
//!
//! - `decode` - Decode an export document into its canonical object
//! - `plan` - Print the script a sync would execute
//! - `check` - Decide whether a definition needs a sync

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// AdmSync command-line tools.
#[derive(Parser)]
#[command(name = "admsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options describing the object kind.
#[derive(Args, Debug, Clone)]
pub struct KindArgs {
    /// Kind name, e.g. `attribute`
    #[arg(short, long)]
    kind: String,

    /// Treat objects as business objects of this type
    #[arg(short, long)]
    business: Option<String>,

    /// Address suffix, e.g. `system`
    #[arg(long)]
    suffix: Option<String>,

    /// Kind-specific field bindings as PATH=NAME
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Fields left alone by the reset block
    #[arg(long = "keep")]
    keep: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an export document into its canonical object
    Decode {
        /// Export document
        file: PathBuf,

        #[command(flatten)]
        kind: KindArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the script a sync would execute
    Plan {
        /// Script body file
        body: PathBuf,

        #[command(flatten)]
        kind: KindArgs,

        /// Current export of the object; omit for a first sync
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Object name when no export is given
        #[arg(short, long)]
        name: Option<String>,

        /// Pre-script file
        #[arg(long)]
        pre: Option<PathBuf>,

        /// Variables as NAME=VALUE
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Version stamp in epoch seconds; defaults to the body's mtime
        #[arg(long)]
        stamp: Option<i64>,
    },

    /// Decide whether a definition needs a sync
    Check {
        /// Remote version marker as returned by the store
        #[arg(short, long, default_value = "")]
        remote: String,

        /// Local definition file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Local marker in epoch seconds
        #[arg(short, long)]
        local: Option<i64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Decode { file, kind, format } => {
            commands::decode::run(&file, &kind.descriptor()?, &format)?;
        }
        Commands::Plan {
            body,
            kind,
            export,
            name,
            pre,
            vars,
            stamp,
        } => {
            let options = commands::plan::PlanOptions {
                body,
                export,
                name,
                pre,
                vars,
                stamp,
            };
            commands::plan::run(&kind.descriptor()?, &options)?;
        }
        Commands::Check {
            remote,
            file,
            local,
        } => {
            commands::check::run(&remote, file.as_deref(), local)?;
        }
        Commands::Version => {
            println!("AdmSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
