//! modedit - command-line editor for module manifests

use anyhow::Result;
use clap::{Parser, Subcommand};
use modfile_core::MANIFEST_FILE;
use std::path::PathBuf;

mod edit;
mod format;

#[derive(Parser)]
#[command(name = "modedit")]
#[command(version = modfile_core::VERSION)]
#[command(about = "Format, check and edit module manifests", long_about = None)]
struct Cli {
    /// Path to the manifest
    #[arg(long, short = 'f', global = true, default_value = MANIFEST_FILE)]
    file: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the manifest in canonical layout
    Fmt {
        /// Print the result instead of writing the file
        #[arg(long)]
        print: bool,
    },

    /// Parse the manifest and report every problem found
    Check,

    /// Apply edits to the manifest
    Edit {
        /// Set the module path
        #[arg(long)]
        module: Option<String>,

        /// Require path@version
        #[arg(long, value_name = "PATH@VERSION")]
        require: Vec<String>,

        /// Drop every requirement for a path
        #[arg(long, value_name = "PATH")]
        droprequire: Vec<String>,

        /// Exclude path@version
        #[arg(long, value_name = "PATH@VERSION")]
        exclude: Vec<String>,

        /// Drop an exclusion
        #[arg(long, value_name = "PATH@VERSION")]
        dropexclude: Vec<String>,

        /// Replace old@version with new@version or a local directory
        #[arg(long, value_name = "OLD@VERSION=NEW[@VERSION]")]
        replace: Vec<String>,

        /// Drop a replacement
        #[arg(long, value_name = "OLD@VERSION")]
        dropreplace: Vec<String>,

        /// Deduplicate and sort blocks
        #[arg(long)]
        sort: bool,

        /// Print the result instead of writing the file
        #[arg(long)]
        print: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MODEDIT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Fmt { print } => {
            format::format_manifest(&cli.file, print)?;
        }

        Commands::Check => {
            format::check_manifest(&cli.file)?;
        }

        Commands::Edit {
            module,
            require,
            droprequire,
            exclude,
            dropexclude,
            replace,
            dropreplace,
            sort,
            print,
        } => {
            let options = edit::EditOptions {
                module,
                require,
                drop_require: droprequire,
                exclude,
                drop_exclude: dropexclude,
                replace,
                drop_replace: dropreplace,
                sort,
                print,
            };
            edit::edit_manifest(&cli.file, &options)?;
        }
    }

    Ok(())
}
