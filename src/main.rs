mod callouts;
mod commands;
mod config;
mod coverage;
mod diagnostics;
mod digest;
mod document;
mod error;
mod fragment;
mod lookup;
mod lookups;
mod parser;
mod render;
mod report;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::ConvertOptions;

#[derive(Parser)]
#[command(name = "altlookup", about = "Alternative-language renderings for AsciiDoc listings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert documents to HTML, injecting alternative-language listings
    Convert {
        /// Documents, or directories searched for .adoc files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Lookup records (`source,alternative,directory` per line)
        #[arg(long)]
        lookups: Option<String>,
        /// Directory for the HTML output
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Where to write the alternatives report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Where to write the JSON coverage summary
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Print the digest file name expected for each listing
    Digest {
        /// Document to inspect
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert { inputs, lookups, out_dir, report, summary } => {
            commands::convert(&ConvertOptions { inputs, lookups, out_dir, report, summary })
        },
        Commands::Digest { input } => commands::digest(&input).map(|()| return ExitCode::SUCCESS),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
