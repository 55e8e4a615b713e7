use clap::Parser;
use std::path::PathBuf;

/// Runs one keystroke of the filter box and prints what the UI would show.
#[derive(Parser)]
pub struct Cli {
    /// Filter text as typed.
    pub query: String,
    #[clap(long)]
    /// Cursor position in chars. Defaults to the end of the query.
    pub cursor: Option<usize>,
    #[clap(long)]
    /// JSON file with `podNames`, `serviceNames` and `namespaces`.
    pub services: Option<PathBuf>,
    #[clap(long)]
    pub config: Option<PathBuf>,
    #[clap(long)]
    /// Apply the N-th suggestion (from 0) and print the resulting query.
    pub apply: Option<usize>,
    #[clap(long, default_value = "false")]
    /// Treat the tables as loaded from a dump.
    pub from_dump: bool,
}
