//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::{BMKG_BASE_URL, ReportKind};
use crate::output::Format;

/// Indonesian earthquake dashboard for BMKG reports.
#[derive(Parser, Debug)]
#[command(name = "gempawatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Base URL serving gempaterkini.json, gempadirasakan.json and autogempa.json
    #[arg(long, global = true, default_value = BMKG_BASE_URL)]
    pub base_url: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the dashboard web server
    Serve(ServeArgs),

    /// Print one report feed and exit
    Show(ShowArgs),
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `show` command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Report feed to fetch: latest, felt, or auto
    #[arg(long, short = 'k', default_value = "latest", value_parser = parse_kind)]
    pub kind: ReportKind,

    /// Maximum number of reports to show
    #[arg(long, short = 'n', default_value = "15")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse a report kind from string.
fn parse_kind(s: &str) -> Result<ReportKind, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
