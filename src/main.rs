//! gempawatch - Indonesian earthquake dashboard from your terminal.
//!
//! Fetches BMKG's latest, felt, and most recent earthquake reports and
//! serves them as a tabbed dashboard with a map, or prints them to stdout.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod cards;
mod cli;
mod client;
mod dashboard;
mod errors;
mod map;
mod models;
mod output;
mod server;

use cli::{Cli, Command};
use client::{BmkgClient, ReportSource};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let client = BmkgClient::with_base_url(&cli.base_url).context("failed to create BMKG client")?;

    match cli.command {
        Command::Serve(args) => cmd_serve(args, client),
        Command::Show(args) => cmd_show(&args, &client),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `show` command - one-shot fetch of a report feed.
fn cmd_show(args: &cli::ShowArgs, client: &BmkgClient) -> Result<()> {
    let payload = client
        .fetch(args.kind)
        .with_context(|| format!("failed to fetch {} reports", args.kind))?;

    let mut reports = payload.into_reports();
    reports.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_reports(&mut handle, &reports, args.format)?;

    Ok(())
}

/// Execute the `serve` command - start the dashboard web server.
fn cmd_serve(args: cli::ServeArgs, client: BmkgClient) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host,
    };

    // Print startup message
    let url = format!("http://{}:{}", config.host, config.port);
    println!("\x1b[1m🌍 gempawatch dashboard\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Source:  {}", client.url_for(client::ReportKind::Latest));
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    let source: Arc<dyn ReportSource> = Arc::new(client);

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, source))
}
