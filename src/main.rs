// Copyright 2026 Dinescout Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dinescout::cli;
use dinescout::discovery::DiscoveryRequest;

#[derive(Parser)]
#[command(
    name = "dinescout",
    about = "Dinescout — find nearby restaurants and their online-ordering platforms",
    version,
    after_help = "Run 'dinescout <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover restaurants near an address and detect their ordering platforms
    Discover {
        /// Free-text address to search around (e.g. "600 Congress Ave, Austin TX")
        address: String,
        /// Search radius in miles
        #[arg(long, default_value = "2.0")]
        radius_miles: f64,
        /// Minimum star rating to keep a restaurant
        #[arg(long, default_value = "4.0")]
        min_rating: f64,
        /// Minimum review count to keep a restaurant
        #[arg(long, default_value = "25")]
        min_reviews: u32,
        /// Maximum restaurants in the result
        #[arg(long, default_value = "10")]
        max_results: usize,
        /// Look up each restaurant's website via place details
        #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
        fetch_websites: bool,
        /// Budget on place-details lookups
        #[arg(long, default_value = "10")]
        max_website_lookups: usize,
        /// Download websites and extract ordering platforms/links
        #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
        discover_ordering_links: bool,
        /// Budget on website downloads/scans
        #[arg(long, default_value = "10")]
        max_ordering_link_lookups: usize,
        /// Cap on ordering-link candidates kept per restaurant
        #[arg(long, default_value = "3")]
        max_ordering_candidates: usize,
    },
    /// Deep-scan one website with a headless browser
    Scan {
        /// URL to scan
        url: String,
        /// Wall-clock budget for the whole attempt, in seconds
        #[arg(long, default_value = "60")]
        budget_secs: u64,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Global flags as environment variables so all modules can check them
    if cli.json {
        std::env::set_var("DINESCOUT_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("DINESCOUT_QUIET", "1");
    }

    let default_level = if cli.verbose { "dinescout=debug" } else { "dinescout=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Discover {
            address,
            radius_miles,
            min_rating,
            min_reviews,
            max_results,
            fetch_websites,
            max_website_lookups,
            discover_ordering_links,
            max_ordering_link_lookups,
            max_ordering_candidates,
        } => {
            let request = DiscoveryRequest {
                address,
                radius_miles,
                min_rating,
                min_reviews,
                max_results,
                fetch_websites,
                max_website_lookups,
                discover_ordering_links,
                max_ordering_link_lookups,
                max_ordering_candidates_per_restaurant: max_ordering_candidates,
            };
            cli::discover_cmd::run(request).await
        }
        Commands::Scan { url, budget_secs } => cli::scan_cmd::run(&url, budget_secs).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dinescout", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if cli::is_json() {
            println!(
                "{}",
                serde_json::json!({ "error": true, "message": format!("{e:#}") })
            );
        } else if !cli::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
