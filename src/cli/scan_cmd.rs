//! `dinescout scan <url>` — run the deep-scan fallback against one URL.
//!
//! The orchestrator's link discovery is static-only; this command is the
//! operational surface for the browser-driven fallback, for sites whose
//! static pass came back empty.

use crate::browser::chromium::ChromiumBrowser;
use crate::browser::Browser;
use crate::cli;
use crate::ordering::deep_scan::{self, DeepScanConfig, DeepScanResult};
use anyhow::Result;
use std::time::Duration;

/// Run the scan command.
pub async fn run(url: &str, budget_secs: u64) -> Result<()> {
    let browser = ChromiumBrowser::launch().await?;
    let config = DeepScanConfig {
        budget: Duration::from_secs(budget_secs.clamp(5, 300)),
        ..DeepScanConfig::default()
    };

    let result = deep_scan::deep_scan(&browser, url, &config).await;
    browser.shutdown().await?;

    if cli::is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(url, &result);
    }
    Ok(())
}

fn print_human(url: &str, result: &DeepScanResult) {
    println!("Deep scan of {url}");
    if let Some(final_url) = &result.final_url {
        if final_url != url {
            println!("  final url: {final_url}");
        }
    }
    if result.clicked_order_cta {
        println!("  clicked order CTA ({:?})", result.cta_strategy);
    }
    match &result.fingerprint {
        Some(fp) => println!(
            "  platform: {} ({:?}) — {}",
            fp.primary.label, fp.primary.confidence, fp.primary.reason
        ),
        None => println!("  platform: no embedded evidence"),
    }
    if result.ordering_links.is_empty() {
        println!("  ordering links: none");
    } else {
        for link in &result.ordering_links {
            println!("  order: {} (score {})", link.url, link.score);
        }
    }
    for note in &result.notes {
        println!("  note: {note}");
    }
    if let Some(error) = &result.error_message {
        println!("  error: {error}");
    }
}
