//! Environment readiness check.

use crate::browser::chromium::find_chromium;
use crate::config::Config;
use anyhow::Result;

/// Check API key and Chromium availability.
pub async fn run() -> Result<()> {
    println!("Dinescout Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let config = Config::from_env();
    let key_ok = config.api_key.is_some();
    if key_ok {
        println!("[OK] Places API key configured");
    } else {
        println!("[!!] Places API key NOT found. Set DINESCOUT_API_KEY or GOOGLE_MAPS_API_KEY.");
    }
    println!("     Provider base URL: {}", config.base_url);

    // Chromium is only needed for `dinescout scan`; discovery itself is
    // static-only.
    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => {
            println!("[!!] Chromium NOT found; `dinescout scan` will not work.");
            println!("     Set DINESCOUT_CHROMIUM_PATH or install google-chrome/chromium.");
        }
    }

    println!();
    if key_ok {
        println!("Status: READY");
        if chromium.is_none() {
            println!("  (deep scans unavailable without Chromium)");
        }
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
