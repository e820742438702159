//! Browser abstraction for the deep-scan fallback.
//!
//! Defines the `Browser` and `PageSession` traits that abstract over the
//! headless engine (currently Chromium via chromiumoxide). A session is a
//! single controllable page: navigate, wait for the DOM to settle, read
//! title/text/HTML, click by visible text or CSS selector, close.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// A browser engine that can open page sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a new page session (tab).
    async fn new_session(&self) -> Result<Box<dyn PageSession>>;
    /// Shut down the engine.
    async fn shutdown(&self) -> Result<()>;
}

/// One controllable page. Exclusively owned by a single deep-scan attempt
/// and always closed before the attempt returns.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to a URL, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Wait for the page to settle (document ready + a short grace period),
    /// bounded by `timeout_ms`. Never fails on timeout — the page is simply
    /// used as-is.
    async fn wait_for_settle(&mut self, timeout_ms: u64) -> Result<()>;
    /// Current page title.
    async fn title(&mut self) -> Result<String>;
    /// Visible body text.
    async fn body_text(&mut self) -> Result<String>;
    /// Full serialized HTML of the current DOM.
    async fn html(&mut self) -> Result<String>;
    /// Current URL (after any redirects/navigation).
    async fn current_url(&mut self) -> Result<String>;
    /// Click the first interactable button/link whose visible text matches
    /// `text` (exact or substring, case-insensitive). Returns whether a
    /// click happened.
    async fn click_by_text(&mut self, text: &str, exact: bool) -> Result<bool>;
    /// Click the first element matching a CSS selector. Returns whether a
    /// click happened.
    async fn click_by_selector(&mut self, selector: &str) -> Result<bool>;
    /// Close the page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op browser used when Chromium is unavailable.
///
/// Static discovery works without a browser; only the deep-scan fallback
/// needs one. This stub makes deep scans fail with a clear message while
/// everything else still functions.
pub struct NoopBrowser;

#[async_trait]
impl Browser for NoopBrowser {
    async fn new_session(&self) -> Result<Box<dyn PageSession>> {
        Err(anyhow::anyhow!("browser not available — static-only mode"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
