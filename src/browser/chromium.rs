//! Chromium-backed browser using chromiumoxide.

use super::{Browser, PageSession};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Poll interval while waiting for `document.readyState`.
const SETTLE_POLL: Duration = Duration::from_millis(250);

/// Grace period after the document reports complete, for late scripts.
const SETTLE_GRACE: Duration = Duration::from_millis(750);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. DINESCOUT_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("DINESCOUT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.dinescout/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".dinescout/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".dinescout/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".dinescout/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".dinescout/chromium/chrome-linux64/chrome"),
                home.join(".dinescout/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium browser engine.
pub struct ChromiumBrowser {
    browser: chromiumoxide::browser::Browser,
}

impl ChromiumBrowser {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found; set DINESCOUT_CHROMIUM_PATH or install chromium")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = chromiumoxide::browser::Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_session(&self) -> Result<Box<dyn PageSession>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;
        Ok(Box::new(ChromiumSession { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser process exits when ChromiumBrowser is dropped.
        Ok(())
    }
}

/// A single Chromium page session.
pub struct ChromiumSession {
    page: Page,
}

impl ChromiumSession {
    /// Evaluate JS and pull the result out as a string.
    async fn eval_string(&self, script: &str) -> Result<String> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS evaluation failed")?;
        result
            .into_value::<String>()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn eval_bool(&self, script: &str) -> Result<bool> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS evaluation failed")?;
        result
            .into_value::<bool>()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_settle(&mut self, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let state = self
                .eval_string("document.readyState")
                .await
                .unwrap_or_default();
            if state == "complete" {
                tokio::time::sleep(SETTLE_GRACE).await;
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Ok(());
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }

    async fn title(&mut self) -> Result<String> {
        self.eval_string("document.title").await
    }

    async fn body_text(&mut self) -> Result<String> {
        self.eval_string("document.body ? document.body.innerText : ''")
            .await
    }

    async fn html(&mut self) -> Result<String> {
        self.eval_string("document.documentElement.outerHTML").await
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn click_by_text(&mut self, text: &str, exact: bool) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const needle = '{}';
                const exact = {};
                const els = document.querySelectorAll(
                    'a, button, [role="button"], [role="link"], input[type="submit"]');
                for (const el of els) {{
                    const t = (el.innerText || el.value || '').trim().toLowerCase();
                    const hit = exact ? t === needle : t.includes(needle);
                    if (hit && el.offsetParent !== null) {{
                        el.click();
                        return true;
                    }}
                }}
                return false;
            }})()"#,
            sanitize_js_string(&text.to_lowercase()),
            exact
        );
        self.eval_bool(&script).await
    }

    async fn click_by_selector(&mut self, selector: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (el) {{ el.click(); return true; }}
                return false;
            }})()"#,
            sanitize_js_string(selector)
        );
        self.eval_bool(&script).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes everything that could break out of a JS string context:
/// backslashes, quotes, backticks, newlines, script tags; null bytes are
/// stripped.
fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}
