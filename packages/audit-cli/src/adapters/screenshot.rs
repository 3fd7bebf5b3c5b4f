//! Homepage capture via headless Chromium.
//!
//! Invoked only once overall similarity clears the configured threshold,
//! so an obviously-unrelated site never pays the capture cost. Capture
//! failure is non-fatal: the report simply omits the screenshots.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Viewport and timing knobs for one capture.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
    /// Extra render budget for JavaScript-heavy pages
    pub render_delay: Duration,
    pub timeout: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            render_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Screenshot collaborator boundary.
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    /// Capture a page, returning PNG bytes.
    async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<Vec<u8>>;
}

/// Shells out to a headless Chromium/Chrome binary.
pub struct ChromiumCapture {
    binary: String,
}

impl ChromiumCapture {
    /// Use the first Chromium-family binary found on PATH.
    pub fn discover() -> Option<Self> {
        const CANDIDATES: &[&str] = &[
            "chromium",
            "chromium-browser",
            "google-chrome",
            "google-chrome-stable",
        ];
        let path_var = std::env::var_os("PATH")?;
        for candidate in CANDIDATES {
            for dir in std::env::split_paths(&path_var) {
                if dir.join(candidate).is_file() {
                    return Some(Self {
                        binary: candidate.to_string(),
                    });
                }
            }
        }
        None
    }

    /// Use a specific binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn scratch_path() -> PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "clone-audit-capture-{}-{sequence}.png",
            std::process::id()
        ))
    }
}

#[async_trait]
impl ScreenshotCapture for ChromiumCapture {
    async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<Vec<u8>> {
        let output_path = Self::scratch_path();
        debug!(url = %url, binary = %self.binary, "screenshot capture starting");

        let mut command = tokio::process::Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg(format!("--window-size={},{}", options.width, options.height))
            .arg(format!(
                "--virtual-time-budget={}",
                options.render_delay.as_millis()
            ))
            .arg(format!("--screenshot={}", output_path.display()))
            .arg(url)
            .kill_on_drop(true);

        let status = tokio::time::timeout(options.timeout, command.status())
            .await
            .context("screenshot capture timed out")?
            .context("failed to launch screenshot binary")?;

        if !status.success() {
            bail!("screenshot binary exited with {status}");
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .context("screenshot output missing")?;
        let _ = tokio::fs::remove_file(&output_path).await;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_fails_without_panicking() {
        let capture = ChromiumCapture::with_binary("definitely-not-a-browser");
        let result = capture
            .capture("https://example.com", &CaptureOptions::default())
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn scratch_paths_differ_between_calls() {
        assert_ne!(
            ChromiumCapture::scratch_path(),
            ChromiumCapture::scratch_path()
        );
    }
}
