//! HTTP download of JDK archives.
//!
//! [`Downloader`] is the seam the installer talks to; [`HttpDownloader`] is
//! the reqwest-backed implementation used by the CLI. Downloads stream into a
//! `.tmp` sibling of the destination and are renamed into place only after
//! the whole body has been written, so a destination file is never partial.
//!
//! Failed attempts are retried with exponential backoff and jitter.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Maximum number of download attempts.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress updates in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// Fetches a URL into a local file.
pub trait Downloader {
    /// Downloads `url` to `dest`. On failure `dest` does not exist.
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<()>>;
}

/// Network settings for [`HttpDownloader`], taken from the settings file.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Proxy URL applied to every scheme, `None` for a direct connection.
    pub proxy: Option<String>,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Print a progress line to stdout while downloading.
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            verify_tls: true,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            show_progress: true,
        }
    }
}

/// reqwest-backed [`Downloader`].
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    show_progress: bool,
}

impl HttpDownloader {
    /// Builds a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the client cannot be built.
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy URL: {proxy}"))?;
            builder = builder.proxy(proxy);
        }

        if !config.verify_tls {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            show_progress: config.show_progress,
        })
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        if !response.status().is_success() {
            bail!("HTTP error {}: {url}", response.status());
        }

        let total_size = response.content_length().unwrap_or(0);

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let start_time = Instant::now();
        let mut last_update = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("Failed to read chunk from {url}"))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write to {}", dest.display()))?;
            downloaded += chunk.len() as u64;

            if self.show_progress && last_update.elapsed().as_millis() >= PROGRESS_INTERVAL_MS {
                print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
                last_update = Instant::now();
            }
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to flush {}", dest.display()))?;

        if self.show_progress {
            print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
            println!();
        }
        debug!(url, bytes = downloaded, "download finished");

        Ok(())
    }
}

impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let temp_path = dest.with_extension("tmp");

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = calculate_retry_delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = MAX_RETRIES,
                    "retrying download of {url}"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.fetch(url, &temp_path).await {
                Ok(()) => {
                    tokio::fs::rename(&temp_path, dest).await.with_context(|| {
                        format!(
                            "Failed to rename {} to {}",
                            temp_path.display(),
                            dest.display()
                        )
                    })?;
                    return Ok(());
                }
                Err(e) => {
                    debug!(error = %e, "download attempt failed");
                    last_error = Some(e);
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("Download failed after {MAX_RETRIES} attempts")))
    }
}

#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn print_progress(downloaded: u64, total: u64, elapsed_secs: f64) {
    let percent = if total > 0 {
        (downloaded as f64 / total as f64 * 100.0) as u8
    } else {
        0
    };
    let speed = if elapsed_secs > 0.0 {
        downloaded as f64 / elapsed_secs
    } else {
        0.0
    };

    print!(
        "\r{}/{} ({percent}%) {}/s     ",
        format_bytes(downloaded),
        format_bytes(total),
        format_bytes(speed as u64)
    );
    let _ = std::io::stdout().flush();
}

/// Formats a byte count as B, KB, MB or GB.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Exponential backoff (1s, 2s, 4s) with +/- 25% jitter.
fn calculate_retry_delay(attempt: u32) -> u64 {
    let base_delay = BASE_RETRY_DELAY_MS * 2u64.pow(attempt);
    let jitter_range = base_delay / 4;
    let jitter = rand::rng().random_range(0..=jitter_range * 2);
    base_delay - jitter_range + jitter
}
