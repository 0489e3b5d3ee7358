//! Clip acquisition with a content-addressed local cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Configuration for remote clip fetches.
#[derive(Debug, Clone)]
pub struct ClipAcquirerConfig {
    /// Optional HTTP proxy URL
    pub proxy: Option<String>,
    /// Connect timeout (short; servers answer fast or not at all)
    pub connect_timeout: Duration,
    /// Whole-request timeout (long; media files are large)
    pub request_timeout: Duration,
}

impl Default for ClipAcquirerConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(240),
        }
    }
}

impl ClipAcquirerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            proxy: std::env::var("CLIP_HTTP_PROXY").ok().filter(|p| !p.is_empty()),
            connect_timeout: Duration::from_secs(
                std::env::var("CLIP_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("CLIP_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(240),
            ),
        }
    }
}

/// Downloads clips into a validated, content-addressed cache.
///
/// The cache key hashes the locator with its query string stripped, so
/// signed-URL noise does not defeat caching. A file only lands under its
/// final cache name after probe validation, which makes re-acquiring a
/// cached clip a no-op and keeps concurrent writers safe (temp file +
/// atomic rename).
pub struct ClipAcquirer {
    http: Client,
    cache_dir: PathBuf,
}

impl ClipAcquirer {
    /// Create an acquirer writing into `cache_dir`.
    pub fn new(config: &ClipAcquirerConfig, cache_dir: impl AsRef<Path>) -> MediaResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| MediaError::transfer_failed(format!("bad proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| MediaError::transfer_failed(e.to_string()))?;

        Ok(Self {
            http,
            cache_dir: cache_dir.as_ref().to_path_buf(),
        })
    }

    /// Path a locator caches to, whether or not it exists yet.
    pub fn cache_path(&self, locator: &str) -> PathBuf {
        self.cache_dir.join(format!("vid-{}.mp4", cache_key(locator)))
    }

    /// Resolve a clip locator to a validated local file.
    ///
    /// Cache hits return immediately without network I/O. Misses are
    /// downloaded, probed (duration > 0 and fps > 0), and only then
    /// renamed into the cache; failures are recoverable per-candidate
    /// errors, never fatal to the task.
    pub async fn acquire(&self, locator: &str) -> MediaResult<PathBuf> {
        let target = self.cache_path(locator);

        if target.exists()
            && tokio::fs::metadata(&target).await.map(|m| m.len() > 0).unwrap_or(false)
        {
            debug!("Clip already cached: {}", target.display());
            return Ok(target);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let part = target.with_extension("mp4.part");
        if let Err(e) = self.download(locator, &part).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }

        // Validate before the file becomes visible under its cache name.
        match probe_video(&part).await {
            Ok(info) if info.is_decodable() => {}
            Ok(_) => {
                let _ = tokio::fs::remove_file(&part).await;
                warn!("Downloaded clip is not decodable: {}", locator);
                return Err(MediaError::invalid_media(format!(
                    "no duration or frame rate: {}",
                    locator
                )));
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                warn!("Probe failed for downloaded clip {}: {}", locator, e);
                return Err(MediaError::invalid_media(e.to_string()));
            }
        }

        tokio::fs::rename(&part, &target).await?;
        info!("Cached clip: {}", target.display());
        Ok(target)
    }

    async fn download(&self, locator: &str, dest: &Path) -> MediaResult<()> {
        debug!("Downloading clip: {}", locator);

        let response = self
            .http
            .get(locator)
            .send()
            .await
            .map_err(|e| MediaError::transfer_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::transfer_failed(format!(
                "{} returned {}",
                locator,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::transfer_failed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(MediaError::transfer_failed(format!("empty body: {}", locator)));
        }

        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

/// Content-stable cache key: SHA-256 of the locator with its query
/// string stripped, truncated to 16 hex chars.
pub fn cache_key(locator: &str) -> String {
    let stripped = match Url::parse(locator) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        // Not a URL; hash whatever was given, still dropping anything
        // after a '?'.
        Err(_) => locator.split('?').next().unwrap_or(locator).to_string(),
    };

    let digest = Sha256::digest(stripped.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cache_key_ignores_query_noise() {
        let a = cache_key("https://example.com/video/42?sig=abc&expires=1");
        let b = cache_key("https://example.com/video/42?sig=def&expires=2");
        let c = cache_key("https://example.com/video/43");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_cache_key_non_url() {
        assert_eq!(cache_key("foo?x=1"), cache_key("foo?y=2"));
    }

    #[tokio::test]
    async fn test_acquire_reports_transfer_failure_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let acquirer = ClipAcquirer::new(&ClipAcquirerConfig::default(), dir.path()).unwrap();

        let err = acquirer
            .acquire(&format!("{}/video/1", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::TransferFailed(_)));
        assert!(err.is_recoverable_acquire());
    }

    #[tokio::test]
    async fn test_acquire_deletes_undecodable_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a video".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let acquirer = ClipAcquirer::new(&ClipAcquirerConfig::default(), dir.path()).unwrap();

        let locator = format!("{}/video/2", server.uri());
        let err = acquirer.acquire(&locator).await.unwrap_err();
        assert!(err.is_recoverable_acquire());

        // Neither the partial nor the final cache file survives.
        let target = acquirer.cache_path(&locator);
        assert!(!target.exists());
        assert!(!target.with_extension("mp4.part").exists());
    }

    #[tokio::test]
    async fn test_acquire_cache_hit_skips_network() {
        let server = MockServer::start().await;
        // Zero expected requests: any GET would fail the mock server
        // verification on drop.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let acquirer = ClipAcquirer::new(&ClipAcquirerConfig::default(), dir.path()).unwrap();

        // Pre-seed the cache slot, as a previously validated acquire
        // would have; a URL differing only in query hits the same slot.
        let seeded = acquirer.cache_path(&format!("{}/video/3?sig=a", server.uri()));
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(&seeded, b"cached-bytes").unwrap();

        let got = acquirer
            .acquire(&format!("{}/video/3?sig=b", server.uri()))
            .await
            .unwrap();
        assert_eq!(got, seeded);
    }
}
