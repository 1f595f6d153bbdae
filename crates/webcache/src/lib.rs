//! Cached JSON fetches for Steam store data.
//!
//! A fetch is served from a JSON file in the cache folder when caching is
//! enabled and the file exists; otherwise the request runs and its result
//! is written there for next time.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Popular tags, as listed by the store.
pub const TAGS_URL: &str = "https://store.steampowered.com/tagdata/populartags/english";

/// Timeout for store requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from cached fetches.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(e: reqwest::Error) -> Self {
        CacheError::Http(e.to_string())
    }
}

/// Where a fetch is cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDescriptor {
    /// Serve from the cache file when it exists.
    pub enabled: bool,
    /// Folder the cache file lives in. Without one nothing is written.
    pub folder: Option<PathBuf>,
    /// File name inside `folder`.
    pub file: String,
}

impl CacheDescriptor {
    pub fn new(enabled: bool, folder: Option<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            enabled,
            folder,
            file: file.into(),
        }
    }

    /// A descriptor whose file name is derived from the request URL.
    pub fn for_url(enabled: bool, folder: Option<PathBuf>, url: &str) -> Self {
        Self::new(enabled, folder, format!("{}.json", hash_url(url)))
    }

    /// Full path of the cache file, if a folder is set.
    pub fn path(&self) -> Option<PathBuf> {
        self.folder
            .as_ref()
            .filter(|_| !self.file.is_empty())
            .map(|folder| folder.join(&self.file))
    }
}

/// One popular tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub tagid: u32,
    pub name: String,
}

/// Returns cached data, or runs `request` and caches what it returns.
///
/// The cache is read only when `force_refresh` is false and the descriptor is
/// enabled. A fresh result is written whenever the descriptor has a folder,
/// creating it if needed.
pub async fn fetch_with_cache<T, F, Fut>(
    request: F,
    force_refresh: bool,
    cache: &CacheDescriptor,
) -> Result<T, CacheError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, CacheError>>,
{
    let path = cache.path();

    if !force_refresh
        && cache.enabled
        && let Some(path) = &path
        && tokio::fs::try_exists(path).await.unwrap_or(false)
    {
        let content = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), "served from cache");
        return Ok(serde_json::from_str(&content)?);
    }

    let data = request().await?;

    if let Some(path) = &path {
        write_cache(path, &data).await?;
    }

    Ok(data)
}

async fn write_cache<T: Serialize>(path: &Path, data: &T) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(data)?;
    tokio::fs::write(path, json).await?;
    debug!(path = %path.display(), "cache written");
    Ok(())
}

/// Fetches the popular tag list through the cache.
///
/// Only `enabled` and `folder` of `cache` are used; the file is `tags.json`.
pub async fn request_tags(
    client: &reqwest::Client,
    force_refresh: bool,
    cache: &CacheDescriptor,
) -> Result<Vec<Tag>, CacheError> {
    let cache = CacheDescriptor {
        file: "tags.json".into(),
        ..cache.clone()
    };
    let tags: Vec<Tag> = fetch_with_cache(
        move || async move {
            let resp = client
                .get(TAGS_URL)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, CacheError>(resp.json::<Vec<Tag>>().await?)
        },
        force_refresh,
        &cache,
    )
    .await?;

    info!(count = tags.len(), "tags loaded");
    Ok(tags)
}

/// Creates a deterministic file name from a URL.
///
/// Uses the first 16 bytes of SHA-256 (32 hex characters).
pub fn hash_url(url: &str) -> String {
    let hash = Sha256::digest(url.as_bytes());
    hex::encode(&hash[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tags() -> Vec<Tag> {
        vec![
            Tag {
                tagid: 19,
                name: "Action".into(),
            },
            Tag {
                tagid: 492,
                name: "Indie".into(),
            },
        ]
    }

    #[tokio::test]
    async fn writes_then_serves_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDescriptor::new(true, Some(dir.path().join("cache")), "tags.json");
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..2 {
            let got: Vec<Tag> = fetch_with_cache(
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(tags())
                },
                false,
                &cache,
            )
            .await
            .unwrap();
            assert_eq!(got, tags());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("cache").join("tags.json").exists());
    }

    #[tokio::test]
    async fn force_refresh_skips_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDescriptor::new(true, Some(dir.path().to_path_buf()), "tags.json");
        std::fs::write(dir.path().join("tags.json"), "[]").unwrap();

        let got: Vec<Tag> = fetch_with_cache(|| async { Ok(tags()) }, true, &cache)
            .await
            .unwrap();
        assert_eq!(got, tags());

        let written = std::fs::read_to_string(dir.path().join("tags.json")).unwrap();
        assert!(written.contains("Indie"));
    }

    #[tokio::test]
    async fn disabled_cache_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tags.json"), "[]").unwrap();
        let cache = CacheDescriptor::new(false, Some(dir.path().to_path_buf()), "tags.json");

        let got: Vec<Tag> = fetch_with_cache(|| async { Ok(tags()) }, false, &cache)
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
    }

    #[tokio::test]
    async fn request_errors_propagate() {
        let cache = CacheDescriptor::default();
        let err = fetch_with_cache::<Vec<Tag>, _, _>(
            || async { Err(CacheError::Http("503".into())) },
            false,
            &cache,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CacheError::Http(_)));
    }

    #[test]
    fn url_hash_is_stable() {
        let a = hash_url(TAGS_URL);
        assert_eq!(a.len(), 32);
        assert_eq!(a, hash_url(TAGS_URL));
        assert_ne!(a, hash_url("https://example.com/other"));
        let d = CacheDescriptor::for_url(true, Some(PathBuf::from("/c")), TAGS_URL);
        assert_eq!(d.path(), Some(PathBuf::from(format!("/c/{a}.json"))));
    }
}
