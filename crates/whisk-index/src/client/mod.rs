//! HTTP index client with connection pooling and retry logic.
//!
//! Indexes are consulted in priority order: the primary first, then any
//! extra indexes. A project document found on an earlier index wins; a
//! 404 falls through to the next index.

use reqwest::{Client, ClientBuilder};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use whisk_core::error::WhiskError;
use whisk_core::types::PackageName;

use crate::api::{DistFile, ProjectMetadata};
use crate::cache::MetadataCache;
use crate::IndexResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// HTTP client over a prioritized list of package indexes
#[derive(Debug, Clone)]
pub struct IndexClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Index base URLs in priority order (primary first)
    index_urls: Vec<String>,
    /// In-process project document cache
    metadata_cache: Arc<MetadataCache>,
}

impl IndexClient {
    /// Create a client for a primary index plus optional extras
    pub fn new(index_url: String, extra_index_urls: Vec<String>) -> IndexResult<Self> {
        let mut index_urls = vec![index_url];
        index_urls.extend(extra_index_urls);
        Self::with_config(index_urls, RetryConfig::default(), Arc::new(MetadataCache::new()))
    }

    /// Create a client with explicit retry and cache configuration
    pub fn with_config(
        index_urls: Vec<String>,
        retry_config: RetryConfig,
        metadata_cache: Arc<MetadataCache>,
    ) -> IndexResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(Duration::from_secs(30))
            // Enable gzip compression
            .gzip(true)
            // User agent
            .user_agent("whisk/0.1.0")
            .build()
            .map_err(|e| WhiskError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            retry_config,
            index_urls,
            metadata_cache,
        })
    }

    /// Execute an HTTP operation with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> IndexResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = IndexResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // 404s and digest mismatches never get better by retrying
                    let retryable = error.is_recoverable();
                    last_error = Some(error);

                    if attempt == self.retry_config.max_retries || !retryable {
                        break;
                    }

                    tokio::time::sleep(delay).await;

                    // Exponential backoff
                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
            }
        }

        Err(last_error.unwrap_or_else(|| WhiskError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// Fetch a project document, consulting indexes in priority order.
    /// Returns `PackageNotFound` only when every index misses.
    pub async fn fetch_project(&self, name: &PackageName) -> IndexResult<ProjectMetadata> {
        for base_url in &self.index_urls {
            let cache_key = format!("{}#{}", base_url, name);
            if let Some(cached) = self.metadata_cache.get(&cache_key) {
                return Ok(cached);
            }

            match self.fetch_from(base_url, name).await {
                Ok(metadata) => {
                    self.metadata_cache.insert(cache_key, metadata.clone());
                    return Ok(metadata);
                },
                Err(WhiskError::PackageNotFound { .. }) => continue,
                Err(other) => return Err(other),
            }
        }

        Err(WhiskError::PackageNotFound {
            name: name.to_string(),
        })
    }

    async fn fetch_from(&self, base_url: &str, name: &PackageName) -> IndexResult<ProjectMetadata> {
        let url = format!("{}/{}/json", base_url.trim_end_matches('/'), name);

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| WhiskError::Network {
                    message: format!("Failed to fetch project metadata: {}", e),
                    source: Some(Box::new(e)),
                })?;

            match response.status() {
                reqwest::StatusCode::OK => {
                    response
                        .json::<ProjectMetadata>()
                        .await
                        .map_err(|e| WhiskError::Network {
                            message: format!("Failed to parse project metadata: {}", e),
                            source: Some(Box::new(e)),
                        })
                },
                reqwest::StatusCode::NOT_FOUND => Err(WhiskError::PackageNotFound {
                    name: name.to_string(),
                }),
                status => Err(WhiskError::Network {
                    message: format!("Index returned status {} for {}", status, name),
                    source: None,
                }),
            }
        })
        .await
    }

    /// Download a distribution file, verifying its digest when present
    pub async fn download(&self, file: &DistFile) -> IndexResult<Vec<u8>> {
        self.with_retry(|| async {
            let response =
                self.client
                    .get(&file.url)
                    .send()
                    .await
                    .map_err(|e| WhiskError::Network {
                        message: format!("Failed to download {}: {}", file.filename, e),
                        source: Some(Box::new(e)),
                    })?;

            if !response.status().is_success() {
                return Err(WhiskError::Network {
                    message: format!(
                        "Failed to download {}: {}",
                        file.filename,
                        response.status()
                    ),
                    source: None,
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| WhiskError::Network {
                    message: format!("Failed to read {}: {}", file.filename, e),
                    source: Some(Box::new(e)),
                })?
                .to_vec();

            self.verify_digest(&bytes, file)?;

            Ok(bytes)
        })
        .await
    }

    /// Verify downloaded content against the index-provided sha256
    fn verify_digest(&self, bytes: &[u8], file: &DistFile) -> IndexResult<()> {
        let Some(expected) = &file.digests.sha256 else {
            return Ok(());
        };

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let computed = hex::encode(hasher.finalize());

        if &computed != expected {
            return Err(WhiskError::IntegrityFailure {
                package: file.filename.clone(),
                expected: expected.clone(),
                actual: computed,
            });
        }

        Ok(())
    }
}
