// src/services/fetch.rs

//! HTTP fetching: the client seam and bounded concurrent batch retrieval
//! with whole-batch retry on transient transport failures.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// Text-over-HTTP source. The trait seam lets batch logic and resolution
/// chains run against canned responses in tests.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Fetch a URL and return its body as text.
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// Production fetcher backed by a shared reqwest client.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client with the configured User-Agent and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlFetcher for HttpClient {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().await.map_err(classify)
    }
}

/// Map retryable reqwest failures (timeouts, connection resets, bodies
/// cut off mid-transfer) into the transient class; everything else keeps
/// its HTTP error form.
fn classify(err: reqwest::Error) -> Error {
    let transport_only = err.status().is_none() && (err.is_body() || err.is_request());
    if err.is_timeout() || err.is_connect() || transport_only {
        Error::TransientTransport(err.to_string())
    } else {
        Error::Http(err)
    }
}

/// Bounded concurrent fetching over a [`UrlFetcher`].
///
/// Batches are atomic with respect to transient transport failures: if
/// any URL in an attempt fails transiently, the attempt's partial results
/// are discarded and the whole batch is retried, up to the retry budget.
/// Results are keyed by URL, so callers correlate them independently of
/// completion order.
pub struct BatchFetcher<'a> {
    fetcher: &'a dyn UrlFetcher,
    concurrency: usize,
    retry_budget: usize,
}

impl<'a> BatchFetcher<'a> {
    pub fn new(fetcher: &'a dyn UrlFetcher, concurrency: usize, retry_budget: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            retry_budget: retry_budget.max(1),
        }
    }

    async fn attempt(&self, urls: &[String]) -> HashMap<String, Result<String>> {
        stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let result = self.fetcher.get_text(&url).await;
                (url, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    /// Fetch every URL, keeping non-transient failures per-URL for the
    /// caller to interpret. Exhausting the retry budget on transient
    /// failures surfaces the last such failure.
    pub async fn fetch_batch_lenient(
        &self,
        urls: &[String],
    ) -> Result<HashMap<String, Result<String>>> {
        let mut last_transient = String::new();
        for attempt in 1..=self.retry_budget {
            let results = self.attempt(urls).await;
            let transient = results.values().find_map(|r| match r {
                Err(e) if e.is_transient() => Some(e.to_string()),
                _ => None,
            });
            match transient {
                None => return Ok(results),
                Some(message) => {
                    log::warn!(
                        "Transient failure on batch attempt {attempt}/{}: {message}",
                        self.retry_budget
                    );
                    last_transient = message;
                }
            }
        }
        Err(Error::TransientTransport(format!(
            "batch of {} URL(s) failed after {} attempt(s): {last_transient}",
            urls.len(),
            self.retry_budget
        )))
    }

    /// Strict variant: any failure, of any kind, aborts the batch.
    pub async fn fetch_batch(&self, urls: &[String]) -> Result<HashMap<String, String>> {
        let results = self.fetch_batch_lenient(urls).await?;
        let mut bodies = HashMap::with_capacity(results.len());
        for (url, result) in results {
            bodies.insert(url, result?);
        }
        Ok(bodies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails each URL transiently a configured number of times, then
    /// succeeds. Counts every attempt.
    struct FlakyFetcher {
        failures: Mutex<HashMap<String, usize>>,
        attempts: Mutex<HashMap<String, usize>>,
    }

    impl FlakyFetcher {
        fn new(failures: &[(&str, usize)]) -> Self {
            Self {
                failures: Mutex::new(
                    failures
                        .iter()
                        .map(|(url, n)| (url.to_string(), *n))
                        .collect(),
                ),
                attempts: Mutex::new(HashMap::new()),
            }
        }

        fn attempts_for(&self, url: &str) -> usize {
            self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl UrlFetcher for FlakyFetcher {
        async fn get_text(&self, url: &str) -> Result<String> {
            *self
                .attempts
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default() += 1;
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(url) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    Err(Error::TransientTransport("connection reset".into()))
                }
                _ => Ok(format!("body of {url}")),
            }
        }
    }

    /// Always answers 404.
    struct MissingFetcher;

    #[async_trait]
    impl UrlFetcher for MissingFetcher {
        async fn get_text(&self, url: &str) -> Result<String> {
            Err(Error::Status {
                status: 404,
                url: url.to_string(),
            })
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://example.com/{i}")).collect()
    }

    #[tokio::test]
    async fn test_transient_failure_retries_whole_batch() {
        let batch = urls(5);
        let fetcher = FlakyFetcher::new(&[(&batch[1], 1), (&batch[3], 1)]);
        let results = BatchFetcher::new(&fetcher, 4, 3)
            .fetch_batch(&batch)
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[&batch[3]], format!("body of {}", batch[3]));
        // The healthy URLs were re-fetched alongside the flaky ones.
        for url in &batch {
            assert_eq!(fetcher.attempts_for(url), 2);
        }
    }

    #[tokio::test]
    async fn test_budget_exhaustion_surfaces_transient_error() {
        let batch = urls(2);
        let fetcher = FlakyFetcher::new(&[(&batch[0], 10)]);
        let err = BatchFetcher::new(&fetcher, 2, 3)
            .fetch_batch_lenient(&batch)
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(fetcher.attempts_for(&batch[0]), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failures_do_not_retry() {
        let batch = urls(3);
        let fetcher = MissingFetcher;
        let results = BatchFetcher::new(&fetcher, 2, 3)
            .fetch_batch_lenient(&batch)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(
            results
                .values()
                .all(|r| matches!(r, Err(Error::Status { status: 404, .. })))
        );
        // Strict variant propagates the failure.
        assert!(BatchFetcher::new(&fetcher, 2, 3).fetch_batch(&batch).await.is_err());
    }
}
