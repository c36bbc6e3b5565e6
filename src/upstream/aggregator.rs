//! Parallel fan-out over the dashboard sources.
//!
//! # Responsibilities
//! - Launch one fetch per configured source, all at once
//! - Join with all-or-nothing semantics: the first failure fails the whole
//! - Assemble the named `AggregatedResult`
//!
//! # Design Decisions
//! - Each fetch runs as its own Tokio task so slow upstreams never hold the
//!   connection tasks
//! - Results land in a fixed slot per source index; completion order is irrelevant
//! - On the first error the remaining tasks are aborted (best-effort)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upstream::fetcher::{FetchError, SourceFetcher};

/// One named upstream feeding the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Weather,
    Fact,
    Ip,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Weather, Source::Fact, Source::Ip];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Weather => "weather",
            Source::Fact => "fact",
            Source::Ip => "ip",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The combined dashboard, one value per source.
///
/// Serialized as-is for both the success body and the cache payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub weather: Value,
    pub fact: Value,
    pub ip: Value,
}

/// Aggregation failed; carries the first failure observed.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("{origin} source failed: {error}")]
    Source {
        origin: Source,
        #[source]
        error: FetchError,
    },

    #[error("{origin} fetch task did not complete: {reason}")]
    Task { origin: Source, reason: String },
}

/// Produces a fresh `AggregatedResult`.
#[async_trait]
pub trait Aggregator: Send + Sync {
    async fn aggregate(&self) -> Result<AggregatedResult, AggregationError>;
}

/// Fans out to the weather, fact and IP sources.
pub struct DashboardAggregator {
    fetcher: Arc<dyn SourceFetcher>,
    urls: [(Source, String); 3],
}

impl DashboardAggregator {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, config: &UpstreamConfig) -> Self {
        Self {
            fetcher,
            urls: [
                (Source::Weather, config.weather_url.clone()),
                (Source::Fact, config.fact_url.clone()),
                (Source::Ip, config.ip_url.clone()),
            ],
        }
    }

    async fn join_all(&self) -> Result<AggregatedResult, AggregationError> {
        let mut tasks = JoinSet::new();
        for (index, (source, url)) in self.urls.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let source = *source;
            let url = url.clone();
            tasks.spawn(async move { (index, source, fetcher.fetch(&url).await) });
        }

        let mut slots: [Option<Value>; 3] = [None, None, None];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(value))) => slots[index] = Some(value),
                Ok((_, origin, Err(error))) => {
                    tasks.abort_all();
                    return Err(AggregationError::Source { origin, error });
                }
                Err(join_error) => {
                    tasks.abort_all();
                    return Err(AggregationError::Task {
                        origin: self.first_missing(&slots),
                        reason: join_error.to_string(),
                    });
                }
            }
        }

        let origin = self.first_missing(&slots);
        match slots {
            [Some(weather), Some(fact), Some(ip)] => Ok(AggregatedResult { weather, fact, ip }),
            _ => Err(AggregationError::Task {
                origin,
                reason: "task finished without a result".to_string(),
            }),
        }
    }

    // A panicked task loses its index; attribute it to the first empty slot.
    fn first_missing(&self, slots: &[Option<Value>; 3]) -> Source {
        slots
            .iter()
            .position(Option::is_none)
            .map(|index| self.urls[index].0)
            .unwrap_or(Source::Weather)
    }
}

#[async_trait]
impl Aggregator for DashboardAggregator {
    async fn aggregate(&self) -> Result<AggregatedResult, AggregationError> {
        let started = Instant::now();
        tracing::info!("Starting dashboard aggregation");

        let result = self.join_all().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                metrics::record_aggregation("success", started);
                tracing::info!(elapsed_ms, "Dashboard aggregation completed");
            }
            Err(e) => {
                metrics::record_aggregation("failure", started);
                tracing::error!(elapsed_ms, error = %e, "Dashboard aggregation failed");
            }
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::resilience::retries::SendError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned values per URL; unknown URLs fail with a 503.
    struct MapFetcher {
        values: HashMap<String, Value>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
    }

    impl MapFetcher {
        fn new(values: &[(&str, Value)]) -> Self {
            Self {
                values: values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                delays: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl SourceFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.values.get(url).cloned().ok_or_else(|| {
                FetchError::Send(SendError::Status {
                    url: url.to_string(),
                    status: 503,
                    attempts: 3,
                })
            })
        }
    }

    fn config() -> UpstreamConfig {
        UpstreamConfig {
            weather_url: "http://weather.test".into(),
            fact_url: "http://fact.test".into(),
            ip_url: "http://ip.test".into(),
            ..UpstreamConfig::default()
        }
    }

    fn all_values() -> Vec<(&'static str, Value)> {
        vec![
            ("http://weather.test", serde_json::json!({"t": 5})),
            ("http://fact.test", serde_json::json!("x")),
            ("http://ip.test", serde_json::json!("1.2.3.4")),
        ]
    }

    #[tokio::test]
    async fn combines_every_source_by_name() {
        let fetcher = Arc::new(MapFetcher::new(&all_values()));
        let aggregator = DashboardAggregator::new(fetcher.clone(), &config());

        let result = aggregator.aggregate().await.unwrap();
        assert_eq!(result.weather, serde_json::json!({"t": 5}));
        assert_eq!(result.fact, serde_json::json!("x"));
        assert_eq!(result.ip, serde_json::json!("1.2.3.4"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn any_single_failure_fails_the_whole() {
        for missing in Source::ALL {
            let values: Vec<_> = all_values()
                .into_iter()
                .filter(|(url, _)| !url.contains(missing.name()))
                .collect();
            let aggregator = DashboardAggregator::new(Arc::new(MapFetcher::new(&values)), &config());

            match aggregator.aggregate().await {
                Err(AggregationError::Source { origin, .. }) => assert_eq!(origin, missing),
                other => panic!("expected failure from {}, got {:?}", missing, other.map(|_| ())),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fails_fast_without_waiting_for_slow_sources() {
        let values: Vec<_> = all_values()
            .into_iter()
            .filter(|(url, _)| !url.contains("ip"))
            .collect();
        let fetcher = MapFetcher::new(&values).with_delay("http://weather.test", Duration::from_secs(60));
        let aggregator = DashboardAggregator::new(Arc::new(fetcher), &config());

        let started = tokio::time::Instant::now();
        assert!(aggregator.aggregate().await.is_err());
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_run_concurrently() {
        let fetcher = MapFetcher::new(&all_values())
            .with_delay("http://weather.test", Duration::from_secs(1))
            .with_delay("http://fact.test", Duration::from_secs(1))
            .with_delay("http://ip.test", Duration::from_secs(1));
        let aggregator = DashboardAggregator::new(Arc::new(fetcher), &config());

        let started = tokio::time::Instant::now();
        aggregator.aggregate().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn serializes_with_source_names() {
        let result = AggregatedResult {
            weather: serde_json::json!({"t": 5}),
            fact: serde_json::json!("x"),
            ip: serde_json::json!("1.2.3.4"),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"weather": {"t": 5}, "fact": "x", "ip": "1.2.3.4"}));
    }
}
