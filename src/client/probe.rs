//! Debounced resource-existence probing
//!
//! Link fields in the portal's editors are validated against the outside
//! world while the user types. Each keystroke submits the current input;
//! nothing runs until the input has been quiet for the configured period,
//! and only the final value is ever probed. A probe is a single async
//! operation with a definite outcome and an explicit timeout budget.
//!
//! Supersession is by sequence number, not literal cancellation: a prior
//! submission simply discovers it is stale when it wakes and discards its
//! own result.

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Definite outcome of an existence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The resource responded and exists
    Exists,
    /// The resource responded and does not exist (or refused)
    Absent,
    /// No definite answer within the timeout budget
    TimedOut,
}

/// Something that can check whether an external resource exists
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceProber: Send + Sync {
    /// Check whether the resource named by `target` exists
    async fn probe(&self, target: &str) -> ProbeOutcome;
}

/// Probes a URL's existence with an HTTP HEAD request
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Create a prober whose individual requests time out after `timeout`
    ///
    /// The [`Debouncer`] budget is enforced separately; this per-request
    /// timeout just keeps hung connections from pinning resources.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

#[async_trait]
impl ResourceProber for HttpProber {
    async fn probe(&self, target: &str) -> ProbeOutcome {
        match self.client.head(target).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Exists,
            Ok(_) => ProbeOutcome::Absent,
            Err(err) if err.is_timeout() => ProbeOutcome::TimedOut,
            Err(_) => ProbeOutcome::Absent,
        }
    }
}

/// Debounces probe submissions over a quiet period
///
/// Only the latest submission survives: earlier ones resolve to `None`
/// once they notice a newer sequence number, whether they are still
/// waiting out the quiet period or already probing.
pub struct Debouncer {
    prober: Arc<dyn ResourceProber>,
    quiet: Duration,
    budget: Duration,
    seq: Arc<AtomicU64>,
}

impl Debouncer {
    /// Create a debouncer
    ///
    /// # Arguments
    ///
    /// * `prober` - The probe implementation to run after the quiet period
    /// * `quiet` - How long the input must stay unchanged before probing
    /// * `budget` - Timeout budget for the probe itself
    pub fn new(prober: Arc<dyn ResourceProber>, quiet: Duration, budget: Duration) -> Self {
        Self {
            prober,
            quiet,
            budget,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Debouncer over an [`HttpProber`], configured from the probe section
    pub fn for_link_validation(config: &crate::config::ProbeConfig) -> Self {
        let budget = Duration::from_millis(config.timeout_ms);
        Self::new(
            Arc::new(HttpProber::new(budget)),
            Duration::from_millis(config.quiet_ms),
            budget,
        )
    }

    /// Submit the current input value
    ///
    /// Returns a future the caller drives (or spawns). It resolves to
    /// `Some(outcome)` only if this submission was still the latest when
    /// the quiet period elapsed and when the probe finished; superseded
    /// submissions resolve to `None`.
    pub fn submit(&self, target: impl Into<String>) -> impl Future<Output = Option<ProbeOutcome>> {
        let target = target.into();
        let my_seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let seq = Arc::clone(&self.seq);
        let prober = Arc::clone(&self.prober);
        let quiet = self.quiet;
        let budget = self.budget;

        async move {
            tokio::time::sleep(quiet).await;
            if seq.load(Ordering::SeqCst) != my_seq {
                return None;
            }

            let outcome = match tokio::time::timeout(budget, prober.probe(&target)).await {
                Ok(outcome) => outcome,
                Err(_) => ProbeOutcome::TimedOut,
            };

            // A newer submission may have arrived while the probe ran.
            if seq.load(Ordering::SeqCst) != my_seq {
                return None;
            }

            Some(outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    const QUIET: Duration = Duration::from_millis(300);
    const BUDGET: Duration = Duration::from_secs(2);

    /// Prober that records every target it is asked about
    struct RecordingProber {
        calls: Mutex<Vec<String>>,
        outcome: ProbeOutcome,
    }

    impl RecordingProber {
        fn new(outcome: ProbeOutcome) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceProber for RecordingProber {
        async fn probe(&self, target: &str) -> ProbeOutcome {
            self.calls.lock().unwrap().push(target.to_string());
            self.outcome
        }
    }

    /// Prober that takes a fixed amount of (virtual) time to answer
    struct SlowProber {
        delay: Duration,
    }

    #[async_trait]
    impl ResourceProber for SlowProber {
        async fn probe(&self, _target: &str) -> ProbeOutcome {
            tokio::time::sleep(self.delay).await;
            ProbeOutcome::Exists
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_inputs_trigger_exactly_one_probe() {
        let prober = RecordingProber::new(ProbeOutcome::Exists);
        let debouncer = Debouncer::new(
            Arc::clone(&prober) as Arc<dyn ResourceProber>,
            QUIET,
            BUDGET,
        );

        let first = tokio::spawn(debouncer.submit("a"));
        let second = tokio::spawn(debouncer.submit("ab"));
        let third = tokio::spawn(debouncer.submit("abc"));

        assert_eq!(first.await.expect("join failed"), None);
        assert_eq!(second.await.expect("join failed"), None);
        assert_eq!(
            third.await.expect("join failed"),
            Some(ProbeOutcome::Exists)
        );

        assert_eq!(prober.calls(), vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_submission_probes_after_quiet_period() {
        let prober = RecordingProber::new(ProbeOutcome::Absent);
        let debouncer = Debouncer::new(
            Arc::clone(&prober) as Arc<dyn ResourceProber>,
            QUIET,
            BUDGET,
        );

        let outcome = debouncer.submit("https://example.com/chat/123").await;

        assert_eq!(outcome, Some(ProbeOutcome::Absent));
        assert_eq!(prober.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_exceeding_budget_times_out() {
        let prober = Arc::new(SlowProber {
            delay: BUDGET + Duration::from_secs(1),
        });
        let debouncer = Debouncer::new(prober as Arc<dyn ResourceProber>, QUIET, BUDGET);

        let outcome = debouncer.submit("slow-resource").await;

        assert_eq!(outcome, Some(ProbeOutcome::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_superseded_mid_probe_is_discarded() {
        let prober = Arc::new(SlowProber {
            delay: Duration::from_millis(500),
        });
        let debouncer = Debouncer::new(prober as Arc<dyn ResourceProber>, QUIET, BUDGET);

        let first = tokio::spawn(debouncer.submit("first"));
        // Let the first submission clear its quiet period and start probing.
        tokio::time::sleep(QUIET + Duration::from_millis(100)).await;

        let second = tokio::spawn(debouncer.submit("second"));

        assert_eq!(first.await.expect("join failed"), None);
        assert_eq!(
            second.await.expect("join failed"),
            Some(ProbeOutcome::Exists)
        );
    }

    #[test]
    fn test_for_link_validation_reads_config() {
        let config = crate::config::ProbeConfig::default();
        let debouncer = Debouncer::for_link_validation(&config);
        assert_eq!(debouncer.quiet, Duration::from_millis(config.quiet_ms));
        assert_eq!(debouncer.budget, Duration::from_millis(config.timeout_ms));
    }

    #[tokio::test]
    async fn test_http_prober_maps_status_to_outcome() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/present"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5));
        assert_eq!(
            prober.probe(&format!("{}/present", server.uri())).await,
            ProbeOutcome::Exists
        );
        assert_eq!(
            prober.probe(&format!("{}/missing", server.uri())).await,
            ProbeOutcome::Absent
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_prober_sees_final_input_only() {
        let mut mock = MockResourceProber::new();
        mock.expect_probe()
            .with(eq("abc"))
            .times(1)
            .returning(|_| ProbeOutcome::Exists);

        let debouncer = Debouncer::new(Arc::new(mock) as Arc<dyn ResourceProber>, QUIET, BUDGET);

        let first = tokio::spawn(debouncer.submit("a"));
        let second = tokio::spawn(debouncer.submit("ab"));
        let third = tokio::spawn(debouncer.submit("abc"));

        assert_eq!(first.await.expect("join failed"), None);
        assert_eq!(second.await.expect("join failed"), None);
        assert_eq!(
            third.await.expect("join failed"),
            Some(ProbeOutcome::Exists)
        );
    }
}
