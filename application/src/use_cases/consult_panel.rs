//! Consult Panel use case
//!
//! Fans a task out to every routed agent role in parallel. Each agent
//! gets role-scoped knowledge retrieved from the shared corpus (through
//! the cache), a role preamble, and the task text. Transient call
//! failures are retried with exponential backoff; definitive failures
//! produce an error opinion immediately.

use crate::config::PanelSettings;
use crate::ports::model_gateway::{GatewayError, ModelGateway};
use crate::services::corpus_store::CorpusStore;
use crate::services::retrieval_cache::RetrievalCache;
use consilium_domain::{AgentOpinion, AgentRole, MovingAverage, RetrievalLimits, Task, select_chunks};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that can occur during panel execution
#[derive(Error, Debug)]
pub enum PanelError {
    /// Fewer opinions succeeded than the configured minimum. Carries the
    /// partial opinions so callers can still audit what happened.
    #[error("panel unavailable: {succeeded} of {required} required opinions")]
    Unavailable {
        succeeded: usize,
        required: usize,
        opinions: Vec<AgentOpinion>,
    },
}

/// Successful panel run: one opinion per routed role, in stable role
/// order regardless of completion order.
#[derive(Debug, Clone)]
pub struct PanelReport {
    pub opinions: Vec<AgentOpinion>,
    pub succeeded: usize,
}

/// Use case for consulting the agent panel
pub struct ConsultPanelUseCase<G: ModelGateway + 'static> {
    gateway: Arc<G>,
    corpus: Arc<CorpusStore>,
    cache: Arc<RetrievalCache>,
    settings: PanelSettings,
    limits: RetrievalLimits,
    latency: Mutex<BTreeMap<AgentRole, MovingAverage>>,
    retrieval_latency: Mutex<MovingAverage>,
}

impl<G: ModelGateway + 'static> ConsultPanelUseCase<G> {
    pub fn new(
        gateway: Arc<G>,
        corpus: Arc<CorpusStore>,
        cache: Arc<RetrievalCache>,
        settings: PanelSettings,
        limits: RetrievalLimits,
    ) -> Self {
        Self {
            gateway,
            corpus,
            cache,
            settings,
            limits,
            latency: Mutex::new(BTreeMap::new()),
            retrieval_latency: Mutex::new(MovingAverage::new(MovingAverage::DEFAULT_WINDOW)),
        }
    }

    /// Rolling mean call latency for one role, if it has been consulted.
    pub fn mean_latency_ms(&self, role: AgentRole) -> Option<f64> {
        let trackers = self.latency.lock().unwrap_or_else(|e| e.into_inner());
        trackers.get(&role).and_then(|t| t.average())
    }

    /// Rolling mean retrieval latency across all roles.
    pub fn mean_retrieval_latency_ms(&self) -> Option<f64> {
        self.retrieval_latency
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .average()
    }

    /// Consult every routed role in parallel.
    pub async fn execute(
        &self,
        task: &Task,
        roles: &[AgentRole],
    ) -> Result<PanelReport, PanelError> {
        info!(task_id = %task.id, roles = roles.len(), "consulting panel");

        let corpus = self.corpus.snapshot();
        let mut join_set = JoinSet::new();

        for &role in roles {
            let gateway = Arc::clone(&self.gateway);
            let settings = self.settings;
            let text = task.text.clone();

            // Retrieval is cheap and synchronous; do it before spawning
            // so every agent shares the same corpus snapshot.
            let retrieval_started = Instant::now();
            let key = self.cache.key(role, &text, corpus.version(), &self.limits);
            let retrieval = self.cache.get_or_insert_with(&key, || {
                select_chunks(role, corpus.chunks_for(role), &text, self.limits)
            });
            self.retrieval_latency
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .record(retrieval_started.elapsed().as_secs_f64() * 1_000.0);
            let prompt = build_prompt(role, &text, &retrieval.context_block());

            join_set.spawn(async move {
                call_with_retry(gateway.as_ref(), role, &prompt, &settings).await
            });
        }

        let total = roles.len();
        let mut opinions: Vec<AgentOpinion> = Vec::with_capacity(total);
        let mut succeeded = 0usize;

        while let Some(joined) = join_set.join_next().await {
            let opinion = match joined {
                Ok(opinion) => opinion,
                Err(e) => {
                    warn!("panel task join error: {e}");
                    continue;
                }
            };

            if opinion.error.is_none() {
                succeeded += 1;
                info!(role = %opinion.role, latency_ms = opinion.latency_ms, "agent responded");
            } else {
                warn!(role = %opinion.role, error = ?opinion.error, "agent failed");
            }
            self.record_latency(opinion.role, opinion.latency_ms);
            opinions.push(opinion);

            // Stop early once the minimum can no longer be reached.
            let remaining = total - opinions.len();
            if succeeded + remaining < self.settings.min_success {
                debug!("minimum success count unreachable, aborting panel");
                join_set.abort_all();
                break;
            }
        }

        for &role in roles {
            if !opinions.iter().any(|o| o.role == role) {
                opinions.push(AgentOpinion::failure(role, "panel aborted", 0));
            }
        }
        opinions.sort_by_key(|o| o.role);

        if succeeded < self.settings.min_success {
            return Err(PanelError::Unavailable {
                succeeded,
                required: self.settings.min_success,
                opinions,
            });
        }

        Ok(PanelReport { opinions, succeeded })
    }

    fn record_latency(&self, role: AgentRole, latency_ms: u64) {
        let mut trackers = self.latency.lock().unwrap_or_else(|e| e.into_inner());
        trackers
            .entry(role)
            .or_insert_with(|| MovingAverage::new(MovingAverage::DEFAULT_WINDOW))
            .record(latency_ms as f64);
    }
}

/// One agent call with deadline and transient-failure retry.
async fn call_with_retry<G: ModelGateway + ?Sized>(
    gateway: &G,
    role: AgentRole,
    prompt: &str,
    settings: &PanelSettings,
) -> AgentOpinion {
    let started = Instant::now();
    let mut attempt = 1u32;

    loop {
        let call = gateway.complete(role, prompt);
        let outcome = match tokio::time::timeout(settings.timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(format!(
                "{}ms deadline",
                settings.timeout_ms
            ))),
        };

        match outcome {
            Ok(text) => {
                return AgentOpinion::success(role, text, elapsed_ms(started));
            }
            Err(e) if e.is_transient() && attempt < settings.max_attempts => {
                debug!(%role, attempt, "transient failure, retrying: {e}");
                tokio::time::sleep(settings.backoff(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                return AgentOpinion::failure(role, e.to_string(), elapsed_ms(started));
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Assemble one agent's prompt: role framing, retrieved knowledge, task.
fn build_prompt(role: AgentRole, task_text: &str, context_block: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(role.prompt_preamble());
    prompt.push_str("\n\n");
    if !context_block.is_empty() {
        prompt.push_str("Relevant knowledge:\n");
        prompt.push_str(context_block);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Task:\n");
    prompt.push_str(task_text);
    prompt.push_str("\n\nEnd with your confidence as a number from 0 to 10.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use consilium_domain::NormalizationStrength;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedGateway {
        /// Transient failures to serve before succeeding, per call site.
        transient_before_success: u32,
        calls: AtomicU32,
    }

    impl ScriptedGateway {
        fn succeeding() -> Self {
            Self {
                transient_before_success: 0,
                calls: AtomicU32::new(0),
            }
        }

        fn flaky(failures: u32) -> Self {
            Self {
                transient_before_success: failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn complete(&self, role: AgentRole, _prompt: &str) -> Result<String, GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.transient_before_success {
                return Err(GatewayError::Server("backend overloaded".to_string()));
            }
            Ok(format!("{role} recommendation.\n\nConfidence: 8"))
        }
    }

    struct RefusingGateway;

    #[async_trait]
    impl ModelGateway for RefusingGateway {
        async fn complete(&self, _role: AgentRole, _prompt: &str) -> Result<String, GatewayError> {
            Err(GatewayError::Rejected("model denied the request".to_string()))
        }
    }

    fn use_case<G: ModelGateway + 'static>(gateway: G) -> ConsultPanelUseCase<G> {
        ConsultPanelUseCase::new(
            Arc::new(gateway),
            Arc::new(CorpusStore::empty()),
            Arc::new(RetrievalCache::new(16, NormalizationStrength::CaseFold)),
            PanelSettings {
                backoff_base_ms: 1,
                backoff_cap_ms: 5,
                ..PanelSettings::default()
            },
            RetrievalLimits::default(),
        )
    }

    fn task() -> Task {
        Task::new("Review the proposed jwt rotation change").unwrap()
    }

    #[tokio::test]
    async fn test_opinions_come_back_in_role_order() {
        let panel = use_case(ScriptedGateway::succeeding());
        let roles = [AgentRole::Qa, AgentRole::Dev, AgentRole::Security];

        let report = panel.execute(&task(), &roles).await.unwrap();

        let order: Vec<AgentRole> = report.opinions.iter().map(|o| o.role).collect();
        assert_eq!(order, vec![AgentRole::Dev, AgentRole::Security, AgentRole::Qa]);
        assert_eq!(report.succeeded, 3);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        // Two transient failures, then success: within the 3-attempt cap.
        let panel = use_case(ScriptedGateway::flaky(2));
        let report = panel.execute(&task(), &[AgentRole::Dev]).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert!(report.opinions[0].error.is_none());
    }

    #[tokio::test]
    async fn test_definitive_failure_is_not_retried() {
        let gateway = Arc::new(RefusingGateway);
        let panel = ConsultPanelUseCase::new(
            Arc::clone(&gateway),
            Arc::new(CorpusStore::empty()),
            Arc::new(RetrievalCache::new(16, NormalizationStrength::CaseFold)),
            PanelSettings::default(),
            RetrievalLimits::default(),
        );

        let err = panel.execute(&task(), &[AgentRole::Dev]).await.unwrap_err();
        let PanelError::Unavailable {
            succeeded,
            required,
            opinions,
        } = err;
        assert_eq!(succeeded, 0);
        assert_eq!(required, 1);
        assert_eq!(opinions.len(), 1);
        assert!(opinions[0].error.is_some());
    }

    #[tokio::test]
    async fn test_partial_failure_still_reports_all_roles() {
        struct HalfGateway;

        #[async_trait]
        impl ModelGateway for HalfGateway {
            async fn complete(
                &self,
                role: AgentRole,
                _prompt: &str,
            ) -> Result<String, GatewayError> {
                if role == AgentRole::Security {
                    Err(GatewayError::Connection("refused".to_string()))
                } else {
                    Ok("Looks fine.\n\nConfidence: 7".to_string())
                }
            }
        }

        let panel = use_case(HalfGateway);
        let roles = [AgentRole::Dev, AgentRole::Security];
        let report = panel.execute(&task(), &roles).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.opinions.len(), 2);
        let security = &report.opinions[1];
        assert_eq!(security.role, AgentRole::Security);
        assert!(security.error.is_some());
    }

    struct SelectiveGateway {
        failing: Vec<AgentRole>,
    }

    #[async_trait]
    impl ModelGateway for SelectiveGateway {
        async fn complete(&self, role: AgentRole, _prompt: &str) -> Result<String, GatewayError> {
            if self.failing.contains(&role) {
                Err(GatewayError::Rejected("quota exhausted".to_string()))
            } else {
                Ok(format!("{role} recommendation.\n\nConfidence: 8"))
            }
        }
    }

    fn strict_panel(failing: Vec<AgentRole>) -> ConsultPanelUseCase<SelectiveGateway> {
        ConsultPanelUseCase::new(
            Arc::new(SelectiveGateway { failing }),
            Arc::new(CorpusStore::empty()),
            Arc::new(RetrievalCache::new(16, NormalizationStrength::CaseFold)),
            PanelSettings {
                min_success: 2,
                ..PanelSettings::default()
            },
            RetrievalLimits::default(),
        )
    }

    #[tokio::test]
    async fn test_two_of_three_tolerates_one_failing_role() {
        let panel = strict_panel(vec![AgentRole::Qa]);
        let roles = [AgentRole::Dev, AgentRole::Security, AgentRole::Qa];

        let report = panel.execute(&task(), &roles).await.unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.opinions.len(), 3);
    }

    #[tokio::test]
    async fn test_two_of_three_fails_with_two_failing_roles() {
        let panel = strict_panel(vec![AgentRole::Security, AgentRole::Qa]);
        let roles = [AgentRole::Dev, AgentRole::Security, AgentRole::Qa];

        let err = panel.execute(&task(), &roles).await.unwrap_err();
        let PanelError::Unavailable {
            succeeded,
            required,
            opinions,
        } = err;
        assert!(succeeded < 2);
        assert_eq!(required, 2);
        assert_eq!(opinions.len(), 3, "every role must still be accounted for");
    }

    #[tokio::test]
    async fn test_retrieval_cache_is_hit_on_repeat_task() {
        let cache = Arc::new(RetrievalCache::new(16, NormalizationStrength::CaseFold));
        let panel = ConsultPanelUseCase::new(
            Arc::new(ScriptedGateway::succeeding()),
            Arc::new(CorpusStore::empty()),
            Arc::clone(&cache),
            PanelSettings::default(),
            RetrievalLimits::default(),
        );

        panel.execute(&task(), &[AgentRole::Dev]).await.unwrap();
        panel.execute(&task(), &[AgentRole::Dev]).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }
}
