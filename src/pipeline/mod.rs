//! Humanisation Orchestrator
//!
//! Composes the pipeline stages for a single request:
//!
//! ```text
//! validate ─▶ retrieve exemplars (once) ─▶ ┌─ rewrite ─▶ score ─┐
//!                                          │                    │ below threshold,
//!                                          └──── feedback ◀─────┘ attempts left
//! ```
//!
//! Iterations of one request are strictly sequential; distinct requests share
//! nothing mutable and run concurrently (`process_batch`).

mod state;

pub use state::{IterationLoop, IterationRecord, LoopOutcome, Step, TerminalState};

use futures::StreamExt;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::ai::provider::create_provider;
use crate::config::{Config, PipelineConfig};
use crate::metrics::detected_ai_patterns;
use crate::quality::{Feedback, LlmJudge, QualityScorer};
use crate::retrieval::{RetrievalSource, SharedExemplarStore, VectorExemplarStore};
use crate::rewrite::{RewriteRequest, Rewriter, StyleRewriter};
use crate::types::{HumaniseError, Result, TransformRequest, TransformResult};

/// Result plus the provenance of how it was reached
#[derive(Debug, Clone, Serialize)]
pub struct TransformOutcome {
    pub request_id: Uuid,
    pub result: TransformResult,
    /// Successful attempts in order
    pub records: Vec<IterationRecord>,
    /// Rewrite attempts including failed ones
    pub attempts: usize,
    /// Reasons for failed attempts
    pub failures: Vec<String>,
    pub terminal: TerminalState,
    pub retrieval: RetrievalSource,
}

pub struct Orchestrator {
    store: SharedExemplarStore,
    rewriter: Arc<dyn Rewriter>,
    scorer: QualityScorer,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        store: SharedExemplarStore,
        rewriter: Arc<dyn Rewriter>,
        scorer: QualityScorer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            rewriter,
            scorer,
            config,
        }
    }

    /// Wire up providers, retrieval and the judge from configuration
    ///
    /// A judge that cannot be constructed (e.g. missing API key) disables
    /// judgment instead of failing.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let store = VectorExemplarStore::from_config(&config.retrieval)?;
        let rewriter = Arc::new(StyleRewriter::from_config(&config.llm)?);

        let mut scorer = QualityScorer::new(config.scoring.clone());
        if config.pipeline.judge_enabled {
            let timeout = Duration::from_secs(config.judge.timeout_secs);
            match create_provider(&config.judge) {
                Ok(provider) => {
                    scorer = scorer.with_judge(Arc::new(LlmJudge::new(provider)), timeout);
                }
                Err(e) => warn!("Quality judge unavailable, scoring from text metrics only: {}", e),
            }
        }

        info!(
            provider = %config.llm.provider,
            judge = scorer.has_judge(),
            threshold = config.pipeline.quality_threshold,
            max_iterations = config.pipeline.max_iterations,
            "Orchestrator ready"
        );

        Ok(Self::new(store, rewriter, scorer, config.pipeline.clone()))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn process(&self, request: &TransformRequest) -> Result<TransformResult> {
        self.process_detailed(request).await.map(|o| o.result)
    }

    pub async fn process_detailed(&self, request: &TransformRequest) -> Result<TransformOutcome> {
        self.process_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run one request, stopping promptly once `cancel` fires
    pub async fn process_with_cancel(
        &self,
        request: &TransformRequest,
        cancel: &CancellationToken,
    ) -> Result<TransformOutcome> {
        request.validate(self.config.min_input_chars, self.config.max_input_chars)?;

        let request_id = Uuid::new_v4();
        let span = info_span!("transform", %request_id, mode = %request.mode);
        self.run(request_id, request, cancel).instrument(span).await
    }

    /// Independent requests with bounded concurrency; results keep input order
    pub async fn process_batch(
        &self,
        requests: Vec<TransformRequest>,
    ) -> Vec<Result<TransformResult>> {
        let concurrency = self.config.batch_concurrency.max(1);
        futures::stream::iter(requests)
            .map(|request| async move { self.process(&request).await })
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn run(
        &self,
        request_id: Uuid,
        request: &TransformRequest,
        cancel: &CancellationToken,
    ) -> Result<TransformOutcome> {
        let started = Instant::now();
        let mode = request.mode;
        let threshold = self.config.quality_threshold;

        let retrieval = cancellable(
            cancel,
            self.store
                .retrieve(mode, request.retrieval_query(), self.config.exemplar_count),
        )
        .await?;
        if let RetrievalSource::Fallback { reason } = &retrieval.source {
            warn!(%reason, "Exemplar retrieval degraded; using curated exemplars");
        }

        let detected = detected_ai_patterns(&request.input_text);
        debug!(
            exemplars = retrieval.exemplars.len(),
            ai_patterns = detected.len(),
            "Starting iterations"
        );

        let mut state = IterationLoop::new(self.config.max_iterations, threshold);
        let mut feedback: Option<Feedback> = None;

        while let Some(attempt) = state.next_attempt() {
            if cancel.is_cancelled() {
                info!(attempt, "Request cancelled");
                return Err(HumaniseError::Cancelled);
            }

            let rewrite = RewriteRequest {
                input_text: &request.input_text,
                mode,
                exemplars: &retrieval.exemplars,
                feedback: feedback.as_ref(),
                detected_patterns: &detected,
            };

            let output = match cancellable(cancel, self.rewriter.rewrite(rewrite)).await? {
                Ok(text) => text,
                Err(e) => {
                    warn!(attempt, error = %e, "Rewrite attempt failed");
                    state.record_failure(e.to_string());
                    continue;
                }
            };

            let assessment = cancellable(cancel, self.scorer.score(&output, mode)).await?;
            info!(
                attempt,
                score = assessment.quality_score,
                threshold,
                "Attempt scored"
            );

            let step = state.record_success(output, assessment.quality_score, assessment.metrics);
            if let Step::Stop(terminal) = step {
                debug!(terminal = terminal.name(), "Iteration loop finished");
                break;
            }

            if let Some(last) = state.records().last() {
                feedback = Some(Feedback::from_assessment(
                    &last.output_text,
                    &assessment,
                    &self.scorer.config().targets,
                    threshold,
                ));
            }
        }

        let outcome = state.finish().inspect_err(|e| {
            error!(error = %e, "No rewrite attempt succeeded");
        })?;

        let winner = outcome.winner;
        let result = TransformResult {
            output_text: winner.output_text,
            quality_score: winner.quality_score,
            iterations: outcome.records.len(),
            mode,
            processing_time_ms: started.elapsed().as_millis() as u64,
            metrics: winner.metrics,
        };

        info!(
            terminal = outcome.terminal.name(),
            score = result.quality_score,
            iterations = result.iterations,
            attempts = outcome.attempts,
            elapsed_ms = result.processing_time_ms,
            "Transform complete"
        );

        Ok(TransformOutcome {
            request_id,
            result,
            records: outcome.records,
            attempts: outcome.attempts,
            failures: outcome.failures,
            terminal: outcome.terminal,
            retrieval: retrieval.source,
        })
    }
}

/// Race `future` against cancellation
async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HumaniseError::Cancelled),
        output = future => Ok(output),
    }
}
