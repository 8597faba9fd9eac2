//! Iteration state machine
//!
//! Bounded retry loop with an accumulator of the best record seen. Pure and
//! synchronous: the orchestrator performs the external calls and feeds the
//! outcomes in.
//!
//! ```text
//!            success, score >= threshold
//!   Running ─────────────────────────────▶ Accepted
//!      │  ▲
//!      │  │ success below threshold / failure, attempts left
//!      └──┘
//!      │ attempts exhausted
//!      ▼
//!   Exhausted  (best record, or PipelineError if none)
//! ```

use serde::Serialize;

use crate::metrics::QualityMetrics;
use crate::types::{HumaniseError, Result};

/// Terminal state of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalState {
    Accepted,
    Exhausted,
}

impl TerminalState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Exhausted => "exhausted",
        }
    }
}

/// One successful attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based attempt number that produced this record
    pub iteration_index: usize,
    pub output_text: String,
    pub quality_score: f64,
    pub metrics: QualityMetrics,
}

/// What the loop does after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(TerminalState),
}

/// Finished loop: the winning record plus provenance
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub winner: IterationRecord,
    pub records: Vec<IterationRecord>,
    pub attempts: usize,
    pub failures: Vec<String>,
    pub terminal: TerminalState,
}

#[derive(Debug)]
pub struct IterationLoop {
    max_iterations: usize,
    threshold: f64,
    attempts: usize,
    records: Vec<IterationRecord>,
    failures: Vec<String>,
    best: Option<usize>,
    terminal: Option<TerminalState>,
}

impl IterationLoop {
    pub fn new(max_iterations: usize, threshold: f64) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            threshold,
            attempts: 0,
            records: Vec::new(),
            failures: Vec::new(),
            best: None,
            terminal: None,
        }
    }

    /// Number of the next attempt, or `None` once terminal
    pub fn next_attempt(&self) -> Option<usize> {
        if self.terminal.is_some() || self.attempts >= self.max_iterations {
            None
        } else {
            Some(self.attempts + 1)
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn best(&self) -> Option<&IterationRecord> {
        self.best.map(|i| &self.records[i])
    }

    /// A rewrite attempt failed
    pub fn record_failure(&mut self, reason: impl Into<String>) -> Step {
        self.attempts += 1;
        self.failures.push(reason.into());
        self.after_attempt()
    }

    /// A rewrite attempt succeeded and was scored
    pub fn record_success(
        &mut self,
        output_text: String,
        quality_score: f64,
        metrics: QualityMetrics,
    ) -> Step {
        self.attempts += 1;
        self.records.push(IterationRecord {
            iteration_index: self.attempts,
            output_text,
            quality_score,
            metrics,
        });

        let index = self.records.len() - 1;
        // Strictly greater: the earliest of equal scores wins
        if self
            .best()
            .is_none_or(|best| quality_score > best.quality_score)
        {
            self.best = Some(index);
        }

        if quality_score >= self.threshold {
            self.best = Some(index);
            self.terminal = Some(TerminalState::Accepted);
            return Step::Stop(TerminalState::Accepted);
        }
        self.after_attempt()
    }

    fn after_attempt(&mut self) -> Step {
        if self.attempts >= self.max_iterations {
            self.terminal = Some(TerminalState::Exhausted);
            Step::Stop(TerminalState::Exhausted)
        } else {
            Step::Continue
        }
    }

    /// Winning record and provenance; `PipelineError` if no attempt succeeded
    pub fn finish(self) -> Result<LoopOutcome> {
        let Some(best) = self.best else {
            let message = self
                .failures
                .last()
                .cloned()
                .unwrap_or_else(|| "no rewrite attempt was made".to_string());
            return Err(HumaniseError::Pipeline {
                attempts: self.attempts,
                message,
            });
        };

        Ok(LoopOutcome {
            winner: self.records[best].clone(),
            terminal: self.terminal.unwrap_or(TerminalState::Exhausted),
            records: self.records,
            attempts: self.attempts,
            failures: self.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(scores: &[Option<f64>], max: usize, threshold: f64) -> Result<LoopOutcome> {
        let mut state = IterationLoop::new(max, threshold);
        for (i, score) in scores.iter().enumerate() {
            assert_eq!(state.next_attempt(), Some(i + 1));
            let step = match score {
                Some(s) => {
                    state.record_success(format!("draft {}", i + 1), *s, QualityMetrics::default())
                }
                None => state.record_failure("provider down"),
            };
            if let Step::Stop(_) = step {
                break;
            }
        }
        state.finish()
    }

    #[test]
    fn test_exhaustion_prefers_earliest_max() {
        let outcome = run(&[Some(0.5), Some(0.7), Some(0.7)], 3, 0.8).unwrap();
        assert_eq!(outcome.terminal, TerminalState::Exhausted);
        assert_eq!(outcome.winner.output_text, "draft 2");
        assert_eq!(outcome.winner.iteration_index, 2);
        assert_eq!(outcome.records.len(), 3);
    }

    #[test]
    fn test_accepts_at_first_passing_attempt() {
        let outcome = run(&[Some(0.5), Some(0.8), Some(0.95)], 3, 0.75).unwrap();
        assert_eq!(outcome.terminal, TerminalState::Accepted);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.winner.output_text, "draft 2");
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let outcome = run(&[Some(0.75)], 3, 0.75).unwrap();
        assert_eq!(outcome.terminal, TerminalState::Accepted);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn test_failures_consume_attempts() {
        let outcome = run(&[None, Some(0.6), None], 3, 0.75).unwrap();
        assert_eq!(outcome.terminal, TerminalState::Exhausted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.winner.iteration_index, 2);
    }

    #[test]
    fn test_all_failures_is_pipeline_error() {
        let err = run(&[None, None, None], 3, 0.75).unwrap_err();
        match err {
            HumaniseError::Pipeline { attempts, message } => {
                assert_eq!(attempts, 3);
                assert_eq!(message, "provider down");
            }
            other => panic!("expected pipeline error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_attempts_after_terminal() {
        let mut state = IterationLoop::new(3, 0.5);
        state.record_success("ok".to_string(), 0.9, QualityMetrics::default());
        assert_eq!(state.next_attempt(), None);
    }

    proptest! {
        #[test]
        fn prop_iterations_bounded_and_winner_is_max(
            scores in proptest::collection::vec(proptest::option::of(0.0f64..=1.0), 1..8),
            max in 1usize..6,
            threshold in 0.01f64..=1.0,
        ) {
            let mut state = IterationLoop::new(max, threshold);
            let mut iter = scores.iter().cycle();
            while state.next_attempt().is_some() {
                match iter.next().copied().flatten() {
                    Some(s) => state.record_success(String::new(), s, QualityMetrics::default()),
                    None => state.record_failure("x"),
                };
            }
            prop_assert!(state.attempts() <= max);

            if let Ok(outcome) = state.finish() {
                prop_assert!(!outcome.records.is_empty());
                prop_assert!(outcome.records.len() <= max);
                let top = outcome
                    .records
                    .iter()
                    .map(|r| r.quality_score)
                    .fold(f64::MIN, f64::max);
                match outcome.terminal {
                    TerminalState::Accepted => {
                        prop_assert!(outcome.winner.quality_score >= threshold);
                        let last = outcome.records.last().unwrap();
                        prop_assert_eq!(outcome.winner.iteration_index, last.iteration_index);
                    }
                    TerminalState::Exhausted => {
                        prop_assert_eq!(outcome.winner.quality_score, top);
                    }
                }
            }
        }
    }
}
