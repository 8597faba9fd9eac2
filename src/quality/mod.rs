//! Quality Scoring
//!
//! Combines text statistics and an optional external judgment into a single
//! score in [0, 1]:
//!
//! ```text
//! score = w_b * burstiness
//!       + w_l * lexical_diversity
//!       + w_c * min(1, contraction_ratio / contraction_target)
//!       + w_a * (1 - min(1, ai_hits / max(1, sentences)))
//!       + w_j * judgment
//! ```
//!
//! Without a judgment the local terms are divided by `1 - w_j`, which spreads
//! the judgment weight proportionally over them.

mod feedback;
mod judge;

pub use feedback::{Feedback, FeedbackMetric, MetricShortfall};
pub use judge::{Judgment, LlmJudge, QualityJudge, parse_judgment};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::timeout::with_timeout;
use crate::config::{ScoreWeights, ScoringConfig};
use crate::constants::scoring::WEIGHT_SUM_EPSILON;
use crate::metrics::{QualityMetrics, ai_pattern_hits};
use crate::types::Mode;

/// Score and measurements for one output text
#[derive(Debug, Clone, PartialEq)]
pub struct QualityAssessment {
    pub quality_score: f64,
    pub metrics: QualityMetrics,
    pub ai_pattern_hits: usize,
    /// `None` when the judge is disabled or failed
    pub judgment: Option<Judgment>,
}

pub struct QualityScorer {
    config: ScoringConfig,
    judge: Option<Arc<dyn QualityJudge>>,
    judge_timeout: Duration,
}

impl QualityScorer {
    /// Scorer using text statistics only
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            judge: None,
            judge_timeout: Duration::from_secs(crate::constants::network::JUDGE_TIMEOUT_SECS),
        }
    }

    pub fn with_judge(mut self, judge: Arc<dyn QualityJudge>, timeout: Duration) -> Self {
        self.judge = Some(judge);
        self.judge_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    /// Score `text`, consulting the judge when one is configured
    pub async fn score(&self, text: &str, mode: Mode) -> QualityAssessment {
        let judgment = match &self.judge {
            Some(judge) => {
                match with_timeout(self.judge_timeout, judge.judge(text, mode), "quality judgment")
                    .await
                {
                    Ok(judgment) => Some(judgment),
                    Err(e) => {
                        warn!(error = %e, "Judge unavailable; redistributing its weight");
                        None
                    }
                }
            }
            None => None,
        };

        self.assess(text, judgment)
    }

    /// Score `text` from statistics and an already obtained judgment
    pub fn assess(&self, text: &str, judgment: Option<Judgment>) -> QualityAssessment {
        let metrics = QualityMetrics::measure_with_scale(text, self.config.burstiness_scale);
        let hits = ai_pattern_hits(text);
        let quality_score = composite_score(
            &metrics,
            hits,
            judgment.as_ref().map(|j| j.score),
            &self.config.weights,
            self.config.contraction_target,
        );

        debug!(
            score = quality_score,
            burstiness = metrics.burstiness,
            lexical_diversity = metrics.lexical_diversity,
            contraction_ratio = metrics.contraction_ratio,
            ai_hits = hits,
            judged = judgment.is_some(),
            "Quality assessed"
        );

        QualityAssessment {
            quality_score,
            metrics,
            ai_pattern_hits: hits,
            judgment,
        }
    }
}

/// Weighted composite in [0, 1]; non-finite intermediate results score 0
pub fn composite_score(
    metrics: &QualityMetrics,
    ai_hits: usize,
    judgment: Option<f64>,
    weights: &ScoreWeights,
    contraction_target: f64,
) -> f64 {
    let contraction_presence = if contraction_target > 0.0 {
        (metrics.contraction_ratio / contraction_target).min(1.0)
    } else {
        0.0
    };
    let density = (ai_hits as f64 / metrics.sentence_count.max(1) as f64).min(1.0);
    let pattern_term = 1.0 - density;

    let local = weights.burstiness * metrics.burstiness
        + weights.lexical_diversity * metrics.lexical_diversity
        + weights.contraction * contraction_presence
        + weights.ai_patterns * pattern_term;

    let score = match judgment.filter(|j| j.is_finite()) {
        Some(j) => local + weights.judgment * j.clamp(0.0, 1.0),
        None => {
            let remaining = 1.0 - weights.judgment;
            if remaining > WEIGHT_SUM_EPSILON {
                local / remaining
            } else {
                (metrics.burstiness
                    + metrics.lexical_diversity
                    + contraction_presence
                    + pattern_term)
                    / 4.0
            }
        }
    };

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HumaniseError, Result};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn metrics(b: f64, ld: f64, cr: f64, sentences: usize) -> QualityMetrics {
        QualityMetrics {
            burstiness: b,
            lexical_diversity: ld,
            contraction_ratio: cr,
            word_count: sentences * 10,
            sentence_count: sentences,
        }
    }

    #[test]
    fn test_composite_with_judgment() {
        let m = metrics(0.5, 0.8, 0.03, 4);
        let score = composite_score(&m, 0, Some(0.9), &ScoreWeights::default(), 0.03);
        // 0.30*0.5 + 0.25*0.8 + 0.15*1 + 0.10*1 + 0.20*0.9
        assert!((score - 0.78).abs() < 1e-9);
    }

    #[test]
    fn test_redistribution_without_judgment() {
        let m = metrics(0.5, 0.8, 0.03, 4);
        let score = composite_score(&m, 0, None, &ScoreWeights::default(), 0.03);
        assert!((score - 0.60 / 0.80).abs() < 1e-9);
    }

    #[test]
    fn test_redistribution_is_proportional() {
        // All local terms at 1.0 must give 1.0 whether or not the judge answered
        let m = metrics(1.0, 1.0, 0.5, 3);
        let weights = ScoreWeights::default();
        assert!((composite_score(&m, 0, None, &weights, 0.03) - 1.0).abs() < 1e-9);
        assert!((composite_score(&m, 0, Some(1.0), &weights, 0.03) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_judgment_only_weights_fall_back_to_equal_terms() {
        let weights = ScoreWeights {
            burstiness: 0.0,
            lexical_diversity: 0.0,
            contraction: 0.0,
            ai_patterns: 0.0,
            judgment: 1.0,
        };
        let m = metrics(0.4, 0.8, 0.0, 2);
        let score = composite_score(&m, 0, None, &weights, 0.03);
        assert!((score - (0.4 + 0.8 + 0.0 + 1.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_ai_pattern_density_caps() {
        let m = metrics(0.0, 0.0, 0.0, 1);
        let weights = ScoreWeights {
            burstiness: 0.0,
            lexical_diversity: 0.0,
            contraction: 0.0,
            ai_patterns: 1.0,
            judgment: 0.0,
        };
        assert_eq!(composite_score(&m, 0, None, &weights, 0.03), 1.0);
        assert_eq!(composite_score(&m, 5, None, &weights, 0.03), 0.0);
    }

    #[test]
    fn test_non_finite_inputs_score_zero_or_clamp() {
        let m = metrics(f64::NAN, 0.5, 0.0, 2);
        assert_eq!(composite_score(&m, 0, None, &ScoreWeights::default(), 0.03), 0.0);

        let m = metrics(0.5, 0.5, 0.01, 2);
        let with_nan_judge = composite_score(&m, 0, Some(f64::NAN), &ScoreWeights::default(), 0.03);
        let without = composite_score(&m, 0, None, &ScoreWeights::default(), 0.03);
        assert_eq!(with_nan_judge, without);
    }

    #[test]
    fn test_assess_is_pure() {
        let scorer = QualityScorer::new(ScoringConfig::default());
        let text = "We cut prices. You'll love it, honestly, because nobody else comes close this season.";
        let first = scorer.assess(text, None);
        for _ in 0..10 {
            assert_eq!(scorer.assess(text, None), first);
        }
    }

    struct ScriptedJudge {
        result: Option<f64>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl QualityJudge for ScriptedJudge {
        async fn judge(&self, _text: &str, _mode: Mode) -> Result<Judgment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .map(|score| Judgment {
                    score,
                    feedback: vec![],
                })
                .ok_or_else(|| HumaniseError::generation("judge offline"))
        }
    }

    #[tokio::test]
    async fn test_failing_judge_redistributes() {
        let text = "Short one. Then a much longer sentence follows with plenty of different words in it.";
        let judge = Arc::new(ScriptedJudge {
            result: None,
            calls: AtomicU32::new(0),
        });
        let scorer = QualityScorer::new(ScoringConfig::default())
            .with_judge(judge.clone(), Duration::from_secs(1));

        let assessment = scorer.score(text, Mode::Sales).await;
        assert!(assessment.judgment.is_none());
        assert_eq!(assessment, scorer.assess(text, None));
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
    }

    struct StalledJudge;

    #[async_trait]
    impl QualityJudge for StalledJudge {
        async fn judge(&self, _text: &str, _mode: Mode) -> Result<Judgment> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Judgment {
                score: 1.0,
                feedback: vec![],
            })
        }
    }

    #[tokio::test]
    async fn test_judge_deadline_redistributes() {
        let text = "Short one. Then a much longer sentence follows with plenty of different words in it.";
        let scorer = QualityScorer::new(ScoringConfig::default())
            .with_judge(Arc::new(StalledJudge), Duration::from_millis(20));

        let assessment = scorer.score(text, Mode::Sales).await;
        assert!(assessment.judgment.is_none());
        assert_eq!(assessment, scorer.assess(text, None));
    }

    #[tokio::test]
    async fn test_judge_score_included() {
        let text = "Short one. Then a much longer sentence follows with plenty of different words in it.";
        let scorer = QualityScorer::new(ScoringConfig::default()).with_judge(
            Arc::new(ScriptedJudge {
                result: Some(1.0),
                calls: AtomicU32::new(0),
            }),
            Duration::from_secs(1),
        );

        let judged = scorer.score(text, Mode::Journalist).await;
        let local = scorer.assess(text, None);
        assert_eq!(judged.judgment.as_ref().map(|j| j.score), Some(1.0));
        assert!(judged.quality_score >= local.quality_score);
    }

    proptest! {
        #[test]
        fn prop_score_in_range(
            text in "\\PC{0,300}",
            judgment in proptest::option::of(-1.0f64..2.0),
        ) {
            let scorer = QualityScorer::new(ScoringConfig::default());
            let score = scorer
                .assess(&text, judgment.map(|score| Judgment { score, feedback: vec![] }))
                .quality_score;
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
