//! Retry feedback
//!
//! Describes which metrics of a rejected draft fell short and by how much,
//! so the next rewrite can target them.

use std::fmt;

use super::QualityAssessment;
use crate::config::MetricTargets;
use crate::metrics::detected_ai_patterns;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackMetric {
    Burstiness,
    LexicalDiversity,
    ContractionRatio,
}

impl FeedbackMetric {
    fn guidance(&self) -> &'static str {
        match self {
            FeedbackMetric::Burstiness => {
                "vary sentence length much more: mix very short sentences with long, flowing ones"
            }
            FeedbackMetric::LexicalDiversity => {
                "use a wider vocabulary and avoid repeating the same words"
            }
            FeedbackMetric::ContractionRatio => {
                "use more contractions where they sound natural (you're, it's, don't, we'll)"
            }
        }
    }
}

impl fmt::Display for FeedbackMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedbackMetric::Burstiness => "burstiness",
            FeedbackMetric::LexicalDiversity => "lexical diversity",
            FeedbackMetric::ContractionRatio => "contraction ratio",
        })
    }
}

/// One metric below its target
#[derive(Debug, Clone, PartialEq)]
pub struct MetricShortfall {
    pub metric: FeedbackMetric,
    pub actual: f64,
    pub target: f64,
}

impl MetricShortfall {
    pub fn gap(&self) -> f64 {
        self.target - self.actual
    }
}

/// Structured feedback handed to the rewriter on a retry
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    /// Draft that was rejected
    pub previous_output: String,
    pub quality_score: f64,
    pub threshold: f64,
    pub shortfalls: Vec<MetricShortfall>,
    /// AI markers still present in the draft
    pub ai_patterns: Vec<String>,
    /// Suggestions from the external judge
    pub notes: Vec<String>,
}

impl Feedback {
    pub fn from_assessment(
        output: &str,
        assessment: &QualityAssessment,
        targets: &MetricTargets,
        threshold: f64,
    ) -> Self {
        let metrics = &assessment.metrics;
        let shortfalls = [
            (FeedbackMetric::Burstiness, metrics.burstiness, targets.burstiness),
            (
                FeedbackMetric::LexicalDiversity,
                metrics.lexical_diversity,
                targets.lexical_diversity,
            ),
            (
                FeedbackMetric::ContractionRatio,
                metrics.contraction_ratio,
                targets.contraction_ratio,
            ),
        ]
        .into_iter()
        .filter(|(_, actual, target)| actual < target)
        .map(|(metric, actual, target)| MetricShortfall {
            metric,
            actual,
            target,
        })
        .collect();

        Self {
            previous_output: output.to_string(),
            quality_score: assessment.quality_score,
            threshold,
            shortfalls,
            ai_patterns: detected_ai_patterns(output),
            notes: assessment
                .judgment
                .as_ref()
                .map(|j| j.feedback.clone())
                .unwrap_or_default(),
        }
    }

    /// Plain-text rendering for the rewrite prompt
    pub fn render(&self) -> String {
        let mut out = format!(
            "The previous attempt scored {:.2}; it needs at least {:.2}.\n",
            self.quality_score, self.threshold
        );

        if !self.shortfalls.is_empty() {
            out.push_str("\nFell short on:\n");
            for s in &self.shortfalls {
                out.push_str(&format!(
                    "- {} {:.2} (target {:.2}): {}\n",
                    s.metric,
                    s.actual,
                    s.target,
                    s.metric.guidance()
                ));
            }
        }

        if !self.ai_patterns.is_empty() {
            out.push_str(&format!(
                "\nAI patterns still present, remove them: {}\n",
                self.ai_patterns.join(", ")
            ));
        }

        if !self.notes.is_empty() {
            out.push_str("\nReviewer notes:\n");
            for note in &self.notes {
                out.push_str(&format!("- {}\n", note));
            }
        }

        out.push_str("\nPrevious draft:\n");
        out.push_str(&self.previous_output);
        out
    }
}
