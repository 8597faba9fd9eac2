//! Transform Command
//!
//! Humanise one text and print the result.
//!
//! Usage:
//!   humanise transform --mode sales --text "..."
//!   humanise transform --mode journalist --file draft.txt --json
//!   cat draft.txt | humanise transform --mode sales --detailed

use tokio_util::sync::CancellationToken;

use crate::cli::ui::Output;
use crate::cli::util::InputSource;
use crate::config::Config;
use crate::pipeline::{Orchestrator, TerminalState, TransformOutcome};
use crate::types::{Mode, Result, TransformRequest};

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub mode: Mode,
    pub input: InputSource,
    pub topic: Option<String>,
    pub threshold: Option<f64>,
    pub max_iterations: Option<usize>,
    pub no_judge: bool,
    pub json: bool,
    pub detailed: bool,
}

impl TransformOptions {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.pipeline.quality_threshold = threshold;
        }
        if let Some(max) = self.max_iterations {
            config.pipeline.max_iterations = max;
        }
        if self.no_judge {
            config.pipeline.judge_enabled = false;
        }
    }
}

pub async fn run(
    mut config: Config,
    options: TransformOptions,
    cancel: CancellationToken,
) -> Result<()> {
    options.apply(&mut config);
    let out = Output::quiet(options.json);

    let text = options.input.clone().read()?;
    let mut request = TransformRequest::new(text, options.mode);
    if let Some(topic) = &options.topic {
        request = request.with_topic_hint(topic.clone());
    }

    let orchestrator = Orchestrator::from_config(&config)?;
    out.info(&format!(
        "Humanising for {} (threshold {:.2}, up to {} iterations)",
        options.mode.display_name(),
        config.pipeline.quality_threshold,
        config.pipeline.max_iterations
    ));

    let outcome = orchestrator.process_with_cancel(&request, &cancel).await?;

    if options.json {
        let json = if options.detailed {
            serde_json::to_string_pretty(&outcome)?
        } else {
            serde_json::to_string_pretty(&outcome.result)?
        };
        println!("{}", json);
        return Ok(());
    }

    print_summary(&out, &outcome, config.pipeline.quality_threshold, options.detailed);
    println!("{}", outcome.result.output_text);
    Ok(())
}

fn print_summary(out: &Output, outcome: &TransformOutcome, threshold: f64, detailed: bool) {
    let result = &outcome.result;
    let plural = if result.iterations == 1 { "" } else { "s" };
    match outcome.terminal {
        TerminalState::Accepted => out.success(&format!(
            "Accepted after {} iteration{}",
            result.iterations, plural
        )),
        TerminalState::Exhausted => out.warning(&format!(
            "Threshold not reached; best of {} iteration{} returned",
            result.iterations, plural
        )),
    }
    if outcome.retrieval.is_degraded() {
        out.warning("Vector retrieval unavailable; curated exemplars were used");
    }

    out.section("Quality");
    out.field("Score", out.score(result.quality_score, threshold));
    out.field("Burstiness", format!("{:.2}", result.metrics.burstiness));
    out.field("Lexical diversity", format!("{:.2}", result.metrics.lexical_diversity));
    out.field("Contraction ratio", format!("{:.3}", result.metrics.contraction_ratio));
    out.field(
        "Words / sentences",
        format!("{} / {}", result.metrics.word_count, result.metrics.sentence_count),
    );
    out.field("Time", format!("{} ms", result.processing_time_ms));

    if detailed {
        out.section("Iterations");
        for record in &outcome.records {
            out.field(
                &format!("#{}", record.iteration_index),
                out.score(record.quality_score, threshold),
            );
        }
        for failure in &outcome.failures {
            out.warning(&format!("Failed attempt: {}", failure));
        }
        out.field("Request", outcome.request_id);
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TransformOptions {
        TransformOptions {
            mode: Mode::Sales,
            input: InputSource::Inline("Furthermore, our product offers exceptional value.".into()),
            topic: None,
            threshold: Some(0.6),
            max_iterations: Some(5),
            no_judge: true,
            json: true,
            detailed: false,
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = Config::default();
        options().apply(&mut config);
        assert_eq!(config.pipeline.quality_threshold, 0.6);
        assert_eq!(config.pipeline.max_iterations, 5);
        assert!(!config.pipeline.judge_enabled);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = Config::default();
        let opts = TransformOptions {
            threshold: None,
            max_iterations: None,
            no_judge: false,
            ..options()
        };
        opts.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_invalid_threshold_rejected_before_running() {
        let opts = TransformOptions {
            threshold: Some(1.5),
            ..options()
        };
        let err = run(Config::default(), opts, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "config_error");
    }
}
