//! Style Rewriting
//!
//! Turns input text into the target mode's register, conditioned on
//! exemplars and, on retries, on feedback about the previous draft.

mod sanitize;

pub use sanitize::sanitize_output;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::ai::prompt::{PromptBuilder, StyleTemplates};
use crate::ai::provider::{GenerationRequest, SharedProvider, create_provider};
use crate::ai::timeout::with_timeout;
use crate::config::LlmConfig;
use crate::constants::pipeline::PROMPT_EXEMPLAR_LIMIT;
use crate::quality::Feedback;
use crate::retrieval::Exemplar;
use crate::types::{HumaniseError, Mode, Result};

/// Everything one rewrite attempt needs
#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    /// Original request text; retries still rewrite from this
    pub input_text: &'a str,
    pub mode: Mode,
    pub exemplars: &'a [Exemplar],
    pub feedback: Option<&'a Feedback>,
    /// AI markers found in the input
    pub detected_patterns: &'a [String],
}

/// Produces rewritten text
#[async_trait]
pub trait Rewriter: Send + Sync {
    /// Non-empty rewritten text, or `HumaniseError::Generation`
    async fn rewrite(&self, request: RewriteRequest<'_>) -> Result<String>;
}

/// A provider and the deadline for each call to it
struct Route {
    provider: SharedProvider,
    timeout: Duration,
}

/// Rewriter backed by an LLM provider, optionally one per mode
pub struct StyleRewriter {
    default: Route,
    per_mode: HashMap<Mode, Route>,
}

impl StyleRewriter {
    pub fn new(provider: SharedProvider, timeout: Duration) -> Self {
        Self {
            default: Route { provider, timeout },
            per_mode: HashMap::new(),
        }
    }

    pub fn with_mode_provider(
        mut self,
        mode: Mode,
        provider: SharedProvider,
        timeout: Duration,
    ) -> Self {
        self.per_mode.insert(mode, Route { provider, timeout });
        self
    }

    /// Build providers for the base profile and any per-mode overrides
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let base = config.base();
        let mut rewriter = Self::new(
            create_provider(&base)?,
            Duration::from_secs(base.timeout_secs),
        );

        for mode in Mode::ALL {
            let profile = config.profile(mode);
            if profile != base {
                rewriter = rewriter.with_mode_provider(
                    mode,
                    create_provider(&profile)?,
                    Duration::from_secs(profile.timeout_secs),
                );
            }
        }
        Ok(rewriter)
    }

    fn route(&self, mode: Mode) -> &Route {
        self.per_mode.get(&mode).unwrap_or(&self.default)
    }

    /// User prompt for one attempt
    pub fn build_prompt(request: &RewriteRequest<'_>) -> String {
        let examples = request
            .exemplars
            .iter()
            .take(PROMPT_EXEMPLAR_LIMIT)
            .enumerate()
            .map(|(i, e)| format!("Example {}:\n{}", i + 1, e.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut builder = PromptBuilder::new()
            .context_item("Target style", request.mode.display_name())
            .list(
                "AI patterns detected in the original (remove these)",
                request.detected_patterns.to_vec(),
            );

        if !examples.is_empty() {
            builder = builder.section("Human writing examples (match this style)", &examples);
        }

        if let Some(feedback) = request.feedback {
            builder = builder.section("Feedback on the previous attempt", &feedback.render());
        }

        builder
            .section("Text to transform", request.input_text.trim())
            .custom(
                "Rewrite the text above so it reads as if a person wrote it in the target style. \
                 Keep the meaning and every fact. Output only the rewritten text as plain prose.",
            )
            .build()
    }
}

#[async_trait]
impl Rewriter for StyleRewriter {
    async fn rewrite(&self, request: RewriteRequest<'_>) -> Result<String> {
        let route = self.route(request.mode);
        let provider = &route.provider;
        let generation = GenerationRequest::new(
            StyleTemplates::rewrite_system(request.mode),
            Self::build_prompt(&request),
        );

        debug!(
            provider = provider.name(),
            model = provider.model(),
            mode = %request.mode,
            retry = request.feedback.is_some(),
            "Requesting rewrite"
        );

        let response = with_timeout(route.timeout, provider.generate(&generation), "style rewrite")
            .await
            .map_err(|e| match e {
                HumaniseError::Generation(_) => e,
                other => HumaniseError::generation(format!(
                    "{} rewrite failed: {}",
                    provider.name(),
                    other
                )),
            })?;

        let text = sanitize_output(&response.content);
        if text.is_empty() {
            return Err(HumaniseError::generation(format!(
                "{} returned empty content",
                provider.name()
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmProvider, LlmResponse};
    use crate::config::MetricTargets;
    use crate::metrics::QualityMetrics;
    use crate::quality::QualityAssessment;
    use std::sync::{Arc, Mutex};

    /// Provider returning a fixed reply and recording the last request
    struct RecordingProvider {
        name: &'static str,
        reply: std::result::Result<String, String>,
        delay: Option<Duration>,
        last: Mutex<Option<GenerationRequest>>,
    }

    impl RecordingProvider {
        fn replying(name: &'static str, reply: &str) -> Self {
            Self {
                name,
                reply: Ok(reply.to_string()),
                delay: None,
                last: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
            *self.last.lock().unwrap() = Some(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(LlmResponse::content_only(text.clone())),
                Err(message) => Err(HumaniseError::Config(message.clone())),
            }
        }
        fn name(&self) -> &str {
            self.name
        }
        fn model(&self) -> &str {
            "test-model"
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn exemplars(n: usize) -> Vec<Exemplar> {
        (0..n)
            .map(|i| Exemplar {
                content: format!("Exemplar number {}.", i + 1),
                content_type: Mode::Sales,
                topic: None,
                similarity: 0.9,
            })
            .collect()
    }

    fn request<'a>(exemplars: &'a [Exemplar], patterns: &'a [String]) -> RewriteRequest<'a> {
        RewriteRequest {
            input_text: "Furthermore, it is important to note that our product offers exceptional value.",
            mode: Mode::Sales,
            exemplars,
            feedback: None,
            detected_patterns: patterns,
        }
    }

    #[test]
    fn test_prompt_contents() {
        let exemplars = exemplars(5);
        let patterns = vec!["furthermore".to_string()];
        let prompt = StyleRewriter::build_prompt(&request(&exemplars, &patterns));

        assert!(prompt.contains("Target style: Sales & Marketing"));
        assert!(prompt.contains("- furthermore"));
        assert!(prompt.contains("Example 3:"));
        assert!(!prompt.contains("Example 4:"));
        assert!(prompt.contains("our product offers exceptional value"));
        assert!(!prompt.contains("Feedback on the previous attempt"));
    }

    #[test]
    fn test_prompt_includes_feedback_and_keeps_original_input() {
        let exemplars = exemplars(1);
        let assessment = QualityAssessment {
            quality_score: 0.4,
            metrics: QualityMetrics::default(),
            ai_pattern_hits: 0,
            judgment: None,
        };
        let feedback = Feedback::from_assessment(
            "A flat previous draft.",
            &assessment,
            &MetricTargets::default(),
            0.75,
        );
        let mut req = request(&exemplars, &[]);
        req.feedback = Some(&feedback);

        let prompt = StyleRewriter::build_prompt(&req);
        assert!(prompt.contains("Feedback on the previous attempt"));
        assert!(prompt.contains("A flat previous draft."));
        assert!(prompt.contains("# Text to transform\n\nFurthermore, it is important"));
        assert!(!prompt.contains("AI patterns detected"));
    }

    #[tokio::test]
    async fn test_rewrite_sanitizes_output() {
        let provider = Arc::new(RecordingProvider::replying(
            "mock",
            "Here is the rewritten text:\n\n**Honestly?** You'll love it.",
        ));
        let rewriter = StyleRewriter::new(provider.clone(), Duration::from_secs(1));
        let exemplars = exemplars(2);

        let text = rewriter.rewrite(request(&exemplars, &[])).await.unwrap();
        assert_eq!(text, "Honestly? You'll love it.");

        let sent = provider.last.lock().unwrap().clone().unwrap();
        assert!(sent.system.contains("call to action"));
        assert!(!sent.json_output);
    }

    #[tokio::test]
    async fn test_empty_output_is_generation_error() {
        let rewriter = StyleRewriter::new(
            Arc::new(RecordingProvider::replying("mock", "```\n```")),
            Duration::from_secs(1),
        );
        let err = rewriter.rewrite(request(&[], &[])).await.unwrap_err();
        assert!(matches!(err, HumaniseError::Generation(_)));
    }

    #[tokio::test]
    async fn test_provider_error_and_timeout_are_generation_errors() {
        let failing = RecordingProvider {
            reply: Err("boom".to_string()),
            ..RecordingProvider::replying("failing", "")
        };
        let rewriter = StyleRewriter::new(Arc::new(failing), Duration::from_secs(1));
        let err = rewriter.rewrite(request(&[], &[])).await.unwrap_err();
        assert_eq!(err.kind(), "generation_error");

        let slow = RecordingProvider {
            delay: Some(Duration::from_secs(5)),
            ..RecordingProvider::replying("slow", "Too late.")
        };
        let rewriter = StyleRewriter::new(Arc::new(slow), Duration::from_millis(20));
        let err = rewriter.rewrite(request(&[], &[])).await.unwrap_err();
        assert!(matches!(err, HumaniseError::Generation(ref m) if m.contains("Timeout")));
    }

    #[tokio::test]
    async fn test_mode_specific_provider() {
        let sales = Arc::new(RecordingProvider::replying("sales", "Grab it now."));
        let default = Arc::new(RecordingProvider::replying("default", "The council met."));
        let rewriter = StyleRewriter::new(default.clone(), Duration::from_secs(1))
            .with_mode_provider(Mode::Sales, sales.clone(), Duration::from_secs(1));

        let text = rewriter.rewrite(request(&[], &[])).await.unwrap();
        assert_eq!(text, "Grab it now.");

        let mut journalist = request(&[], &[]);
        journalist.mode = Mode::Journalist;
        let text = rewriter.rewrite(journalist).await.unwrap();
        assert_eq!(text, "The council met.");
        assert!(sales.last.lock().unwrap().is_some());
        assert!(default.last.lock().unwrap().as_ref().unwrap().system.contains("journalist"));
    }

    #[tokio::test]
    async fn test_mode_profile_keeps_its_own_timeout() {
        let slow = |name| RecordingProvider {
            delay: Some(Duration::from_millis(200)),
            ..RecordingProvider::replying(name, "Worth the wait.")
        };
        let rewriter = StyleRewriter::new(Arc::new(slow("default")), Duration::from_secs(5))
            .with_mode_provider(Mode::Sales, Arc::new(slow("sales")), Duration::from_millis(20));

        let err = rewriter.rewrite(request(&[], &[])).await.unwrap_err();
        assert!(matches!(err, HumaniseError::Generation(ref m) if m.contains("Timeout")));

        let mut journalist = request(&[], &[]);
        journalist.mode = Mode::Journalist;
        assert_eq!(rewriter.rewrite(journalist).await.unwrap(), "Worth the wait.");
    }
}
