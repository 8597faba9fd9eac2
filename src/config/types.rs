//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/humanise/) and project (.humanise/) level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::provider::ProviderConfig;
use crate::constants::{network, pipeline, retrieval, scoring};
use crate::types::{HumaniseError, Mode, Result};

const KNOWN_PROVIDERS: &[&str] = &["anthropic", "openai", "ollama"];

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Iteration loop settings
    pub pipeline: PipelineConfig,

    /// Composite quality score settings
    pub scoring: ScoringConfig,

    /// Rewriter provider settings
    pub llm: LlmConfig,

    /// External quality judge provider
    pub judge: ProviderConfig,

    /// Exemplar retrieval settings
    pub retrieval: RetrievalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            pipeline: PipelineConfig::default(),
            scoring: ScoringConfig::default(),
            llm: LlmConfig::default(),
            judge: ProviderConfig::judge_default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `HumaniseError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.scoring.validate()?;

        for (name, profile) in self.llm.profiles() {
            validate_profile(&name, &profile)?;
        }
        validate_profile("judge", &self.judge)?;

        if self.retrieval.enabled && self.retrieval.timeout_secs == 0 {
            return Err(config_error("retrieval.timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> HumaniseError {
    HumaniseError::Config(message.into())
}

fn validate_profile(name: &str, profile: &ProviderConfig) -> Result<()> {
    if !KNOWN_PROVIDERS.contains(&profile.provider.as_str()) {
        return Err(config_error(format!(
            "{}.provider must be one of {}, got '{}'",
            name,
            KNOWN_PROVIDERS.join(", "),
            profile.provider
        )));
    }
    if !(0.0..=2.0).contains(&profile.temperature) {
        return Err(config_error(format!(
            "{}.temperature must be between 0.0 and 2.0, got {}",
            name, profile.temperature
        )));
    }
    if profile.timeout_secs == 0 {
        return Err(config_error(format!(
            "{}.timeout_secs must be greater than 0",
            name
        )));
    }
    if profile.max_tokens == 0 {
        return Err(config_error(format!(
            "{}.max_tokens must be greater than 0",
            name
        )));
    }
    Ok(())
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum composite score to accept an iteration, in (0, 1]
    pub quality_threshold: f64,

    /// Upper bound on rewrite attempts per request
    pub max_iterations: usize,

    /// Exemplars requested from retrieval
    pub exemplar_count: usize,

    pub min_input_chars: usize,
    pub max_input_chars: usize,

    /// Ask the external judge for a human-likeness rating
    pub judge_enabled: bool,

    /// Concurrent requests in a batch
    pub batch_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quality_threshold: pipeline::DEFAULT_QUALITY_THRESHOLD,
            max_iterations: pipeline::DEFAULT_MAX_ITERATIONS,
            exemplar_count: pipeline::DEFAULT_EXEMPLAR_COUNT,
            min_input_chars: pipeline::MIN_INPUT_CHARS,
            max_input_chars: pipeline::MAX_INPUT_CHARS,
            judge_enabled: true,
            batch_concurrency: pipeline::DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.quality_threshold > 0.0 && self.quality_threshold <= 1.0) {
            return Err(config_error(format!(
                "pipeline.quality_threshold must be in (0, 1], got {}",
                self.quality_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(config_error("pipeline.max_iterations must be at least 1"));
        }
        if self.exemplar_count == 0 {
            return Err(config_error("pipeline.exemplar_count must be at least 1"));
        }
        if self.min_input_chars < pipeline::MIN_INPUT_CHARS {
            return Err(config_error(format!(
                "pipeline.min_input_chars must be at least {}, got {}",
                pipeline::MIN_INPUT_CHARS,
                self.min_input_chars
            )));
        }
        if self.min_input_chars > self.max_input_chars {
            return Err(config_error(format!(
                "pipeline input bounds are inconsistent: min {} > max {}",
                self.min_input_chars, self.max_input_chars
            )));
        }
        if self.batch_concurrency == 0 {
            return Err(config_error("pipeline.batch_concurrency must be at least 1"));
        }
        Ok(())
    }
}

// =============================================================================
// Scoring Configuration
// =============================================================================

/// Weights of the composite quality score; must sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub burstiness: f64,
    pub lexical_diversity: f64,
    pub contraction: f64,
    pub ai_patterns: f64,
    pub judgment: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        use scoring::weights;
        Self {
            burstiness: weights::BURSTINESS,
            lexical_diversity: weights::LEXICAL_DIVERSITY,
            contraction: weights::CONTRACTION,
            ai_patterns: weights::AI_PATTERNS,
            judgment: weights::JUDGMENT,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.burstiness
            + self.lexical_diversity
            + self.contraction
            + self.ai_patterns
            + self.judgment
    }

    pub fn validate(&self) -> Result<()> {
        let all = [
            ("burstiness", self.burstiness),
            ("lexical_diversity", self.lexical_diversity),
            ("contraction", self.contraction),
            ("ai_patterns", self.ai_patterns),
            ("judgment", self.judgment),
        ];
        for (name, weight) in all {
            if !weight.is_finite() || weight < 0.0 {
                return Err(config_error(format!(
                    "scoring.weights.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > scoring::WEIGHT_SUM_EPSILON {
            return Err(config_error(format!(
                "scoring.weights must sum to 1.0, got {:.6}",
                sum
            )));
        }
        Ok(())
    }
}

/// Metric targets used to describe shortfalls in retry feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricTargets {
    pub burstiness: f64,
    pub lexical_diversity: f64,
    pub contraction_ratio: f64,
}

impl Default for MetricTargets {
    fn default() -> Self {
        use scoring::targets;
        Self {
            burstiness: targets::BURSTINESS,
            lexical_diversity: targets::LEXICAL_DIVERSITY,
            contraction_ratio: targets::CONTRACTION_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,

    /// Std-dev of sentence lengths that maps to burstiness 1.0
    pub burstiness_scale: f64,

    /// Contraction ratio at which the contraction term saturates
    pub contraction_target: f64,

    pub targets: MetricTargets,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            burstiness_scale: scoring::BURSTINESS_SCALE,
            contraction_target: scoring::CONTRACTION_TARGET,
            targets: MetricTargets::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if !(self.burstiness_scale.is_finite() && self.burstiness_scale > 0.0) {
            return Err(config_error(format!(
                "scoring.burstiness_scale must be positive, got {}",
                self.burstiness_scale
            )));
        }
        if !(self.contraction_target.is_finite() && self.contraction_target > 0.0) {
            return Err(config_error(format!(
                "scoring.contraction_target must be positive, got {}",
                self.contraction_target
            )));
        }

        let targets = [
            ("burstiness", self.targets.burstiness),
            ("lexical_diversity", self.targets.lexical_diversity),
            ("contraction_ratio", self.targets.contraction_ratio),
        ];
        for (name, target) in targets {
            if !(0.0..=1.0).contains(&target) {
                return Err(config_error(format!(
                    "scoring.targets.{} must be in [0, 1], got {}",
                    name, target
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Rewriter provider settings with optional per-mode profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: anthropic, openai, ollama
    pub provider: String,

    /// Model name; adapter default when unset
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature
    pub temperature: f32,

    pub max_tokens: usize,

    /// Custom endpoint
    pub api_base: Option<String>,

    /// Full profile override for sales mode
    pub sales: Option<ProviderConfig>,

    /// Full profile override for journalist mode
    pub journalist: Option<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let base = ProviderConfig::default();
        Self {
            provider: base.provider,
            model: Some("claude-sonnet-4-20250514".to_string()),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: base.temperature,
            max_tokens: base.max_tokens,
            api_base: None,
            sales: None,
            journalist: None,
        }
    }
}

impl LlmConfig {
    /// Shared profile used by modes without an override
    pub fn base(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: None,
            api_base: self.api_base.clone(),
            max_tokens: self.max_tokens,
        }
    }

    /// Effective profile for `mode`
    pub fn profile(&self, mode: Mode) -> ProviderConfig {
        let override_profile = match mode {
            Mode::Sales => &self.sales,
            Mode::Journalist => &self.journalist,
        };
        override_profile.clone().unwrap_or_else(|| self.base())
    }

    /// Every configured profile with its config path
    fn profiles(&self) -> Vec<(String, ProviderConfig)> {
        let mut profiles = vec![("llm".to_string(), self.base())];
        if let Some(sales) = &self.sales {
            profiles.push(("llm.sales".to_string(), sales.clone()));
        }
        if let Some(journalist) = &self.journalist {
            profiles.push(("llm.journalist".to_string(), journalist.clone()));
        }
        profiles
    }
}

// =============================================================================
// Retrieval Configuration
// =============================================================================

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Query the vector service; curated exemplars only when false
    pub enabled: bool,

    /// Supabase project URL (falls back to SUPABASE_URL)
    pub url: Option<String>,

    /// Supabase key (falls back to SUPABASE_KEY); never serialized
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Similarity RPC name
    pub match_function: String,

    /// Table used for mode-filtered queries
    pub table: String,

    pub embedding_model: String,

    /// Custom embeddings endpoint
    pub embedding_api_base: Option<String>,

    /// Embeddings key (falls back to OPENAI_API_KEY); never serialized
    #[serde(skip_serializing)]
    pub embedding_api_key: Option<String>,

    pub timeout_secs: u64,

    /// Exemplar cache lifetime; 0 disables the cache
    pub cache_ttl_secs: u64,
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("match_function", &self.match_function)
            .field("table", &self.table)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_api_base", &self.embedding_api_base)
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            api_key: None,
            match_function: retrieval::MATCH_FUNCTION.to_string(),
            table: retrieval::CONTENT_TABLE.to_string(),
            embedding_model: retrieval::EMBEDDING_MODEL.to_string(),
            embedding_api_base: None,
            embedding_api_key: None,
            timeout_secs: retrieval::TIMEOUT_SECS,
            cache_ttl_secs: retrieval::CACHE_TTL_SECS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
