//! Humanise - Machine-Prose Humanisation Pipeline
//!
//! Rewrites machine-generated prose so it reads as human-written, in a
//! chosen register (sales/marketing or journalist/editorial), through a
//! bounded retrieve → rewrite → score loop.
//!
//! ## Core Features
//!
//! - **Exemplar Retrieval**: vector similarity search with curated fallback
//! - **Style Rewriting**: mode-specific prompts over Anthropic, OpenAI or Ollama
//! - **Quality Scoring**: burstiness, lexical diversity, contractions, AI markers
//!   and an optional LLM judgment combined into one score
//! - **Retry With Feedback**: each retry is told which metrics fell short
//!
//! ## Quick Start
//!
//! ```ignore
//! use humanise::{ConfigLoader, Mode, Orchestrator, TransformRequest};
//!
//! let config = ConfigLoader::load()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let request = TransformRequest::new(text, Mode::Sales);
//! let result = orchestrator.process(&request).await?;
//! println!("{} ({:.2})", result.output_text, result.quality_score);
//! ```
//!
//! ## Modules
//!
//! - [`metrics`]: pure text statistics
//! - [`retrieval`]: exemplar store, vector search, cache
//! - [`rewrite`]: style rewriter and output sanitation
//! - [`quality`]: composite scorer, judge, retry feedback
//! - [`pipeline`]: the orchestrator and its iteration state machine
//! - [`ai`]: LLM providers, prompt building, timeouts
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod retrieval;
pub mod rewrite;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, PipelineConfig, ScoringConfig};

// Error Types
pub use types::error::{ErrorCategory, HumaniseError, Result, ValidationError};

// Request / Response
pub use types::{Mode, TransformRequest, TransformResult};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use metrics::QualityMetrics;
pub use pipeline::{IterationRecord, Orchestrator, TerminalState, TransformOutcome};
pub use quality::{QualityAssessment, QualityJudge, QualityScorer};
pub use retrieval::{Exemplar, ExemplarStore, RetrievalSource};
pub use rewrite::{Rewriter, StyleRewriter};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{LlmProvider, LlmResponse, ProviderConfig, create_provider};
