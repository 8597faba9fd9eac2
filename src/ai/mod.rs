//! AI Integration Layer
//!
//! Generation providers, prompt construction and call deadlines shared by the
//! rewriter, the quality judge and exemplar retrieval.

pub mod prompt;
pub mod provider;
pub mod timeout;

pub use prompt::{PromptBuilder, PromptSection, StyleTemplates};
pub use provider::{
    AnthropicProvider, ErrorCategory, ErrorClassifier, GenerationRequest, LlmError, LlmProvider,
    LlmResponse, OllamaProvider, OpenAiProvider, ProviderConfig, ResponseMetadata, ResponseTiming,
    SharedProvider, TokenUsage, create_provider,
};
pub use timeout::with_timeout;
