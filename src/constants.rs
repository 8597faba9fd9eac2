//! Global Constants
//!
//! Centralized defaults for the humanisation pipeline.
//! All magic numbers should be defined here with documentation.

/// Iteration controller defaults
pub mod pipeline {
    /// Minimum composite score accepted without another retry
    pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.75;

    /// Maximum rewrite attempts per request
    pub const DEFAULT_MAX_ITERATIONS: usize = 3;

    /// Exemplars requested from the store per request
    pub const DEFAULT_EXEMPLAR_COUNT: usize = 5;

    /// Exemplars actually embedded in the rewrite prompt
    pub const PROMPT_EXEMPLAR_LIMIT: usize = 3;

    /// Input length bounds (characters, after trimming)
    pub const MIN_INPUT_CHARS: usize = 20;
    pub const MAX_INPUT_CHARS: usize = 10_000;

    /// Concurrent requests for batch processing
    pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;
}

/// Quality scoring defaults
pub mod scoring {
    /// Std-dev (in words) that saturates burstiness at 1.0.
    /// A std-dev of ~10 words maps to 0.5.
    pub const BURSTINESS_SCALE: f64 = 20.0;

    /// Contraction ratio treated as "fully present"
    pub const CONTRACTION_TARGET: f64 = 0.03;

    /// Composite weights (must sum to 1.0)
    pub mod weights {
        pub const BURSTINESS: f64 = 0.30;
        pub const LEXICAL_DIVERSITY: f64 = 0.25;
        pub const CONTRACTION: f64 = 0.15;
        pub const AI_PATTERNS: f64 = 0.10;
        pub const JUDGMENT: f64 = 0.20;
    }

    /// Per-metric targets used to phrase retry feedback
    pub mod targets {
        pub const BURSTINESS: f64 = 0.5;
        pub const LEXICAL_DIVERSITY: f64 = 0.6;
        pub const CONTRACTION_RATIO: f64 = 0.02;
    }

    /// Tolerance when checking that weights sum to one
    pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

    /// Characters of output sent to the external judge
    pub const JUDGE_MAX_CHARS: usize = 2_000;
}

/// Retrieval defaults
pub mod retrieval {
    /// Supabase RPC performing the similarity match
    pub const MATCH_FUNCTION: &str = "match_human_content";

    /// Table holding indexed human-written content
    pub const CONTENT_TABLE: &str = "human_content";

    /// Embedding model used for query vectors
    pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

    /// Vector search / embedding timeout (seconds)
    pub const TIMEOUT_SECS: u64 = 15;

    /// Cache entry lifetime (seconds); 0 disables caching
    pub const CACHE_TTL_SECS: u64 = 600;
}

/// HTTP/Network constants
pub mod network {
    /// Default generation request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Judge request timeout (seconds)
    pub const JUDGE_TIMEOUT_SECS: u64 = 45;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
