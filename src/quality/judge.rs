//! External human-likeness judgment
//!
//! An optional capability: when the judge is absent or fails, the scorer
//! redistributes its weight instead of failing.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::ai::prompt::StyleTemplates;
use crate::ai::provider::{GenerationRequest, SharedProvider};
use crate::constants::scoring::JUDGE_MAX_CHARS;
use crate::types::{HumaniseError, Mode, Result};

/// Rating returned by a judge
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    /// Human-likeness in [0, 1]
    pub score: f64,
    /// Concrete suggestions for the next attempt
    pub feedback: Vec<String>,
}

#[async_trait]
pub trait QualityJudge: Send + Sync {
    async fn judge(&self, text: &str, mode: Mode) -> Result<Judgment>;
}

/// Judge backed by a generative model asked for a JSON verdict
///
/// The call deadline is enforced by `QualityScorer`.
pub struct LlmJudge {
    provider: SharedProvider,
}

impl LlmJudge {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    fn build_request(text: &str, mode: Mode) -> GenerationRequest {
        let excerpt = match text.char_indices().nth(JUDGE_MAX_CHARS) {
            Some((idx, _)) => &text[..idx],
            None => text,
        };
        GenerationRequest::new(
            StyleTemplates::judge_system(mode),
            format!("Text to evaluate:\n\n{}", excerpt),
        )
        .json()
    }
}

#[async_trait]
impl QualityJudge for LlmJudge {
    async fn judge(&self, text: &str, mode: Mode) -> Result<Judgment> {
        let request = Self::build_request(text, mode);
        let response = self.provider.generate(&request).await?;

        let judgment = parse_judgment(&response.content)?;
        debug!(
            provider = self.provider.name(),
            score = judgment.score,
            "Judge verdict"
        );
        Ok(judgment)
    }
}

/// Parse `{score, strengths, weaknesses, feedback}` from a model response
pub fn parse_judgment(content: &str) -> Result<Judgment> {
    let value = extract_json(content)?;

    let score = match value.get("score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| HumaniseError::generation("judge response has no numeric score"))?;

    if !(0.0..=1.0).contains(&score) {
        return Err(HumaniseError::generation(format!(
            "judge score {} outside [0, 1]",
            score
        )));
    }

    let mut feedback = string_list(value.get("feedback"));
    for weakness in string_list(value.get("weaknesses")) {
        if !feedback.contains(&weakness) {
            feedback.push(weakness);
        }
    }

    Ok(Judgment { score, feedback })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Extract a JSON object from a response that may be fenced or surrounded
/// by prose
fn extract_json(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim);
    if let Some(inner) = unfenced
        && let Ok(value) = serde_json::from_str::<Value>(inner)
    {
        return Ok(value);
    }

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(HumaniseError::generation("judge response contains no JSON object"));
    };
    if end <= start {
        return Err(HumaniseError::generation("judge response contains no JSON object"));
    }

    let candidate = &trimmed[start..=end];
    serde_json::from_str::<Value>(candidate)
        .or_else(|_| serde_json::from_str::<Value>(&strip_trailing_commas(candidate)))
        .map_err(|e| HumaniseError::generation(format!("judge response is not valid JSON: {}", e)))
}

/// Drop commas directly before a closing brace or bracket
fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = json.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ','
            && chars[i + 1..]
                .iter()
                .find(|n| !n.is_whitespace())
                .is_some_and(|n| matches!(n, '}' | ']'))
        {
            continue;
        }
        out.push(c);
    }
    out
}
