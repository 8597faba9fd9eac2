//! Mode-specific instruction templates
//!
//! One template per `Mode`; the control flow that uses them is shared.

use super::PromptBuilder;
use crate::types::Mode;

/// Preset system instructions for rewriting and judging
pub struct StyleTemplates;

impl StyleTemplates {
    /// System instructions for the style rewriter
    pub fn rewrite_system(mode: Mode) -> String {
        let base = match mode {
            Mode::Sales => PromptBuilder::new()
                .role("human copywriter", "conversational sales and marketing copy")
                .objectives(vec![
                    "Rewrite the text so it reads like a person who genuinely likes the product wrote it",
                    "Vary sentence length hard: two-word punches, normal lines, the odd long run-on",
                    "Use contractions everywhere they sound natural (you'll, we're, that's, it's)",
                    "Lead with benefits over features and finish with a clear, direct call to action",
                    "Keep every factual claim from the original; add no new facts",
                ])
                .anti_patterns(
                    vec![
                        "Moreover, Furthermore, Additionally, In conclusion",
                        "Corporate buzzwords: innovative, cutting-edge, revolutionary, seamless",
                        "Uniform sentence and paragraph lengths",
                        "Overly polite, formal tone",
                    ],
                    vec![
                        "Here's the thing. You've been doing it the hard way.",
                        "Starting sentences with And, But, So when it flows",
                        "Rhetorical questions and direct address",
                    ],
                ),
            Mode::Journalist => PromptBuilder::new()
                .role("working journalist", "news and editorial writing")
                .objectives(vec![
                    "Rewrite the text as a reporter would file it, with natural rhythm",
                    "Mix short, punchy sentences with longer contextual ones",
                    "Prefer active voice and specific detail over vague generalities",
                    "Vary attribution verbs naturally (said, argued, noted, insisted)",
                    "Keep every factual claim from the original; add no new facts",
                ])
                .anti_patterns(
                    vec![
                        "Moreover, Furthermore, Additionally, In conclusion, However",
                        "Hedging: it seems, perhaps, one might, it could be argued",
                        "Formulaic structure: intro, three points, conclusion",
                        "Academic or corporate register",
                    ],
                    vec![
                        "The council voted yesterday. Nobody was surprised.",
                        "Leading with the most interesting angle",
                        "Skeptical but fair tone",
                    ],
                ),
        };

        base.section(
            "Formatting rules",
            "Output plain text only. No markdown, no bullet points, no headings, \
             no numbered lists. Use ordinary paragraph breaks. \
             Output ONLY the rewritten text, with no preamble or explanation.",
        )
        .build()
    }

    /// System instructions for the external human-likeness judge
    pub fn judge_system(mode: Mode) -> String {
        PromptBuilder::new()
            .role(
                "editor",
                "telling human writing apart from machine-generated text",
            )
            .objectives(vec![
                "Rate how human the text reads on a scale from 0.0 to 1.0",
                "Check for varied sentence structure and natural flow",
                "Check for leftover AI patterns: stock transitions, hedging, formal tone",
                "Check for authentic voice, contractions and colloquial phrasing",
            ])
            .context_item("Target style", mode.display_name())
            .section(
                "Scoring guide",
                "0.9-1.0 indistinguishable from human writing\n\
                 0.75-0.89 good, minor AI patterns remain\n\
                 0.6-0.74 adequate, noticeable AI characteristics\n\
                 below 0.6 needs significant work",
            )
            .section(
                "Response format",
                "Respond ONLY with JSON: {\"score\": number, \"strengths\": [string], \
                 \"weaknesses\": [string], \"feedback\": [string]}",
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_templates_differ_by_mode() {
        let sales = StyleTemplates::rewrite_system(Mode::Sales);
        let journalist = StyleTemplates::rewrite_system(Mode::Journalist);

        assert!(sales.contains("call to action"));
        assert!(journalist.contains("attribution verbs"));
        assert_ne!(sales, journalist);
        assert!(sales.contains("plain text only"));
        assert!(journalist.contains("plain text only"));
    }

    #[test]
    fn test_judge_template_requests_json() {
        let prompt = StyleTemplates::judge_system(Mode::Journalist);
        assert!(prompt.contains("\"score\""));
        assert!(prompt.contains("Journalist & Editorial"));
    }
}
