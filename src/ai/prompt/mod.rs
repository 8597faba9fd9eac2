//! Prompt Builder System
//!
//! Standardized prompt construction for generation and judgment calls.
//!
//! ## Design Principles
//!
//! 1. **Role Definition**: Clear role for each task
//! 2. **Structured Objectives**: Numbered goals
//! 3. **Context Sections**: Organized input data, in insertion order
//! 4. **Anti-Patterns**: Explicit things to avoid

mod style;

pub use style::StyleTemplates;

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Key-value pairs, rendered in insertion order
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Bulleted list with header
    List { header: String, items: Vec<String> },
    /// Things to avoid and things to do instead
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
    /// Custom section
    Custom(String),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add a context item, merging into the first context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        for section in &mut self.sections {
            if let PromptSection::Context(items) = section {
                items.push((key.to_string(), value.to_string()));
                return self;
            }
        }
        self.sections.push(PromptSection::Context(vec![(
            key.to_string(),
            value.to_string(),
        )]));
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add bulleted list; empty lists render nothing
    pub fn list(mut self, header: &str, items: Vec<String>) -> Self {
        if !items.is_empty() {
            self.sections.push(PromptSection::List {
                header: header.to_string(),
                items,
            });
        }
        self
    }

    /// Add anti-patterns section
    pub fn anti_patterns(mut self, bad: Vec<&str>, good: Vec<&str>) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.into_iter().map(String::from).collect(),
            good: good.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Add custom section
    pub fn custom(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Custom(content.to_string()));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("{}: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::List { header, items } => {
                    prompt.push_str(&format!("# {}\n\n", header));
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
                PromptSection::Custom(content) => {
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("copywriter", "sales copy")
            .objectives(vec!["Keep the message", "Sound human"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("expert copywriter specializing in sales copy"));
        assert!(prompt.contains("1. Keep the message"));
        assert!(prompt.contains("2. Sound human"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = PromptBuilder::new()
            .context_item("Mode", "sales")
            .context_item("Attempt", "2")
            .build();

        let mode = prompt.find("Mode: sales").unwrap();
        let attempt = prompt.find("Attempt: 2").unwrap();
        assert!(mode < attempt);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_empty_list_is_skipped() {
        let prompt = PromptBuilder::new()
            .list("Detected patterns", vec![])
            .section("Text", "body")
            .build();
        assert!(!prompt.contains("Detected patterns"));
        assert!(prompt.contains("# Text\n\nbody"));
    }

    #[test]
    fn test_anti_patterns() {
        let prompt = PromptBuilder::new()
            .anti_patterns(vec!["Moreover, ..."], vec!["Here's the thing."])
            .build();

        assert!(prompt.contains("WRONG: Moreover, ..."));
        assert!(prompt.contains("CORRECT: Here's the thing."));
    }
}
