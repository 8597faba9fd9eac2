use console::style;

/// Styled terminal messages; informational lines go to stderr so stdout
/// carries only the transformed text or JSON
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn section(&self, message: &str) {
        if !self.quiet {
            eprintln!("\n{}", style(message).bold());
            eprintln!("{}", "─".repeat(40));
        }
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("  {:<20} {}", format!("{}:", label), value);
        }
    }

    /// Score coloured against the acceptance threshold
    pub fn score(&self, score: f64, threshold: f64) -> String {
        let text = format!("{:.2}", score);
        if score >= threshold {
            style(text).green().to_string()
        } else {
            style(text).yellow().to_string()
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
