//! Modes Command
//!
//! List the supported target styles.

use crate::types::{Mode, Result};

pub fn run(json: bool) -> Result<()> {
    if json {
        let modes: Vec<_> = Mode::ALL
            .iter()
            .map(|mode| {
                serde_json::json!({
                    "id": mode.as_str(),
                    "name": mode.display_name(),
                    "description": mode.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&modes)?);
        return Ok(());
    }

    println!("Available modes");
    println!("══════════════════════════════════════");
    for mode in Mode::ALL {
        println!("  {:<12} {}", mode.as_str(), mode.display_name());
        println!("  {:<12} {}", "", mode.description());
    }
    Ok(())
}
