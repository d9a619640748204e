// Manifest-driven reconciliation
pub mod apply;

// Single-resource commands
pub mod resource;

// Configuration inspection
pub mod config;

use anyhow::Result;

/// Ask before a destructive operation
pub fn confirm(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(confirmed)
}
