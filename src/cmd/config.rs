//! Configuration inspection: `confsearch config`.

use anyhow::Result;
use std::path::Path;

use confsearch::config::ServiceConfig;

use crate::ConfigCommands;

pub fn cmd_config(path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            let config = super::load_config(path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Validate => {
            let config = super::load_config(path)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
        ConfigCommands::Init => {
            if path.exists() {
                anyhow::bail!(
                    "{} already exists. Remove it first to regenerate defaults.",
                    path.display()
                );
            }
            ServiceConfig::default().save(path)?;
            println!("Created {}", path.display());
        }
    }
    Ok(())
}
