//! `yangtree config`: configuration file management

use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing::{debug, error};
use yangtree_core::{ConfigLoader, EngineConfiguration};

use crate::ConfigFormat;

/// Write a starter configuration file into the current directory
pub fn init_command(format: ConfigFormat, force: bool) -> Result<()> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = match format {
        ConfigFormat::Json => ".yangtreerc.json",
        ConfigFormat::Toml => ".yangtreerc.toml",
        ConfigFormat::Yaml => "yangtree.yaml",
    };
    let config_path = PathBuf::from(filename);

    if config_path.exists() && !force {
        error!(
            "Configuration file '{}' already exists. Use --force to overwrite.",
            filename
        );
        bail!("Configuration file '{filename}' already exists");
    }

    let template = EngineConfiguration::template();
    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&template)?,
        ConfigFormat::Toml => toml::to_string_pretty(&template)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&template)?,
    };
    std::fs::write(&config_path, content)?;

    println!("✅ Created configuration file: {filename}");
    println!("   Edit the file to adjust severities and supported features.");
    Ok(())
}

/// Print the configuration that commands would use
pub fn show_command(config_path: Option<PathBuf>) -> Result<()> {
    let source = match &config_path {
        Some(path) => Some(path.clone()),
        None => ConfigLoader::auto_discover(std::path::Path::new("."))?,
    };
    let config = ConfigLoader::load(config_path.as_deref(), None)?;

    match source {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No configuration file found, using defaults"),
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Print the JSON schema of the configuration file
pub fn schema_command() -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&EngineConfiguration::json_schema())?
    );
    Ok(())
}
