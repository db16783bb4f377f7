use crate::config::StackConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load, parse and validate a stack file
pub fn load_config(config_path: &Path) -> Result<StackConfig> {
    info!("Loading stack file from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open stack file {:?}", config_path))?;

    let config: StackConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse stack file {:?}", config_path))?;

    config.validate()?;

    info!(
        "Stack '{}': {} service(s), {} secret(s), {} route(s), {} data store(s)",
        config.general.stack_name,
        config.services.len(),
        config.secrets.len(),
        config.routes.len(),
        config.data_stores.len()
    );

    let unrouted: Vec<&str> = config
        .services
        .iter()
        .filter(|s| !config.routes.iter().any(|r| r.service == s.name))
        .map(|s| s.name.as_str())
        .collect();
    if !unrouted.is_empty() {
        warn!(
            "Service(s) without a route are reachable only from other services: {}",
            unrouted.join(", ")
        );
    }

    Ok(config)
}

/// Read `general.log_level` without validating the rest of the file
///
/// Lets the binary configure logging before the full load reports anything.
pub fn configured_log_level(config_path: &Path) -> Option<String> {
    let file = File::open(config_path).ok()?;
    let document: serde_yaml::Value = serde_yaml::from_reader(file).ok()?;
    document
        .get("general")?
        .get("log_level")?
        .as_str()
        .map(str::to_lowercase)
}

/// Parse and validate a stack file already held in memory
pub fn parse_config(yaml: &str) -> Result<StackConfig> {
    let config: StackConfig = serde_yaml::from_str(yaml).wrap_err("Failed to parse stack file")?;
    config.validate()?;
    Ok(config)
}
