use cgp_engine_core::fees::EngineConfig;
use std::path::Path;

use crate::input;

/// Load flow profile overrides from a YAML (`.yaml`/`.yml`) or JSON file.
///
/// Without a file the built-in flow table applies.
pub fn load_config(path: &Option<String>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let is_yaml = matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let config: EngineConfig = if is_yaml {
        input::file::read_yaml(path)?
    } else {
        input::file::read_json(path)?
    };
    config
        .validate()
        .map_err(|e| format!("Config '{}': {}", path, e))?;
    tracing::debug!(path = %path, flows = config.profiles.len(), "loaded engine config");
    Ok(config)
}
