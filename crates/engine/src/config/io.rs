use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{GalaxyError, Result};

use super::interpolation::interpolate;
use super::model::{InputsConfig, RawInputsConfig};

/// Annotated example printed by `glxy_wf collect_inputs_config`.
pub const CONFIG_TEMPLATE: &str = include_str!("../../templates/collect_inputs.yml");

/// Read a YAML configuration file and resolve its `{key}` references, without checking required keys.
pub fn load_raw_inputs_config(path: &Path) -> Result<RawInputsConfig> {
    info!("Config path: {}", path.display());
    let text = fs::read_to_string(path).map_err(|error| invalid(path, error))?;
    parse_raw_inputs_config(&text).map_err(|reason| GalaxyError::InvalidConfig {
        path: path.display().to_string(),
        reason,
    })
}

/// Read, interpolate and validate a configuration file.
pub fn load_inputs_config(path: &Path) -> Result<InputsConfig> {
    load_raw_inputs_config(path)?.validate()
}

pub(crate) fn parse_raw_inputs_config(text: &str) -> std::result::Result<RawInputsConfig, String> {
    let mut document: Value = serde_yaml::from_str(text).map_err(|error| error.to_string())?;
    if document.is_null() {
        return Ok(RawInputsConfig::default());
    }
    interpolate(&mut document);
    debug!(config = %document, "interpolated config");
    serde_json::from_value(document).map_err(|error| error.to_string())
}

fn invalid(path: &Path, error: impl ToString) -> GalaxyError {
    GalaxyError::InvalidConfig {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}
