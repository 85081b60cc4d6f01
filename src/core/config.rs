//! JSON persistence for [`HpssParams`].

use crate::core::types::HpssParams;
use crate::error::{HpssError, Result};
use std::path::Path;

/// Writes separation parameters as pretty-printed JSON.
pub fn write_params_json(path: &Path, params: &HpssParams) -> Result<()> {
    let json = serde_json::to_string_pretty(params).map_err(|e| {
        HpssError::InvalidFormat(format!("failed to serialize parameters: {}", e))
    })?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads separation parameters from JSON and validates them.
///
/// Missing fields take their default values.
pub fn read_params_json(path: &Path) -> Result<HpssParams> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| HpssError::IoError(format!("{}: {}", path.display(), e)))?;
    let params = parse_params_json(&data).map_err(|e| match e {
        HpssError::InvalidFormat(msg) => {
            HpssError::InvalidFormat(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    log::debug!("loaded parameters from {}: {}", path.display(), params);
    Ok(params)
}

/// Parses and validates parameters from a JSON string.
pub fn parse_params_json(json: &str) -> Result<HpssParams> {
    let params: HpssParams = serde_json::from_str(json)
        .map_err(|e| HpssError::InvalidFormat(format!("failed to parse parameters: {}", e)))?;
    params.validate()?;
    Ok(params)
}
