use std::{fs, path::Path};

use tracing::info;

use crate::{ConnuiError, Result, config::Config};

/// Writes a configuration file holding every default value
pub(super) fn create_default_config_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConnuiError::io(e, parent))?;
    }

    let defaults = toml::to_string_pretty(&Config::default()).map_err(|e| {
        ConnuiError::ConfigValidation {
            component: "default config".to_string(),
            details: e.to_string(),
        }
    })?;

    fs::write(path, format!("# connui-cellular configuration file\n\n{defaults}"))
        .map_err(|e| ConnuiError::io(e, path))?;

    info!(path = %path.display(), "Created default configuration");
    Ok(())
}
