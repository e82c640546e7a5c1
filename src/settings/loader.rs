use std::io;
use std::path::Path;

use crate::error::SettingsError;

use super::model::Settings;

/// Settings file name, relative to the root directory.
pub const SETTINGS_FILE: &str = "app.config.json";

/// Reads `<root>/app.config.json`.
///
/// A missing file yields the defaults. The cloud cascade is applied either way.
pub fn load(root: &Path) -> Result<Settings, SettingsError> {
    let path = root.join(SETTINGS_FILE);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default().normalized()),
        Err(source) => return Err(SettingsError::Io { path, source }),
    };
    let parsed: Settings =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse { path, source })?;
    Ok(parsed.normalized())
}
