//! Runner config resolution.
//!
//! The config source is either a path to a JSON file or the JSON text
//! itself. The resolved mapping is passed through to the runner untouched;
//! only `BaseCommand.feedstock_subdir` is read here.

use std::io::Write;
use std::path::Path;

use recipe_deploy_common::constants::{
    BASE_COMMAND_SECTION, DEFAULT_FEEDSTOCK_SUBDIR, FEEDSTOCK_SUBDIR_KEY,
};
use recipe_deploy_common::error::{DeployError, Result};
use serde_json::{Map, Value};

/// Resolved job-runner configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    entries: Map<String, Value>,
}

impl RunConfig {
    /// Resolves a config source string.
    ///
    /// If `source` names an existing path (relative paths are taken from
    /// `base_dir`) its contents are parsed, otherwise `source` itself is
    /// parsed as inline JSON. Either way the top-level value must be a
    /// JSON object.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ConfigFile` or `DeployError::ConfigFileRead`
    /// when `source` named an existing path, and
    /// `DeployError::ConfigInline` otherwise.
    pub fn resolve(source: &str, base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(source);
        if !source.is_empty() && path.exists() {
            tracing::debug!(path = %path.display(), "reading runner config from file");
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(source) => return Err(DeployError::ConfigFileRead { path, source }),
            };
            let entries = serde_json::from_str(&content)
                .map_err(|source| DeployError::ConfigFile { path, source })?;
            return Ok(Self { entries });
        }

        tracing::debug!("parsing runner config as inline JSON");
        let entries = serde_json::from_str(source).map_err(|e| DeployError::ConfigInline {
            text: source.to_owned(),
            source: e,
        })?;
        Ok(Self { entries })
    }

    /// Returns the feedstock subdirectory, `feedstock` unless overridden.
    #[must_use]
    pub fn feedstock_subdir(&self) -> &str {
        self.entries
            .get(BASE_COMMAND_SECTION)
            .and_then(|section| section.get(FEEDSTOCK_SUBDIR_KEY))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FEEDSTOCK_SUBDIR)
    }

    /// Returns the raw key-value mapping.
    #[must_use]
    pub const fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Serializes the config as JSON into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_json(&self, mut writer: impl Write) -> Result<()> {
        serde_json::to_writer(&mut writer, &self.entries)?;
        writer.flush().map_err(|e| DeployError::Io {
            path: "<runner config>".into(),
            source: e,
        })
    }
}
