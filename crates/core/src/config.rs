//! Mapper configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors raised while loading a [`MapperConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid mapper config: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Settings that affect registration bookkeeping and diagnostics.
///
/// ```toml
/// diagnostics = true
/// export_dir = "target/maps"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
	/// Record registration sites and allow plan export.
	pub diagnostics: bool,
	/// Directory receiving one JSON plan description per object map.
	pub export_dir: Option<PathBuf>,
}

impl Default for MapperConfig {
	fn default() -> Self {
		Self {
			diagnostics: true,
			export_dir: None,
		}
	}
}

impl MapperConfig {
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&text)
	}
}

#[cfg(test)]
mod tests;
