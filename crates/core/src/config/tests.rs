use std::path::PathBuf;

use pretty_assertions::assert_eq;

use super::*;

/// An empty document yields the defaults.
#[test]
fn test_empty_config_is_default() {
	let config = MapperConfig::from_toml_str("").unwrap();
	assert_eq!(config, MapperConfig::default());
	assert!(config.diagnostics);
	assert_eq!(config.export_dir, None);
}

/// Both keys parse; unknown keys are rejected.
#[test]
fn test_parse_keys() {
	let config = MapperConfig::from_toml_str("diagnostics = false\nexport_dir = \"target/maps\"\n").unwrap();
	assert_eq!(
		config,
		MapperConfig {
			diagnostics: false,
			export_dir: Some(PathBuf::from("target/maps")),
		}
	);

	let err = MapperConfig::from_toml_str("diagnostic = true").unwrap_err();
	assert!(matches!(err, ConfigError::Parse(_)));
	assert!(err.to_string().starts_with("invalid mapper config"));
}

/// Loading reads the file and reports its path when it cannot.
#[test]
fn test_load_from_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("mapper.toml");
	std::fs::write(&path, "export_dir = \"out\"").unwrap();
	let config = MapperConfig::load(&path).unwrap();
	assert_eq!(config.export_dir, Some(PathBuf::from("out")));
	assert!(config.diagnostics);

	let missing = dir.path().join("missing.toml");
	let Err(ConfigError::Io { path, .. }) = MapperConfig::load(&missing) else {
		panic!("expected an io error");
	};
	assert_eq!(path, missing);
}

/// A loaded config drives the mapper's export settings.
#[test]
fn test_config_feeds_mapper() {
	let config = MapperConfig::from_toml_str("diagnostics = false").unwrap();
	let mut mapper = crate::ResourceMapper::<()>::with_config(config);
	mapper.convert_using(|v: &u8| u16::from(*v)).unwrap();
	mapper.initialize().unwrap();
	assert_eq!(mapper.registered_maps().unwrap()[0].1, None);
}
