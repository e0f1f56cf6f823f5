//! Configuration loading from files and environment.

use crate::{ConfigError, TrackerConfig};
use regex::Regex;
use std::env;
use std::path::Path;
use tracing::{debug, info};
use tracker_types::ChainId;

/// Configuration loader with environment variable substitution
#[derive(Debug)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "TRACKER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<TrackerConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;
		info!("Loading configuration from {}", file_path);

		let content = tokio::fs::read_to_string(file_path).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ConfigError::FileNotFound(file_path.clone())
			} else {
				ConfigError::IoError(e)
			}
		})?;

		let mut config = self.parse(&content)?;
		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	/// Parses configuration text after substituting environment placeholders.
	pub fn parse(&self, content: &str) -> Result<TrackerConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;
		toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut TrackerConfig) -> Result<(), ConfigError> {
		if let Ok(timeout) = env::var(format!("{}DEFAULT_TIMEOUT_SECS", self.env_prefix)) {
			debug!("Overriding default timeout from environment");
			config.tracker.default_timeout_secs = timeout.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid default timeout: {}", e))
			})?;
		}

		if let Ok(interval) = env::var(format!("{}POLL_INTERVAL_SECS", self.env_prefix)) {
			debug!("Overriding poll interval from environment");
			config.tracker.poll_interval_secs = interval.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid poll interval: {}", e))
			})?;
		}

		for (key, url) in env::vars() {
			if let Some(chain_id) = key.strip_prefix("RPC_URL_") {
				if let Ok(id) = chain_id.parse::<u64>() {
					if let Some(chain) = config.chains.get_mut(&ChainId(id)) {
						debug!("Overriding RPC URL for chain {} from environment", id);
						chain.rpc_url = url;
					}
				}
			}
		}

		Ok(())
	}
}

/// Replaces every `${VAR_NAME}` with the variable's value.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(format!("Invalid placeholder pattern: {}", e)))?;

	let mut result = content.to_string();
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Validate configuration
pub fn validate_config(config: &TrackerConfig) -> Result<(), ConfigError> {
	if config.chains.is_empty() {
		return Err(ConfigError::ValidationError(
			"At least one chain must be configured".to_string(),
		));
	}

	for (chain_id, chain) in &config.chains {
		if !(chain.rpc_url.starts_with("http://") || chain.rpc_url.starts_with("https://")) {
			return Err(ConfigError::ValidationError(format!(
				"RPC URL for chain {} must start with http:// or https://",
				chain_id
			)));
		}
	}

	let settings = &config.tracker;
	if settings.default_timeout_secs == 0 {
		return Err(ConfigError::ValidationError(
			"default_timeout_secs must be greater than zero".to_string(),
		));
	}
	if settings.poll_interval_secs == 0 {
		return Err(ConfigError::ValidationError(
			"poll_interval_secs must be greater than zero".to_string(),
		));
	}
	if settings.channel_capacity == 0 {
		return Err(ConfigError::ValidationError(
			"channel_capacity must be greater than zero".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const BASE_CONFIG: &str = r#"
		[tracker]
		default_timeout_secs = 120

		[chains.1]
		name = "ethereum"
		rpc_url = "http://localhost:8545"
		fill_contract = "0x5c7bcd6e7de5423a257d81b442095a1a6ced35c5"
	"#;

	fn write_config(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let file = write_config(BASE_CONFIG);

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("TRACKER_TEST_LOAD_")
			.load()
			.await
			.unwrap();

		assert_eq!(config.tracker.default_timeout_secs, 120);
		assert_eq!(config.chains[&ChainId(1)].name, "ethereum");
	}

	#[tokio::test]
	async fn test_missing_file() {
		let result = ConfigLoader::new()
			.with_file("/nonexistent/tracker.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

		let result = ConfigLoader::new().load().await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("TRACKER_TEST_SUBST_RPC", "https://rpc.example.org");
		let content = r#"
			[chains.10]
			name = "optimism"
			rpc_url = "${TRACKER_TEST_SUBST_RPC}"
		"#;

		let config = ConfigLoader::new().parse(content).unwrap();
		assert_eq!(config.chains[&ChainId(10)].rpc_url, "https://rpc.example.org");
	}

	#[test]
	fn test_env_substitution_missing_var() {
		let content = r#"
			[chains.10]
			name = "optimism"
			rpc_url = "${TRACKER_TEST_DEFINITELY_UNSET}"
		"#;

		let result = ConfigLoader::new().parse(content);
		assert!(
			matches!(result, Err(ConfigError::EnvVarNotFound(name)) if name == "TRACKER_TEST_DEFINITELY_UNSET")
		);
	}

	#[tokio::test]
	async fn test_env_overrides() {
		env::set_var("TRACKER_TEST_OVR_DEFAULT_TIMEOUT_SECS", "42");
		env::set_var("TRACKER_TEST_OVR_POLL_INTERVAL_SECS", "3");
		env::set_var("RPC_URL_999001", "https://override.example.org");
		let file = write_config(
			r#"
			[chains.999001]
			name = "devnet"
			rpc_url = "http://localhost:8545"
		"#,
		);

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("TRACKER_TEST_OVR_")
			.load()
			.await
			.unwrap();

		assert_eq!(config.tracker.default_timeout_secs, 42);
		assert_eq!(config.tracker.poll_interval_secs, 3);
		assert_eq!(
			config.chains[&ChainId(999001)].rpc_url,
			"https://override.example.org"
		);
	}

	#[test]
	fn test_validation() {
		let loader = ConfigLoader::new();

		let mut config = loader.parse(BASE_CONFIG).unwrap();
		assert!(validate_config(&config).is_ok());

		config.tracker.poll_interval_secs = 0;
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::ValidationError(_))
		));

		let mut config = loader.parse(BASE_CONFIG).unwrap();
		config.chains.get_mut(&ChainId(1)).unwrap().rpc_url = "ws://localhost:8546".into();
		assert!(validate_config(&config).is_err());

		let mut config = loader.parse(BASE_CONFIG).unwrap();
		config.chains.clear();
		assert!(validate_config(&config).is_err());
	}
}
