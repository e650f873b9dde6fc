//! Shell configuration.
//!
//! Loaded from an optional YAML file named by `VFSPROBE_CONFIG`,
//! layered under `VFSPROBE_*` environment variables. Every field has a
//! default, so the shell runs with no configuration present at all.

use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "VFSPROBE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "VFSPROBE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "VFSPROBE_LOG";

/// Configuration for the interactive shell.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Name the in-memory backend registers under.
    pub backend: String,
    /// Prompt printed before each command line.
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            backend: "mem".to_string(),
            prompt: "vfsprobe> ".to_string(),
        }
    }
}

impl ShellConfig {
    /// Load configuration from file (if configured) and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(config::File::with_name(&path));
        }
        builder
            .add_source(config::Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.backend, "mem");
        assert_eq!(cfg.prompt, "vfsprobe> ");
    }
}
