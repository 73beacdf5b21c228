use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Toml};

use super::HelloConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "HELLO_PARALLEL_";

/// Repository-level config file, looked up in the working directory
pub const REPO_CONFIG_FILE: &str = "hello-parallel.toml";

pub struct ConfigLoader {
    figment: Figment,
}

impl ConfigLoader {
    /// Build the layered configuration
    ///
    /// Priority, lowest first: embedded defaults, user config, repository config
    /// (or `custom_config` when given), then `HELLO_PARALLEL_*` variables with `__`
    /// separating sections. Missing files are skipped.
    pub fn new(custom_config: Option<&str>) -> Self {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(Self::user_config_path()));

        figment = match custom_config {
            Some(custom_path) => {
                tracing::debug!("Using custom config file: {}", custom_path);
                figment.merge(Toml::file(custom_path))
            }
            None => figment.merge(Toml::file(REPO_CONFIG_FILE)),
        };

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        ConfigLoader { figment }
    }

    /// Extract and validate the typed configuration
    pub fn extract(&self) -> Result<HelloConfig> {
        let config: HelloConfig = self
            .figment
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;

        tracing::trace!("CONFIG LOAD: team = {:?}", config.team);
        Ok(config)
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{}/.config/hello-parallel/config.toml", home),
            Err(_) => "~/.config/hello-parallel/config.toml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    /// Point HOME at the jail so no real user config is picked up
    fn isolate_home(jail: &mut Jail) {
        let home = jail.directory().to_path_buf();
        jail.set_env("HOME", home.display());
    }

    fn load(custom_config: Option<&str>) -> figment::error::Result<HelloConfig> {
        ConfigLoader::new(custom_config)
            .extract()
            .map_err(|e| format!("{e:#}").into())
    }

    #[test]
    fn test_config_loads_defaults() {
        Jail::expect_with(|jail| {
            isolate_home(jail);

            let config = load(None)?;
            assert_eq!(config, HelloConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_repo_config_overrides_defaults() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.create_file(
                REPO_CONFIG_FILE,
                r#"
                [team]
                num_threads = 3
                "#,
            )?;

            let config = load(None)?;
            assert_eq!(config.team.num_threads, 3);
            // Untouched keys keep their defaults
            assert_eq!(config.team.thread_percentage, 100);
            assert!(config.team.parallel);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_files() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.create_file(REPO_CONFIG_FILE, "[team]\nnum_threads = 3\n")?;
            jail.set_env("HELLO_PARALLEL_TEAM__NUM_THREADS", 6);
            jail.set_env("HELLO_PARALLEL_TEAM__PARALLEL", false);

            let config = load(None)?;
            assert_eq!(config.team.num_threads, 6);
            assert!(!config.team.parallel);
            Ok(())
        });
    }

    #[test]
    fn test_custom_config_replaces_repo_config() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.create_file(REPO_CONFIG_FILE, "[team]\nnum_threads = 3\n")?;
            jail.create_file("custom.toml", "[team]\nmax_threads = 2\n")?;

            let config = load(Some("custom.toml"))?;
            assert_eq!(config.team.num_threads, 0);
            assert_eq!(config.team.max_threads, 2);
            Ok(())
        });
    }

    #[test]
    fn test_custom_config_missing_file_falls_back_to_defaults() {
        Jail::expect_with(|jail| {
            isolate_home(jail);

            let config = load(Some("non_existent.toml"))?;
            assert_eq!(config, HelloConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_percentage_is_rejected() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.create_file(REPO_CONFIG_FILE, "[team]\nthread_percentage = 0\n")?;

            assert!(load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.set_env("HELLO_PARALLEL_TEAM__NUM_THREADS", "plenty");

            assert!(load(None).is_err());
            Ok(())
        });
    }
}
