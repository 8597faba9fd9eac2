//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config ($XDG_CONFIG_HOME/humanise/config.toml)
//! 3. Project config (.humanise/config.toml)
//! 4. Environment variables (HUMANISE_* prefix, `__` between nested keys)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{HumaniseError, Result};

const ENV_PREFIX: &str = "HUMANISE_";
const APP_DIR: &str = "humanise";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .map_err(|e| HumaniseError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load defaults overlaid with a specific file and the environment
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(HumaniseError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Self::env_provider())
            .extract()
            .map_err(|e| HumaniseError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        figment.merge(Self::env_provider())
    }

    /// HUMANISE_PIPELINE__MAX_ITERATIONS -> pipeline.max_iterations
    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__").lowercase(true)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/humanise/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join(APP_DIR))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".humanise")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Configuration file locations and whether they exist
    pub fn paths() -> Vec<(&'static str, Option<PathBuf>)> {
        vec![
            ("Global", Self::global_config_path()),
            ("Project", Some(Self::project_config_path())),
        ]
    }

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| HumaniseError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a default config file, globally or for the current project
    ///
    /// Existing files are kept unless `force` is set.
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                HumaniseError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        Self::write_default(&path, force)?;
        Ok(path)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(());
        }

        fs::write(path, Self::default_config_toml())?;
        info!("Created config: {}", path.display());
        Ok(())
    }

    /// Commented default config (TOML)
    fn default_config_toml() -> String {
        r#"# Humanise Configuration
# Project settings in .humanise/config.toml override the global file.
# Environment variables override both, e.g. HUMANISE_PIPELINE__MAX_ITERATIONS=5.
# API keys are read from OPENAI_API_KEY, ANTHROPIC_API_KEY and SUPABASE_KEY.

version = "1.0"

[pipeline]
quality_threshold = 0.75
max_iterations = 3
exemplar_count = 5
judge_enabled = true

[scoring]
burstiness_scale = 20.0
contraction_target = 0.03

[scoring.weights]
burstiness = 0.30
lexical_diversity = 0.25
contraction = 0.15
ai_patterns = 0.10
judgment = 0.20

# Rewriter profile; [llm.sales] or [llm.journalist] override it per mode
[llm]
provider = "anthropic"
model = "claude-sonnet-4-20250514"
temperature = 0.7

[judge]
provider = "openai"
model = "gpt-4o-mini"

[retrieval]
enabled = true
# url = "https://your-project.supabase.co"
cache_ttl_secs = 600
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn jail_error(e: HumaniseError) -> figment::Error {
        figment::Error::from(e.to_string())
    }

    #[test]
    fn test_load_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            let config = ConfigLoader::load().map_err(jail_error)?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_project_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            jail.create_dir(".humanise")?;
            jail.create_file(
                ".humanise/config.toml",
                r#"
                [pipeline]
                quality_threshold = 0.9

                [llm.sales]
                provider = "openai"
                model = "gpt-4o"
                "#,
            )?;

            let config = ConfigLoader::load().map_err(jail_error)?;
            assert_eq!(config.pipeline.quality_threshold, 0.9);
            assert_eq!(config.pipeline.max_iterations, 3);
            assert_eq!(config.llm.sales.as_ref().map(|p| p.provider.as_str()), Some("openai"));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_files() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            jail.create_dir(".humanise")?;
            jail.create_file(".humanise/config.toml", "[pipeline]\nmax_iterations = 2\n")?;
            jail.set_env("HUMANISE_PIPELINE__MAX_ITERATIONS", "5");
            jail.set_env("HUMANISE_SCORING__BURSTINESS_SCALE", "15.0");
            jail.set_env("HUMANISE_RETRIEVAL__ENABLED", "false");

            let config = ConfigLoader::load().map_err(jail_error)?;
            assert_eq!(config.pipeline.max_iterations, 5);
            assert_eq!(config.scoring.burstiness_scale, 15.0);
            assert!(!config.retrieval.enabled);
            Ok(())
        });
    }

    #[test]
    fn test_global_file_loaded() {
        Jail::expect_with(|jail| {
            let xdg = jail.directory().join("xdg");
            jail.set_env("XDG_CONFIG_HOME", xdg.display());
            jail.create_dir("xdg/humanise")?;
            jail.create_file("xdg/humanise/config.toml", "[judge]\nmodel = \"gpt-4o\"\n")?;

            let config = ConfigLoader::load().map_err(jail_error)?;
            assert_eq!(config.judge.model.as_deref(), Some("gpt-4o"));
            assert_eq!(config.judge.provider, "openai");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            jail.set_env("HUMANISE_PIPELINE__QUALITY_THRESHOLD", "1.5");

            let err = ConfigLoader::load().unwrap_err();
            assert!(matches!(err, HumaniseError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn test_load_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[pipeline]\nexemplar_count = 2\n")?;

            let config =
                ConfigLoader::load_from_file(Path::new("custom.toml")).map_err(jail_error)?;
            assert_eq!(config.pipeline.exemplar_count, 2);
            assert!(ConfigLoader::load_from_file(Path::new("missing.toml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_default_template_parses_and_validates() {
        Jail::expect_with(|_jail| {
            let path = Path::new("generated/config.toml");
            ConfigLoader::write_default(path, false).map_err(jail_error)?;

            let config = ConfigLoader::load_from_file(path).map_err(jail_error)?;
            assert_eq!(config.pipeline, Config::default().pipeline);
            assert_eq!(config.scoring, Config::default().scoring);
            Ok(())
        });
    }

    #[test]
    fn test_write_default_respects_force() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::write_default(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::write_default(&path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[pipeline]"));
    }

    #[test]
    fn test_render_hides_secrets() {
        let mut config = Config::default();
        config.retrieval.api_key = Some("super-secret".to_string());
        config.judge.api_key = Some("sk-judge".to_string());

        let toml = ConfigLoader::render(&config, false).unwrap();
        let json = ConfigLoader::render(&config, true).unwrap();
        for rendered in [toml, json] {
            assert!(!rendered.contains("super-secret"));
            assert!(!rendered.contains("sk-judge"));
        }
    }
}
