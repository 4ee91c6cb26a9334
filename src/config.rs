use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::parsers::registry::SiteEntry;

/// Main harvester configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct HarvestConfig {
    /// JSON file holding every recipe accepted so far
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    /// Root directory for downloaded recipe images
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Root directory for diagnostic dumps
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
    /// Pause after each URL, in milliseconds
    #[serde(default = "default_url_delay_ms")]
    pub url_delay_ms: u64,
    /// Page fetching behaviour
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Archive mirror endpoints
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Extraction defaults
    #[serde(default)]
    pub parsing: ParsingConfig,
    /// Site registrations merged over the built-in registry
    #[serde(default)]
    pub sites: HashMap<String, SiteEntry>,
}

/// Configuration for direct page fetches
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Number of attempts before giving up
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Backoff base in seconds (`base * 2^attempt + jitter`)
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: f64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL of the page rendering service, used by sites flagged `render`
    #[serde(default)]
    pub render_service_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_secs: default_backoff_secs(),
            timeout_secs: default_timeout_secs(),
            render_service_url: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for archive-mode fetches
#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// Snapshot availability endpoint
    #[serde(default = "default_archive_lookup_url")]
    pub lookup_url: String,
    /// Snapshot creation endpoint, the page URL is appended
    #[serde(default = "default_archive_save_url")]
    pub save_url: String,
    /// Host used to absolutise relative snapshot locations
    #[serde(default = "default_archive_host")]
    pub host: String,
    /// Attempts per lookup or snapshot request while rate limited
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Backoff base in seconds between archive attempts
    #[serde(default = "default_archive_backoff_secs")]
    pub backoff_secs: f64,
    /// Request timeout in seconds; snapshot creation is slow
    #[serde(default = "default_archive_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            lookup_url: default_archive_lookup_url(),
            save_url: default_archive_save_url(),
            host: default_archive_host(),
            retries: default_retries(),
            backoff_secs: default_archive_backoff_secs(),
            timeout_secs: default_archive_timeout_secs(),
        }
    }
}

/// Values substituted when a page does not provide them
#[derive(Debug, Deserialize, Clone)]
pub struct ParsingConfig {
    /// Source name used when no publisher can be found
    #[serde(default = "default_unknown_source")]
    pub unknown_source: String,
    /// Page image used when the page has none
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            unknown_source: default_unknown_source(),
            placeholder_image: default_placeholder_image(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
            images_dir: default_images_dir(),
            dump_dir: default_dump_dir(),
            url_delay_ms: default_url_delay_ms(),
            fetch: FetchConfig::default(),
            archive: ArchiveConfig::default(),
            parsing: ParsingConfig::default(),
            sites: HashMap::new(),
        }
    }
}

// Default value functions
fn default_output_file() -> PathBuf {
    PathBuf::from("recipes.json")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("recipe_images")
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from("unprocessed")
}

fn default_url_delay_ms() -> u64 {
    1000
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_secs() -> f64 {
    0.3
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_archive_lookup_url() -> String {
    "https://archive.org/wayback/available".to_string()
}

fn default_archive_save_url() -> String {
    "https://web.archive.org/save/".to_string()
}

fn default_archive_host() -> String {
    "https://web.archive.org".to_string()
}

fn default_archive_backoff_secs() -> f64 {
    5.0
}

fn default_archive_timeout_secs() -> u64 {
    60
}

fn default_unknown_source() -> String {
    "Unknown Source".to_string()
}

fn default_placeholder_image() -> String {
    "https://unsplash.com/photos/grey-hlalway-IHtVbLRjTZU".to_string()
}

impl HarvestConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_HARVEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_HARVEST__FETCH__RETRIES
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn url_delay(&self) -> Duration {
        Duration::from_millis(self.url_delay_ms)
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<HarvestConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_HARVEST__ARCHIVE__RETRIES
        .add_source(
            Environment::with_prefix("RECIPE_HARVEST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::registry::ParserKind;
    use config::FileFormat;

    #[test]
    fn test_default_values() {
        let config = HarvestConfig::default();
        assert_eq!(config.output_file, PathBuf::from("recipes.json"));
        assert_eq!(config.url_delay(), Duration::from_secs(1));
        assert_eq!(config.fetch.retries, 3);
        assert_eq!(config.fetch.backoff_secs, 0.3);
        assert_eq!(config.parsing.unknown_source, "Unknown Source");
        assert!(config.sites.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            output_file = "out/recipes.json"
            url_delay_ms = 250

            [fetch]
            retries = 5

            [sites."example.com"]
            parser = "house_and_garden"
            archive = true
        "#;

        let config: HarvestConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.output_file, PathBuf::from("out/recipes.json"));
        assert_eq!(config.url_delay_ms, 250);
        assert_eq!(config.fetch.retries, 5);
        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.archive.retries, 3);

        let site = &config.sites["example.com"];
        assert_eq!(site.parser, ParserKind::HouseAndGarden);
        assert!(site.archive);
        assert!(!site.render);
    }

    #[test]
    fn test_load_config_without_file() {
        // Defaults cover every key, so an empty environment still loads
        let config = load_config().unwrap();
        assert_eq!(config.fetch.retries, 3);
        assert_eq!(config.archive.timeout_secs, 60);
        assert_eq!(config.dump_dir, PathBuf::from("unprocessed"));
    }
}
