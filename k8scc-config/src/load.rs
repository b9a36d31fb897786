use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::environment::Environment;

/// Directory containing configuration files relative to the builder root.
const CONFIGURATION_DIR: &str = "configuration";

/// Environment variable that points directly at the configuration directory.
const CONFIG_DIR_ENV_NAME: &str = "APP_CONFIG_DIR";

/// Base configuration file loaded for all environments.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
///
/// Example: `APP_BUILDER__RESOURCES__LIMIT_MEMORY` sets the
/// `builder.resources.limit_memory` field.
const ENV_SEPARATOR: &str = "__";

/// Separator for list elements in environment variables.
const LIST_SEPARATOR: &str = ",";

/// Trait defining the list of keys that should be parsed as lists in a given [`Config`]
/// implementation.
pub trait Config {
    /// Slice containing all the keys that should be parsed as lists when loading the configuration.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Errors raised while locating or reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadConfigError {
    #[error("failed to detect the running environment: {0}")]
    Environment(#[from] std::io::Error),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// Returns the directory configuration files are read from.
///
/// The peer invokes the launcher as `<builder>/bin/<phase>`, so without an
/// explicit `APP_CONFIG_DIR` the directory next to `bin` is used. When the
/// executable path cannot be resolved the current directory is used instead.
pub fn configuration_directory() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV_NAME) {
        return PathBuf::from(dir);
    }

    let beside_bin = std::env::current_exe().ok().and_then(|exe| {
        exe.parent()
            .and_then(|bin| bin.parent())
            .map(|root| root.join(CONFIGURATION_DIR))
    });

    match beside_bin {
        Some(dir) if dir.is_dir() => dir,
        _ => PathBuf::from(CONFIGURATION_DIR),
    }
}

/// Loads hierarchical configuration from YAML files and environment variables.
///
/// Loads configuration in this order:
/// 1. Base configuration from `configuration/base.yaml`
/// 2. Environment-specific file from `configuration/{environment}.yaml`, if present
/// 3. Environment variable overrides prefixed with `APP`
///
/// Nested keys use double underscores: `APP_WATCH__POLL_INTERVAL_MS` → `watch.poll_interval_ms`
/// and lists are separated by `,`.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    load_config_from(configuration_directory())
}

/// Same as [`load_config`] but reads the YAML files from `configuration_directory`.
pub fn load_config_from<T>(configuration_directory: PathBuf) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let environment = Environment::load()?;
    let environment_filename = format!("{environment}.yaml");

    // We build the environment configuration source.
    let mut environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    // If there is a list of keys to parse, we add them to the source and enable parsing with the
    // separator.
    if !<T as Config>::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in <T as Config>::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join(BASE_CONFIG_FILE),
        ))
        // The environment-specific file is optional, most builders ship a single file.
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        .add_source(environment_source)
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}
