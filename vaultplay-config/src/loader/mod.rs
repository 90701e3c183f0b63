pub mod error;

use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::models::{
    Config, ConfigFile, ConfigMetadata, ConfigSource, policy::parse_duration,
};
use error::ConfigLoadError;

pub const CONFIG_PATH_ENV: &str = "VAULTPLAY_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "VAULTPLAY_CONFIG_JSON";
pub const STORAGE_ROOT_ENV: &str = "VAULTPLAY_STORAGE_ROOT";
pub const PREVIEW_LIMIT_ENV: &str = "VAULTPLAY_PREVIEW_LIMIT";

const DEFAULT_CANDIDATES: &[&str] = &[
    "vaultplay.toml",
    "vaultplay.json",
    "config/vaultplay.toml",
    "config/vaultplay.json",
];

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
}

/// Resolves configuration from files and the environment.
///
/// Evaluation order:
/// 1) `.env` (or an explicit env file) through `dotenvy`,
/// 2) an explicit path (`--config`),
/// 3) `$VAULTPLAY_CONFIG_PATH` (TOML or JSON file),
/// 4) `$VAULTPLAY_CONFIG_JSON` (inline JSON),
/// 5) `vaultplay.toml` / `config/vaultplay.toml` under the search root,
/// 6) defaults.
///
/// `$VAULTPLAY_STORAGE_ROOT` and `$VAULTPLAY_PREVIEW_LIMIT` override the
/// resolved values.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
    search_root: Option<PathBuf>,
    skip_env_file: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Directory searched for the default config files.
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_root = Some(root.into());
        self
    }

    /// Do not read any `.env` file.
    pub fn without_env_file(mut self) -> Self {
        self.skip_env_file = true;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let (file, source) = self.resolve_file()?;

        let mut config = Config::from_file(
            file,
            ConfigMetadata {
                source,
                env_file_loaded,
                overrides: Vec::new(),
            },
        )?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        info!(
            source = ?config.metadata.source,
            backend = ?config.storage.backend,
            preview_limit = ?config.policy.preview_limit,
            "configuration loaded"
        );
        Ok(ConfigLoad { config })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.skip_env_file {
            return Ok(false);
        }
        let result = match &self.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| ()),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match result {
            Ok(()) => Ok(true),
            Err(err) if err.not_found() && self.env_file.is_none() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn resolve_file(&self) -> Result<(ConfigFile, ConfigSource), ConfigLoadError> {
        if let Some(path) = &self.config_path {
            let file = load_from_file(path)?;
            return Ok((file, ConfigSource::Explicit(path.clone())));
        }

        if let Ok(path_str) = env::var(CONFIG_PATH_ENV)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let file = load_from_file(&path)?;
            return Ok((file, ConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var(CONFIG_JSON_ENV)
            && !raw.trim().is_empty()
        {
            let file = parse_json(&raw, CONFIG_JSON_ENV)?;
            return Ok((file, ConfigSource::EnvInline));
        }

        if let Some(path) = self.find_default_file() {
            let file = load_from_file(&path)?;
            return Ok((file, ConfigSource::File(path)));
        }

        Ok((ConfigFile::default(), ConfigSource::Default))
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        let root = self
            .search_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        DEFAULT_CANDIDATES
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|path| path.exists())
    }
}

pub fn load_from_file(path: &Path) -> Result<ConfigFile, ConfigLoadError> {
    debug!(path = %path.display(), "reading config file");
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let origin = path.display().to_string();

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents, &origin),
        Some("toml") => parse_toml(&contents, &origin),
        _ => parse_from_str(&contents, &origin),
    }
}

/// Try TOML first, then JSON.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> Result<ConfigFile, ConfigLoadError> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            ConfigLoadError::Parse {
                origin: origin.to_string(),
                reason: format!("toml error: {toml_err}; json error: {json_err}"),
            }
        })
    })
}

fn parse_toml(contents: &str, origin: &str) -> Result<ConfigFile, ConfigLoadError> {
    toml::from_str(contents).map_err(|err| ConfigLoadError::Parse {
        origin: origin.to_string(),
        reason: err.to_string(),
    })
}

fn parse_json(contents: &str, origin: &str) -> Result<ConfigFile, ConfigLoadError> {
    serde_json::from_str(contents).map_err(|err| ConfigLoadError::Parse {
        origin: origin.to_string(),
        reason: err.to_string(),
    })
}

fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigLoadError> {
    if let Ok(root) = env::var(STORAGE_ROOT_ENV)
        && !root.trim().is_empty()
    {
        config.storage.root = PathBuf::from(root);
        config.metadata.overrides.push(STORAGE_ROOT_ENV);
    }

    if let Ok(raw) = env::var(PREVIEW_LIMIT_ENV)
        && !raw.trim().is_empty()
    {
        config.policy.preview_limit = parse_duration(PREVIEW_LIMIT_ENV, &raw)?;
        config.metadata.overrides.push(PREVIEW_LIMIT_ENV);
    }
    Ok(())
}
