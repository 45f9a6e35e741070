// SSHE — Configuration
//
// `~/.sshe/sshe.conf` holds the process-wide settings: UI language, the
// password encoding scheme, and the secret key every stored password is
// encrypted with. It is created with defaults on first run; fields missing
// from an existing file are filled from the defaults and written back.

mod error;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::ConfigError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Environment variable overriding the base directory that holds `.sshe/`.
pub const HOME_ENV: &str = "SSHE_HOME";

const APP_DIR: &str = ".sshe";
const CONFIG_FILE: &str = "sshe.conf";
const NODES_FILE: &str = "node.yaml";

pub const DEFAULT_LANGUAGE: &str = "zh-cn";
pub const DEFAULT_PASSWORD_ENCODE: &str = "aes";
pub const DEFAULT_SECRET_KEY: &str = "sshe2024";

// ─── Paths ───────────────────────────────────────────────────────────────────

/// Locations of the config and node files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    dir: PathBuf,
}

impl AppPaths {
    /// `$SSHE_HOME/.sshe`, or `~/.sshe` when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs_next::home_dir().ok_or(ConfigError::HomeNotFound)?,
        };
        Ok(Self::under(base))
    }

    /// Paths rooted at `<base>/.sshe`.
    pub fn under(base: impl AsRef<Path>) -> Self {
        Self {
            dir: base.as_ref().join(APP_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn nodes_file(&self) -> PathBuf {
        self.dir.join(NODES_FILE)
    }

    /// Create the directory (mode 0700 on Unix) if it does not exist.
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .map_err(|source| ConfigError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub language: String,
    /// Identifier of the password codec, see `cipher::codec_for`.
    #[serde(default)]
    pub password_encode: String,
    #[serde(default)]
    pub secret_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            password_encode: DEFAULT_PASSWORD_ENCODE.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("language", &self.language)
            .field("password_encode", &self.password_encode)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load the config at `path`, creating it with defaults if absent.
    /// Empty fields are backfilled from the defaults and the file is
    /// rewritten only when something was filled in.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "Created default config file");
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Config = if contents.trim().is_empty() {
            Config {
                language: String::new(),
                password_encode: String::new(),
                secret_key: String::new(),
            }
        } else {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Decode {
                path: path.to_path_buf(),
                source,
            })?
        };

        if config.backfill() {
            tracing::info!(path = %path.display(), "Filled missing config fields with defaults");
            config.save(path)?;
        }

        Ok(config)
    }

    /// Replace empty fields with defaults. Returns whether anything changed.
    fn backfill(&mut self) -> bool {
        let defaults = Config::default();
        let mut changed = false;
        for (field, default) in [
            (&mut self.language, defaults.language),
            (&mut self.password_encode, defaults.password_encode),
            (&mut self.secret_key, defaults.secret_key),
        ] {
            if field.is_empty() {
                *field = default;
                changed = true;
            }
        }
        changed
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_yaml::to_string(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
