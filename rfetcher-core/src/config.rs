use crate::{extract_subreddit_name, ConfigError, FilterSpec, ListingKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "RFetcher/1.0";

const CREDENTIAL_VARS: [&str; 4] = [
    "REDDIT_CLIENT_ID",
    "REDDIT_CLIENT_SECRET",
    "REDDIT_USERNAME",
    "REDDIT_PASSWORD",
];

/// How a save treats an existing output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    #[default]
    Overwrite,
    Append,
}

/// Parameter bundle for a single run, normally read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub subreddit: String,
    #[serde(default)]
    pub listing: ListingKind,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub post_wanted: Vec<String>,
    #[serde(default)]
    pub post_unwanted: Vec<String>,
    #[serde(default)]
    pub comment_unwanted: Vec<String>,
    /// Category names to run, in order. Ignored when `all_categories` is set.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub all_categories: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_categories_file")]
    pub categories_file: PathBuf,
    /// Output file name; generated from subreddit, category and time when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub mode: SaveMode,
}

fn default_limit() -> usize {
    50
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_categories_file() -> PathBuf {
    PathBuf::from("auto_categories.txt")
}

impl RunConfig {
    pub fn new(subreddit: impl Into<String>) -> Self {
        Self {
            subreddit: subreddit.into(),
            listing: ListingKind::default(),
            limit: default_limit(),
            post_wanted: Vec::new(),
            post_unwanted: Vec::new(),
            comment_unwanted: Vec::new(),
            categories: Vec::new(),
            all_categories: false,
            data_dir: default_data_dir(),
            categories_file: default_categories_file(),
            output: None,
            mode: SaveMode::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        debug!("Loaded run configuration from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: RunConfig = toml::from_str(content)?;
        config.subreddit = extract_subreddit_name(&config.subreddit);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subreddit.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "subreddit".to_string(),
                value: self.subreddit.clone(),
            });
        }
        if self.categories.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "categories".to_string(),
                value: self.categories.join(","),
            });
        }
        Ok(())
    }

    /// Keyword sets configured directly in the run file.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::new(
            self.post_wanted.clone(),
            self.post_unwanted.clone(),
            self.comment_unwanted.clone(),
        )
    }
}

/// Script-app credentials for the password grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(CREDENTIAL_VARS.len());
        for var_name in CREDENTIAL_VARS {
            match lookup(var_name).filter(|value| !value.is_empty()) {
                Some(value) => values.push(value),
                None => {
                    return Err(ConfigError::MissingEnvironmentVariable {
                        var_name: var_name.to_string(),
                    })
                }
            }
        }

        let user_agent = lookup("REDDIT_USER_AGENT")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut values = values.into_iter();
        Ok(Self {
            client_id: values.next().unwrap_or_default(),
            client_secret: values.next().unwrap_or_default(),
            username: values.next().unwrap_or_default(),
            password: values.next().unwrap_or_default(),
            user_agent,
        })
    }
}
