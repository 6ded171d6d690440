use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cursor::EndPolicy;
use crate::reddit::{SortOption, DEFAULT_BASE_URL, DEFAULT_SUBREDDIT};

const DEFAULT_ENV_PREFIX: &str = "PIPPUP";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_subreddit")]
    pub subreddit: String,
    #[serde(default)]
    pub sort: SortOption,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            subreddit: default_subreddit(),
            sort: SortOption::default(),
            limit: default_limit(),
            user_agent: default_user_agent(),
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_subreddit() -> String {
    DEFAULT_SUBREDDIT.to_string()
}

fn default_limit() -> u32 {
    25
}

fn default_user_agent() -> String {
    format!("pippup/{} (+https://github.com/pippup/pippup)", crate::VERSION)
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NavigationConfig {
    #[serde(default)]
    pub end_policy: EndPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    // An explicit path must exist; only the default location is optional.
    if let Some(path) = options.config_file.as_ref() {
        let from_file = read_config_file(path)?;
        cfg = merge_config(cfg, from_file);
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.feed.subreddit.trim().is_empty() {
        base.feed.subreddit = other.feed.subreddit;
    }
    base.feed.sort = other.feed.sort;
    if other.feed.limit != 0 {
        base.feed.limit = other.feed.limit;
    }
    if !other.feed.user_agent.trim().is_empty() {
        base.feed.user_agent = other.feed.user_agent;
    }
    if !other.feed.base_url.trim().is_empty() {
        base.feed.base_url = other.feed.base_url;
    }
    if !other.feed.timeout.is_zero() {
        base.feed.timeout = other.feed.timeout;
    }

    base.navigation.end_policy = other.navigation.end_policy;

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "feed.subreddit" => {
            if !value.trim().is_empty() {
                cfg.feed.subreddit = value;
            }
        }
        "feed.sort" => {
            if let Some(sort) = SortOption::from_key(&value) {
                cfg.feed.sort = sort;
            }
        }
        "feed.limit" => {
            if let Ok(parsed) = value.parse::<u32>() {
                cfg.feed.limit = parsed;
            }
        }
        "feed.user_agent" => cfg.feed.user_agent = value,
        "feed.base_url" => cfg.feed.base_url = value,
        "feed.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.feed.timeout = duration;
            }
        }
        "navigation.end_policy" => {
            if let Some(policy) = EndPolicy::from_key(&value) {
                cfg.navigation.end_policy = policy;
            }
        }
        _ => {}
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pippup").join("config.yaml"))
}
