//! Environment-driven configuration

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_QUIET_PERIOD_MS: u64 = 3000;

/// Where the remote index service may live
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub index_url: Option<String>,
    pub hf_space_user: Option<String>,
    pub hf_space_name: Option<String>,
}

impl RemoteConfig {
    /// Base URLs to probe, in order
    pub fn candidates(&self) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        if let Some(url) = &self.index_url {
            candidates.push(url.trim_end_matches('/').to_string());
        }
        if let (Some(user), Some(name)) = (&self.hf_space_user, &self.hf_space_name) {
            candidates.extend(hf_space_candidates(user, name));
        }
        candidates
    }
}

/// Host name variants a Hugging Face Space may answer on
pub fn hf_space_candidates(user: &str, name: &str) -> Vec<String> {
    vec![
        format!("https://{}-{}.hf.space", name, user),
        format!("https://{}--{}.hf.space", user, name),
        format!("https://{}-{}.hf.space", user, name),
        format!("https://huggingface.co/spaces/{}/{}", user, name),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Document directory; the CLI falls back to `~/.ontograph/documents`
    pub data_dir: Option<PathBuf>,
    pub remote: RemoteConfig,
    /// Debounce window for index rebuilds
    pub quiet_period: Duration,
    /// Rank with the remote index first and fall back to local scoring
    pub prefer_remote: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            remote: RemoteConfig::default(),
            quiet_period: Duration::from_millis(DEFAULT_QUIET_PERIOD_MS),
            prefer_remote: false,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let index_url = var("REMOTE_INDEX_URL");
        let hf_space_user = var("HF_SPACE_USER");
        let hf_space_name = var("HF_SPACE_NAME");
        let configured = index_url.is_some() || (hf_space_user.is_some() && hf_space_name.is_some());

        let quiet_period = var("REBUILD_QUIET_PERIOD_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_QUIET_PERIOD_MS));

        Self {
            data_dir: var("ONTOGRAPH_DATA_DIR").map(PathBuf::from),
            remote: RemoteConfig {
                enabled: var("REMOTE_INDEX_ENABLED")
                    .map(|value| is_truthy(&value))
                    .unwrap_or(configured),
                index_url,
                hf_space_user,
                hf_space_name,
            },
            quiet_period,
            prefer_remote: var("SEARCH_PREFER_REMOTE")
                .map(|value| is_truthy(&value))
                .unwrap_or(false),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    matches!(value.as_str(), "1" | "true" | "yes" | "on")
}
