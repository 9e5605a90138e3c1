use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{KrarError, Result};

/// Run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Restart every discovered target controller
    #[default]
    Rollout,

    /// Detect mutable tag drift and report or restart affected controllers
    Smart,
}

impl Mode {
    /// Get the mode as its canonical lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Rollout => "rollout",
            Mode::Smart => "smart",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = KrarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rollout" => Ok(Mode::Rollout),
            "smart" => Ok(Mode::Smart),
            other => Err(KrarError::InvalidConfig(format!(
                "unknown mode '{other}' (expected 'rollout' or 'smart')"
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Complete workload label triple used for label-based discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    /// Label prefix (e.g. "policy.example.io")
    pub domain: String,
    /// Label key
    pub name: String,
    /// Label value
    pub value: String,
}

impl LabelSelector {
    /// Build a selector from optional parts.
    ///
    /// Returns `None` unless all three parts are present and non-empty;
    /// an incomplete triple disables label discovery rather than failing.
    pub fn from_parts(
        domain: Option<&str>,
        name: Option<&str>,
        value: Option<&str>,
    ) -> Option<Self> {
        match (non_empty(domain), non_empty(name), non_empty(value)) {
            (Some(domain), Some(name), Some(value)) => Some(Self {
                domain,
                name,
                value,
            }),
            _ => None,
        }
    }

    /// Render the cluster-API selector string, `{domain}/{name}={value}`.
    pub fn selector(&self) -> String {
        format!("{}/{}={}", self.domain, self.name, self.value)
    }
}

/// Namespace scope for discovery and pod projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    /// Cluster-wide
    All,
    /// An enumerated namespace list
    List(Vec<String>),
}

/// Registry authentication material, one variant active per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryAuthSpec {
    /// Path to a docker-style auth file (`config.json` with an `auths` map)
    Authfile(PathBuf),

    /// Inline credentials
    Creds {
        username: String,
        password: String,
    },

    /// Docker config directory containing `config.json`
    ConfigDir(PathBuf),

    /// No explicit material; the registry client falls back to anonymous
    Default,
}

impl RegistryAuthSpec {
    /// Choose one variant by documented precedence, first non-empty wins:
    /// authfile path, inline `user:pass`, config directory, default.
    ///
    /// Files are not opened or validated here; that is the registry
    /// client's job.
    pub fn select(
        authfile: Option<&str>,
        creds: Option<&str>,
        config_dir: Option<&str>,
    ) -> Result<Self> {
        if let Some(path) = non_empty(authfile) {
            return Ok(Self::Authfile(PathBuf::from(path)));
        }
        if let Some(creds) = non_empty(creds) {
            let (username, password) = creds.split_once(':').ok_or_else(|| {
                KrarError::InvalidConfig(
                    "registry credentials must be of the form 'user:pass'".to_string(),
                )
            })?;
            return Ok(Self::Creds {
                username: username.to_string(),
                password: password.to_string(),
            });
        }
        if let Some(dir) = non_empty(config_dir) {
            return Ok(Self::ConfigDir(PathBuf::from(dir)));
        }
        Ok(Self::Default)
    }
}

/// Immutable configuration for one run.
///
/// Built once at startup from CLI flags and `KRAR_` environment variables,
/// then threaded through the pipeline by shared reference.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Run mode
    pub mode: Mode,

    /// Controller kinds for label-based discovery (cluster-API collection names)
    pub resource_kinds: Vec<String>,

    /// Label triple for discovery; `None` disables label discovery
    pub label: Option<LabelSelector>,

    /// Raw `namespace/Kind/name` entries; malformed entries are skipped
    /// with a warning during discovery
    pub explicit_targets: Vec<String>,

    /// Namespace scope
    pub namespaces: NamespaceScope,

    /// Enumerate actions without mutating the cluster
    pub dry_run: bool,

    /// Restart drift candidates automatically in smart mode
    pub smart_restart: bool,

    /// Registry authentication material
    pub registry_auth: RegistryAuthSpec,
}

impl RunConfig {
    /// Validate the configuration, reporting the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if !self.label_discovery_enabled() && self.explicit_targets.is_empty() {
            return Err(KrarError::InvalidConfig(
                "no discovery source: set resource kinds with a complete label \
                 selector (--resources, --label-domain, --label-name, --label-value) \
                 or explicit targets"
                    .to_string(),
            ));
        }
        if let NamespaceScope::List(list) = &self.namespaces {
            if list.is_empty() {
                return Err(KrarError::InvalidConfig(
                    "scoped discovery requires a non-empty namespace list".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Whether label-based discovery will run: a complete label triple and
    /// at least one resource kind.
    pub fn label_discovery_enabled(&self) -> bool {
        self.label.is_some() && !self.resource_kinds.is_empty()
    }
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve the label value through its fallback chain: explicit value,
/// logical job name, ambient job name. The order is load-bearing.
pub fn resolve_label_value(
    explicit: Option<&str>,
    job_name: Option<&str>,
    ambient_job_name: Option<&str>,
) -> Option<String> {
    non_empty(explicit)
        .or_else(|| non_empty(job_name))
        .or_else(|| non_empty(ambient_job_name))
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
