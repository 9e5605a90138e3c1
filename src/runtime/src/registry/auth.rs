//! Registry credential resolution.
//!
//! Turns the selected [`RegistryAuthSpec`] into per-registry basic
//! credentials. Docker-style auth files (`config.json` with an `auths`
//! map) are parsed lazily, at first lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::Deserialize;

use krar_core::{KrarError, RegistryAuthSpec, Result};

/// Per-registry entry in a docker config file.
#[derive(Debug, Clone, Default, Deserialize)]
struct AuthEntry {
    username: Option<String>,
    password: Option<String>,
    /// base64-encoded `user:pass`
    auth: Option<String>,
}

/// The subset of `config.json` the resolver reads.
#[derive(Debug, Default, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

/// Resolves registry credentials from the selected auth material.
pub struct CredentialResolver {
    spec: RegistryAuthSpec,
}

impl CredentialResolver {
    /// Create a resolver for the given auth spec.
    pub fn new(spec: RegistryAuthSpec) -> Self {
        Self { spec }
    }

    /// Resolve basic credentials for `registry`.
    ///
    /// Returns `None` when the run should proceed anonymously: no material
    /// configured, or the configured file has no entry for this registry.
    pub fn resolve(&self, registry: &str) -> Result<Option<(String, String)>> {
        match &self.spec {
            RegistryAuthSpec::Creds { username, password } => {
                Ok(Some((username.clone(), password.clone())))
            }
            RegistryAuthSpec::Authfile(path) => lookup(&load_config(path)?, registry),
            RegistryAuthSpec::ConfigDir(dir) => {
                lookup(&load_config(&dir.join("config.json"))?, registry)
            }
            RegistryAuthSpec::Default => match default_config_path() {
                Some(path) if path.exists() => lookup(&load_config(&path)?, registry),
                _ => Ok(None),
            },
        }
    }
}

/// Default docker config location, `~/.docker/config.json` unless
/// `DOCKER_CONFIG` overrides the directory.
fn default_config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCKER_CONFIG") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir).join("config.json"));
        }
    }
    dirs::home_dir().map(|home| home.join(".docker").join("config.json"))
}

fn load_config(path: &Path) -> Result<DockerConfig> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        KrarError::Registry {
            registry: String::new(),
            message: format!("failed to read auth file {}: {e}", path.display()),
        }
    })?;
    serde_json::from_str(&data).map_err(|e| KrarError::Registry {
        registry: String::new(),
        message: format!("failed to parse auth file {}: {e}", path.display()),
    })
}

/// Find the entry for `registry`, trying the exact host, the normalized
/// Docker Hub host, and the legacy Docker Hub URL key.
fn lookup(config: &DockerConfig, registry: &str) -> Result<Option<(String, String)>> {
    let normalized = normalize_registry(registry);
    let candidates = [
        registry.to_string(),
        normalized.clone(),
        format!("https://{normalized}/v1/"),
    ];
    for key in &candidates {
        if let Some(entry) = config.auths.get(key) {
            return decode_entry(entry, registry).map(Some);
        }
    }
    Ok(None)
}

fn decode_entry(entry: &AuthEntry, registry: &str) -> Result<(String, String)> {
    if let (Some(username), Some(password)) = (&entry.username, &entry.password) {
        return Ok((username.clone(), password.clone()));
    }
    if let Some(auth) = &entry.auth {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(auth.trim())
            .map_err(|e| KrarError::Registry {
                registry: registry.to_string(),
                message: format!("invalid base64 auth entry: {e}"),
            })?;
        let decoded = String::from_utf8(decoded).map_err(|e| KrarError::Registry {
            registry: registry.to_string(),
            message: format!("auth entry is not valid UTF-8: {e}"),
        })?;
        let (username, password) = decoded.split_once(':').ok_or_else(|| {
            KrarError::Registry {
                registry: registry.to_string(),
                message: "auth entry does not decode to user:pass".to_string(),
            }
        })?;
        return Ok((username.to_string(), password.to_string()));
    }
    Err(KrarError::Registry {
        registry: registry.to_string(),
        message: "auth entry carries neither credentials nor an auth blob".to_string(),
    })
}

/// Normalize Docker Hub aliases to "index.docker.io".
fn normalize_registry(registry: &str) -> String {
    let r = registry.trim().to_lowercase();
    if r == "docker.io" || r == "registry-1.docker.io" {
        "index.docker.io".to_string()
    } else {
        r
    }
}
