//! CLI flag surface and run-configuration assembly.
//!
//! Every flag is shadowed by a `KRAR_`-prefixed environment variable;
//! flags given on the command line override the environment.

use clap::Parser;

use krar_core::config::{resolve_label_value, split_list};
use krar_core::{LabelSelector, Mode, NamespaceScope, RegistryAuthSpec, Result, RunConfig};

/// Ambient job-name variable, the last fallback for the label value.
const AMBIENT_JOB_NAME: &str = "JOB_NAME";

/// krar - rollout and restart helper for Kubernetes workload controllers.
#[derive(Parser, Debug)]
#[command(name = "krar", version, about)]
pub struct Cli {
    /// Comma-separated controller kinds for label discovery
    #[arg(short = 'r', long, env = "KRAR_RESOURCES")]
    pub resources: Option<String>,

    /// Label prefix
    #[arg(short = 'd', long, env = "KRAR_LABEL_DOMAIN")]
    pub label_domain: Option<String>,

    /// Label key
    #[arg(short = 'n', long, env = "KRAR_LABEL_NAME")]
    pub label_name: Option<String>,

    /// Label value; falls back to the job name, then the ambient JOB_NAME
    #[arg(short = 'v', long, env = "KRAR_LABEL_VALUE")]
    pub label_value: Option<String>,

    /// Comma-separated explicit targets (namespace/Kind/name)
    #[arg(short = 't', long, env = "KRAR_TARGETS")]
    pub targets: Option<String>,

    /// Discover cluster-wide (the default)
    #[arg(
        short = 'A',
        long,
        env = "KRAR_NAMESPACES_ALL",
        overrides_with = "no_namespaces_all"
    )]
    pub namespaces_all: bool,

    /// Restrict discovery to the namespaces given with --namespaces
    #[arg(long, overrides_with = "namespaces_all")]
    pub no_namespaces_all: bool,

    /// Comma-separated namespaces (implies scoped discovery)
    #[arg(short = 'N', long, env = "KRAR_NAMESPACES")]
    pub namespaces: Option<String>,

    /// Enumerate actions without mutating the cluster
    #[arg(long, env = "KRAR_DRY_RUN")]
    pub dry_run: bool,

    /// Logical job name
    #[arg(short = 'j', long, env = "KRAR_JOB_NAME")]
    pub job_name: Option<String>,

    /// Run mode: rollout or smart
    #[arg(long, env = "KRAR_MODE")]
    pub mode: Option<String>,

    /// Shorthand for --mode smart
    #[arg(long)]
    pub smart: bool,

    /// Restart drift candidates automatically in smart mode
    #[arg(long, env = "KRAR_SMART_RESTART")]
    pub smart_restart: bool,

    /// Path to a docker-style registry auth file
    #[arg(long, env = "KRAR_REGISTRY_AUTHFILE")]
    pub registry_authfile: Option<String>,

    /// Inline registry credentials, user:pass
    #[arg(long, env = "KRAR_REGISTRY_CREDS")]
    pub registry_creds: Option<String>,

    /// Docker config directory containing config.json
    #[arg(long, env = "KRAR_DOCKER_CONFIG")]
    pub docker_config: Option<String>,
}

impl Cli {
    /// Assemble and validate the immutable run configuration.
    pub fn into_config(self) -> Result<RunConfig> {
        let ambient = std::env::var(AMBIENT_JOB_NAME).ok();
        self.into_config_with_ambient(ambient.as_deref())
    }

    /// Like [`Cli::into_config`], with the ambient job name passed in.
    pub fn into_config_with_ambient(self, ambient_job_name: Option<&str>) -> Result<RunConfig> {
        let mode = if self.smart {
            Mode::Smart
        } else {
            self.mode.as_deref().unwrap_or("rollout").parse()?
        };

        let resource_kinds = self
            .resources
            .as_deref()
            .map(split_list)
            .unwrap_or_default();

        let label_value = resolve_label_value(
            self.label_value.as_deref(),
            self.job_name.as_deref(),
            ambient_job_name,
        );
        let label = LabelSelector::from_parts(
            self.label_domain.as_deref(),
            self.label_name.as_deref(),
            label_value.as_deref(),
        );
        if !resource_kinds.is_empty() && label.is_none() {
            tracing::warn!(
                "Label selector is incomplete (need domain, name, and value); \
                 label discovery disabled"
            );
        }

        let explicit_targets = self.targets.as_deref().map(split_list).unwrap_or_default();

        let namespace_list = self
            .namespaces
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        let namespaces = if !namespace_list.is_empty() {
            NamespaceScope::List(namespace_list)
        } else if self.no_namespaces_all && !self.namespaces_all {
            // Scoped discovery without a list; validation reports it.
            NamespaceScope::List(vec![])
        } else {
            NamespaceScope::All
        };

        let registry_auth = RegistryAuthSpec::select(
            self.registry_authfile.as_deref(),
            self.registry_creds.as_deref(),
            self.docker_config.as_deref(),
        )?;

        let config = RunConfig {
            mode,
            resource_kinds,
            label,
            explicit_targets,
            namespaces,
            dry_run: self.dry_run,
            smart_restart: self.smart_restart,
            registry_auth,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("krar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_to_rollout_mode() {
        let cli = parse(&["-t", "ns1/Deployment/a"]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(config.mode, Mode::Rollout);
        assert!(!config.dry_run);
        assert!(!config.smart_restart);
        assert_eq!(config.namespaces, NamespaceScope::All);
    }

    #[test]
    fn test_smart_shorthand() {
        let cli = parse(&["--smart", "-t", "ns1/Deployment/a"]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(config.mode, Mode::Smart);
    }

    #[test]
    fn test_invalid_mode_is_config_error() {
        let cli = parse(&["--mode", "watch", "-t", "ns1/Deployment/a"]);
        assert!(cli.into_config_with_ambient(None).is_err());
    }

    #[test]
    fn test_short_flags_build_label_selector() {
        let cli = parse(&[
            "-r",
            "deployments,daemonsets",
            "-d",
            "x.io",
            "-n",
            "policy",
            "-v",
            "nightly",
        ]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(config.resource_kinds, vec!["deployments", "daemonsets"]);
        assert_eq!(config.label.unwrap().selector(), "x.io/policy=nightly");
    }

    #[test]
    fn test_label_value_falls_back_to_job_name() {
        let cli = parse(&["-r", "deployments", "-d", "x.io", "-n", "policy", "-j", "monthly"]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(config.label.unwrap().value, "monthly");
    }

    #[test]
    fn test_label_value_falls_back_to_ambient_job_name() {
        let cli = parse(&["-r", "deployments", "-d", "x.io", "-n", "policy"]);
        let config = cli.into_config_with_ambient(Some("cron-1234")).unwrap();
        assert_eq!(config.label.unwrap().value, "cron-1234");
    }

    #[test]
    fn test_incomplete_label_without_targets_fails() {
        let cli = parse(&["-r", "deployments", "-d", "x.io"]);
        assert!(cli.into_config_with_ambient(None).is_err());
    }

    #[test]
    fn test_namespaces_imply_scoped_discovery() {
        let cli = parse(&["-t", "ns1/Deployment/a", "-N", "ns1, ns2"]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(
            config.namespaces,
            NamespaceScope::List(vec!["ns1".to_string(), "ns2".to_string()])
        );
    }

    #[test]
    fn test_no_namespaces_all_without_list_fails() {
        let cli = parse(&["-t", "ns1/Deployment/a", "--no-namespaces-all"]);
        assert!(cli.into_config_with_ambient(None).is_err());
    }

    #[test]
    fn test_targets_split_on_comma() {
        let cli = parse(&["-t", "ns1/Deployment/a, ns2/DaemonSet/b"]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(
            config.explicit_targets,
            vec!["ns1/Deployment/a", "ns2/DaemonSet/b"]
        );
    }

    #[test]
    fn test_registry_auth_precedence() {
        let cli = parse(&[
            "-t",
            "ns1/Deployment/a",
            "--registry-creds",
            "user:pass",
            "--docker-config",
            "/tmp/docker",
        ]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert_eq!(
            config.registry_auth,
            RegistryAuthSpec::Creds {
                username: "user".to_string(),
                password: "pass".to_string(),
            }
        );
    }

    #[test]
    fn test_dry_run_flag() {
        let cli = parse(&["-t", "ns1/Deployment/a", "--dry-run"]);
        let config = cli.into_config_with_ambient(None).unwrap();
        assert!(config.dry_run);
    }
}
