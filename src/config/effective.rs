//! Effective configuration after merging CLI and config file.

use std::path::PathBuf;

use super::error::ConfigError;
use super::types::{Config, DEFAULT_NAMESPACE, DEFAULT_WORKERS};
use crate::cli::{Cli, OutputFormat};

/// Settings of one run after merging CLI, config file and defaults.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub namespace: String,
    pub kubeconfig: Option<PathBuf>,
    pub kubectl: PathBuf,
    pub format: OutputFormat,
    pub directory: PathBuf,
    pub workers: usize,
    pub quiet: bool,
    pub verbose: bool,
    pub list: bool,
    pub pods: Vec<String>,
    pub containers: Vec<String>,
    pub shells: Vec<String>,
    pub utilities: Vec<String>,
}

impl EffectiveConfig {
    /// Merge CLI options with config file settings.
    ///
    /// - Value options: CLI takes precedence, fallback to config, then default
    /// - Boolean flags: CLI OR config (either can enable)
    pub fn from_cli_and_config(cli: &Cli, config: &Config) -> Result<Self, ConfigError> {
        let format = match (cli.format, config.scan.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(raw)) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "scan.format".to_string(),
                message,
            })?,
            (None, None) => OutputFormat::default(),
        };

        let workers = cli
            .workers
            .or(config.scan.workers)
            .unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scan.workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let directory = cli
            .directory
            .clone()
            .or_else(|| config.scan.directory.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let namespace = cli
            .namespace
            .clone()
            .or_else(|| config.namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let kubeconfig = cli
            .kubeconfig
            .clone()
            .or_else(|| config.kubeconfig.as_ref().map(PathBuf::from));

        let kubectl = cli
            .kubectl
            .clone()
            .or_else(|| config.kubectl.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("kubectl"));

        Ok(Self {
            namespace,
            kubeconfig,
            kubectl,
            format,
            directory,
            workers,
            quiet: cli.quiet || config.scan.quiet,
            verbose: cli.verbose,
            list: cli.list,
            pods: cli.pods.clone(),
            containers: cli.containers.clone(),
            shells: config.probe.shells.clone(),
            utilities: config.probe.utilities.clone(),
        })
    }
}
