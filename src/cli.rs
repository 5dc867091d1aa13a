use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Report format requested for every container.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw script output, ANSI colour codes included
    #[default]
    Ansi,
    /// The script's own plain-text mode
    Text,
    /// ANSI output converted to an XHTML page
    Html,
}

impl OutputFormat {
    /// File extension used for reports of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ansi => "ansi",
            Self::Text => "text",
            Self::Html => "html",
        }
    }

    /// Whether the script has to be asked for its plain-text mode.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ansi" => Ok(Self::Ansi),
            "text" | "txt" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "invalid output format '{other}', valid values are ansi, text or html"
            )),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "k8s-lse",
    version,
    about = "Enumerates Kubernetes containers with the Linux Smart Enumeration script",
    long_about = "k8s-lse enumerates containers in a Kubernetes namespace with an embedded Linux \
enumeration script. It can enumerate every container of a namespace, selected pods or selected \
containers of a single pod, and saves one report per container in ansi, text or html format."
)]
pub struct Cli {
    /// Path to the kubeconfig file (defaults to kubectl's own lookup)
    #[arg(short, long)]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace to enumerate [default: default]
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format of the reports [default: ansi]
    #[arg(short = 'o', long = "output", value_enum)]
    pub format: Option<OutputFormat>,

    /// Pod or comma-separated pods whose containers are enumerated
    #[arg(short, long, value_delimiter = ',')]
    pub pods: Vec<String>,

    /// Container or comma-separated containers of a single pod
    #[arg(short, long, value_delimiter = ',')]
    pub containers: Vec<String>,

    /// Directory the reports are saved to [default: current directory]
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Quiet execution: no status output and no confirmation prompt
    #[arg(short, long)]
    pub quiet: bool,

    /// List pods and containers without enumerating them
    #[arg(short, long)]
    pub list: bool,

    /// Maximum number of simultaneous remote sessions [default: 200]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Explicit configuration file (yaml, json or toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// kubectl binary used to reach the cluster [default: kubectl]
    #[arg(long)]
    pub kubectl: Option<PathBuf>,

    /// Verbose diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}
