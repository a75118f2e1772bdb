use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// LANBoard sync server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "lanboard-server", version, about = "LAN shared content board server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "LANBOARD_PORT", default_value = "3000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "LANBOARD_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./lanboard.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "LANBOARD_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (JSON snapshots, uploaded files)
    #[arg(long, env = "LANBOARD_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Uploads configuration (loaded from [uploads] section in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub uploads: Option<UploadsConfig>,
}

/// Configuration for the shared uploads directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Maximum upload size in megabytes (default: 100)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u32,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 100,
        }
    }
}

fn default_max_upload_size() -> u32 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
            config: "./lanboard.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            uploads: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (LANBOARD_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("LANBOARD_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }

    pub fn max_upload_size_mb(&self) -> u32 {
        self.uploads
            .as_ref()
            .map(|u| u.max_upload_size_mb)
            .unwrap_or_else(|| UploadsConfig::default().max_upload_size_mb)
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# LANBoard Server Configuration
# Place this file at ./lanboard.toml or specify with --config <path>
# All settings can be overridden via environment variables (LANBOARD_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 3000)
# port = 3000

# Bind address (default: 0.0.0.0 — all interfaces, so other LAN devices can connect)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the content/upload JSON snapshots and uploaded files
# data_dir = "./data"

# ---- Uploads ----
# [uploads]

# Maximum upload size in megabytes (default: 100)
# max_upload_size_mb = 100
"#
    .to_string()
}
