// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub probe: ProbeConfig,
    pub agents: Vec<AgentConfig>,
    pub cron: Vec<CronJobConfig>,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Attach CORS headers to every response and answer `OPTIONS`.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            cors: true,
        }
    }
}

/// What we report about the gateway regardless of probe outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18789,
            version: "2026.2.9".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Native TCP connect test against `gateway.host:gateway.port`.
    #[default]
    Tcp,
    /// Shell port check whose trimmed output must equal `expected`.
    PortCheck,
    /// Gateway management CLI `status` subcommand, scanned for `markers`.
    Cli,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub kind: ProbeKind,
    pub timeout_secs: Option<u64>,
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub expected: String,
    pub markers: Vec<String>,
    pub runtime_prefix: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: ProbeKind::default(),
            timeout_secs: None,
            program: None,
            args: None,
            expected: "true".to_string(),
            markers: vec!["RPC probe: ok".to_string(), "Listening".to_string()],
            runtime_prefix: "Runtime:".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        let secs = self.timeout_secs.unwrap_or(match self.kind {
            ProbeKind::Tcp => 1,
            ProbeKind::PortCheck => 5,
            ProbeKind::Cli => 10,
        });
        Duration::from_secs(secs)
    }

    pub fn program(&self) -> &str {
        match (&self.program, self.kind) {
            (Some(program), _) => program,
            (None, ProbeKind::PortCheck) => "powershell",
            (None, _) => "openclaw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    /// Fixed status; when absent the agent mirrors the gateway.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronJobConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_last_status")]
    pub last_status: String,
}

fn default_last_status() -> String {
    "success".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} port must be non-zero")]
    ZeroPort(&'static str),

    #[error("probe timeout must be at least one second")]
    ZeroTimeout,

    #[error("probe program must not be empty")]
    EmptyProgram,

    #[error("cli probe needs at least one output marker")]
    NoMarkers,

    #[error("metrics path must start with '/': {0}")]
    InvalidMetricsPath(String),

    #[error("metrics port {0} collides with the server port")]
    PortCollision(u16),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ZeroPort("server"));
        }
        if self.gateway.port == 0 {
            return Err(ConfigError::ZeroPort("gateway"));
        }
        if self.probe.timeout().is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.probe.kind != ProbeKind::Tcp && self.probe.program().trim().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        if self.probe.kind == ProbeKind::Cli && self.probe.markers.is_empty() {
            return Err(ConfigError::NoMarkers);
        }
        if self.metrics.enabled {
            if !self.metrics.path.starts_with('/') {
                return Err(ConfigError::InvalidMetricsPath(self.metrics.path.clone()));
            }
            if self.metrics.port == 0 {
                return Err(ConfigError::ZeroPort("metrics"));
            }
            if self.metrics.port == self.server.port {
                return Err(ConfigError::PortCollision(self.metrics.port));
            }
        }
        Ok(())
    }

    /// Built-in defaults plus the stock agent and cron listing.
    pub fn with_defaults() -> Self {
        Self {
            agents: vec![AgentConfig {
                name: "main".to_string(),
                model: "MiniMax-M2.5".to_string(),
                status: None,
            }],
            cron: vec![
                CronJobConfig {
                    id: "1".to_string(),
                    name: "最佳实践收集".to_string(),
                    last_status: default_last_status(),
                },
                CronJobConfig {
                    id: "2".to_string(),
                    name: "Gateway健康检查".to_string(),
                    last_status: default_last_status(),
                },
                CronJobConfig {
                    id: "3".to_string(),
                    name: "稳定性复盘".to_string(),
                    last_status: default_last_status(),
                },
            ],
            ..Self::default()
        }
    }
}
