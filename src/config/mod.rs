// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(&contents, is_yaml(path))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_config(contents: &str, yaml: bool) -> Result<Config> {
    if yaml {
        // serde_yaml rejects an empty document, treat it as all defaults
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(contents).context("Failed to parse YAML config")
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_match_the_stock_service() {
        let config = Config::with_defaults();
        assert_eq!(config.server.port, 8082);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.cors);
        assert_eq!(config.gateway.port, 18789);
        assert_eq!(config.gateway.version, "2026.2.9");
        assert_eq!(config.probe.kind, ProbeKind::Tcp);
        assert_eq!(config.agents.len(), 1);
        assert_eq!(config.cron.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn probe_timeout_depends_on_kind() {
        let mut probe = ProbeConfig::default();
        assert_eq!(probe.timeout(), Duration::from_secs(1));
        probe.kind = ProbeKind::PortCheck;
        assert_eq!(probe.timeout(), Duration::from_secs(5));
        assert_eq!(probe.program(), "powershell");
        probe.kind = ProbeKind::Cli;
        assert_eq!(probe.timeout(), Duration::from_secs(10));
        assert_eq!(probe.program(), "openclaw");
        probe.timeout_secs = Some(3);
        assert_eq!(probe.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
server:
  port: 9000
  cors: false
probe:
  kind: cli
  program: /usr/local/bin/openclaw
agents:
  - name: main
    model: MiniMax-M2.5
cron:
  - id: "7"
    name: nightly
"#;
        let config = parse_config(yaml, true).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.cors);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.gateway.port, 18789);
        assert_eq!(config.probe.kind, ProbeKind::Cli);
        assert_eq!(config.probe.program(), "/usr/local/bin/openclaw");
        assert_eq!(config.agents[0].status, None);
        assert_eq!(config.cron[0].last_status, "success");
    }

    #[test]
    fn parses_json_and_empty_yaml() {
        let config = parse_config(r#"{"gateway": {"version": "1.0.0"}}"#, false).unwrap();
        assert_eq!(config.gateway.version, "1.0.0");
        assert_eq!(config.gateway.port, 18789);

        let empty = parse_config("", true).unwrap();
        assert_eq!(empty.server.port, 8082);
        assert!(empty.agents.is_empty());
    }

    #[test]
    fn rejects_unknown_probe_kind() {
        assert!(parse_config("probe:\n  kind: carrier_pigeon\n", true).is_err());
    }

    #[test]
    fn validation_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPort("server")));

        let mut config = Config::default();
        config.probe.timeout_secs = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        let mut config = Config::default();
        config.probe.kind = ProbeKind::Cli;
        config.probe.markers.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoMarkers));

        let mut config = Config::default();
        config.probe.kind = ProbeKind::PortCheck;
        config.probe.program = Some("  ".to_string());
        assert_eq!(config.validate(), Err(ConfigError::EmptyProgram));

        let mut config = Config::default();
        config.metrics.enabled = true;
        config.metrics.port = config.server.port;
        assert_eq!(config.validate(), Err(ConfigError::PortCollision(8082)));

        config.metrics.port = 9090;
        config.metrics.path = "metrics".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMetricsPath(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = load_config("/definitely/not/here.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
