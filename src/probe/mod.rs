//! Gateway liveness probes
//!
//! A probe answers one question: is the gateway up right now? Probes are
//! stateless and shared across requests, so every call does its own I/O.

mod command;
mod tcp;
mod traits;

pub use command::{extract_runtime, CommandProbe, OutputMatcher, MAX_OUTPUT_CHARS};
pub use tcp::TcpProbe;
pub use traits::{truncate_chars, GatewayProbe, ProbeError, ProbeOutcome};

use crate::config::{Config, ProbeKind};
use std::sync::Arc;

/// Build the probe selected by `config.probe.kind`.
pub fn create_probe(config: &Config) -> Arc<dyn GatewayProbe> {
    match command_probe(config) {
        Some(command) => Arc::new(command),
        None => Arc::new(TcpProbe::new(
            config.gateway.host.clone(),
            config.gateway.port,
            config.probe.timeout(),
        )),
    }
}

/// The configured command probe, or `None` for the native TCP check.
///
/// Starts from the matching preset and applies the `probe` section on top.
pub fn command_probe(config: &Config) -> Option<CommandProbe> {
    let probe = &config.probe;
    let timeout = probe.timeout();

    let (preset, matcher) = match probe.kind {
        ProbeKind::Tcp => return None,
        ProbeKind::PortCheck => (
            CommandProbe::powershell_port_check(config.gateway.port, timeout),
            OutputMatcher::exact(probe.expected.clone()),
        ),
        ProbeKind::Cli => (
            CommandProbe::gateway_cli(probe.program(), timeout),
            OutputMatcher::contains(probe.markers.clone()),
        ),
    };

    let args = probe
        .args
        .clone()
        .unwrap_or_else(|| preset.args().to_vec());

    Some(
        CommandProbe::new(probe.program(), args, matcher, timeout)
            .with_runtime_prefix(probe.runtime_prefix.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_probe_by_kind() {
        let mut config = Config::default();
        assert_eq!(create_probe(&config).name(), "tcp");

        config.probe.kind = ProbeKind::Cli;
        assert_eq!(create_probe(&config).name(), "command");

        config.probe.kind = ProbeKind::PortCheck;
        assert_eq!(create_probe(&config).name(), "command");
    }

    #[test]
    fn command_kinds_start_from_their_presets() {
        let mut config = Config::default();
        assert!(command_probe(&config).is_none());

        config.probe.kind = ProbeKind::Cli;
        let cli = command_probe(&config).unwrap();
        assert_eq!(cli.program(), "openclaw");
        assert_eq!(cli.args(), ["gateway", "status"]);
        assert_eq!(cli.timeout(), std::time::Duration::from_secs(10));
        assert_eq!(
            cli.matcher(),
            &OutputMatcher::contains(["RPC probe: ok", "Listening"])
        );
        assert_eq!(cli.runtime_prefix(), "Runtime:");

        config.probe.kind = ProbeKind::PortCheck;
        config.gateway.port = 4100;
        let port_check = command_probe(&config).unwrap();
        assert_eq!(port_check.program(), "powershell");
        assert!(port_check.args().last().unwrap().contains("-Port 4100"));
        assert_eq!(port_check.matcher(), &OutputMatcher::exact("true"));
    }

    #[test]
    fn config_overrides_reach_the_command() {
        let mut config = Config::default();
        config.probe.kind = ProbeKind::PortCheck;
        config.probe.program = Some("sh".to_string());
        config.probe.args = Some(vec!["-c".to_string(), "echo YES".to_string()]);
        config.probe.expected = "Yes".to_string();
        config.probe.runtime_prefix = "Up:".to_string();
        config.probe.timeout_secs = Some(2);

        let command = command_probe(&config).unwrap();
        assert_eq!(command.program(), "sh");
        assert_eq!(command.args(), ["-c", "echo YES"]);
        assert_eq!(command.matcher(), &OutputMatcher::exact("yes"));
        assert_eq!(command.runtime_prefix(), "Up:");
        assert_eq!(command.timeout(), std::time::Duration::from_secs(2));

        config.probe.kind = ProbeKind::Cli;
        config.probe.markers = vec!["ready".to_string()];
        let command = command_probe(&config).unwrap();
        assert_eq!(command.matcher(), &OutputMatcher::contains(["ready"]));
        assert_eq!(command.args(), ["-c", "echo YES"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn configured_command_runs_with_its_own_matcher_and_prefix() {
        let mut config = Config::default();
        config.probe.kind = ProbeKind::Cli;
        config.probe.program = Some("sh".to_string());
        config.probe.args = Some(vec![
            "-c".to_string(),
            "echo 'state: ready'; echo 'Up: 2h 5m'".to_string(),
        ]);
        config.probe.markers = vec!["state: ready".to_string()];
        config.probe.runtime_prefix = "Up:".to_string();

        let outcome = create_probe(&config).check_liveness().await.unwrap();
        assert!(outcome.online);
        assert_eq!(outcome.runtime.as_deref(), Some("2h 5m"));
    }
}
