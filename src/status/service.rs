// src/status/service.rs
use super::report::{AgentStatus, CronJobStatus, GatewayState, GatewayStatus, StatusReport};
use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::probe::{truncate_chars, GatewayProbe, ProbeOutcome};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Longest `gateway.error` string put into a report.
pub const MAX_ERROR_CHARS: usize = 200;

/// Runs the gateway probe and turns the outcome into a `StatusReport`.
#[derive(Clone)]
pub struct StatusService {
    config: Arc<Config>,
    probe: Arc<dyn GatewayProbe>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl StatusService {
    pub fn new(config: Arc<Config>, probe: Arc<dyn GatewayProbe>) -> Self {
        Self {
            config,
            probe,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    pub async fn report(&self) -> StatusReport {
        let start = Instant::now();
        let result = self.probe.check_liveness().await;
        let elapsed = start.elapsed();

        let report = match result {
            Ok(outcome) => {
                debug!(
                    probe = self.probe.name(),
                    online = outcome.online,
                    runtime = ?outcome.runtime,
                    ?elapsed,
                    "gateway probe finished"
                );
                self.build_report(outcome)
            }
            Err(e) => {
                warn!(probe = self.probe.name(), %e, ?elapsed, "gateway probe failed");
                self.error_report(truncate_chars(&e.to_string(), MAX_ERROR_CHARS))
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(report.gateway.status, elapsed);
        }

        report
    }

    fn build_report(&self, outcome: ProbeOutcome) -> StatusReport {
        let state = if outcome.online {
            GatewayState::Online
        } else {
            GatewayState::Offline
        };

        let agents = self
            .config
            .agents
            .iter()
            .map(|agent| AgentStatus {
                name: agent.name.clone(),
                status: agent
                    .status
                    .clone()
                    .unwrap_or_else(|| state.as_str().to_string()),
                model: agent.model.clone(),
            })
            .collect();

        let cron = self
            .config
            .cron
            .iter()
            .map(|job| CronJobStatus {
                id: job.id.clone(),
                name: job.name.clone(),
                last_status: job.last_status.clone(),
            })
            .collect();

        StatusReport {
            gateway: self.gateway(state, outcome.runtime, None),
            agents,
            cron,
            updated_at: now_millis(),
        }
    }

    fn error_report(&self, error: String) -> StatusReport {
        StatusReport {
            gateway: self.gateway(GatewayState::Error, None, Some(error)),
            agents: Vec::new(),
            cron: Vec::new(),
            updated_at: now_millis(),
        }
    }

    fn gateway(
        &self,
        status: GatewayState,
        runtime: Option<String>,
        error: Option<String>,
    ) -> GatewayStatus {
        GatewayStatus {
            status,
            version: self.config.gateway.version.clone(),
            port: self.config.gateway.port,
            runtime,
            error,
            last_update: None,
        }
    }
}

fn now_millis() -> String {
    Utc::now().timestamp_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::probe::ProbeError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed(fn() -> Result<ProbeOutcome, ProbeError>);

    #[async_trait]
    impl GatewayProbe for Fixed {
        async fn check_liveness(&self) -> Result<ProbeOutcome, ProbeError> {
            (self.0)()
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn service(probe: fn() -> Result<ProbeOutcome, ProbeError>) -> StatusService {
        let mut config = Config::with_defaults();
        config.agents.push(AgentConfig {
            name: "pinned".to_string(),
            model: "m".to_string(),
            status: Some("idle".to_string()),
        });
        StatusService::new(Arc::new(config), Arc::new(Fixed(probe)))
    }

    #[tokio::test]
    async fn online_report_lists_agents_and_cron() {
        let report = service(|| Ok(ProbeOutcome::online().with_runtime(Some("3d 4h".into()))))
            .report()
            .await;

        assert_eq!(report.gateway.status, GatewayState::Online);
        assert_eq!(report.gateway.runtime.as_deref(), Some("3d 4h"));
        assert_eq!(report.gateway.error, None);
        assert_eq!(report.agents[0].status, "online");
        assert_eq!(report.agents[0].model, "MiniMax-M2.5");
        assert_eq!(report.agents[1].status, "idle");
        assert_eq!(report.cron.len(), 3);
        assert!(report.updated_at.parse::<i64>().unwrap() > 0);
    }

    #[tokio::test]
    async fn offline_agents_follow_gateway() {
        let report = service(|| Ok(ProbeOutcome::offline())).report().await;
        assert_eq!(report.gateway.status, GatewayState::Offline);
        assert_eq!(report.agents[0].status, "offline");
        assert_eq!(report.gateway.version, "2026.2.9");
        assert_eq!(report.gateway.port, 18789);
    }

    #[tokio::test]
    async fn probe_error_empties_lists_and_keeps_constants() {
        let report = service(|| Err(ProbeError::Timeout(Duration::from_secs(5))))
            .report()
            .await;

        assert_eq!(report.gateway.status, GatewayState::Error);
        assert_eq!(
            report.gateway.error.as_deref(),
            Some("probe timed out after 5s")
        );
        assert_eq!(report.gateway.version, "2026.2.9");
        assert_eq!(report.gateway.port, 18789);
        assert!(report.agents.is_empty());
        assert!(report.cron.is_empty());
    }

    #[tokio::test]
    async fn long_error_text_is_capped() {
        let report = service(|| {
            Err(ProbeError::Connect(format!("gateway.local: {}", "é".repeat(5000))))
        })
        .report()
        .await;

        let error = report.gateway.error.unwrap();
        assert_eq!(error.chars().count(), MAX_ERROR_CHARS + 1);
        assert!(error.starts_with("cannot reach gateway: gateway.local: é"));
        assert!(error.ends_with('…'));
    }
}
