// src/probe/tcp.rs
use super::traits::{GatewayProbe, ProbeError, ProbeOutcome};
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

/// Connect-only reachability check against the gateway port.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl GatewayProbe for TcpProbe {
    async fn check_liveness(&self) -> Result<ProbeOutcome, ProbeError> {
        let target = self.target();

        // one deadline for resolve and connect together
        let attempt = async {
            let addr = lookup_host(target.as_str())
                .await
                .map_err(|e| ProbeError::Connect(format!("{}: {}", target, e)))?
                .next()
                .ok_or_else(|| ProbeError::Connect(format!("{}: no addresses", target)))?;

            match TcpStream::connect(addr).await {
                Ok(_stream) => Ok(ProbeOutcome::online()),
                Err(e) => {
                    // refused means the gateway is down, not that the check broke
                    debug!(%addr, %e, "gateway connect failed");
                    Ok(ProbeOutcome::offline())
                }
            }
        };

        match timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%target, timeout = ?self.timeout, "gateway check timed out");
                Ok(ProbeOutcome::offline())
            }
        }
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}
