// src/probe/traits.rs
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while invoking a probe.
///
/// A probe that runs to completion but finds the gateway down is not an
/// error; it returns `ProbeOutcome::offline()`.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe failed with {code}{}", output_suffix(.output))]
    Exit { code: String, output: String },

    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot reach gateway: {0}")]
    Connect(String),
}

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {}", output)
    }
}

/// First `max` chars of `text`, with an ellipsis appended when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeOutcome {
    pub online: bool,
    pub runtime: Option<String>,
}

impl ProbeOutcome {
    pub fn online() -> Self {
        Self {
            online: true,
            runtime: None,
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_runtime(mut self, runtime: Option<String>) -> Self {
        self.runtime = runtime;
        self
    }
}

/// Liveness check against the external gateway.
#[async_trait]
pub trait GatewayProbe: Send + Sync {
    async fn check_liveness(&self) -> Result<ProbeOutcome, ProbeError>;

    fn name(&self) -> &'static str;
}
