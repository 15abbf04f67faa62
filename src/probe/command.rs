// src/probe/command.rs
use super::traits::{truncate_chars, GatewayProbe, ProbeError, ProbeOutcome};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Longest slice of command output kept in an exit error.
pub const MAX_OUTPUT_CHARS: usize = 200;

/// Decides liveness from the captured output of a probe command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMatcher {
    /// Trimmed, lowercased output must equal `expected`.
    Exact { expected: String },
    /// Output must contain at least one of `markers`.
    Contains { markers: Vec<String> },
}

impl OutputMatcher {
    pub fn exact(expected: impl Into<String>) -> Self {
        Self::Exact {
            expected: expected.into().to_lowercase(),
        }
    }

    pub fn contains<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Contains {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_online(&self, output: &str) -> bool {
        match self {
            Self::Exact { expected } => output.trim().to_lowercase() == *expected,
            Self::Contains { markers } => markers.iter().any(|m| output.contains(m.as_str())),
        }
    }
}

/// Value of the first line starting with `prefix`, e.g. `Runtime: 3d 4h` -> `3d 4h`.
pub fn extract_runtime(output: &str, prefix: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(prefix))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Runs an external command and interprets its output.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
    matcher: OutputMatcher,
    runtime_prefix: String,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new<I, S>(program: impl Into<String>, args: I, matcher: OutputMatcher, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            matcher,
            runtime_prefix: "Runtime:".to_string(),
            timeout,
        }
    }

    /// `Test-NetConnection` against a local port; prints `True` when reachable.
    pub fn powershell_port_check(port: u16, timeout: Duration) -> Self {
        let script = format!(
            "Test-NetConnection -ComputerName localhost -Port {} -InformationLevel Quiet -WarningAction SilentlyContinue",
            port
        );
        Self::new(
            "powershell",
            ["-NoProfile".to_string(), "-Command".to_string(), script],
            OutputMatcher::exact("true"),
            timeout,
        )
    }

    /// `<program> gateway status`, online when the CLI reports a live RPC probe.
    pub fn gateway_cli(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            program,
            ["gateway", "status"],
            OutputMatcher::contains(["RPC probe: ok", "Listening"]),
            timeout,
        )
    }

    pub fn with_runtime_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.runtime_prefix = prefix.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn matcher(&self) -> &OutputMatcher {
        &self.matcher
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn runtime_prefix(&self) -> &str {
        &self.runtime_prefix
    }

    async fn run(&self) -> Result<String, ProbeError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let child = command.output();

        let output = match timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) if source.kind() == std::io::ErrorKind::NotFound
                || source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                return Err(ProbeError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
            Ok(Err(e)) => return Err(ProbeError::Io(e)),
            // the dropped future kills the child
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        if !output.status.success() {
            let code = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "no exit code (terminated by signal)".to_string(),
            };
            return Err(ProbeError::Exit {
                code,
                output: truncate_chars(combined.trim(), MAX_OUTPUT_CHARS),
            });
        }

        Ok(combined)
    }
}

#[async_trait]
impl GatewayProbe for CommandProbe {
    async fn check_liveness(&self) -> Result<ProbeOutcome, ProbeError> {
        let output = self.run().await?;
        let online = self.matcher.is_online(&output);
        let runtime = extract_runtime(&output, &self.runtime_prefix);

        Ok(ProbeOutcome { online, runtime })
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
