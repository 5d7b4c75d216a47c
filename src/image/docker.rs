//! Image engine backed by the `docker` binary

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TRANSFER_TIMEOUT_SECS;
use crate::image::engine::{EngineError, ImageEngine};

/// Engine implementation shelling out to the docker CLI.
///
/// Every invocation is bounded by the transfer timeout; a hung daemon or
/// stalled registry fails the operation instead of hanging the run.
pub struct DockerCli {
    program: String,
    timeout_secs: u64,
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
            timeout_secs: TRANSFER_TIMEOUT_SECS,
        }
    }

    /// Use a different binary or timeout, for tests and constrained hosts
    pub fn with_program(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    /// Log in to a registry before the first push.
    ///
    /// The password travels over stdin, never argv.
    pub async fn login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
    ) -> Result<(), EngineError> {
        info!("Logging into registry {}", registry);
        self.run(
            "login",
            registry,
            &["login", "--username", username, "--password-stdin", registry],
            Some(password),
        )
        .await
    }

    async fn run(
        &self,
        operation: &'static str,
        reference: &str,
        args: &[&str],
        stdin: Option<&str>,
    ) -> Result<(), EngineError> {
        debug!("{} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await?;
            drop(pipe);
        }

        let waited = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await;

        let output = match waited {
            Ok(output) => output?,
            Err(_) => {
                return Err(EngineError::Timeout {
                    operation,
                    reference: reference.to_string(),
                    seconds: self.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::OperationFailed {
                operation,
                reference: reference.to_string(),
                detail: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ImageEngine for DockerCli {
    async fn pull(&self, image: &str, tag: &str) -> Result<(), EngineError> {
        let reference = format!("{image}:{tag}");
        info!("Pulling image {}", reference);
        self.run("pull", &reference, &["pull", &reference], None).await
    }

    async fn retag(
        &self,
        source_ref: &str,
        target_repo: &str,
        tag: &str,
    ) -> Result<(), EngineError> {
        let target = format!("{target_repo}:{tag}");
        info!("Tagging {} as {}", source_ref, target);
        self.run("tag", &target, &["tag", source_ref, &target], None)
            .await
    }

    async fn push(&self, repo: &str, tag: &str) -> Result<(), EngineError> {
        let reference = format!("{repo}:{tag}");
        info!("Pushing image {}", reference);
        // A push rejected by the registry exits non-zero even when the
        // transport call itself succeeded, so in-band errors fail here too.
        self.run("push", &reference, &["push", &reference], None).await
    }

    async fn build(&self, recipe: &str, target_ref: &str) -> Result<(), EngineError> {
        info!("Building image {}", target_ref);
        // Recipe travels over stdin; there is no build context directory.
        self.run(
            "build",
            target_ref,
            &["build", "--tag", target_ref, "-"],
            Some(recipe),
        )
        .await
    }
}
