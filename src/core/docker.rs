/// Docker and Docker Compose integration
///
/// Lifecycle operations go through `docker compose` subprocesses; container
/// inspection goes through the Docker API. Data transfers between the host
/// and containers run as explicit producer/consumer subprocess pairs with
/// exit-status checking on both ends.

use anyhow::{anyhow, bail, Context, Result};
use bollard::container::ListContainersOptions;
use bollard::models::ContainerSummary;
use bollard::Docker;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::config::DatabaseCredentials;
use crate::utils::{get_project_root, ContainerState, DB_SERVICE, DEFAULT_COMPOSE_FILE, HELPER_IMAGE};

#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub name: String,
    pub image: String,
    pub status: String,
    pub state: ContainerState,
    pub health: Option<String>,
}

#[derive(Clone)]
pub struct DockerManager {
    docker: Docker,
    project_root: PathBuf,
    compose_file: PathBuf,
    instance: String,
}

impl DockerManager {
    /// Create a new Docker manager for an instance (synchronous version)
    pub fn new_sync(instance: &str) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker daemon. Is Docker running?")?;

        let project_root = get_project_root()?;
        let compose_file = project_root.join(DEFAULT_COMPOSE_FILE);

        if !compose_file.exists() {
            return Err(anyhow!(
                "{} not found at {}",
                DEFAULT_COMPOSE_FILE,
                compose_file.display()
            ));
        }

        Ok(Self {
            docker,
            project_root,
            compose_file,
            instance: instance.to_string(),
        })
    }

    /// Create a new Docker manager (async wrapper for compatibility)
    pub async fn new(instance: &str) -> Result<Self> {
        Self::new_sync(instance)
    }

    /// Get project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Full name of a data volume of this instance
    pub fn volume_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.instance, suffix)
    }

    /// Base `docker compose` command scoped to this instance's project
    fn compose_base(&self) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("compose")
            .arg("-p")
            .arg(&self.instance)
            .current_dir(&self.project_root);
        cmd
    }

    /// Execute a docker-compose command and capture its output
    pub async fn compose_command(&self, args: &[&str]) -> Result<String> {
        let output = self
            .compose_base()
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute docker compose command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Docker compose command failed: {}", stderr);
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Start the whole stack
    pub async fn up_detached(&self) -> Result<()> {
        self.compose_command(&["up", "-d"]).await?;
        Ok(())
    }

    /// Recreate all service containers without starting them, so the named
    /// volumes exist before data is replayed into them
    pub async fn create_stopped(&self) -> Result<()> {
        self.compose_command(&["up", "--no-start"]).await?;
        Ok(())
    }

    /// Tear down the stack including its named volumes. Irreversible.
    pub async fn down_with_volumes(&self) -> Result<()> {
        self.compose_command(&["down", "-v"]).await?;
        Ok(())
    }

    /// Stop all services
    pub async fn stop_all(&self) -> Result<()> {
        self.compose_command(&["stop"]).await?;
        Ok(())
    }

    /// Stop specific service
    pub async fn stop_service(&self, service: &str) -> Result<()> {
        self.compose_command(&["stop", service]).await?;
        Ok(())
    }

    /// Start specific service
    pub async fn start_service(&self, service: &str) -> Result<()> {
        self.compose_command(&["start", service]).await?;
        Ok(())
    }

    /// Restart specific service
    pub async fn restart_service(&self, service: &str) -> Result<()> {
        self.compose_command(&["restart", service]).await?;
        Ok(())
    }

    /// Get logs for a service
    pub async fn get_logs(&self, service: &str, tail: Option<usize>) -> Result<String> {
        let mut args = vec!["logs"];
        let tail_str;
        if let Some(n) = tail {
            tail_str = n.to_string();
            args.push("--tail");
            args.push(&tail_str);
        }
        args.push(service);

        self.compose_command(&args).await
    }

    /// Follow a service's logs on the terminal until interrupted
    pub async fn follow_logs(&self, service: &str) -> Result<()> {
        self.compose_base()
            .args(["logs", "-f", service])
            .status()
            .await
            .context("Failed to spawn docker compose logs")?;
        Ok(())
    }

    /// List the instance's containers
    pub async fn list_containers(&self) -> Result<Vec<ContainerInfo>> {
        let mut filters = HashMap::new();
        filters.insert(
            "label".to_string(),
            vec![format!("com.docker.compose.project={}", self.instance)],
        );

        let options = Some(ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        });

        let containers = self.docker.list_containers(options).await?;

        let mut infos: Vec<ContainerInfo> = containers
            .into_iter()
            .map(Self::container_summary_to_info)
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(infos)
    }

    /// Check if Docker daemon is accessible
    pub async fn check_docker(&self) -> Result<bool> {
        match self.docker.ping().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// Convert ContainerSummary to ContainerInfo
    fn container_summary_to_info(summary: ContainerSummary) -> ContainerInfo {
        let name = summary
            .names
            .as_ref()
            .and_then(|names| names.first())
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let status = summary.status.clone().unwrap_or_else(|| "unknown".to_string());
        let state = summary
            .state
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("unknown")
            .into();

        let health = summary.status.as_ref().and_then(|s| {
            // Check unhealthy BEFORE healthy (unhealthy contains "healthy" as substring)
            if s.contains("unhealthy") {
                Some("unhealthy".to_string())
            } else if s.contains("starting") {
                Some("starting".to_string())
            } else if s.contains("healthy") {
                Some("healthy".to_string())
            } else {
                None
            }
        });

        ContainerInfo {
            name,
            image: summary.image.unwrap_or_else(|| "unknown".to_string()),
            status,
            state,
            health,
        }
    }

    /// Parse docker-compose.yml and return the defined service names
    pub fn compose_services(&self) -> Result<Vec<String>> {
        use serde_yaml::Value;

        let compose_content = std::fs::read_to_string(&self.compose_file)
            .context("Failed to read docker-compose.yml")?;

        let yaml: Value = serde_yaml::from_str(&compose_content)
            .context("Failed to parse docker-compose.yml")?;

        let services = yaml
            .get("services")
            .and_then(|s| s.as_mapping())
            .map(|map| {
                map.keys()
                    .filter_map(|k| k.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(services)
    }

    /// Check that every expected service is defined in the compose file
    pub fn verify_services(&self, expected: &[&str]) -> Result<()> {
        let defined = self.compose_services()?;
        for service in expected {
            if !defined.iter().any(|s| s == service) {
                bail!(
                    "Service '{}' is not defined in {}",
                    service,
                    self.compose_file.display()
                );
            }
        }
        Ok(())
    }

    /// Command for `docker compose exec -T` in a running service container
    pub fn exec_command(&self, service: &str, env: &[(&str, &str)], args: &[&str]) -> Command {
        let mut cmd = self.compose_base();
        cmd.arg("exec").arg("-T");
        for (key, value) in env {
            cmd.arg("-e").arg(format!("{}={}", key, value));
        }
        cmd.arg(service).args(args);
        cmd
    }

    /// Disposable helper container with a named volume mounted read-only at
    /// /data, used for raw volume access during backup
    pub fn volume_reader(&self, volume: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("run")
            .arg("--rm")
            .arg("-v")
            .arg(format!("{}:/data:ro", volume))
            .arg(HELPER_IMAGE)
            .args(args);
        cmd
    }

    /// Probe database readiness with a trivial status query
    pub async fn ping_database(&self, db: &DatabaseCredentials) -> bool {
        let mut cmd = self.exec_command(
            DB_SERVICE,
            &[("MYSQL_PWD", db.password.as_str())],
            &["mysql", "-u", db.user.as_str(), "-e", "status"],
        );

        matches!(
            cmd.stdout(Stdio::null()).stderr(Stdio::null()).status().await,
            Ok(status) if status.success()
        )
    }

    /// Run `cmd` with its stdout captured straight into `dest`, checking the
    /// exit status. Returns the number of bytes written.
    pub async fn capture_to_file(mut cmd: Command, dest: &Path, what: &str) -> Result<u64> {
        let file = std::fs::File::create(dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let status = cmd
            .stdout(Stdio::from(file))
            .status()
            .await
            .with_context(|| format!("Failed to run {}", what))?;

        if !status.success() {
            bail!("{} exited with {}", what, status);
        }

        let len = std::fs::metadata(dest)
            .with_context(|| format!("Failed to stat {}", dest.display()))?
            .len();
        Ok(len)
    }

    /// Run `producer | consumer` as an explicit two-stage transfer: copy the
    /// producer's stdout into the consumer's stdin, close the stream, then
    /// reap and check both exit statuses. A non-success exit status takes
    /// precedence over a transfer I/O error, so a consumer that dies
    /// mid-stream is reported by its own exit status rather than as a
    /// broken pipe. Returns the number of bytes transferred.
    pub async fn pipe_commands(
        mut producer: Command,
        mut consumer: Command,
        what: &str,
    ) -> Result<u64> {
        let mut producer_child = producer
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn producer for {}", what))?;
        let mut consumer_child = consumer
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn consumer for {}", what))?;

        let mut source = producer_child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Producer stdout was not captured for {}", what))?;
        let mut sink = consumer_child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Consumer stdin was not captured for {}", what))?;

        let copy_result = tokio::io::copy(&mut source, &mut sink).await;

        // Close both pipe ends whether or not the copy succeeded, so neither
        // child can block on a full or half-open pipe while being reaped.
        // The consumer only sees EOF once its stdin handle is closed.
        drop(source);
        let _ = sink.shutdown().await;
        drop(sink);

        let producer_status = producer_child.wait().await?;
        let consumer_status = consumer_child.wait().await?;

        if !consumer_status.success() {
            bail!("{}: consumer exited with {}", what, consumer_status);
        }
        if !producer_status.success() {
            bail!("{}: producer exited with {}", what, producer_status);
        }

        let bytes =
            copy_result.with_context(|| format!("Stream transfer failed for {}", what))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_docker_manager_creation() {
        // This test requires Docker and a compose file to be present
        if let Ok(manager) = DockerManager::new("kontalk").await {
            assert!(manager.project_root().exists());
            assert_eq!(manager.volume_name("db"), "kontalk_db");
        }
    }

    #[tokio::test]
    async fn test_pipe_commands_checks_both_statuses() {
        let mut producer = Command::new("sh");
        producer.args(["-c", "echo hello"]);
        let mut consumer = Command::new("cat");
        consumer.stdout(Stdio::null());
        let bytes = DockerManager::pipe_commands(producer, consumer, "echo | cat")
            .await
            .unwrap();
        assert_eq!(bytes, 6);

        // Failing producer surfaces as an error even when the consumer is fine
        let mut producer = Command::new("sh");
        producer.args(["-c", "echo partial; exit 3"]);
        let mut consumer = Command::new("cat");
        consumer.stdout(Stdio::null());
        let err = DockerManager::pipe_commands(producer, consumer, "failing producer")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("producer"));
    }

    #[tokio::test]
    async fn test_pipe_commands_reports_consumer_exit_over_broken_pipe() {
        // A consumer dying without draining its stdin makes the copy fail
        // with EPIPE; the error must still carry the consumer's exit status
        let mut producer = Command::new("sh");
        producer.args(["-c", "head -c 10485760 /dev/zero"]);
        let mut consumer = Command::new("sh");
        consumer.args(["-c", "exit 7"]);

        let err = DockerManager::pipe_commands(producer, consumer, "early consumer exit")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("consumer"), "unexpected error: {}", msg);
        assert!(msg.contains("7"), "unexpected error: {}", msg);
    }

    #[tokio::test]
    async fn test_capture_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");

        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf hello"]);
        let bytes = DockerManager::capture_to_file(cmd, &dest, "printf").await.unwrap();
        assert_eq!(bytes, 5);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");

        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 1"]);
        assert!(DockerManager::capture_to_file(cmd, &dest, "false").await.is_err());
    }
}
