//! Common utilities for integration tests
//!
//! Cleanup guards for containers and readiness helpers.

use anyhow::{bail, Result};
use std::net::TcpListener;
use std::process::Command;
use std::thread;
use std::time::Duration;

/// Guard that ensures Docker container cleanup on drop (even on panic)
pub struct ContainerGuard {
    name: String,
}

impl ContainerGuard {
    pub fn new(name: String) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        cleanup_container(&self.name);
    }
}

/// Stop and remove a container together with its anonymous volumes
fn cleanup_container(name: &str) {
    let _ = Command::new("docker").args(["stop", name]).output();
    let _ = Command::new("docker").args(["rm", "-v", name]).output();
}

pub fn is_docker_available() -> bool {
    Command::new("docker")
        .args(["ps"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn is_tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Skip unless Docker and `tool` are usable
pub fn should_run(tool: &str) -> bool {
    if !is_docker_available() {
        eprintln!("Docker not available, skipping test");
        return false;
    }
    if !is_tool_available(tool) {
        eprintln!("{} not on PATH, skipping test", tool);
        return false;
    }
    true
}

/// A free local TCP port to publish the container on
pub fn free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Unique container name for this process
pub fn container_name(prefix: &str) -> String {
    format!("db-backup-test-{}-{}", prefix, std::process::id())
}

/// Start a detached container publishing `container_port` on `host_port`
pub fn start_container(
    name: &str,
    image: &str,
    host_port: u16,
    container_port: u16,
    env: &[(&str, &str)],
) -> Result<ContainerGuard> {
    let publish = format!("127.0.0.1:{}:{}", host_port, container_port);
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        name.to_string(),
        "-p".to_string(),
        publish,
    ];
    for (key, value) in env {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }
    args.push(image.to_string());

    let output = Command::new("docker").args(&args).output()?;
    if !output.status.success() {
        bail!(
            "Failed to start {}: {}",
            image,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(ContainerGuard::new(name.to_string()))
}

/// Poll `docker exec <name> <probe...>` until it succeeds
pub fn wait_until_ready(name: &str, probe: &[&str], attempts: u32) -> Result<()> {
    for _ in 0..attempts {
        let ready = Command::new("docker")
            .arg("exec")
            .arg(name)
            .args(probe)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if ready {
            return Ok(());
        }
        thread::sleep(Duration::from_secs(1));
    }
    bail!("Container {} did not become ready", name)
}

/// Run SQL inside the container through its client
pub fn exec_in_container(name: &str, command: &[&str]) -> Result<String> {
    let output = Command::new("docker")
        .arg("exec")
        .arg(name)
        .args(command)
        .output()?;
    if !output.status.success() {
        bail!("Command failed: {}", String::from_utf8_lossy(&output.stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
