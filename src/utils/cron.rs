//! Cron job management utilities
//!
//! The backup itself runs once per invocation; recurring runs come from a
//! crontab entry that calls `db-backup run` on the configured schedule.

use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Marker line preceding the managed crontab entry
pub const CRON_MARKER: &str = "# db-backup - scheduled database backup";

/// Basic validation: a schedule has exactly 5 fields
pub fn is_valid_schedule(schedule: &str) -> bool {
    schedule.split_whitespace().count() == 5
}

/// Get the path to the running binary
pub fn get_binary_path() -> Result<PathBuf> {
    env::current_exe().context("Failed to get current executable path")
}

/// Build the marker + schedule lines for the crontab
///
/// `source_args` are the configuration flags the scheduled run needs
/// (e.g. `--env-file /etc/db-backup.env`).
pub fn build_cron_entry(
    schedule: &str,
    binary: &Path,
    source_args: &[String],
    log_file: Option<&Path>,
) -> String {
    let mut command = binary.display().to_string();
    for arg in source_args {
        command.push(' ');
        command.push_str(arg);
    }
    command.push_str(" run");

    if let Some(log) = log_file {
        command.push_str(&format!(" >> {} 2>&1", log.display()));
    }

    format!("{}\n{} {}", CRON_MARKER, schedule, command)
}

/// Replace the managed entry in `existing`, or append it
pub fn merge_crontab(existing: &str, entry: &str) -> String {
    let mut new_lines = Vec::new();
    let mut skip_next = false;

    for line in existing.lines() {
        if line.trim() == CRON_MARKER {
            skip_next = true;
            continue;
        }
        if skip_next {
            skip_next = false;
            continue;
        }
        new_lines.push(line);
    }

    while new_lines.last().is_some_and(|l| l.trim().is_empty()) {
        new_lines.pop();
    }

    new_lines.push(entry);
    new_lines.join("\n") + "\n"
}

/// Get the current crontab
pub fn get_crontab() -> Result<String> {
    let output = Command::new("crontab")
        .arg("-l")
        .output()
        .context("Failed to execute crontab -l")?;

    if !output.status.success() {
        // Empty crontab returns non-zero, check stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            return Ok(String::new());
        }
        anyhow::bail!("Failed to read crontab: {}", stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Set the crontab content
pub fn set_crontab(content: &str) -> Result<()> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn crontab")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(content.as_bytes())
            .context("Failed to write to crontab stdin")?;
    } else {
        anyhow::bail!("Failed to open crontab stdin");
    }

    let output = child
        .wait_with_output()
        .context("Failed to wait for crontab")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Crontab command failed: {}", stderr);
    }

    info!("Crontab updated successfully");
    Ok(())
}

/// Install (or with `dry_run`, print) the scheduled backup entry
pub fn install_cron_job(
    schedule: &str,
    source_args: &[String],
    log_file: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    if !is_valid_schedule(schedule) {
        anyhow::bail!("Invalid cron schedule (expected 5 fields): {}", schedule);
    }

    let binary_path = get_binary_path()?;
    let entry = build_cron_entry(schedule, &binary_path, source_args, log_file);

    if dry_run {
        println!("  [DRY RUN] Would add cron job:");
        println!("    {}", entry.replace('\n', "\n    "));
        return Ok(());
    }

    let existing = get_crontab()?;
    if existing.contains(CRON_MARKER) {
        warn!("Cron job for db-backup already exists, updating...");
    }

    set_crontab(&merge_crontab(&existing, &entry))?;
    info!("Installed cron job with schedule: {}", schedule);
    Ok(())
}
