//! Utilities for running external commands with their output routed to a file or buffer

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error};

/// Failures that prevent a command from running at all
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to execute {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output file {path:?}: {source}")]
    OutputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Result of a command that was launched
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Captured stdout; empty when stdout went to a file
    pub stdout: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Run a command to completion
///
/// `argv[0]` is the program. Stdout goes to `output_file` (created, never
/// truncated) or is captured; stderr is logged. A non-zero exit status is
/// reported through [`CommandOutput::success`], not as an error.
pub fn run_command(
    argv: &[String],
    envs: &[(String, String)],
    output_file: Option<&Path>,
) -> Result<CommandOutput, CommandError> {
    let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    cmd.stdin(Stdio::null());
    cmd.stderr(Stdio::piped());

    match output_file {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|source| CommandError::OutputFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            cmd.stdout(Stdio::from(file));
        }
        None => {
            cmd.stdout(Stdio::piped());
        }
    }

    let child = cmd.spawn().map_err(|source| CommandError::Launch {
        program: program.clone(),
        source,
    })?;

    let output = child.wait_with_output().map_err(|source| CommandError::Wait {
        program: program.clone(),
        source,
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let success = output.status.success();

    if success {
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(target: "db_backup::command", "{}: {}", program, line);
        }
        debug!("Command executed successfully: {}", program);
    } else {
        error!(
            "Command failed with exit code {:?}: {}",
            output.status.code(),
            program
        );
        if !stderr.trim().is_empty() {
            error!("Error output: {}", stderr.trim());
        }
    }

    Ok(CommandOutput {
        success,
        exit_code: output.status.code(),
        stdout: output.stdout,
    })
}
