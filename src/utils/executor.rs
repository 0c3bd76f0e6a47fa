//! Command execution abstraction for testability
//!
//! Drivers run their dump tool through a [`CommandExecutor`], so tests can
//! swap the real subprocess for [`mock::MockExecutor`].

use super::command::{CommandError, CommandOutput};
use std::path::Path;

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run `argv` with extra environment variables, stdout to `output_file` or captured
    fn run_command(
        &self,
        argv: &[String],
        envs: &[(String, String)],
        output_file: Option<&Path>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn run_command(
        &self,
        argv: &[String],
        envs: &[(String, String)],
        output_file: Option<&Path>,
    ) -> Result<CommandOutput, CommandError> {
        super::command::run_command(argv, envs, output_file)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub argv: Vec<String>,
        pub envs: Vec<(String, String)>,
        pub output_file: Option<String>,
    }

    impl CommandCall {
        pub fn program(&self) -> &str {
            self.argv.first().map(String::as_str).unwrap_or_default()
        }
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        /// Exit 0, writing `stdout` to the output file (or the buffer)
        Success { stdout: String },
        /// Non-zero exit; an output file is still created, like a shell redirect
        Failure { stderr: String, exit_code: i32 },
        /// The program could not be started
        LaunchError,
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success {
                stdout: String::new(),
            }
        }
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Succeed and emit `stdout`
        pub fn succeeding(stdout: &str) -> Self {
            Self::new().with_response(MockResponse::Success {
                stdout: stdout.to_string(),
            })
        }

        /// Exit with `exit_code`
        pub fn failing(exit_code: i32, stderr: &str) -> Self {
            Self::new().with_response(MockResponse::Failure {
                stderr: stderr.to_string(),
                exit_code,
            })
        }

        pub fn with_response(self, response: MockResponse) -> Self {
            *self.response.lock().unwrap() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Get number of calls to a specific program
        pub fn call_count(&self, program: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.program() == program)
                .count()
        }

        fn record_call(&self, argv: &[String], envs: &[(String, String)], output_file: Option<&Path>) {
            self.calls.lock().unwrap().push(CommandCall {
                argv: argv.to_vec(),
                envs: envs.to_vec(),
                output_file: output_file.map(|p| p.display().to_string()),
            });
        }

        fn open_output(path: &Path) -> Result<std::fs::File, CommandError> {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|source| CommandError::OutputFile {
                    path: path.to_path_buf(),
                    source,
                })
        }
    }

    impl CommandExecutor for MockExecutor {
        fn run_command(
            &self,
            argv: &[String],
            envs: &[(String, String)],
            output_file: Option<&Path>,
        ) -> Result<CommandOutput, CommandError> {
            self.record_call(argv, envs, output_file);
            let program = argv.first().cloned().ok_or(CommandError::EmptyCommand)?;
            let response = self.response.lock().unwrap().clone();

            match response {
                MockResponse::Success { stdout } => {
                    let captured = match output_file {
                        Some(path) => {
                            let mut file = Self::open_output(path)?;
                            file.write_all(stdout.as_bytes()).map_err(|source| {
                                CommandError::OutputFile {
                                    path: path.to_path_buf(),
                                    source,
                                }
                            })?;
                            Vec::new()
                        }
                        None => stdout.into_bytes(),
                    };
                    Ok(CommandOutput {
                        success: true,
                        exit_code: Some(0),
                        stdout: captured,
                    })
                }
                MockResponse::Failure { stderr, exit_code } => {
                    if let Some(path) = output_file {
                        Self::open_output(path)?;
                    }
                    tracing::error!("Mock command {} failed: {}", program, stderr);
                    Ok(CommandOutput {
                        success: false,
                        exit_code: Some(exit_code),
                        stdout: Vec::new(),
                    })
                }
                MockResponse::LaunchError => Err(CommandError::Launch {
                    program,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock launch failure"),
                }),
            }
        }
    }
}
