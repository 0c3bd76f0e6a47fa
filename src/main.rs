use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use db_backup::artifact::format_size;
use db_backup::config::{self, Config, ConfigError};
use db_backup::managers::logging::{self, LoggingConfig};
use db_backup::utils::cron;
use db_backup::utils::retention::RetentionManager;
use db_backup::{BackupManager, NotificationManager, Translator};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, warn};

#[derive(Parser)]
#[command(name = "db-backup")]
#[command(about = "Scheduled PostgreSQL/MySQL backups with retention and notifications", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, conflicts_with = "env_file")]
    config: Option<PathBuf>,

    /// Load environment-style configuration from this file instead of ./.env
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run one backup now (default)
    Run,

    /// Validate configuration and notification channels
    Validate,

    /// List retained backup files, newest first
    List,

    /// Install the crontab entry for the configured schedule
    Cron {
        /// Show the entry without changing the crontab
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = match logging::init_logging(&LoggingConfig::from_settings(&config.logging)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize file logging: {:#}", e);
            logging::init_console_logging();
            None
        }
    };

    let command = cli.command.unwrap_or(Commands::Run);
    match execute(command, &cli, config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_configuration(cli: &Cli) -> Result<Config, ConfigError> {
    if let Some(path) = &cli.config {
        return config::load_config(config::expand_tilde(path));
    }
    if let Some(path) = &cli.env_file {
        return config::load_config_from_env_file(config::expand_tilde(path));
    }

    // A missing ./.env is fine; the process environment may carry everything
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e.into()),
    }
    config::load_config_from_env()
}

fn execute(command: Commands, cli: &Cli, config: Config) -> Result<ExitCode> {
    match command {
        Commands::Run => handle_run(config),
        Commands::Validate => handle_validate(&config),
        Commands::List => handle_list(&config),
        Commands::Cron { dry_run } => handle_cron(cli, &config, dry_run),
    }
}

fn handle_run(config: Config) -> Result<ExitCode> {
    install_interrupt_handler();

    let mut manager =
        BackupManager::from_config(config).context("Failed to set up notification channels")?;

    if manager.run_backup().is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn handle_validate(config: &Config) -> Result<ExitCode> {
    let translator = Translator::new(config.language);
    let notifications = NotificationManager::from_config(config, translator)
        .context("Notification channel configuration is invalid")?;

    let tool = config.database.kind.dump_tool();
    let tool_found = which::which(tool).is_ok();
    if !tool_found {
        warn!("{} not found in PATH; backups will fail until it is installed", tool);
    }

    println!("Configuration is valid!");
    println!(
        "Database: {} {}@{}:{}/{}",
        config.database.kind,
        config.database.user,
        config.database.host,
        config.database.effective_port(),
        config.database.database
    );
    println!("Dump tool: {}{}", tool, if tool_found { "" } else { " (not found)" });
    println!("Backup directory: {:?}", config::expand_tilde(&config.backup.backup_dir));
    println!("Retention: {} most recent", config.backup.retention_count);
    let channels = notifications.channels();
    println!(
        "Notifications: {}",
        if channels.is_empty() { "none".to_string() } else { channels.join(", ") }
    );
    println!("Schedule: {}", config.schedule.cron);

    Ok(ExitCode::SUCCESS)
}

fn handle_list(config: &Config) -> Result<ExitCode> {
    let retention = RetentionManager::new(config::expand_tilde(&config.backup.backup_dir));

    let candidates = match retention.candidates() {
        Ok(candidates) => candidates,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read backup directory {:?}", retention.directory())
            })
        }
    };

    if candidates.is_empty() {
        println!("No backups found in {:?}", retention.directory());
        return Ok(ExitCode::SUCCESS);
    }

    println!("Backups in {:?} (newest first):", retention.directory());
    for candidate in &candidates {
        let modified = chrono::DateTime::<chrono::Local>::from(candidate.modified);
        let name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "  {}  {:>10}  {}",
            modified.format("%Y-%m-%d %H:%M:%S"),
            format_size(candidate.size_bytes),
            name
        );
    }
    println!(
        "Total: {} file(s), keeping {} most recent",
        candidates.len(),
        config.backup.retention_count
    );

    Ok(ExitCode::SUCCESS)
}

fn handle_cron(cli: &Cli, config: &Config, dry_run: bool) -> Result<ExitCode> {
    let mut source_args = Vec::new();
    if let Some(path) = &cli.config {
        source_args.push("--config".to_string());
        source_args.push(absolute(path)?.display().to_string());
    } else if let Some(path) = &cli.env_file {
        source_args.push("--env-file".to_string());
        source_args.push(absolute(path)?.display().to_string());
    }

    cron::install_cron_job(
        &config.schedule.cron,
        &source_args,
        config.logging.file.as_deref(),
        dry_run,
    )?;

    if !dry_run {
        println!("Scheduled backups with: {}", config.schedule.cron);
    }
    Ok(ExitCode::SUCCESS)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let path = config::expand_tilde(path);
    path.canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", path))
}

/// Exit with status 1 on Ctrl-C while a backup is running
fn install_interrupt_handler() {
    std::thread::spawn(|| {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to install interrupt handler: {}", e);
                return;
            }
        };

        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            warn!("Backup process interrupted by user");
            eprintln!("Backup process interrupted by user");
            std::process::exit(1);
        }
    });
}
