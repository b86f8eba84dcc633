//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Clinic - clinic management REST backend
#[derive(Parser, Debug)]
#[command(name = "clinic")]
#[command(version, about, long_about = None)]
#[command(author = "Clinic Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "clinic.toml", env = "CLINIC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CLINIC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(commands::serve::ServeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Apply the PostgreSQL schema
    Migrate(commands::migrate::MigrateArgs),
}
