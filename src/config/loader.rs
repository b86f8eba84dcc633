//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ClinicConfig, Environment, StorageBackend};
use super::secret::secret_string;
use crate::domain::errors::ClinicError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ClinicConfig
/// 4. Applies environment variable overrides (CLINIC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use clinic::config::loader::load_config;
///
/// let config = load_config("clinic.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ClinicConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ClinicError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ClinicError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text (substitution, overrides and validation included)
pub fn parse_config(contents: &str) -> Result<ClinicConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ClinicConfig = toml::from_str(&contents)
        .map_err(|e| ClinicError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ClinicError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        // Placeholders in comments are left alone
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ClinicError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClinicError::Configuration(format!("Invalid value for {name}: '{val}'"))),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using CLINIC_* prefix
///
/// Environment variables follow the pattern: CLINIC_<SECTION>_<KEY>
/// For example: CLINIC_SERVER_PORT, CLINIC_AUTH_JWT_SECRET
fn apply_env_overrides(config: &mut ClinicConfig) -> Result<()> {
    if let Ok(val) = std::env::var("CLINIC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("CLINIC_ENVIRONMENT") {
        config.environment = match val.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(ClinicError::Configuration(format!(
                    "Invalid CLINIC_ENVIRONMENT '{other}'. Must be one of: development, staging, production"
                )))
            }
        };
    }

    // Server overrides
    if let Ok(val) = std::env::var("CLINIC_SERVER_HOST") {
        config.server.host = val;
    }
    if let Some(port) = parse_env("CLINIC_SERVER_PORT")? {
        config.server.port = port;
    }
    if let Ok(val) = std::env::var("CLINIC_SERVER_CORS_ALLOWED_ORIGINS") {
        config.server.cors_allowed_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(timeout) = parse_env("CLINIC_SERVER_REQUEST_TIMEOUT_SECONDS")? {
        config.server.request_timeout_seconds = timeout;
    }

    // Auth overrides
    if let Ok(val) = std::env::var("CLINIC_AUTH_JWT_SECRET") {
        config.auth.jwt_secret = secret_string(val);
    }
    if let Some(ttl) = parse_env("CLINIC_AUTH_TOKEN_TTL_MINUTES")? {
        config.auth.token_ttl_minutes = ttl;
    }
    if let Some(cost) = parse_env("CLINIC_AUTH_BCRYPT_COST")? {
        config.auth.bcrypt_cost = cost;
    }
    if let Ok(val) = std::env::var("CLINIC_AUTH_ISSUER") {
        config.auth.issuer = val;
    }

    // Booking overrides
    if let Some(buffer) = parse_env("CLINIC_BOOKING_CONFLICT_BUFFER_MINUTES")? {
        config.booking.conflict_buffer_minutes = buffer;
    }
    if let Some(enforce) = parse_env("CLINIC_BOOKING_ENFORCE_STATUS_TRANSITIONS")? {
        config.booking.enforce_status_transitions = enforce;
    }

    // Storage overrides
    if let Ok(val) = std::env::var("CLINIC_STORAGE_BACKEND") {
        config.storage_backend = match val.to_lowercase().as_str() {
            "postgresql" => StorageBackend::PostgreSQL,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ClinicError::Configuration(format!(
                    "Invalid CLINIC_STORAGE_BACKEND '{other}'. Must be one of: postgresql, memory"
                )))
            }
        };
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("CLINIC_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Some(max) = parse_env("CLINIC_POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = max;
        }
    }

    // Logging overrides
    if let Some(enabled) = parse_env("CLINIC_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("CLINIC_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
