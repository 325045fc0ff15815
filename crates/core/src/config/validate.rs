use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - The CORS allowed origin is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cors.allowed_origin.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cors.allowed_origin cannot be empty".to_string(),
        ));
    }

    Ok(())
}
