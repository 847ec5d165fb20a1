//! Configuration validation utilities.

use courier_adapter_slack::ReconnectConfig;

use super::error::{ConfigError, ConfigResult};
use super::schema::{CourierConfig, ExecutorConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
///
/// Every rejection is fatal: the runtime refuses to start.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_line(config)?;
    validate_rtm(config)?;
    validate_executor(&config.executor)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_line(config: &CourierConfig) -> ConfigResult<()> {
    let line = &config.providers.line;
    if !line.enabled {
        return Ok(());
    }
    if is_blank(line.channel_secret.as_deref()) {
        return Err(ConfigError::missing_field("providers.line.channel_secret"));
    }
    if is_blank(line.channel_token.as_deref()) {
        return Err(ConfigError::missing_field("providers.line.channel_token"));
    }
    validate_url(&line.api_base)
}

fn validate_rtm(config: &CourierConfig) -> ConfigResult<()> {
    if !config.rtm.enabled {
        return Ok(());
    }
    let slack = &config.providers.slack;
    if is_blank(slack.bot_token.as_deref()) {
        return Err(ConfigError::missing_field("providers.slack.bot_token"));
    }
    validate_url(&slack.api_base)?;
    if config.rtm.ping_interval_secs == 0 {
        return Err(ConfigError::validation(
            "rtm.ping_interval_secs must be greater than 0",
        ));
    }
    validate_reconnect(&config.rtm.reconnect)
}

fn validate_reconnect(reconnect: &ReconnectConfig) -> ConfigResult<()> {
    if reconnect.initial_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Initial reconnect delay must be greater than 0",
        ));
    }

    if reconnect.max_delay_ms < reconnect.initial_delay_ms {
        return Err(ConfigError::validation(
            "Max reconnect delay must be greater than or equal to initial delay",
        ));
    }

    if reconnect.multiplier.is_nan() || reconnect.multiplier < 1.0 {
        return Err(ConfigError::validation(
            "Reconnect multiplier must be at least 1.0",
        ));
    }

    Ok(())
}

fn validate_executor(executor: &ExecutorConfig) -> ConfigResult<()> {
    if executor.workers == 0 {
        return Err(ConfigError::validation(
            "executor.workers must be greater than 0",
        ));
    }
    if executor.queue_capacity == 0 {
        return Err(ConfigError::validation(
            "executor.queue_capacity must be greater than 0",
        ));
    }
    if executor.reply_timeout_secs == 0 {
        return Err(ConfigError::validation(
            "executor.reply_timeout_secs must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("api_base"));
    }
    if !["http://", "https://"].iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            "URL must start with http:// or https://",
        ));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
