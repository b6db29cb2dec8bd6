//! Tracing bootstrap.

use caz_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

use crate::error::{AgentError, Result};

/// Install the global subscriber. `RUST_LOG` wins over `general.log_level`.
///
/// # Errors
/// Fails when the level is not a valid filter or a subscriber is already set.
pub fn init(config: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| AgentError::Telemetry(e.to_string()))?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AgentError::Telemetry(e.to_string()))
}
