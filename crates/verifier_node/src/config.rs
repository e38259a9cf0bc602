//! Verifier node configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use core_kernel::{CoreError, VerifierId};

use crate::adapters::DEFAULT_EVENT_BUFFER;
use crate::processor::{
    ProcessorConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_IN_FLIGHT, MAX_IN_FLIGHT_LIMIT,
};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Verifier node configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Identity this verifier signs its decisions with
    pub verifier_id: VerifierId,
    /// Maximum number of claim events validated concurrently
    pub max_in_flight: usize,
    /// Capacity of the event subscription channel
    pub event_buffer: usize,
    /// Deadline for fetching one claim payload, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Directory the file claim store reads payloads from
    pub payload_dir: PathBuf,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            verifier_id: VerifierId::new(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            event_buffer: DEFAULT_EVENT_BUFFER,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT.as_millis() as u64,
            payload_dir: PathBuf::from("./payloads"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl VerifierConfig {
    /// Loads configuration from `VERIFIER_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, CoreError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("VERIFIER"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the values are usable
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_in_flight == 0 {
            return Err(CoreError::configuration("max_in_flight must be at least 1"));
        }
        if self.max_in_flight > MAX_IN_FLIGHT_LIMIT {
            return Err(CoreError::configuration(format!(
                "max_in_flight must be at most {MAX_IN_FLIGHT_LIMIT}"
            )));
        }
        if self.event_buffer == 0 {
            return Err(CoreError::configuration("event_buffer must be at least 1"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(CoreError::configuration("fetch_timeout_ms must be at least 1"));
        }
        if self.log_level.trim().is_empty() {
            return Err(CoreError::configuration("log_level must not be empty"));
        }
        Ok(())
    }

    /// Returns the settings the event processor needs
    pub fn processor(&self) -> ProcessorConfig {
        ProcessorConfig {
            verifier_id: self.verifier_id,
            max_in_flight: self.max_in_flight,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }
}
