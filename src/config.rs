use std::env;
use std::time::Duration;

use crate::client::emitter::EmitterConfig;
use crate::error::{AppError, ClientError};
use crate::state::DEFAULT_HISTORY_LIMIT;

pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub location_history_limit: usize,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            http_port: parse_or_default(&lookup, "HTTP_PORT", 8001)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            event_buffer_size: parse_or_default(&lookup, "EVENT_BUFFER_SIZE", 1024)?,
            location_history_limit: parse_or_default(
                &lookup,
                "LOCATION_HISTORY_LIMIT",
                DEFAULT_HISTORY_LIMIT,
            )?,
            seed_demo_data: parse_or_default(&lookup, "SEED_DEMO_DATA", true)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub ws_url: String,
    pub directions_url: String,
    pub directions_api_key: Option<String>,
    pub location_interval_ms: u64,
    pub location_distance_m: f64,
    pub log_level: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let to_client = |err: AppError| ClientError::Config(err.to_string());

        let location_distance_m: f64 =
            parse_or_default(&lookup, "LOCATION_DISTANCE_M", 10.0).map_err(to_client)?;
        if !location_distance_m.is_finite() || location_distance_m < 0.0 {
            return Err(ClientError::Config(format!(
                "invalid LOCATION_DISTANCE_M: {location_distance_m}"
            )));
        }

        Ok(Self {
            api_base_url: lookup("API_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8001/api".to_string()),
            ws_url: lookup("WS_URL").unwrap_or_else(|| "ws://localhost:8001/ws".to_string()),
            directions_url: lookup("DIRECTIONS_URL")
                .unwrap_or_else(|| DEFAULT_DIRECTIONS_URL.to_string()),
            directions_api_key: lookup("DIRECTIONS_API_KEY").filter(|key| !key.trim().is_empty()),
            location_interval_ms: parse_or_default(&lookup, "LOCATION_INTERVAL_MS", 5_000)
                .map_err(to_client)?,
            location_distance_m,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn emitter(&self) -> EmitterConfig {
        EmitterConfig {
            time_interval: Duration::from_millis(self.location_interval_ms),
            distance_interval_m: self.location_distance_m,
        }
    }
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}
