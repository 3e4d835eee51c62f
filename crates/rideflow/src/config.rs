//! Configuration management for rideflow.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.
//! Every mocked constant both clients rely on (OTP lengths, the ride code,
//! fares, simulated delays) lives here so it can be overridden in one place.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::ClientKind;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rideflow";

/// Digits in the code a passenger reads out at pickup.
pub const RIDE_OTP_LENGTH: usize = 4;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RIDEFLOW_`)
/// 2. TOML config file at `~/.config/rideflow/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Sign-up and OTP configuration shared by both clients.
    pub auth: AuthConfig,
    /// Driver client configuration.
    pub driver: DriverConfig,
    /// Rider client configuration.
    pub rider: RiderConfig,
    /// Simulated ride-progress timings.
    pub tracking: TrackingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding both clients' stores.
    /// Defaults to `~/.local/share/rideflow`
    pub data_dir: Option<PathBuf>,
    /// File name of the rider client's store.
    pub rider_file: String,
    /// File name of the driver client's store.
    pub driver_file: String,
}

/// Sign-up and OTP configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Exact number of digits a mobile number must have.
    pub mobile_length: usize,
    /// Number of digits in the sign-in code.
    pub code_length: usize,
    /// Country prefix shown with (and stored on) rider mobile numbers.
    pub country_code: String,
    /// If set, only this code verifies; otherwise any code of the right
    /// length does.
    pub fixed_code: Option<String>,
}

/// Driver client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Code the passenger reads out at pickup.
    pub ride_otp: String,
}

/// Rider client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderConfig {
    /// Fare for a shared ride, in rupees.
    pub shared_fare: u32,
    /// Fare for a personal ride, in rupees.
    pub personal_fare: u32,
    /// Passenger cap for a shared ride.
    pub shared_capacity: u8,
    /// Passenger cap for a personal ride.
    pub personal_capacity: u8,
    /// Minimum destination length after trimming.
    pub min_destination_len: usize,
}

/// Delays between simulated ride-progress events, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// From booking to a driver being assigned.
    pub driver_found_ms: u64,
    /// From assignment to the driver reaching the pickup.
    pub driver_arrived_ms: u64,
    /// From arrival to the trip starting.
    pub trip_started_ms: u64,
    /// From trip start to completion.
    pub trip_completed_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // Will be resolved to default at runtime
            rider_file: "rider.db".to_string(),
            driver_file: "driver.db".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mobile_length: 10,
            code_length: 6,
            country_code: "+91".to_string(),
            fixed_code: None,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            ride_otp: "1234".to_string(),
        }
    }
}

impl Default for RiderConfig {
    fn default() -> Self {
        Self {
            shared_fare: 30,
            personal_fare: 100,
            shared_capacity: 2,
            personal_capacity: 4,
            min_destination_len: 3,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            driver_found_ms: 3_000,
            driver_arrived_ms: 5_000,
            trip_started_ms: 2_000,
            trip_completed_ms: 8_000,
        }
    }
}

impl TrackingConfig {
    /// The four delays in the order the events fire.
    #[must_use]
    pub fn delays(&self) -> [Duration; 4] {
        [
            Duration::from_millis(self.driver_found_ms),
            Duration::from_millis(self.driver_arrived_ms),
            Duration::from_millis(self.trip_started_ms),
            Duration::from_millis(self.trip_completed_ms),
        ]
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("RIDEFLOW_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.auth.mobile_length == 0 || self.auth.code_length == 0 {
            return Err(Error::ConfigValidation {
                message: "mobile_length and code_length must be greater than 0".to_string(),
            });
        }

        if let Some(code) = &self.auth.fixed_code {
            if code.len() != self.auth.code_length || !is_digits(code) {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "fixed_code must be {} digits, got {code:?}",
                        self.auth.code_length
                    ),
                });
            }
        }

        if self.driver.ride_otp.len() != RIDE_OTP_LENGTH || !is_digits(&self.driver.ride_otp) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "ride_otp must be {RIDE_OTP_LENGTH} digits, got {:?}",
                    self.driver.ride_otp
                ),
            });
        }

        if self.rider.shared_capacity == 0 || self.rider.personal_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "passenger capacities must be greater than 0".to_string(),
            });
        }

        if self.rider.min_destination_len == 0 {
            return Err(Error::ConfigValidation {
                message: "min_destination_len must be greater than 0".to_string(),
            });
        }

        if self.tracking.delays().iter().any(Duration::is_zero) {
            return Err(Error::ConfigValidation {
                message: "tracking delays must be greater than 0".to_string(),
            });
        }

        if self.storage.rider_file == self.storage.driver_file {
            return Err(Error::ConfigValidation {
                message: "rider_file and driver_file must differ".to_string(),
            });
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the store path for one client.
    #[must_use]
    pub fn database_path(&self, client: ClientKind) -> PathBuf {
        let file = match client {
            ClientKind::Rider => &self.storage.rider_file,
            ClientKind::Driver => &self.storage.driver_file,
        };
        self.data_dir().join(file)
    }

    /// Number of digits in the driver's ride OTP.
    #[must_use]
    pub fn ride_otp_length(&self) -> usize {
        self.driver.ride_otp.len()
    }
}
