//! Linux-specific implementation for rideflow
//!
//! This crate provides Linux-specific functionality for the rideflow project,
//! currently the hand-off of phone numbers to the desktop's `tel:` handler.

#![cfg(target_os = "linux")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

/// Program that opens URIs with the user's preferred handler.
const OPENER: &str = "xdg-open";

/// Errors raised while handing a number to the dialer.
#[derive(Debug, Error)]
pub enum DialError {
    /// The number contains characters a `tel:` URI cannot carry.
    #[error("invalid phone number: {0:?}")]
    InvalidNumber(String),

    /// The URI opener could not be started.
    #[error("failed to launch {opener}: {source}")]
    Launch {
        /// Name of the opener program.
        opener: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Initialize Linux-specific components
///
/// # Errors
///
/// Returns an error if initialization fails
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    debug!("Initializing Linux platform components");
    Ok(())
}

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// Build a `tel:` URI from a human-typed number.
///
/// Spaces and dashes are dropped; a single leading `+` is kept.
///
/// # Errors
///
/// Returns [`DialError::InvalidNumber`] if nothing dialable remains.
pub fn tel_uri(number: &str) -> Result<String, DialError> {
    let compact: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DialError::InvalidNumber(number.to_string()));
    }
    Ok(format!("tel:{compact}"))
}

/// Ask the desktop to start a voice call to `number`.
///
/// Fire-and-forget: the opener is reaped on a background thread and its exit
/// status is only logged.
///
/// # Errors
///
/// Returns an error if the number is invalid or the opener cannot be spawned.
pub fn dial(number: &str) -> Result<(), DialError> {
    let uri = tel_uri(number)?;
    debug!("Opening {} via {}", uri, OPENER);

    let mut child = Command::new(OPENER)
        .arg(&uri)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| DialError::Launch {
            opener: OPENER,
            source,
        })?;

    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!("{} exited with {}", OPENER, status),
        Ok(_) => {}
        Err(e) => warn!("failed to wait for {}: {}", OPENER, e),
    });
    Ok(())
}
