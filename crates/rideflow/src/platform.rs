//! Platform seam: the phone dialer and per-OS setup.

use std::fmt::Debug;
use std::sync::Mutex;

use tracing::info;

use crate::error::{Error, Result};

/// Something that can place a phone call.
///
/// Dialing is fire-and-forget: success means the request was handed off,
/// not that a call connected.
pub trait Dialer: Send + Sync + Debug {
    /// Ask the platform to call `number`.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is malformed or nothing could be
    /// launched to handle it.
    fn dial(&self, number: &str) -> Result<()>;
}

/// Hands `tel:` URIs to the desktop's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDialer;

impl Dialer for SystemDialer {
    fn dial(&self, number: &str) -> Result<()> {
        #[cfg(target_os = "linux")]
        {
            rideflow_linux::dial(number).map_err(|e| Error::platform(e.to_string()))
        }

        #[cfg(target_os = "macos")]
        {
            rideflow_mac::dial(number).map_err(|e| Error::platform(e.to_string()))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            Err(Error::platform(format!(
                "cannot dial {number}: unsupported platform"
            )))
        }
    }
}

/// Logs and records numbers instead of dialing them.
#[derive(Debug, Default)]
pub struct DryRunDialer {
    calls: Mutex<Vec<String>>,
}

impl DryRunDialer {
    /// Create a dialer with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers dialed so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Dialer for DryRunDialer {
    fn dial(&self, number: &str) -> Result<()> {
        info!("Would dial {}", number);
        self.calls
            .lock()
            .map_err(|_| Error::internal("dry-run dialer lock poisoned"))?
            .push(number.to_string());
        Ok(())
    }
}

/// Run per-platform initialisation.
///
/// # Errors
///
/// Returns an error if the platform crate fails to initialise.
pub fn init() -> Result<()> {
    #[cfg(target_os = "linux")]
    rideflow_linux::init().map_err(|e| Error::platform(e.to_string()))?;

    #[cfg(target_os = "macos")]
    rideflow_mac::init().map_err(|e| Error::platform(e.to_string()))?;

    Ok(())
}

/// Human-readable name of the platform.
#[must_use]
pub fn name() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        rideflow_linux::platform_name()
    }

    #[cfg(target_os = "macos")]
    {
        rideflow_mac::platform_name()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        "unsupported"
    }
}
