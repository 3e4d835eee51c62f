//! The driver's home screen: availability, earnings and incoming requests.

use tracing::info;

use crate::error::{Error, Result};

/// A ride offered to the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct RideRequest {
    /// Where the passenger waits.
    pub pickup: String,
    /// Where the passenger is going.
    pub drop: String,
    /// Trip length.
    pub distance_km: f64,
    /// Fare in rupees.
    pub fare: u32,
}

impl RideRequest {
    /// The request produced by "simulate incoming ride".
    #[must_use]
    pub fn simulated() -> Self {
        Self {
            pickup: "Sector 21, Dwarka".to_string(),
            drop: "IGI Airport, Terminal 3".to_string(),
            distance_km: 6.2,
            fare: 320,
        }
    }
}

/// Earnings panel. Static until there is a backend to ask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverStats {
    /// Earned today, in rupees.
    pub today_earnings: u32,
    /// Trips completed today.
    pub trips_today: u32,
    /// Average rating.
    pub rating: f32,
    /// Earned this week, in rupees.
    pub week_earnings: u32,
}

impl Default for DriverStats {
    fn default() -> Self {
        Self {
            today_earnings: 820,
            trips_today: 6,
            rating: 4.8,
            week_earnings: 4_560,
        }
    }
}

/// State of the home screen.
#[derive(Debug, Clone, Default)]
pub struct DriverHome {
    online: bool,
    incoming: Option<RideRequest>,
    stats: DriverStats,
}

impl DriverHome {
    /// A home screen with the driver offline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the driver is accepting rides.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Flip availability and return the new state. Going offline discards
    /// any pending request.
    pub fn toggle_online(&mut self) -> bool {
        self.online = !self.online;
        if !self.online {
            self.incoming = None;
        }
        info!(online = self.online, "Availability changed");
        self.online
    }

    /// Set availability to a specific state.
    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            self.toggle_online();
        }
    }

    /// Status line under the toggle.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.online {
            "You're Online"
        } else {
            "You're Offline"
        }
    }

    /// Hint shown while offline.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        (!self.online).then_some("Go online to start receiving ride requests")
    }

    /// Earnings panel.
    #[must_use]
    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Pretend a passenger requested a ride.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionUnavailable`] while offline.
    pub fn simulate_incoming(&mut self) -> Result<&RideRequest> {
        if !self.online {
            return Err(Error::unavailable(
                "simulate incoming ride",
                "go online first",
            ));
        }
        info!("Incoming ride request");
        Ok(&*self.incoming.insert(RideRequest::simulated()))
    }

    /// The request currently on screen.
    #[must_use]
    pub fn incoming(&self) -> Option<&RideRequest> {
        self.incoming.as_ref()
    }

    /// Accept the request on screen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionUnavailable`] if there is none.
    pub fn accept(&mut self) -> Result<RideRequest> {
        let request = self
            .incoming
            .take()
            .ok_or_else(|| Error::unavailable("accept ride", "no incoming request"))?;
        info!(fare = request.fare, "Ride accepted");
        Ok(request)
    }

    /// Dismiss the request on screen.
    pub fn reject(&mut self) {
        if self.incoming.take().is_some() {
            info!("Ride rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_offline() {
        let home = DriverHome::new();
        assert!(!home.is_online());
        assert_eq!(home.status_label(), "You're Offline");
        assert!(home.hint().is_some());
    }

    #[test]
    fn test_simulate_requires_online() {
        let mut home = DriverHome::new();
        assert!(home.simulate_incoming().is_err());

        home.toggle_online();
        let request = home.simulate_incoming().unwrap();
        assert_eq!(request.fare, 320);
        assert!(home.hint().is_none());
    }

    #[test]
    fn test_accept_takes_request() {
        let mut home = DriverHome::new();
        home.set_online(true);
        home.simulate_incoming().unwrap();

        let request = home.accept().unwrap();
        assert_eq!(request, RideRequest::simulated());
        assert!(home.incoming().is_none());
        assert!(home.accept().is_err());
    }

    #[test]
    fn test_reject_clears_request() {
        let mut home = DriverHome::new();
        home.set_online(true);
        home.simulate_incoming().unwrap();
        home.reject();
        assert!(home.incoming().is_none());
    }

    #[test]
    fn test_going_offline_drops_request() {
        let mut home = DriverHome::new();
        home.set_online(true);
        home.simulate_incoming().unwrap();
        assert!(!home.toggle_online());
        assert!(home.incoming().is_none());
    }

    #[test]
    fn test_static_stats() {
        let stats = DriverHome::new().stats();
        assert_eq!(stats.today_earnings, 820);
        assert_eq!(stats.trips_today, 6);
        assert_eq!(stats.week_earnings, 4_560);
    }
}
