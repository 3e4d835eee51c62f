//! Ride progress as the rider sees it.
//!
//! With no backend, progress is simulated: opening a [`TrackingScreen`]
//! schedules one timer per status change. Updates are published on a
//! `watch` channel. Closing or dropping the screen cancels every timer that
//! has not fired.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::booking::BookingDraft;
use crate::config::TrackingConfig;
use crate::error::{Error, Result};
use crate::platform::Dialer;
use crate::schedule::ScreenTimers;

/// Where the booked ride is, from the rider's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RideStatus {
    /// Looking for a driver.
    Searching,
    /// A driver accepted and is on the way.
    DriverAssigned,
    /// The driver is at the pickup.
    DriverArrived,
    /// Trip under way.
    OnTrip,
    /// Trip over.
    Completed,
}

impl RideStatus {
    /// Statuses reached by timers, in order.
    pub const SCHEDULED: [Self; 4] = [
        Self::DriverAssigned,
        Self::DriverArrived,
        Self::OnTrip,
        Self::Completed,
    ];

    /// Banner text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Searching => "Finding your driver...",
            Self::DriverAssigned => "Driver is on the way",
            Self::DriverArrived => "Driver has arrived",
            Self::OnTrip => "On the way to destination",
            Self::Completed => "You have arrived",
        }
    }

    fn timer_label(self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::DriverAssigned => "driver found",
            Self::DriverArrived => "driver arrived",
            Self::OnTrip => "trip started",
            Self::Completed => "trip completed",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The driver and vehicle shown once a driver is assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignedDriver {
    /// Driver's name.
    pub name: &'static str,
    /// Average rating.
    pub rating: f32,
    /// Number to call.
    pub phone: &'static str,
    /// Make and model.
    pub vehicle_model: &'static str,
    /// Paint colour.
    pub vehicle_color: &'static str,
    /// Registration plate.
    pub vehicle_number: &'static str,
    /// Minutes until pickup when assigned.
    pub eta_min: u32,
}

/// The driver every booking gets.
pub const ASSIGNED_DRIVER: AssignedDriver = AssignedDriver {
    name: "Aksh Tiwari",
    rating: 4.8,
    phone: "9990074614",
    vehicle_model: "Tata Nano",
    vehicle_color: "TriColor",
    vehicle_number: "DL01AB2345",
    eta_min: 3,
};

/// State of the tracking screen.
#[derive(Debug)]
pub struct TrackingScreen {
    draft: BookingDraft,
    status: watch::Receiver<RideStatus>,
    timers: ScreenTimers,
}

impl TrackingScreen {
    /// Open the screen and start the simulated progress.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn open(draft: BookingDraft, config: &TrackingConfig) -> Self {
        let (tx, status) = watch::channel(RideStatus::Searching);
        let tx = Arc::new(tx);
        let mut timers = ScreenTimers::new();

        let mut at = std::time::Duration::ZERO;
        for (delay, next) in config.delays().into_iter().zip(RideStatus::SCHEDULED) {
            at += delay;
            let tx = Arc::clone(&tx);
            timers.after(next.timer_label(), at, move || {
                tx.send_replace(next);
                info!(status = ?next, "Ride status changed");
            });
        }

        info!(destination = %draft.destination, fare = draft.fare, "Tracking ride");
        Self {
            draft,
            status,
            timers,
        }
    }

    /// The booking being tracked.
    #[must_use]
    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Latest status.
    #[must_use]
    pub fn status(&self) -> RideStatus {
        *self.status.borrow()
    }

    /// A receiver that sees every later status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RideStatus> {
        self.status.clone()
    }

    /// Status changes still to come.
    #[must_use]
    pub fn pending_updates(&self) -> usize {
        self.timers.pending()
    }

    /// Wait for the next status change and return it.
    ///
    /// # Errors
    ///
    /// Returns an error once no further changes can arrive.
    pub async fn next_status(&mut self) -> Result<RideStatus> {
        self.status
            .changed()
            .await
            .map_err(|_| Error::unavailable("track ride", "no more updates"))?;
        Ok(*self.status.borrow_and_update())
    }

    /// Wait until the ride reaches at least `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if updates stop before `target` is reached.
    pub async fn wait_for(&mut self, target: RideStatus) -> Result<RideStatus> {
        loop {
            let current = *self.status.borrow_and_update();
            if current >= target {
                return Ok(current);
            }
            self.status.changed().await.map_err(|_| {
                Error::unavailable("track ride", format!("updates stopped before {target:?}"))
            })?;
        }
    }

    /// The assigned driver, once there is one.
    #[must_use]
    pub fn driver(&self) -> Option<&'static AssignedDriver> {
        (self.status() >= RideStatus::DriverAssigned).then_some(&ASSIGNED_DRIVER)
    }

    /// Call the assigned driver.
    ///
    /// # Errors
    ///
    /// Returns an error before a driver is assigned or if dialing fails.
    pub fn call_driver(&self, dialer: &dyn Dialer) -> Result<()> {
        let driver = self
            .driver()
            .ok_or_else(|| Error::unavailable("call driver", "no driver assigned yet"))?;
        info!(driver = driver.name, "Calling driver");
        dialer.dial(driver.phone)
    }

    /// Close the screen, cancelling pending updates.
    pub fn close(mut self) -> BookingDraft {
        self.timers.cancel_all();
        info!("Tracking closed");
        self.draft
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::platform::DryRunDialer;
    use crate::rider::booking::{PaymentMethod, RideType};

    fn draft() -> BookingDraft {
        BookingDraft {
            destination: "Airport".to_string(),
            ride_type: RideType::Shared,
            pickup: Some("Home".to_string()),
            payment_method: PaymentMethod::Upi,
            passenger_count: 2,
            fare: 30,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_sequence() {
        let mut screen = TrackingScreen::open(draft(), &TrackingConfig::default());
        assert_eq!(screen.status(), RideStatus::Searching);
        assert_eq!(screen.pending_updates(), 4);
        assert!(screen.driver().is_none());

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(screen.next_status().await.unwrap());
        }
        assert_eq!(seen, RideStatus::SCHEDULED.to_vec());
        assert_eq!(screen.driver(), Some(&ASSIGNED_DRIVER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timing_follows_config() {
        let mut screen = TrackingScreen::open(draft(), &TrackingConfig::default());

        tokio::time::sleep(Duration::from_millis(2_999)).await;
        assert_eq!(screen.status(), RideStatus::Searching);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(screen.status(), RideStatus::DriverAssigned);

        let reached = screen.wait_for(RideStatus::OnTrip).await.unwrap();
        assert_eq!(reached, RideStatus::OnTrip);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_updates() {
        let screen = TrackingScreen::open(draft(), &TrackingConfig::default());
        let rx = screen.subscribe();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(*rx.borrow(), RideStatus::DriverAssigned);

        let draft = screen.close();
        assert_eq!(draft.fare, 30);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(*rx.borrow(), RideStatus::DriverAssigned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_updates() {
        let screen = TrackingScreen::open(draft(), &TrackingConfig::default());
        let rx = screen.subscribe();
        drop(screen);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(*rx.borrow(), RideStatus::Searching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_end_after_completion() {
        let mut screen = TrackingScreen::open(draft(), &TrackingConfig::default());
        screen.wait_for(RideStatus::Completed).await.unwrap();
        assert_eq!(screen.pending_updates(), 0);
        assert!(screen.next_status().await.is_err());
        assert!(screen.wait_for(RideStatus::Completed).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_driver_needs_assignment() {
        let mut screen = TrackingScreen::open(draft(), &TrackingConfig::default());
        let dialer = DryRunDialer::new();
        assert!(screen.call_driver(&dialer).is_err());

        screen.wait_for(RideStatus::DriverAssigned).await.unwrap();
        screen.call_driver(&dialer).unwrap();
        assert_eq!(dialer.calls(), vec![ASSIGNED_DRIVER.phone]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_assigned_driver_record() {
        let mut screen = TrackingScreen::open(draft(), &TrackingConfig::default());
        screen.wait_for(RideStatus::DriverAssigned).await.unwrap();

        let driver = screen.driver().unwrap();
        assert_eq!(driver.name, "Aksh Tiwari");
        assert_eq!(driver.phone, "9990074614");
        assert_eq!(driver.vehicle_model, "Tata Nano");
        assert_eq!(driver.vehicle_number, "DL01AB2345");
        assert_eq!(driver.eta_min, 3);
    }

    #[test]
    fn test_labels() {
        assert_eq!(RideStatus::Searching.to_string(), "Finding your driver...");
        assert!(RideStatus::Completed > RideStatus::OnTrip);
    }
}
