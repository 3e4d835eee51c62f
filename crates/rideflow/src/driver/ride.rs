//! The driver's active ride.
//!
//! A ride moves strictly forward: `pickup`, then `onboard` once the
//! passenger's OTP matches, then `completed` once the driver confirms the
//! trip summary. The current stage is mirrored into the store under
//! [`keys::ACTIVE_RIDE`] so a relaunch resumes where the driver left off.
//! Storage trouble never blocks the ride; it is logged and the flow carries
//! on as if no record existed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::digits_only;
use crate::error::{Error, Result};
use crate::storage::{keys, read_json, write_json, KeyValueStore};

/// Where the ride is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStage {
    /// Driving to the passenger.
    Pickup,
    /// Passenger in the car.
    Onboard,
    /// Trip finished.
    Completed,
}

impl RideStage {
    /// The stage after this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pickup => Some(Self::Onboard),
            Self::Onboard => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Heading shown on the ride card.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Pickup => "Arriving at Pickup",
            Self::Onboard => "Passenger Onboard",
            Self::Completed => "Trip Completed",
        }
    }

    /// Label of the primary button, if there is one.
    #[must_use]
    pub fn action_label(self) -> Option<&'static str> {
        match self {
            Self::Pickup => Some("ARRIVED"),
            Self::Onboard => Some("END TRIP"),
            Self::Completed => None,
        }
    }

    /// Lowercase name, as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Onboard => "onboard",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RideStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets persisted under [`keys::ACTIVE_RIDE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage at the time of writing.
    pub stage: RideStage,
}

/// Fixed details of the mocked ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideDetails {
    /// Pickup address.
    pub pickup: &'static str,
    /// Drop address.
    pub drop: &'static str,
    /// Estimated fare in rupees.
    pub estimated_fare: u32,
}

/// The ride every driver gets.
pub const ACTIVE_RIDE: RideDetails = RideDetails {
    pickup: "Sector 21, Dwarka",
    drop: "IGI Airport, Terminal 3",
    estimated_fare: 420,
};

/// Shown before the driver confirms the end of a trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripSummary {
    /// Distance covered.
    pub distance_km: f64,
    /// Time taken.
    pub duration_min: u32,
    /// Driver earnings in rupees.
    pub earnings: u32,
}

/// Synthetic summary for the mocked ride.
pub const TRIP_SUMMARY: TripSummary = TripSummary {
    distance_km: 12.4,
    duration_min: 28,
    earnings: 420,
};

/// Overlay currently open above the ride card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    /// Nothing open.
    #[default]
    None,
    /// OTP keypad.
    OtpEntry,
    /// Trip summary awaiting confirmation.
    TripSummary,
}

/// State of the active-ride screen.
#[derive(Debug)]
pub struct RideFlow {
    store: Arc<dyn KeyValueStore>,
    expected_otp: String,
    stage: RideStage,
    surface: Surface,
    otp_input: String,
}

impl RideFlow {
    /// Open the ride screen, resuming any persisted stage.
    ///
    /// A missing, unreadable or `completed` record starts at
    /// [`RideStage::Pickup`].
    pub async fn resume(store: Arc<dyn KeyValueStore>, expected_otp: impl Into<String>) -> Self {
        let stage = match read_json::<StageRecord>(store.as_ref(), keys::ACTIVE_RIDE).await {
            Ok(Some(StageRecord {
                stage: stage @ (RideStage::Pickup | RideStage::Onboard),
            })) => {
                info!(%stage, "Resuming ride");
                stage
            }
            Ok(Some(StageRecord {
                stage: RideStage::Completed,
            })) => {
                debug!("Stored ride already completed; starting fresh");
                RideStage::Pickup
            }
            Ok(None) => RideStage::Pickup,
            Err(e) => {
                warn!("Could not read stored ride, starting at pickup: {}", e);
                RideStage::Pickup
            }
        };

        Self {
            store,
            expected_otp: expected_otp.into(),
            stage,
            surface: Surface::None,
            otp_input: String::new(),
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> RideStage {
        self.stage
    }

    /// Overlay currently open.
    #[must_use]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Digits typed into the OTP keypad so far.
    #[must_use]
    pub fn otp_input(&self) -> &str {
        &self.otp_input
    }

    /// Mocked ride details for the card.
    #[must_use]
    pub fn details(&self) -> RideDetails {
        ACTIVE_RIDE
    }

    /// Press the primary button.
    ///
    /// Opens the OTP keypad at pickup and the trip summary when onboard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStage`] once the ride is completed.
    pub fn primary_action(&mut self) -> Result<Surface> {
        self.surface = match self.stage {
            RideStage::Pickup => Surface::OtpEntry,
            RideStage::Onboard => Surface::TripSummary,
            RideStage::Completed => {
                return Err(Error::InvalidStage {
                    action: "continue",
                    stage: self.stage.to_string(),
                })
            }
        };
        Ok(self.surface)
    }

    /// Type into the OTP keypad. Non-digits are dropped and input is capped
    /// at the expected code's length.
    pub fn type_otp(&mut self, input: &str) {
        self.otp_input = digits_only(input, self.expected_otp.len());
    }

    /// Close the OTP keypad without advancing.
    pub fn cancel_otp(&mut self) {
        if self.surface == Surface::OtpEntry {
            self.surface = Surface::None;
        }
    }

    /// Check the typed OTP.
    ///
    /// On a match the keypad closes, the input is cleared and the ride moves
    /// onboard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OtpRejected`] on a mismatch, leaving stage and input
    /// unchanged, or [`Error::InvalidStage`] if the keypad is not open.
    pub async fn submit_otp(&mut self) -> Result<()> {
        if self.surface != Surface::OtpEntry {
            return Err(Error::InvalidStage {
                action: "submit OTP",
                stage: self.stage.to_string(),
            });
        }
        if self.otp_input != self.expected_otp {
            warn!("Ride OTP mismatch");
            return Err(Error::OtpRejected);
        }

        self.surface = Surface::None;
        self.otp_input.clear();
        self.advance().await;
        Ok(())
    }

    /// Close the trip summary without ending the trip.
    pub fn dismiss_summary(&mut self) {
        if self.surface == Surface::TripSummary {
            self.surface = Surface::None;
        }
    }

    /// Confirm the trip summary, completing the ride and deleting its record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStage`] if the summary is not open.
    pub async fn confirm_trip_end(&mut self) -> Result<TripSummary> {
        if self.surface != Surface::TripSummary {
            return Err(Error::InvalidStage {
                action: "end trip",
                stage: self.stage.to_string(),
            });
        }
        self.surface = Surface::None;
        self.advance().await;
        Ok(TRIP_SUMMARY)
    }

    async fn advance(&mut self) {
        let Some(next) = self.stage.next() else {
            return;
        };
        info!(from = %self.stage, to = %next, "Ride stage advanced");
        self.stage = next;
        self.persist().await;
    }

    async fn persist(&self) {
        let result = match self.stage {
            RideStage::Completed => self.store.remove_item(keys::ACTIVE_RIDE).await,
            stage => write_json(self.store.as_ref(), keys::ACTIVE_RIDE, &StageRecord { stage }).await,
        };
        if let Err(e) = result {
            warn!(stage = %self.stage, "Could not persist ride stage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    async fn flow(store: &Arc<MemoryStore>) -> RideFlow {
        let store: Arc<dyn KeyValueStore> = store.clone();
        RideFlow::resume(store, "1234").await
    }

    async fn arrive(ride: &mut RideFlow) {
        ride.primary_action().unwrap();
        ride.type_otp("1234");
        ride.submit_otp().await.unwrap();
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(RideStage::Pickup.next(), Some(RideStage::Onboard));
        assert_eq!(RideStage::Onboard.next(), Some(RideStage::Completed));
        assert_eq!(RideStage::Completed.next(), None);
        assert!(RideStage::Pickup < RideStage::Completed);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(RideStage::Pickup.action_label(), Some("ARRIVED"));
        assert_eq!(RideStage::Onboard.action_label(), Some("END TRIP"));
        assert_eq!(RideStage::Completed.action_label(), None);
        assert_eq!(RideStage::Onboard.title(), "Passenger Onboard");
    }

    #[test]
    fn test_record_json() {
        let json = serde_json::to_string(&StageRecord {
            stage: RideStage::Onboard,
        })
        .unwrap();
        assert_eq!(json, r#"{"stage":"onboard"}"#);
    }

    #[tokio::test]
    async fn test_fresh_ride_starts_at_pickup() {
        let store = Arc::new(MemoryStore::new());
        let ride = flow(&store).await;
        assert_eq!(ride.stage(), RideStage::Pickup);
        assert_eq!(ride.surface(), Surface::None);
        assert_eq!(ride.details().estimated_fare, 420);
    }

    #[tokio::test]
    async fn test_correct_otp_moves_onboard_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut ride = flow(&store).await;

        assert_eq!(ride.primary_action().unwrap(), Surface::OtpEntry);
        ride.type_otp("12-34");
        assert_eq!(ride.otp_input(), "1234");
        ride.submit_otp().await.unwrap();

        assert_eq!(ride.stage(), RideStage::Onboard);
        assert_eq!(ride.surface(), Surface::None);
        assert_eq!(ride.otp_input(), "");
        assert_eq!(
            store.get_item(keys::ACTIVE_RIDE).await.unwrap().as_deref(),
            Some(r#"{"stage":"onboard"}"#)
        );
    }

    #[tokio::test]
    async fn test_wrong_otp_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut ride = flow(&store).await;
        ride.primary_action().unwrap();
        ride.type_otp("4321");

        let err = ride.submit_otp().await.unwrap_err();
        assert!(matches!(err, Error::OtpRejected));
        assert_eq!(ride.stage(), RideStage::Pickup);
        assert_eq!(ride.surface(), Surface::OtpEntry);
        assert_eq!(ride.otp_input(), "4321");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_otp_input_capped() {
        let store = Arc::new(MemoryStore::new());
        let mut ride = flow(&store).await;
        ride.type_otp("123456");
        assert_eq!(ride.otp_input(), "1234");
    }

    #[tokio::test]
    async fn test_cancel_otp_keeps_stage() {
        let store = Arc::new(MemoryStore::new());
        let mut ride = flow(&store).await;
        ride.primary_action().unwrap();
        ride.cancel_otp();
        assert_eq!(ride.surface(), Surface::None);
        assert_eq!(ride.stage(), RideStage::Pickup);
        assert!(ride.submit_otp().await.is_err());
    }

    #[tokio::test]
    async fn test_full_trip_deletes_record() {
        let store = Arc::new(MemoryStore::new());
        let mut ride = flow(&store).await;
        arrive(&mut ride).await;

        assert_eq!(ride.primary_action().unwrap(), Surface::TripSummary);
        let summary = ride.confirm_trip_end().await.unwrap();
        assert_eq!(summary.earnings, 420);
        assert_eq!(ride.stage(), RideStage::Completed);
        assert!(store.get_item(keys::ACTIVE_RIDE).await.unwrap().is_none());

        assert!(matches!(
            ride.primary_action(),
            Err(Error::InvalidStage { .. })
        ));
    }

    #[tokio::test]
    async fn test_end_trip_needs_summary_open() {
        let store = Arc::new(MemoryStore::new());
        let mut ride = flow(&store).await;
        arrive(&mut ride).await;
        assert!(ride.confirm_trip_end().await.is_err());

        ride.primary_action().unwrap();
        ride.dismiss_summary();
        assert!(ride.confirm_trip_end().await.is_err());
        assert_eq!(ride.stage(), RideStage::Onboard);
    }

    #[tokio::test]
    async fn test_resume_onboard() {
        let store = Arc::new(MemoryStore::new());
        arrive(&mut flow(&store).await).await;

        let resumed = flow(&store).await;
        assert_eq!(resumed.stage(), RideStage::Onboard);
    }

    #[tokio::test]
    async fn test_resume_completed_record_starts_fresh() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_item(keys::ACTIVE_RIDE, r#"{"stage":"completed"}"#)
            .await
            .unwrap();
        assert_eq!(flow(&store).await.stage(), RideStage::Pickup);
    }

    #[tokio::test]
    async fn test_resume_with_unreadable_store_starts_at_pickup() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_item(keys::ACTIVE_RIDE, r#"{"stage":"onboard"}"#)
            .await
            .unwrap();
        store.set_fail_reads(true);
        assert_eq!(flow(&store).await.stage(), RideStage::Pickup);

        store.set_fail_reads(false);
        store.set_item(keys::ACTIVE_RIDE, "garbage").await.unwrap();
        assert_eq!(flow(&store).await.stage(), RideStage::Pickup);
    }

    #[tokio::test]
    async fn test_write_failure_still_advances() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let mut ride = flow(&store).await;
        arrive(&mut ride).await;
        assert_eq!(ride.stage(), RideStage::Onboard);
    }
}
