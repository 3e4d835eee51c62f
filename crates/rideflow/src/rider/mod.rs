//! The rider client.
//!
//! [`RiderApp`] restores the session at launch and routes between sign-up,
//! the destination picker, the booking screen and ride tracking. The booking
//! draft is handed from screen to screen by value and never stored.

pub mod booking;
pub mod tracking;

pub use booking::{
    BookingDraft, BookingForm, DestinationChoice, DestinationForm, FareTable, PaymentMethod,
    RideType,
};
pub use tracking::{AssignedDriver, RideStatus, TrackingScreen};

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{AuthRules, RiderSignUp};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{Session, SIGN_IN_ALERT};
use crate::storage::KeyValueStore;

/// Top-level screens of the rider client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderScreen {
    /// Sign-up.
    Auth,
    /// Destination and ride type.
    Home,
    /// Pickup, payment and passengers.
    Booking,
    /// Ride progress.
    Tracking,
}

/// Root of the rider client.
#[derive(Debug)]
pub struct RiderApp {
    store: Arc<dyn KeyValueStore>,
    config: Config,
    rules: AuthRules,
    session: Session,
    screen: RiderScreen,
    alert: Option<String>,
}

impl RiderApp {
    /// Launch the client against `store`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the configuration cannot produce auth rules.
    pub async fn launch(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let (session, alert) = Session::restore_or_alert(store.as_ref()).await;
        let screen = if session.is_logged_in() {
            RiderScreen::Home
        } else {
            RiderScreen::Auth
        };
        info!(?screen, "Rider app launched");

        Ok(Self {
            store,
            config: config.clone(),
            rules: AuthRules::from_config(&config.auth)?,
            session,
            screen,
            alert: alert.map(str::to_string),
        })
    }

    /// Current screen.
    #[must_use]
    pub fn screen(&self) -> RiderScreen {
        self.screen
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Take the pending alert, if any.
    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    /// A fresh sign-up form.
    #[must_use]
    pub fn sign_up_form(&self) -> RiderSignUp {
        RiderSignUp::new(self.rules.clone())
    }

    /// Finish sign-up and go home.
    ///
    /// # Errors
    ///
    /// Returns the validation or storage error; storage errors also raise an
    /// alert.
    pub async fn complete_sign_up(&mut self, form: &RiderSignUp) -> Result<()> {
        match form.finish(&mut self.session, self.store.as_ref()).await {
            Ok(()) => {
                self.screen = RiderScreen::Home;
                Ok(())
            }
            Err(e) => {
                if e.is_storage_error() {
                    warn!("Rider sign-up failed: {}", e);
                    self.alert = Some(SIGN_IN_ALERT.to_string());
                }
                Err(e)
            }
        }
    }

    fn require_signed_in(&self) -> Result<()> {
        if self.session.is_logged_in() {
            Ok(())
        } else {
            Err(Error::NotSignedIn)
        }
    }

    /// Fares and caps in force.
    #[must_use]
    pub fn fares(&self) -> FareTable {
        FareTable::from_config(&self.config.rider)
    }

    /// A fresh destination picker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] before sign-up.
    pub fn destination_form(&self) -> Result<DestinationForm> {
        self.require_signed_in()?;
        Ok(DestinationForm::new(self.config.rider.min_destination_len))
    }

    /// Continue from the destination picker to booking.
    ///
    /// # Errors
    ///
    /// Returns the picker's validation error, or [`Error::NotSignedIn`].
    pub fn start_booking(&mut self, form: &mut DestinationForm) -> Result<BookingForm> {
        self.require_signed_in()?;
        let choice = form.submit()?;
        self.screen = RiderScreen::Booking;
        Ok(BookingForm::new(choice, self.fares()))
    }

    /// Leave booking, discarding the draft.
    pub fn back_home(&mut self, form: BookingForm) {
        info!(destination = form.destination(), "Booking discarded");
        drop(form);
        self.screen = RiderScreen::Home;
    }

    /// Confirm the booking and start tracking. Must be called from within a
    /// tokio runtime.
    pub fn confirm_booking(&mut self, form: BookingForm) -> TrackingScreen {
        let draft = form.confirm();
        self.screen = RiderScreen::Tracking;
        TrackingScreen::open(draft, &self.config.tracking)
    }

    /// Leave tracking for home, cancelling any pending updates.
    pub fn finish_tracking(&mut self, screen: TrackingScreen) {
        screen.close();
        self.screen = RiderScreen::Home;
    }

    /// Sign out and return to sign-up.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn logout(&mut self) -> Result<()> {
        self.session.sign_out(self.store.as_ref()).await?;
        self.screen = RiderScreen::Auth;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    async fn launch(store: &Arc<MemoryStore>) -> RiderApp {
        let store: Arc<dyn KeyValueStore> = store.clone();
        RiderApp::launch(&Config::default(), store).await.unwrap()
    }

    async fn signed_up(store: &Arc<MemoryStore>) -> RiderApp {
        let mut app = launch(store).await;
        let mut form = app.sign_up_form();
        form.set_full_name("Asha Rao");
        form.set_mobile("9876543210");
        form.send_code().unwrap();
        form.set_code("123456");
        form.verify().unwrap();
        form.select_area("Rohini").unwrap();
        app.complete_sign_up(&form).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_launch_routes_by_session() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(launch(&store).await.screen(), RiderScreen::Auth);

        signed_up(&store).await;
        let relaunched = launch(&store).await;
        assert_eq!(relaunched.screen(), RiderScreen::Home);
        assert_eq!(relaunched.session().profile().unwrap().city, "Rohini");
    }

    #[tokio::test]
    async fn test_sign_up_without_area_is_silent() {
        let store = Arc::new(MemoryStore::new());
        let mut app = launch(&store).await;
        let mut form = app.sign_up_form();
        form.set_full_name("Asha Rao");
        form.set_mobile("9876543210");
        form.send_code().unwrap();
        form.set_code("123456");
        form.verify().unwrap();

        let err = app.complete_sign_up(&form).await.unwrap_err();
        assert!(!err.is_storage_error());
        assert_eq!(app.screen(), RiderScreen::Auth);
        assert!(app.take_alert().is_none());
    }

    #[tokio::test]
    async fn test_launch_read_failure_alerts() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_reads(true);
        let mut app = launch(&store).await;
        assert_eq!(app.screen(), RiderScreen::Auth);
        assert_eq!(app.take_alert().as_deref(), Some("error getting user!"));
    }

    #[tokio::test]
    async fn test_sign_up_write_failure_alerts() {
        let store = Arc::new(MemoryStore::new());
        let mut app = launch(&store).await;
        let mut form = app.sign_up_form();
        form.set_full_name("Asha Rao");
        form.set_mobile("9876543210");
        form.send_code().unwrap();
        form.set_code("123456");
        form.verify().unwrap();
        form.select_area("Rohini").unwrap();

        store.set_fail_writes(true);
        assert!(app.complete_sign_up(&form).await.is_err());
        assert_eq!(app.screen(), RiderScreen::Auth);
        assert_eq!(app.take_alert().as_deref(), Some(SIGN_IN_ALERT));
    }

    #[tokio::test]
    async fn test_destination_requires_sign_in() {
        let store = Arc::new(MemoryStore::new());
        let app = launch(&store).await;
        assert!(matches!(app.destination_form(), Err(Error::NotSignedIn)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_book_track_and_finish() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_up(&store).await;

        let mut picker = app.destination_form().unwrap();
        picker.pick("Railway Station");
        picker.choose_ride_type(RideType::Personal);
        let mut booking = app.start_booking(&mut picker).unwrap();
        assert_eq!(app.screen(), RiderScreen::Booking);
        assert_eq!(booking.fare(), 100);
        booking.increment_passengers();

        let mut screen = app.confirm_booking(booking);
        assert_eq!(app.screen(), RiderScreen::Tracking);
        assert_eq!(screen.draft().passenger_count, 2);
        screen.wait_for(RideStatus::Completed).await.unwrap();

        app.finish_tracking(screen);
        assert_eq!(app.screen(), RiderScreen::Home);
    }

    #[tokio::test]
    async fn test_back_discards_draft() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_up(&store).await;
        let mut picker = app.destination_form().unwrap();
        picker.type_text("India Gate");
        picker.choose_ride_type(RideType::Shared);
        let booking = app.start_booking(&mut picker).unwrap();

        app.back_home(booking);
        assert_eq!(app.screen(), RiderScreen::Home);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_destination_stays_home() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_up(&store).await;
        let mut picker = app.destination_form().unwrap();
        picker.type_text("ab");
        picker.choose_ride_type(RideType::Shared);

        assert!(app.start_booking(&mut picker).is_err());
        assert_eq!(app.screen(), RiderScreen::Home);
        assert!(picker.error().is_some());
    }
}
