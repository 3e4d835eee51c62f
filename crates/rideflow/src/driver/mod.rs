//! The driver client.
//!
//! [`DriverApp`] is the root: it restores the session at launch and routes
//! between the sign-in, home and active-ride screens.

pub mod home;
pub mod ride;

pub use home::{DriverHome, DriverStats, RideRequest};
pub use ride::{RideDetails, RideFlow, RideStage, StageRecord, Surface, TripSummary};

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{AuthRules, DriverSignIn};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{Session, SIGN_IN_ALERT};
use crate::storage::KeyValueStore;

/// Top-level screens of the driver client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverScreen {
    /// Sign-in or registration.
    Auth,
    /// Availability and incoming requests.
    Home,
    /// A ride in progress.
    ActiveRide,
}

/// Root of the driver client.
#[derive(Debug)]
pub struct DriverApp {
    store: Arc<dyn KeyValueStore>,
    rules: AuthRules,
    ride_otp: String,
    session: Session,
    screen: DriverScreen,
    home: DriverHome,
    ride: Option<RideFlow>,
    alert: Option<String>,
}

impl DriverApp {
    /// Launch the client against `store`.
    ///
    /// A store that cannot be read leaves the app signed out with an alert
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns an error only if the configuration cannot produce auth rules.
    pub async fn launch(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let (session, alert) = Session::restore_or_alert(store.as_ref()).await;
        let screen = if session.is_logged_in() {
            DriverScreen::Home
        } else {
            DriverScreen::Auth
        };
        info!(?screen, "Driver app launched");

        Ok(Self {
            store,
            rules: AuthRules::from_config(&config.auth)?,
            ride_otp: config.driver.ride_otp.clone(),
            session,
            screen,
            home: DriverHome::new(),
            ride: None,
            alert: alert.map(str::to_string),
        })
    }

    /// Current screen.
    #[must_use]
    pub fn screen(&self) -> DriverScreen {
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

    /// A fresh sign-in form.
    #[must_use]
    pub fn sign_in_form(&self) -> DriverSignIn {
        DriverSignIn::new(self.rules.clone())
    }

    /// Verify `form` and move to the home screen.
    ///
    /// If the store cannot be written an alert is raised and the app stays on
    /// the sign-in screen.
    ///
    /// # Errors
    ///
    /// Returns the verification or storage error.
    pub async fn complete_sign_in(&mut self, form: &mut DriverSignIn) -> Result<()> {
        match form.verify(&mut self.session, self.store.as_ref()).await {
            Ok(()) => {
                self.screen = DriverScreen::Home;
                Ok(())
            }
            Err(e) => {
                if e.is_storage_error() {
                    warn!("Driver sign-in failed: {}", e);
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

    /// Greeting line for the home header.
    #[must_use]
    pub fn greeting(&self) -> String {
        match self.session.profile() {
            Some(profile) => format!("Hello, {} ({})", profile.full_name, profile.city),
            None => "Hello, driver".to_string(),
        }
    }

    /// The home screen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] before sign-in.
    pub fn home(&mut self) -> Result<&mut DriverHome> {
        self.require_signed_in()?;
        Ok(&mut self.home)
    }

    /// Accept the incoming request and open the ride screen.
    ///
    /// # Errors
    ///
    /// Returns an error if signed out or no request is pending.
    pub async fn accept_ride(&mut self) -> Result<&mut RideFlow> {
        self.require_signed_in()?;
        self.home.accept()?;
        self.open_ride().await
    }

    /// Open the ride screen, resuming any stored stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] before sign-in.
    pub async fn open_ride(&mut self) -> Result<&mut RideFlow> {
        self.require_signed_in()?;
        let flow = RideFlow::resume(Arc::clone(&self.store), self.ride_otp.clone()).await;
        self.screen = DriverScreen::ActiveRide;
        Ok(self.ride.insert(flow))
    }

    /// The open ride screen, if any.
    pub fn ride(&mut self) -> Option<&mut RideFlow> {
        self.ride.as_mut()
    }

    /// Confirm the end of the trip and return home.
    ///
    /// # Errors
    ///
    /// Returns an error if no ride is open or its summary is not showing.
    pub async fn end_trip(&mut self) -> Result<TripSummary> {
        let ride = self
            .ride
            .as_mut()
            .ok_or_else(|| Error::unavailable("end trip", "no ride in progress"))?;
        let summary = ride.confirm_trip_end().await?;
        self.ride = None;
        self.screen = DriverScreen::Home;
        Ok(summary)
    }

    /// Sign out and return to the sign-in screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn logout(&mut self) -> Result<()> {
        self.session.sign_out(self.store.as_ref()).await?;
        self.home = DriverHome::new();
        self.ride = None;
        self.screen = DriverScreen::Auth;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{keys, MemoryStore};

    async fn launch(store: &Arc<MemoryStore>) -> DriverApp {
        let store: Arc<dyn KeyValueStore> = store.clone();
        DriverApp::launch(&Config::default(), store).await.unwrap()
    }

    async fn signed_in(store: &Arc<MemoryStore>) -> DriverApp {
        let mut app = launch(store).await;
        let mut form = app.sign_in_form();
        form.set_mobile("9876543210");
        form.send_code().unwrap();
        form.set_code("123456");
        app.complete_sign_in(&mut form).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_launch_signed_out() {
        let store = Arc::new(MemoryStore::new());
        let mut app = launch(&store).await;
        assert_eq!(app.screen(), DriverScreen::Auth);
        assert!(app.take_alert().is_none());
        assert!(matches!(app.home(), Err(Error::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_launch_read_failure_alerts() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_reads(true);
        let mut app = launch(&store).await;
        assert_eq!(app.screen(), DriverScreen::Auth);
        assert_eq!(app.take_alert().as_deref(), Some("error getting user!"));
    }

    #[tokio::test]
    async fn test_sign_in_goes_home_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let app = signed_in(&store).await;
        assert_eq!(app.screen(), DriverScreen::Home);
        assert_eq!(app.greeting(), "Hello, driver");

        let relaunched = launch(&store).await;
        assert_eq!(relaunched.screen(), DriverScreen::Home);
    }

    #[tokio::test]
    async fn test_sign_in_write_failure_alerts() {
        let store = Arc::new(MemoryStore::new());
        let mut app = launch(&store).await;
        let mut form = app.sign_in_form();
        form.set_mobile("9876543210");
        form.send_code().unwrap();
        form.set_code("123456");

        store.set_fail_writes(true);
        assert!(app.complete_sign_in(&mut form).await.is_err());
        assert_eq!(app.screen(), DriverScreen::Auth);
        assert_eq!(app.take_alert().as_deref(), Some(SIGN_IN_ALERT));
    }

    #[tokio::test]
    async fn test_sign_in_validation_failure_is_silent() {
        let store = Arc::new(MemoryStore::new());
        let mut app = launch(&store).await;
        let mut form = app.sign_in_form();
        form.set_mobile("9876543210");
        form.set_code("123456");

        let err = app.complete_sign_in(&mut form).await.unwrap_err();
        assert!(!err.is_storage_error());
        assert_eq!(app.screen(), DriverScreen::Auth);
        assert!(app.take_alert().is_none());
    }

    #[tokio::test]
    async fn test_accept_then_complete_ride() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_in(&store).await;

        let home = app.home().unwrap();
        home.set_online(true);
        home.simulate_incoming().unwrap();

        let ride = app.accept_ride().await.unwrap();
        assert_eq!(ride.stage(), RideStage::Pickup);
        ride.primary_action().unwrap();
        ride.type_otp("1234");
        ride.submit_otp().await.unwrap();
        ride.primary_action().unwrap();
        assert_eq!(app.screen(), DriverScreen::ActiveRide);

        let summary = app.end_trip().await.unwrap();
        assert_eq!(summary.distance_km, 12.4);
        assert_eq!(app.screen(), DriverScreen::Home);
        assert!(app.ride().is_none());
        assert!(store.get_item(keys::ACTIVE_RIDE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accept_without_request_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_in(&store).await;
        assert!(app.accept_ride().await.is_err());
        assert_eq!(app.screen(), DriverScreen::Home);
    }

    #[tokio::test]
    async fn test_logout_returns_to_auth() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_in(&store).await;
        app.logout().await.unwrap();
        assert_eq!(app.screen(), DriverScreen::Auth);
        assert!(store.get_item(keys::LOGGED_IN).await.unwrap().is_none());
    }
}
