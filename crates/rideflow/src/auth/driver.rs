//! Driver sign-in form.

use tracing::info;

use super::{AuthRules, CodeEntry};
use crate::error::{Error, Result};
use crate::session::{ProfileDetails, Session, UserProfile};
use crate::storage::KeyValueStore;

/// Whether the driver is returning or new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Existing driver; only the mobile number is needed.
    #[default]
    Login,
    /// New driver; profile and vehicle details are collected.
    Register,
}

impl AuthMode {
    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }
}

/// State of the driver's sign-in screen.
#[derive(Debug, Clone)]
pub struct DriverSignIn {
    rules: AuthRules,
    mode: AuthMode,
    mobile: String,
    full_name: String,
    city: String,
    vehicle_number: String,
    vehicle_capacity: String,
    entry: CodeEntry,
}

impl DriverSignIn {
    /// An empty form in login mode.
    #[must_use]
    pub fn new(rules: AuthRules) -> Self {
        Self {
            rules,
            mode: AuthMode::default(),
            mobile: String::new(),
            full_name: String::new(),
            city: String::new(),
            vehicle_number: String::new(),
            vehicle_capacity: String::new(),
            entry: CodeEntry::default(),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Switch between login and register. Typed fields are kept; any sent
    /// code is discarded.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.entry.reset();
    }

    /// Switch to a specific mode.
    pub fn set_mode(&mut self, mode: AuthMode) {
        if self.mode != mode {
            self.toggle_mode();
        }
    }

    /// Type into the mobile field.
    pub fn set_mobile(&mut self, input: &str) {
        self.mobile = self.rules.sanitize_mobile(input);
    }

    /// Type into the full-name field.
    pub fn set_full_name(&mut self, input: &str) {
        self.full_name = input.to_string();
    }

    /// Type into the city field.
    pub fn set_city(&mut self, input: &str) {
        self.city = input.to_string();
    }

    /// Type into the vehicle-number field.
    pub fn set_vehicle_number(&mut self, input: &str) {
        self.vehicle_number = input.trim().to_uppercase();
    }

    /// Type into the vehicle-capacity field. Only digits are kept.
    pub fn set_vehicle_capacity(&mut self, input: &str) {
        self.vehicle_capacity = super::digits_only(input, 2);
    }

    /// The mobile number as held by the form.
    #[must_use]
    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    /// Whether "send code" is enabled.
    #[must_use]
    pub fn can_send_code(&self) -> bool {
        self.missing_field().is_none()
    }

    fn missing_field(&self) -> Option<String> {
        if !self.rules.is_valid_mobile(&self.mobile) {
            return Some(format!(
                "mobile number must be {} digits",
                self.rules.mobile_length()
            ));
        }
        if self.mode == AuthMode::Register {
            if self.full_name.trim().is_empty() {
                return Some("full name is required".to_string());
            }
            if self.city.trim().is_empty() {
                return Some("city is required".to_string());
            }
            if self.vehicle_capacity.is_empty() {
                return Some("vehicle capacity is required".to_string());
            }
        }
        None
    }

    /// Request a code. Always succeeds once the form is complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionUnavailable`] if a required field is missing.
    pub fn send_code(&mut self) -> Result<()> {
        if let Some(reason) = self.missing_field() {
            return Err(Error::unavailable("send code", reason));
        }
        self.entry.send(&self.mobile);
        Ok(())
    }

    /// Whether a code has been sent.
    #[must_use]
    pub fn code_sent(&self) -> bool {
        self.entry.is_sent()
    }

    /// Go back from code entry to the form.
    pub fn cancel_code(&mut self) {
        self.entry.reset();
    }

    /// Type into the code field.
    pub fn set_code(&mut self, input: &str) {
        self.entry.set_code(&self.rules, input);
    }

    /// Whether "verify" is enabled.
    #[must_use]
    pub fn can_verify(&self) -> bool {
        self.entry.can_verify(&self.rules)
    }

    fn profile(&self) -> Result<UserProfile> {
        let vehicle_capacity: u8 = self.vehicle_capacity.parse().map_err(|_| {
            Error::invalid_input("vehicle capacity", "must be a number between 1 and 99")
        })?;
        if vehicle_capacity == 0 {
            return Err(Error::invalid_input(
                "vehicle capacity",
                "must be a number between 1 and 99",
            ));
        }
        Ok(UserProfile {
            full_name: self.full_name.trim().to_string(),
            mobile_number: self.mobile.clone(),
            city: self.city.trim().to_string(),
            details: ProfileDetails::Driver {
                vehicle_number: self.vehicle_number.clone(),
                vehicle_capacity,
            },
        })
    }

    /// Verify the code and sign in.
    ///
    /// In register mode the profile is written first; both modes set the
    /// signed-in flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is missing or rejected, the vehicle
    /// capacity is unusable, or the store cannot be written.
    pub async fn verify(&mut self, session: &mut Session, store: &dyn KeyValueStore) -> Result<()> {
        self.entry.verify(&self.rules)?;

        let profile = match self.mode {
            AuthMode::Register => Some(self.profile()?),
            AuthMode::Login => None,
        };
        session.sign_in(store, profile).await?;

        info!(mode = ?self.mode, "Driver signed in");
        self.entry.reset();
        Ok(())
    }
}
