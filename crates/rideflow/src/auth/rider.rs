//! Rider sign-up form.

use tracing::info;

use super::{AuthRules, CodeEntry};
use crate::error::{Error, Result};
use crate::session::{ProfileDetails, Session, UserProfile};
use crate::storage::KeyValueStore;

/// Areas a rider can pick after verifying.
pub const AREAS: [&str; 5] = ["Connaught Place", "Dwarka", "Rohini", "Karol Bagh", "Saket"];

/// State of the rider's sign-up screen.
#[derive(Debug, Clone)]
pub struct RiderSignUp {
    rules: AuthRules,
    full_name: String,
    mobile: String,
    entry: CodeEntry,
    verified: bool,
    area: Option<&'static str>,
}

impl RiderSignUp {
    /// An empty form.
    #[must_use]
    pub fn new(rules: AuthRules) -> Self {
        Self {
            rules,
            full_name: String::new(),
            mobile: String::new(),
            entry: CodeEntry::default(),
            verified: false,
            area: None,
        }
    }

    /// Type into the full-name field.
    pub fn set_full_name(&mut self, input: &str) {
        self.full_name = input.to_string();
    }

    /// Type into the mobile field. Ignored once the number is verified.
    pub fn set_mobile(&mut self, input: &str) {
        if self.verified {
            return;
        }
        self.mobile = self.rules.sanitize_mobile(input);
    }

    /// The mobile number as typed, without the country prefix.
    #[must_use]
    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    /// Whether the mobile number has been verified (and is now locked).
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Whether "send code" is enabled.
    #[must_use]
    pub fn can_send_code(&self) -> bool {
        !self.verified
            && !self.full_name.trim().is_empty()
            && self.rules.is_valid_mobile(&self.mobile)
    }

    /// Request a code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionUnavailable`] if the name is blank, the mobile
    /// number is malformed, or the number is already verified.
    pub fn send_code(&mut self) -> Result<()> {
        if self.verified {
            return Err(Error::unavailable("send code", "number already verified"));
        }
        if self.full_name.trim().is_empty() {
            return Err(Error::unavailable("send code", "full name is required"));
        }
        if !self.rules.is_valid_mobile(&self.mobile) {
            return Err(Error::unavailable(
                "send code",
                format!("mobile number must be {} digits", self.rules.mobile_length()),
            ));
        }
        self.entry.send(&self.mobile);
        Ok(())
    }

    /// Whether a code has been sent.
    #[must_use]
    pub fn code_sent(&self) -> bool {
        self.entry.is_sent()
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

    /// Verify the entered code. On success the mobile number is locked and
    /// the area picker becomes available.
    ///
    /// # Errors
    ///
    /// Returns an error if no code was sent or the code is rejected.
    pub fn verify(&mut self) -> Result<()> {
        self.entry.verify(&self.rules)?;
        self.verified = true;
        self.entry.reset();
        info!("Rider mobile verified");
        Ok(())
    }

    /// Pick an area from [`AREAS`].
    ///
    /// # Errors
    ///
    /// Returns an error before verification or for an unknown area.
    pub fn select_area(&mut self, area: &str) -> Result<()> {
        if !self.verified {
            return Err(Error::unavailable("select area", "verify your number first"));
        }
        let known = AREAS
            .iter()
            .copied()
            .find(|a| a.eq_ignore_ascii_case(area.trim()))
            .ok_or_else(|| {
                Error::invalid_input("area", format!("choose one of {}", AREAS.join(", ")))
            })?;
        self.area = Some(known);
        Ok(())
    }

    /// The chosen area.
    #[must_use]
    pub fn area(&self) -> Option<&'static str> {
        self.area
    }

    /// Whether "continue" is enabled.
    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.verified && self.area.is_some()
    }

    /// Persist the new rider and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is incomplete or the store cannot be
    /// written.
    pub async fn finish(&self, session: &mut Session, store: &dyn KeyValueStore) -> Result<()> {
        let Some(area) = self.area.filter(|_| self.verified) else {
            return Err(Error::unavailable(
                "continue",
                "verify your number and choose an area",
            ));
        };

        let profile = UserProfile {
            full_name: self.full_name.trim().to_string(),
            mobile_number: format!("{}{}", self.rules.country_code(), self.mobile),
            city: area.to_string(),
            details: ProfileDetails::Rider { balance: 0 },
        };
        session.sign_in(store, Some(profile)).await?;
        info!(area, "Rider signed up");
        Ok(())
    }
}
