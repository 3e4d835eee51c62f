//! Signed-in session shared by a client's screens.
//!
//! A [`Session`] is restored once at launch, replaced on sign-in and cleared
//! on logout. Screens receive it explicitly instead of reaching for globals.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::{keys, read_json, write_json, KeyValueStore};

/// Alert shown when the stored session cannot be read at launch.
pub const RESTORE_ALERT: &str = "error getting user!";

/// Alert shown when signing in fails to persist.
pub const SIGN_IN_ALERT: &str = "Could not save your account. Please try again.";

/// Value stored under [`keys::LOGGED_IN`] while signed in.
const LOGGED_IN_VALUE: &str = "true";

/// A user as captured at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Name as typed.
    pub full_name: String,
    /// Mobile number; riders store it with the country prefix.
    pub mobile_number: String,
    /// City or area.
    pub city: String,
    /// Role-specific fields.
    #[serde(flatten)]
    pub details: ProfileDetails,
}

/// Fields that only one of the two apps records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ProfileDetails {
    /// Passenger account.
    Rider {
        /// Wallet balance in rupees.
        balance: u32,
    },
    /// Driver account.
    #[serde(rename_all = "camelCase")]
    Driver {
        /// Registration plate; optional at sign-up.
        vehicle_number: String,
        /// Seats offered.
        vehicle_capacity: u8,
    },
}

impl UserProfile {
    /// Whether this is a driver profile.
    #[must_use]
    pub fn is_driver(&self) -> bool {
        matches!(self.details, ProfileDetails::Driver { .. })
    }
}

/// The signed-in state of one client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    logged_in: bool,
    profile: Option<UserProfile>,
}

impl Session {
    /// A signed-out session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Load the session persisted in `store`.
    ///
    /// A missing or non-`"true"` flag yields a signed-out session. A signed-in
    /// flag without a profile is valid (drivers may log in without
    /// registering on this device).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the profile is corrupt.
    pub async fn restore(store: &dyn KeyValueStore) -> Result<Self> {
        let flag = store.get_item(keys::LOGGED_IN).await?;
        if flag.as_deref() != Some(LOGGED_IN_VALUE) {
            debug!("No stored session");
            return Ok(Self::signed_out());
        }

        let profile: Option<UserProfile> = read_json(store, keys::USER).await?;
        info!(
            "Restored session for {}",
            profile.as_ref().map_or("<no profile>", |p| p.full_name.as_str())
        );
        Ok(Self {
            logged_in: true,
            profile,
        })
    }

    /// Load the session, falling back to signed-out with an alert message
    /// if the store fails.
    pub async fn restore_or_alert(store: &dyn KeyValueStore) -> (Self, Option<&'static str>) {
        match Self::restore(store).await {
            Ok(session) => (session, None),
            Err(e) => {
                warn!("Failed to restore session: {}", e);
                (Self::signed_out(), Some(RESTORE_ALERT))
            }
        }
    }

    /// Persist a sign-in and adopt it.
    ///
    /// The profile (if any) is written before the flag. The in-memory session
    /// only changes once both writes succeed. Without a new profile, a
    /// previously stored one is picked up.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub async fn sign_in(
        &mut self,
        store: &dyn KeyValueStore,
        profile: Option<UserProfile>,
    ) -> Result<()> {
        if let Some(profile) = &profile {
            write_json(store, keys::USER, profile).await?;
        }
        store.set_item(keys::LOGGED_IN, LOGGED_IN_VALUE).await?;

        if profile.is_some() {
            self.profile = profile;
        } else if self.profile.is_none() {
            self.profile = read_json(store, keys::USER).await.unwrap_or_else(|e| {
                warn!("Ignoring unreadable stored profile: {}", e);
                None
            });
        }
        self.logged_in = true;
        info!("Signed in");
        Ok(())
    }

    /// Delete the persisted session and reset to signed-out.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written; the in-memory session
    /// is left untouched in that case.
    pub async fn sign_out(&mut self, store: &dyn KeyValueStore) -> Result<()> {
        store.remove_item(keys::LOGGED_IN).await?;
        store.remove_item(keys::USER).await?;
        *self = Self::signed_out();
        info!("Signed out");
        Ok(())
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// The signed-in user's profile, if one was recorded.
    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }
}
