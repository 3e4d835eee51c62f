//! Destination choice and the booking draft.
//!
//! The rider picks a destination and ride type on the home screen
//! ([`DestinationForm`]), then fills in pickup, payment and passengers on the
//! booking screen ([`BookingForm`]). Confirming yields a [`BookingDraft`]
//! that the tracking screen takes by value; nothing here is persisted.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::RiderConfig;
use crate::error::{Error, Result};

/// Destinations offered as one-tap choices.
pub const POPULAR_DESTINATIONS: [&str; 5] =
    ["Airport", "Railway Station", "Bus Stand", "Mall", "Hospital"];

/// Pickup points offered as one-tap choices.
pub const PICKUP_SHORTCUTS: [&str; 4] = ["Home", "Work", "Airport", "Railway Station"];

/// Placeholder used when a location is chosen on the map.
pub const MAP_SELECTION: &str = "Selected from Map";

/// Shown when no destination has been given.
pub const MISSING_DESTINATION: &str = "Please select or enter a destination";

/// Shared or private cab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RideType {
    /// Seats shared with other riders.
    Shared,
    /// The whole cab.
    Personal,
}

impl RideType {
    /// Display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Shared => "Shared",
            Self::Personal => "Personal",
        }
    }
}

impl fmt::Display for RideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the rider will pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// UPI transfer.
    #[default]
    Upi,
    /// Cash to the driver.
    Cash,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upi => "UPI",
            Self::Cash => "CASH",
        })
    }
}

/// Fares and passenger caps per ride type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareTable {
    shared_fare: u32,
    personal_fare: u32,
    shared_capacity: u8,
    personal_capacity: u8,
}

impl FareTable {
    /// Build from configuration.
    #[must_use]
    pub fn from_config(config: &RiderConfig) -> Self {
        Self {
            shared_fare: config.shared_fare,
            personal_fare: config.personal_fare,
            shared_capacity: config.shared_capacity,
            personal_capacity: config.personal_capacity,
        }
    }

    /// Fixed fare in rupees.
    #[must_use]
    pub fn fare(&self, ride_type: RideType) -> u32 {
        match ride_type {
            RideType::Shared => self.shared_fare,
            RideType::Personal => self.personal_fare,
        }
    }

    /// Most passengers allowed.
    #[must_use]
    pub fn capacity(&self, ride_type: RideType) -> u8 {
        match ride_type {
            RideType::Shared => self.shared_capacity,
            RideType::Personal => self.personal_capacity,
        }
    }
}

impl Default for FareTable {
    fn default() -> Self {
        Self::from_config(&RiderConfig::default())
    }
}

/// Output of the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationChoice {
    /// Trimmed destination.
    pub destination: String,
    /// Chosen ride type.
    pub ride_type: RideType,
}

/// Where-to and ride-type selection on the rider's home screen.
#[derive(Debug, Clone)]
pub struct DestinationForm {
    min_len: usize,
    picked: Option<String>,
    typed: String,
    ride_type: Option<RideType>,
    error: Option<String>,
    touched: bool,
}

impl DestinationForm {
    /// An empty form requiring at least `min_len` characters.
    #[must_use]
    pub fn new(min_len: usize) -> Self {
        Self {
            min_len,
            picked: None,
            typed: String::new(),
            ride_type: None,
            error: None,
            touched: false,
        }
    }

    /// Tap a popular destination. Clears typed text.
    pub fn pick(&mut self, place: &str) {
        self.picked = Some(place.to_string());
        self.typed.clear();
        self.revalidate();
    }

    /// Choose the destination on the map.
    pub fn pick_on_map(&mut self) {
        self.pick(MAP_SELECTION);
    }

    /// Type a destination. Clears any picked one.
    pub fn type_text(&mut self, text: &str) {
        self.typed = text.to_string();
        self.picked = None;
        self.revalidate();
    }

    /// Choose shared or personal.
    pub fn choose_ride_type(&mut self, ride_type: RideType) {
        self.ride_type = Some(ride_type);
    }

    /// The destination as it would be submitted.
    #[must_use]
    pub fn destination(&self) -> &str {
        self.picked.as_deref().unwrap_or(&self.typed)
    }

    /// Chosen ride type.
    #[must_use]
    pub fn ride_type(&self) -> Option<RideType> {
        self.ride_type
    }

    /// Inline validation message, shown once the rider has tried to continue.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check a destination; `None` means valid.
    #[must_use]
    pub fn validate(&self, destination: &str) -> Option<String> {
        let trimmed = destination.trim();
        if trimmed.is_empty() {
            Some(MISSING_DESTINATION.to_string())
        } else if trimmed.chars().count() < self.min_len {
            Some(format!(
                "Destination must be at least {} characters",
                self.min_len
            ))
        } else {
            None
        }
    }

    fn revalidate(&mut self) {
        if self.touched {
            self.error = self.validate(self.destination());
        }
    }

    /// Whether "continue" is enabled.
    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.ride_type.is_some() && self.validate(self.destination()).is_none()
    }

    /// Press "continue".
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] with the inline message if the
    /// destination is invalid, or if no ride type was chosen.
    pub fn submit(&mut self) -> Result<DestinationChoice> {
        self.touched = true;
        self.error = self.validate(self.destination());
        if let Some(message) = &self.error {
            return Err(Error::invalid_input("destination", message.clone()));
        }
        let ride_type = self
            .ride_type
            .ok_or_else(|| Error::invalid_input("ride type", "choose shared or personal"))?;
        Ok(DestinationChoice {
            destination: self.destination().trim().to_string(),
            ride_type,
        })
    }
}

/// Everything the tracking screen needs from booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingDraft {
    /// Where to.
    pub destination: String,
    /// Shared or personal.
    pub ride_type: RideType,
    /// Pickup point, if the rider gave one.
    pub pickup: Option<String>,
    /// How the rider will pay.
    pub payment_method: PaymentMethod,
    /// Number of passengers.
    pub passenger_count: u8,
    /// Fare in rupees.
    pub fare: u32,
}

/// State of the booking screen.
#[derive(Debug, Clone)]
pub struct BookingForm {
    choice: DestinationChoice,
    fares: FareTable,
    picked_pickup: Option<String>,
    typed_pickup: String,
    payment_method: PaymentMethod,
    passengers: u8,
}

impl BookingForm {
    /// Open the booking screen for a destination choice.
    #[must_use]
    pub fn new(choice: DestinationChoice, fares: FareTable) -> Self {
        debug!(destination = %choice.destination, ride_type = %choice.ride_type, "Booking opened");
        Self {
            choice,
            fares,
            picked_pickup: None,
            typed_pickup: String::new(),
            payment_method: PaymentMethod::default(),
            passengers: 1,
        }
    }

    /// Destination carried over from the home screen.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.choice.destination
    }

    /// Ride type carried over from the home screen.
    #[must_use]
    pub fn ride_type(&self) -> RideType {
        self.choice.ride_type
    }

    /// Tap a pickup shortcut. Clears typed text.
    pub fn pick_pickup(&mut self, place: &str) {
        self.picked_pickup = Some(place.to_string());
        self.typed_pickup.clear();
    }

    /// Choose the pickup on the map.
    pub fn pick_pickup_on_map(&mut self) {
        self.pick_pickup(MAP_SELECTION);
    }

    /// Type a pickup point. Clears any picked one.
    pub fn type_pickup(&mut self, text: &str) {
        self.typed_pickup = text.to_string();
        self.picked_pickup = None;
    }

    /// The pickup point, if any.
    #[must_use]
    pub fn pickup(&self) -> Option<&str> {
        match &self.picked_pickup {
            Some(picked) => Some(picked.as_str()),
            None => Some(self.typed_pickup.trim()).filter(|s| !s.is_empty()),
        }
    }

    /// Choose UPI or cash.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Chosen payment method.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Passengers so far.
    #[must_use]
    pub fn passengers(&self) -> u8 {
        self.passengers
    }

    /// Most passengers this ride type allows.
    #[must_use]
    pub fn max_passengers(&self) -> u8 {
        self.fares.capacity(self.choice.ride_type)
    }

    /// Add a passenger. No-op at the cap.
    pub fn increment_passengers(&mut self) {
        if self.passengers < self.max_passengers() {
            self.passengers += 1;
        }
    }

    /// Remove a passenger. No-op at one.
    pub fn decrement_passengers(&mut self) {
        if self.passengers > 1 {
            self.passengers -= 1;
        }
    }

    /// Fare for the chosen ride type.
    #[must_use]
    pub fn fare(&self) -> u32 {
        self.fares.fare(self.choice.ride_type)
    }

    /// Press "confirm".
    #[must_use]
    pub fn confirm(self) -> BookingDraft {
        let draft = BookingDraft {
            pickup: self.pickup().map(str::to_string),
            fare: self.fare(),
            passenger_count: self.passengers,
            payment_method: self.payment_method,
            destination: self.choice.destination,
            ride_type: self.choice.ride_type,
        };
        debug!(?draft, "Booking confirmed");
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(ride_type: RideType) -> DestinationChoice {
        DestinationChoice {
            destination: "Airport".to_string(),
            ride_type,
        }
    }

    #[test]
    fn test_fares_and_caps() {
        let fares = FareTable::default();
        assert_eq!(fares.fare(RideType::Shared), 30);
        assert_eq!(fares.fare(RideType::Personal), 100);
        assert_eq!(fares.capacity(RideType::Shared), 2);
        assert_eq!(fares.capacity(RideType::Personal), 4);
    }

    #[test]
    fn test_destination_messages() {
        let mut form = DestinationForm::new(3);
        form.choose_ride_type(RideType::Shared);

        let err = form.submit().unwrap_err();
        assert!(err.to_string().contains(MISSING_DESTINATION));
        assert_eq!(form.error(), Some(MISSING_DESTINATION));

        form.type_text("  ab ");
        assert_eq!(
            form.error(),
            Some("Destination must be at least 3 characters")
        );
        assert!(!form.can_continue());

        form.type_text("abc");
        assert!(form.error().is_none());
        assert!(form.can_continue());
    }

    #[test]
    fn test_no_message_before_first_submit() {
        let mut form = DestinationForm::new(3);
        form.type_text("a");
        assert!(form.error().is_none());
    }

    #[test]
    fn test_ride_type_required() {
        let mut form = DestinationForm::new(3);
        form.pick("Mall");
        assert!(!form.can_continue());
        assert!(form.submit().is_err());

        form.choose_ride_type(RideType::Personal);
        let choice = form.submit().unwrap();
        assert_eq!(choice.destination, "Mall");
        assert_eq!(choice.ride_type, RideType::Personal);
    }

    #[test]
    fn test_pick_and_type_clear_each_other() {
        let mut form = DestinationForm::new(3);
        form.type_text("Somewhere");
        form.pick("Hospital");
        assert_eq!(form.destination(), "Hospital");

        form.type_text("Lodhi Garden");
        assert_eq!(form.destination(), "Lodhi Garden");

        form.pick_on_map();
        assert_eq!(form.destination(), MAP_SELECTION);
    }

    #[test]
    fn test_passengers_bounded_shared() {
        let mut form = BookingForm::new(choice(RideType::Shared), FareTable::default());
        assert_eq!(form.passengers(), 1);
        form.decrement_passengers();
        assert_eq!(form.passengers(), 1);

        form.increment_passengers();
        form.increment_passengers();
        form.increment_passengers();
        assert_eq!(form.passengers(), 2);
    }

    #[test]
    fn test_passengers_bounded_personal() {
        let mut form = BookingForm::new(choice(RideType::Personal), FareTable::default());
        for _ in 0..10 {
            form.increment_passengers();
        }
        assert_eq!(form.passengers(), 4);
        form.decrement_passengers();
        assert_eq!(form.passengers(), 3);
    }

    #[test]
    fn test_pickup_pick_and_type() {
        let mut form = BookingForm::new(choice(RideType::Shared), FareTable::default());
        assert_eq!(form.pickup(), None);

        form.type_pickup("   ");
        assert_eq!(form.pickup(), None);

        form.pick_pickup("Work");
        assert_eq!(form.pickup(), Some("Work"));

        form.type_pickup("Gate 2");
        assert_eq!(form.pickup(), Some("Gate 2"));

        form.pick_pickup_on_map();
        assert_eq!(form.pickup(), Some(MAP_SELECTION));
    }

    #[test]
    fn test_confirm_carries_values() {
        let mut form = BookingForm::new(choice(RideType::Personal), FareTable::default());
        form.pick_pickup("Home");
        form.set_payment_method(PaymentMethod::Cash);
        form.increment_passengers();

        let draft = form.confirm();
        assert_eq!(
            draft,
            BookingDraft {
                destination: "Airport".to_string(),
                ride_type: RideType::Personal,
                pickup: Some("Home".to_string()),
                payment_method: PaymentMethod::Cash,
                passenger_count: 2,
                fare: 100,
            }
        );
    }

    #[test]
    fn test_default_payment_is_upi() {
        let form = BookingForm::new(choice(RideType::Shared), FareTable::default());
        assert_eq!(form.payment_method(), PaymentMethod::Upi);
        assert_eq!(form.fare(), 30);
    }
}
