//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::rider::{PaymentMethod, RideType};

/// Driver client commands.
#[derive(Debug, Subcommand)]
pub enum DriverCommand {
    /// Sign in as an existing driver
    Login {
        /// Mobile number (10 digits)
        #[arg(short, long)]
        mobile: String,

        /// Code received by SMS
        #[arg(long)]
        code: String,
    },

    /// Register as a new driver
    Register(DriverRegisterArgs),

    /// Show the home screen, optionally going online and taking a ride
    Home {
        /// Go online before showing the screen
        #[arg(long)]
        online: bool,

        /// Simulate an incoming ride request (requires --online)
        #[arg(long)]
        simulate_ride: bool,

        /// What to do with the incoming request
        #[arg(long, value_enum, requires = "simulate_ride")]
        respond: Option<RideResponse>,
    },

    /// Work with the active ride
    #[command(subcommand)]
    Ride(RideCommand),

    /// Sign out
    Logout,
}

/// Driver registration arguments.
#[derive(Debug, Args)]
pub struct DriverRegisterArgs {
    /// Full name
    #[arg(short, long)]
    pub name: String,

    /// City of operation
    #[arg(long)]
    pub city: String,

    /// Mobile number (10 digits)
    #[arg(short, long)]
    pub mobile: String,

    /// Seats offered
    #[arg(long)]
    pub capacity: String,

    /// Registration plate
    #[arg(long, default_value = "")]
    pub vehicle_number: String,

    /// Code received by SMS
    #[arg(long)]
    pub code: String,
}

/// Response to an incoming ride request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RideResponse {
    /// Take the ride
    Accept,
    /// Pass on the ride
    Reject,
}

/// Active-ride commands.
#[derive(Debug, Subcommand)]
pub enum RideCommand {
    /// Show the ride card
    Show,

    /// Confirm arrival at pickup with the passenger's OTP
    Arrive {
        /// Code the passenger reads out
        #[arg(long)]
        otp: String,
    },

    /// End the trip
    End {
        /// Confirm without showing the summary first
        #[arg(short, long)]
        yes: bool,
    },
}

/// Rider client commands.
#[derive(Debug, Subcommand)]
pub enum RiderCommand {
    /// Create a rider account
    Signup {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Mobile number (10 digits, without country code)
        #[arg(short, long)]
        mobile: String,

        /// Code received by SMS
        #[arg(long)]
        code: String,

        /// Home area
        #[arg(short, long)]
        area: String,
    },

    /// Book a ride and follow it to completion
    Book(BookArgs),

    /// Sign out
    Logout,
}

/// Booking arguments.
#[derive(Debug, Args)]
pub struct BookArgs {
    /// Where to; pass a popular destination or any address
    #[arg(short, long, required_unless_present = "destination_on_map")]
    pub destination: Option<String>,

    /// Choose the destination on the map instead
    #[arg(long, conflicts_with = "destination")]
    pub destination_on_map: bool,

    /// Shared or personal ride
    #[arg(short, long, value_enum)]
    pub ride_type: RideTypeArg,

    /// Pickup point
    #[arg(short, long)]
    pub pickup: Option<String>,

    /// Choose the pickup on the map instead
    #[arg(long, conflicts_with = "pickup")]
    pub pickup_on_map: bool,

    /// How to pay
    #[arg(long, value_enum, default_value = "upi")]
    pub payment: PaymentArg,

    /// Number of passengers
    #[arg(long, default_value = "1")]
    pub passengers: u8,

    /// Stop after booking instead of following the ride
    #[arg(long)]
    pub no_track: bool,

    /// Call the driver once assigned
    #[arg(long)]
    pub call_driver: bool,

    /// Log the call instead of dialing
    #[arg(long, requires = "call_driver")]
    pub dry_run: bool,
}

/// Ride type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RideTypeArg {
    /// Shared seats
    Shared,
    /// Whole cab
    Personal,
}

impl From<RideTypeArg> for RideType {
    fn from(arg: RideTypeArg) -> Self {
        match arg {
            RideTypeArg::Shared => Self::Shared,
            RideTypeArg::Personal => Self::Personal,
        }
    }
}

/// Payment method argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PaymentArg {
    /// UPI transfer
    #[default]
    Upi,
    /// Cash
    Cash,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Upi => Self::Upi,
            PaymentArg::Cash => Self::Cash,
        }
    }
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_type_arg_conversion() {
        assert_eq!(RideType::from(RideTypeArg::Shared), RideType::Shared);
        assert_eq!(RideType::from(RideTypeArg::Personal), RideType::Personal);
    }

    #[test]
    fn test_payment_arg_conversion() {
        assert_eq!(PaymentMethod::from(PaymentArg::default()), PaymentMethod::Upi);
        assert_eq!(PaymentMethod::from(PaymentArg::Cash), PaymentMethod::Cash);
    }

    #[test]
    fn test_ride_command_debug() {
        let cmd = RideCommand::Arrive {
            otp: "1234".to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Arrive"));
        assert!(debug_str.contains("1234"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
