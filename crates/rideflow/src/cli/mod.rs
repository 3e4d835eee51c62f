//! Command-line interface for rideflow.
//!
//! This module provides the CLI structure for the `ridectl` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BookArgs, ConfigCommand, DriverCommand, DriverRegisterArgs, PaymentArg, RideCommand,
    RideResponse, RideTypeArg, RiderCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// ridectl - Drive the rideflow rider and driver clients from a terminal
///
/// Each invocation launches one client against its local store, performs
/// the requested screen actions, and exits. State carries over between
/// invocations the way it would across app restarts.
#[derive(Debug, Parser)]
#[command(name = "ridectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Use the driver client
    #[command(subcommand)]
    Driver(DriverCommand),

    /// Use the rider client
    #[command(subcommand)]
    Rider(RiderCommand),

    /// Show both clients' session and ride state
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "ridectl");
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_driver_login() {
        let args = ["ridectl", "driver", "login", "-m", "9876543210", "--code", "123456"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Driver(DriverCommand::Login { ref mobile, .. }) if mobile == "9876543210"
        ));
    }

    #[test]
    fn test_parse_driver_register() {
        let args = [
            "ridectl", "driver", "register", "-n", "Vikram", "--city", "Delhi", "-m",
            "9876543210", "--capacity", "4", "--code", "123456",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Driver(DriverCommand::Register(reg)) = cli.command else {
            panic!("expected driver register");
        };
        assert_eq!(reg.capacity, "4");
        assert_eq!(reg.vehicle_number, "");
    }

    #[test]
    fn test_parse_ride_arrive() {
        let args = ["ridectl", "driver", "ride", "arrive", "--otp", "1234"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Driver(DriverCommand::Ride(RideCommand::Arrive { .. }))
        ));
    }

    #[test]
    fn test_respond_requires_simulate() {
        let args = ["ridectl", "driver", "home", "--online", "--respond", "accept"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = [
            "ridectl",
            "driver",
            "home",
            "--online",
            "--simulate-ride",
            "--respond",
            "accept",
        ];
        assert!(Cli::try_parse_from(args).is_ok());
    }

    #[test]
    fn test_parse_rider_book() {
        let args = [
            "ridectl", "rider", "book", "-d", "Airport", "-r", "personal", "--passengers", "3",
            "--payment", "cash",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Rider(RiderCommand::Book(book)) = cli.command else {
            panic!("expected rider book");
        };
        assert_eq!(book.destination.as_deref(), Some("Airport"));
        assert_eq!(book.ride_type, RideTypeArg::Personal);
        assert_eq!(book.payment, PaymentArg::Cash);
        assert_eq!(book.passengers, 3);
        assert!(!book.no_track);
    }

    #[test]
    fn test_book_needs_some_destination() {
        let args = ["ridectl", "rider", "book", "-r", "shared"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["ridectl", "rider", "book", "-r", "shared", "--destination-on-map"];
        assert!(Cli::try_parse_from(args).is_ok());
    }

    #[test]
    fn test_dry_run_requires_call_driver() {
        let args = ["ridectl", "rider", "book", "-d", "Mall", "-r", "shared", "--dry-run"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["ridectl", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let args = ["ridectl", "status", "--json", "-vv"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));
    }
}
