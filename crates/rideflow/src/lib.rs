//! `rideflow` - Client core for a mock ride-hailing service
//!
//! This library holds the screen state and transitions of two clients, a
//! rider app and a driver app, together with the local persistence each
//! relies on. All remote behaviour (OTP delivery, driver matching, fares) is
//! mocked locally.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod platform;
pub mod rider;
pub mod schedule;
pub mod session;
pub mod storage;

pub use config::Config;
pub use driver::DriverApp;
pub use error::{Error, Result};
pub use logging::{init_logging, ClientKind};
pub use rider::RiderApp;
pub use session::{Session, UserProfile};
pub use storage::{KeyValueStore, MemoryStore, Storage, StorageStats};
