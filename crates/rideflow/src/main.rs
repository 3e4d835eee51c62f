//! `ridectl` - CLI for rideflow
//!
//! This binary drives the rider and driver clients against their local
//! stores, one screen action per invocation.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::Instrument;

use rideflow::cli::{
    BookArgs, Cli, Command, ConfigCommand, DriverCommand, DriverRegisterArgs, RideCommand,
    RideResponse, RiderCommand,
};
use rideflow::driver::ride::TRIP_SUMMARY;
use rideflow::driver::{RideFlow, RideStage, StageRecord, Surface};
use rideflow::logging::client_span;
use rideflow::platform::{self, Dialer, DryRunDialer, SystemDialer};
use rideflow::rider::{RideStatus, TrackingScreen};
use rideflow::storage::{keys, read_json};
use rideflow::{init_logging, ClientKind, Config, DriverApp, KeyValueStore, RiderApp, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());
    platform::init()?;

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Driver(cmd) => {
            handle_driver(&config, cmd)
                .instrument(client_span(ClientKind::Driver))
                .await
        }
        Command::Rider(cmd) => {
            handle_rider(&config, cmd)
                .instrument(client_span(ClientKind::Rider))
                .await
        }
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_storage(config: &Config, client: ClientKind) -> anyhow::Result<Arc<Storage>> {
    let path = config.database_path(client);
    let storage = Storage::open(&path)
        .with_context(|| format!("opening {client} store at {}", path.display()))?;
    Ok(Arc::new(storage))
}

fn open_store(config: &Config, client: ClientKind) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = open_storage(config, client)?;
    Ok(store)
}

// === Driver ===

async fn handle_driver(config: &Config, cmd: DriverCommand) -> anyhow::Result<()> {
    let store = open_store(config, ClientKind::Driver)?;
    let mut app = DriverApp::launch(config, store).await?;
    if let Some(alert) = app.take_alert() {
        eprintln!("{alert}");
    }

    match cmd {
        DriverCommand::Login { mobile, code } => {
            let mut form = app.sign_in_form();
            form.set_mobile(&mobile);
            form.send_code()?;
            form.set_code(&code);
            sign_in_driver(&mut app, &mut form).await
        }
        DriverCommand::Register(args) => register_driver(&mut app, &args).await,
        DriverCommand::Home {
            online,
            simulate_ride,
            respond,
        } => driver_home(&mut app, online, simulate_ride, respond).await,
        DriverCommand::Ride(ride_cmd) => driver_ride(&mut app, ride_cmd).await,
        DriverCommand::Logout => {
            app.logout().await?;
            println!("Signed out.");
            Ok(())
        }
    }
}

async fn sign_in_driver(
    app: &mut DriverApp,
    form: &mut rideflow::auth::DriverSignIn,
) -> anyhow::Result<()> {
    let result = app.complete_sign_in(form).await;
    if let Some(alert) = app.take_alert() {
        eprintln!("{alert}");
    }
    result?;
    println!("{}", app.greeting());
    Ok(())
}

async fn register_driver(app: &mut DriverApp, args: &DriverRegisterArgs) -> anyhow::Result<()> {
    let mut form = app.sign_in_form();
    form.set_mode(rideflow::auth::AuthMode::Register);
    form.set_full_name(&args.name);
    form.set_city(&args.city);
    form.set_mobile(&args.mobile);
    form.set_vehicle_capacity(&args.capacity);
    form.set_vehicle_number(&args.vehicle_number);
    form.send_code()?;
    form.set_code(&args.code);
    sign_in_driver(app, &mut form).await
}

async fn driver_home(
    app: &mut DriverApp,
    online: bool,
    simulate_ride: bool,
    respond: Option<RideResponse>,
) -> anyhow::Result<()> {
    let greeting = app.greeting();
    let home = app.home()?;
    home.set_online(online);

    let stats = home.stats();
    println!("{greeting}");
    println!("{}", home.status_label());
    if let Some(hint) = home.hint() {
        println!("  {hint}");
    }
    println!();
    println!("Today:      ₹{} over {} trips", stats.today_earnings, stats.trips_today);
    println!("Rating:     {:.1}", stats.rating);
    println!("This week:  ₹{}", stats.week_earnings);

    if !simulate_ride {
        return Ok(());
    }

    let request = home.simulate_incoming()?.clone();
    println!();
    println!("Incoming ride");
    println!("  Pickup:   {}", request.pickup);
    println!("  Drop:     {}", request.drop);
    println!("  Distance: {:.1} km", request.distance_km);
    println!("  Fare:     ₹{}", request.fare);

    match respond {
        Some(RideResponse::Accept) => {
            let ride = app.accept_ride().await?;
            println!();
            print_ride(ride);
        }
        Some(RideResponse::Reject) => {
            app.home()?.reject();
            println!("Ride rejected.");
        }
        None => {}
    }
    Ok(())
}

fn print_ride(ride: &RideFlow) {
    let details = ride.details();
    let stage = ride.stage();
    println!("{}", stage.title());
    println!("  Pickup: {}", details.pickup);
    println!("  Drop:   {}", details.drop);
    println!("  Fare:   ₹{}", details.estimated_fare);
    if let Some(label) = stage.action_label() {
        println!("  [{label}]");
    }
}

async fn driver_ride(app: &mut DriverApp, cmd: RideCommand) -> anyhow::Result<()> {
    let ride = app.open_ride().await?;

    match cmd {
        RideCommand::Show => print_ride(ride),
        RideCommand::Arrive { otp } => {
            if ride.stage() != RideStage::Pickup {
                bail!("passenger is already onboard");
            }
            ride.primary_action()?;
            ride.type_otp(&otp);
            ride.submit_otp().await?;
            println!("OTP verified. {}", ride.stage().title());
        }
        RideCommand::End { yes } => {
            if ride.primary_action()? != Surface::TripSummary {
                ride.cancel_otp();
                bail!("verify the passenger's OTP before ending the trip");
            }
            let summary = TRIP_SUMMARY;
            println!("Trip summary");
            println!("  Distance: {:.1} km", summary.distance_km);
            println!("  Duration: {} min", summary.duration_min);
            println!("  Earnings: ₹{}", summary.earnings);
            if !yes {
                println!("Re-run with --yes to end the trip.");
                return Ok(());
            }
            app.end_trip().await?;
            println!("Trip completed.");
        }
    }
    Ok(())
}

// === Rider ===

async fn handle_rider(config: &Config, cmd: RiderCommand) -> anyhow::Result<()> {
    let store = open_store(config, ClientKind::Rider)?;
    let mut app = RiderApp::launch(config, store).await?;
    if let Some(alert) = app.take_alert() {
        eprintln!("{alert}");
    }

    match cmd {
        RiderCommand::Signup {
            name,
            mobile,
            code,
            area,
        } => {
            let mut form = app.sign_up_form();
            form.set_full_name(&name);
            form.set_mobile(&mobile);
            form.send_code()?;
            form.set_code(&code);
            form.verify()?;
            form.select_area(&area)?;

            let result = app.complete_sign_up(&form).await;
            if let Some(alert) = app.take_alert() {
                eprintln!("{alert}");
            }
            result?;
            println!("Welcome, {}!", name.trim());
            Ok(())
        }
        RiderCommand::Book(args) => book_ride(&mut app, &args).await,
        RiderCommand::Logout => {
            app.logout().await?;
            println!("Signed out.");
            Ok(())
        }
    }
}

async fn book_ride(app: &mut RiderApp, args: &BookArgs) -> anyhow::Result<()> {
    let mut picker = app.destination_form()?;
    match &args.destination {
        Some(destination) => picker.type_text(destination),
        None => picker.pick_on_map(),
    }
    picker.choose_ride_type(args.ride_type.into());
    let mut booking = app.start_booking(&mut picker)?;

    if let Some(pickup) = &args.pickup {
        booking.type_pickup(pickup);
    } else if args.pickup_on_map {
        booking.pick_pickup_on_map();
    }
    booking.set_payment_method(args.payment.into());
    for _ in 1..args.passengers {
        booking.increment_passengers();
    }
    if booking.passengers() != args.passengers {
        let cap = booking.max_passengers();
        let ride_type = booking.ride_type();
        app.back_home(booking);
        bail!(
            "a {ride_type} ride takes between 1 and {cap} passengers, not {}",
            args.passengers
        );
    }

    let mut screen = app.confirm_booking(booking);
    let draft = screen.draft();
    println!("Booked: {} ride to {}", draft.ride_type, draft.destination);
    if let Some(pickup) = &draft.pickup {
        println!("  Pickup:     {pickup}");
    }
    println!("  Passengers: {}", draft.passenger_count);
    println!("  Fare:       ₹{} ({})", draft.fare, draft.payment_method);

    if args.no_track {
        app.finish_tracking(screen);
        return Ok(());
    }

    let dialer: Box<dyn Dialer> = if args.dry_run {
        Box::new(DryRunDialer::new())
    } else {
        Box::new(SystemDialer)
    };
    tokio::select! {
        result = follow_ride(&mut screen, args.call_driver, dialer.as_ref()) => result?,
        _ = tokio::signal::ctrl_c() => println!("\nStopped tracking."),
    }
    app.finish_tracking(screen);
    Ok(())
}

async fn follow_ride(
    screen: &mut TrackingScreen,
    call_driver: bool,
    dialer: &dyn Dialer,
) -> anyhow::Result<()> {
    println!("{}", screen.status());
    loop {
        let status = screen.next_status().await?;
        println!("{status}");

        if status == RideStatus::DriverAssigned {
            if let Some(driver) = screen.driver() {
                println!(
                    "  {} ({:.1}★), {} {} {}, {} min away",
                    driver.name,
                    driver.rating,
                    driver.vehicle_color,
                    driver.vehicle_model,
                    driver.vehicle_number,
                    driver.eta_min
                );
            }
            if call_driver {
                screen.call_driver(dialer)?;
            }
        }
        if status == RideStatus::Completed {
            return Ok(());
        }
    }
}

// === Status / Config ===

async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let driver_storage = open_storage(config, ClientKind::Driver)?;
    let rider_storage = open_storage(config, ClientKind::Rider)?;
    let driver_stats = driver_storage.stats()?;
    let rider_stats = rider_storage.stats()?;

    let driver_store: Arc<dyn KeyValueStore> = driver_storage.clone();
    let driver = DriverApp::launch(config, Arc::clone(&driver_store)).await?;
    let rider = RiderApp::launch(config, rider_storage.clone()).await?;
    let ride: Option<StageRecord> = read_json(driver_store.as_ref(), keys::ACTIVE_RIDE)
        .await
        .unwrap_or_default();

    let name_of = |session: &rideflow::Session| {
        session
            .profile()
            .map(|p| p.full_name.clone())
            .unwrap_or_default()
    };

    if json {
        let status = serde_json::json!({
            "platform": platform::name(),
            "driver": {
                "signed_in": driver.session().is_logged_in(),
                "name": name_of(driver.session()),
                "active_ride": ride.map(|r| r.stage.as_str()),
                "database_path": driver_storage.path(),
                "keys": driver_storage.keys()?,
                "db_size_bytes": driver_stats.db_size_bytes,
            },
            "rider": {
                "signed_in": rider.session().is_logged_in(),
                "name": name_of(rider.session()),
                "database_path": rider_storage.path(),
                "keys": rider_storage.keys()?,
                "db_size_bytes": rider_stats.db_size_bytes,
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("ridectl status");
        println!("--------------");
        println!("Platform:      {}", platform::name());
        println!();
        println!("[Driver]");
        println!("  Signed in:   {}", driver.session().is_logged_in());
        println!("  Name:        {}", name_of(driver.session()));
        println!(
            "  Active ride: {}",
            ride.map_or("none", |r| r.stage.as_str())
        );
        println!("  Database:    {}", driver_storage.path().display());
        println!("  Items:       {}", driver_stats.item_count);
        println!();
        println!("[Rider]");
        println!("  Signed in:   {}", rider.session().is_logged_in());
        println!("  Name:        {}", name_of(rider.session()));
        println!("  Database:    {}", rider_storage.path().display());
        println!("  Items:       {}", rider_stats.item_count);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data dir:           {}", config.data_dir().display());
                println!("  Rider store:        {}", config.storage.rider_file);
                println!("  Driver store:       {}", config.storage.driver_file);
                println!();
                println!("[Auth]");
                println!("  Mobile digits:      {}", config.auth.mobile_length);
                println!("  Code digits:        {}", config.auth.code_length);
                println!("  Country code:       {}", config.auth.country_code);
                println!(
                    "  Fixed code:         {}",
                    if config.auth.fixed_code.is_some() { "set" } else { "none" }
                );
                println!();
                println!("[Driver]");
                println!("  Ride OTP digits:    {}", config.ride_otp_length());
                println!();
                println!("[Rider]");
                println!(
                    "  Shared:             ₹{} (up to {})",
                    config.rider.shared_fare, config.rider.shared_capacity
                );
                println!(
                    "  Personal:           ₹{} (up to {})",
                    config.rider.personal_fare, config.rider.personal_capacity
                );
                println!();
                println!("[Tracking]");
                let labels = ["Driver found", "Driver arrived", "Trip started", "Trip completed"];
                for (label, delay) in labels.iter().zip(config.tracking.delays()) {
                    println!("  {:<19} {} ms", format!("{label}:"), delay.as_millis());
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
