mod geo;
mod location;
mod tracker;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;

use crate::geo::{distance_km, eta_minutes, round_eta, Coordinate};
use crate::location::{locate_observer, FixedLocation};
use crate::tracker::{SessionRegistry, Tracker, TrackerStatus, TrackingState};
use crate::web::config::Resolved;
use crate::web::Config;

#[derive(Parser)]
#[command(name = "bus-o-mat")]
#[command(about = "Live bus tracking: distance, ETA and route simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tracking API
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Validate a config file
    Validate {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Drive a simulated bus along a configured route until it arrives
    Simulate {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
        #[arg(short, long)]
        route: String,
        /// Rider position as "lat, lon"
        #[arg(short, long)]
        observer: Option<Coordinate>,
    },
    /// Great-circle distance and ETA between two "lat, lon" points
    Distance {
        #[arg(allow_hyphen_values = true)]
        from: Coordinate,
        #[arg(allow_hyphen_values = true)]
        to: Coordinate,
        /// Average speed in km per minute
        #[arg(short, long, default_value_t = geo::DEFAULT_AVERAGE_SPEED_KM_PER_MIN)]
        speed: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Validate { config } => validate(&config),
        Commands::Simulate {
            config,
            route,
            observer,
        } => simulate(&config, &route, observer).await,
        Commands::Distance { from, to, speed } => distance(from, to, speed),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            None
        }
    }
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    match config.resolve() {
        Ok(Resolved {
            settings,
            fallback_observer,
            routes,
        }) => {
            println!(
                "Config is valid: advance every {:?}, telemetry every {:?}, {} km/min",
                settings.advance_interval,
                settings.telemetry_interval,
                settings.average_speed_km_per_min
            );
            if let Some(fallback) = fallback_observer {
                println!("  fallback observer: {}", fallback);
            }
            for (name, route) in &routes {
                println!(
                    "  {}: {} waypoints, {:.1} km",
                    name,
                    route.len(),
                    route.length_km()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn simulate(path: &str, route_name: &str, observer: Option<Coordinate>) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let Resolved {
        settings,
        fallback_observer,
        routes,
    } = match config.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let observer = locate_observer(&FixedLocation::new(observer), fallback_observer).await;
    let mut registry = SessionRegistry::new(routes, settings);
    let id = match registry.create(route_name, observer) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Cannot open session: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracker = match registry.get_mut(id) {
        Ok(tracker) => tracker,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = tracker.start() {
        eprintln!("Cannot start tracker: {}", e);
        return ExitCode::FAILURE;
    }

    follow(tracker, settings.advance_interval).await;
    println!("Route {} complete", route_name);
    ExitCode::SUCCESS
}

/// One log line describing where the bus is.
fn describe(status: &TrackerStatus) -> String {
    let eta = status
        .snapshot
        .eta_minutes
        .map(|m| format!("{} min", round_eta(m)))
        .unwrap_or_else(|| "-- min".to_string());
    let distance = status
        .snapshot
        .distance_km
        .map(|d| format!("{:.1} km", d))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "[{}/{}] bus at {} | {:.0}% | {} away | ETA {} | {} km/h, {} traffic",
        status.current_index,
        status.waypoint_count.saturating_sub(1),
        status.snapshot.position,
        status.snapshot.progress_percent,
        distance,
        eta,
        status.telemetry.speed_kmh,
        status.telemetry.traffic
    )
}

/// Logs the tracker every `every` until it stops running, then stops it.
async fn follow(tracker: &mut Tracker, every: Duration) -> TrackerStatus {
    loop {
        let status = tracker.status();
        log::info!("{}", describe(&status));
        if status.state != TrackingState::Running {
            break;
        }
        tokio::time::sleep(every).await;
    }
    tracker.stop().await;
    tracker.status()
}

fn distance(from: Coordinate, to: Coordinate, speed: f64) -> ExitCode {
    let d = distance_km(from, to);
    match eta_minutes(d, speed) {
        Ok(eta) => {
            println!("{:.2} km, ETA {} min at {} km/min", d, round_eta(eta), speed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
