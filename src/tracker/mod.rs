mod error;
mod registry;
mod session;
mod telemetry;
mod tracker;
mod types;

pub use error::TrackerError;
pub use registry::SessionRegistry;
pub use session::{TrackingSnapshot, TrackingState};
pub use telemetry::Telemetry;
pub use tracker::Tracker;
pub use types::{
    TrackerStatus, TrackingSettings, DEFAULT_ADVANCE_INTERVAL, DEFAULT_TELEMETRY_INTERVAL,
};
