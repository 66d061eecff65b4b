use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::geo::{Coordinate, DEFAULT_AVERAGE_SPEED_KM_PER_MIN};

use super::session::{TrackingSnapshot, TrackingState};
use super::telemetry::Telemetry;

pub const DEFAULT_ADVANCE_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Cadences and speed used by every tracker a registry creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSettings {
    pub advance_interval: Duration,
    pub telemetry_interval: Duration,
    pub average_speed_km_per_min: f64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            advance_interval: DEFAULT_ADVANCE_INTERVAL,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
            average_speed_km_per_min: DEFAULT_AVERAGE_SPEED_KM_PER_MIN,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TrackerStatus {
    pub id: Uuid,
    pub route: String,
    pub state: TrackingState,
    pub current_index: usize,
    pub waypoint_count: usize,
    pub observer: Option<Coordinate>,
    #[serde(flatten)]
    pub snapshot: TrackingSnapshot,
    pub telemetry: Telemetry,
    /// ETA from the live telemetry speed, slowed by traffic.
    pub live_eta_minutes: Option<f64>,
}
