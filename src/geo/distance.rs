use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::coordinate::Coordinate;
use super::error::GeoError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Speed divisor the rider view uses to turn kilometres into minutes.
pub const DEFAULT_AVERAGE_SPEED_KM_PER_MIN: f64 = 0.7;

/// Great-circle distance between `a` and `b` in kilometres (haversine).
///
/// Both points must lie within the valid latitude/longitude ranges; this is
/// not checked here and out-of-range input yields a meaningless distance.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat_rad().cos() * b.lat_rad().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn validate_speed(speed: f64) -> Result<f64, GeoError> {
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(GeoError::InvalidSpeed(speed))
    }
}

/// Travel time for `distance_km` at `average_speed`.
///
/// The result is in minutes when the speed is given in km per minute.
pub fn eta_minutes(distance_km: f64, average_speed: f64) -> Result<f64, GeoError> {
    let speed = validate_speed(average_speed)?;
    Ok(distance_km / speed)
}

/// Whole minutes shown to riders.
pub fn round_eta(minutes: f64) -> i64 {
    minutes.round() as i64
}

/// Road conditions that slow the live ETA.
///
/// Simulated telemetry only reaches `Light` and `Moderate`; `Heavy` and
/// `Jam` come from external traffic input.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrafficCondition {
    #[default]
    Light,
    Moderate,
    Heavy,
    Jam,
}

impl TrafficCondition {
    /// Classifies traffic from the bus's current speed.
    pub fn from_speed_kmh(speed_kmh: f64) -> Self {
        if speed_kmh < 10.0 {
            TrafficCondition::Heavy
        } else if speed_kmh < 20.0 {
            TrafficCondition::Moderate
        } else {
            TrafficCondition::Light
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            TrafficCondition::Light => 1.0,
            TrafficCondition::Moderate => 1.3,
            TrafficCondition::Heavy => 1.8,
            TrafficCondition::Jam => 2.5,
        }
    }
}

/// Minutes to cover `distance_km` at `speed_kmh`, slowed down by `traffic`.
pub fn eta_with_traffic(
    distance_km: f64,
    speed_kmh: f64,
    traffic: TrafficCondition,
) -> Result<f64, GeoError> {
    let speed = validate_speed(speed_kmh)?;
    Ok(distance_km / speed * 60.0 * traffic.multiplier())
}
