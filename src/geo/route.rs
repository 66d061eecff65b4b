use serde::Serialize;

use super::coordinate::Coordinate;
use super::distance::distance_km;
use super::error::GeoError;

/// Ordered, non-empty list of waypoints a bus moves through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    waypoints: Vec<Coordinate>,
}

impl Route {
    pub fn new(waypoints: Vec<Coordinate>) -> Result<Self, GeoError> {
        if waypoints.is_empty() {
            return Err(GeoError::EmptyRoute);
        }
        Ok(Self { waypoints })
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    /// Sum of the great-circle legs between consecutive waypoints.
    pub fn length_km(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|leg| distance_km(leg[0], leg[1]))
            .sum()
    }

    /// Index of the waypoint closest to `at` and its distance in km.
    /// Ties go to the earlier waypoint.
    pub fn nearest_waypoint(&self, at: Coordinate) -> (usize, f64) {
        let mut best = (0, distance_km(at, self.waypoints[0]));
        for (i, wp) in self.waypoints.iter().enumerate().skip(1) {
            let d = distance_km(at, *wp);
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }
}
