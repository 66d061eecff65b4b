use serde::Serialize;
use strum_macros::Display;

use crate::geo::{
    distance_km, eta_minutes, validate_speed, Coordinate, GeoError, Route,
    DEFAULT_AVERAGE_SPEED_KM_PER_MIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrackingState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Values derived from the current waypoint and observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Readings {
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<f64>,
    pub progress_percent: f64,
}

/// What a rider's map needs to draw the bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TrackingSnapshot {
    pub position: Coordinate,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<f64>,
    pub progress_percent: f64,
}

/// Simulated bus moving along a [`Route`], one waypoint per `advance`.
///
/// The session holds no timer; whoever owns it decides when to call
/// [`TrackingSession::advance`].
#[derive(Debug, Clone)]
pub struct TrackingSession {
    route: Route,
    current_index: usize,
    running: bool,
    observer: Option<Coordinate>,
    average_speed_km_per_min: f64,
    last_computed: Readings,
}

/// Builds an idle session from raw waypoints.
pub fn create_session(
    waypoints: Vec<Coordinate>,
    observer: Option<Coordinate>,
) -> Result<TrackingSession, GeoError> {
    Ok(TrackingSession::new(Route::new(waypoints)?, observer))
}

impl TrackingSession {
    pub fn new(route: Route, observer: Option<Coordinate>) -> Self {
        let mut session = Self {
            route,
            current_index: 0,
            running: false,
            observer,
            average_speed_km_per_min: DEFAULT_AVERAGE_SPEED_KM_PER_MIN,
            last_computed: Readings {
                distance_km: None,
                eta_minutes: None,
                progress_percent: 0.0,
            },
        };
        session.recompute();
        session
    }

    pub fn with_average_speed(mut self, km_per_min: f64) -> Result<Self, GeoError> {
        self.average_speed_km_per_min = validate_speed(km_per_min)?;
        self.recompute();
        Ok(self)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn observer(&self) -> Option<Coordinate> {
        self.observer
    }

    pub fn readings(&self) -> Readings {
        self.last_computed
    }

    pub fn position(&self) -> Coordinate {
        self.route.waypoints()[self.current_index]
    }

    pub fn is_at_end(&self) -> bool {
        self.current_index == self.route.last_index()
    }

    pub fn state(&self) -> TrackingState {
        if self.running {
            TrackingState::Running
        } else if self.is_at_end() {
            TrackingState::Completed
        } else if self.current_index == 0 {
            TrackingState::Idle
        } else {
            TrackingState::Paused
        }
    }

    /// Begins movement unless the bus already sits on the final waypoint.
    pub fn start(&mut self) {
        if !self.is_at_end() {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.running = false;
        self.recompute();
    }

    /// Moves one waypoint forward. Returns whether the index changed.
    ///
    /// Landing on the last waypoint clears `running`.
    pub fn advance(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.is_at_end() {
            self.running = false;
            return false;
        }

        self.current_index += 1;
        if self.is_at_end() {
            self.running = false;
        }
        self.recompute();
        true
    }

    pub fn set_observer(&mut self, observer: Option<Coordinate>) {
        self.observer = observer;
        self.recompute();
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            position: self.position(),
            distance_km: self.last_computed.distance_km,
            eta_minutes: self.last_computed.eta_minutes,
            progress_percent: self.last_computed.progress_percent,
        }
    }

    fn recompute(&mut self) {
        let distance = self
            .observer
            .map(|observer| distance_km(observer, self.position()));
        let eta = distance.and_then(|d| eta_minutes(d, self.average_speed_km_per_min).ok());

        self.last_computed = Readings {
            distance_km: distance,
            eta_minutes: eta,
            progress_percent: self.progress_percent(),
        };
    }

    fn progress_percent(&self) -> f64 {
        let last = self.route.last_index();
        if last == 0 {
            100.0
        } else {
            self.current_index as f64 / last as f64 * 100.0
        }
    }
}
