use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::geo::{Coordinate, Route};

use super::error::TrackerError;
use super::session::create_session;
use super::tracker::Tracker;
use super::types::{TrackerStatus, TrackingSettings};

/// Known routes plus the trackers riders currently have open.
pub struct SessionRegistry {
    routes: BTreeMap<String, Route>,
    settings: TrackingSettings,
    trackers: HashMap<Uuid, Tracker>,
}

impl SessionRegistry {
    pub fn new(routes: BTreeMap<String, Route>, settings: TrackingSettings) -> Self {
        Self {
            routes,
            settings,
            trackers: HashMap::new(),
        }
    }

    pub fn routes(&self) -> &BTreeMap<String, Route> {
        &self.routes
    }

    pub fn route(&self, name: &str) -> Result<&Route, TrackerError> {
        self.routes
            .get(name)
            .ok_or_else(|| TrackerError::UnknownRoute(name.to_string()))
    }

    pub fn create(
        &mut self,
        route_name: &str,
        observer: Option<Coordinate>,
    ) -> Result<Uuid, TrackerError> {
        let waypoints = self.route(route_name)?.waypoints().to_vec();
        let session = create_session(waypoints, observer)?
            .with_average_speed(self.settings.average_speed_km_per_min)?;
        let tracker = Tracker::new(route_name, session, self.settings);
        let id = tracker.id();

        log::info!("Opened session {} on route {}", id, route_name);
        self.trackers.insert(id, tracker);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<&Tracker, TrackerError> {
        self.trackers
            .get(&id)
            .ok_or(TrackerError::SessionNotFound(id))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Result<&mut Tracker, TrackerError> {
        self.trackers
            .get_mut(&id)
            .ok_or(TrackerError::SessionNotFound(id))
    }

    /// Stops the session's worker and forgets it.
    pub async fn remove(&mut self, id: Uuid) -> Result<TrackerStatus, TrackerError> {
        let mut tracker = self
            .trackers
            .remove(&id)
            .ok_or(TrackerError::SessionNotFound(id))?;
        tracker.stop().await;
        log::info!("Closed session {}", id);
        Ok(tracker.status())
    }

    pub fn list(&self) -> Vec<TrackerStatus> {
        let mut statuses: Vec<_> = self.trackers.values().map(Tracker::status).collect();
        statuses.sort_by(|a, b| a.route.cmp(&b.route).then(a.id.cmp(&b.id)));
        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackingState;

    fn registry() -> SessionRegistry {
        let mut routes = BTreeMap::new();
        routes.insert(
            "dehradun-delhi".to_string(),
            Route::new(vec![
                Coordinate::new(30.3165, 78.0322),
                Coordinate::new(28.6139, 77.2090),
            ])
            .unwrap(),
        );
        SessionRegistry::new(routes, TrackingSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn create_and_remove_sessions() {
        let mut registry = registry();
        let id = registry.create("dehradun-delhi", None).unwrap();
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.get(id).unwrap().status().state, TrackingState::Idle);

        registry.get_mut(id).unwrap().start().unwrap();
        let closed = registry.remove(id).await.unwrap();
        assert_eq!(closed.id, id);
        assert!(registry.list().is_empty());
        assert!(matches!(
            registry.get(id),
            Err(TrackerError::SessionNotFound(_))
        ));
    }

    #[test]
    fn unknown_route_is_rejected() {
        let mut registry = registry();
        assert!(matches!(
            registry.create("nowhere", None),
            Err(TrackerError::UnknownRoute(name)) if name == "nowhere"
        ));
    }

    #[test]
    fn invalid_speed_fails_creation() {
        let mut routes = BTreeMap::new();
        routes.insert(
            "loop".to_string(),
            Route::new(vec![Coordinate::new(0.0, 0.0)]).unwrap(),
        );
        let settings = TrackingSettings {
            average_speed_km_per_min: 0.0,
            ..TrackingSettings::default()
        };
        let mut registry = SessionRegistry::new(routes, settings);
        assert!(matches!(
            registry.create("loop", None),
            Err(TrackerError::Geo(_))
        ));
    }

    #[test]
    fn list_is_sorted_by_route() {
        let mut registry = registry();
        let a = registry.create("dehradun-delhi", None).unwrap();
        let b = registry.create("dehradun-delhi", None).unwrap();
        let ids: Vec<_> = registry.list().into_iter().map(|s| s.id).collect();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
