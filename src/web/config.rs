use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use thiserror::Error;

use crate::geo::{validate_speed, Coordinate, GeoError, Route, DEFAULT_AVERAGE_SPEED_KM_PER_MIN};
use crate::tracker::{TrackingSettings, DEFAULT_ADVANCE_INTERVAL, DEFAULT_TELEMETRY_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("route {name}: {source}")]
    Route { name: String, source: GeoError },
    #[error("route {0} defined more than once")]
    DuplicateRoute(String),
    #[error("tracking: {0}")]
    Tracking(String),
}

/// Everything the tracker needs from a config, validated.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub settings: TrackingSettings,
    pub fallback_observer: Option<Coordinate>,
    pub routes: BTreeMap<String, Route>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(
        default = "default_advance_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub advance_interval: Duration,
    #[serde(
        default = "default_telemetry_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub telemetry_interval: Duration,
    #[serde(default = "default_average_speed")]
    pub average_speed_km_per_min: f64,
    #[serde(default = "default_fallback_observer")]
    pub fallback_observer: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            advance_interval: default_advance_interval(),
            telemetry_interval: default_telemetry_interval(),
            average_speed_km_per_min: default_average_speed(),
            fallback_observer: default_fallback_observer(),
        }
    }
}

fn default_advance_interval() -> Duration {
    DEFAULT_ADVANCE_INTERVAL
}

fn default_telemetry_interval() -> Duration {
    DEFAULT_TELEMETRY_INTERVAL
}

fn default_average_speed() -> f64 {
    DEFAULT_AVERAGE_SPEED_KM_PER_MIN
}

fn default_fallback_observer() -> Option<String> {
    Some("28.6139, 77.2090".to_string())
}

impl TrackingConfig {
    pub fn settings(&self) -> Result<TrackingSettings, ConfigError> {
        if self.advance_interval.is_zero() || self.telemetry_interval.is_zero() {
            return Err(ConfigError::Tracking("intervals must be non-zero".into()));
        }
        let speed = validate_speed(self.average_speed_km_per_min)
            .map_err(|e| ConfigError::Tracking(e.to_string()))?;

        Ok(TrackingSettings {
            advance_interval: self.advance_interval,
            telemetry_interval: self.telemetry_interval,
            average_speed_km_per_min: speed,
        })
    }

    pub fn fallback_observer(&self) -> Result<Option<Coordinate>, ConfigError> {
        self.fallback_observer
            .as_deref()
            .map(str::parse::<Coordinate>)
            .transpose()
            .map_err(|e: GeoError| ConfigError::Tracking(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    /// Waypoints as `"lat, lon"` strings, first stop first.
    pub waypoints: Vec<String>,
}

impl RouteConfig {
    pub fn to_route(&self) -> Result<Route, ConfigError> {
        let route_err = |source| ConfigError::Route {
            name: self.name.clone(),
            source,
        };
        let waypoints = self
            .waypoints
            .iter()
            .map(|w| w.parse::<Coordinate>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(route_err)?;
        Route::new(waypoints).map_err(route_err)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Open, close and re-aim a rider's tracking session.
    Track,
    /// Start, stop, reset and step the simulated bus.
    Operate,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }

    pub fn routes(&self) -> Result<BTreeMap<String, Route>, ConfigError> {
        let mut routes = BTreeMap::new();
        for route in &self.routes {
            if routes.insert(route.name.clone(), route.to_route()?).is_some() {
                return Err(ConfigError::DuplicateRoute(route.name.clone()));
            }
        }
        Ok(routes)
    }

    pub fn resolve(&self) -> Result<Resolved, ConfigError> {
        Ok(Resolved {
            settings: self.tracking.settings()?,
            fallback_observer: self.tracking.fallback_observer()?,
            routes: self.routes()?,
        })
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
web:
  bind: 127.0.0.1:9090
tracking:
  advance_interval: 2s
  telemetry_interval: 500ms
  average_speed_km_per_min: 0.5
routes:
  - name: dehradun-delhi
    waypoints:
      - "30.3165, 78.0322"
      - "29.8661, 77.8945"
      - "28.6139, 77.2090"
api_keys:
  - key: rider-key
    name: rider
    permissions: [track]
"#;

    #[test]
    fn parses_full_config() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.web.bind, "127.0.0.1:9090");

        let settings = config.tracking.settings().unwrap();
        assert_eq!(settings.advance_interval, Duration::from_secs(2));
        assert_eq!(settings.telemetry_interval, Duration::from_millis(500));
        assert_eq!(settings.average_speed_km_per_min, 0.5);

        let routes = config.routes().unwrap();
        assert_eq!(routes["dehradun-delhi"].len(), 3);

        let key = config.find_api_key("rider-key").unwrap();
        assert!(key.permissions.contains(&Permission::Track));
        assert!(!key.permissions.contains(&Permission::Operate));
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = Config::from_yaml("routes: []").unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.tracking.settings().unwrap(), TrackingSettings::default());
        assert_eq!(
            config.tracking.fallback_observer().unwrap(),
            Some(Coordinate::new(28.6139, 77.2090))
        );
    }

    #[test]
    fn empty_route_is_a_config_error() {
        let config = Config::from_yaml("routes:\n  - name: ghost\n    waypoints: []\n").unwrap();
        assert!(matches!(
            config.routes(),
            Err(ConfigError::Route { name, source: GeoError::EmptyRoute }) if name == "ghost"
        ));
    }

    #[test]
    fn bad_waypoint_is_a_config_error() {
        let yaml = "routes:\n  - name: r\n    waypoints: [\"95.0, 10.0\"]\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.routes(),
            Err(ConfigError::Route {
                source: GeoError::InvalidCoordinate(_),
                ..
            })
        ));
    }

    #[test]
    fn duplicate_route_names_are_rejected() {
        let yaml = "routes:\n  - name: r\n    waypoints: [\"1, 1\"]\n  - name: r\n    waypoints: [\"2, 2\"]\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(config.routes(), Err(ConfigError::DuplicateRoute(_))));
    }

    #[test]
    fn zero_speed_and_interval_are_rejected() {
        let yaml = "tracking:\n  average_speed_km_per_min: 0\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.tracking.settings().is_err());

        let yaml = "tracking:\n  advance_interval: 0s\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.tracking.settings().is_err());
    }

    #[test]
    fn unparsable_interval_fails_to_load() {
        assert!(Config::from_yaml("tracking:\n  advance_interval: soon\n").is_err());
    }
}
