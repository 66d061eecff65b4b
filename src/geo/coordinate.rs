use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::GeoError;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Builds a coordinate without range checks.
    ///
    /// Distance maths assumes `lat` in [-90, 90] and `lon` in [-180, 180];
    /// use [`Coordinate::checked`] for untrusted input.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn checked(lat: f64, lon: f64) -> Result<Self, GeoError> {
        Self::new(lat, lon).validate()
    }

    pub fn validate(self) -> Result<Self, GeoError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeoError::InvalidCoordinate(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(GeoError::InvalidCoordinate(format!(
                "longitude {} outside [-180, 180]",
                self.lon
            )));
        }
        Ok(self)
    }

    pub fn lat_rad(&self) -> f64 {
        self.lat.to_radians()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Parses `"lat, lon"`, the form used in config files and on the command line.
impl FromStr for Coordinate {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.split(',').map(|p| p.trim()).collect();
        if parts.len() != 2 {
            return Err(GeoError::InvalidCoordinate(format!(
                "expected \"lat, lon\", got {:?}",
                s
            )));
        }
        let lat = parts[0]
            .parse()
            .map_err(|_| GeoError::InvalidCoordinate(format!("bad latitude {:?}", parts[0])))?;
        let lon = parts[1]
            .parse()
            .map_err(|_| GeoError::InvalidCoordinate(format!("bad longitude {:?}", parts[1])))?;
        Self::checked(lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_pair() {
        let c: Coordinate = "30.3165, 78.0322".parse().unwrap();
        assert_eq!(c, Coordinate::new(30.3165, 78.0322));

        let tight: Coordinate = "-6.2088,106.8456".parse().unwrap();
        assert_eq!(tight, Coordinate::new(-6.2088, 106.8456));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            "30.3165".parse::<Coordinate>(),
            Err(GeoError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            "north, 78.0".parse::<Coordinate>(),
            Err(GeoError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            "1, 2, 3".parse::<Coordinate>(),
            Err(GeoError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn checked_enforces_ranges() {
        assert!(Coordinate::checked(90.0, 180.0).is_ok());
        assert!(Coordinate::checked(-90.0, -180.0).is_ok());
        assert!(Coordinate::checked(90.5, 0.0).is_err());
        assert!(Coordinate::checked(0.0, -180.1).is_err());
        assert!(Coordinate::checked(f64::NAN, 0.0).is_err());
    }
}
