use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("average speed must be positive, got {0}")]
    InvalidSpeed(f64),
    #[error("route has no waypoints")]
    EmptyRoute,
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
}
