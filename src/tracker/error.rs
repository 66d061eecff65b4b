use thiserror::Error;
use uuid::Uuid;

use crate::geo::GeoError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker already running")]
    AlreadyRunning,
    #[error("tracking session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("unknown route: {0}")]
    UnknownRoute(String),
    #[error("geo error: {0}")]
    Geo(#[from] GeoError),
}
