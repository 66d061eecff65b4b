use std::future::Future;

use crate::geo::Coordinate;

/// Source of the rider's own position (device GPS, a browser fix, ...).
pub trait LocationProvider {
    fn locate(&self) -> impl Future<Output = Option<Coordinate>> + Send;
}

/// Provider that answers with a position known up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(Option<Coordinate>);

impl FixedLocation {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self(position)
    }
}

impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Option<Coordinate> {
        self.0
    }
}

/// Asks `provider` for a fix and falls back to `fallback` when it has none.
/// Having neither is fine: distance and ETA simply stay unknown.
pub async fn locate_observer<P: LocationProvider>(
    provider: &P,
    fallback: Option<Coordinate>,
) -> Option<Coordinate> {
    match provider.locate().await {
        Some(position) => Some(position),
        None => {
            if let Some(fallback) = fallback {
                log::debug!("No location fix, using fallback {}", fallback);
            }
            fallback
        }
    }
}
