use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::geo::TrafficCondition;

const SPEED_RANGE_KMH: (f64, f64) = (15.0, 60.0);
const OCCUPANCY_RANGE: (f64, f64) = (20.0, 100.0);
const SPEED_STEP_KMH: f64 = 10.0;
const OCCUPANCY_STEP: f64 = 20.0;

/// Ambient bus readings that drift between route ticks.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Telemetry {
    pub speed_kmh: f64,
    pub occupancy_percent: f64,
    pub traffic: TrafficCondition,
    pub updated_at: DateTime<Utc>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(35.0, 60.0)
    }
}

impl Telemetry {
    pub fn new(speed_kmh: f64, occupancy_percent: f64) -> Self {
        let speed_kmh = speed_kmh.clamp(SPEED_RANGE_KMH.0, SPEED_RANGE_KMH.1);
        Self {
            speed_kmh,
            occupancy_percent: occupancy_percent.clamp(OCCUPANCY_RANGE.0, OCCUPANCY_RANGE.1),
            traffic: TrafficCondition::from_speed_kmh(speed_kmh),
            updated_at: Utc::now(),
        }
    }

    /// Random walk: speed moves by up to ±5 km/h, occupancy by up to ±10 %.
    pub fn jitter<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let speed = self.speed_kmh + (rng.gen::<f64>() - 0.5) * SPEED_STEP_KMH;
        let occupancy = self.occupancy_percent + (rng.gen::<f64>() - 0.5) * OCCUPANCY_STEP;

        self.speed_kmh = speed.clamp(SPEED_RANGE_KMH.0, SPEED_RANGE_KMH.1).round();
        self.occupancy_percent = occupancy
            .clamp(OCCUPANCY_RANGE.0, OCCUPANCY_RANGE.1)
            .round();
        self.traffic = TrafficCondition::from_speed_kmh(self.speed_kmh);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_clamps_inputs() {
        let t = Telemetry::new(5.0, 150.0);
        assert_eq!(t.speed_kmh, 15.0);
        assert_eq!(t.occupancy_percent, 100.0);
        assert_eq!(t.traffic, TrafficCondition::Moderate);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut t = Telemetry::default();
        for _ in 0..500 {
            let before = t.clone();
            t.jitter(&mut rng);
            assert!((15.0..=60.0).contains(&t.speed_kmh));
            assert!((20.0..=100.0).contains(&t.occupancy_percent));
            assert!((t.speed_kmh - before.speed_kmh).abs() <= 6.0);
            assert!((t.occupancy_percent - before.occupancy_percent).abs() <= 11.0);
            assert_eq!(t.traffic, TrafficCondition::from_speed_kmh(t.speed_kmh));
            assert!(matches!(
                t.traffic,
                TrafficCondition::Light | TrafficCondition::Moderate
            ));
        }
    }
}
