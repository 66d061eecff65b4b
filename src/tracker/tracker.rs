use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::geo::{eta_with_traffic, Coordinate};

use super::error::TrackerError;
use super::session::{TrackingSession, TrackingState};
use super::telemetry::Telemetry;
use super::types::{TrackerStatus, TrackingSettings};

#[derive(Debug)]
struct Shared {
    session: TrackingSession,
    telemetry: Telemetry,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Drives one [`TrackingSession`] from tokio intervals.
pub struct Tracker {
    id: Uuid,
    route_name: String,
    settings: TrackingSettings,
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
}

fn lock(shared: &StdMutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Tracker {
    pub fn new(
        route_name: impl Into<String>,
        session: TrackingSession,
        settings: TrackingSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            route_name: route_name.into(),
            settings,
            shared: Arc::new(StdMutex::new(Shared {
                session,
                telemetry: Telemetry::default(),
            })),
            worker: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_worker_active(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.join.is_finished())
    }

    pub fn status(&self) -> TrackerStatus {
        let locked = lock(&self.shared);
        let session = &locked.session;
        let snapshot = session.snapshot();
        let telemetry = locked.telemetry.clone();
        let live_eta_minutes = snapshot.distance_km.and_then(|d| {
            eta_with_traffic(d, telemetry.speed_kmh, telemetry.traffic).ok()
        });

        TrackerStatus {
            id: self.id,
            route: self.route_name.clone(),
            state: session.state(),
            current_index: session.current_index(),
            waypoint_count: session.route().len(),
            observer: session.observer(),
            snapshot,
            telemetry,
            live_eta_minutes,
        }
    }

    /// Starts the session and spawns the worker that advances it.
    ///
    /// A completed route stays completed; call [`Tracker::reset`] first.
    pub fn start(&mut self) -> Result<TrackingState, TrackerError> {
        if self.is_worker_active() && lock(&self.shared).session.is_running() {
            return Err(TrackerError::AlreadyRunning);
        }
        // A manual advance can finish the route before the worker's next tick.
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
        }

        {
            let mut locked = lock(&self.shared);
            locked.session.start();
            if !locked.session.is_running() {
                log::info!(
                    "Session {} on {} is already at its last waypoint",
                    self.id,
                    self.route_name
                );
                return Ok(locked.session.state());
            }
        }

        let shared = self.shared.clone();
        let settings = self.settings;
        let id = self.id;
        let (stop_tx, stop_rx) = oneshot::channel();

        let join = tokio::spawn(async move {
            run_tracking_loop(shared, settings, id, stop_rx).await;
        });

        self.worker = Some(WorkerHandle { stop_tx, join });
        log::info!("Session {} started on {}", self.id, self.route_name);

        Ok(TrackingState::Running)
    }

    pub async fn stop(&mut self) -> TrackingState {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
        let mut locked = lock(&self.shared);
        locked.session.stop();
        locked.session.state()
    }

    pub async fn reset(&mut self) -> TrackingState {
        self.stop().await;
        let mut locked = lock(&self.shared);
        locked.session.reset();
        locked.session.state()
    }

    /// Steps the session once outside the timer. No-op unless running.
    pub fn advance(&self) -> bool {
        lock(&self.shared).session.advance()
    }

    pub fn set_observer(&self, observer: Option<Coordinate>) {
        lock(&self.shared).session.set_observer(observer);
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
        }
    }
}

async fn run_tracking_loop(
    shared: Arc<StdMutex<Shared>>,
    settings: TrackingSettings,
    id: Uuid,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let now = Instant::now();
    let mut advance_tick = interval_at(
        now + settings.advance_interval,
        settings.advance_interval,
    );
    let mut telemetry_tick = interval_at(
        now + settings.telemetry_interval,
        settings.telemetry_interval,
    );
    advance_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    telemetry_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rng = StdRng::from_entropy();

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                log::debug!("Session {} worker stopped", id);
                return;
            }
            _ = advance_tick.tick() => {
                let mut locked = lock(&shared);
                if locked.session.advance() {
                    let readings = locked.session.readings();
                    log::debug!(
                        "Session {} at waypoint {} ({:.0}%)",
                        id,
                        locked.session.current_index(),
                        readings.progress_percent
                    );
                }
                if !locked.session.is_running() {
                    log::info!("Session {} finished at {:?}", id, locked.session.state());
                    return;
                }
            }
            _ = telemetry_tick.tick() => {
                let mut locked = lock(&shared);
                if !locked.session.is_running() {
                    return;
                }
                locked.telemetry.jitter(&mut rng);
            }
        }
    }
}
