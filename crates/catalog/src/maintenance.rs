//! Background maintenance: periodic reload, session sweep and metrics sampling.
//!
//! Each loop runs on its own timer with no ordering between them. A failed
//! iteration is logged and the loop waits for its next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::catalog::Catalog;
use crate::events::{VideoUpdate, run_cache_writer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceConfig {
    pub reconcile_interval: Duration,
    pub session_sweep_interval: Duration,
    pub metrics_interval: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(30 * 60),
            session_sweep_interval: Duration::from_secs(60 * 60),
            metrics_interval: Duration::from_secs(20 * 60),
        }
    }
}

/// Running background tasks. Dropping the handle leaves them running.
pub struct MaintenanceHandle {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl MaintenanceHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every task and wait for them to finish their current iteration.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!(task = name, error = %e, "maintenance task ended abnormally");
            }
        }
        info!("maintenance stopped");
    }
}

/// Spawn the cache writer plus the three periodic loops.
///
/// The first periodic run happens one full interval after spawning; callers
/// wanting a warm cache run [`Catalog::force_reconcile`] beforehand.
pub fn spawn(
    catalog: Arc<Catalog>,
    updates: mpsc::Receiver<VideoUpdate>,
    config: MaintenanceConfig,
) -> MaintenanceHandle {
    let cancel = CancellationToken::new();
    let mut tasks = Vec::with_capacity(4);

    tasks.push((
        "cache_writer",
        tokio::spawn(run_cache_writer(
            catalog.cache().clone(),
            updates,
            cancel.clone(),
        )),
    ));

    let c = catalog.clone();
    tasks.push((
        "reconcile",
        periodic("reconcile", config.reconcile_interval, cancel.clone(), move || {
            let c = c.clone();
            async move {
                if let Err(e) = c.force_reconcile().await {
                    error!(error = %e, "scheduled reload failed");
                }
            }
        }),
    ));

    let c = catalog.clone();
    tasks.push((
        "session_sweep",
        periodic(
            "session_sweep",
            config.session_sweep_interval,
            cancel.clone(),
            move || {
                let c = c.clone();
                async move {
                    if let Err(e) = c.sweep_sessions().await {
                        error!(error = %e, "session sweep failed");
                    }
                }
            },
        ),
    ));

    let c = catalog;
    tasks.push((
        "metrics",
        periodic("metrics", config.metrics_interval, cancel.clone(), move || {
            let c = c.clone();
            async move {
                if let Err(e) = c.sample_metrics().await {
                    error!(error = %e, "metrics sample failed");
                }
            }
        }),
    ));

    info!(
        reconcile_secs = config.reconcile_interval.as_secs(),
        sweep_secs = config.session_sweep_interval.as_secs(),
        metrics_secs = config.metrics_interval.as_secs(),
        "maintenance started"
    );
    MaintenanceHandle { cancel, tasks }
}

/// Run `job` every `period` until `cancel` fires. The stop signal is only
/// observed between iterations; a running job always completes.
pub fn periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(task = name, "periodic task stopped");
                    break;
                }
                _ = ticker.tick() => job().await,
            }
        }
    })
}
