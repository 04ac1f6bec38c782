// Cycle timing.
//
// Two disciplines, chosen explicitly through configuration:
// - FixedDelay: the next cycle starts a full rest period after the previous
//   one finished. Cycles never overlap.
// - FixedInterval: a wall-clock ticker starts a cycle on every tick whether
//   or not the previous one is still running.
//
// Each cycle runs in its own task so a panic inside it is caught here and the
// schedule keeps going.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{error, info};

use exodus_common::{AppConfig, ScheduleKind};

use crate::ledger::Ledger;
use crate::worker::{CycleStats, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    FixedDelay(Duration),
    FixedInterval(Duration),
}

impl Schedule {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.schedule {
            ScheduleKind::FixedDelay => Schedule::FixedDelay(config.cycle_interval),
            ScheduleKind::FixedInterval => Schedule::FixedInterval(config.cycle_interval),
        }
    }
}

/// Run one cycle in its own task. A panicking cycle is reported to the admin
/// stream and yields `None`.
pub async fn run_guarded(worker: Arc<Worker>) -> Option<CycleStats> {
    let task_worker = worker.clone();
    match tokio::spawn(async move { task_worker.run_cycle().await }).await {
        Ok(stats) => Some(stats),
        Err(e) => {
            error!(error = %e, "cycle task failed");
            worker
                .admin()
                .error(&format!("Cycle aborted: {e}"))
                .await;
            None
        }
    }
}

/// Drive cycles until `shutdown` resolves. Returns how many cycles were
/// started.
pub async fn run_schedule<F>(worker: Arc<Worker>, schedule: Schedule, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut started: u64 = 0;

    info!(?schedule, "scheduler started");

    match schedule {
        Schedule::FixedDelay(rest) => loop {
            started += 1;
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = run_guarded(worker.clone()) => {}
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = sleep(rest) => {}
            }
        },
        Schedule::FixedInterval(period) => {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = ticker.tick() => {
                        started += 1;
                        tokio::spawn(run_guarded(worker.clone()));
                    }
                }
            }
        }
    }

    info!(started, "scheduler stopped");
    started
}

/// Clear the whole ledger every `period`, starting one period from now.
pub fn spawn_ledger_reset(ledger: Arc<Ledger>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let dropped = ledger.clear();
            info!(dropped, "ledger reset");
        }
    })
}
