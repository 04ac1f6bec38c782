// One cycle of the pipeline: fetch → dedup → qualify → notify, per work unit.
//
// Units and items inside a cycle run strictly in order. Overlapping cycles
// (fixed-interval schedule) share one `Worker` through `Arc`; the ledger and
// the rotation cursor are the only shared mutable state and both are atomic.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use exodus_common::{CandidateItem, CyclePlan, WorkUnit};

use crate::ledger::Ledger;
use crate::notify::{AdminLog, Notifier};
use crate::qualify::{Qualification, Qualifier};
use crate::sources::LeadSource;

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub units: usize,
    pub fetched: usize,
    pub fetch_errors: usize,
    pub duplicates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub dropped: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

impl CycleStats {
    /// Items that reached qualification.
    pub fn fresh(&self) -> usize {
        self.accepted + self.rejected + self.dropped
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "units={} fetched={} fresh={} duplicates={} accepted={} rejected={} dropped={} \
             delivered={} delivery_failures={} fetch_errors={}",
            self.units,
            self.fetched,
            self.fresh(),
            self.duplicates,
            self.accepted,
            self.rejected,
            self.dropped,
            self.delivered,
            self.delivery_failures,
            self.fetch_errors,
        )
    }
}

pub struct Worker {
    units: Vec<WorkUnit>,
    plan: CyclePlan,
    cursor: AtomicUsize,
    cycles: AtomicU64,
    ledger: Arc<Ledger>,
    source: Arc<dyn LeadSource>,
    qualifier: Arc<dyn Qualifier>,
    notifier: Notifier,
    admin: AdminLog,
    item_pause: Duration,
}

impl Worker {
    /// A rotating worker with a fresh ledger, no admin mirror and no pause.
    pub fn new(
        units: Vec<WorkUnit>,
        source: Arc<dyn LeadSource>,
        qualifier: Arc<dyn Qualifier>,
        notifier: Notifier,
    ) -> Self {
        Self {
            units,
            plan: CyclePlan::Rotate,
            cursor: AtomicUsize::new(0),
            cycles: AtomicU64::new(0),
            ledger: Arc::new(Ledger::new()),
            source,
            qualifier,
            notifier,
            admin: AdminLog::disabled(),
            item_pause: Duration::ZERO,
        }
    }

    pub fn with_plan(mut self, plan: CyclePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<Ledger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_admin_log(mut self, admin: AdminLog) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_item_pause(mut self, pause: Duration) -> Self {
        self.item_pause = pause;
        self
    }

    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn admin(&self) -> &AdminLog {
        &self.admin
    }

    /// Number of cycles begun so far.
    pub fn cycles_started(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Indices of the units the next cycle covers. Rotation claims the cursor
    /// atomically so overlapping cycles never pick the same slot.
    fn claim_units(&self) -> Vec<usize> {
        let len = self.units.len();
        if len == 0 {
            return Vec::new();
        }
        match self.plan {
            CyclePlan::Sweep => (0..len).collect(),
            CyclePlan::Rotate => {
                let claimed = self
                    .cursor
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
                    .unwrap_or_else(|i| i);
                vec![claimed % len]
            }
        }
    }

    pub async fn run_cycle(&self) -> CycleStats {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let indices = self.claim_units();
        let mut stats = CycleStats::default();

        if indices.is_empty() {
            self.admin.error("No work units configured; nothing to search.").await;
            return stats;
        }

        for index in indices {
            self.run_unit(&self.units[index], &mut stats).await;
        }

        info!(cycle, %stats, "cycle complete");
        self.admin
            .event(&format!("🏁 Cycle #{cycle} done: {stats}"))
            .await;
        stats
    }

    async fn run_unit(&self, unit: &WorkUnit, stats: &mut CycleStats) {
        stats.units += 1;
        self.admin.event(&format!("🔍 Hunting: {unit}...")).await;

        let items = match self.source.fetch(unit).await {
            Ok(items) => items,
            Err(e) => {
                stats.fetch_errors += 1;
                self.admin
                    .error(&format!("Search failed for {unit}: {e:#}"))
                    .await;
                return;
            }
        };

        stats.fetched += items.len();
        self.admin
            .event(&format!("✅ Found {} item(s) for {unit}. Filtering...", items.len()))
            .await;

        for item in &items {
            self.process_item(item, stats).await;
        }
    }

    async fn process_item(&self, item: &CandidateItem, stats: &mut CycleStats) {
        if !self.ledger.check_and_mark(&item.id) {
            stats.duplicates += 1;
            debug!(item = item.id.as_str(), "already seen");
            return;
        }

        match self.qualifier.qualify(item).await {
            Qualification::Accepted(lead) => {
                stats.accepted += 1;
                let record = self.notifier.render(&lead);
                let results = self.notifier.deliver(&record).await;
                let delivered = results.iter().filter(|r| r.is_ok()).count();
                let failed = results.len() - delivered;
                stats.delivered += delivered;
                stats.delivery_failures += failed;

                self.admin
                    .event(&format!(
                        "💰 [PROFIT ALERT]: Lead sent for {} ({delivered} delivered, {failed} failed)",
                        item.title
                    ))
                    .await;
            }
            Qualification::Rejected(reason) => {
                stats.rejected += 1;
                self.admin
                    .detail(&format!("⏩ Skipped {} ({reason})", item.title))
                    .await;
            }
            Qualification::Dropped(reason) => {
                stats.dropped += 1;
                self.admin
                    .error(&format!("Dropped {}: {reason}", item.title))
                    .await;
            }
        }

        if !self.item_pause.is_zero() {
            tokio::time::sleep(self.item_pause).await;
        }
    }
}
