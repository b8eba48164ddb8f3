// Reconciliation cycle: one non-overlapping sweep-then-match pass per tick

use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use reconciler_core::TransactionRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::integration::{Inventory, Messenger, MutationFeed};
use crate::matcher::PaymentMatcher;
use crate::metrics;
use crate::store::RecordStore;
use crate::sweeper::ExpirySweeper;

pub struct ReconciliationCycle {
    store: Arc<dyn RecordStore>,
    feed: Arc<dyn MutationFeed>,
    sweeper: ExpirySweeper,
    matcher: PaymentMatcher,
    /// Single-permit gate: a tick that cannot acquire it is skipped, never
    /// queued, so at most one pass runs at a time.
    gate: Semaphore,
    tz_offset_minutes: i64,
}

impl ReconciliationCycle {
    pub fn new(
        store: Arc<dyn RecordStore>,
        feed: Arc<dyn MutationFeed>,
        messenger: Arc<dyn Messenger>,
        inventory: Arc<dyn Inventory>,
        config: &Config,
    ) -> Self {
        let sweeper = ExpirySweeper::new(
            Arc::clone(&store),
            Arc::clone(&messenger),
            inventory,
            config.expiry_minutes,
        );
        let matcher = PaymentMatcher::new(
            Arc::clone(&store),
            messenger,
            config.match_window_minutes,
            config.data_dir.clone(),
        );

        Self {
            store,
            feed,
            sweeper,
            matcher,
            gate: Semaphore::new(1),
            tz_offset_minutes: config.tz_offset_minutes,
        }
    }

    fn local_now(&self) -> NaiveDateTime {
        (Utc::now() + ChronoDuration::minutes(self.tz_offset_minutes)).naive_utc()
    }

    /// One guarded tick. Returns whether a pass actually ran. Any failure
    /// inside the pass is logged and swallowed; the next tick retries from
    /// a fresh read.
    pub async fn tick(&self) -> bool {
        let Ok(_permit) = self.gate.try_acquire() else {
            debug!("previous reconciliation pass still running, skipping tick");
            metrics::PASSES_SKIPPED.inc();
            return false;
        };

        metrics::PASSES_TOTAL.inc();
        let timer = metrics::PASS_DURATION.start_timer();
        if let Err(e) = self.run_once().await {
            error!("reconciliation pass failed: {}", e);
        }
        timer.observe_duration();
        true
    }

    /// A single pass: load pending records, sweep expirations, fetch the
    /// mutation feed, match the still-pending subset. Sequential by design;
    /// the ordering preserves first-match-wins without extra locking.
    pub async fn run_once(&self) -> Result<()> {
        let now = self.local_now();

        let pending = self.store.find_pending().await?;
        if pending.is_empty() {
            return Ok(());
        }
        info!("found {} pending transaction(s)", pending.len());

        let canceled = self.sweeper.run(&pending, now).await?;

        let entries = match self.feed.fetch_mutations().await {
            Ok(entries) => entries,
            Err(e) => {
                // Non-fatal: the sweep already ran, the matcher waits for
                // the next tick.
                warn!("mutation feed unavailable: {}", e);
                metrics::FEED_FAILURES.inc();
                return Ok(());
            }
        };
        if entries.is_empty() {
            debug!("no new mutation data from the gateway");
            return Ok(());
        }
        info!("received {} mutation entr(ies) from the gateway", entries.len());

        // Records canceled by this pass's sweep are still pending in the
        // in-memory copies; drop them before matching.
        let still_pending: Vec<TransactionRecord> = pending
            .into_iter()
            .filter(|r| !canceled.contains(&r.transaction_id))
            .collect();

        self.matcher.run(&still_pending, &entries, now).await?;
        Ok(())
    }

    /// Fire one tick per poll interval forever. Each pass runs on its own
    /// task so a slow pass delays nothing; the gate turns the overlapping
    /// ticks into skips.
    pub async fn run_forever(self: Arc<Self>, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let cycle = Arc::clone(&self);
            tokio::spawn(async move {
                cycle.tick().await;
            });
        }
    }
}
