//! Swap statistics service
//!
//! Wires authorization, the ingestion pipeline, the store, the clock and
//! metrics together behind the `log` and `reset` entry points. Every call
//! runs as one store transaction, so a rejected or failing call leaves the
//! venue's tables untouched.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use types::ids::{SymbolCode, VenueId};
use types::swap::SwapRecord;

use crate::auth::{authorize_log, authorize_reset, Caller};
use crate::clock::{Clock, SystemClock};
use crate::config::StatsConfig;
use crate::credential::{CredentialVerifier, SignedLogRequest};
use crate::engine::{check_swaps, ingest_batch, LogOutcome};
use crate::error::StatsError;
use crate::metrics::ServiceMetrics;
use crate::records::{CoarseBucket, CumulativeRecord, FineBucket, SymbolStats};
use crate::snapshot::StatsSnapshot;
use crate::store::{InMemoryStore, StatsStore};

pub struct SwapStatsService<S: StatsStore = InMemoryStore> {
    config: StatsConfig,
    store: S,
    clock: Arc<dyn Clock>,
    metrics: Arc<ServiceMetrics>,
}

impl SwapStatsService<InMemoryStore> {
    /// In-memory service on the system clock.
    pub fn new(config: StatsConfig) -> Result<Self, StatsError> {
        Self::with_parts(config, InMemoryStore::new(), Arc::new(SystemClock))
    }

    /// Capture every venue's tables.
    pub fn snapshot(&self) -> Result<StatsSnapshot, StatsError> {
        let venues = self.store.export()?;
        let snapshot = StatsSnapshot::new(self.clock.now_secs(), venues)?;
        info!(
            venues = snapshot.venues.len(),
            checksum = %snapshot.checksum,
            "Snapshot taken"
        );
        Ok(snapshot)
    }

    /// Replace all state with a verified snapshot.
    pub fn restore(&self, snapshot: StatsSnapshot) -> Result<(), StatsError> {
        snapshot.verify_integrity()?;
        let venues = snapshot.venues.len();
        self.store.import(snapshot.venues)?;
        info!(venues, taken_at = snapshot.taken_at, "Snapshot restored");
        Ok(())
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StatsError> {
        self.snapshot()?.write(path)?;
        Ok(())
    }

    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StatsError> {
        self.restore(StatsSnapshot::load(path)?)
    }
}

impl<S: StatsStore> SwapStatsService<S> {
    pub fn with_parts(config: StatsConfig, store: S, clock: Arc<dyn Clock>) -> Result<Self, StatsError> {
        config.validate()?;
        info!(
            day_interval = config.day.interval_secs,
            month_interval = config.month.interval_secs,
            operator = %config.operator,
            allow_list = config.allowed_venues.is_some(),
            "Swap stats service initialized"
        );
        Ok(Self {
            config,
            store,
            clock,
            metrics: Arc::new(ServiceMetrics::new()),
        })
    }

    /// Record a batch of swaps for `venue`.
    ///
    /// The caller must be the venue itself. All three tables are updated
    /// together or not at all.
    pub fn log(
        &self,
        caller: &Caller,
        venue: &VenueId,
        swaps: &[SwapRecord],
    ) -> Result<LogOutcome, StatsError> {
        if let Err(e) = authorize_log(caller, venue) {
            self.metrics.record_unauthorized();
            warn!(%caller, %venue, "Rejected log");
            return Err(e);
        }
        if !self.config.is_venue_allowed(venue) {
            self.metrics.record_unauthorized();
            warn!(%venue, "Venue not on allow-list");
            return Err(StatsError::VenueNotAllowed(venue.clone()));
        }

        let started = Instant::now();
        // clock is read under the venue lock
        let result = self.store.transact(venue, |txn| {
            ingest_batch(txn, &self.config, swaps, self.clock.now_secs())
        });

        match result {
            Ok(outcome) => {
                let latency_ns = started.elapsed().as_nanos() as u64;
                self.metrics.record_logged(&outcome, latency_ns);
                debug!(
                    %venue,
                    swaps = outcome.swaps,
                    fine_bucket = outcome.fine_bucket,
                    fine_created = outcome.fine_created,
                    fine_pruned = outcome.fine_pruned,
                    coarse_bucket = outcome.coarse_bucket,
                    coarse_created = outcome.coarse_created,
                    coarse_pruned = outcome.coarse_pruned,
                    first_ingestion = outcome.first_ingestion,
                    "Batch logged"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.metrics.record_invalid();
                warn!(%venue, error = %e, "Batch rejected");
                Err(e)
            }
        }
    }

    /// Verify a signed request and log it as the signing venue.
    ///
    /// Allow-list and price checks run before the signature is verified, so
    /// a request refused by either leaves its nonce unspent. Once verified
    /// the nonce is consumed even if the batch is later rejected against
    /// stored state (e.g. a symbol precision mismatch); resubmit with a new
    /// nonce.
    pub fn log_signed(
        &self,
        verifier: &CredentialVerifier,
        request: &SignedLogRequest,
    ) -> Result<LogOutcome, StatsError> {
        let venue = &request.venue;
        if !self.config.is_venue_allowed(venue) {
            self.metrics.record_unauthorized();
            warn!(%venue, "Venue not on allow-list");
            return Err(StatsError::VenueNotAllowed(venue.clone()));
        }
        if let Err(e) = check_swaps(venue, &request.swaps) {
            self.metrics.record_invalid();
            warn!(%venue, error = %e, "Batch rejected");
            return Err(e);
        }

        let caller = match verifier.verify(request) {
            Ok(caller) => caller,
            Err(e) => {
                self.metrics.record_unauthorized();
                warn!(venue = %request.venue, error = %e, "Credential rejected");
                return Err(e.into());
            }
        };
        self.log(&caller, &request.venue, &request.swaps)
    }

    /// Delete every row scoped to `venue`. Operator only.
    ///
    /// Returns the number of rows removed; resetting an empty venue is a no-op.
    pub fn reset(&self, caller: &Caller, venue: &VenueId) -> Result<usize, StatsError> {
        if let Err(e) = authorize_reset(caller, &self.config.operator, venue) {
            self.metrics.record_unauthorized();
            warn!(%caller, %venue, "Rejected reset");
            return Err(e);
        }

        let removed = self.store.transact(venue, |txn| Ok(txn.clear()))?;
        self.metrics.record_reset(removed);
        info!(%venue, removed, "Venue reset");
        Ok(removed)
    }

    pub fn cumulative(&self, venue: &VenueId) -> Result<Option<CumulativeRecord>, StatsError> {
        self.store.read(venue, |tables| tables.cumulative.clone())
    }

    /// Current statistics of one symbol on `venue`.
    pub fn symbol_stats(
        &self,
        venue: &VenueId,
        code: &SymbolCode,
    ) -> Result<Option<SymbolStats>, StatsError> {
        self.store.read(venue, |tables| {
            tables
                .cumulative
                .as_ref()
                .and_then(|record| record.symbol(code))
                .cloned()
        })
    }

    /// Retained fine buckets, oldest first.
    pub fn fine_buckets(&self, venue: &VenueId) -> Result<Vec<FineBucket>, StatsError> {
        self.store
            .read(venue, |tables| tables.fine.values().cloned().collect())
    }

    /// Retained coarse buckets, oldest first.
    pub fn coarse_buckets(&self, venue: &VenueId) -> Result<Vec<CoarseBucket>, StatsError> {
        self.store
            .read(venue, |tables| tables.coarse.values().cloned().collect())
    }

    pub fn venues(&self) -> Vec<VenueId> {
        self.store.venues()
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.metrics)
    }
}
