//! Lazy retention pruning
//!
//! Buckets are removed only as a side effect of ingestion, and only when
//! the ingestion opens a new bucket. Expiry may therefore lag by up to one
//! interval. Cost is bounded by the number of expired buckets.

use tracing::debug;

use crate::config::Resolution;
use crate::store::StagedTable;

/// Delete every bucket keyed strictly before `now - max_age`.
///
/// Returns the number of buckets removed.
pub fn prune_expired<V: Clone>(table: &mut StagedTable<'_, V>, now: i64, max_age: i64) -> usize {
    let threshold = now.saturating_sub(max_age);
    let expired = table.keys_before(threshold);
    for key in &expired {
        table.delete(*key);
    }
    expired.len()
}

/// Prune `table` only if the bucket containing `now` does not exist yet.
pub fn prune_on_new_bucket<V: Clone>(
    table: &mut StagedTable<'_, V>,
    resolution: &Resolution,
    now: i64,
) -> usize {
    let current = resolution.bucket_start(now);
    if table.contains(current) {
        return 0;
    }
    let pruned = prune_expired(table, now, resolution.retention_secs);
    if pruned > 0 {
        debug!(
            pruned,
            bucket = current,
            retention_secs = resolution.retention_secs,
            "Pruned expired buckets"
        );
    }
    pruned
}
