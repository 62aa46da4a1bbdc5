//! Rolling-window properties of the swap statistics service
//!
//! Drives the public service API with a manual clock and checks the
//! cumulative, 24h and 30d bookkeeping end to end.

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use swap_stats::clock::{Clock, ManualClock};
use swap_stats::{Caller, InMemoryStore, StatsConfig, StatsStore, SwapStatsService};
use types::ids::{OperatorId, SymbolCode, VenueId};
use types::numeric::{Amount, Symbol};
use types::swap::SwapRecord;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn service_at(now: i64) -> (SwapStatsService, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(now));
    let service =
        SwapStatsService::with_parts(StatsConfig::default(), InMemoryStore::new(), clock.clone())
            .unwrap();
    (service, clock)
}

fn swap(quantity: &str, price: f64, smart_price: f64) -> SwapRecord {
    SwapRecord::new(
        quantity.parse().unwrap(),
        price,
        "1000.0000 TLOS".parse().unwrap(),
        smart_price,
    )
}

fn venue_a() -> (VenueId, Caller) {
    let venue = VenueId::new("venueA");
    (venue.clone(), Caller::Venue(venue))
}

fn tlos() -> SymbolCode {
    SymbolCode::try_new("TLOS").unwrap()
}

fn operator() -> Caller {
    Caller::Operator(OperatorId::new("swapsdata"))
}

#[test]
fn test_first_log_scenario() {
    let (service, _) = service_at(1_000);
    let (venue, caller) = venue_a();

    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();

    let stats = service.symbol_stats(&venue, &tlos()).unwrap().unwrap();
    assert_eq!(stats.volume_24h.to_string(), "10.0000 TLOS");
    assert_eq!(stats.volume_cumulative.to_string(), "10.0000 TLOS");
    assert_eq!(stats.price, 2.0);
    assert_eq!(stats.price_change_24h, 0.0);
    assert_eq!(stats.liquidity_depth.to_string(), "1000.0000 TLOS");
    assert_eq!(stats.smart_price, 1.5);
    assert_eq!(stats.smart_price_change_30d, 0.0);

    let fine = service.fine_buckets(&venue).unwrap();
    assert_eq!(fine.len(), 1);
    let candle = fine[0].candle(&tlos()).unwrap();
    assert_eq!((candle.open, candle.high, candle.low, candle.close), (2.0, 2.0, 2.0, 2.0));
    assert_eq!(candle.volume.to_string(), "10.0000 TLOS");

    let coarse = service.coarse_buckets(&venue).unwrap();
    assert_eq!(coarse.len(), 1);
    assert_eq!(coarse[0].open_smart_price(&tlos()), Some(1.5));
}

#[test]
fn test_same_interval_updates_same_fine_bucket() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();

    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();
    clock.set(1_150);
    service.log(&caller, &venue, &[swap("2.0000 TLOS", 2.6, 1.5)]).unwrap();

    let fine = service.fine_buckets(&venue).unwrap();
    assert_eq!(fine.len(), 1);
    let candle = fine[0].candle(&tlos()).unwrap();
    assert_eq!((candle.open, candle.high, candle.low, candle.close), (2.0, 2.6, 2.0, 2.6));
    assert_eq!(candle.volume.to_string(), "12.0000 TLOS");
}

#[test]
fn test_crossing_boundary_opens_new_bucket_and_freezes_prior() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();

    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();
    let prior = service.fine_buckets(&venue).unwrap()[0].clone();

    clock.set(1_200);
    service.log(&caller, &venue, &[swap("1.0000 TLOS", 9.0, 1.5)]).unwrap();

    let fine = service.fine_buckets(&venue).unwrap();
    assert_eq!(fine.iter().map(|b| b.timestamp).collect::<Vec<_>>(), vec![600, 1_200]);
    assert_eq!(fine[0], prior);
}

#[test]
fn test_expired_fine_bucket_evicted_on_next_new_bucket() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();

    // bucket 600 sits exactly on the 24h boundary: retained
    clock.set(600 + 86_400);
    service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, 1.5)]).unwrap();
    let keys: Vec<i64> = service.fine_buckets(&venue).unwrap().iter().map(|b| b.timestamp).collect();
    assert_eq!(keys, vec![600, 87_000]);

    // same bucket again: no pruning even though 600 is now stale
    clock.set(87_100);
    service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, 1.5)]).unwrap();
    assert_eq!(service.fine_buckets(&venue).unwrap().len(), 2);

    clock.set(87_600);
    let outcome = service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, 1.5)]).unwrap();
    assert_eq!(outcome.fine_pruned, 1);
    let keys: Vec<i64> = service.fine_buckets(&venue).unwrap().iter().map(|b| b.timestamp).collect();
    assert_eq!(keys, vec![87_000, 87_600]);
}

#[test]
fn test_coarse_open_smart_price_written_once() {
    let (service, clock) = service_at(100);
    let (venue, caller) = venue_a();

    service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, 1.5)]).unwrap();
    for (t, smart) in [(700, 9.0), (1_900, 0.1), (3_599, 4.2)] {
        clock.set(t);
        service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, smart)]).unwrap();
    }

    let coarse = service.coarse_buckets(&venue).unwrap();
    assert_eq!(coarse.len(), 1);
    assert_eq!(coarse[0].open_smart_price(&tlos()), Some(1.5));
}

#[test]
fn test_change_formulas_use_oldest_retained_buckets() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();

    clock.set(4_000);
    service.log(&caller, &venue, &[swap("4.0000 TLOS", 2.5, 1.8)]).unwrap();
    clock.set(8_000);
    service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.25, 2.0)]).unwrap();

    let stats = service.symbol_stats(&venue, &tlos()).unwrap().unwrap();
    // oldest fine bucket (600) opened with zero prior volume and price 2.0;
    // oldest coarse bucket (0) opened with smart price 1.5
    assert_eq!(stats.volume_cumulative.to_string(), "15.0000 TLOS");
    assert_eq!(stats.volume_24h.to_string(), "15.0000 TLOS");
    assert!((stats.price_change_24h - 0.25).abs() < 1e-12);
    assert!((stats.smart_price_change_30d - 0.5).abs() < 1e-12);
}

#[test]
fn test_repeated_symbol_after_full_expiry_has_zero_changes() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, 1.5)]).unwrap();

    // every fine and coarse bucket has expired by now
    clock.set(1_000 + 31 * 86_400);
    let outcome = service
        .log(
            &caller,
            &venue,
            &[swap("1.0000 TLOS", 2.0, 1.0), swap("1.0000 TLOS", 3.0, 4.0)],
        )
        .unwrap();
    assert_eq!(outcome.fine_pruned, 1);
    assert_eq!(outcome.coarse_pruned, 1);

    let stats = service.symbol_stats(&venue, &tlos()).unwrap().unwrap();
    assert_eq!(stats.volume_cumulative.to_string(), "3.0000 TLOS");
    assert_eq!(stats.price, 3.0);
    assert_eq!(stats.smart_price, 4.0);
    assert_eq!(stats.price_change_24h, 0.0);
    assert_eq!(stats.smart_price_change_30d, 0.0);

    let fine = service.fine_buckets(&venue).unwrap();
    assert_eq!(fine.len(), 1);
    assert_eq!(fine[0].baseline(&tlos()).unwrap().price, 3.0);

    let coarse = service.coarse_buckets(&venue).unwrap();
    assert_eq!(coarse.len(), 1);
    assert_eq!(coarse[0].open_smart_price(&tlos()), Some(4.0));
}

#[test]
fn test_24h_volume_drops_out_once_window_slides() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();

    clock.set(50_000);
    service.log(&caller, &venue, &[swap("5.0000 TLOS", 3.0, 1.5)]).unwrap();

    // bucket 600 expires; 49800 becomes the oldest, with baseline 10 @ 3.0
    clock.set(90_000);
    service.log(&caller, &venue, &[swap("1.0000 TLOS", 3.5, 1.5)]).unwrap();

    let stats = service.symbol_stats(&venue, &tlos()).unwrap().unwrap();
    assert_eq!(stats.volume_cumulative.to_string(), "16.0000 TLOS");
    assert_eq!(stats.volume_24h.to_string(), "6.0000 TLOS");
    assert!((stats.price_change_24h - 0.5).abs() < 1e-12);
}

#[test]
fn test_reset_then_log_matches_first_ingestion() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();
    clock.set(5_000);
    service.log(&caller, &venue, &[swap("3.0000 TLOS", 2.2, 1.7)]).unwrap();

    service.reset(&operator(), &venue).unwrap();
    assert!(service.store().read(&venue, |t| t.is_empty()).unwrap());

    clock.set(9_000);
    let batch = [swap("7.0000 TLOS", 1.9, 1.4)];
    let outcome = service.log(&caller, &venue, &batch).unwrap();
    assert!(outcome.first_ingestion);

    let (fresh, _) = service_at(9_000);
    fresh.log(&caller, &venue, &batch).unwrap();

    let after_reset = service.store().read(&venue, |t| t.clone()).unwrap();
    let first_ever = fresh.store().read(&venue, |t| t.clone()).unwrap();
    assert_eq!(after_reset, first_ever);
}

#[test]
fn test_reset_leaves_other_venues() {
    let (service, _) = service_at(1_000);
    let (venue, caller) = venue_a();
    let other = VenueId::new("venueB");
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();
    service
        .log(&Caller::Venue(other.clone()), &other, &[swap("1.0000 TLOS", 2.0, 1.5)])
        .unwrap();

    service.reset(&operator(), &venue).unwrap();

    assert_eq!(service.venues(), vec![other.clone()]);
    assert!(service.cumulative(&other).unwrap().is_some());
}

#[test]
fn test_foreign_caller_leaves_tables_unchanged() {
    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();
    let before = service.store().read(&venue, |t| t.clone()).unwrap();

    clock.set(2_000);
    for intruder in [Caller::Venue(VenueId::new("venueB")), operator()] {
        let err = service
            .log(&intruder, &venue, &[swap("99.0000 TLOS", 50.0, 50.0)])
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    assert_eq!(service.store().read(&venue, |t| t.clone()).unwrap(), before);
}

#[test]
fn test_snapshot_file_round_trip_into_new_service() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("stats.snap");

    let (service, clock) = service_at(1_000);
    let (venue, caller) = venue_a();
    service.log(&caller, &venue, &[swap("10.0000 TLOS", 2.0, 1.5)]).unwrap();
    service.save_snapshot(&path).unwrap();

    let (restored, restored_clock) = service_at(0);
    restored.load_snapshot(&path).unwrap();
    assert_eq!(restored.cumulative(&venue).unwrap(), service.cumulative(&venue).unwrap());

    // both continue identically
    clock.set(2_000);
    restored_clock.set(2_000);
    let batch = [swap("1.0000 TLOS", 2.2, 1.6)];
    service.log(&caller, &venue, &batch).unwrap();
    restored.log(&caller, &venue, &batch).unwrap();
    assert_eq!(
        restored.store().read(&venue, |t| t.clone()).unwrap(),
        service.store().read(&venue, |t| t.clone()).unwrap()
    );
}

fn symbol(code: &str) -> Symbol {
    Symbol::parse(code, 4).unwrap()
}

proptest! {
    #[test]
    fn cumulative_volume_is_sum_of_logged_quantities(
        batches in prop::collection::vec(
            (prop::collection::vec((0usize..2, -100_000i64..100_000), 1..4), 0i64..5_000),
            1..25,
        )
    ) {
        let (service, clock) = service_at(0);
        let (venue, caller) = venue_a();
        let codes = ["TLOS", "USD"];
        let mut expected: BTreeMap<&str, Decimal> = BTreeMap::new();

        for (swaps, step) in batches {
            clock.advance(step);
            let records: Vec<SwapRecord> = swaps
                .iter()
                .map(|(idx, units)| {
                    let sym = symbol(codes[*idx]);
                    SwapRecord::new(
                        Amount::new(Decimal::new(*units, 4), sym.clone()),
                        1.0,
                        Amount::zero(sym),
                        1.0,
                    )
                })
                .collect();
            for (idx, units) in &swaps {
                *expected.entry(codes[*idx]).or_insert(Decimal::ZERO) += Decimal::new(*units, 4);
            }
            service.log(&caller, &venue, &records).unwrap();
        }

        for (code, total) in expected {
            let stats = service
                .symbol_stats(&venue, &SymbolCode::try_new(code).unwrap())
                .unwrap()
                .unwrap();
            prop_assert_eq!(stats.volume_cumulative.value(), total);
        }
    }

    #[test]
    fn fine_buckets_stay_within_retention(
        steps in prop::collection::vec(0i64..20_000, 1..40)
    ) {
        let (service, clock) = service_at(0);
        let (venue, caller) = venue_a();
        let day = service.config().day;

        for step in steps {
            clock.advance(step);
            service.log(&caller, &venue, &[swap("1.0000 TLOS", 2.0, 1.5)]).unwrap();

            let fine = service.fine_buckets(&venue).unwrap();
            prop_assert!(fine.len() <= day.max_buckets() + 1);
            // the bucket containing now always exists
            let now = clock.now_secs();
            prop_assert!(fine.iter().any(|b| b.timestamp == day.bucket_start(now)));
        }
    }
}
