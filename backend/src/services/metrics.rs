use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref NOTICES_ADDED_COUNTER: IntCounter = register_int_counter!(
        "notices_added_total",
        "Notices accepted by POST /notices"
    ).unwrap();

    pub static ref NOTICES_REJECTED_COUNTER: IntCounterVec = register_int_counter_vec!(
        "notices_rejected_total",
        "Notices rejected by validation, by reason",
        &["reason"]
    ).unwrap();

    pub static ref NOTICES_EXPIRED_COUNTER: IntCounter = register_int_counter!(
        "notices_expired_total",
        "Expired notices purged from the store"
    ).unwrap();

    pub static ref NOTICES_EVICTED_COUNTER: IntCounter = register_int_counter!(
        "notices_evicted_total",
        "Notices evicted early because the store hit its capacity"
    ).unwrap();

    // ── Store size ──────────────────────────────────────────────────────────
    pub static ref NOTICES_STORED_GAUGE: IntGauge = register_int_gauge!(
        "notices_stored",
        "Notices currently held in memory, expired-but-unpurged included"
    ).unwrap();
}

/// Record the store size after a mutation.
pub fn set_stored(count: usize) {
    NOTICES_STORED_GAUGE.set(i64::try_from(count).unwrap_or(i64::MAX));
}
