use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::info;

use crate::services::notice_store::NoticeStore;

/// Spawn a background task that purges expired notices every `every`,
/// so the store does not grow when nobody is reading it.
/// Reads still purge on their own; this only bounds memory.
pub fn start(store: Arc<NoticeStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = store.sweep_expired(Utc::now());
            if purged > 0 {
                info!(
                    "Notice sweep: purged {} expired notice(s), {} remaining",
                    purged,
                    store.len()
                );
            }
        }
    })
}
