use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    models::notice::{CreateNoticeRequest, Notice, ValidationError},
    services::metrics,
};

/// In-memory notice collection shared by every request.
///
/// Expired notices are purged lazily: each read drops everything whose
/// expiry is at or before the supplied `now` before returning the rest.
/// All operations hold the lock for their whole read-modify-write and
/// never across an `.await`.
pub struct NoticeStore {
    notices: Mutex<Vec<Notice>>,
    capacity: Option<usize>,
}

impl NoticeStore {
    /// `capacity` of `None` (or zero) leaves the store unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            capacity: capacity.filter(|&c| c > 0),
        }
    }

    // The Vec has no invariant a panicking holder could break.
    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and append a notice. On error the store is left untouched.
    /// `now` is only consulted when the store is at capacity.
    pub fn add(
        &self,
        req: CreateNoticeRequest,
        now: DateTime<Utc>,
    ) -> Result<Notice, ValidationError> {
        let notice = Notice::try_from(req).inspect_err(|e| {
            metrics::NOTICES_REJECTED_COUNTER
                .with_label_values(&[e.reason()])
                .inc();
        })?;
        self.insert(notice.clone(), now);
        Ok(notice)
    }

    /// Append an already validated notice. At capacity, expired notices are
    /// purged first and the oldest active ones are evicted only if that
    /// did not free a slot.
    pub fn insert(&self, notice: Notice, now: DateTime<Utc>) {
        let mut notices = self.lock();

        if let Some(capacity) = self.capacity {
            if notices.len() >= capacity {
                purge_expired(&mut notices, now);
            }
            if notices.len() >= capacity {
                let evicted = notices.len() + 1 - capacity;
                notices.drain(..evicted);
                metrics::NOTICES_EVICTED_COUNTER.inc_by(evicted as u64);
                warn!(
                    "Notice store at capacity ({}), evicted {} oldest notice(s)",
                    capacity, evicted
                );
            }
        }

        notices.push(notice);
        metrics::NOTICES_ADDED_COUNTER.inc();
        metrics::set_stored(notices.len());
    }

    /// Purge expired notices, then return the remaining ones in insertion order.
    pub fn active_notices(&self, now: DateTime<Utc>) -> Vec<Notice> {
        let mut notices = self.lock();
        let purged = purge_expired(&mut notices, now);
        if purged > 0 {
            debug!("Purged {} expired notice(s) on read", purged);
        }
        notices.clone()
    }

    /// Purge expired notices without returning anything. Returns the
    /// number removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        purge_expired(&mut self.lock(), now)
    }

    /// Stored notices, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for NoticeStore {
    fn default() -> Self {
        Self::new(None)
    }
}

fn purge_expired(notices: &mut Vec<Notice>, now: DateTime<Utc>) -> usize {
    let before = notices.len();
    notices.retain(|n| n.is_active_at(now));
    let purged = before - notices.len();
    if purged > 0 {
        metrics::NOTICES_EXPIRED_COUNTER.inc_by(purged as u64);
        metrics::set_stored(notices.len());
    }
    purged
}
