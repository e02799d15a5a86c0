use std::sync::atomic::{AtomicU64, Ordering};

/// Which branch of the retransmit decision fired on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetransmitReason {
    /// The remote went silent past the expiry threshold; its last value was
    /// promoted into the local slot and re-emitted.
    ExpiredRemote,
    /// Nothing local has ever been set; nothing to retransmit.
    NoLocal,
    /// No remote has been seen; the last local was re-emitted.
    NoRemote,
    /// The last local is newer than the last remote; re-emitted.
    NewerLocal,
    /// A remote at least as new as the local exists; stayed silent.
    RecentRemote,
}

/// Per-branch counters for the retransmit decision, shared across threads.
///
/// Supply one through `TransceiverConfig` to observe how often each branch
/// fires; useful when tuning expiry intervals across a fleet.
#[derive(Debug, Default)]
pub struct RetransmitCounters {
    expired_remote: AtomicU64,
    no_local: AtomicU64,
    no_remote: AtomicU64,
    newer_local: AtomicU64,
    recent_remote: AtomicU64,
}

impl RetransmitCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, reason: RetransmitReason) {
        self.counter(reason).fetch_add(1, Ordering::Relaxed);
    }

    /// How many ticks resolved to `reason`.
    pub fn count(&self, reason: RetransmitReason) -> u64 {
        self.counter(reason).load(Ordering::Relaxed)
    }

    /// Total ticks that reached the decision (grace ticks excluded).
    pub fn total(&self) -> u64 {
        [
            RetransmitReason::ExpiredRemote,
            RetransmitReason::NoLocal,
            RetransmitReason::NoRemote,
            RetransmitReason::NewerLocal,
            RetransmitReason::RecentRemote,
        ]
        .iter()
        .map(|&reason| self.count(reason))
        .sum()
    }

    fn counter(&self, reason: RetransmitReason) -> &AtomicU64 {
        match reason {
            RetransmitReason::ExpiredRemote => &self.expired_remote,
            RetransmitReason::NoLocal => &self.no_local,
            RetransmitReason::NoRemote => &self.no_remote,
            RetransmitReason::NewerLocal => &self.newer_local,
            RetransmitReason::RecentRemote => &self.recent_remote,
        }
    }
}
