//! Per-object reconciliation state machine.
//!
//! A transceiver holds the latest locally produced and remotely observed
//! update for one object, chooses a single renderable value on demand, and
//! decides on a periodic tick whether it must retransmit on behalf of a
//! silent owner.

pub mod error;
pub mod retransmit;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;

use crate::object::AuthoredObject;
use crate::types::DateTimeMs;

use error::UpdateError;
use retransmit::{RetransmitCounters, RetransmitReason};

/// Direction a transceiver participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransceiverMode {
    /// Both produces and consumes updates (the default).
    #[default]
    Bidirectional,
    /// Only consumes remote updates; local updates are rejected.
    ReceiveOnly,
    /// Only produces local updates; remote updates are rejected.
    SendOnly,
}

/// How local and remote updates are ordered against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictAlgorithm {
    /// Compare the message-carried timestamps (the default for timestamped
    /// variants).
    #[default]
    Timestamp,
    /// Compare wall-clock arrival instants. The only meaningful choice for
    /// untimed variants (meshes, unknown objects).
    Latest,
}

/// Construction parameters for a [`Transceiver`].
#[derive(Clone, Default)]
pub struct TransceiverConfig {
    pub mode: TransceiverMode,
    pub algorithm: ConflictAlgorithm,
    /// Staleness threshold after which a silent remote is eligible for
    /// takeover. Zero makes any previously received remote immediately
    /// eligible on the next tick.
    pub expiry: Option<Duration>,
    /// When set, a render whose winner is the local value yields `None`
    /// instead (the producer has already drawn its own frame).
    pub prerendered: bool,
    /// Emit per-operation debug logs.
    pub debugging: bool,
    /// Optional sink counting which retransmit branch fired on each tick.
    pub retransmit_counters: Option<Arc<RetransmitCounters>>,
}

impl TransceiverConfig {
    /// Default expiry when none is configured.
    pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(1);
}

/// Outbound seam: where a transceiver hands updates that must reach the
/// rest of the fleet.
///
/// The manager installs its encode-and-send path here on registration and
/// detaches it on unregistration. Implementations must swallow transport
/// failures; a transceiver never observes them.
pub trait MessageSender: Send + Sync {
    fn send_update(&self, update: &AuthoredObject);
}

#[derive(Default)]
struct LocalSlot {
    unread: Option<AuthoredObject>,
    last: Option<AuthoredObject>,
    last_time: Option<DateTimeMs>,
    last_retransmit_check: Option<DateTimeMs>,
}

#[derive(Default)]
struct RemoteSlot {
    unread: Option<AuthoredObject>,
    last: Option<AuthoredObject>,
    last_time: Option<DateTimeMs>,
    last_update_received: Option<DateTimeMs>,
}

/// Per-object reconciliation state machine. See the module docs.
///
/// All operations are bounded-work and thread-safe: producers may call
/// [`set_local`](Self::set_local) from any thread while the transport
/// thread calls [`set_remote`](Self::set_remote) and a renderer thread
/// calls [`render`](Self::render).
pub struct Transceiver {
    mode: TransceiverMode,
    algorithm: ConflictAlgorithm,
    expiry_ms: u64,
    prerendered: bool,
    debugging: bool,
    counters: Option<Arc<RetransmitCounters>>,
    local: Mutex<LocalSlot>,
    remote: Mutex<RemoteSlot>,
    sender: Mutex<Option<Arc<dyn MessageSender>>>,
}

impl Transceiver {
    pub fn new(config: TransceiverConfig) -> Self {
        let expiry = config.expiry.unwrap_or(TransceiverConfig::DEFAULT_EXPIRY);
        Transceiver {
            mode: config.mode,
            algorithm: config.algorithm,
            expiry_ms: expiry.as_millis() as u64,
            prerendered: config.prerendered,
            debugging: config.debugging,
            counters: config.retransmit_counters,
            local: Mutex::new(LocalSlot::default()),
            remote: Mutex::new(RemoteSlot::default()),
            sender: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> TransceiverMode {
        self.mode
    }

    pub fn algorithm(&self) -> ConflictAlgorithm {
        self.algorithm
    }

    /// Installs the outbound path. Replaces any previous sender.
    pub fn attach_sender(&self, sender: Arc<dyn MessageSender>) {
        *self.lock_sender() = Some(sender);
    }

    /// Removes the outbound path; subsequent emissions go nowhere.
    pub fn detach_sender(&self) {
        *self.lock_sender() = None;
    }

    /// Stores a locally produced update and emits it to the fleet.
    ///
    /// # Errors
    /// - `ModeViolation` on a receive-only transceiver.
    /// - `FutureTimestamp` when the carried timestamp is ahead of the wall
    ///   clock (Timestamp algorithm).
    /// - `NonMonotonic` when the carried timestamp went backward
    ///   (Timestamp algorithm).
    ///
    /// On any rejection the slots are unchanged and nothing is emitted.
    pub fn set_local(&self, update: AuthoredObject) -> Result<(), UpdateError> {
        if self.mode == TransceiverMode::ReceiveOnly {
            return Err(UpdateError::ModeViolation {
                mode: self.mode,
                operation: "set_local",
            });
        }
        let now = DateTimeMs::now();
        let time = self.update_time(&update, now);
        {
            let mut local = self.lock_local();
            if self.algorithm == ConflictAlgorithm::Timestamp {
                if let Some(carried) = update.object.timestamp() {
                    if carried > now {
                        return Err(UpdateError::FutureTimestamp {
                            timestamp: carried,
                            now,
                        });
                    }
                    if let Some(last) = local.last_time {
                        if carried < last {
                            return Err(UpdateError::NonMonotonic {
                                timestamp: carried,
                                last,
                            });
                        }
                    }
                }
            }
            local.unread = Some(update.clone());
            local.last = Some(update.clone());
            local.last_time = Some(time);
        }
        if self.debugging {
            debug!(
                "set_local tag {} author {} at {}",
                update.object.tag(),
                update.author,
                time
            );
        }
        self.emit(&update);
        Ok(())
    }

    /// Stores an update observed from another peer, recording its arrival
    /// instant for staleness tracking.
    ///
    /// # Errors
    /// `ModeViolation` on a send-only transceiver; slots unchanged.
    pub fn set_remote(&self, update: AuthoredObject) -> Result<(), UpdateError> {
        if self.mode == TransceiverMode::SendOnly {
            return Err(UpdateError::ModeViolation {
                mode: self.mode,
                operation: "set_remote",
            });
        }
        let now = DateTimeMs::now();
        let time = self.update_time(&update, now);
        {
            let mut remote = self.lock_remote();
            remote.unread = Some(update.clone());
            remote.last = Some(update.clone());
            remote.last_time = Some(time);
            remote.last_update_received = Some(now);
        }
        if self.debugging {
            debug!(
                "set_remote tag {} author {} at {}",
                update.object.tag(),
                update.author,
                time
            );
        }
        Ok(())
    }

    /// Produces the single renderable value for this object, if any.
    ///
    /// Destructive: both unread slots are empty on return regardless of the
    /// outcome; the retained `last` values are untouched.
    pub fn render(&self) -> Option<AuthoredObject> {
        let mut local = self.lock_local();
        let mut remote = self.lock_remote();

        let local_unread = local.unread.take();
        let remote_unread = remote.unread.take();
        let local_time = local.last_time;
        let remote_time = remote.last_time;
        let remote_seen = remote_time.is_some();
        let local_seen = local_time.is_some();
        drop(remote);
        drop(local);

        let local_wins = match self.mode {
            TransceiverMode::SendOnly => local_unread.map(|update| (update, true)),
            TransceiverMode::ReceiveOnly => remote_unread.map(|update| (update, false)),
            TransceiverMode::Bidirectional => match (local_unread, remote_unread) {
                (None, None) => None,
                (Some(update), None) => {
                    // A local older than remote data we already surfaced
                    // must not flicker back in.
                    if remote_seen && local_time < remote_time {
                        None
                    } else {
                        Some((update, true))
                    }
                }
                (None, Some(update)) => {
                    if local_seen && remote_time < local_time {
                        None
                    } else {
                        Some((update, false))
                    }
                }
                (Some(local_update), Some(remote_update)) => {
                    // Ties favor the local side.
                    if local_time >= remote_time {
                        Some((local_update, true))
                    } else {
                        Some((remote_update, false))
                    }
                }
            },
        };

        match local_wins {
            Some((_, true)) if self.prerendered => None,
            Some((update, _)) => Some(update),
            None => None,
        }
    }

    /// Runs one tick of the takeover/ownership decision.
    ///
    /// Returns whether an update was emitted. The very first tick of a
    /// bidirectional transceiver is a grace period giving remote updates a
    /// chance to land before this peer assumes ownership.
    pub fn retransmit(&self) -> bool {
        match self.mode {
            TransceiverMode::ReceiveOnly => return false,
            TransceiverMode::SendOnly => {
                let candidate = self.lock_local().last.clone();
                return match candidate {
                    Some(update) => {
                        self.emit(&update);
                        true
                    }
                    None => false,
                };
            }
            TransceiverMode::Bidirectional => {}
        }

        let now = DateTimeMs::now();
        let (message, reason) = {
            let mut local = self.lock_local();
            let mut remote = self.lock_remote();

            if local.last_retransmit_check.is_none() {
                local.last_retransmit_check = Some(now);
                return false;
            }
            local.last_retransmit_check = Some(now);

            self.decide(&mut local, &mut remote, now)
        };

        if let Some(counters) = &self.counters {
            if let Some(reason) = reason {
                counters.record(reason);
            }
        }
        if self.debugging {
            debug!("retransmit decision: {:?} (emitting: {})", reason, message.is_some());
        }

        match message {
            Some(update) => {
                self.emit(&update);
                true
            }
            None => false,
        }
    }

    /// The retransmit decision proper. Caller holds both slot locks.
    fn decide(
        &self,
        local: &mut LocalSlot,
        remote: &mut RemoteSlot,
        now: DateTimeMs,
    ) -> (Option<AuthoredObject>, Option<RetransmitReason>) {
        let cutoff = now.saturating_sub_ms(self.expiry_ms);

        // Takeover: the remote owner went silent and our local view (if
        // any) is older than what that owner last told us.
        if let Some(received) = remote.last_update_received {
            if received < cutoff {
                let local_is_older = match (local.last.is_some(), local.last_time) {
                    (false, _) => true,
                    (true, Some(local_time)) => local_time < received,
                    (true, None) => false,
                };
                if local_is_older {
                    if let Some(promoted) = remote.last.take() {
                        local.unread = Some(promoted.clone());
                        local.last = Some(promoted.clone());
                        local.last_time = remote.last_time;
                        remote.unread = None;
                        remote.last_time = None;
                        remote.last_update_received = None;
                        return (Some(promoted), Some(RetransmitReason::ExpiredRemote));
                    }
                }
            }
        }

        let Some(candidate) = local.last.clone() else {
            return (None, Some(RetransmitReason::NoLocal));
        };

        let remote_time = match self.algorithm {
            ConflictAlgorithm::Timestamp => remote.last_time,
            ConflictAlgorithm::Latest => remote.last_update_received,
        };
        let Some(remote_time) = remote_time else {
            return (Some(candidate), Some(RetransmitReason::NoRemote));
        };

        let local_time = local.last_time.unwrap_or_default();
        let local_is_newer = match self.algorithm {
            ConflictAlgorithm::Timestamp => local_time > remote_time,
            // An exact tie goes to the local side under arrival ordering.
            ConflictAlgorithm::Latest => local_time >= remote_time,
        };
        if local_is_newer {
            (Some(candidate), Some(RetransmitReason::NewerLocal))
        } else {
            (None, Some(RetransmitReason::RecentRemote))
        }
    }

    /// The slot time an update is ordered by under the configured
    /// algorithm: the message-carried timestamp when comparing timestamps,
    /// the wall clock otherwise. Untimed variants always use the wall
    /// clock.
    fn update_time(&self, update: &AuthoredObject, now: DateTimeMs) -> DateTimeMs {
        match self.algorithm {
            ConflictAlgorithm::Timestamp => update.object.timestamp().unwrap_or(now),
            ConflictAlgorithm::Latest => now,
        }
    }

    fn emit(&self, update: &AuthoredObject) {
        let sender = self.lock_sender().clone();
        if let Some(sender) = sender {
            sender.send_update(update);
        }
    }

    // A panic cannot leave a slot half-written (every store is a whole
    // Option assignment), so a poisoned guard still holds consistent state.
    fn lock_local(&self) -> MutexGuard<'_, LocalSlot> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_remote(&self) -> MutexGuard<'_, RemoteSlot> {
        self.remote.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<Arc<dyn MessageSender>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
