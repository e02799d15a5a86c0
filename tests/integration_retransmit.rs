//! Retransmit decision coverage: the grace tick, every decision branch,
//! and the ownership takeover of a silent remote.

use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use gamestate_sync::{
    AuthorId, AuthoredObject, ConflictAlgorithm, DateTimeMs, GsObject, Loc1, MessageSender,
    Object1, ObjectId, RetransmitCounters, RetransmitReason, Rot1, Tag, Transceiver,
    TransceiverConfig, TransceiverMode, UnknownObject,
};

const LOCAL_AUTHOR: AuthorId = AuthorId(1);
const REMOTE_AUTHOR: AuthorId = AuthorId(2);

/// Short expiry so takeover tests run in a few hundred milliseconds.
const EXPIRY: Duration = Duration::from_millis(100);
const PAST_EXPIRY: Duration = Duration::from_millis(150);

fn object_at(timestamp: DateTimeMs, author: AuthorId) -> AuthoredObject {
    AuthoredObject::new(
        GsObject::Object1(Object1 {
            id: ObjectId(3),
            timestamp,
            location: Loc1::new(0.0, 1.0, 0.0),
            rotation: Rot1::default(),
            scale: Loc1::new(1.0, 1.0, 1.0),
            parent: None,
        }),
        author,
    )
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<AuthoredObject>>,
}

impl RecordingSender {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_author(&self) -> Option<AuthorId> {
        self.sent.lock().unwrap().last().map(|update| update.author)
    }
}

impl MessageSender for RecordingSender {
    fn send_update(&self, update: &AuthoredObject) {
        self.sent.lock().unwrap().push(update.clone());
    }
}

fn counted_transceiver(
    mode: TransceiverMode,
    algorithm: ConflictAlgorithm,
) -> (Transceiver, Arc<RetransmitCounters>, Arc<RecordingSender>) {
    let counters = Arc::new(RetransmitCounters::new());
    let sender = Arc::new(RecordingSender::default());
    let transceiver = Transceiver::new(TransceiverConfig {
        mode,
        algorithm,
        expiry: Some(EXPIRY),
        retransmit_counters: Some(counters.clone()),
        ..Default::default()
    });
    transceiver.attach_sender(sender.clone());
    (transceiver, counters, sender)
}

fn bidirectional() -> (Transceiver, Arc<RetransmitCounters>, Arc<RecordingSender>) {
    counted_transceiver(TransceiverMode::Bidirectional, ConflictAlgorithm::Timestamp)
}

// ========== Grace tick ==========

#[test]
fn first_tick_is_a_grace_period() {
    let (transceiver, counters, sender) = bidirectional();
    transceiver
        .set_local(object_at(DateTimeMs::now(), LOCAL_AUTHOR))
        .unwrap();
    sender.sent.lock().unwrap().clear();

    assert!(!transceiver.retransmit());
    assert_eq!(counters.total(), 0);
    assert_eq!(sender.count(), 0);

    // The second tick reaches the decision.
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NoRemote), 1);
    assert_eq!(sender.count(), 1);
}

// ========== Decision table ==========

#[test]
fn nothing_to_do_without_any_update() {
    let (transceiver, counters, sender) = bidirectional();
    assert!(!transceiver.retransmit()); // grace
    assert!(!transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NoLocal), 1);
    assert_eq!(sender.count(), 0);
}

#[test]
fn local_without_remote_is_retransmitted() {
    let (transceiver, counters, sender) = bidirectional();
    transceiver
        .set_local(object_at(DateTimeMs::now(), LOCAL_AUTHOR))
        .unwrap();
    transceiver.retransmit(); // grace
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NoRemote), 1);
    assert_eq!(sender.count(), 2); // set_local emission plus the retransmit
}

#[test]
fn fresh_remote_without_local_stays_silent() {
    let (transceiver, counters, sender) = bidirectional();
    transceiver.retransmit(); // grace
    transceiver
        .set_remote(object_at(DateTimeMs::now(), REMOTE_AUTHOR))
        .unwrap();
    assert!(!transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NoLocal), 1);
    assert_eq!(sender.count(), 0);
}

#[test]
fn newer_local_is_retransmitted() {
    let (transceiver, counters, sender) = bidirectional();
    let now = DateTimeMs::now();
    transceiver
        .set_remote(object_at(now.saturating_sub_ms(60_000), REMOTE_AUTHOR))
        .unwrap();
    transceiver.set_local(object_at(now, LOCAL_AUTHOR)).unwrap();
    transceiver.retransmit(); // grace
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NewerLocal), 1);
    assert_eq!(sender.last_author(), Some(LOCAL_AUTHOR));
}

#[test]
fn recent_remote_suppresses_retransmission() {
    let (transceiver, counters, sender) = bidirectional();
    let now = DateTimeMs::now();
    transceiver
        .set_local(object_at(now.saturating_sub_ms(60_000), LOCAL_AUTHOR))
        .unwrap();
    transceiver.set_remote(object_at(now, REMOTE_AUTHOR)).unwrap();
    transceiver.retransmit(); // grace
    assert!(!transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::RecentRemote), 1);
    assert_eq!(sender.count(), 1); // only the set_local emission
}

// ========== Takeover ==========

#[test]
fn expired_remote_is_promoted_and_retransmitted() {
    let (transceiver, counters, sender) = bidirectional();
    let now = DateTimeMs::now();
    transceiver
        .set_remote(object_at(now.saturating_sub_ms(30_000), REMOTE_AUTHOR))
        .unwrap();
    transceiver.retransmit(); // grace

    sleep(PAST_EXPIRY);
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::ExpiredRemote), 1);
    // The silent owner's update went out under its original author.
    assert_eq!(sender.last_author(), Some(REMOTE_AUTHOR));

    // The promoted value now renders as the local side.
    let rendered = transceiver.render().expect("promoted value renders");
    assert_eq!(rendered.author, REMOTE_AUTHOR);
}

#[test]
fn expired_remote_beats_an_older_local() {
    let (transceiver, counters, _sender) = bidirectional();
    let now = DateTimeMs::now();
    transceiver
        .set_local(object_at(now.saturating_sub_ms(60_000), LOCAL_AUTHOR))
        .unwrap();
    transceiver
        .set_remote(object_at(now.saturating_sub_ms(30_000), REMOTE_AUTHOR))
        .unwrap();
    transceiver.retransmit(); // grace

    sleep(PAST_EXPIRY);
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::ExpiredRemote), 1);
}

#[test]
fn expired_remote_does_not_displace_a_newer_local() {
    let (transceiver, counters, sender) = bidirectional();
    let now = DateTimeMs::now();
    transceiver
        .set_remote(object_at(now.saturating_sub_ms(30_000), REMOTE_AUTHOR))
        .unwrap();
    // Produce the local strictly after the remote arrived.
    sleep(Duration::from_millis(10));
    transceiver
        .set_local(object_at(DateTimeMs::now(), LOCAL_AUTHOR))
        .unwrap();
    transceiver.retransmit(); // grace

    sleep(PAST_EXPIRY);
    assert!(transceiver.retransmit());
    // The local is newer than the remote ever was: plain retransmission.
    assert_eq!(counters.count(RetransmitReason::ExpiredRemote), 0);
    assert_eq!(counters.count(RetransmitReason::NewerLocal), 1);
    assert_eq!(sender.last_author(), Some(LOCAL_AUTHOR));
}

#[test]
fn takeover_clears_the_remote_side() {
    let (transceiver, counters, _sender) = bidirectional();
    let now = DateTimeMs::now();
    transceiver
        .set_remote(object_at(now.saturating_sub_ms(30_000), REMOTE_AUTHOR))
        .unwrap();
    transceiver.retransmit(); // grace
    sleep(PAST_EXPIRY);
    assert!(transceiver.retransmit());

    // With the remote slot cleared, the next tick sees no remote at all.
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NoRemote), 1);
}

// ========== Directional modes ==========

#[test]
fn receive_only_never_retransmits() {
    let (transceiver, counters, sender) =
        counted_transceiver(TransceiverMode::ReceiveOnly, ConflictAlgorithm::Timestamp);
    transceiver
        .set_remote(object_at(DateTimeMs::now().saturating_sub_ms(30_000), REMOTE_AUTHOR))
        .unwrap();
    sleep(PAST_EXPIRY);
    assert!(!transceiver.retransmit());
    assert!(!transceiver.retransmit());
    assert_eq!(counters.total(), 0);
    assert_eq!(sender.count(), 0);
}

#[test]
fn send_only_retransmits_from_the_first_tick() {
    let (transceiver, _counters, sender) =
        counted_transceiver(TransceiverMode::SendOnly, ConflictAlgorithm::Timestamp);
    // Nothing local yet: nothing to emit.
    assert!(!transceiver.retransmit());

    transceiver
        .set_local(object_at(DateTimeMs::now(), LOCAL_AUTHOR))
        .unwrap();
    // No grace period for a send-only transceiver.
    assert!(transceiver.retransmit());
    assert_eq!(sender.count(), 2);
}

// ========== Latest algorithm ordering ==========

#[test]
fn latest_algorithm_retransmits_when_local_arrived_last() {
    let (transceiver, counters, _sender) =
        counted_transceiver(TransceiverMode::Bidirectional, ConflictAlgorithm::Latest);
    let unknown = |author| {
        AuthoredObject::new(
            GsObject::Unknown(UnknownObject {
                tag: Tag(0x30),
                bytes: vec![1],
            }),
            author,
        )
    };
    transceiver.set_remote(unknown(REMOTE_AUTHOR)).unwrap();
    transceiver.set_local(unknown(LOCAL_AUTHOR)).unwrap();
    transceiver.retransmit(); // grace
    // Arrival tie or later both resolve to the local side.
    assert!(transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::NewerLocal), 1);
}

#[test]
fn latest_algorithm_stays_silent_when_remote_arrived_last() {
    let (transceiver, counters, _sender) =
        counted_transceiver(TransceiverMode::Bidirectional, ConflictAlgorithm::Latest);
    let unknown = |author| {
        AuthoredObject::new(
            GsObject::Unknown(UnknownObject {
                tag: Tag(0x30),
                bytes: vec![2],
            }),
            author,
        )
    };
    transceiver.set_local(unknown(LOCAL_AUTHOR)).unwrap();
    sleep(Duration::from_millis(10));
    transceiver.set_remote(unknown(REMOTE_AUTHOR)).unwrap();
    transceiver.retransmit(); // grace
    assert!(!transceiver.retransmit());
    assert_eq!(counters.count(RetransmitReason::RecentRemote), 1);
}
