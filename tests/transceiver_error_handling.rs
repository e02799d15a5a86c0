//! Transceiver setter error-path coverage: mode violations, future
//! timestamps, and non-monotonic local updates all fail without touching
//! slot state.

use std::sync::{Arc, Mutex};

use gamestate_sync::{
    AuthorId, AuthoredObject, DateTimeMs, GsObject, Loc1, MessageSender, Object1, ObjectId, Rot1,
    Transceiver, TransceiverConfig, TransceiverMode, UpdateError,
};

fn object_at(timestamp: DateTimeMs) -> AuthoredObject {
    AuthoredObject::new(
        GsObject::Object1(Object1 {
            id: ObjectId(1),
            timestamp,
            location: Loc1::new(1.0, 2.0, 3.0),
            rotation: Rot1::default(),
            scale: Loc1::new(1.0, 1.0, 1.0),
            parent: None,
        }),
        AuthorId(7),
    )
}

/// Records every emitted update for assertions.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<AuthoredObject>>,
}

impl RecordingSender {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl MessageSender for RecordingSender {
    fn send_update(&self, update: &AuthoredObject) {
        self.sent.lock().unwrap().push(update.clone());
    }
}

// ========== Mode violations ==========

#[test]
fn receive_only_rejects_set_local() {
    let transceiver = Transceiver::new(TransceiverConfig {
        mode: TransceiverMode::ReceiveOnly,
        ..Default::default()
    });
    let err = transceiver
        .set_local(object_at(DateTimeMs::now()))
        .unwrap_err();
    assert!(matches!(err, UpdateError::ModeViolation { .. }));
    assert_eq!(transceiver.render(), None);
}

#[test]
fn send_only_rejects_set_remote() {
    let transceiver = Transceiver::new(TransceiverConfig {
        mode: TransceiverMode::SendOnly,
        ..Default::default()
    });
    let err = transceiver
        .set_remote(object_at(DateTimeMs::now()))
        .unwrap_err();
    assert!(matches!(err, UpdateError::ModeViolation { .. }));
    assert_eq!(transceiver.render(), None);
}

// ========== Timestamp preconditions ==========

#[test]
fn future_timestamp_is_rejected() {
    let transceiver = Transceiver::new(TransceiverConfig::default());
    let future = DateTimeMs::now().saturating_add_ms(10_000);
    let err = transceiver.set_local(object_at(future)).unwrap_err();
    assert!(matches!(err, UpdateError::FutureTimestamp { .. }));
    assert_eq!(transceiver.render(), None);
}

#[test]
fn non_monotonic_timestamp_is_rejected() {
    let transceiver = Transceiver::new(TransceiverConfig::default());
    let now = DateTimeMs::now();
    transceiver.set_local(object_at(now)).unwrap();
    let err = transceiver
        .set_local(object_at(now.saturating_sub_ms(1_000)))
        .unwrap_err();
    assert_eq!(
        err,
        UpdateError::NonMonotonic {
            timestamp: now.saturating_sub_ms(1_000),
            last: now,
        }
    );
    // State still reflects the first call.
    let rendered = transceiver.render().expect("first update renders");
    assert_eq!(rendered.object.timestamp(), Some(now));
}

#[test]
fn equal_timestamp_is_accepted() {
    let transceiver = Transceiver::new(TransceiverConfig::default());
    let now = DateTimeMs::now();
    transceiver.set_local(object_at(now)).unwrap();
    transceiver.set_local(object_at(now)).unwrap();
}

// ========== Rejections never emit ==========

#[test]
fn rejected_updates_do_not_reach_the_sender() {
    let sender = Arc::new(RecordingSender::default());
    let transceiver = Transceiver::new(TransceiverConfig::default());
    transceiver.attach_sender(sender.clone());

    let now = DateTimeMs::now();
    transceiver.set_local(object_at(now)).unwrap();
    assert_eq!(sender.count(), 1);

    let _ = transceiver.set_local(object_at(now.saturating_sub_ms(5_000)));
    let _ = transceiver.set_local(object_at(now.saturating_add_ms(60_000)));
    assert_eq!(sender.count(), 1);
}

#[test]
fn detached_sender_stops_emission() {
    let sender = Arc::new(RecordingSender::default());
    let transceiver = Transceiver::new(TransceiverConfig::default());
    transceiver.attach_sender(sender.clone());
    transceiver.detach_sender();
    transceiver.set_local(object_at(DateTimeMs::now())).unwrap();
    assert_eq!(sender.count(), 0);
}

// ========== Error display ==========

#[test]
fn update_errors_describe_the_failure() {
    let err = UpdateError::ModeViolation {
        mode: TransceiverMode::ReceiveOnly,
        operation: "set_local",
    };
    let msg = format!("{err}");
    assert!(msg.contains("set_local"));
    assert!(msg.contains("ReceiveOnly"));

    let err = UpdateError::NonMonotonic {
        timestamp: DateTimeMs(5),
        last: DateTimeMs(9),
    };
    let msg = format!("{err}");
    assert!(msg.contains("5ms"));
    assert!(msg.contains("9ms"));
}
