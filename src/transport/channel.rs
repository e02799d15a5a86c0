use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::types::AuthorId;

use super::error::{RecvError, SendError};
use super::{EncodedMessage, Transport};

/// In-process loopback transport.
///
/// Connects a [`Transport`] send side to a polled receive side over an
/// unbounded channel. Used to wire fleets of managers together inside one
/// process, and throughout the test suite.
pub struct PacketChannel;

impl PacketChannel {
    pub fn unbounded(local_identifier: AuthorId) -> (PacketChannelSender, PacketChannelReceiver) {
        let (sender, receiver) = unbounded();
        (
            PacketChannelSender {
                sender,
                local_identifier,
            },
            PacketChannelReceiver { receiver },
        )
    }
}

/// Send half of a loopback pair.
pub struct PacketChannelSender {
    sender: Sender<EncodedMessage>,
    local_identifier: AuthorId,
}

impl Transport for PacketChannelSender {
    fn send(&self, message: &EncodedMessage) -> Result<(), SendError> {
        self.sender.send(message.clone()).map_err(|_| SendError)
    }

    fn local_identifier(&self) -> AuthorId {
        self.local_identifier
    }
}

/// Receive half of a loopback pair.
pub struct PacketChannelReceiver {
    receiver: Receiver<EncodedMessage>,
}

impl PacketChannelReceiver {
    /// Takes the next message if one is queued.
    ///
    /// # Errors
    /// `RecvError` once every send half has been dropped.
    pub fn try_receive(&self) -> Result<Option<EncodedMessage>, RecvError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(RecvError),
        }
    }

    /// Blocks until a message arrives.
    ///
    /// # Errors
    /// `RecvError` once every send half has been dropped.
    pub fn receive(&self) -> Result<EncodedMessage, RecvError> {
        self.receiver.recv().map_err(|_| RecvError)
    }

    /// Drains everything currently queued.
    pub fn drain(&self) -> Vec<EncodedMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }
}
