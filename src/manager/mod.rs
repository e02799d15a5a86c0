//! Frame multiplexer.
//!
//! The manager owns the registry of transceivers, routes decoded inbound
//! frames to the right one, encodes outbound updates onto the transport,
//! and drives the periodic retransmit tick across every registered
//! transceiver.

pub mod error;
pub mod timed;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::{debug, warn};

use crate::codec::{Decoder, Encoder};
use crate::object::{AuthoredObject, GsObject};
use crate::transceiver::{MessageSender, Transceiver};
use crate::transport::{EncodedMessage, Transport};
use crate::types::{AuthorId, ObjectId, Tag};

use error::RegistrationError;

/// An inbound frame the registry had no transceiver for.
///
/// Hosts drain these with [`Manager::take_events`], typically to create
/// and register a transceiver, then let the next update flow to it.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// A recognized variant arrived whose identity is unregistered.
    UnregisteredUpdate(AuthoredObject),
    /// An unknown-tag frame arrived whose tag is unregistered.
    UnregisteredUnknown(AuthoredObject),
}

#[derive(Default)]
struct Registry {
    by_id: HashMap<ObjectId, Arc<Transceiver>>,
    by_tag: HashMap<Tag, Arc<Transceiver>>,
}

impl Registry {
    fn all(&self) -> Vec<Arc<Transceiver>> {
        // Registration is exclusive, so the two maps never share an entry.
        self.by_id
            .values()
            .chain(self.by_tag.values())
            .cloned()
            .collect()
    }
}

/// Multiplexes transceivers over one transport. See the module docs.
pub struct Manager {
    outbound: Arc<OutboundPath>,
    registry: RwLock<Registry>,
    events: Mutex<VecDeque<ManagerEvent>>,
    debugging: bool,
}

impl Manager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_debugging(transport, false)
    }

    pub fn with_debugging(transport: Arc<dyn Transport>, debugging: bool) -> Self {
        Manager {
            outbound: Arc::new(OutboundPath { transport }),
            registry: RwLock::new(Registry::default()),
            events: Mutex::new(VecDeque::new()),
            debugging,
        }
    }

    /// The author id this peer stamps on updates it produces itself.
    pub fn local_identifier(&self) -> AuthorId {
        self.outbound.transport.local_identifier()
    }

    /// Registers a transceiver under an object identity and wires its
    /// outbound path to the transport.
    ///
    /// # Errors
    /// Rejects the null identity and identities that are already taken;
    /// the transceiver is left unattached in both cases.
    pub fn register(
        &self,
        id: ObjectId,
        transceiver: Arc<Transceiver>,
    ) -> Result<(), RegistrationError> {
        if id.is_null() {
            return Err(RegistrationError::NullIdentity);
        }
        let mut registry = self.write_registry();
        if registry.by_id.contains_key(&id) {
            return Err(RegistrationError::DuplicateIdentity { id });
        }
        transceiver.attach_sender(self.outbound.clone());
        registry.by_id.insert(id, transceiver);
        Ok(())
    }

    /// Registers a transceiver for a raw unknown-space tag.
    ///
    /// # Errors
    /// Rejects tags below the unknown floor and tags that are already
    /// taken.
    pub fn register_tag(
        &self,
        tag: Tag,
        transceiver: Arc<Transceiver>,
    ) -> Result<(), RegistrationError> {
        if !tag.is_unknown_space() {
            return Err(RegistrationError::ReservedTag { tag });
        }
        let mut registry = self.write_registry();
        if registry.by_tag.contains_key(&tag) {
            return Err(RegistrationError::DuplicateTag { tag });
        }
        transceiver.attach_sender(self.outbound.clone());
        registry.by_tag.insert(tag, transceiver);
        Ok(())
    }

    /// Removes a transceiver, detaching it from the send routing. The
    /// transceiver stops participating in retransmits.
    pub fn unregister(&self, id: ObjectId) -> Option<Arc<Transceiver>> {
        let removed = self.write_registry().by_id.remove(&id);
        if let Some(transceiver) = &removed {
            transceiver.detach_sender();
        }
        removed
    }

    pub fn unregister_tag(&self, tag: Tag) -> Option<Arc<Transceiver>> {
        let removed = self.write_registry().by_tag.remove(&tag);
        if let Some(transceiver) = &removed {
            transceiver.detach_sender();
        }
        removed
    }

    /// Handles one inbound message from the transport.
    ///
    /// Decodes a single frame and assigns it to the registered
    /// transceiver's remote slot, or queues an unregistered event. Decode
    /// failures are logged and the frame dropped; the manager stays
    /// usable.
    pub fn receive(&self, message: &EncodedMessage) {
        let mut decoder = Decoder::new(&message.bytes);
        let object = match decoder.decode() {
            Ok(Some(object)) => object,
            Ok(None) => {
                debug!("empty frame from author {}", message.author);
                return;
            }
            Err(err) => {
                warn!("dropping frame from author {}: {}", message.author, err);
                return;
            }
        };
        if self.debugging {
            debug!(
                "received tag {} from author {}",
                object.tag(),
                message.author
            );
        }
        self.dispatch(AuthoredObject::new(object, message.author));
    }

    fn dispatch(&self, update: AuthoredObject) {
        let target = {
            let registry = self.read_registry();
            match &update.object {
                GsObject::Unknown(unknown) => registry.by_tag.get(&unknown.tag).cloned(),
                object => object.id().and_then(|id| registry.by_id.get(&id).cloned()),
            }
        };

        match target {
            Some(transceiver) => {
                if let Err(err) = transceiver.set_remote(update) {
                    warn!("remote update rejected: {}", err);
                }
            }
            None => {
                let unknown = matches!(update.object, GsObject::Unknown(_));
                let event = if unknown {
                    ManagerEvent::UnregisteredUnknown(update)
                } else {
                    ManagerEvent::UnregisteredUpdate(update)
                };
                self.lock_events().push_back(event);
            }
        }
    }

    /// Drains the queued unregistered-frame events.
    pub fn take_events(&self) -> Vec<ManagerEvent> {
        self.lock_events().drain(..).collect()
    }

    /// Runs one retransmit tick over every registered transceiver.
    ///
    /// Returns how many transceivers emitted an update. Individual
    /// transceivers cannot affect each other's tick.
    pub fn retransmit_all(&self) -> usize {
        let transceivers = self.read_registry().all();
        let mut emitted = 0;
        for transceiver in transceivers {
            if transceiver.retransmit() {
                emitted += 1;
            }
        }
        if self.debugging {
            debug!("retransmit tick: {} emissions", emitted);
        }
        emitted
    }

    /// Detaches every transceiver from the send routing and clears the
    /// registry. Runs automatically on drop.
    pub fn dispose(&self) {
        let mut registry = self.write_registry();
        for transceiver in registry.by_id.values().chain(registry.by_tag.values()) {
            transceiver.detach_sender();
        }
        registry.by_id.clear();
        registry.by_tag.clear();
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_events(&self) -> MutexGuard<'_, VecDeque<ManagerEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Encode-and-send path installed into registered transceivers.
///
/// Failures stop here: they are logged and never propagate back into the
/// emitting transceiver.
struct OutboundPath {
    transport: Arc<dyn Transport>,
}

impl MessageSender for OutboundPath {
    fn send_update(&self, update: &AuthoredObject) {
        let mut encoder = Encoder::new();
        if let Err(err) = encoder.encode(&update.object) {
            warn!(
                "dropping outbound tag {} update: {}",
                update.object.tag(),
                err
            );
            return;
        }
        let message = EncodedMessage {
            bytes: encoder.into_bytes(),
            author: update.author,
        };
        if let Err(err) = self.transport.send(&message) {
            warn!("transport send failed: {}", err);
        }
    }
}
