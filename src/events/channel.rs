//! Event channel built on crossbeam-channel.
//!
//! Workers in the scheduler's pool send through clones of one sender; a
//! single receiver (the CLI) drains them.

use super::Event;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Sending half, cheap to clone into worker threads
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event. Dropped silently once the receiver is gone, so
    /// progress reporting never affects the work being reported on.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half, held by whatever renders progress
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; events are small and the CLI keeps up easily.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(unbounded())
    }

    fn wrap((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone, for runs without progress output
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
