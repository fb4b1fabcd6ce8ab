//! Channel-backed event stream.
//!
//! Lets async consumers follow registry notifications with `StreamExt::next`
//! or inside `tokio::select!` instead of inspecting a log after the fact.

use super::events::{EventSink, RegistryEvent};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Stream of registry events.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<RegistryEvent>,
}

impl EventStream {
    /// Create a stream and the sink that feeds it.
    ///
    /// Register the sink with the registry; the stream ends once the sink
    /// (and therefore the registry holding it) is dropped.
    ///
    /// The channel is unbounded so that `notify` never blocks a registry
    /// write. Events queue until polled: a stream that is held but never
    /// read grows by one event per successful write. Drop it to stop.
    pub fn new() -> (Self, EventStreamSink) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, EventStreamSink { sender })
    }
}

impl Stream for EventStream {
    type Item = RegistryEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Sender side of an [`EventStream`].
pub struct EventStreamSink {
    sender: mpsc::UnboundedSender<RegistryEvent>,
}

impl EventSink for EventStreamSink {
    fn notify(&self, event: &RegistryEvent) {
        // A dropped stream just means nobody is listening any more.
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!(event = event.name(), "event stream closed, dropping event");
        }
    }
}
