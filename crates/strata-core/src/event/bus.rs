// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log;

/// Manages a generic broadcast event channel.
///
/// The bus is generic over the type `T` of event it transports. Each call to
/// [`subscribe`](Self::subscribe) opens a dedicated unbounded flume channel
/// for that subscriber. [`publish`](Self::publish) clones the event into
/// every subscriber's channel, in subscription order, before it returns.
/// No event is ever dropped for a live subscriber, and none is delivered
/// more than once.
pub struct EventBus<T: Clone> {
    senders: Vec<flume::Sender<T>>,
}

impl<T: Clone> EventBus<T> {
    /// Creates a new EventBus with no subscribers.
    ///
    /// ## Returns
    /// A new instance of the EventBus struct.
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Opens a new subscription to this bus.
    ///
    /// ## Returns
    /// The receiving end of a fresh unbounded channel. Dropping the receiver
    /// ends the subscription; the dead sender is pruned on the next publish.
    pub fn subscribe(&mut self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.senders.push(sender);
        receiver
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Delivery is synchronous: the event is enqueued in every subscriber's
    /// channel before this call returns. Subscribers whose receiver has been
    /// dropped are removed here.
    ///
    /// ## Arguments
    /// * `event` - The event to be broadcast over the channels.
    pub fn publish(&mut self, event: T) {
        // The event itself can no longer be formatted without a `Debug` trait
        // bound, which we omit to keep the bus as generic as possible.
        log::trace!(
            "Publishing an event to {} subscriber(s).",
            self.senders.len()
        );

        self.senders
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    /// Returns the number of live subscriptions.
    ///
    /// Subscribers that dropped their receiver are only counted out after the
    /// next publish prunes them.
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
