use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, info, warn};

use crate::config::RoomSettings;
use crate::hub::message::Message;
use crate::utils::error::HubError;

/// The read side of one subscriber's delivery channel.
///
/// Messages arrive in the order the hub committed them. The hub closes the
/// channel only when it evicts the subscriber; until then the stream is
/// never dropped mid-way.
#[derive(Debug)]
pub struct DeliveryHandle {
    rx: mpsc::Receiver<Message>,
}

impl DeliveryHandle {
    /// Waits for the next update. Returns `None` once the hub has evicted
    /// this subscriber and every pending message has been drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

/// History and subscriber registry, guarded as one unit: every fan-out
/// decision reads both under the same lock that mutates them.
#[derive(Debug, Default)]
struct RoomState {
    history: Vec<String>,
    subscribers: HashMap<String, mpsc::Sender<Message>>,
}

/// The single shared chat room.
///
/// The room serializes all mutations: subscribe and unsubscribe take the
/// state lock directly, while published lines pass through one bounded
/// inbound queue drained by the room's dispatcher task. Every committed
/// line produces a [`Message::ChatSnapshot`] of the full history, delivered
/// to exactly the subscribers registered at the instant of the commit.
///
/// No reference to `history` or `subscribers` ever escapes this type;
/// callers interact through the three operations and the handles they get
/// back.
pub struct Room {
    state: Mutex<RoomState>,
    inbound: mpsc::Sender<String>,
    handle_capacity: usize,
    delivery_timeout: Duration,
    publish_timeout: Duration,
}

impl Room {
    /// Opens the room and spawns its dispatcher task. Must be called from
    /// within a Tokio runtime.
    ///
    /// The history starts out holding the configured welcome line, so the
    /// very first subscriber already has something to display.
    pub fn open(settings: &RoomSettings) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel(settings.inbound_capacity.max(1));
        let room = Arc::new(Self {
            state: Mutex::new(RoomState {
                history: vec![settings.welcome_line.clone()],
                subscribers: HashMap::new(),
            }),
            inbound: inbound_tx,
            // subscribe pushes two messages onto a fresh handle before the
            // owner can possibly drain it, so two slots are the floor
            handle_capacity: settings.handle_capacity.max(2),
            delivery_timeout: Duration::from_millis(settings.delivery_timeout_ms),
            publish_timeout: Duration::from_millis(settings.publish_timeout_ms),
        });
        tokio::spawn(Room::dispatch(Arc::clone(&room), inbound_rx));
        room
    }

    /// Registers `username` and returns its delivery handle.
    ///
    /// The handle receives a snapshot of the current history and the updated
    /// roster before anything else, then every later update in commit order.
    /// Everyone already in the room is sent the new roster, and a join
    /// notice for `username` is queued through the normal inbound path, so
    /// it shows up for the whole room (the new subscriber included) as a
    /// second, position-correct snapshot.
    ///
    /// A username that is already registered is rejected with
    /// [`HubError::DuplicateSubscription`] and no state changes.
    pub async fn subscribe(&self, username: &str) -> Result<DeliveryHandle, HubError> {
        let (tx, rx) = mpsc::channel(self.handle_capacity);
        let (roster, others) = {
            let mut state = self.state.lock().expect("room state lock poisoned");
            if state.subscribers.contains_key(username) {
                warn!(%username, "rejecting duplicate subscription");
                return Err(HubError::DuplicateSubscription(username.to_string()));
            }

            // Pushed under the lock: the dispatcher cannot see this handle
            // until the lock is released, so the initial snapshot is
            // guaranteed to precede any snapshot of a longer history. A
            // fresh channel always has room for these two.
            let _ = tx.try_send(Message::ChatSnapshot {
                text: state.history.join("\n"),
            });
            state.subscribers.insert(username.to_string(), tx.clone());
            let roster: Vec<String> = state.subscribers.keys().cloned().collect();
            let _ = tx.try_send(Message::UserListUpdate {
                usernames: roster.clone(),
            });

            let others: Vec<(String, mpsc::Sender<Message>)> = state
                .subscribers
                .iter()
                .filter(|(name, _)| name.as_str() != username)
                .map(|(name, sender)| (name.clone(), sender.clone()))
                .collect();
            (roster, others)
        };

        info!(%username, "subscribed");
        self.deliver(Message::UserListUpdate { usernames: roster }, others)
            .await;
        if let Err(err) = self.publish(format!("{username} has joined")).await {
            warn!(%username, %err, "failed to queue join notice");
        }
        Ok(DeliveryHandle { rx })
    }

    /// Removes `username` from the room.
    ///
    /// Unknown names are a no-op, so calling this twice on teardown is
    /// harmless. Nothing is broadcast on removal: joins are announced,
    /// leaves are not.
    pub fn unsubscribe(&self, username: &str) {
        let removed = {
            let mut state = self.state.lock().expect("room state lock poisoned");
            state.subscribers.remove(username).is_some()
        };
        if removed {
            info!(%username, "unsubscribed");
        }
    }

    /// Queues a raw line for the dispatcher.
    ///
    /// Blocks while the inbound queue is at capacity and gives up with
    /// [`HubError::QueueSaturated`] once the configured wait elapses.
    pub async fn publish(&self, line: String) -> Result<(), HubError> {
        self.inbound
            .send_timeout(line, self.publish_timeout)
            .await
            .map_err(|_| HubError::QueueSaturated)
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state
            .lock()
            .expect("room state lock poisoned")
            .subscribers
            .len()
    }

    /// Drains the inbound queue for the lifetime of the room: commit each
    /// line to history, then fan the new snapshot out to everyone who was
    /// registered at the instant of the commit.
    async fn dispatch(room: Arc<Room>, mut inbound: mpsc::Receiver<String>) {
        while let Some(line) = inbound.recv().await {
            debug!(%line, "committing line");
            let (snapshot, recipients) = {
                let mut state = room.state.lock().expect("room state lock poisoned");
                state.history.push(line);
                let snapshot = Message::ChatSnapshot {
                    text: state.history.join("\n"),
                };
                let recipients: Vec<(String, mpsc::Sender<Message>)> = state
                    .subscribers
                    .iter()
                    .map(|(name, sender)| (name.clone(), sender.clone()))
                    .collect();
                (snapshot, recipients)
            };
            room.deliver(snapshot, recipients).await;
        }
        debug!("inbound queue closed, dispatcher exiting");
    }

    /// Pushes `message` to every recipient, concurrently and without
    /// holding the room lock.
    ///
    /// Each send waits at most the delivery timeout. A handle that is still
    /// full after that, or whose reader is gone, gets its owner evicted, so
    /// one stalled subscriber delays the room by a single bounded wait at
    /// worst.
    async fn deliver(&self, message: Message, recipients: Vec<(String, mpsc::Sender<Message>)>) {
        if recipients.is_empty() {
            return;
        }
        debug!(count = recipients.len(), "delivering update");

        let sends = recipients.iter().map(|(username, sender)| {
            let message = message.clone();
            async move {
                match sender.send_timeout(message, self.delivery_timeout).await {
                    Ok(()) => None,
                    Err(SendTimeoutError::Timeout(_)) => {
                        warn!(%username, "delivery queue saturated, evicting subscriber");
                        Some((username, sender))
                    }
                    Err(SendTimeoutError::Closed(_)) => {
                        debug!(%username, "delivery handle dropped, evicting subscriber");
                        Some((username, sender))
                    }
                }
            }
        });
        let stalled: Vec<(&String, &mpsc::Sender<Message>)> =
            join_all(sends).await.into_iter().flatten().collect();
        if stalled.is_empty() {
            return;
        }

        let mut state = self.state.lock().expect("room state lock poisoned");
        for (username, sender) in stalled {
            // Only drop the registration we actually failed to reach; the
            // name may have been re-registered while we were waiting.
            let still_current = state
                .subscribers
                .get(username)
                .is_some_and(|current| current.same_channel(sender));
            if still_current {
                state.subscribers.remove(username);
                info!(%username, "evicted");
            }
        }
    }
}
