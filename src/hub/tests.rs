use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use super::message::Message;
use super::room::{DeliveryHandle, Room};
use crate::config::RoomSettings;
use crate::utils::error::HubError;

fn test_settings() -> RoomSettings {
    RoomSettings {
        welcome_line: "Welcome!".to_string(),
        inbound_capacity: 64,
        handle_capacity: 64,
        delivery_timeout_ms: 200,
        publish_timeout_ms: 1_000,
    }
}

async fn next_message(handle: &mut DeliveryHandle) -> Message {
    timeout(Duration::from_secs(2), handle.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("delivery handle closed unexpectedly")
}

/// Receives until a chat snapshot ending with `suffix` arrives, returning
/// every snapshot text seen along the way (roster updates are skipped).
async fn snapshots_until(handle: &mut DeliveryHandle, suffix: &str) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        if let Message::ChatSnapshot { text } = next_message(handle).await {
            seen.push(text.clone());
            if text.ends_with(suffix) {
                return seen;
            }
        }
    }
}

async fn wait_for(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within 2s: {what}");
}

#[test]
fn test_message_wire_shape() {
    let snapshot = Message::ChatSnapshot {
        text: "Welcome!".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&snapshot).unwrap(),
        json!({"type": "chat_snapshot", "text": "Welcome!"})
    );

    let roster = Message::UserListUpdate {
        usernames: vec!["alice".to_string()],
    };
    assert_eq!(
        serde_json::to_value(&roster).unwrap(),
        json!({"type": "user_list_update", "usernames": ["alice"]})
    );
}

#[tokio::test]
async fn test_subscribe_receives_welcome_snapshot() {
    let room = Room::open(&test_settings());
    let mut alice = room.subscribe("alice").await.unwrap();

    assert_eq!(
        next_message(&mut alice).await,
        Message::ChatSnapshot {
            text: "Welcome!".to_string()
        }
    );
}

#[tokio::test]
async fn test_subscribe_pushes_roster_then_join_notice() {
    let room = Room::open(&test_settings());
    let mut alice = room.subscribe("alice").await.unwrap();

    // initial snapshot, then the roster including ourselves
    assert_eq!(
        next_message(&mut alice).await,
        Message::ChatSnapshot {
            text: "Welcome!".to_string()
        }
    );
    assert_eq!(
        next_message(&mut alice).await,
        Message::UserListUpdate {
            usernames: vec!["alice".to_string()]
        }
    );

    // the join notice travels the normal inbound path and comes back as a
    // second, longer snapshot
    let seen = snapshots_until(&mut alice, "alice has joined").await;
    assert_eq!(seen.last().unwrap(), "Welcome!\nalice has joined");
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let room = Room::open(&test_settings());
    let _alice = room.subscribe("alice").await.unwrap();

    let err = room.subscribe("alice").await.unwrap_err();
    assert_eq!(err, HubError::DuplicateSubscription("alice".to_string()));
    assert_eq!(room.subscriber_count(), 1);
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let room = Room::open(&test_settings());

    // unknown username is a no-op, not an error
    room.unsubscribe("ghost");

    let _alice = room.subscribe("alice").await.unwrap();
    assert_eq!(room.subscriber_count(), 1);
    room.unsubscribe("alice");
    room.unsubscribe("alice");
    assert_eq!(room.subscriber_count(), 0);
}

#[tokio::test]
async fn test_published_lines_append_in_order() {
    let room = Room::open(&test_settings());
    let mut alice = room.subscribe("alice").await.unwrap();
    snapshots_until(&mut alice, "alice has joined").await;

    room.publish("alice: one".to_string()).await.unwrap();
    room.publish("alice: two".to_string()).await.unwrap();
    room.publish("alice: three".to_string()).await.unwrap();

    let seen = snapshots_until(&mut alice, "alice: three").await;

    // every snapshot extends the previous one; nothing reordered, nothing lost
    for pair in seen.windows(2) {
        assert!(
            pair[1].starts_with(pair[0].as_str()),
            "snapshot {:?} does not extend {:?}",
            pair[1],
            pair[0]
        );
    }
    assert_eq!(
        seen.last().unwrap(),
        "Welcome!\nalice has joined\nalice: one\nalice: two\nalice: three"
    );
}

#[tokio::test]
async fn test_late_subscriber_gets_full_history() {
    let room = Room::open(&test_settings());
    let mut alice = room.subscribe("alice").await.unwrap();
    snapshots_until(&mut alice, "alice has joined").await;

    room.publish("alice: one".to_string()).await.unwrap();
    room.publish("alice: two".to_string()).await.unwrap();
    let seen = snapshots_until(&mut alice, "alice: two").await;

    // bob's very first message is the history alice has already seen,
    // before any snapshot reflecting later lines
    let mut bob = room.subscribe("bob").await.unwrap();
    assert_eq!(
        next_message(&mut bob).await,
        Message::ChatSnapshot {
            text: seen.last().unwrap().clone()
        }
    );
}

#[tokio::test]
async fn test_scenario_walkthrough() {
    let room = Room::open(&test_settings());

    let mut alice = room.subscribe("alice").await.unwrap();
    assert_eq!(
        next_message(&mut alice).await,
        Message::ChatSnapshot {
            text: "Welcome!".to_string()
        }
    );
    snapshots_until(&mut alice, "alice has joined").await;

    room.publish("alice: hi".to_string()).await.unwrap();
    let alice_seen = snapshots_until(&mut alice, "alice: hi").await;

    let mut bob = room.subscribe("bob").await.unwrap();
    assert_eq!(
        next_message(&mut bob).await,
        Message::ChatSnapshot {
            text: alice_seen.last().unwrap().clone()
        }
    );
    snapshots_until(&mut bob, "bob has joined").await;
    snapshots_until(&mut alice, "bob has joined").await;

    room.unsubscribe("alice");
    room.publish("bob: hello".to_string()).await.unwrap();
    snapshots_until(&mut bob, "bob: hello").await;

    // alice's handle drains whatever was already queued, then closes,
    // and never sees bob's line
    loop {
        match timeout(Duration::from_secs(2), alice.recv())
            .await
            .expect("alice's handle should close after unsubscribe")
        {
            Some(Message::ChatSnapshot { text }) => {
                assert!(!text.contains("bob: hello"));
            }
            Some(Message::UserListUpdate { .. }) => {}
            None => break,
        }
    }
}

#[tokio::test]
async fn test_stalled_subscriber_is_evicted() {
    let settings = RoomSettings {
        handle_capacity: 2,
        delivery_timeout_ms: 100,
        ..test_settings()
    };
    let room = Room::open(&settings);

    let mut bob = room.subscribe("bob").await.unwrap();
    snapshots_until(&mut bob, "bob has joined").await;

    // slow never drains; its two initial messages already fill the handle
    let mut slow = room.subscribe("slow").await.unwrap();

    // bob still sees the join notice even though slow's handle is full
    snapshots_until(&mut bob, "slow has joined").await;
    wait_for("stalled subscriber evicted", || room.subscriber_count() == 1).await;

    // the room keeps moving for the healthy subscriber
    room.publish("bob: still here".to_string()).await.unwrap();
    snapshots_until(&mut bob, "bob: still here").await;

    // eviction closed slow's channel behind the two queued messages
    assert!(matches!(
        next_message(&mut slow).await,
        Message::ChatSnapshot { .. }
    ));
    assert!(matches!(
        next_message(&mut slow).await,
        Message::UserListUpdate { .. }
    ));
    assert_eq!(
        timeout(Duration::from_secs(2), slow.recv())
            .await
            .expect("slow's handle should be closed"),
        None
    );
}

#[tokio::test]
async fn test_dropped_handle_is_evicted_and_name_reusable() {
    let room = Room::open(&test_settings());
    let alice = room.subscribe("alice").await.unwrap();
    drop(alice);

    room.publish("orphan line".to_string()).await.unwrap();
    wait_for("dropped handle evicted", || room.subscriber_count() == 0).await;

    // the username is free again
    let _alice = room.subscribe("alice").await.unwrap();
    assert_eq!(room.subscriber_count(), 1);
}

#[tokio::test]
async fn test_publish_times_out_when_saturated() {
    let settings = RoomSettings {
        inbound_capacity: 1,
        handle_capacity: 2,
        delivery_timeout_ms: 60_000,
        publish_timeout_ms: 100,
        ..test_settings()
    };
    let room = Room::open(&settings);

    // a full, never-drained handle pins the dispatcher inside its long
    // delivery wait as soon as the join notice is committed
    let _slow = room.subscribe("slow").await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    room.publish("one".to_string()).await.unwrap();
    assert_eq!(
        room.publish("two".to_string()).await.unwrap_err(),
        HubError::QueueSaturated
    );
}
