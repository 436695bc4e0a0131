/**
 * Real-time Broadcast Groups
 *
 * One `tokio::sync::broadcast` channel per group, created on first use.
 * Groups are keyed by case (everyone joined to that case) or by user
 * (every connection of that user, used for personal notifications).
 *
 * Publishing never blocks and never fails the caller: a group without
 * receivers simply drops the event. Groups left without receivers are
 * pruned by `cleanup_inactive_groups`, which the server runs periodically.
 */

use crate::shared::RealtimeEvent;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Events buffered per group before slow receivers start lagging
const GROUP_CAPACITY: usize = 100;

/// Broadcast group identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Case(i64),
    User(i64),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Case(id) => write!(f, "case_{}", id),
            GroupKey::User(id) => write!(f, "user_{}", id),
        }
    }
}

/// Registry of broadcast groups
#[derive(Clone, Default)]
pub struct CaseGroups {
    channels: Arc<Mutex<HashMap<GroupKey, broadcast::Sender<RealtimeEvent>>>>,
}

impl CaseGroups {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GroupKey, broadcast::Sender<RealtimeEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get or create the sender of a group
    pub fn get_sender(&self, key: GroupKey) -> broadcast::Sender<RealtimeEvent> {
        self.lock()
            .entry(key)
            .or_insert_with(|| broadcast::channel(GROUP_CAPACITY).0)
            .clone()
    }

    /// Receive every event published to the group from now on
    pub fn subscribe(&self, key: GroupKey) -> broadcast::Receiver<RealtimeEvent> {
        self.get_sender(key).subscribe()
    }

    /// Publish to a group; returns how many receivers got the event
    pub fn publish(&self, key: GroupKey, event: RealtimeEvent) -> usize {
        let sender = self.lock().get(&key).cloned();
        match sender.map(|s| s.send(event)) {
            Some(Ok(count)) => {
                tracing::debug!("[Realtime] Event delivered to {} receivers in {}", count, key);
                count
            }
            _ => {
                tracing::debug!("[Realtime] No receivers in {}", key);
                0
            }
        }
    }

    /// Drop groups nobody listens to; returns how many were removed
    pub fn cleanup_inactive_groups(&self) -> usize {
        let mut channels = self.lock();
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }

    /// Receivers currently subscribed to a group
    pub fn subscriber_count(&self, key: GroupKey) -> usize {
        self.lock().get(&key).map(|s| s.receiver_count()).unwrap_or(0)
    }

    /// Number of live groups
    pub fn group_count(&self) -> usize {
        self.lock().len()
    }
}
