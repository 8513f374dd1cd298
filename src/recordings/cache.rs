//! Cached recordings list
//!
//! Keeps the newest-first list in memory and drops it whenever the manager
//! reports a write, so readers refetch only after something changed.

use super::manager::{RecordingEvent, RecordingManager};
use super::schema::RecordingMetadata;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub struct RecordingsCache {
    manager: Arc<RecordingManager>,
    events: Mutex<broadcast::Receiver<RecordingEvent>>,
    cached: RwLock<Option<Vec<RecordingMetadata>>>,
}

impl RecordingsCache {
    pub fn new(manager: Arc<RecordingManager>) -> Self {
        let events = manager.subscribe();
        Self {
            manager,
            events: Mutex::new(events),
            cached: RwLock::new(None),
        }
    }

    /// The current list, refetched if any write happened since the last fetch
    pub async fn get(&self) -> Vec<RecordingMetadata> {
        if self.drain_events() {
            self.invalidate();
        }

        let cached = self.cached.read().clone();
        if let Some(recordings) = cached {
            return recordings;
        }

        let fresh = self.manager.get_recordings().await;
        tracing::debug!("Recordings cache refilled with {} entries", fresh.len());
        *self.cached.write() = Some(fresh.clone());
        fresh
    }

    /// Force the next `get` to refetch
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    /// Consume pending events; true if any arrived or some were missed
    fn drain_events(&self) -> bool {
        let mut events = self.events.lock();
        let mut stale = false;
        loop {
            match events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => stale = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        stale
    }
}
