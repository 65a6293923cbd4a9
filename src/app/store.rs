use std::sync::mpsc::{self, Receiver, Sender};

use super::model::PlaybackState;

/// Observable holder of the current `PlaybackState`.
///
/// Every effective change bumps the revision and sends a snapshot to all live
/// subscribers. Updates that leave the state unchanged publish nothing.
pub struct StateStore {
    current: PlaybackState,
    revision: u64,
    subscribers: Vec<Sender<PlaybackState>>,
}

impl StateStore {
    pub fn new(initial: PlaybackState) -> Self {
        Self {
            current: initial,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> &PlaybackState {
        &self.current
    }

    /// Number of effective updates so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receive a snapshot after every future change.
    pub fn subscribe(&mut self) -> Receiver<PlaybackState> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Apply `f` and publish if anything changed. Returns whether it did.
    pub fn update(&mut self, f: impl FnOnce(&mut PlaybackState)) -> bool {
        let mut next = self.current.clone();
        f(&mut next);
        if next == self.current {
            return false;
        }

        self.current = next;
        self.revision += 1;
        let snapshot = &self.current;
        // Dropped receivers are pruned here.
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        true
    }
}
