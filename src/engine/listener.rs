use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use super::types::Notification;

/// The single notification slot shared between an engine handle and its thread.
///
/// Emission happens under the lock, so once `detach` returns no further
/// notification can be delivered.
#[derive(Clone, Default)]
pub(crate) struct Listener {
    slot: Arc<Mutex<Option<Sender<Notification>>>>,
}

impl Listener {
    pub(crate) fn attach(&self, tx: Sender<Notification>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(tx);
        }
    }

    pub(crate) fn detach(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_attached(&self) -> bool {
        self.slot.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Deliver `n` to the attached listener. Returns whether it was delivered.
    /// A listener whose receiver is gone is detached.
    pub(crate) fn emit(&self, n: Notification) -> bool {
        let Ok(mut slot) = self.slot.lock() else {
            return false;
        };
        match slot.as_ref() {
            Some(tx) => {
                if tx.send(n).is_ok() {
                    true
                } else {
                    *slot = None;
                    false
                }
            }
            None => false,
        }
    }
}
