//! Change notification for cached patient listings.

use std::sync::atomic::{AtomicBool, Ordering};

/// Receives a signal after every successful patient mutation.
pub trait ChangeNotifier {
    fn patients_changed(&self);
}

/// Notifier that ignores changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn patients_changed(&self) {}
}

/// Flag marking the patient list view stale until someone takes it.
#[derive(Debug, Default)]
pub struct StaleFlag(AtomicBool);

impl StaleFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return whether the list was stale and clear the flag.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

impl ChangeNotifier for StaleFlag {
    fn patients_changed(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}
