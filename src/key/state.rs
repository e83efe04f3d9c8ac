//! Shared key state crossing the control/render thread boundary.

use std::sync::atomic::{AtomicBool, Ordering};

/// The one value shared between the control loop and the render loop.
///
/// The control loop is the only writer, the render loop the only reader.
/// No other state crosses the thread boundary, so a single relaxed
/// atomic access per side is sufficient; the render loop only needs the
/// change to become visible within roughly one buffer duration.
#[derive(Debug, Default)]
pub struct KeyState {
    should_play: AtomicBool,
}

impl KeyState {
    /// Create a new key state (tone off).
    pub const fn new() -> Self {
        Self {
            should_play: AtomicBool::new(false),
        }
    }

    /// Whether the sidetone should currently be playing.
    #[inline]
    pub fn get(&self) -> bool {
        self.should_play.load(Ordering::Relaxed)
    }

    /// Set the key state.
    #[inline]
    pub fn set(&self, on: bool) {
        self.should_play.store(on, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_off() {
        assert!(!KeyState::new().get());
    }

    #[test]
    fn set_is_visible() {
        let state = KeyState::new();
        state.set(true);
        assert!(state.get());
        state.set(false);
        assert!(!state.get());
    }

    #[test]
    fn shared_across_threads() {
        let state = Arc::new(KeyState::new());
        let writer = Arc::clone(&state);
        let handle = std::thread::spawn(move || writer.set(true));
        handle.join().unwrap();
        assert!(state.get());
    }
}
