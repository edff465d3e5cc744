//! Process-wide "one selection at a time" gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SessionGate {
    held: Arc<AtomicBool>,
}

/// Proof that the holder owns the only active session.
///
/// Dropping the ticket reopens the gate, so every exit path (commit,
/// cancel, error, unwinding) releases it.
pub struct SessionTicket {
    held: Arc<AtomicBool>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims the gate. Returns `None` if a session is already active.
    pub fn try_acquire(&self) -> Option<SessionTicket> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionTicket {
                held: Arc::clone(&self.held),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_ticket_alive() {
        let gate = SessionGate::new();
        let ticket = gate.try_acquire();
        assert!(ticket.is_some());
        assert!(gate.is_held());
        assert!(gate.try_acquire().is_none());

        drop(ticket);
        assert!(!gate.is_held());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn ticket_released_on_unwind() {
        let gate = SessionGate::new();
        let cloned = gate.clone();
        let result = std::panic::catch_unwind(move || {
            let _ticket = cloned.try_acquire().unwrap();
            panic!("capture blew up");
        });
        assert!(result.is_err());
        assert!(!gate.is_held());
    }

    #[test]
    fn concurrent_triggers_admit_exactly_one() {
        let gate = SessionGate::new();
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    // Keep the ticket alive until every thread has tried.
                    let ticket = gate.try_acquire();
                    let won = ticket.is_some();
                    std::thread::sleep(std::time::Duration::from_millis(50));
                    drop(ticket);
                    won
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }
}
