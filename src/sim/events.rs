//! Engine events and listener registration
//!
//! The engine announces everything it does to the board through a single
//! ordered event stream. Renderers, score keepers and effects subscribe to
//! an `EventChannel` and react in their own time; the engine never waits.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::board::BallId;
use super::matcher::MatchShape;
use crate::GridPos;
use crate::level::BallColor;

/// Everything the engine reports, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridEvent {
    /// A match is about to be cleared. Raised before any of its balls pop.
    MatchFound {
        shape: MatchShape,
        count: usize,
        color: BallColor,
        positions: Vec<GridPos>,
        /// Cascade round that produced the match (0 = the move itself)
        chain: u32,
    },
    /// One matched ball removed from the board
    BallPopped {
        pos: GridPos,
        ball: BallId,
        color: BallColor,
        match_count: usize,
    },
    /// One gravity step: a ball dropped a single cell
    BallMoved {
        ball: BallId,
        from: GridPos,
        to: GridPos,
    },
    /// A refill placed a new ball
    BallSpawned {
        pos: GridPos,
        ball: BallId,
        color: BallColor,
    },
    /// A swap produced no match and was undone
    SwapReverted { a: GridPos, b: GridPos },
    /// Resolution finished (also raised after a reverted swap)
    ProcessingComplete {
        total_matches: u32,
        total_score: u32,
        had_chain_reaction: bool,
    },
    /// Raised after `ProcessingComplete` when more than one round resolved
    ComboCompleted { chain_count: u32, total_matches: u32 },
}

/// Receives events from a channel
pub trait EventListener<T> {
    fn on_event(&mut self, event: &T);
}

impl<T, F: FnMut(&T)> EventListener<T> for F {
    fn on_event(&mut self, event: &T) {
        self(event)
    }
}

/// Shared handle to a listener. Identity is the allocation, so the same
/// handle cannot be registered twice.
pub type SharedListener<T> = Rc<RefCell<dyn EventListener<T>>>;

/// Ordered listener list.
///
/// Listeners fire last-registered first.
pub struct EventChannel<T> {
    listeners: Vec<SharedListener<T>>,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    fn position(&self, listener: &SharedListener<T>) -> Option<usize> {
        self.listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(listener)))
    }

    /// Add a listener. Returns false if it was already registered.
    pub fn register(&mut self, listener: SharedListener<T>) -> bool {
        if self.position(&listener).is_some() {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unregister(&mut self, listener: &SharedListener<T>) -> bool {
        match self.position(listener) {
            Some(i) => {
                self.listeners.remove(i);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every listener, newest registration first
    pub fn raise(&self, event: &T) {
        for listener in self.listeners.iter().rev() {
            listener.borrow_mut().on_event(event);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Listener that records every event it receives
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<GridEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log already wrapped for registration
    pub fn shared() -> Rc<RefCell<EventLog>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Drain recorded events
    pub fn take(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn matches_found(&self) -> usize {
        self.count(|e| matches!(e, GridEvent::MatchFound { .. }))
    }

    pub fn balls_popped(&self) -> usize {
        self.count(|e| matches!(e, GridEvent::BallPopped { .. }))
    }

    pub fn balls_moved(&self) -> usize {
        self.count(|e| matches!(e, GridEvent::BallMoved { .. }))
    }

    pub fn balls_spawned(&self) -> usize {
        self.count(|e| matches!(e, GridEvent::BallSpawned { .. }))
    }

    pub fn count(&self, pred: impl Fn(&GridEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventListener<GridEvent> for EventLog {
    fn on_event(&mut self, event: &GridEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(tag: &'static str, out: Rc<RefCell<Vec<&'static str>>>) -> SharedListener<u32> {
        Rc::new(RefCell::new(move |_: &u32| out.borrow_mut().push(tag)))
    }

    #[test]
    fn test_fires_last_registered_first() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::new();
        channel.register(recorder("a", order.clone()));
        channel.register(recorder("b", order.clone()));
        channel.register(recorder("c", order.clone()));

        channel.raise(&1);
        assert_eq!(*order.borrow(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_no_duplicate_registration() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::new();
        let listener = recorder("a", order.clone());

        assert!(channel.register(listener.clone()));
        assert!(!channel.register(listener.clone()));
        assert_eq!(channel.len(), 1);

        channel.raise(&1);
        assert_eq!(order.borrow().len(), 1);
    }

    #[test]
    fn test_unregister() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::new();
        let a = recorder("a", order.clone());
        let b = recorder("b", order.clone());
        channel.register(a.clone());
        channel.register(b.clone());

        assert!(channel.unregister(&a));
        assert!(!channel.unregister(&a));
        channel.raise(&1);
        assert_eq!(*order.borrow(), vec!["b"]);

        channel.clear();
        assert!(channel.is_empty());
    }

    #[test]
    fn test_event_log_records() {
        let log = EventLog::shared();
        let mut channel: EventChannel<GridEvent> = EventChannel::new();
        channel.register(log.clone());

        channel.raise(&GridEvent::SwapReverted {
            a: crate::grid_pos(0, 0),
            b: crate::grid_pos(1, 0),
        });
        channel.raise(&GridEvent::ComboCompleted {
            chain_count: 2,
            total_matches: 3,
        });

        assert_eq!(log.borrow().events.len(), 2);
        assert_eq!(
            log.borrow()
                .count(|e| matches!(e, GridEvent::ComboCompleted { .. })),
            1
        );
        assert_eq!(log.borrow_mut().take().len(), 2);
        assert!(log.borrow().events.is_empty());
    }
}
