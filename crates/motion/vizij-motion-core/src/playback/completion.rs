//! One-shot completion channel.
//!
//! Observers registered with [`Completion::push`] fire the next time the
//! owning animation reaches a terminal transition. Resolving hands the
//! observers back to the caller and leaves a fresh, empty channel, so
//! observers registered afterwards wait for the next terminal transition.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub type CompletionObserver = Box<dyn FnOnce()>;

#[derive(Default)]
pub struct Completion {
    observers: Vec<CompletionObserver>,
    generation: u64,
}

impl Completion {
    pub fn push(&mut self, observer: CompletionObserver) {
        self.observers.push(observer);
    }

    /// Take the pending observers and start a new channel.
    ///
    /// The caller runs the returned observers after releasing any borrow of
    /// `self`, so observers may register again.
    #[must_use]
    pub fn resolve(&mut self) -> Vec<CompletionObserver> {
        self.generation += 1;
        std::mem::take(&mut self.observers)
    }

    /// Number of times the channel has been resolved.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> usize {
        self.observers.len()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.observers.len())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Run observers taken from [`Completion::resolve`].
pub fn notify(observers: Vec<CompletionObserver>) {
    for observer in observers {
        observer();
    }
}

/// Fires `on_done` after `count` calls to the returned arrivals.
///
/// Used for fan-in over several completion channels; zero members fire at once.
pub fn fan_in(count: usize, on_done: CompletionObserver) -> Vec<CompletionObserver> {
    if count == 0 {
        on_done();
        return Vec::new();
    }
    let remaining = Rc::new(Cell::new(count));
    let on_done = Rc::new(RefCell::new(Some(on_done)));
    (0..count)
        .map(|_| {
            let remaining = Rc::clone(&remaining);
            let on_done = Rc::clone(&on_done);
            Box::new(move || {
                let left = remaining.get().saturating_sub(1);
                remaining.set(left);
                if left == 0 {
                    let done = on_done.borrow_mut().take();
                    if let Some(done) = done {
                        done();
                    }
                }
            }) as CompletionObserver
        })
        .collect()
}
