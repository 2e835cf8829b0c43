//! Single-shot completion handle.
//!
//! [`completion`] returns a [`Resumer`] to hand to a callback API and a
//! [`Suspended`] future for the task that waits on it. The first
//! [`Resumer::resume`] delivers the value and wakes the task; any later one is
//! rejected with [`DoubleResume`]. If every resumer is dropped without
//! resuming, the task is woken with [`Abandoned`] instead of hanging.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use crate::error::{Abandoned, DoubleResume};

pub fn completion<T>() -> (Resumer<T>, Suspended<T>) {
    let slot = Arc::new(Slot {
        consumed: AtomicBool::new(false),
        state: Mutex::new(State::Waiting(None)),
    });

    let resumer = Resumer(Arc::new(Guard(slot.clone())));
    let suspended = Suspended(slot);

    (resumer, suspended)
}

enum State<T> {
    Waiting(Option<Waker>),
    Resumed(T),
    Abandoned,
    Taken,
}

struct Slot<T> {
    consumed: AtomicBool,
    state: Mutex<State<T>>,
}

impl<T> Slot<T> {
    fn state(&self) -> MutexGuard<'_, State<T>> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn settle(&self, next: State<T>) {
        let waker = match std::mem::replace(&mut *self.state(), next) {
            State::Waiting(waker) => waker,
            _ => None,
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Shared by every clone of a [`Resumer`]; abandons the slot when the last one goes.
struct Guard<T>(Arc<Slot<T>>);

impl<T> Drop for Guard<T> {
    fn drop(&mut self) {
        if !self.0.consumed.swap(true, Ordering::AcqRel) {
            self.0.settle(State::Abandoned);
        }
    }
}

/// Resumes the [`Suspended`] side exactly once.
///
/// Clones share the consumed flag, so only one resume across all of them succeeds.
pub struct Resumer<T>(Arc<Guard<T>>);

impl<T> Clone for Resumer<T> {
    fn clone(&self) -> Self {
        Resumer(self.0.clone())
    }
}

impl<T> Resumer<T> {
    /// Delivers `value` to the waiting task.
    ///
    /// A second call drops `value` and returns `Err(DoubleResume)`; the value
    /// already delivered is left untouched.
    pub fn resume(&self, value: T) -> Result<(), DoubleResume> {
        let slot = &(self.0).0;
        if slot.consumed.swap(true, Ordering::AcqRel) {
            return Err(DoubleResume);
        }
        slot.settle(State::Resumed(value));
        Ok(())
    }

    pub fn is_consumed(&self) -> bool {
        (self.0).0.consumed.load(Ordering::Acquire)
    }
}

/// Resolves once the matching [`Resumer`] resumes or is abandoned.
pub struct Suspended<T>(Arc<Slot<T>>);

impl<T> Future for Suspended<T> {
    type Output = Result<T, Abandoned>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.0.state();
        match std::mem::replace(&mut *state, State::Taken) {
            State::Waiting(_) => {
                *state = State::Waiting(Some(cx.waker().clone()));
                Poll::Pending
            }
            State::Resumed(value) => Poll::Ready(Ok(value)),
            State::Abandoned => Poll::Ready(Err(Abandoned)),
            State::Taken => panic!("`Suspended` polled after completion"),
        }
    }
}
