// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot completion gate.
//!
//! A [`Completion`] wraps a continuation the host expects to be called exactly
//! once. Clones share the same gate: the first [`Completion::complete`] runs the
//! continuation, every later call (from any clone, on any thread) is absorbed.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

type Continuation<T> = Box<dyn FnOnce(T) + Send + 'static>;

struct Gate<T> {
    slot: Mutex<Option<Continuation<T>>>,
}

/// A continuation guarded so it fires at most once across all clones.
pub struct Completion<T> {
    gate: Arc<Gate<T>>,
}

impl<T: Send + 'static> Completion<T> {
    /// Wrap `continuation` in a fresh gate.
    pub fn new(continuation: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            gate: Arc::new(Gate {
                slot: Mutex::new(Some(Box::new(continuation))),
            }),
        }
    }

    /// A completion whose continuation does nothing.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Deliver `value`. Returns `true` if this call ran the continuation and
    /// `false` if an earlier call already did.
    pub fn complete(&self, value: T) -> bool {
        // Take under the lock, run outside it: a continuation that re-enters
        // the gate must not deadlock.
        let continuation = self
            .gate
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match continuation {
            Some(continuation) => {
                continuation(value);
                true
            }
            None => {
                debug!("completion already delivered, duplicate call absorbed");
                false
            }
        }
    }

    /// Whether the continuation has already been taken.
    pub fn is_completed(&self) -> bool {
        self.gate
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// A new gate that forwards its single delivery into `self`.
    ///
    /// Used by the broadcaster so each dispatch owns its own gate even when the
    /// host hands in a completion that is itself shared.
    pub fn gated(&self) -> Completion<T> {
        let upstream = self.clone();
        Completion::new(move |value| {
            upstream.complete(value);
        })
    }
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self
            .gate
            .slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("Completion")
            .field("pending", &pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::thread;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_call_wins_and_later_calls_are_absorbed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let completion = Completion::new(move |v: u32| sink.lock().unwrap().push(v));

        assert!(!completion.is_completed());
        assert!(completion.complete(1));
        assert!(!completion.clone().complete(2));
        assert!(completion.is_completed());
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn noop_still_gates_delivery() {
        let completion = Completion::<u8>::noop();
        assert!(!completion.is_completed());
        assert!(completion.complete(1));
        assert!(!completion.complete(2));
        assert!(completion.is_completed());
    }

    #[test]
    fn never_called_never_fires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let completion = Completion::new(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(completion.clone());
        drop(completion);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn gated_forwards_once_into_upstream() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let upstream = Completion::new(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let first = upstream.gated();
        let second = upstream.gated();
        assert!(first.complete(()));
        assert!(!first.complete(()));
        // The second gate fires but upstream absorbs it.
        assert!(second.complete(()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(upstream.is_completed());
    }

    #[test]
    fn concurrent_first_callers_fire_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let completion = Completion::new(move |_: usize| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let completion = completion.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    completion.complete(i)
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continuation_may_reenter_its_own_gate() {
        let slot: Arc<Mutex<Option<Completion<u8>>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let completion = Completion::new(move |v: u8| {
            if let Some(c) = inner.lock().unwrap().as_ref() {
                assert!(!c.complete(v + 1));
            }
        });
        *slot.lock().unwrap() = Some(completion.clone());
        assert!(completion.complete(1));
    }

    proptest! {
        #[test]
        fn delivered_value_is_first_value(values in prop::collection::vec(any::<i32>(), 1..16)) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let completion = Completion::new(move |v: i32| sink.lock().unwrap().push(v));
            for v in &values {
                completion.complete(*v);
            }
            prop_assert_eq!(seen.lock().unwrap().clone(), vec![values[0]]);
        }
    }
}
