// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of one callback to every implementing delegate.
//!
//! Each entry point implements one combination policy. All of them filter the
//! snapshot to the delegates implementing the target (in order), call every
//! one of them, and isolate faults per delegate: an `Err` or a panic is logged
//! and the dispatch moves on to the next delegate.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use multicast_config::DispatchConfig;
use multicast_core::{AppDelegate, Completion, DelegateError, Policy};
use tracing::{debug, error, warn};

use crate::registry::Snapshot;
use crate::resolver::{self, Target};

/// Policy-driven dispatcher over registry snapshots.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    isolate_panics: bool,
    slow_threshold: Option<Duration>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            isolate_panics: config.isolate_panics,
            slow_threshold: match config.slow_delegate_warn_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    /// Let panics raised by delegates unwind through the dispatch.
    pub fn with_isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// `void-broadcast`: call every implementer. Returns how many were called.
    pub fn broadcast<F>(&self, snapshot: &Snapshot, target: Target<'_>, mut call: F) -> usize
    where
        F: FnMut(&dyn AppDelegate) -> Result<(), DelegateError>,
    {
        let delegates = resolver::implementers(snapshot, target);
        for delegate in &delegates {
            self.invoke(target, delegate.as_ref(), &mut call);
        }
        delegates.len()
    }

    /// `boolean-or`: true iff any implementer answered true.
    ///
    /// Every implementer is called, even after one has answered true. With no
    /// implementer the policy default of `target` is returned.
    pub fn any<F>(&self, snapshot: &Snapshot, target: Target<'_>, mut call: F) -> bool
    where
        F: FnMut(&dyn AppDelegate) -> Result<bool, DelegateError>,
    {
        let delegates = resolver::implementers(snapshot, target);
        if delegates.is_empty() {
            return match target.policy() {
                Policy::BooleanOr { default } => default,
                _ => false,
            };
        }

        delegates.iter().fold(false, |handled, delegate| {
            let answer = self
                .invoke(target, delegate.as_ref(), &mut call)
                .unwrap_or(false);
            handled | answer
        })
    }

    /// `first-definitive`: the first `Some` answer wins; later implementers
    /// still run for their side effects.
    pub fn first_definitive<T, F>(
        &self,
        snapshot: &Snapshot,
        target: Target<'_>,
        mut call: F,
    ) -> Option<T>
    where
        F: FnMut(&dyn AppDelegate) -> Result<Option<T>, DelegateError>,
    {
        let mut winner = None;
        for delegate in resolver::implementers(snapshot, target) {
            let answer = self.invoke(target, delegate.as_ref(), &mut call).flatten();
            if winner.is_none() {
                winner = answer;
            } else if answer.is_some() {
                debug!(
                    callback = %target,
                    delegate = delegate.name(),
                    "answer discarded, an earlier delegate already decided"
                );
            }
        }
        winner
    }

    /// `single-delivery`: every implementer gets a clone of one fresh gate in
    /// front of `completion`, so `completion` fires at most once no matter
    /// how many delegates call it. Nothing is fabricated if none do.
    ///
    /// Returns how many delegates were called.
    pub fn deliver_once<T, F>(
        &self,
        snapshot: &Snapshot,
        target: Target<'_>,
        completion: &Completion<T>,
        mut call: F,
    ) -> usize
    where
        T: Send + 'static,
        F: FnMut(&dyn AppDelegate, Completion<T>) -> Result<(), DelegateError>,
    {
        let gate = completion.gated();
        let delegates = resolver::implementers(snapshot, target);
        for delegate in &delegates {
            let handle = gate.clone();
            self.invoke(target, delegate.as_ref(), |d: &dyn AppDelegate| call(d, handle));
        }

        if !delegates.is_empty() && !gate.is_completed() {
            debug!(
                callback = %target,
                delegates = delegates.len(),
                "completion still pending after dispatch"
            );
        }
        delegates.len()
    }

    /// Call one delegate, isolating its faults. `None` means it failed.
    fn invoke<R, F>(&self, target: Target<'_>, delegate: &dyn AppDelegate, call: F) -> Option<R>
    where
        F: FnOnce(&dyn AppDelegate) -> Result<R, DelegateError>,
    {
        let started = Instant::now();
        let outcome = if self.isolate_panics {
            catch_unwind(AssertUnwindSafe(|| call(delegate)))
                .unwrap_or_else(|payload| Err(DelegateError::Panicked(panic_message(&*payload))))
        } else {
            call(delegate)
        };
        let elapsed = started.elapsed();

        if let Some(threshold) = self.slow_threshold {
            if elapsed > threshold {
                warn!(
                    callback = %target,
                    delegate = delegate.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "slow delegate blocked dispatch"
                );
            }
        }

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                error!(
                    callback = %target,
                    delegate = delegate.name(),
                    error = %e,
                    "delegate failed, continuing dispatch"
                );
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
