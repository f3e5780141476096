// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability resolution against a registry snapshot.
//!
//! Answers "does anyone implement this callback?" from the delegates'
//! declarations alone, without invoking the callback.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use multicast_core::{AppDelegate, Callback, Policy};
use tracing::error;

use crate::registry::Snapshot;

/// What is being dispatched: a callback from the table or a custom event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Callback(Callback),
    Event(&'a str),
}

impl Target<'_> {
    /// Combination policy for this target. Custom events broadcast.
    pub fn policy(&self) -> Policy {
        match self {
            Target::Callback(callback) => callback.policy(),
            Target::Event(_) => Policy::VoidBroadcast,
        }
    }

    /// Whether `delegate` declares it implements this target.
    ///
    /// A panicking declaration counts as "not implemented" and is logged.
    pub fn is_implemented_by(&self, delegate: &dyn AppDelegate) -> bool {
        let claimed = catch_unwind(AssertUnwindSafe(|| match self {
            Target::Callback(callback) => delegate.responds_to(*callback),
            Target::Event(event) => delegate.responds_to_event(event),
        }));

        claimed.unwrap_or_else(|_| {
            error!(
                callback = %self,
                delegate = delegate.name(),
                "capability check panicked, treating delegate as not implementing"
            );
            false
        })
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Callback(callback) => f.write_str(callback.selector()),
            Target::Event(event) => write!(f, "event:{event}"),
        }
    }
}

impl From<Callback> for Target<'_> {
    fn from(callback: Callback) -> Self {
        Target::Callback(callback)
    }
}

/// True iff at least one delegate in `snapshot` implements `target`.
pub fn supports(snapshot: &Snapshot, target: Target<'_>) -> bool {
    snapshot.iter().any(|d| target.is_implemented_by(d.as_ref()))
}

/// The delegates in `snapshot` implementing `target`, in dispatch order.
pub fn implementers(snapshot: &Snapshot, target: Target<'_>) -> Vec<Arc<dyn AppDelegate>> {
    snapshot
        .iter()
        .filter(|d| target.is_implemented_by(d.as_ref()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use multicast_core::{Application, DelegateError};

    use super::*;

    struct Claims {
        name: &'static str,
        callbacks: Vec<Callback>,
        events: Vec<&'static str>,
        invoked: AtomicUsize,
    }

    impl Claims {
        fn new(name: &'static str, callbacks: Vec<Callback>) -> Arc<dyn AppDelegate> {
            Arc::new(Self {
                name,
                callbacks,
                events: vec!["shortcut"],
                invoked: AtomicUsize::new(0),
            })
        }
    }

    impl AppDelegate for Claims {
        fn name(&self) -> &str {
            self.name
        }

        fn responds_to(&self, callback: Callback) -> bool {
            self.callbacks.contains(&callback)
        }

        fn responds_to_event(&self, event: &str) -> bool {
            self.events.iter().any(|e| *e == event)
        }

        fn did_become_active(&self, _app: &Application) -> Result<(), DelegateError> {
            self.invoked.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanickyClaim;

    impl AppDelegate for PanickyClaim {
        fn responds_to(&self, _callback: Callback) -> bool {
            panic!("broken declaration")
        }
    }

    #[test]
    fn supports_iff_any_delegate_claims() {
        let snapshot = Snapshot::new(vec![
            Claims::new("d", vec![Callback::DidBecomeActive]),
            Claims::new("i1", vec![Callback::OpenUrl]),
            Claims::new("i2", vec![]),
        ]);

        assert!(supports(&snapshot, Callback::OpenUrl.into()));
        assert!(supports(&snapshot, Callback::DidBecomeActive.into()));
        assert!(!supports(&snapshot, Callback::WillTerminate.into()));
        assert!(supports(&snapshot, Target::Event("shortcut")));
        assert!(!supports(&snapshot, Target::Event("other")));
    }

    #[test]
    fn empty_snapshot_supports_nothing() {
        assert!(!supports(&Snapshot::default(), Callback::OpenUrl.into()));
    }

    #[test]
    fn implementers_preserve_order() {
        let snapshot = Snapshot::new(vec![
            Claims::new("a", vec![Callback::OpenUrl]),
            Claims::new("b", vec![]),
            Claims::new("c", vec![Callback::OpenUrl, Callback::WillTerminate]),
        ]);
        let names: Vec<_> = implementers(&snapshot, Callback::OpenUrl.into())
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn resolution_never_invokes_callbacks() {
        let claims = Arc::new(Claims {
            name: "a",
            callbacks: vec![Callback::DidBecomeActive],
            events: vec![],
            invoked: AtomicUsize::new(0),
        });
        let snapshot = Snapshot::new(vec![claims.clone() as Arc<dyn AppDelegate>]);
        for _ in 0..3 {
            assert!(supports(&snapshot, Callback::DidBecomeActive.into()));
        }
        assert_eq!(claims.invoked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_declaration_is_not_an_implementer() {
        let snapshot = Snapshot::new(vec![
            Arc::new(PanickyClaim) as Arc<dyn AppDelegate>,
            Claims::new("ok", vec![Callback::OpenUrl]),
        ]);
        assert_eq!(implementers(&snapshot, Callback::OpenUrl.into()).len(), 1);
    }

    #[test]
    fn target_display_uses_selector() {
        assert_eq!(
            Target::Callback(Callback::OpenUrl).to_string(),
            "application:openURL:options:"
        );
        assert_eq!(Target::Event("shortcut").to_string(), "event:shortcut");
        assert_eq!(Target::Event("x").policy(), Policy::VoidBroadcast);
    }
}
