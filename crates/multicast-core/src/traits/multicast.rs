// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interceptor management exposed by a multicast proxy.

use std::sync::Arc;

use crate::traits::delegate::AppDelegate;

/// Registration surface of a multicast delegate.
///
/// Reached through [`AppDelegate::as_multicast`] so components can find the
/// proxy behind whatever the host currently holds in its delegate slot.
pub trait MulticastDelegate: Send + Sync {
    /// Add an interceptor. Re-adding an interceptor that is already present
    /// is a no-op. The proxy keeps only a non-owning handle.
    fn register_interceptor(&self, interceptor: &Arc<dyn AppDelegate>);

    /// Remove an interceptor by identity. Removing an absent one is a no-op.
    fn unregister_interceptor(&self, interceptor: &Arc<dyn AppDelegate>);

    /// Number of live interceptors currently registered.
    fn interceptor_count(&self) -> usize;

    /// The delegates a dispatch started now would reach, default first.
    fn members(&self) -> Vec<Arc<dyn AppDelegate>>;
}
