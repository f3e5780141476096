// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The host's single delegate slot.

use std::sync::Arc;

use crate::traits::delegate::AppDelegate;

/// A host object that owns exactly one delegate slot.
///
/// The multicast proxy installs itself here, keeping whatever delegate the
/// host already had as its default delegate.
pub trait DelegateHost: Send + Sync {
    /// The delegate currently installed, if any.
    fn delegate(&self) -> Option<Arc<dyn AppDelegate>>;

    /// Replace the installed delegate.
    fn set_delegate(&self, delegate: Option<Arc<dyn AppDelegate>>);
}
