// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delegate registry, capability resolver, broadcaster, and multicast proxy.
//!
//! A host owns exactly one delegate slot. [`MulticastAppDelegate`] occupies it
//! and forwards every lifecycle callback to a default delegate plus any number
//! of interceptors, combining their answers with the callback's policy.
//!
//! ```no_run
//! use std::sync::Arc;
//! use multicast_dispatch::{install_shared, shared};
//! # fn demo(host: &dyn multicast_core::DelegateHost, analytics: Arc<impl multicast_core::AppDelegate>) {
//! install_shared(host);
//! shared().add_interceptor(&analytics);
//! # }
//! ```

pub mod broadcaster;
pub mod host;
pub mod proxy;
pub mod registry;
pub mod resolver;

pub use broadcaster::Broadcaster;
pub use host::{
    init_shared, install_shared, installed_multicast_delegate, shared, InstallOutcome,
    InstalledMulticast,
};
pub use proxy::MulticastAppDelegate;
pub use registry::{DelegateKey, DelegateRegistry, Snapshot};
pub use resolver::{implementers, supports, Target};
