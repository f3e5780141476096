// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for delegates, the multicast proxy, and host slots.

pub mod delegate;
pub mod host;
pub mod multicast;

pub use delegate::{AppDelegate, DelegateHandle};
pub use host::DelegateHost;
pub use multicast::MulticastDelegate;
