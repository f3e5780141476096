// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for multicast integration tests.
//!
//! Provides a scriptable delegate and a host stand-in for fast,
//! deterministic tests of the proxy without a real application runtime.
//!
//! # Components
//!
//! - [`RecordingDelegate`] - Delegate with a configurable callback set, scripted
//!   answers, fault injection, and a call log
//! - [`MockHost`] - Single delegate slot that queries capabilities before
//!   invoking, the way a real host does

pub mod mock_host;
pub mod recording;

pub use mock_host::{Delivery, MockHost};
pub use recording::{CallLog, RecordingDelegate};
