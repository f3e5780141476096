// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the multicast app delegate.
//!
//! This crate provides the delegate trait surface, the callback policy table,
//! the one-shot completion gate, and the value types exchanged with the host.
//! The proxy that fans callbacks out lives in `multicast-dispatch`.

pub mod callback;
pub mod completion;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use callback::{policy_for_selector, policy_table, Callback, CallbackDescriptor, Policy};
pub use completion::Completion;
pub use error::{DelegateError, MulticastError};
pub use types::{
    Application, FetchResult, Notification, NotificationCenter, NotificationResponse, Options,
    PresentationOptions, RegistrationError, SceneConfiguration, SceneSession, UserActivity,
};

pub use traits::{AppDelegate, DelegateHandle, DelegateHost, MulticastDelegate};
