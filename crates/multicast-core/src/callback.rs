// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Callback identifiers and the per-callback combination policy table.
//!
//! Every callback of the delegate surface is listed here together with the
//! rule used to merge the answers of several delegates into the single answer
//! the host expects. Selectors outside the table are treated as
//! [`Policy::VoidBroadcast`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::MulticastError;

/// Identifies one lifecycle callback of the delegate surface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Callback {
    FinishLaunching,
    OpenUrl,
    ContinueUserActivity,
    DidBecomeActive,
    DidEnterBackground,
    WillTerminate,
    RegisteredForRemoteNotifications,
    FailedToRegisterForRemoteNotifications,
    ReceivedRemoteNotification,
    WillPresentNotification,
    ReceivedNotificationResponse,
    ConfigurationForConnecting,
}

/// Rule for merging several delegates' answers into one answer for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Every implementer is invoked; nothing is returned.
    VoidBroadcast,
    /// True iff any implementer returned true; `default` when none exist.
    BooleanOr { default: bool },
    /// Every implementer is invoked; the first `Some` answer wins.
    FirstDefinitive,
    /// The completion handed in by the host fires at most once across all
    /// implementers.
    SingleDelivery,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::VoidBroadcast => write!(f, "void-broadcast"),
            Policy::BooleanOr { default } => write!(f, "boolean-or (default {default})"),
            Policy::FirstDefinitive => write!(f, "first-definitive"),
            Policy::SingleDelivery => write!(f, "single-delivery"),
        }
    }
}

/// A callback together with its host selector and combination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallbackDescriptor {
    pub callback: Callback,
    pub selector: &'static str,
    pub policy: Policy,
}

impl Callback {
    /// The host-side selector this callback is delivered under.
    pub fn selector(self) -> &'static str {
        match self {
            Callback::FinishLaunching => "application:didFinishLaunchingWithOptions:",
            Callback::OpenUrl => "application:openURL:options:",
            Callback::ContinueUserActivity => {
                "application:continueUserActivity:restorationHandler:"
            }
            Callback::DidBecomeActive => "applicationDidBecomeActive:",
            Callback::DidEnterBackground => "applicationDidEnterBackground:",
            Callback::WillTerminate => "applicationWillTerminate:",
            Callback::RegisteredForRemoteNotifications => {
                "application:didRegisterForRemoteNotificationsWithDeviceToken:"
            }
            Callback::FailedToRegisterForRemoteNotifications => {
                "application:didFailToRegisterForRemoteNotificationsWithError:"
            }
            Callback::ReceivedRemoteNotification => {
                "application:didReceiveRemoteNotification:fetchCompletionHandler:"
            }
            Callback::WillPresentNotification => {
                "userNotificationCenter:willPresentNotification:withCompletionHandler:"
            }
            Callback::ReceivedNotificationResponse => {
                "userNotificationCenter:didReceiveNotificationResponse:withCompletionHandler:"
            }
            Callback::ConfigurationForConnecting => {
                "application:configurationForConnectingSceneSession:options:"
            }
        }
    }

    /// The combination policy declared for this callback.
    pub fn policy(self) -> Policy {
        match self {
            Callback::FinishLaunching | Callback::OpenUrl | Callback::ContinueUserActivity => {
                Policy::BooleanOr { default: false }
            }
            Callback::DidBecomeActive
            | Callback::DidEnterBackground
            | Callback::WillTerminate
            | Callback::RegisteredForRemoteNotifications
            | Callback::FailedToRegisterForRemoteNotifications => Policy::VoidBroadcast,
            Callback::ReceivedRemoteNotification
            | Callback::WillPresentNotification
            | Callback::ReceivedNotificationResponse => Policy::SingleDelivery,
            Callback::ConfigurationForConnecting => Policy::FirstDefinitive,
        }
    }

    pub fn descriptor(self) -> CallbackDescriptor {
        CallbackDescriptor {
            callback: self,
            selector: self.selector(),
            policy: self.policy(),
        }
    }

    /// Look a callback up by its host selector.
    pub fn from_selector(selector: &str) -> Result<Callback, MulticastError> {
        Callback::iter()
            .find(|c| c.selector() == selector)
            .ok_or_else(|| MulticastError::UnknownSelector(selector.to_string()))
    }
}

/// The full policy table, in declaration order.
pub fn policy_table() -> Vec<CallbackDescriptor> {
    Callback::iter().map(Callback::descriptor).collect()
}

/// Policy for an arbitrary selector; unclassified selectors broadcast.
pub fn policy_for_selector(selector: &str) -> Policy {
    Callback::from_selector(selector)
        .map(Callback::policy)
        .unwrap_or(Policy::VoidBroadcast)
}
