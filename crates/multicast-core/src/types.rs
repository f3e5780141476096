// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argument and result types passed between the host and its delegates.
//!
//! These are opaque to the multicast layer: the proxy hands them through to
//! every delegate unmodified.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Event-specific options mapping supplied by the host (launch options,
/// open-URL options, scene connection options).
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Handle to the host application object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Application {
    /// Bundle or process identifier of the host application.
    pub id: String,
}

impl Application {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Handle to the host's user notification center.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationCenter {
    pub id: String,
}

/// A user activity handed over for continuation (handoff, universal links).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    /// Reverse-DNS activity type.
    pub activity_type: String,
    /// Web page URL associated with the activity, if any.
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub user_info: Options,
}

/// Result reported through a remote-notification fetch completion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FetchResult {
    NewData,
    NoData,
    Failed,
}

/// How a notification should be presented while the app is in the foreground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresentationOptions {
    pub badge: bool,
    pub sound: bool,
    pub banner: bool,
    pub list: bool,
}

impl PresentationOptions {
    /// Present nothing.
    pub const NONE: Self = Self {
        badge: false,
        sound: false,
        banner: false,
        list: false,
    };

    /// Present with every available style.
    pub const ALL: Self = Self {
        badge: true,
        sound: true,
        banner: true,
        list: true,
    };
}

/// A delivered user notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub identifier: String,
    /// Raw notification payload (`aps` dictionary and custom keys).
    pub payload: serde_json::Value,
}

/// The user's response to a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notification: Notification,
    /// Identifier of the action the user picked (the default action if they
    /// just tapped the notification).
    pub action_identifier: String,
}

/// A scene session that the host is about to connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSession {
    pub persistent_identifier: String,
    pub role: String,
}

/// A scene configuration answer for [`SceneSession`] connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConfiguration {
    pub name: String,
    pub role: String,
    /// Name of the scene delegate type to instantiate, if any.
    pub delegate_class: Option<String>,
}

/// Error reported by the host when remote notification registration fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationError {
    pub code: i64,
    pub message: String,
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}
