// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock host for deterministic testing.
//!
//! `MockHost` owns one delegate slot and drives lifecycle events through it
//! the way an application runtime does: it asks `responds_to` first and only
//! invokes callbacks the delegate claims. Skipped callbacks are recorded.

use std::sync::{Arc, Mutex, PoisonError};

use multicast_core::{
    AppDelegate, Application, Callback, Completion, DelegateHost, FetchResult, Notification,
    NotificationCenter, NotificationResponse, Options, PresentationOptions, RegistrationError,
    SceneConfiguration, SceneSession, UserActivity,
};
use tracing::warn;

/// Values delivered to a completion the host handed out.
#[derive(Debug)]
pub struct Delivery<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Delivery<T> {
    fn new() -> (Self, Completion<T>) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);
        let completion = Completion::new(move |value| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(value);
        });
        (Self { values }, completion)
    }

    /// Every value the continuation received. At most one for a proxy.
    pub fn values(&self) -> Vec<T> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A single delegate slot plus helpers that fire lifecycle events into it.
pub struct MockHost {
    slot: Mutex<Option<Arc<dyn AppDelegate>>>,
    app: Application,
    center: NotificationCenter,
    skipped: Mutex<Vec<Callback>>,
}

impl MockHost {
    /// An empty host for application `app_id`.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(None),
            app: Application::new(app_id),
            center: NotificationCenter::default(),
            skipped: Mutex::new(Vec::new()),
        }
    }

    /// A host whose slot already holds `delegate`.
    pub fn with_delegate(delegate: Arc<dyn AppDelegate>) -> Self {
        let host = Self::new("com.example.host");
        host.set_delegate(Some(delegate));
        host
    }

    pub fn app(&self) -> &Application {
        &self.app
    }

    /// Callbacks the host did not invoke because the delegate disclaimed them.
    pub fn skipped(&self) -> Vec<Callback> {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The delegate, if it claims `callback`.
    fn claimant(&self, callback: Callback) -> Option<Arc<dyn AppDelegate>> {
        let delegate = self.delegate()?;
        if delegate.responds_to(callback) {
            Some(delegate)
        } else {
            self.skipped
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(callback);
            None
        }
    }

    pub fn launch(&self, options: &Options) -> bool {
        self.claimant(Callback::FinishLaunching)
            .map(|d| d.did_finish_launching(&self.app, options))
            .map_or(false, |r| answered(Callback::FinishLaunching, r))
    }

    pub fn open_url(&self, url: &str) -> bool {
        self.claimant(Callback::OpenUrl)
            .map(|d| d.open_url(&self.app, url, &Options::new()))
            .map_or(false, |r| answered(Callback::OpenUrl, r))
    }

    pub fn continue_activity(&self, activity: &UserActivity) -> bool {
        self.claimant(Callback::ContinueUserActivity)
            .map(|d| d.continue_user_activity(&self.app, activity))
            .map_or(false, |r| answered(Callback::ContinueUserActivity, r))
    }

    pub fn become_active(&self) {
        if let Some(d) = self.claimant(Callback::DidBecomeActive) {
            answered(Callback::DidBecomeActive, d.did_become_active(&self.app));
        }
    }

    pub fn enter_background(&self) {
        if let Some(d) = self.claimant(Callback::DidEnterBackground) {
            answered(Callback::DidEnterBackground, d.did_enter_background(&self.app));
        }
    }

    pub fn terminate(&self) {
        if let Some(d) = self.claimant(Callback::WillTerminate) {
            answered(Callback::WillTerminate, d.will_terminate(&self.app));
        }
    }

    pub fn register_remote_notifications(&self, device_token: &[u8]) {
        let callback = Callback::RegisteredForRemoteNotifications;
        if let Some(d) = self.claimant(callback) {
            answered(
                callback,
                d.did_register_for_remote_notifications(&self.app, device_token),
            );
        }
    }

    pub fn fail_remote_registration(&self, error: &RegistrationError) {
        let callback = Callback::FailedToRegisterForRemoteNotifications;
        if let Some(d) = self.claimant(callback) {
            answered(
                callback,
                d.did_fail_to_register_for_remote_notifications(&self.app, error),
            );
        }
    }

    /// Deliver a remote notification; the returned delivery collects what the
    /// fetch completion received.
    pub fn deliver_remote_notification(&self, payload: &serde_json::Value) -> Delivery<FetchResult> {
        let (delivery, completion) = Delivery::new();
        let callback = Callback::ReceivedRemoteNotification;
        if let Some(d) = self.claimant(callback) {
            answered(
                callback,
                d.did_receive_remote_notification(&self.app, payload, completion),
            );
        }
        delivery
    }

    pub fn present_notification(&self, notification: &Notification) -> Delivery<PresentationOptions> {
        let (delivery, completion) = Delivery::new();
        let callback = Callback::WillPresentNotification;
        if let Some(d) = self.claimant(callback) {
            answered(
                callback,
                d.will_present_notification(&self.center, notification, completion),
            );
        }
        delivery
    }

    pub fn respond_to_notification(&self, response: &NotificationResponse) -> Delivery<()> {
        let (delivery, completion) = Delivery::new();
        let callback = Callback::ReceivedNotificationResponse;
        if let Some(d) = self.claimant(callback) {
            answered(
                callback,
                d.did_receive_notification_response(&self.center, response, completion),
            );
        }
        delivery
    }

    pub fn connect_scene(&self, session: &SceneSession) -> Option<SceneConfiguration> {
        let callback = Callback::ConfigurationForConnecting;
        self.claimant(callback)
            .map(|d| d.configuration_for_connecting(&self.app, session, &Options::new()))
            .and_then(|r| answered(callback, r))
    }

    /// Forward a custom event. Returns whether the delegate claimed it.
    pub fn send_event(&self, event: &str, payload: &serde_json::Value) -> bool {
        let Some(delegate) = self.delegate() else {
            return false;
        };
        if !delegate.responds_to_event(event) {
            return false;
        }
        if let Err(e) = delegate.handle_event(&self.app, event, payload) {
            warn!(event, error = %e, "delegate failed to handle event");
        }
        true
    }
}

impl DelegateHost for MockHost {
    fn delegate(&self) -> Option<Arc<dyn AppDelegate>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_delegate(&self, delegate: Option<Arc<dyn AppDelegate>>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = delegate;
    }
}

/// Unwrap a delegate answer, logging errors the way a host swallows them.
fn answered<T: Default>(callback: Callback, result: Result<T, multicast_core::DelegateError>) -> T {
    result.unwrap_or_else(|e| {
        warn!(%callback, error = %e, "delegate returned an error to the host");
        T::default()
    })
}
