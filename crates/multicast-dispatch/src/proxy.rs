// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The multicast proxy installed in the host's delegate slot.
//!
//! [`MulticastAppDelegate`] implements the whole [`AppDelegate`] surface. Each
//! capability query resolves against a fresh registry snapshot, and each
//! invocation dispatches with the callback's policy against a snapshot taken
//! when the invocation starts.

use std::collections::HashSet;
use std::sync::Arc;

use multicast_config::{CapabilityMode, DispatchConfig};
use multicast_core::{
    AppDelegate, Application, Callback, Completion, DelegateError, DelegateHandle, FetchResult,
    MulticastDelegate, MulticastError, Notification, NotificationCenter, NotificationResponse, Options, PresentationOptions,
    RegistrationError, SceneConfiguration, SceneSession, UserActivity,
};
use tracing::{debug, warn};

use crate::broadcaster::Broadcaster;
use crate::registry::{DelegateKey, DelegateRegistry, Snapshot};
use crate::resolver::{self, Target};

/// Fans every host callback out to a default delegate and its interceptors.
///
/// Interceptors are held weakly: the caller keeps its delegate alive and
/// removes it before teardown. A dropped interceptor simply stops receiving
/// callbacks.
#[derive(Debug, Default)]
pub struct MulticastAppDelegate {
    registry: DelegateRegistry,
    broadcaster: Broadcaster,
    capability_mode: CapabilityMode,
}

impl MulticastAppDelegate {
    /// A proxy with no default delegate and default dispatch settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A proxy wrapping `default`.
    pub fn with_default(default: Arc<dyn AppDelegate>) -> Self {
        Self {
            registry: DelegateRegistry::with_default(default),
            ..Self::default()
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            registry: DelegateRegistry::new(),
            broadcaster: Broadcaster::from_config(config),
            capability_mode: config.capability_mode,
        }
    }

    pub fn capability_mode(&self) -> CapabilityMode {
        self.capability_mode
    }

    /// Replace the default delegate, returning the previous one.
    ///
    /// A delegate that leads back to this proxy, directly or through nested
    /// multicasts, is refused and the current default is kept.
    pub fn set_default(
        &self,
        delegate: Option<Arc<dyn AppDelegate>>,
    ) -> Result<Option<Arc<dyn AppDelegate>>, MulticastError> {
        if let Some(candidate) = &delegate {
            if self.leads_back(candidate) {
                warn!(
                    default = candidate.name(),
                    "refusing a default delegate that dispatches back into this proxy"
                );
                return Err(MulticastError::InvalidInput(format!(
                    "default delegate `{}` would dispatch back into the multicast proxy",
                    candidate.name()
                )));
            }
        }
        Ok(self.registry.set_default(delegate))
    }

    pub fn default_delegate(&self) -> Option<Arc<dyn AppDelegate>> {
        self.registry.default_delegate()
    }

    /// Register `delegate` as an interceptor. Returns `true` if it was added.
    ///
    /// Registering twice is a no-op, as is registering the current default.
    /// Registering this proxy, or any multicast whose members lead back to it
    /// through [`AppDelegate::as_multicast`], is refused.
    pub fn add_interceptor(&self, delegate: &impl DelegateHandle) -> bool {
        self.insert_interceptor(&delegate.to_delegate())
    }

    /// Unregister `delegate`. Returns `true` if it was registered.
    pub fn remove_interceptor<D: ?Sized>(&self, delegate: &Arc<D>) -> bool {
        self.registry.remove_interceptor(delegate)
    }

    pub fn registry(&self) -> &DelegateRegistry {
        &self.registry
    }

    /// The delegates a dispatch started now would reach.
    pub fn snapshot(&self) -> Snapshot {
        self.registry.snapshot()
    }

    fn insert_interceptor(&self, delegate: &Arc<dyn AppDelegate>) -> bool {
        if self.leads_back(delegate) {
            warn!(
                interceptor = delegate.name(),
                "refusing an interceptor that dispatches back into this proxy"
            );
            return false;
        }
        self.registry.add_interceptor(delegate)
    }

    /// Whether dispatching to `delegate` can reach this proxy again.
    fn leads_back(&self, delegate: &Arc<dyn AppDelegate>) -> bool {
        let me = DelegateKey::of_ref(self);
        let mut seen = HashSet::new();
        let mut pending = vec![Arc::clone(delegate)];

        while let Some(next) = pending.pop() {
            let key = DelegateKey::of(&next);
            if key == me {
                return true;
            }
            if !seen.insert(key) {
                continue;
            }
            if let Some(multicast) = next.as_multicast() {
                if DelegateKey::of_ref(multicast) == me {
                    return true;
                }
                pending.extend(multicast.members());
            }
        }
        false
    }

    fn supports(&self, target: Target<'_>) -> bool {
        let supported = resolver::supports(&self.snapshot(), target);
        debug!(callback = %target, supported, "capability query");
        supported
    }
}

impl MulticastDelegate for MulticastAppDelegate {
    fn register_interceptor(&self, interceptor: &Arc<dyn AppDelegate>) {
        self.insert_interceptor(interceptor);
    }

    fn unregister_interceptor(&self, interceptor: &Arc<dyn AppDelegate>) {
        self.registry.remove_interceptor(interceptor);
    }

    fn interceptor_count(&self) -> usize {
        self.registry.interceptor_count()
    }

    fn members(&self) -> Vec<Arc<dyn AppDelegate>> {
        self.snapshot().iter().cloned().collect()
    }
}

impl AppDelegate for MulticastAppDelegate {
    fn name(&self) -> &str {
        "multicast"
    }

    fn responds_to(&self, callback: Callback) -> bool {
        match self.capability_mode {
            CapabilityMode::Live => self.supports(callback.into()),
            CapabilityMode::Always => true,
        }
    }

    fn responds_to_event(&self, event: &str) -> bool {
        self.supports(Target::Event(event))
    }

    fn as_multicast(&self) -> Option<&dyn MulticastDelegate> {
        Some(self)
    }

    fn did_finish_launching(
        &self,
        app: &Application,
        launch_options: &Options,
    ) -> Result<bool, DelegateError> {
        Ok(self
            .broadcaster
            .any(&self.snapshot(), Callback::FinishLaunching.into(), |d| {
                d.did_finish_launching(app, launch_options)
            }))
    }

    fn open_url(
        &self,
        app: &Application,
        url: &str,
        options: &Options,
    ) -> Result<bool, DelegateError> {
        Ok(self
            .broadcaster
            .any(&self.snapshot(), Callback::OpenUrl.into(), |d| {
                d.open_url(app, url, options)
            }))
    }

    fn continue_user_activity(
        &self,
        app: &Application,
        activity: &UserActivity,
    ) -> Result<bool, DelegateError> {
        Ok(self.broadcaster.any(
            &self.snapshot(),
            Callback::ContinueUserActivity.into(),
            |d| d.continue_user_activity(app, activity),
        ))
    }

    fn did_become_active(&self, app: &Application) -> Result<(), DelegateError> {
        self.broadcaster
            .broadcast(&self.snapshot(), Callback::DidBecomeActive.into(), |d| {
                d.did_become_active(app)
            });
        Ok(())
    }

    fn did_enter_background(&self, app: &Application) -> Result<(), DelegateError> {
        self.broadcaster
            .broadcast(&self.snapshot(), Callback::DidEnterBackground.into(), |d| {
                d.did_enter_background(app)
            });
        Ok(())
    }

    fn will_terminate(&self, app: &Application) -> Result<(), DelegateError> {
        self.broadcaster
            .broadcast(&self.snapshot(), Callback::WillTerminate.into(), |d| {
                d.will_terminate(app)
            });
        Ok(())
    }

    fn did_register_for_remote_notifications(
        &self,
        app: &Application,
        device_token: &[u8],
    ) -> Result<(), DelegateError> {
        self.broadcaster.broadcast(
            &self.snapshot(),
            Callback::RegisteredForRemoteNotifications.into(),
            |d| d.did_register_for_remote_notifications(app, device_token),
        );
        Ok(())
    }

    fn did_fail_to_register_for_remote_notifications(
        &self,
        app: &Application,
        error: &RegistrationError,
    ) -> Result<(), DelegateError> {
        self.broadcaster.broadcast(
            &self.snapshot(),
            Callback::FailedToRegisterForRemoteNotifications.into(),
            |d| d.did_fail_to_register_for_remote_notifications(app, error),
        );
        Ok(())
    }

    fn did_receive_remote_notification(
        &self,
        app: &Application,
        payload: &serde_json::Value,
        completion: Completion<FetchResult>,
    ) -> Result<(), DelegateError> {
        self.broadcaster.deliver_once(
            &self.snapshot(),
            Callback::ReceivedRemoteNotification.into(),
            &completion,
            |d, gate| d.did_receive_remote_notification(app, payload, gate),
        );
        Ok(())
    }

    fn will_present_notification(
        &self,
        center: &NotificationCenter,
        notification: &Notification,
        completion: Completion<PresentationOptions>,
    ) -> Result<(), DelegateError> {
        self.broadcaster.deliver_once(
            &self.snapshot(),
            Callback::WillPresentNotification.into(),
            &completion,
            |d, gate| d.will_present_notification(center, notification, gate),
        );
        Ok(())
    }

    fn did_receive_notification_response(
        &self,
        center: &NotificationCenter,
        response: &NotificationResponse,
        completion: Completion<()>,
    ) -> Result<(), DelegateError> {
        self.broadcaster.deliver_once(
            &self.snapshot(),
            Callback::ReceivedNotificationResponse.into(),
            &completion,
            |d, gate| d.did_receive_notification_response(center, response, gate),
        );
        Ok(())
    }

    fn configuration_for_connecting(
        &self,
        app: &Application,
        session: &SceneSession,
        options: &Options,
    ) -> Result<Option<SceneConfiguration>, DelegateError> {
        Ok(self.broadcaster.first_definitive(
            &self.snapshot(),
            Callback::ConfigurationForConnecting.into(),
            |d| d.configuration_for_connecting(app, session, options),
        ))
    }

    fn handle_event(
        &self,
        app: &Application,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<(), DelegateError> {
        self.broadcaster
            .broadcast(&self.snapshot(), Target::Event(event), |d| {
                d.handle_event(app, event, payload)
            });
        Ok(())
    }
}
