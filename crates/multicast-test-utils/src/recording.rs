// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable delegate for deterministic testing.
//!
//! `RecordingDelegate` implements `AppDelegate` for exactly the callbacks it is
//! told to handle, answers with scripted values, and records every invocation
//! for assertion in tests.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use multicast_core::{
    AppDelegate, Application, Callback, Completion, DelegateError, FetchResult, Notification,
    NotificationCenter, NotificationResponse, Options, PresentationOptions, RegistrationError,
    SceneConfiguration, SceneSession, UserActivity,
};

/// Invocation log shared between several delegates: `(delegate name, callback)`
/// in call order.
pub type CallLog = Arc<Mutex<Vec<(String, Callback)>>>;

type Hook = Box<dyn Fn(Callback) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Error,
    Panic,
}

/// A delegate that does what it is scripted to do and remembers it.
///
/// ```
/// use multicast_core::{AppDelegate, Callback};
/// use multicast_test_utils::RecordingDelegate;
///
/// let delegate = RecordingDelegate::new("analytics").answering(Callback::OpenUrl, true);
/// assert!(delegate.responds_to(Callback::OpenUrl));
/// assert!(!delegate.responds_to(Callback::WillTerminate));
/// ```
pub struct RecordingDelegate {
    name: String,
    handled: HashSet<Callback>,
    answers: HashMap<Callback, bool>,
    faults: HashMap<Callback, Fault>,
    fetch: Option<FetchResult>,
    presentation: Option<PresentationOptions>,
    respond: bool,
    repeat: usize,
    hold: bool,
    scene: Option<SceneConfiguration>,
    events: HashSet<String>,
    calls: Mutex<Vec<Callback>>,
    events_seen: Mutex<Vec<String>>,
    held: Mutex<Vec<Completion<FetchResult>>>,
    log: Option<CallLog>,
    on_call: Option<Hook>,
}

impl RecordingDelegate {
    /// A delegate named `name` that handles nothing yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handled: HashSet::new(),
            answers: HashMap::new(),
            faults: HashMap::new(),
            fetch: None,
            presentation: None,
            respond: false,
            repeat: 1,
            hold: false,
            scene: None,
            events: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            events_seen: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
            log: None,
            on_call: None,
        }
    }

    /// Declare `callbacks` as implemented.
    pub fn handling(mut self, callbacks: &[Callback]) -> Self {
        self.handled.extend(callbacks.iter().copied());
        self
    }

    /// Implement a boolean callback and answer `answer`.
    pub fn answering(mut self, callback: Callback, answer: bool) -> Self {
        self.handled.insert(callback);
        self.answers.insert(callback, answer);
        self
    }

    /// Implement `callback` and return an error from it.
    pub fn failing_on(mut self, callback: Callback) -> Self {
        self.handled.insert(callback);
        self.faults.insert(callback, Fault::Error);
        self
    }

    /// Implement `callback` and panic inside it.
    pub fn panicking_on(mut self, callback: Callback) -> Self {
        self.handled.insert(callback);
        self.faults.insert(callback, Fault::Panic);
        self
    }

    /// Implement remote notification delivery and complete with `result`.
    pub fn completing_fetch(mut self, result: FetchResult) -> Self {
        self.handled.insert(Callback::ReceivedRemoteNotification);
        self.fetch = Some(result);
        self
    }

    /// Implement foreground presentation and complete with `options`.
    pub fn completing_presentation(mut self, options: PresentationOptions) -> Self {
        self.handled.insert(Callback::WillPresentNotification);
        self.presentation = Some(options);
        self
    }

    /// Implement notification responses and complete them.
    pub fn completing_response(mut self) -> Self {
        self.handled.insert(Callback::ReceivedNotificationResponse);
        self.respond = true;
        self
    }

    /// Call each completion `times` times instead of once.
    pub fn completing_repeatedly(mut self, times: usize) -> Self {
        self.repeat = times;
        self
    }

    /// Implement remote notification delivery and keep the completion for a
    /// later [`take_held`](Self::take_held).
    pub fn holding_fetch(mut self) -> Self {
        self.handled.insert(Callback::ReceivedRemoteNotification);
        self.hold = true;
        self
    }

    /// Implement scene connection and answer `configuration`.
    pub fn with_scene(mut self, configuration: SceneConfiguration) -> Self {
        self.handled.insert(Callback::ConfigurationForConnecting);
        self.scene = Some(configuration);
        self
    }

    /// Implement the custom event `event`.
    pub fn handling_event(mut self, event: impl Into<String>) -> Self {
        self.events.insert(event.into());
        self
    }

    /// Also append every invocation to `log`.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Run `hook` at the start of every invocation, before any scripted fault.
    pub fn on_call(mut self, hook: impl Fn(Callback) + Send + Sync + 'static) -> Self {
        self.on_call = Some(Box::new(hook));
        self
    }

    /// Callbacks invoked on this delegate, in order.
    pub fn calls(&self) -> Vec<Callback> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `callback` was invoked.
    pub fn call_count(&self, callback: Callback) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| **c == callback)
            .count()
    }

    /// Custom events delivered to this delegate, in order.
    pub fn events_seen(&self) -> Vec<String> {
        self.events_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Completions kept by [`holding_fetch`](Self::holding_fetch).
    pub fn take_held(&self) -> Vec<Completion<FetchResult>> {
        std::mem::take(&mut *self.held.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, callback: Callback) -> Result<(), DelegateError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
        if let Some(log) = &self.log {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((self.name.clone(), callback));
        }
        if let Some(hook) = &self.on_call {
            hook(callback);
        }

        match self.faults.get(&callback) {
            Some(Fault::Panic) => panic!("{} panicked in {callback}", self.name),
            Some(Fault::Error) => Err(DelegateError::failed(format!(
                "{} failed in {callback}",
                self.name
            ))),
            None => Ok(()),
        }
    }

    fn answer(&self, callback: Callback) -> Result<bool, DelegateError> {
        self.record(callback)?;
        Ok(self.answers.get(&callback).copied().unwrap_or(false))
    }

    fn complete<T: Clone + Send + 'static>(&self, completion: &Completion<T>, value: Option<T>) {
        if let Some(value) = value {
            for _ in 0..self.repeat {
                completion.complete(value.clone());
            }
        }
    }
}

impl fmt::Debug for RecordingDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingDelegate")
            .field("name", &self.name)
            .field("handled", &self.handled)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl AppDelegate for RecordingDelegate {
    fn name(&self) -> &str {
        &self.name
    }

    fn responds_to(&self, callback: Callback) -> bool {
        self.handled.contains(&callback)
    }

    fn responds_to_event(&self, event: &str) -> bool {
        self.events.contains(event)
    }

    fn did_finish_launching(
        &self,
        _app: &Application,
        _launch_options: &Options,
    ) -> Result<bool, DelegateError> {
        self.answer(Callback::FinishLaunching)
    }

    fn open_url(
        &self,
        _app: &Application,
        _url: &str,
        _options: &Options,
    ) -> Result<bool, DelegateError> {
        self.answer(Callback::OpenUrl)
    }

    fn continue_user_activity(
        &self,
        _app: &Application,
        _activity: &UserActivity,
    ) -> Result<bool, DelegateError> {
        self.answer(Callback::ContinueUserActivity)
    }

    fn did_become_active(&self, _app: &Application) -> Result<(), DelegateError> {
        self.record(Callback::DidBecomeActive)
    }

    fn did_enter_background(&self, _app: &Application) -> Result<(), DelegateError> {
        self.record(Callback::DidEnterBackground)
    }

    fn will_terminate(&self, _app: &Application) -> Result<(), DelegateError> {
        self.record(Callback::WillTerminate)
    }

    fn did_register_for_remote_notifications(
        &self,
        _app: &Application,
        _device_token: &[u8],
    ) -> Result<(), DelegateError> {
        self.record(Callback::RegisteredForRemoteNotifications)
    }

    fn did_fail_to_register_for_remote_notifications(
        &self,
        _app: &Application,
        _error: &RegistrationError,
    ) -> Result<(), DelegateError> {
        self.record(Callback::FailedToRegisterForRemoteNotifications)
    }

    fn did_receive_remote_notification(
        &self,
        _app: &Application,
        _payload: &serde_json::Value,
        completion: Completion<FetchResult>,
    ) -> Result<(), DelegateError> {
        self.record(Callback::ReceivedRemoteNotification)?;
        if self.hold {
            self.held
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(completion);
            return Ok(());
        }
        self.complete(&completion, self.fetch);
        Ok(())
    }

    fn will_present_notification(
        &self,
        _center: &NotificationCenter,
        _notification: &Notification,
        completion: Completion<PresentationOptions>,
    ) -> Result<(), DelegateError> {
        self.record(Callback::WillPresentNotification)?;
        self.complete(&completion, self.presentation);
        Ok(())
    }

    fn did_receive_notification_response(
        &self,
        _center: &NotificationCenter,
        _response: &NotificationResponse,
        completion: Completion<()>,
    ) -> Result<(), DelegateError> {
        self.record(Callback::ReceivedNotificationResponse)?;
        self.complete(&completion, self.respond.then_some(()));
        Ok(())
    }

    fn configuration_for_connecting(
        &self,
        _app: &Application,
        _session: &SceneSession,
        _options: &Options,
    ) -> Result<Option<SceneConfiguration>, DelegateError> {
        self.record(Callback::ConfigurationForConnecting)?;
        Ok(self.scene.clone())
    }

    fn handle_event(
        &self,
        _app: &Application,
        event: &str,
        _payload: &serde_json::Value,
    ) -> Result<(), DelegateError> {
        self.events_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.to_string());
        Ok(())
    }
}
