// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `multicast simulate` command implementation.
//!
//! Replays a TOML scenario through a real proxy: scripted delegates are
//! registered, the proxy is installed into a simulated host slot, and each
//! step is dispatched the way a host would (capability query first). Every
//! step yields a report of who was called and what the host got back.
//!
//! ```toml
//! [[delegate]]
//! name = "app"
//! default = true
//! handles = ["open_url"]
//!
//! [[delegate]]
//! name = "deep-link"
//! answer = true
//! handles = ["open_url"]
//!
//! [[step]]
//! action = "dispatch"
//! callback = "open_url"
//! url = "myapp://promo"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use multicast_config::MulticastConfig;
use multicast_core::{
    AppDelegate, Application, Callback, Completion, DelegateError, DelegateHost, FetchResult,
    MulticastError, Notification, NotificationCenter, NotificationResponse, Options, Policy,
    PresentationOptions, RegistrationError, SceneConfiguration, SceneSession, UserActivity,
};
use multicast_dispatch::MulticastAppDelegate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// A scenario file: delegates to register and steps to replay.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default, rename = "delegate")]
    pub delegates: Vec<DelegateScript>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// How one scripted delegate behaves.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegateScript {
    pub name: String,
    /// Occupy the host slot before the proxy wraps it.
    #[serde(default)]
    pub default: bool,
    /// Register as an interceptor before the first step.
    #[serde(default = "default_true")]
    pub register: bool,
    /// Callbacks this delegate declares.
    #[serde(default)]
    pub handles: Vec<Callback>,
    /// Answer for boolean callbacks.
    #[serde(default)]
    pub answer: bool,
    /// Callbacks that return an error.
    #[serde(default)]
    pub fails: Vec<Callback>,
    /// Callbacks that panic.
    #[serde(default)]
    pub panics: Vec<Callback>,
    /// Value passed to a remote-notification completion, if any.
    pub fetch: Option<FetchResult>,
    /// Complete presentation and response completions.
    #[serde(default)]
    pub complete: bool,
    /// Scene configuration name answered on scene connection.
    pub scene: Option<String>,
    /// Custom events this delegate handles.
    #[serde(default)]
    pub events: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// One host-side action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Fire a callback of the table.
    Dispatch {
        callback: Callback,
        url: Option<String>,
        #[serde(default)]
        payload: Value,
    },
    /// Fire a custom event.
    Event {
        name: String,
        #[serde(default)]
        payload: Value,
    },
    /// Register a delegate as interceptor.
    Add { delegate: String },
    /// Unregister a delegate.
    Remove { delegate: String },
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub target: String,
    pub policy: Option<String>,
    /// Whether the proxy claimed the callback when the host asked.
    pub claimed: bool,
    /// Delegates invoked, in order.
    pub invoked: Vec<String>,
    /// What the host received.
    pub result: Value,
}

/// Run the `multicast simulate` command.
pub fn run_simulate(
    config: &MulticastConfig,
    path: &Path,
    json: bool,
) -> Result<(), MulticastError> {
    let scenario = load_scenario(path)?;
    let reports = run_scenario(config, &scenario)?;

    if json {
        let rendered = serde_json::to_string_pretty(&reports)
            .map_err(|e| MulticastError::Internal(format!("failed to serialize reports: {e}")))?;
        println!("{rendered}");
    } else {
        for report in &reports {
            print!("{}", render_report(report));
        }
    }
    Ok(())
}

/// Read and check a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario, MulticastError> {
    let content = std::fs::read_to_string(path)?;
    parse_scenario(&content)
}

fn parse_scenario(content: &str) -> Result<Scenario, MulticastError> {
    let scenario: Scenario = toml::from_str(content)
        .map_err(|e| MulticastError::InvalidInput(format!("scenario: {e}")))?;
    check_scenario(&scenario)?;
    Ok(scenario)
}

fn check_scenario(scenario: &Scenario) -> Result<(), MulticastError> {
    let mut names = HashSet::new();
    for delegate in &scenario.delegates {
        if !names.insert(delegate.name.as_str()) {
            return Err(MulticastError::InvalidInput(format!(
                "delegate `{}` is declared twice",
                delegate.name
            )));
        }
    }

    if scenario.delegates.iter().filter(|d| d.default).count() > 1 {
        return Err(MulticastError::InvalidInput(
            "at most one delegate can be the default".to_string(),
        ));
    }

    for step in &scenario.steps {
        if let Step::Add { delegate } | Step::Remove { delegate } = step {
            if !names.contains(delegate.as_str()) {
                return Err(MulticastError::InvalidInput(format!(
                    "step refers to unknown delegate `{delegate}`"
                )));
            }
        }
    }
    Ok(())
}

/// Replay `scenario` against a proxy built from `config`.
pub fn run_scenario(
    config: &MulticastConfig,
    scenario: &Scenario,
) -> Result<Vec<StepReport>, MulticastError> {
    let trace = Trace::default();
    let roster: Vec<Arc<ScriptedDelegate>> = scenario
        .delegates
        .iter()
        .map(|script| Arc::new(ScriptedDelegate::new(script.clone(), trace.clone())))
        .collect();

    let host = SimulatedHost::new("com.example.simulated");
    if let Some(default) = roster.iter().find(|d| d.script.default) {
        host.set_delegate(Some(Arc::clone(default) as Arc<dyn AppDelegate>));
    }

    let proxy = Arc::new(MulticastAppDelegate::from_config(&config.dispatch));
    let outcome = proxy.install(&host);
    info!(?outcome, delegates = roster.len(), "simulation started");

    for delegate in roster.iter().filter(|d| !d.script.default && d.script.register) {
        proxy.add_interceptor(delegate);
    }

    let mut reports = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        trace.clear();
        let report = match step {
            Step::Add { delegate } => {
                let added = proxy.add_interceptor(find(&roster, delegate)?);
                membership_report(index, "add", delegate, added)
            }
            Step::Remove { delegate } => {
                let removed = proxy.remove_interceptor(find(&roster, delegate)?);
                membership_report(index, "remove", delegate, removed)
            }
            Step::Event { name, payload } => {
                let claimed = host.send_event(name, payload)?;
                StepReport {
                    step: index + 1,
                    target: format!("event:{name}"),
                    policy: Some(Policy::VoidBroadcast.to_string()),
                    claimed,
                    invoked: trace.take(),
                    result: Value::Null,
                }
            }
            Step::Dispatch {
                callback,
                url,
                payload,
            } => {
                let (claimed, result) = host.dispatch(*callback, url.as_deref(), payload)?;
                StepReport {
                    step: index + 1,
                    target: callback.to_string(),
                    policy: Some(callback.policy().to_string()),
                    claimed,
                    invoked: trace.take(),
                    result,
                }
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

fn find<'a>(
    roster: &'a [Arc<ScriptedDelegate>],
    name: &str,
) -> Result<&'a Arc<ScriptedDelegate>, MulticastError> {
    roster
        .iter()
        .find(|d| d.script.name == name)
        .ok_or_else(|| MulticastError::InvalidInput(format!("unknown delegate `{name}`")))
}

fn membership_report(index: usize, verb: &str, delegate: &str, changed: bool) -> StepReport {
    StepReport {
        step: index + 1,
        target: format!("{verb} {delegate}"),
        policy: None,
        claimed: false,
        invoked: Vec::new(),
        result: json!(changed),
    }
}

fn render_report(report: &StepReport) -> String {
    let mut out = format!("step {}: {}", report.step, report.target);
    if let Some(policy) = &report.policy {
        out.push_str(&format!(" [{policy}]"));
        if !report.claimed {
            out.push_str(" (not claimed, host skipped it)");
        }
    }
    out.push('\n');
    if !report.invoked.is_empty() {
        out.push_str(&format!("  invoked: {}\n", report.invoked.join(", ")));
    }
    out.push_str(&format!("  result: {}\n", report.result));
    out
}

/// Names of delegates invoked during the current step.
#[derive(Debug, Clone, Default)]
struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    fn push(&self, name: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn clear(&self) {
        self.take();
    }
}

/// Delegate driven by a [`DelegateScript`].
struct ScriptedDelegate {
    script: DelegateScript,
    trace: Trace,
}

impl ScriptedDelegate {
    fn new(script: DelegateScript, trace: Trace) -> Self {
        Self { script, trace }
    }

    fn enter(&self, callback: Callback) -> Result<(), DelegateError> {
        self.trace.push(&self.script.name);
        if self.script.panics.contains(&callback) {
            panic!("{} panicked on {callback}", self.script.name);
        }
        if self.script.fails.contains(&callback) {
            return Err(DelegateError::failed(format!(
                "{} failed on {callback}",
                self.script.name
            )));
        }
        Ok(())
    }
}

impl AppDelegate for ScriptedDelegate {
    fn name(&self) -> &str {
        &self.script.name
    }

    fn responds_to(&self, callback: Callback) -> bool {
        self.script.handles.contains(&callback)
            || self.script.fails.contains(&callback)
            || self.script.panics.contains(&callback)
    }

    fn responds_to_event(&self, event: &str) -> bool {
        self.script.events.iter().any(|e| e == event)
    }

    fn did_finish_launching(
        &self,
        _app: &Application,
        _launch_options: &Options,
    ) -> Result<bool, DelegateError> {
        self.enter(Callback::FinishLaunching)?;
        Ok(self.script.answer)
    }

    fn open_url(
        &self,
        _app: &Application,
        _url: &str,
        _options: &Options,
    ) -> Result<bool, DelegateError> {
        self.enter(Callback::OpenUrl)?;
        Ok(self.script.answer)
    }

    fn continue_user_activity(
        &self,
        _app: &Application,
        _activity: &UserActivity,
    ) -> Result<bool, DelegateError> {
        self.enter(Callback::ContinueUserActivity)?;
        Ok(self.script.answer)
    }

    fn did_become_active(&self, _app: &Application) -> Result<(), DelegateError> {
        self.enter(Callback::DidBecomeActive)
    }

    fn did_enter_background(&self, _app: &Application) -> Result<(), DelegateError> {
        self.enter(Callback::DidEnterBackground)
    }

    fn will_terminate(&self, _app: &Application) -> Result<(), DelegateError> {
        self.enter(Callback::WillTerminate)
    }

    fn did_register_for_remote_notifications(
        &self,
        _app: &Application,
        _device_token: &[u8],
    ) -> Result<(), DelegateError> {
        self.enter(Callback::RegisteredForRemoteNotifications)
    }

    fn did_fail_to_register_for_remote_notifications(
        &self,
        _app: &Application,
        _error: &RegistrationError,
    ) -> Result<(), DelegateError> {
        self.enter(Callback::FailedToRegisterForRemoteNotifications)
    }

    fn did_receive_remote_notification(
        &self,
        _app: &Application,
        _payload: &Value,
        completion: Completion<FetchResult>,
    ) -> Result<(), DelegateError> {
        self.enter(Callback::ReceivedRemoteNotification)?;
        if let Some(result) = self.script.fetch {
            completion.complete(result);
        }
        Ok(())
    }

    fn will_present_notification(
        &self,
        _center: &NotificationCenter,
        _notification: &Notification,
        completion: Completion<PresentationOptions>,
    ) -> Result<(), DelegateError> {
        self.enter(Callback::WillPresentNotification)?;
        if self.script.complete {
            completion.complete(PresentationOptions::ALL);
        }
        Ok(())
    }

    fn did_receive_notification_response(
        &self,
        _center: &NotificationCenter,
        _response: &NotificationResponse,
        completion: Completion<()>,
    ) -> Result<(), DelegateError> {
        self.enter(Callback::ReceivedNotificationResponse)?;
        if self.script.complete {
            completion.complete(());
        }
        Ok(())
    }

    fn configuration_for_connecting(
        &self,
        _app: &Application,
        session: &SceneSession,
        _options: &Options,
    ) -> Result<Option<SceneConfiguration>, DelegateError> {
        self.enter(Callback::ConfigurationForConnecting)?;
        Ok(self.script.scene.as_ref().map(|name| SceneConfiguration {
            name: name.clone(),
            role: session.role.clone(),
            delegate_class: None,
        }))
    }

    fn handle_event(
        &self,
        _app: &Application,
        _event: &str,
        _payload: &Value,
    ) -> Result<(), DelegateError> {
        self.trace.push(&self.script.name);
        Ok(())
    }
}

/// Host stand-in: one delegate slot, capability query before every call.
struct SimulatedHost {
    slot: Mutex<Option<Arc<dyn AppDelegate>>>,
    app: Application,
    center: NotificationCenter,
}

impl DelegateHost for SimulatedHost {
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

impl SimulatedHost {
    fn new(app_id: &str) -> Self {
        Self {
            slot: Mutex::new(None),
            app: Application::new(app_id),
            center: NotificationCenter::default(),
        }
    }

    fn send_event(&self, event: &str, payload: &Value) -> Result<bool, MulticastError> {
        let Some(delegate) = self.delegate() else {
            return Ok(false);
        };
        if !delegate.responds_to_event(event) {
            return Ok(false);
        }
        delegate
            .handle_event(&self.app, event, payload)
            .map_err(host_error)?;
        Ok(true)
    }

    /// Fire `callback` and return whether it was claimed plus the result.
    fn dispatch(
        &self,
        callback: Callback,
        url: Option<&str>,
        payload: &Value,
    ) -> Result<(bool, Value), MulticastError> {
        let Some(delegate) = self.delegate() else {
            return Ok((false, Value::Null));
        };
        if !delegate.responds_to(callback) {
            return Ok((false, Value::Null));
        }

        let app = &self.app;
        let options = payload.as_object().cloned().unwrap_or_default();
        let url = url.unwrap_or("app://");

        let result = match callback {
            Callback::FinishLaunching => Value::Bool(
                delegate
                    .did_finish_launching(app, &options)
                    .map_err(host_error)?,
            ),
            Callback::OpenUrl => {
                Value::Bool(delegate.open_url(app, url, &options).map_err(host_error)?)
            }
            Callback::ContinueUserActivity => {
                let activity = UserActivity {
                    activity_type: "NSUserActivityTypeBrowsingWeb".to_string(),
                    webpage_url: Some(url.to_string()),
                    user_info: options,
                };
                Value::Bool(
                    delegate
                        .continue_user_activity(app, &activity)
                        .map_err(host_error)?,
                )
            }
            Callback::DidBecomeActive => {
                delegate.did_become_active(app).map_err(host_error)?;
                Value::Null
            }
            Callback::DidEnterBackground => {
                delegate.did_enter_background(app).map_err(host_error)?;
                Value::Null
            }
            Callback::WillTerminate => {
                delegate.will_terminate(app).map_err(host_error)?;
                Value::Null
            }
            Callback::RegisteredForRemoteNotifications => {
                delegate
                    .did_register_for_remote_notifications(app, url.as_bytes())
                    .map_err(host_error)?;
                Value::Null
            }
            Callback::FailedToRegisterForRemoteNotifications => {
                let error = RegistrationError {
                    code: 3010,
                    message: "remote notifications are not supported".to_string(),
                };
                delegate
                    .did_fail_to_register_for_remote_notifications(app, &error)
                    .map_err(host_error)?;
                Value::Null
            }
            Callback::ReceivedRemoteNotification => {
                let (delivered, completion) = collector::<FetchResult>();
                delegate
                    .did_receive_remote_notification(app, payload, completion)
                    .map_err(host_error)?;
                to_json(&take_delivered(&delivered))?
            }
            Callback::WillPresentNotification => {
                let (delivered, completion) = collector::<PresentationOptions>();
                let notification = Notification {
                    identifier: "simulated".to_string(),
                    payload: payload.clone(),
                };
                delegate
                    .will_present_notification(&self.center, &notification, completion)
                    .map_err(host_error)?;
                to_json(&take_delivered(&delivered))?
            }
            Callback::ReceivedNotificationResponse => {
                let (delivered, completion) = collector::<()>();
                let response = NotificationResponse {
                    notification: Notification {
                        identifier: "simulated".to_string(),
                        payload: payload.clone(),
                    },
                    action_identifier: "default".to_string(),
                };
                delegate
                    .did_receive_notification_response(&self.center, &response, completion)
                    .map_err(host_error)?;
                json!(take_delivered(&delivered).len())
            }
            Callback::ConfigurationForConnecting => {
                let session = SceneSession {
                    persistent_identifier: "simulated-scene".to_string(),
                    role: "window".to_string(),
                };
                let configuration = delegate
                    .configuration_for_connecting(app, &session, &options)
                    .map_err(host_error)?;
                to_json(&configuration)?
            }
        };
        Ok((true, result))
    }
}

type Delivered<T> = Arc<Mutex<Vec<T>>>;

/// A completion that records every value it is called with.
fn collector<T: Send + 'static>() -> (Delivered<T>, Completion<T>) {
    let delivered: Delivered<T> = Arc::default();
    let sink = Arc::clone(&delivered);
    let completion = Completion::new(move |value| {
        sink.lock().unwrap_or_else(PoisonError::into_inner).push(value);
    });
    (delivered, completion)
}

fn take_delivered<T>(delivered: &Delivered<T>) -> Vec<T> {
    std::mem::take(&mut *delivered.lock().unwrap_or_else(PoisonError::into_inner))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, MulticastError> {
    serde_json::to_value(value)
        .map_err(|e| MulticastError::Internal(format!("failed to serialize result: {e}")))
}

fn host_error(e: DelegateError) -> MulticastError {
    MulticastError::Internal(format!("delegate error reached the host: {e}"))
}
