// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a mock host driving the multicast proxy.

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use multicast_config::{CapabilityMode, DispatchConfig};
use multicast_core::{
    AppDelegate, Callback, DelegateHost, FetchResult, Notification, NotificationResponse,
    PresentationOptions, SceneConfiguration, SceneSession,
};
use multicast_dispatch::{
    install_shared, installed_multicast_delegate, shared, InstallOutcome, MulticastAppDelegate,
};
use multicast_test_utils::{CallLog, MockHost, RecordingDelegate};
use serial_test::serial;
use tracing_test::traced_test;

/// A host with a fresh proxy installed over `default`.
fn host_with_proxy(default: Option<Arc<dyn AppDelegate>>) -> (MockHost, Arc<MulticastAppDelegate>) {
    let host = MockHost::new("com.example.app");
    host.set_delegate(default);
    let proxy = Arc::new(MulticastAppDelegate::new());
    proxy.install(&host);
    (host, proxy)
}

fn session() -> SceneSession {
    SceneSession {
        persistent_identifier: "scene-1".into(),
        role: "window".into(),
    }
}

#[test]
fn duplicate_interceptor_is_invoked_once() {
    let (host, proxy) = host_with_proxy(None);
    let interceptor =
        Arc::new(RecordingDelegate::new("analytics").handling(&[Callback::DidBecomeActive]));

    assert!(proxy.add_interceptor(&interceptor));
    assert!(!proxy.add_interceptor(&interceptor));
    host.become_active();

    assert_eq!(interceptor.call_count(Callback::DidBecomeActive), 1);
}

#[test]
fn boolean_or_combines_default_and_implementing_interceptors() {
    let default = Arc::new(RecordingDelegate::new("default").answering(Callback::OpenUrl, false));
    let (host, proxy) = host_with_proxy(Some(default.clone()));
    let yes = Arc::new(RecordingDelegate::new("i1").answering(Callback::OpenUrl, true));
    let deaf = Arc::new(RecordingDelegate::new("i2").handling(&[Callback::WillTerminate]));
    proxy.add_interceptor(&yes);
    proxy.add_interceptor(&deaf);

    assert!(proxy.responds_to(Callback::OpenUrl));
    assert!(host.open_url("myapp://item/1"));

    assert_eq!(default.call_count(Callback::OpenUrl), 1);
    assert_eq!(yes.call_count(Callback::OpenUrl), 1);
    assert!(deaf.calls().is_empty());
}

#[test]
fn unimplemented_callback_is_not_claimed_and_not_dispatched() {
    let default = Arc::new(RecordingDelegate::new("default").handling(&[Callback::DidBecomeActive]));
    let (host, proxy) = host_with_proxy(Some(default.clone()));
    let other = Arc::new(RecordingDelegate::new("other").handling(&[Callback::DidBecomeActive]));
    proxy.add_interceptor(&other);

    assert!(!proxy.responds_to(Callback::WillTerminate));
    host.terminate();
    assert!(!host.open_url("myapp://x"));

    assert_eq!(host.skipped(), vec![Callback::WillTerminate, Callback::OpenUrl]);
    assert!(default.calls().is_empty());
    assert!(other.calls().is_empty());

    // Invoked directly anyway, the proxy calls nobody and returns the default.
    assert!(!proxy
        .open_url(host.app(), "myapp://x", &Default::default())
        .unwrap());
    assert!(default.calls().is_empty());
}

#[test]
fn removal_during_dispatch_only_affects_later_dispatches() {
    let (host, proxy) = host_with_proxy(None);
    let second = Arc::new(RecordingDelegate::new("second").handling(&[Callback::DidBecomeActive]));

    let remover = {
        let proxy = Arc::clone(&proxy);
        let second = Arc::clone(&second);
        Arc::new(
            RecordingDelegate::new("remover")
                .handling(&[Callback::DidBecomeActive])
                .on_call(move |_| {
                    proxy.remove_interceptor(&second);
                }),
        )
    };
    proxy.add_interceptor(&remover);
    proxy.add_interceptor(&second);

    host.become_active();
    assert_eq!(second.call_count(Callback::DidBecomeActive), 1);

    host.become_active();
    assert_eq!(second.call_count(Callback::DidBecomeActive), 1);
    assert_eq!(remover.call_count(Callback::DidBecomeActive), 2);
}

#[test]
fn interceptor_added_during_dispatch_joins_the_next_one() {
    let (host, proxy) = host_with_proxy(None);
    let late = Arc::new(RecordingDelegate::new("late").handling(&[Callback::DidEnterBackground]));

    let adder = {
        let proxy = Arc::clone(&proxy);
        let late = Arc::clone(&late);
        Arc::new(
            RecordingDelegate::new("adder")
                .handling(&[Callback::DidEnterBackground])
                .on_call(move |_| {
                    proxy.add_interceptor(&late);
                }),
        )
    };
    proxy.add_interceptor(&adder);

    host.enter_background();
    assert!(late.calls().is_empty());

    host.enter_background();
    assert_eq!(late.call_count(Callback::DidEnterBackground), 1);
}

#[test]
fn snapshot_taken_before_removal_still_reaches_removed_interceptor() {
    let proxy = MulticastAppDelegate::new();
    let interceptor = Arc::new(RecordingDelegate::new("i").handling(&[Callback::WillTerminate]));
    proxy.add_interceptor(&interceptor);

    let snapshot = proxy.snapshot();
    proxy.remove_interceptor(&interceptor);

    assert_eq!(snapshot.names(), vec!["i"]);
    assert!(proxy.snapshot().is_empty());
}

#[test]
fn single_delivery_fires_once_with_first_argument() {
    let (host, proxy) = host_with_proxy(None);
    let silent = Arc::new(RecordingDelegate::new("silent").handling(&[
        Callback::ReceivedRemoteNotification,
    ]));
    let first = Arc::new(RecordingDelegate::new("first").completing_fetch(FetchResult::NewData));
    let second = Arc::new(RecordingDelegate::new("second").completing_fetch(FetchResult::Failed));
    proxy.add_interceptor(&silent);
    proxy.add_interceptor(&first);
    proxy.add_interceptor(&second);

    let delivery = host.deliver_remote_notification(&serde_json::json!({"aps": {"badge": 1}}));

    assert_eq!(delivery.values(), vec![FetchResult::NewData]);
    for delegate in [&silent, &first, &second] {
        assert_eq!(delegate.call_count(Callback::ReceivedRemoteNotification), 1);
    }
}

#[test]
fn repeated_completion_from_one_delegate_is_absorbed() {
    let (host, proxy) = host_with_proxy(None);
    let noisy = Arc::new(
        RecordingDelegate::new("noisy")
            .completing_presentation(PresentationOptions::ALL)
            .completing_repeatedly(3),
    );
    proxy.add_interceptor(&noisy);

    let delivery = host.present_notification(&Notification {
        identifier: "n1".into(),
        payload: serde_json::json!({}),
    });
    assert_eq!(delivery.values(), vec![PresentationOptions::ALL]);
}

#[test]
fn single_delivery_never_fabricates_a_call() {
    let (host, proxy) = host_with_proxy(None);
    let silent = Arc::new(RecordingDelegate::new("silent").handling(&[
        Callback::ReceivedNotificationResponse,
    ]));
    proxy.add_interceptor(&silent);

    let delivery = host.respond_to_notification(&NotificationResponse {
        notification: Notification {
            identifier: "n1".into(),
            payload: serde_json::json!({}),
        },
        action_identifier: "open".into(),
    });
    assert_eq!(delivery.count(), 0);
}

#[test]
fn completion_held_by_a_delegate_can_fire_later_from_another_thread() {
    let (host, proxy) = host_with_proxy(None);
    let holder = Arc::new(RecordingDelegate::new("holder").holding_fetch());
    let quick = Arc::new(RecordingDelegate::new("quick").handling(&[
        Callback::ReceivedRemoteNotification,
    ]));
    proxy.add_interceptor(&holder);
    proxy.add_interceptor(&quick);

    let delivery = host.deliver_remote_notification(&serde_json::json!({}));
    assert_eq!(delivery.count(), 0);

    let held = holder.take_held();
    assert_eq!(held.len(), 1);
    let barrier = Arc::new(Barrier::new(held.len() * 2));
    let handles: Vec<_> = held
        .into_iter()
        .flat_map(|completion| {
            [FetchResult::NoData, FetchResult::NewData].map(|result| {
                let completion = completion.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    completion.complete(result);
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(delivery.count(), 1);
}

#[test]
#[traced_test]
fn failing_delegate_does_not_stop_the_broadcast() {
    let log = CallLog::default();
    let default = Arc::new(
        RecordingDelegate::new("default")
            .handling(&[Callback::WillTerminate])
            .with_log(log.clone()),
    );
    let (host, proxy) = host_with_proxy(Some(default));
    let broken = Arc::new(
        RecordingDelegate::new("broken")
            .failing_on(Callback::WillTerminate)
            .with_log(log.clone()),
    );
    let after = Arc::new(
        RecordingDelegate::new("after")
            .handling(&[Callback::WillTerminate])
            .with_log(log.clone()),
    );
    proxy.add_interceptor(&broken);
    proxy.add_interceptor(&after);

    host.terminate();

    let order: Vec<_> = log.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(order, vec!["default", "broken", "after"]);
    assert!(logs_contain("delegate failed, continuing dispatch"));
    assert!(logs_contain("broken failed in will_terminate"));
}

#[test]
#[traced_test]
fn panicking_delegate_is_isolated() {
    let (host, proxy) = host_with_proxy(None);
    let boom = Arc::new(RecordingDelegate::new("boom").panicking_on(Callback::OpenUrl));
    let yes = Arc::new(RecordingDelegate::new("yes").answering(Callback::OpenUrl, true));
    proxy.add_interceptor(&boom);
    proxy.add_interceptor(&yes);

    assert!(host.open_url("myapp://x"));
    assert_eq!(yes.call_count(Callback::OpenUrl), 1);
    assert!(logs_contain("delegate panicked"));

    // A later dispatch still works: nothing was left locked.
    assert!(host.open_url("myapp://y"));
}

#[test]
fn dropped_interceptor_stops_receiving_callbacks() {
    let (host, proxy) = host_with_proxy(None);
    let transient = Arc::new(RecordingDelegate::new("transient").handling(&[Callback::DidBecomeActive]));
    proxy.add_interceptor(&transient);
    assert_eq!(proxy.snapshot().len(), 1);

    drop(transient);

    assert!(proxy.snapshot().is_empty());
    assert!(!proxy.responds_to(Callback::DidBecomeActive));
    host.become_active();
    assert_eq!(host.skipped(), vec![Callback::DidBecomeActive]);
}

#[test]
fn first_definitive_scene_configuration() {
    let scene = |name: &str| SceneConfiguration {
        name: name.into(),
        role: "window".into(),
        delegate_class: None,
    };
    let default = Arc::new(RecordingDelegate::new("default").handling(&[
        Callback::ConfigurationForConnecting,
    ]));
    let (host, proxy) = host_with_proxy(Some(default.clone()));
    let main = Arc::new(RecordingDelegate::new("main").with_scene(scene("Main")));
    let fallback = Arc::new(RecordingDelegate::new("fallback").with_scene(scene("Fallback")));
    proxy.add_interceptor(&main);
    proxy.add_interceptor(&fallback);

    let chosen = host.connect_scene(&session()).expect("a configuration");

    assert_eq!(chosen.name, "Main");
    assert_eq!(fallback.call_count(Callback::ConfigurationForConnecting), 1);
    assert_eq!(default.call_count(Callback::ConfigurationForConnecting), 1);
}

#[test]
fn custom_events_reach_only_claiming_delegates() {
    let (host, proxy) = host_with_proxy(None);
    let shortcut = Arc::new(RecordingDelegate::new("shortcut").handling_event("quick_action"));
    let other = Arc::new(RecordingDelegate::new("other").handling_event("memory_warning"));
    proxy.add_interceptor(&shortcut);
    proxy.add_interceptor(&other);

    assert!(host.send_event("quick_action", &serde_json::json!({"type": "compose"})));
    assert!(!host.send_event("unknown", &serde_json::Value::Null));

    assert_eq!(shortcut.events_seen(), vec!["quick_action"]);
    assert!(other.events_seen().is_empty());
}

#[test]
fn always_mode_lets_the_host_call_through() {
    let config = DispatchConfig {
        capability_mode: CapabilityMode::Always,
        ..DispatchConfig::default()
    };
    let host = MockHost::new("com.example.app");
    let proxy = Arc::new(MulticastAppDelegate::from_config(&config));
    proxy.install(&host);

    host.terminate();
    assert!(!host.launch(&Default::default()));
    assert!(host.skipped().is_empty());
}

#[test]
fn registration_from_many_threads_during_dispatch() {
    let (host, proxy) = host_with_proxy(None);
    let delegates: Vec<_> = (0..16)
        .map(|i| {
            Arc::new(
                RecordingDelegate::new(format!("d{i}")).handling(&[Callback::DidBecomeActive]),
            )
        })
        .collect();

    thread::scope(|scope| {
        for delegate in &delegates {
            let proxy = &proxy;
            scope.spawn(move || {
                proxy.add_interceptor(delegate);
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                host.become_active();
            }
        });
    });

    assert_eq!(proxy.snapshot().len(), delegates.len());
    host.become_active();
    for delegate in &delegates {
        assert!(delegate.call_count(Callback::DidBecomeActive) >= 1);
    }
}

#[test]
fn host_swapping_multicasts_is_detected() {
    let (host, proxy) = host_with_proxy(None);
    let other = Arc::new(MulticastAppDelegate::new());

    assert_eq!(other.install(&host), InstallOutcome::ForeignMulticast);
    assert_eq!(proxy.install(&host), InstallOutcome::AlreadyInstalled);
}

#[test]
#[serial]
fn shared_proxy_is_one_instance_reached_through_the_host() {
    let original = Arc::new(RecordingDelegate::new("original").answering(Callback::OpenUrl, false));
    let host = MockHost::with_delegate(original.clone());

    assert_eq!(
        install_shared(&host),
        InstallOutcome::Installed {
            wrapped_default: true
        }
    );
    assert!(Arc::ptr_eq(&shared(), &shared()));

    let installed = installed_multicast_delegate(&host).expect("multicast installed");
    let deep_link = Arc::new(RecordingDelegate::new("deep-link").answering(Callback::OpenUrl, true));
    installed.add_interceptor(&deep_link);

    assert!(host.open_url("myapp://promo"));
    assert_eq!(original.call_count(Callback::OpenUrl), 1);

    installed.remove_interceptor(&deep_link);
    assert!(!host.open_url("myapp://promo"));

    shared().set_default(None).unwrap();
}

#[test]
#[serial]
fn shared_proxy_survives_unregistered_teardown() {
    let counter = Arc::new(Mutex::new(0));
    {
        let counter = Arc::clone(&counter);
        let scoped = Arc::new(
            RecordingDelegate::new("scoped")
                .handling(&[Callback::WillTerminate])
                .on_call(move |_| *counter.lock().unwrap() += 1),
        );
        shared().add_interceptor(&scoped);
        shared().will_terminate(&multicast_core::Application::new("app")).unwrap();
    }

    shared().will_terminate(&multicast_core::Application::new("app")).unwrap();
    assert_eq!(*counter.lock().unwrap(), 1);
}
