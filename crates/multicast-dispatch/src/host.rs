// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide proxy instance and installation into a host delegate slot.

use std::sync::{Arc, OnceLock};

use multicast_config::DispatchConfig;
use multicast_core::{AppDelegate, DelegateHandle, DelegateHost, MulticastDelegate};
use tracing::{info, warn};

use crate::proxy::MulticastAppDelegate;
use crate::registry::DelegateKey;

static SHARED: OnceLock<Arc<MulticastAppDelegate>> = OnceLock::new();

/// The process-wide proxy, created with default settings on first access.
pub fn shared() -> Arc<MulticastAppDelegate> {
    Arc::clone(SHARED.get_or_init(|| Arc::new(MulticastAppDelegate::new())))
}

/// Create the process-wide proxy from `config`.
///
/// Only the first initialization applies its configuration; later calls log
/// a warning and return the existing instance.
pub fn init_shared(config: &DispatchConfig) -> Arc<MulticastAppDelegate> {
    let mut created = false;
    let proxy = SHARED.get_or_init(|| {
        created = true;
        Arc::new(MulticastAppDelegate::from_config(config))
    });
    if !created {
        warn!("shared multicast already initialized, configuration ignored");
    }
    Arc::clone(proxy)
}

/// What [`MulticastAppDelegate::install`] did to the host slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The proxy now occupies the slot. `wrapped_default` is true when the
    /// slot's previous delegate became the proxy's default.
    Installed { wrapped_default: bool },
    /// This proxy was already in the slot.
    AlreadyInstalled,
    /// Another multicast occupies the slot and was left in place.
    ForeignMulticast,
}

impl MulticastAppDelegate {
    /// Put this proxy into `host`'s delegate slot, wrapping whatever delegate
    /// the host had as the proxy's default.
    pub fn install(self: &Arc<Self>, host: &dyn DelegateHost) -> InstallOutcome {
        let current = host.delegate();

        if let Some(existing) = &current {
            if let Some(multicast) = existing.as_multicast() {
                if DelegateKey::of_ref(multicast) == DelegateKey::of_ref(self.as_ref()) {
                    return InstallOutcome::AlreadyInstalled;
                }
                warn!(
                    delegate = existing.name(),
                    "host already holds a different multicast, leaving it installed"
                );
                return InstallOutcome::ForeignMulticast;
            }
        }

        let wrapped_default = current.is_some();
        if let Some(original) = current {
            info!(default = original.name(), "wrapping host delegate");
            if let Err(err) = self.set_default(Some(original)) {
                warn!(%err, "host delegate cannot be wrapped, leaving it installed");
                return InstallOutcome::ForeignMulticast;
            }
        }

        let proxy: Arc<dyn AppDelegate> = Arc::clone(self) as Arc<dyn AppDelegate>;
        host.set_delegate(Some(proxy));
        info!(wrapped_default, "multicast installed");
        InstallOutcome::Installed { wrapped_default }
    }
}

/// Install the process-wide proxy into `host`.
pub fn install_shared(host: &dyn DelegateHost) -> InstallOutcome {
    shared().install(host)
}

/// The multicast currently occupying `host`'s delegate slot, if any.
pub fn installed_multicast_delegate(host: &dyn DelegateHost) -> Option<InstalledMulticast> {
    host.delegate()
        .filter(|d| d.as_multicast().is_some())
        .map(|delegate| InstalledMulticast { delegate })
}

/// Handle on a multicast found in a host slot.
///
/// Keeps the slot's delegate alive and manages interceptors through its
/// [`MulticastDelegate`] view, so adapters wrapping a proxy work as well.
#[derive(Clone)]
pub struct InstalledMulticast {
    delegate: Arc<dyn AppDelegate>,
}

impl InstalledMulticast {
    pub fn delegate(&self) -> &Arc<dyn AppDelegate> {
        &self.delegate
    }

    pub fn add_interceptor(&self, interceptor: &impl DelegateHandle) {
        if let Some(multicast) = self.multicast() {
            multicast.register_interceptor(&interceptor.to_delegate());
        }
    }

    pub fn remove_interceptor(&self, interceptor: &impl DelegateHandle) {
        if let Some(multicast) = self.multicast() {
            multicast.unregister_interceptor(&interceptor.to_delegate());
        }
    }

    pub fn interceptor_count(&self) -> usize {
        self.multicast().map_or(0, |m| m.interceptor_count())
    }

    fn multicast(&self) -> Option<&dyn MulticastDelegate> {
        self.delegate.as_multicast()
    }
}

impl std::fmt::Debug for InstalledMulticast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledMulticast")
            .field("delegate", &self.delegate.name())
            .field("interceptors", &self.interceptor_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use multicast_core::Callback;

    use super::*;

    #[derive(Default)]
    struct Slot(Mutex<Option<Arc<dyn AppDelegate>>>);

    impl DelegateHost for Slot {
        fn delegate(&self) -> Option<Arc<dyn AppDelegate>> {
            self.0.lock().unwrap().clone()
        }

        fn set_delegate(&self, delegate: Option<Arc<dyn AppDelegate>>) {
            *self.0.lock().unwrap() = delegate;
        }
    }

    struct Original;

    impl AppDelegate for Original {
        fn name(&self) -> &str {
            "original"
        }

        fn responds_to(&self, callback: Callback) -> bool {
            callback == Callback::WillTerminate
        }
    }

    #[test]
    fn install_wraps_existing_delegate() {
        let host = Slot::default();
        host.set_delegate(Some(Arc::new(Original)));
        let proxy = Arc::new(MulticastAppDelegate::new());

        let outcome = proxy.install(&host);

        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                wrapped_default: true
            }
        );
        assert_eq!(proxy.default_delegate().unwrap().name(), "original");
        assert_eq!(host.delegate().unwrap().name(), "multicast");
        assert!(host.delegate().unwrap().responds_to(Callback::WillTerminate));
    }

    #[test]
    fn install_into_empty_slot() {
        let host = Slot::default();
        let proxy = Arc::new(MulticastAppDelegate::new());
        assert_eq!(
            proxy.install(&host),
            InstallOutcome::Installed {
                wrapped_default: false
            }
        );
        assert!(proxy.default_delegate().is_none());
    }

    #[test]
    fn installing_twice_is_a_no_op() {
        let host = Slot::default();
        host.set_delegate(Some(Arc::new(Original)));
        let proxy = Arc::new(MulticastAppDelegate::new());

        proxy.install(&host);
        assert_eq!(proxy.install(&host), InstallOutcome::AlreadyInstalled);
        // The default must still be the original, not the proxy itself.
        assert_eq!(proxy.default_delegate().unwrap().name(), "original");
    }

    #[test]
    fn foreign_multicast_is_left_in_place() {
        let host = Slot::default();
        let first = Arc::new(MulticastAppDelegate::new());
        let second = Arc::new(MulticastAppDelegate::new());

        first.install(&host);
        assert_eq!(second.install(&host), InstallOutcome::ForeignMulticast);

        let installed = installed_multicast_delegate(&host).unwrap();
        assert!(std::ptr::addr_eq(
            Arc::as_ptr(installed.delegate()),
            Arc::as_ptr(&first)
        ));
    }

    #[test]
    fn lookup_ignores_plain_delegates() {
        let host = Slot::default();
        assert!(installed_multicast_delegate(&host).is_none());
        host.set_delegate(Some(Arc::new(Original)));
        assert!(installed_multicast_delegate(&host).is_none());
    }

    #[test]
    fn installed_handle_manages_interceptors() {
        let host = Slot::default();
        let proxy = Arc::new(MulticastAppDelegate::new());
        proxy.install(&host);

        let installed = installed_multicast_delegate(&host).unwrap();
        let extra = Arc::new(Original);
        installed.add_interceptor(&extra);
        assert_eq!(proxy.interceptor_count(), 1);
        installed.remove_interceptor(&extra);
        assert_eq!(installed.interceptor_count(), 0);
    }
    #[test]
    fn installed_handle_accepts_type_erased_interceptors() {
        let host = Slot::default();
        let proxy = Arc::new(MulticastAppDelegate::new());
        proxy.install(&host);

        let installed = installed_multicast_delegate(&host).unwrap();
        let extra: Arc<dyn AppDelegate> = Arc::new(Original);
        installed.add_interceptor(&extra);
        assert!(proxy.registry().contains(&extra));
        installed.remove_interceptor(&extra);
        assert!(!proxy.registry().contains(&extra));
    }
}
