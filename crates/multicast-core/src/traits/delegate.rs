// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The application delegate surface.

use std::sync::Arc;

use crate::callback::Callback;
use crate::completion::Completion;
use crate::error::DelegateError;
use crate::traits::multicast::MulticastDelegate;
use crate::types::{
    Application, FetchResult, Notification, NotificationCenter, NotificationResponse, Options,
    PresentationOptions, RegistrationError, SceneConfiguration, SceneSession, UserActivity,
};

/// A receiver of host lifecycle callbacks.
///
/// Every callback has a default body, so a delegate only overrides the ones it
/// cares about. Which callbacks it actually implements is declared through
/// [`AppDelegate::responds_to`]; the multicast proxy only invokes a callback on
/// delegates that claim it, and answers the host's own capability query from
/// the same declarations.
pub trait AppDelegate: Send + Sync + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether this delegate implements `callback`.
    fn responds_to(&self, callback: Callback) -> bool;

    /// Whether this delegate handles the custom event `event`, for callbacks
    /// outside the [`Callback`] table.
    fn responds_to_event(&self, _event: &str) -> bool {
        false
    }

    /// The multicast registration surface, if this delegate is (or fronts) a
    /// multicast proxy.
    fn as_multicast(&self) -> Option<&dyn MulticastDelegate> {
        None
    }

    fn did_finish_launching(
        &self,
        _app: &Application,
        _launch_options: &Options,
    ) -> Result<bool, DelegateError> {
        Ok(false)
    }

    fn open_url(
        &self,
        _app: &Application,
        _url: &str,
        _options: &Options,
    ) -> Result<bool, DelegateError> {
        Ok(false)
    }

    fn continue_user_activity(
        &self,
        _app: &Application,
        _activity: &UserActivity,
    ) -> Result<bool, DelegateError> {
        Ok(false)
    }

    fn did_become_active(&self, _app: &Application) -> Result<(), DelegateError> {
        Ok(())
    }

    fn did_enter_background(&self, _app: &Application) -> Result<(), DelegateError> {
        Ok(())
    }

    fn will_terminate(&self, _app: &Application) -> Result<(), DelegateError> {
        Ok(())
    }

    fn did_register_for_remote_notifications(
        &self,
        _app: &Application,
        _device_token: &[u8],
    ) -> Result<(), DelegateError> {
        Ok(())
    }

    fn did_fail_to_register_for_remote_notifications(
        &self,
        _app: &Application,
        _error: &RegistrationError,
    ) -> Result<(), DelegateError> {
        Ok(())
    }

    /// `completion` may be called now or later from any thread; only the
    /// first call across all delegates reaches the host.
    fn did_receive_remote_notification(
        &self,
        _app: &Application,
        _payload: &serde_json::Value,
        _completion: Completion<FetchResult>,
    ) -> Result<(), DelegateError> {
        Ok(())
    }

    fn will_present_notification(
        &self,
        _center: &NotificationCenter,
        _notification: &Notification,
        _completion: Completion<PresentationOptions>,
    ) -> Result<(), DelegateError> {
        Ok(())
    }

    fn did_receive_notification_response(
        &self,
        _center: &NotificationCenter,
        _response: &NotificationResponse,
        _completion: Completion<()>,
    ) -> Result<(), DelegateError> {
        Ok(())
    }

    fn configuration_for_connecting(
        &self,
        _app: &Application,
        _session: &SceneSession,
        _options: &Options,
    ) -> Result<Option<SceneConfiguration>, DelegateError> {
        Ok(None)
    }

    /// Handle a custom event claimed through [`AppDelegate::responds_to_event`].
    fn handle_event(
        &self,
        _app: &Application,
        _event: &str,
        _payload: &serde_json::Value,
    ) -> Result<(), DelegateError> {
        Ok(())
    }
}

/// A shared handle that can be registered with a multicast proxy.
///
/// Covers both a concrete `Arc<D>` and an already type-erased
/// `Arc<dyn AppDelegate>`, so registration APIs accept either.
pub trait DelegateHandle {
    fn to_delegate(&self) -> Arc<dyn AppDelegate>;
}

impl<D: AppDelegate> DelegateHandle for Arc<D> {
    fn to_delegate(&self) -> Arc<dyn AppDelegate> {
        Arc::clone(self) as Arc<dyn AppDelegate>
    }
}

impl DelegateHandle for Arc<dyn AppDelegate> {
    fn to_delegate(&self) -> Arc<dyn AppDelegate> {
        Arc::clone(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quiet;

    impl AppDelegate for Quiet {
        fn responds_to(&self, _callback: Callback) -> bool {
            false
        }
    }

    #[test]
    fn handles_keep_the_same_allocation() {
        let concrete = Arc::new(Quiet);
        let erased: Arc<dyn AppDelegate> = concrete.clone();

        let from_concrete = concrete.to_delegate();
        let from_erased = erased.to_delegate();
        assert!(Arc::ptr_eq(&from_concrete, &from_erased));
        assert_eq!(Arc::strong_count(&concrete), 4);
    }
}
