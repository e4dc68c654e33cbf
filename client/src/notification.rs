//! Single-slot transient notifications with auto-expiry.
//!
//! Success and validation messages clear themselves after a delay; backend
//! errors stay until something replaces or clears them. Exactly one timer is
//! live at a time: it runs under [`NOTIFICATION_TIMER`], so scheduling a new
//! one aborts the old one, and every timer carries a [`TimerToken`] so a
//! late expiry for a superseded timer is ignored.

use crate::error::ClientError;
use crate::types::AppAction;
use std::fmt;
use std::time::Duration;
use studylog_core::cancellable_delay;
use studylog_core::effect::{Effect, EffectId};

/// Registration id of the auto-clear timer
pub const NOTIFICATION_TIMER: EffectId = EffectId::new("notification-timer");

/// Default auto-clear delay
pub const DEFAULT_NOTIFICATION_DELAY: Duration = Duration::from_millis(3000);

/// Text shown for [`Notification::ValidationError`]
pub const VALIDATION_MESSAGE: &str = "Please enter a title and a time greater than 0.";

/// What the notification slot currently shows
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Notification {
    /// Nothing shown
    #[default]
    None,
    /// An operation succeeded
    Success(String),
    /// Input failed local validation
    ValidationError,
    /// The remote store failed or is unusable
    BackendError(String),
}

impl Notification {
    /// Whether nothing is shown
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether this variant clears itself after the notification delay
    #[must_use]
    pub const fn auto_clears(&self) -> bool {
        matches!(self, Self::Success(_) | Self::ValidationError)
    }

    /// Text to display, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Success(message) | Self::BackendError(message) => Some(message.as_str()),
            Self::ValidationError => Some(VALIDATION_MESSAGE),
        }
    }
}

/// Identifies one scheduled auto-clear
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of the notification slot and its auto-clear timer
#[derive(Clone, Debug, Default)]
pub struct NotificationController {
    current: Notification,
    timer: Option<TimerToken>,
    next_token: u64,
}

impl NotificationController {
    /// The notification currently shown
    #[must_use]
    pub const fn current(&self) -> &Notification {
        &self.current
    }

    /// Token of the outstanding auto-clear, if one is scheduled
    #[must_use]
    pub const fn pending_timer(&self) -> Option<TimerToken> {
        self.timer
    }

    /// Show a success message that clears after `delay`
    pub fn show_success(
        &mut self,
        message: impl Into<String>,
        delay: Duration,
    ) -> Effect<AppAction> {
        self.show(Notification::Success(message.into()), delay)
    }

    /// Show the validation error, clearing after `delay`
    pub fn show_validation_error(&mut self, delay: Duration) -> Effect<AppAction> {
        self.show(Notification::ValidationError, delay)
    }

    /// Show a backend error; it stays until replaced or cleared
    pub fn show_backend_error(&mut self, message: impl Into<String>) -> Effect<AppAction> {
        self.show(Notification::BackendError(message.into()), Duration::ZERO)
    }

    /// Show the notification for a failed operation
    ///
    /// Validation failures auto-clear after `delay`; configuration and
    /// remote failures show their message until replaced.
    pub fn show_error(&mut self, error: &ClientError, delay: Duration) -> Effect<AppAction> {
        match error {
            ClientError::Validation => self.show_validation_error(delay),
            ClientError::Configuration(_) | ClientError::Remote(_) => {
                self.show_backend_error(error.to_string())
            },
        }
    }

    /// Replace the slot with `notification`
    ///
    /// The outstanding timer is always invalidated first. Auto-clearing
    /// variants schedule a fresh timer for `delay`, which replaces the old
    /// registration; the others cancel it.
    fn show(&mut self, notification: Notification, delay: Duration) -> Effect<AppAction> {
        self.timer = None;

        if notification.is_none() {
            self.current = Notification::None;
            return Effect::Cancel(NOTIFICATION_TIMER);
        }

        tracing::debug!(?notification, "Showing notification");
        let auto_clears = notification.auto_clears();
        self.current = notification;

        if !auto_clears {
            return Effect::Cancel(NOTIFICATION_TIMER);
        }

        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.timer = Some(token);

        cancellable_delay! {
            id: NOTIFICATION_TIMER,
            duration: delay,
            action: AppAction::NotificationExpired { token }
        }
    }

    /// Reset to [`Notification::None`] and cancel any timer. Idempotent.
    pub fn clear(&mut self) -> Effect<AppAction> {
        self.show(Notification::None, Duration::ZERO)
    }

    /// Apply a fired timer
    ///
    /// Only the outstanding token clears the slot; returns whether it did.
    pub fn expire(&mut self, token: TimerToken) -> bool {
        if self.timer != Some(token) {
            tracing::trace!(%token, "Ignoring stale notification timer");
            return false;
        }

        self.timer = None;
        self.current = Notification::None;
        true
    }

    /// Clear a live backend error (after a successful operation)
    ///
    /// Backend errors never own a timer, so no effect is needed.
    pub fn dismiss_backend_error(&mut self) -> bool {
        if matches!(self.current, Notification::BackendError(_)) {
            self.current = Notification::None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use studylog_core::remote_store::RemoteStoreError;
    use studylog_testing::assertions::{assert_has_cancel_effect, assert_has_cancellable_delay};

    const DELAY: Duration = DEFAULT_NOTIFICATION_DELAY;

    #[test]
    fn success_schedules_expiry_for_its_own_token() {
        let mut controller = NotificationController::default();

        let effect = controller.show_success("data registered", DELAY);

        assert_eq!(
            controller.current(),
            &Notification::Success("data registered".to_string())
        );
        let token = controller.pending_timer();
        assert!(token.is_some());
        let effects = [effect];
        let (delay, action) = assert_has_cancellable_delay(&effects, NOTIFICATION_TIMER);
        assert_eq!(delay, DELAY);
        assert!(matches!(action, AppAction::NotificationExpired { token: t } if Some(*t) == token));
    }

    #[test]
    fn newer_notification_invalidates_older_token() {
        let mut controller = NotificationController::default();

        let _ = controller.show_success("first", DELAY);
        let first = controller.pending_timer();
        let _ = controller.show_validation_error(DELAY);
        let second = controller.pending_timer();
        assert_ne!(first, second);

        // The superseded timer firing late must not clear the newer message
        let stale = first.unwrap_or_else(|| unreachable!("first timer missing"));
        assert!(!controller.expire(stale));
        assert_eq!(controller.current(), &Notification::ValidationError);

        let live = second.unwrap_or_else(|| unreachable!("second timer missing"));
        assert!(controller.expire(live));
        assert!(controller.current().is_none());
    }

    #[test]
    fn backend_error_cancels_timer_and_persists() {
        let mut controller = NotificationController::default();
        let _ = controller.show_success("saved", DELAY);
        let token = controller.pending_timer();

        let effect = controller.show_backend_error("timeout");

        assert_has_cancel_effect(&[effect], NOTIFICATION_TIMER);
        assert_eq!(controller.pending_timer(), None);
        if let Some(token) = token {
            assert!(!controller.expire(token));
        }
        assert_eq!(
            controller.current(),
            &Notification::BackendError("timeout".to_string())
        );
    }

    #[test]
    fn errors_map_onto_their_notifications() {
        let mut controller = NotificationController::default();

        let effect = controller.show_error(&ClientError::Validation, DELAY);
        assert_eq!(controller.current(), &Notification::ValidationError);
        assert_has_cancellable_delay(&[effect], NOTIFICATION_TIMER);

        let remote = ClientError::from(RemoteStoreError::Network("timeout".to_string()));
        let effect = controller.show_error(&remote, DELAY);
        assert_has_cancel_effect(&[effect], NOTIFICATION_TIMER);
        assert_eq!(
            controller.current(),
            &Notification::BackendError("timeout".to_string())
        );

        let not_ready = ClientError::from(ConfigError::MissingAccessKey);
        let _ = controller.show_error(&not_ready, DELAY);
        assert_eq!(
            controller.current(),
            &Notification::BackendError("client not ready".to_string())
        );
        assert_eq!(controller.pending_timer(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut controller = NotificationController::default();
        let _ = controller.show_validation_error(DELAY);

        assert_has_cancel_effect(&[controller.clear()], NOTIFICATION_TIMER);
        assert_has_cancel_effect(&[controller.clear()], NOTIFICATION_TIMER);
        assert!(controller.current().is_none());
        assert_eq!(controller.pending_timer(), None);
    }

    #[test]
    fn dismiss_only_touches_backend_errors() {
        let mut controller = NotificationController::default();
        let _ = controller.show_success("saved", DELAY);
        assert!(!controller.dismiss_backend_error());

        let _ = controller.show_backend_error("boom");
        assert!(controller.dismiss_backend_error());
        assert!(controller.current().is_none());
    }

    #[test]
    fn messages_render() {
        assert_eq!(Notification::None.message(), None);
        assert_eq!(Notification::ValidationError.message(), Some(VALIDATION_MESSAGE));
        assert_eq!(
            Notification::BackendError("timeout".into()).message(),
            Some("timeout")
        );
    }
}
