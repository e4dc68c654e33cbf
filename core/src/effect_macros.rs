//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants, particularly
//! for remote store calls and auto-dismiss timers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use studylog_core::async_effect;
///
/// async_effect! {
///     let result = store.list(SortOrder::Descending).await;
///     Some(AppAction::RecordsLoaded { result })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use studylog_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: AppAction::NotificationExpired { token }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` wrapping a delayed action
///
/// The timer is registered under `id`; a later timer with the same id, or an
/// `Effect::Cancel(id)`, aborts it before it fires.
///
/// # Example
///
/// ```rust,ignore
/// use studylog_core::cancellable_delay;
///
/// cancellable_delay! {
///     id: NOTIFICATION_TIMER,
///     duration: Duration::from_secs(3),
///     action: AppAction::NotificationExpired { token }
/// }
/// ```
#[macro_export]
macro_rules! cancellable_delay {
    (
        id: $id:expr,
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::delay! {
                duration: $duration,
                action: $action
            }),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::{Effect, EffectId};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        Loaded { count: usize },
        Expired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Loaded { count: 3 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(3),
            action: TestAction::Expired
        };

        assert!(matches!(effect, Effect::Delay { .. }));
    }

    #[test]
    fn test_cancellable_delay_macro() {
        let effect = cancellable_delay! {
            id: EffectId::new("notification-timer"),
            duration: Duration::from_secs(3),
            action: TestAction::Expired
        };

        let Effect::Cancellable { id, effect } = effect else {
            unreachable!("expected a cancellable effect");
        };
        assert_eq!(id.as_str(), "notification-timer");
        assert!(matches!(
            *effect,
            Effect::Delay { duration, .. } if duration == Duration::from_secs(3)
        ));
    }

    #[tokio::test]
    async fn test_async_effect_resolves_to_action() {
        let effect = async_effect! { Some(TestAction::Loaded { count: 2 }) };
        let Effect::Future(fut) = effect else {
            unreachable!("expected a future effect");
        };

        assert!(matches!(fut.await, Some(TestAction::Loaded { count: 2 })));
    }
}
