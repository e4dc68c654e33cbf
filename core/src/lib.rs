//! # Study Log Core
//!
//! Core traits and types for the study log client.
//!
//! The client is built as a functional core with an imperative shell:
//! all behavior lives in reducers that mutate state and return effect
//! descriptions, and a runtime (the `studylog-runtime` crate) executes those
//! effects and feeds their results back as actions.
//!
//! ## Core Concepts
//!
//! - **State**: Client-side state for a feature (cached records, form input, notification)
//! - **Action**: All possible inputs to a reducer (user intents and remote results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution), including cancellable timers
//! - **Environment**: Injected dependencies via traits (clock, remote store)
//!
//! ## Example
//!
//! ```
//! use studylog_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct DraftState {
//!     title: String,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum DraftAction {
//!     SetTitle(String),
//! }
//!
//! struct DraftReducer;
//!
//! impl Reducer for DraftReducer {
//!     type State = DraftState;
//!     type Action = DraftAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut DraftState,
//!         action: DraftAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<DraftAction>; 4]> {
//!         match action {
//!             DraftAction::SetTitle(title) => state.title = title,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = DraftState::default();
//! DraftReducer.reduce(&mut state, DraftAction::SetTitle("Algebra".into()), &());
//! assert_eq!(state.title, "Algebra");
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Declarative macros for effect construction
pub mod effect_macros;

/// Remote store boundary (list/insert/delete on one logical table)
pub mod remote_store;

/// Reducer module - The core trait for client logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all client behavior and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for client logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier for a cancellable effect
    ///
    /// At most one effect is registered per id at any time: registering a new
    /// [`Effect::Cancellable`] under an id that is still running aborts the
    /// previous one.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Creates an effect id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// Returns the id's name
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts, auto-dismiss timers)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run the inner effect under an id so it can be cancelled later
        ///
        /// Registering replaces (and aborts) any effect still running under
        /// the same id.
        Cancellable {
            /// Registration id
            id: EffectId,
            /// Effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort the effect registered under this id, if any
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an effect so it can be cancelled by id
        #[must_use]
        pub fn cancellable(id: EffectId, effect: Effect<Action>) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(effect),
            }
        }

        /// Returns `true` if this is [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use studylog_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
