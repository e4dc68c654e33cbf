//! # Study Log Runtime
//!
//! Runtime implementation for the study log client.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation Registry**: Owns at most one running effect per [`EffectId`]
//! - **Change Subscription**: A revision counter observers re-read state on
//!
//! ## Example
//!
//! ```ignore
//! use studylog_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action and wait for its effects (and their feedback) to settle
//! let mut handle = store.send_cascading(Action::Refresh).await?;
//! handle.wait().await;
//!
//! // Read state
//! let count = store.state(|s| s.records.len()).await;
//! ```

use studylog_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store was torn down and no longer accepts actions
        ///
        /// Returned by `send()` after `teardown()`. Effects that were already
        /// running keep running, but their results are discarded.
        #[error("Store has been torn down")]
        TornDown,

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Effect tracking mode - controls which effects a handle waits for
///
/// # Modes
///
/// - **Direct**: Tracks only effects returned for the sent action (default)
/// - **Cascading**: Also tracks effects of every action those effects feed back
///
/// Timer effects (`Effect::Delay`, alone or wrapped in `Effect::Cancellable`)
/// are detached in both modes: a handle never waits for an auto-dismiss timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Track only immediate effects spawned by this action
    Direct,

    /// Track effects transitively through feedback actions
    Cascading,
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] and [`Store::send_cascading()`] to allow
/// waiting for effects to complete.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send_cascading(Action::Refresh).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The list request finished and its result has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    mode: TrackingMode,
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle with the given tracking mode
    ///
    /// Returns the caller-facing handle and the tracking context threaded
    /// through effect execution.
    fn new(mode: TrackingMode) -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            mode,
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            mode,
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new(TrackingMode::Direct);
        handle
    }

    /// Returns the tracking mode of this handle
    #[must_use]
    pub const fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Returns `true` once every tracked effect has finished
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.effects.load(Ordering::SeqCst) == 0
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("mode", &self.mode)
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    mode: TrackingMode,
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Tracking that nobody waits on (timers, direct-mode feedback)
    fn detached() -> Self {
        EffectHandle::new(TrackingMode::Direct).1
    }

    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }

    /// Tracking to use for an action fed back by an effect
    fn for_feedback(&self) -> Self {
        match self.mode {
            TrackingMode::Cascading => self.clone(),
            TrackingMode::Direct => Self::detached(),
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect
/// panics or is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: registry of running cancellable effects
///
/// Holds at most one abort handle per id. Each registration gets a
/// generation number so a finished effect only releases its own entry.
#[derive(Default)]
struct CancellationRegistry {
    next_generation: AtomicU64,
    entries: Mutex<HashMap<EffectId, (u64, AbortHandle)>>,
}

impl CancellationRegistry {
    /// Register a new effect under `id`, aborting whatever held it before
    fn register(&self, id: EffectId) -> (u64, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let previous = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (generation, handle));

        if let Some((_, previous)) = previous {
            previous.abort();
            metrics::counter!("store.effects.cancelled", "reason" => "replaced").increment(1);
            tracing::trace!(effect_id = %id, "Replaced running cancellable effect");
        }

        (generation, registration)
    }

    /// Remove the entry for `id` if it still belongs to `generation`
    fn release(&self, id: EffectId, generation: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(&id).is_some_and(|(current, _)| *current == generation) {
            entries.remove(&id);
        }
    }

    /// Abort the effect registered under `id`; returns whether one was running
    fn cancel(&self, id: EffectId) -> bool {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        if let Some((_, handle)) = removed {
            handle.abort();
            metrics::counter!("store.effects.cancelled", "reason" => "explicit").increment(1);
            true
        } else {
            false
        }
    }

    /// Abort every registered effect; returns how many were running
    fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        for (_, (_, handle)) in &drained {
            handle.abort();
        }
        drained.len()
    }

    /// Whether an effect is currently registered under `id`
    fn contains(&self, id: EffectId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }
}

/// Returns `true` for effects that only schedule a delayed action
fn is_timer<A>(effect: &Effect<A>) -> bool {
    match effect {
        Effect::Delay { .. } => true,
        Effect::Cancellable { effect, .. } => is_timer(effect),
        _ => false,
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Abortable, Arc, AtomicBool, CancellationRegistry, DecrementGuard, Duration, Effect,
        EffectHandle, EffectId, EffectTracking, Ordering, Reducer, RwLock, StoreError,
        TrackingMode, is_timer,
    };
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::{broadcast, watch};

    /// Boxed effect driver future
    type Drive = Pin<Box<dyn Future<Output = ()> + Send>>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (client logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    /// 5. Change notification for observers
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        torn_down: Arc<AtomicBool>,
        cancellations: Arc<CancellationRegistry>,
        /// Revision counter bumped after every reduced action.
        revision: Arc<watch::Sender<u64>>,
        /// Action broadcast channel for observing actions produced by effects.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                torn_down: Arc::clone(&self.torn_down),
                cancellations: Arc::clone(&self.cancellations),
                revision: Arc::clone(&self.revision),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast capacity defaults to 16 (increase with
        /// [`Store::with_broadcast_capacity`]).
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));
            let (revision, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                torn_down: Arc::new(AtomicBool::new(false)),
                cancellations: Arc::new(CancellationRegistry::default()),
                revision: Arc::new(revision),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts executing the returned effects
        /// 4. Notifies change subscribers
        ///
        /// The returned handle completes once the effects of this action have
        /// finished and any actions they produced have been reduced.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::TornDown`] if the store has been torn down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            let (handle, tracking) = EffectHandle::new(TrackingMode::Direct);
            self.dispatch(action, tracking).await?;
            Ok(handle)
        }

        /// Send an action and track the whole feedback chain
        ///
        /// Like [`Store::send`], but the handle also waits for effects of
        /// every action fed back by those effects (a delete that triggers a
        /// refresh completes only when the refresh result is reduced).
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::TornDown`] if the store has been torn down.
        #[tracing::instrument(skip(self, action), name = "store_send_cascading")]
        pub async fn send_cascading(&self, action: A) -> Result<EffectHandle, StoreError> {
            let (handle, tracking) = EffectHandle::new(TrackingMode::Cascading);
            self.dispatch(action, tracking).await?;
            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so the result
        /// cannot be missed. Actions are broadcast after they are reduced:
        /// when this returns, state already reflects the matching action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::TornDown`]: Store has been torn down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                skipped,
                                "Action observer lagged, {} actions skipped",
                                skipped
                            );
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only feedback actions are broadcast (not actions passed to `send`).
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to state changes
        ///
        /// The receiver yields a revision number that increases after every
        /// reduced action. Observers re-read state through [`Store::state`]
        /// when it changes.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }

        /// Current state revision
        #[must_use]
        pub fn revision(&self) -> u64 {
            *self.revision.borrow()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.records.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Access the injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// Whether an effect is currently registered under `id`
        #[must_use]
        pub fn is_running(&self, id: EffectId) -> bool {
            self.cancellations.contains(id)
        }

        /// Detach the store from its effects
        ///
        /// After teardown the store rejects new actions and aborts every
        /// registered cancellable effect. Futures already in flight (remote
        /// calls) are not aborted: they run to completion, and the actions
        /// they produce are dropped without touching state. Idempotent.
        pub fn teardown(&self) {
            if self.torn_down.swap(true, Ordering::AcqRel) {
                return;
            }
            let cancelled = self.cancellations.cancel_all();
            tracing::info!(cancelled, "Store torn down, in-flight effects detached");
        }

        /// Whether [`Store::teardown`] has been called
        #[must_use]
        pub fn is_torn_down(&self) -> bool {
            self.torn_down.load(Ordering::Acquire)
        }

        /// Run the reducer for one action and start its effects
        async fn dispatch(&self, action: A, tracking: EffectTracking) -> Result<(), StoreError> {
            if self.is_torn_down() {
                tracing::warn!("Rejected action: store has been torn down");
                return Err(StoreError::TornDown);
            }

            metrics::counter!("store.actions.total").increment(1);

            {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let start = std::time::Instant::now();
                let effects = tracing::debug_span!("reducer_execution")
                    .in_scope(|| self.reducer.reduce(&mut state, action, &self.environment));
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                // Effects start under the lock: registrations follow reduce order
                tracing::trace!("Executing {} effects", effects.len());
                for effect in effects {
                    self.execute_effect(effect, &tracking);
                }
            }

            self.revision.send_modify(|revision| *revision += 1);

            Ok(())
        }

        /// Start executing a top-level effect
        ///
        /// `Cancel` and the registration half of `Cancellable` are applied
        /// synchronously, so effects returned together (cancel the old timer,
        /// start a new one) take effect in order.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Cancel(id) => {
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    let cancelled = self.cancellations.cancel(id);
                    tracing::trace!(effect_id = %id, cancelled, "Executed Effect::Cancel");
                },
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("store.effects.executed", "type" => "cancellable")
                        .increment(1);
                    let (generation, registration) = self.cancellations.register(id);
                    let tracking = if is_timer(&effect) {
                        EffectTracking::detached()
                    } else {
                        tracking.clone()
                    };
                    tracking.increment();

                    let store = self.clone();
                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking.clone());
                        let driven = Abortable::new(store.drive(*effect, tracking), registration);
                        if driven.await.is_err() {
                            tracing::trace!(effect_id = %id, "Cancellable effect aborted");
                        }
                        store.cancellations.release(id, generation);
                    });
                },
                other => {
                    let tracking = if is_timer(&other) {
                        EffectTracking::detached()
                    } else {
                        tracking.clone()
                    };
                    tracking.increment();

                    let store = self.clone();
                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking.clone());
                        store.drive(other, tracking).await;
                    });
                },
            }
        }

        /// Drive an effect to completion inside the current task
        fn drive(&self, effect: Effect<A>, tracking: EffectTracking) -> Drive {
            let store = self.clone();
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future")
                            .increment(1);
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feed(action, &tracking).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Delay { duration, action } => {
                        metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");
                        store.feed(*action, &tracking).await;
                    },
                    Effect::Parallel(effects) => {
                        tracing::trace!(
                            "Executing Effect::Parallel with {} effects",
                            effects.len()
                        );
                        let drives = effects
                            .into_iter()
                            .map(|effect| store.drive(effect, tracking.clone()));
                        futures::future::join_all(drives).await;
                    },
                    Effect::Sequential(effects) => {
                        tracing::trace!(
                            "Executing Effect::Sequential with {} effects",
                            effects.len()
                        );
                        for effect in effects {
                            store.drive(effect, tracking.clone()).await;
                        }
                    },
                    Effect::Cancellable { id, effect } => {
                        let (generation, registration) = store.cancellations.register(id);
                        let _ = Abortable::new(store.drive(*effect, tracking), registration).await;
                        store.cancellations.release(id, generation);
                    },
                    Effect::Cancel(id) => {
                        store.cancellations.cancel(id);
                    },
                }
            })
        }

        /// Feed an action produced by an effect back into the store
        ///
        /// Dropped silently once the store is torn down.
        async fn feed(&self, action: A, tracking: &EffectTracking) {
            if self.is_torn_down() {
                metrics::counter!("store.feedback.dropped").increment(1);
                tracing::debug!("Dropping feedback action: store has been torn down");
                return;
            }

            match self.dispatch(action.clone(), tracking.for_feedback()).await {
                Ok(()) => {
                    // Broadcast after reducing so observers see the new state
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    metrics::counter!("store.feedback.dropped").increment(1);
                    tracing::debug!(%error, "Feedback action rejected");
                },
            }
        }
    }
}
