//! Integration tests for the Store runtime: feedback, cancellation, teardown.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;
use studylog_core::{
    SmallVec, cancellable_delay,
    effect::{Effect, EffectId},
    reducer::Reducer,
    smallvec,
};
use studylog_runtime::{Store, StoreError};

const TIMER: EffectId = EffectId::new("timer");

#[derive(Clone, Debug, Default)]
struct TestState {
    value: i64,
    started: Vec<u32>,
    fired: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
enum TestAction {
    Add(i64),
    Load(i64),
    SlowLoad(i64),
    Loaded(i64),
    Chain,
    StartTimer { tag: u32, ms: u64 },
    StopTimer,
    TimerFired(u32),
}

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut TestState,
        action: TestAction,
        _env: &(),
    ) -> SmallVec<[Effect<TestAction>; 4]> {
        match action {
            TestAction::Add(n) | TestAction::Loaded(n) => {
                state.value += n;
                smallvec![Effect::None]
            },
            TestAction::Load(n) => smallvec![Effect::Future(Box::pin(async move {
                tokio::task::yield_now().await;
                Some(TestAction::Loaded(n))
            }))],
            TestAction::SlowLoad(n) => smallvec![Effect::Future(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Some(TestAction::Loaded(n))
            }))],
            TestAction::Chain => {
                smallvec![Effect::Future(Box::pin(async { Some(TestAction::Load(5)) }))]
            },
            TestAction::StartTimer { tag, ms } => {
                state.started.push(tag);
                smallvec![cancellable_delay! {
                    id: TIMER,
                    duration: Duration::from_millis(ms),
                    action: TestAction::TimerFired(tag)
                }]
            },
            TestAction::StopTimer => smallvec![Effect::Cancel(TIMER)],
            TestAction::TimerFired(tag) => {
                state.fired.push(tag);
                smallvec![Effect::None]
            },
        }
    }
}

fn store() -> Store<TestState, TestAction, (), TestReducer> {
    Store::new(TestState::default(), TestReducer, ())
}

#[tokio::test]
async fn send_reduces_synchronously_and_bumps_revision() {
    let store = store();
    let mut changes = store.subscribe();

    store.send(TestAction::Add(3)).await.unwrap();

    assert_eq!(store.state(|s| s.value).await, 3);
    assert_eq!(store.revision(), 1);
    assert!(changes.has_changed().unwrap());
    changes.mark_unchanged();

    store.send(TestAction::Add(-1)).await.unwrap();
    assert_eq!(*changes.borrow_and_update(), 2);
}

#[tokio::test]
async fn cascading_handle_waits_for_whole_feedback_chain() {
    let store = store();

    let mut handle = store.send_cascading(TestAction::Chain).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    assert!(handle.is_complete());
    assert_eq!(store.state(|s| s.value).await, 5);
}

#[tokio::test]
async fn send_and_wait_for_returns_after_result_is_reduced() {
    let store = store();

    let result = store
        .send_and_wait_for(
            TestAction::Load(7),
            |a| matches!(a, TestAction::Loaded(_)),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Loaded(7));
    assert_eq!(store.state(|s| s.value).await, 7);
}

#[tokio::test(start_paused = true)]
async fn send_and_wait_for_times_out_without_matching_action() {
    let store = store();

    let result = store
        .send_and_wait_for(
            TestAction::Add(1),
            |a| matches!(a, TestAction::Loaded(_)),
            Duration::from_millis(50),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn timers_do_not_hold_effect_handles() {
    let store = store();

    let handle = store
        .send_cascading(TestAction::StartTimer { tag: 1, ms: 3000 })
        .await
        .unwrap();

    assert!(handle.is_complete());
    assert!(store.is_running(TIMER));
}

#[tokio::test(start_paused = true)]
async fn newer_timer_replaces_running_timer() {
    let store = store();

    store
        .send(TestAction::StartTimer { tag: 1, ms: 3000 })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    store
        .send(TestAction::StartTimer { tag: 2, ms: 3000 })
        .await
        .unwrap();

    // First timer's deadline passes without firing
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(store.state(|s| s.fired.is_empty()).await);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(store.state(|s| s.fired.clone()).await, vec![2]);
    assert!(!store.is_running(TIMER));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_timers_keep_the_last_reduced_one() {
    let store = store();

    let sends: Vec<_> = (0..32)
        .map(|tag| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .send(TestAction::StartTimer { tag, ms: 100 })
                    .await
                    .unwrap();
            })
        })
        .collect();
    for send in sends {
        send.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(400)).await;
    let (started, fired) = store.state(|s| (s.started.clone(), s.fired.clone())).await;
    assert_eq!(started.len(), 32);
    assert_eq!(fired.last(), started.last());
    assert!(!store.is_running(TIMER));
}

#[tokio::test(start_paused = true)]
async fn cancel_prevents_timer_from_firing() {
    let store = store();

    store
        .send(TestAction::StartTimer { tag: 1, ms: 3000 })
        .await
        .unwrap();
    store.send(TestAction::StopTimer).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(store.state(|s| s.fired.is_empty()).await);
}

#[tokio::test(start_paused = true)]
async fn teardown_rejects_actions_and_drops_in_flight_results() {
    let store = store();

    store.send(TestAction::SlowLoad(4)).await.unwrap();
    store
        .send(TestAction::StartTimer { tag: 1, ms: 50 })
        .await
        .unwrap();
    store.teardown();
    store.teardown();

    assert!(store.is_torn_down());
    assert_eq!(
        store.send(TestAction::Add(1)).await.unwrap_err(),
        StoreError::TornDown
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    let (value, fired) = store.state(|s| (s.value, s.fired.clone())).await;
    assert_eq!(value, 0);
    assert!(fired.is_empty());
}

#[tokio::test]
async fn feedback_actions_are_broadcast_to_observers() {
    let store = store();
    let mut actions = store.subscribe_actions();

    let mut handle = store.send_cascading(TestAction::Load(2)).await.unwrap();
    handle.wait().await;

    assert_eq!(actions.recv().await.unwrap(), TestAction::Loaded(2));
}
