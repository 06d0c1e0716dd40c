//! Scenario tests for the future execution model.

use csbind_core::{
    AsyncObservable, CsbindError, MutationRequest, ObservableState, UpdateListener, Value,
};
use csbind_protocol::{FIELD_MODE, FIELD_VALUES};
use csbind_testkit::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const INBOUND: &str = "csbindSendroom";
const OUTBOUND: &str = "csbindReceiveroom";

type Fixture = (
    AsyncObservable<Arc<LoopbackTransport>, AsyncMemoryAuthority>,
    Arc<LoopbackTransport>,
    AsyncMemoryAuthority,
    ListenerLog,
);

async fn fixture(latency: Option<Duration>) -> Fixture {
    init_tracing();
    let transport = Arc::new(LoopbackTransport::new());
    let mut authority = AsyncMemoryAuthority::with_records(chats(0..3));
    if let Some(latency) = latency {
        authority = authority.with_latency(latency);
    }
    let (listener, calls) = recording_listener();

    let observable = AsyncObservable::new(
        chat_config("room"),
        Arc::clone(&transport),
        authority.clone(),
        None,
    )
    .unwrap()
    .start(None)
    .await
    .unwrap()
    .add_updates([listener])
    .await;

    (observable, transport, authority, calls)
}

async fn settle_until<F: Fn() -> bool>(done: F) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn insert_splices_multiple_values() {
    let (observable, transport, authority, calls) = fixture(None).await;
    let request = MutationRequest::insert(2, vec![chat(10), chat(11)]);
    observable.set(request.clone(), None).await.unwrap();

    let expected = vec![chat(0), chat(1), chat(10), chat(11), chat(2)];
    assert_eq!(observable.snapshot(), Some(expected.clone()));
    assert_eq!(*calls.lock(), vec![(expected, request.clone())]);
    assert_eq!(transport.published_on(OUTBOUND), vec![request]);
    assert_eq!(authority.mutation_count(), 1);
}

#[tokio::test]
async fn chained_sets_apply_in_order() {
    let (observable, transport, authority, _) = fixture(Some(Duration::from_millis(2))).await;

    observable
        .set(MutationRequest::remove(0), None)
        .await
        .unwrap()
        .set(MutationRequest::edit(0, vec![chat(20)]), None)
        .await
        .unwrap()
        .set(MutationRequest::add(vec![chat(21)]), None)
        .await
        .unwrap();

    let expected = vec![chat(20), chat(2), chat(21)];
    assert_eq!(observable.snapshot(), Some(expected.clone()));
    assert_eq!(authority.records(), expected);
    assert_eq!(transport.published_on(OUTBOUND).len(), 3);
    assert_eq!(authority.mutation_count(), 3);
}

#[tokio::test]
async fn unchanged_rejects() {
    let (observable, transport, authority, calls) = fixture(None).await;
    let (handler, errors) = recording_handler();

    let result = observable
        .set(MutationRequest::insert(0, vec![]), Some(&handler))
        .await;

    assert_eq!(result.err(), Some(CsbindError::Unchanged));
    assert!(errors.lock().is_empty());
    assert!(calls.lock().is_empty());
    assert!(transport.published().is_empty());
    assert_eq!(authority.mutation_count(), 1);
}

#[tokio::test]
async fn contract_failure_goes_to_handler() {
    let (observable, _, authority, _) = fixture(None).await;
    let (handler, errors) = recording_handler();

    let request = MutationRequest::new()
        .with_field(FIELD_MODE, "bogus")
        .with_field(FIELD_VALUES, Vec::<Value>::new());
    let result = observable.set(request.clone(), Some(&handler)).await;
    assert!(result.is_ok());
    assert!(errors.lock()[0].to_string().contains("insert,edit,add,remove"));
    assert_eq!(authority.mutation_count(), 0);

    let err = observable.set(request, None).await.unwrap_err();
    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn index_bounds() {
    let (observable, _, _, _) = fixture(None).await;
    for index in [-1, 4] {
        let err = observable
            .set(MutationRequest::insert(index, vec![chat(9)]), None)
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());
    }
    observable
        .set(MutationRequest::insert(3, vec![chat(9)]), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn authority_failure_rejects() {
    let (observable, _, authority, _) = fixture(None).await;
    authority.fail_next("timeout");
    let err = observable
        .set(MutationRequest::remove(0), None)
        .await
        .unwrap_err();
    assert_eq!(err, CsbindError::authority("timeout"));
    assert_eq!(observable.snapshot(), Some(chats(0..3)));
}

#[tokio::test]
async fn inbound_requests_are_applied_on_a_task() {
    let (observable, transport, authority, calls) = fixture(Some(Duration::from_millis(1))).await;
    transport
        .inject(INBOUND, MutationRequest::add(vec![chat(30)]))
        .unwrap();

    settle_until(|| calls.lock().len() == 1).await;
    assert_eq!(observable.snapshot().map(|s| s.len()), Some(4));
    assert_eq!(transport.published_on(OUTBOUND).len(), 1);
    assert_eq!(observable.stats().inbound, 1);
    assert_eq!(authority.mutation_count(), 1);
}

#[tokio::test]
async fn inbound_check_reconciles() {
    let (observable, transport, authority, calls) = fixture(None).await;

    transport
        .inject(INBOUND, MutationRequest::check(chats(0..3)))
        .unwrap();
    transport
        .inject(INBOUND, MutationRequest::check(chats(0..2)))
        .unwrap();

    settle_until(|| observable.stats().checks == 2).await;
    assert_eq!(
        transport.published_on(OUTBOUND),
        vec![MutationRequest::change_all(chats(0..3))]
    );
    assert!(calls.lock().is_empty());
    assert_eq!(authority.mutation_count(), 0);
}

#[tokio::test]
async fn receive_waits_for_settlement() {
    let (observable, transport, authority, _) = fixture(None).await;
    observable
        .receive(MutationRequest::edit(2, vec![chat(40)]))
        .await
        .unwrap();
    assert_eq!(observable.snapshot(), Some(vec![chat(0), chat(1), chat(40)]));
    assert_eq!(transport.published_on(OUTBOUND).len(), 1);
    assert_eq!(authority.mutation_count(), 1);
}

#[tokio::test]
async fn listeners_run_in_registration_order() {
    let (observable, _, _, first_calls) = fixture(None).await;
    let order = Arc::new(Mutex::new(Vec::new()));
    let tagged = |name: &'static str| {
        let order = Arc::clone(&order);
        Arc::new(move |_: &[Value], _: &MutationRequest| order.lock().push(name)) as UpdateListener
    };
    observable
        .add_updates([tagged("second"), tagged("third")])
        .await
        .add_updates([tagged("fourth")])
        .await;

    observable
        .set(MutationRequest::add(vec![chat(60)]), None)
        .await
        .unwrap();
    assert_eq!(first_calls.lock().len(), 1);
    assert_eq!(*order.lock(), vec!["second", "third", "fourth"]);
}

#[tokio::test]
async fn local_check_operation() {
    let (observable, transport, _, _) = fixture(None).await;
    observable.check(&chats(0..3), None).await.unwrap();
    assert!(transport.published().is_empty());
    observable.check(&chats(1..3), None).await.unwrap();
    assert_eq!(transport.published_on(OUTBOUND).len(), 1);
}

#[tokio::test]
async fn get_reads_the_authority() {
    let (observable, _, authority, _) = fixture(None).await;
    authority.replace(vec![]);
    assert_eq!(observable.get().await.unwrap(), Vec::<Value>::new());
    assert_eq!(observable.snapshot(), Some(chats(0..3)));
}

#[tokio::test]
async fn lifecycle() {
    let observable = AsyncObservable::new(
        chat_config("room"),
        LoopbackTransport::new(),
        AsyncMemoryAuthority::new(),
        None,
    )
    .unwrap();

    assert_eq!(observable.state(), ObservableState::Dormant);
    assert_eq!(
        observable.set(MutationRequest::remove(0), None).await.err(),
        Some(CsbindError::NotStarted)
    );

    observable.start(None).await.unwrap();
    assert_eq!(observable.state(), ObservableState::Active);
    assert_eq!(
        observable.start(None).await.err(),
        Some(CsbindError::AlreadyStarted)
    );
}

#[tokio::test]
async fn overlapping_sets_reach_the_authority() {
    let (observable, _, authority, _) = fixture(Some(Duration::from_millis(3))).await;

    let (first, second) = tokio::join!(
        observable.set(MutationRequest::add(vec![chat(50)]), None),
        observable.set(MutationRequest::add(vec![chat(51)]), None),
    );

    assert!(first.is_ok() || second.is_ok());
    assert_eq!(authority.records().len(), 5);
}
