//! Two endpoints joined through loopback transports.
//!
//! The source endpoint's outbound channel is routed into the mirror's
//! inbound channel, so every change accepted by the source is replayed
//! against the mirror's own authority.

use csbind_core::{AsyncObservable, Mode, MutationRequest, Observable, Value};
use csbind_protocol::{decode_payload, encode_payload};
use csbind_testkit::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const NAME: &str = "lobby";

struct Pair {
    source: Observable<Arc<LoopbackTransport>, MemoryAuthority>,
    mirror: Observable<Arc<LoopbackTransport>, MemoryAuthority>,
    source_transport: Arc<LoopbackTransport>,
    mirror_transport: Arc<LoopbackTransport>,
    mirror_authority: MemoryAuthority,
}

fn pair() -> Pair {
    init_tracing();
    let source_transport = Arc::new(LoopbackTransport::new());
    let mirror_transport = Arc::new(LoopbackTransport::new());
    LoopbackTransport::connect(&source_transport, &mirror_transport, NAME);

    let mirror_authority = MemoryAuthority::with_records(chats(0..3));
    let source = Observable::new(
        chat_config(NAME),
        Arc::clone(&source_transport),
        MemoryAuthority::with_records(chats(0..3)),
        None,
    )
    .unwrap();
    let mirror = Observable::new(
        chat_config(NAME),
        Arc::clone(&mirror_transport),
        mirror_authority.clone(),
        None,
    )
    .unwrap();
    source.start(None).unwrap();
    mirror.start(None).unwrap();

    Pair {
        source,
        mirror,
        source_transport,
        mirror_transport,
        mirror_authority,
    }
}

#[test]
fn mirror_follows_source() {
    let p = pair();
    p.source
        .set(MutationRequest::insert(1, vec![chat(10)]), None)
        .unwrap()
        .set(MutationRequest::remove(3), None)
        .unwrap()
        .set(MutationRequest::edit(0, vec![chat(11)]), None)
        .unwrap();

    assert_eq!(p.mirror.snapshot(), p.source.snapshot());
    assert_eq!(p.mirror_authority.records(), vec![chat(11), chat(10), chat(1)]);
    assert!(p.source_transport.delivery_errors().is_empty());
    assert_eq!(p.mirror.stats().inbound, 3);
}

#[test]
fn mirror_relays_what_it_applied() {
    let p = pair();
    let request = MutationRequest::add(vec![chat(12)]).with_correlation_id();
    p.source.set(request.clone(), None).unwrap();

    let relayed = p
        .mirror_transport
        .published_on(&p.mirror.channels().outbound);
    assert_eq!(relayed, vec![request]);
}

#[test]
fn check_from_mirror_detects_drift() {
    let p = pair();
    // The mirror's own outbound channel is not routed back, so this change
    // stays local to the mirror.
    p.mirror.set(MutationRequest::add(vec![chat(14)]), None).unwrap();
    assert_ne!(p.mirror.snapshot(), p.source.snapshot());

    let inbound = p.source.channels().inbound.clone();
    p.source_transport
        .inject(&inbound, MutationRequest::check(p.mirror.snapshot().unwrap()))
        .unwrap();

    let pushes = p
        .source_transport
        .published_on(&p.source.channels().outbound);
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].mode(), Some(Mode::ChangeAll));
    assert_eq!(pushes[0].values(), p.source.snapshot().as_deref());

    // Full pushes are not an inbound mode, so the mirror refuses the replay.
    let refused = p.source_transport.delivery_errors();
    assert_eq!(refused.len(), 1);
    assert!(refused[0].is_contract_violation());
}

#[test]
fn matching_check_is_quiet() {
    let p = pair();
    let inbound = p.source.channels().inbound.clone();
    p.source_transport
        .inject(&inbound, MutationRequest::check(p.mirror.snapshot().unwrap()))
        .unwrap();
    assert!(p.source_transport.published().is_empty());
}

#[test]
fn payloads_survive_a_byte_transport() {
    let p = pair();
    let request = MutationRequest::insert(0, vec![chat(13)]).with_field("origin", "tablet");
    p.source.set(request.clone(), None).unwrap();

    let published = p.source_transport.published_on(&p.source.channels().outbound);
    let bytes = encode_payload(&published[0]).unwrap();
    assert_eq!(decode_payload(&bytes).unwrap(), request);
}

#[test]
fn check_through_bytes_matches_fine_grained_dates() {
    let p = pair();
    let stamp = base_time() + chrono::Duration::nanoseconds(123_456_789);
    let mut record = chat(15);
    if let Some(fields) = record.as_map_mut() {
        fields.insert("date".to_string(), Value::from(stamp));
    }
    p.source.set(MutationRequest::add(vec![record]), None).unwrap();
    p.source_transport.clear();

    let check = MutationRequest::check(p.mirror.snapshot().unwrap());
    let wire = decode_payload(&encode_payload(&check).unwrap()).unwrap();
    let inbound = p.source.channels().inbound.clone();
    p.source_transport.inject(&inbound, wire).unwrap();

    assert_eq!(p.mirror.snapshot(), p.source.snapshot());
    assert!(p.source_transport.published().is_empty());
    assert_eq!(p.source.stats().resyncs_sent, 0);
}

#[tokio::test]
async fn async_mirror_follows_source() {
    init_tracing();
    let source_transport = Arc::new(LoopbackTransport::new());
    let mirror_transport = Arc::new(LoopbackTransport::new());
    LoopbackTransport::connect(&source_transport, &mirror_transport, NAME);

    let source = AsyncObservable::new(
        chat_config(NAME),
        Arc::clone(&source_transport),
        AsyncMemoryAuthority::with_records(chats(0..2)).with_latency(Duration::from_millis(1)),
        None,
    )
    .unwrap();
    let mirror = AsyncObservable::new(
        chat_config(NAME),
        Arc::clone(&mirror_transport),
        AsyncMemoryAuthority::with_records(chats(0..2)),
        None,
    )
    .unwrap();
    source.start(None).await.unwrap();
    mirror.start(None).await.unwrap();

    source
        .set(MutationRequest::add(vec![chat(20)]), None)
        .await
        .unwrap();

    for _ in 0..100 {
        if mirror.snapshot() == source.snapshot() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(mirror.snapshot(), Some(vec![chat(0), chat(1), chat(20)]));
}
