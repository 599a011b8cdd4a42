//! Integration test: event log ordering and snapshot/restore of the full
//! ledger.

use std::sync::Arc;

use trustweave_core::config::DEFAULT_DECAY_PERIOD_SECS;
use trustweave_core::{Domain, ErrorKind, LedgerEvent, Role};
use trustweave_crypto::{hash, hash_text};
use trustweave_integration_tests::{addr, deployer, Harness};
use trustweave_ledger::{Ledger, LedgerSnapshot};

/// Drive a ledger through every kind of operation.
fn populated() -> Harness {
    let mut h = Harness::new();
    let (alice, bob, carol) = (addr(0xa1), addr(0xb0), addr(0xc0));
    h.register_all(&[alice, bob, carol]);

    let edge = h
        .ledger
        .create_relationship(alice, bob, 10, hash_text("friends"))
        .unwrap();
    h.ledger.update_edge_weight(alice, edge, 20).unwrap();
    let tomb = h
        .ledger
        .create_relationship(bob, carol, 1, hash_text("old"))
        .unwrap();
    h.ledger.deactivate_edge(bob, tomb).unwrap();

    h.tracked(addr(0xd0));
    h.ledger.initialize_reputation(alice, alice).unwrap();
    h.ledger.initialize_reputation(alice, bob).unwrap();
    h.ledger
        .batch_update_reputation(deployer(), &[alice, bob], &[900_000, 100_000])
        .unwrap();

    h.ledger
        .grant_role(deployer(), Domain::Proofs, Role::Verifier, carol)
        .unwrap();
    let proof = h.ledger.submit_proof(alice, hash(b"proof-1"), &[1]).unwrap();
    h.ledger.verify_proof(carol, proof, alice, bob, true).unwrap();
    h.ledger.submit_proof(bob, hash(b"proof-2"), &[]).unwrap();

    h.ledger.deactivate(carol).unwrap();
    h.clock.advance(DEFAULT_DECAY_PERIOD_SECS);
    h
}

fn restore(h: &Harness) -> Ledger {
    let bytes = h.ledger.snapshot().to_json_bytes().unwrap();
    let snapshot = LedgerSnapshot::from_json_bytes(&bytes).unwrap();
    Ledger::from_snapshot(snapshot, h.ledger.events_since(0), Arc::new(h.clock.clone()))
}

// =========================================================================
// Event log
// =========================================================================

#[test]
fn test_sequence_numbers_are_contiguous() {
    let h = populated();
    let records = h.ledger.events_since(0);
    assert!(!records.is_empty());
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.seq, i as u64 + 1);
    }
    assert_eq!(h.ledger.last_event_seq(), records.len() as u64);
}

#[test]
fn test_failed_operations_append_nothing() {
    let mut h = populated();
    let seq = h.ledger.last_event_seq();
    let (alice, bob) = (addr(0xa1), addr(0xb0));

    assert!(h.ledger.register(alice, String::new()).is_err());
    assert!(h.ledger.create_relationship(bob, bob, 1, hash_text("x")).is_err());
    assert!(h.ledger.update_reputation(bob, alice, 1).is_err());
    assert!(h.ledger.initialize_reputation(bob, alice).is_err());
    assert!(h.ledger.update_decay_parameters(deployer(), 1, 0).is_err());
    assert!(h
        .ledger
        .grant_role(alice, Domain::Registry, Role::Admin, alice)
        .is_err());

    assert_eq!(h.ledger.last_event_seq(), seq);
}

#[test]
fn test_events_serialize_as_tagged_json() {
    let h = populated();
    let json = serde_json::to_value(h.ledger.events_since(0)).unwrap();
    let first = &json[0];
    assert_eq!(first["seq"], 1);
    assert_eq!(first["event"]["type"], "node_registered");

    let kinds: Vec<&str> = h
        .ledger
        .events_since(0)
        .iter()
        .map(|r| r.event.name())
        .collect();
    for expected in [
        "edge_created",
        "relationship_created",
        "edge_updated",
        "edge_deactivated",
        "reputation_updated",
        "role_granted",
        "proof_submitted",
        "proof_verified",
        "node_deactivated",
    ] {
        assert!(kinds.contains(&expected), "missing {expected}");
    }
}

#[tokio::test]
async fn test_subscriber_sees_every_append() {
    let mut h = Harness::new();
    let mut rx = h.ledger.subscribe();
    h.register_all(&[addr(1), addr(2)]);

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!((first.seq, second.seq), (1, 2));
    assert_eq!(
        second.event,
        LedgerEvent::NodeRegistered {
            node: addr(2),
            timestamp: h.ledger.now()
        }
    );
}

// =========================================================================
// Snapshot / restore
// =========================================================================

#[test]
fn test_restore_reproduces_queries() {
    let h = populated();
    let restored = restore(&h);
    let (alice, bob, carol) = (addr(0xa1), addr(0xb0), addr(0xc0));

    assert_eq!(restored.status(), h.ledger.status());
    for who in [alice, bob, carol, addr(0xd0)] {
        assert_eq!(restored.is_active(&who), h.ledger.is_active(&who));
        assert_eq!(restored.edges_for_node(&who), h.ledger.edges_for_node(&who));
        assert_eq!(
            restored.get_reputation(&who).ok(),
            h.ledger.get_reputation(&who).ok()
        );
    }
    for id in h.ledger.edges_for_node(&bob) {
        assert_eq!(restored.edge(id).unwrap(), h.ledger.edge(id).unwrap());
    }
    assert!(restored.is_connection_verified(&bob, &alice));
    assert_eq!(restored.connection(&alice, &bob), h.ledger.connection(&alice, &bob));
    assert_eq!(restored.decay_parameters(), h.ledger.decay_parameters());
    assert_eq!(restored.events_since(0), h.ledger.events_since(0));

    // Decay is read against the same clock, so both agree.
    assert_eq!(restored.get_reputation(&alice).unwrap(), 855_000);

    for domain in [Domain::Registry, Domain::Reputation, Domain::Proofs] {
        for role in Role::ALL {
            assert_eq!(
                restored.access(domain).members(role),
                h.ledger.access(domain).members(role)
            );
        }
    }
}

#[test]
fn test_restore_continues_id_derivation() {
    let mut h = populated();
    let mut restored = restore(&h);
    let (alice, bob) = (addr(0xa1), addr(0xb0));

    let existing: Vec<_> = h.ledger.edges_for_node(&alice).to_vec();
    let next_original = h
        .ledger
        .create_relationship(alice, bob, 10, hash_text("friends"))
        .unwrap();
    let next_restored = restored
        .create_relationship(alice, bob, 10, hash_text("friends"))
        .unwrap();
    assert_eq!(next_original, next_restored);
    assert!(!existing.contains(&next_restored));

    let p_original = h.ledger.submit_proof(alice, hash(b"proof-1"), &[1]).unwrap();
    let p_restored = restored.submit_proof(alice, hash(b"proof-1"), &[1]).unwrap();
    assert_eq!(p_original, p_restored);
    assert!(!restored.is_proof_verified(&p_restored));
    assert_eq!(restored.last_event_seq(), h.ledger.last_event_seq());
}

#[test]
fn test_restored_roles_still_enforced() {
    let h = populated();
    let mut restored = restore(&h);
    let (alice, carol) = (addr(0xa1), addr(0xc0));

    let err = restored.update_reputation(carol, alice, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    restored.update_reputation(deployer(), alice, 1).unwrap();
    let id = restored.submit_proof(alice, hash(b"p"), &[]).unwrap();
    restored.verify_proof(carol, id, alice, carol, true).unwrap();
}

#[test]
fn test_corrupt_snapshot_rejected() {
    let err = LedgerSnapshot::from_json_bytes(b"{\"config\": 1}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidEncoding);
}
