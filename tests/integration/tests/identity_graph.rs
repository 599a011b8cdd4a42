//! Integration test: identity registration and the relationship graph.
//!
//! Drives IdentityRegistry and GraphStore through the Ledger facade.

use trustweave_core::{ErrorKind, LedgerError};
use trustweave_crypto::hash_text;
use trustweave_integration_tests::{addr, Harness, T0};

// =========================================================================
// Identities
// =========================================================================

#[test]
fn test_register_twice_fails_even_after_deactivation() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.register_all(&[alice]);

    let err = h.ledger.register(alice, "again".into()).unwrap_err();
    assert_eq!(err, LedgerError::AlreadyRegistered(alice));

    h.ledger.deactivate(alice).unwrap();
    let err = h.ledger.register(alice, "again".into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
    assert!(!h.ledger.identity(&alice).unwrap().active);
}

#[test]
fn test_node_count_ignores_failed_attempts() {
    let mut h = Harness::new();
    for byte in 1..=10u8 {
        h.ledger.register(addr(byte), String::new()).unwrap();
        // Every duplicate fails and must not count.
        assert!(h.ledger.register(addr(byte), String::new()).is_err());
    }
    assert!(h.ledger.register(trustweave_core::Address::ZERO, String::new()).is_err());
    assert_eq!(h.ledger.node_count(), 10);
}

#[test]
fn test_metadata_update_and_limits() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.register_all(&[alice]);

    h.ledger.update_metadata(alice, "ipfs://v2".into()).unwrap();
    let identity = h.ledger.identity(&alice).unwrap();
    assert_eq!(identity.metadata, "ipfs://v2");
    assert_eq!(identity.registered_at, T0);

    let long = "x".repeat(h.ledger.config().max_metadata_len + 1);
    let err = h.ledger.update_metadata(alice, long).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMetadata);

    let err = h.ledger.update_metadata(addr(0x77), "x".into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_deactivate_twice_fails() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.register_all(&[alice]);
    h.ledger.deactivate(alice).unwrap();
    assert!(!h.ledger.is_active(&alice));
    assert_eq!(h.ledger.deactivate(alice).unwrap_err().kind(), ErrorKind::NotActive);
}

// =========================================================================
// Relationship graph
// =========================================================================

#[test]
fn test_invalid_relationships_rejected() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    h.register_all(&[alice]);

    let err = h
        .ledger
        .create_relationship(alice, alice, 1, hash_text("self"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelfRelationship);

    let err = h
        .ledger
        .create_relationship(alice, bob, 0, hash_text("zero"))
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidWeight(0));

    let err = h
        .ledger
        .create_relationship(alice, trustweave_core::Address::ZERO, 1, hash_text("zero"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    assert_eq!(h.ledger.edge_count(), 0);
}

#[test]
fn test_identical_edges_get_distinct_ids() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    h.register_all(&[alice]);

    let rel = hash_text("neighbours");
    let first = h.ledger.create_relationship(alice, bob, 7, rel).unwrap();
    let second = h.ledger.create_relationship(alice, bob, 7, rel).unwrap();

    assert_ne!(first, second);
    assert_eq!(h.ledger.edge_count(), 2);
    assert_eq!(h.ledger.edges_for_node(&alice), &[first, second]);
    assert_eq!(h.ledger.edges_for_node(&bob), &[first, second]);
}

#[test]
fn test_edge_fields_and_weight_update() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    h.register_all(&[alice]);

    let rel = hash_text("mentor");
    let id = h.ledger.create_relationship(alice, bob, 40, rel).unwrap();
    let before = h.ledger.edge(&id).unwrap().clone();
    assert_eq!(before.node_a, alice);
    assert_eq!(before.node_b, bob);
    assert_eq!(before.weight, 40);
    assert_eq!(before.created_at, T0);
    assert_eq!(before.relationship_hash, rel);
    assert!(before.active);

    h.clock.advance(3_600);
    h.ledger.update_edge_weight(alice, id, 90).unwrap();
    let after = h.ledger.edge(&id).unwrap();
    assert_eq!(after.weight, 90);
    assert_eq!(
        trustweave_identity::Edge {
            weight: before.weight,
            ..after.clone()
        },
        before
    );
}

#[test]
fn test_only_creator_mutates_edge() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    h.register_all(&[alice, bob]);
    let id = h
        .ledger
        .create_relationship(alice, bob, 1, hash_text("x"))
        .unwrap();

    let err = h.ledger.update_edge_weight(bob, id, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = h.ledger.deactivate_edge(bob, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    h.ledger.deactivate_edge(alice, id).unwrap();
    assert!(!h.ledger.is_edge_active(&id));
    // Tombstoned edges stay listed but reject further changes.
    assert_eq!(h.ledger.edges_for_node(&bob), &[id]);
    let err = h.ledger.update_edge_weight(alice, id, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotActive);
    let err = h.ledger.update_edge_weight(alice, id, 0);
    assert!(err.is_err());
}

#[test]
fn test_adjacency_views() {
    let mut h = Harness::new();
    let (alice, bob, carol) = (addr(0xa1), addr(0xb0), addr(0xc0));
    h.register_all(&[alice, bob]);

    let ab = h.ledger.create_relationship(alice, bob, 1, hash_text("x")).unwrap();
    let ac = h.ledger.create_relationship(alice, carol, 1, hash_text("y")).unwrap();
    h.ledger.create_relationship(bob, carol, 1, hash_text("z")).unwrap();
    h.ledger.deactivate_edge(alice, ac).unwrap();

    let outgoing: Vec<_> = h.ledger.graph().outgoing_edges(&alice).iter().map(|e| e.id).collect();
    assert_eq!(outgoing, vec![ab]);
    assert_eq!(h.ledger.graph().incoming_edges(&carol).len(), 1);
    assert_eq!(h.ledger.edges_for_node(&carol).len(), 2);
}
