//! Integration test: proof submission, verification, and verified connections.

use trustweave_core::{Address, Domain, ErrorKind, Hash, LedgerError, LedgerEvent, Role};
use trustweave_crypto::hash;
use trustweave_integration_tests::{addr, deployer, Harness, T0};
use trustweave_proof::ProofStatus;

fn submit(h: &mut Harness, prover: Address, seed: u8) -> Hash {
    h.ledger
        .submit_proof(prover, hash(&[seed; 64]), &[u64::from(seed)])
        .unwrap()
}

// =========================================================================
// Submission
// =========================================================================

#[test]
fn test_anyone_can_submit_and_ids_are_unique() {
    let mut h = Harness::new();
    let prover = addr(0xa1);

    // Same proof hash, same prover, same instant.
    let a = submit(&mut h, prover, 1);
    let b = submit(&mut h, prover, 1);
    assert_ne!(a, b);

    let proof = h.ledger.proof(&a).unwrap();
    assert_eq!(proof.prover, prover);
    assert_eq!(proof.submitted_at, T0);
    assert_eq!(proof.status, ProofStatus::Pending);
    assert!(!h.ledger.is_proof_verified(&a));
    assert_eq!(h.ledger.status().total_proofs, 2);
}

// =========================================================================
// Verification
// =========================================================================

#[test]
fn test_verify_once_only() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    let id = submit(&mut h, alice, 1);

    h.ledger.verify_proof(deployer(), id, alice, bob, true).unwrap();
    assert!(h.ledger.is_proof_verified(&id));

    for is_valid in [true, false] {
        let err = h
            .ledger
            .verify_proof(deployer(), id, alice, bob, is_valid)
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyVerified(id));
    }

    let invalid = submit(&mut h, alice, 2);
    h.ledger
        .verify_proof(deployer(), invalid, alice, bob, false)
        .unwrap();
    assert_eq!(h.ledger.proof(&invalid).unwrap().status, ProofStatus::Invalidated);
    let err = h
        .ledger
        .verify_proof(deployer(), invalid, alice, bob, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyVerified);
    assert_eq!(h.ledger.status().total_verified_proofs, 1);
}

#[test]
fn test_verification_requires_verifier_role() {
    let mut h = Harness::new();
    let (alice, bob, verifier) = (addr(0xa1), addr(0xb0), addr(0x0e));
    let id = submit(&mut h, alice, 1);

    let err = h.ledger.verify_proof(verifier, id, alice, bob, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    h.ledger
        .grant_role(deployer(), Domain::Proofs, Role::Verifier, verifier)
        .unwrap();
    h.ledger.verify_proof(verifier, id, alice, bob, true).unwrap();

    // Revoked verifiers lose access.
    let next = submit(&mut h, alice, 2);
    h.ledger
        .revoke_role(deployer(), Domain::Proofs, Role::Verifier, verifier)
        .unwrap();
    let err = h.ledger.verify_proof(verifier, next, alice, bob, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_unknown_proof_not_found() {
    let mut h = Harness::new();
    let err = h
        .ledger
        .verify_proof(deployer(), Hash::new([9; 32]), addr(1), addr(2), true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(h.ledger.proof(&Hash::new([9; 32])).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_connection_is_symmetric() {
    let mut h = Harness::new();
    let (alice, bob, carol) = (addr(0xa1), addr(0xb0), addr(0xc0));
    let id = submit(&mut h, alice, 1);
    h.ledger.verify_proof(deployer(), id, bob, alice, true).unwrap();

    assert!(h.ledger.is_connection_verified(&alice, &bob));
    assert!(h.ledger.is_connection_verified(&bob, &alice));
    assert!(!h.ledger.is_connection_verified(&alice, &carol));
    assert_eq!(
        h.ledger.connection(&alice, &bob),
        h.ledger.connection(&bob, &alice)
    );

    // A rejected proof records no connection.
    let rejected = submit(&mut h, carol, 2);
    h.ledger
        .verify_proof(deployer(), rejected, alice, carol, false)
        .unwrap();
    assert!(!h.ledger.is_connection_verified(&carol, &alice));
}

#[test]
fn test_latest_verification_wins() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    let first = submit(&mut h, alice, 1);
    let second = submit(&mut h, bob, 2);

    h.ledger.verify_proof(deployer(), first, alice, bob, true).unwrap();
    h.clock.advance(60);
    h.ledger.verify_proof(deployer(), second, bob, alice, true).unwrap();

    let connection = h.ledger.connection(&alice, &bob).unwrap();
    assert_eq!(connection.proof_id, second);
    assert_eq!(connection.verified_at, T0 + 60);
}

// =========================================================================
// Batches
// =========================================================================

#[test]
fn test_batch_verify_emits_per_item_events() {
    let mut h = Harness::new();
    let (alice, bob, carol) = (addr(0xa1), addr(0xb0), addr(0xc0));
    let p1 = submit(&mut h, alice, 1);
    let p2 = submit(&mut h, alice, 2);
    let seq = h.ledger.last_event_seq();

    h.ledger
        .batch_verify_proofs(deployer(), &[p1, p2], &[alice, alice], &[bob, carol], &[true, false])
        .unwrap();

    let events: Vec<LedgerEvent> = h
        .ledger
        .events_since(seq)
        .into_iter()
        .map(|r| r.event)
        .collect();
    assert_eq!(
        events,
        vec![
            LedgerEvent::ProofVerified {
                proof_id: p1,
                node_a: alice,
                node_b: bob
            },
            LedgerEvent::ProofInvalidated { proof_id: p2 },
        ]
    );
    assert!(h.ledger.is_connection_verified(&bob, &alice));
    assert!(!h.ledger.is_connection_verified(&alice, &carol));
}

#[test]
fn test_bad_batch_applies_nothing() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    let p1 = submit(&mut h, alice, 1);
    let p2 = submit(&mut h, alice, 2);
    let seq = h.ledger.last_event_seq();

    let err = h
        .ledger
        .batch_verify_proofs(deployer(), &[p1, p2], &[alice], &[bob, bob], &[true, true])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArrayLengthMismatch);

    let err = h
        .ledger
        .batch_verify_proofs(deployer(), &[p1, p1], &[alice, alice], &[bob, bob], &[true, true])
        .unwrap_err();
    assert_eq!(err, LedgerError::AlreadyVerified(p1));

    let err = h
        .ledger
        .batch_verify_proofs(
            deployer(),
            &[p1, Hash::new([7; 32])],
            &[alice, alice],
            &[bob, bob],
            &[true, true],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(!h.ledger.is_proof_verified(&p1));
    assert!(!h.ledger.is_connection_verified(&alice, &bob));
    assert_eq!(h.ledger.last_event_seq(), seq);
}

// =========================================================================
// Format check
// =========================================================================

#[test]
fn test_proof_format_is_length_check() {
    let h = Harness::new();
    let min = h.ledger.config().min_proof_len;

    assert!(h.ledger.verify_proof_format(&vec![1u8; min], &[]).unwrap());
    assert!(h.ledger.verify_proof_format(&vec![0u8; 4096], &[1, 2, 3]).unwrap());
    let err = h.ledger.verify_proof_format(&[], &[1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidProofFormat);
    let err = h.ledger.verify_proof_format(&vec![1u8; min - 1], &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidProofFormat);
}
