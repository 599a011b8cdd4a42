//! Integration test: reputation scores, role-gated updates, and lazy decay.

use trustweave_core::config::{DEFAULT_DECAY_PERIOD_SECS, DECAY_RATE_SCALE};
use trustweave_core::{Domain, ErrorKind, LedgerError, LedgerEvent, Role};
use trustweave_integration_tests::{addr, deployer, Harness, T0};
use trustweave_reputation::{decayed_score, INITIAL_SCORE, MAX_SCORE};

const PERIOD: u64 = DEFAULT_DECAY_PERIOD_SECS;

// =========================================================================
// Initialization
// =========================================================================

#[test]
fn test_initial_score() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);

    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), INITIAL_SCORE);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 500_000);
    let record = h.ledger.reputation_record(&alice).unwrap();
    assert_eq!(record.last_updated, T0);
    assert_eq!(record.update_count, 0);
}

#[test]
fn test_initialize_requires_active_identity_once() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));

    let err = h.ledger.initialize_reputation(bob, alice).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotActive);

    h.tracked(alice);
    let err = h.ledger.initialize_reputation(bob, alice).unwrap_err();
    assert_eq!(err, LedgerError::AlreadyInitialized(alice));

    h.register_all(&[bob]);
    h.ledger.deactivate(bob).unwrap();
    let err = h.ledger.initialize_reputation(alice, bob).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotActive);
}

// =========================================================================
// Updates
// =========================================================================

#[test]
fn test_update_requires_oracle_or_updater() {
    let mut h = Harness::new();
    let (alice, oracle, updater) = (addr(0xa1), addr(0x0c), addr(0x0d));
    h.tracked(alice);

    let err = h.ledger.update_reputation(oracle, alice, 600_000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    h.ledger
        .grant_role(deployer(), Domain::Reputation, Role::Oracle, oracle)
        .unwrap();
    h.ledger
        .grant_role(deployer(), Domain::Reputation, Role::Updater, updater)
        .unwrap();

    h.ledger.update_reputation(oracle, alice, 600_000).unwrap();
    h.ledger.update_reputation(updater, alice, 650_000).unwrap();
    let record = h.ledger.reputation_record(&alice).unwrap();
    assert_eq!(record.score, 650_000);
    assert_eq!(record.update_count, 2);

    // Updaters cannot batch.
    let err = h
        .ledger
        .batch_update_reputation(updater, &[alice], &[1])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_score_bounds() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);

    h.ledger.update_reputation(deployer(), alice, MAX_SCORE).unwrap();
    h.ledger.update_reputation(deployer(), alice, 0).unwrap();
    let err = h
        .ledger
        .update_reputation(deployer(), alice, MAX_SCORE + 1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScoreOutOfBounds);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 0);

    let err = h.ledger.update_reputation(deployer(), addr(0x77), 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_failed_batch_leaves_scores_untouched() {
    let mut h = Harness::new();
    let (alice, bob) = (addr(0xa1), addr(0xb0));
    h.tracked(alice);
    h.tracked(bob);
    let seq = h.ledger.last_event_seq();

    let err = h
        .ledger
        .batch_update_reputation(deployer(), &[alice, bob], &[1])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArrayLengthMismatch);

    let err = h
        .ledger
        .batch_update_reputation(deployer(), &[alice, bob], &[700_000, MAX_SCORE + 1])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScoreOutOfBounds);

    let err = h
        .ledger
        .batch_update_reputation(deployer(), &[alice, addr(0x77)], &[700_000, 1])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), INITIAL_SCORE);
    assert_eq!(h.ledger.get_reputation(&bob).unwrap(), INITIAL_SCORE);
    assert_eq!(h.ledger.last_event_seq(), seq);
}

// =========================================================================
// Decay
// =========================================================================

#[test]
fn test_one_period_decays_five_percent() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);

    h.clock.advance(PERIOD - 1);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 500_000);
    h.clock.advance(1);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 475_000);
    // Reading never persists.
    assert_eq!(h.ledger.reputation_record(&alice).unwrap().score, 500_000);
}

#[test]
fn test_apply_decay_agrees_with_read_path() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);

    h.clock.advance(3 * PERIOD + 17);
    let expected = h.ledger.get_reputation(&alice).unwrap();
    assert_eq!(expected, 428_687);

    let seq = h.ledger.last_event_seq();
    assert_eq!(h.ledger.apply_decay(deployer(), alice).unwrap(), expected);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), expected);
    let record = h.ledger.reputation_record(&alice).unwrap().clone();
    assert_eq!(record.last_updated, h.ledger.now());
    assert_eq!(record.update_count, 0);
    assert_eq!(
        h.ledger.events_since(seq)[0].event,
        LedgerEvent::ReputationUpdated {
            node: alice,
            old_score: 500_000,
            new_score: expected,
            timestamp: T0 + 3 * PERIOD + 17,
        }
    );

    // Immediately again: nothing changes and nothing is emitted.
    assert_eq!(h.ledger.apply_decay(deployer(), alice).unwrap(), expected);
    assert_eq!(h.ledger.reputation_record(&alice).unwrap(), &record);
    assert_eq!(h.ledger.last_event_seq(), seq + 1);
}

#[test]
fn test_update_resets_decay_clock() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);

    h.clock.advance(PERIOD * 5);
    h.ledger.update_reputation(deployer(), alice, 800_000).unwrap();
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 800_000);
    h.clock.advance(PERIOD);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 760_000);
}

#[test]
fn test_decay_parameter_validation() {
    let mut h = Harness::new();

    let err = h
        .ledger
        .update_decay_parameters(deployer(), DECAY_RATE_SCALE + 1, 60)
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidDecayRate(DECAY_RATE_SCALE + 1));
    let err = h.ledger.update_decay_parameters(deployer(), 0, 60).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDecayRate);
    let err = h
        .ledger
        .update_decay_parameters(deployer(), 900_000, 0)
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidDecayPeriod(0));
    let err = h
        .ledger
        .update_decay_parameters(addr(0xa1), 900_000, 60)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert_eq!(h.ledger.decay_parameters(), (950_000, PERIOD));
}

#[test]
fn test_new_decay_parameters_apply_to_reads() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);

    h.ledger.update_decay_parameters(deployer(), 500_000, 60).unwrap();
    h.clock.advance(120);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), 125_000);
    assert_eq!(
        h.ledger.get_reputation(&alice).unwrap(),
        decayed_score(500_000, T0, T0 + 120, 500_000, 60)
    );
}

#[test]
fn test_full_rate_disables_decay() {
    let mut h = Harness::new();
    let alice = addr(0xa1);
    h.tracked(alice);
    h.ledger
        .update_decay_parameters(deployer(), DECAY_RATE_SCALE, 1)
        .unwrap();
    h.clock.advance(10 * PERIOD);
    assert_eq!(h.ledger.get_reputation(&alice).unwrap(), INITIAL_SCORE);
}
