//! Lazy time decay of reputation scores.
//!
//! Decay is never scheduled. Both the read path (`get_reputation`) and the
//! write path (`apply_decay`) call [`decayed_score`] with the stored
//! `(score, last_updated)` pair, so the two can never disagree.

use trustweave_core::config::DECAY_RATE_SCALE;
use trustweave_core::Timestamp;

use crate::score::MIN_SCORE;

/// Whole decay periods between `last_updated` and `now`.
///
/// A `now` earlier than `last_updated` counts as zero elapsed time.
#[must_use]
pub fn periods_elapsed(last_updated: Timestamp, now: Timestamp, period_secs: u64) -> u64 {
    if period_secs == 0 {
        return 0;
    }
    now.saturating_sub(last_updated) / period_secs
}

/// Score after decaying `score` from `last_updated` to `now`.
///
/// Each elapsed period multiplies by `rate / DECAY_RATE_SCALE` and floors,
/// so the result is bit-exact regardless of platform.
#[must_use]
pub fn decayed_score(
    score: u64,
    last_updated: Timestamp,
    now: Timestamp,
    rate: u64,
    period_secs: u64,
) -> u64 {
    let periods = periods_elapsed(last_updated, now, period_secs);
    decay_by_periods(score, periods, rate)
}

fn decay_by_periods(score: u64, periods: u64, rate: u64) -> u64 {
    if rate >= DECAY_RATE_SCALE {
        return score;
    }
    let mut current = score;
    for _ in 0..periods {
        // Every further period leaves zero at zero.
        if current == 0 {
            break;
        }
        current = (u128::from(current) * u128::from(rate) / u128::from(DECAY_RATE_SCALE)) as u64;
    }
    current.max(MIN_SCORE)
}
