use trustweave_core::LedgerError;

/// Lowest representable score.
pub const MIN_SCORE: u64 = 0;

/// Highest representable score.
pub const MAX_SCORE: u64 = 1_000_000;

/// Score assigned when a node's reputation is initialized.
pub const INITIAL_SCORE: u64 = 500_000;

/// Reject scores outside `[MIN_SCORE, MAX_SCORE]`.
pub fn check_bounds(score: u64) -> Result<(), LedgerError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(LedgerError::ScoreOutOfBounds {
            score,
            min: MIN_SCORE,
            max: MAX_SCORE,
        });
    }
    Ok(())
}
