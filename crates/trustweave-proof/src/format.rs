use trustweave_core::LedgerError;

/// Sanity-check a raw proof blob before it is handed to an external
/// verifier.
///
/// This is a length check only. It does not establish that the proof is
/// sound, and `public_inputs` are not inspected.
pub fn verify_proof_format(
    proof: &[u8],
    public_inputs: &[u64],
    min_len: usize,
) -> Result<bool, LedgerError> {
    if proof.is_empty() {
        return Err(LedgerError::InvalidProofFormat("proof is empty".into()));
    }
    if proof.len() < min_len {
        return Err(LedgerError::InvalidProofFormat(format!(
            "proof is {} bytes, minimum is {}",
            proof.len(),
            min_len
        )));
    }
    tracing::trace!(len = proof.len(), inputs = public_inputs.len(), "proof format accepted");
    Ok(true)
}
