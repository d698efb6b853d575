//! Index checks shared by the stable and weighted engines

use parity_types::{MathError, MathResult};

/// Swap indices must be distinct positions inside the pool
pub(crate) fn validate_swap_indices(
    token_count: usize,
    index_in: usize,
    index_out: usize,
) -> MathResult<()> {
    if index_in >= token_count || index_out >= token_count {
        return Err(MathError::invalid(format!(
            "swap indices ({index_in}, {index_out}) out of range for {token_count} tokens"
        )));
    }
    if index_in == index_out {
        return Err(MathError::invalid(format!(
            "cannot swap token {index_in} for itself"
        )));
    }
    Ok(())
}

pub(crate) fn validate_token_index(token_count: usize, token_index: usize) -> MathResult<()> {
    if token_index >= token_count {
        return Err(MathError::invalid(format!(
            "token index {token_index} out of range for {token_count} balances"
        )));
    }
    Ok(())
}
