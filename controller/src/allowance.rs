use crate::state::{AllowanceState, Amount};

/// Returns whether spending `requested` requires an approval first.
///
/// Only a validly parsed, positive request can need an approval: `None`
/// (empty or invalid input) reports `false`. Invalid input is rejected
/// separately by the action controller, so a `false` here never means the
/// spend is ready to be submitted.
pub fn evaluate(on_chain_allowance: Amount, requested: Option<Amount>) -> bool {
    match requested {
        Some(amount) if amount > 0 => on_chain_allowance < amount,
        _ => false,
    }
}

/// Combines the allowance read with the requested spend. `None` while the
/// allowance has not loaded.
pub fn allowance_state(
    on_chain_allowance: Option<Amount>,
    requested: Option<Amount>,
) -> Option<AllowanceState> {
    on_chain_allowance.map(|value| AllowanceState {
        value,
        needs_approval: evaluate(value, requested),
    })
}
