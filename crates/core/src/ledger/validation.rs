//! Business rule validation for ledger operations.

use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::state::LedgerState;
use super::types::{Account, JournalEntry};

/// Validates the amounts of a single line.
///
/// Exactly one side must be non-zero and neither may be negative.
///
/// # Errors
///
/// - `InvalidAmount` if either amount is negative
/// - `ZeroLine` if both are zero
/// - `TwoSidedLine` if both are positive
pub fn validate_line_amounts(debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }

    match (debit.is_zero(), credit.is_zero()) {
        (true, true) => Err(LedgerError::ZeroLine),
        (false, false) => Err(LedgerError::TwoSidedLine),
        _ => Ok(()),
    }
}

/// Resolves an account that may receive new lines.
///
/// # Errors
///
/// `UnknownAccount` if missing, `InactiveAccount` if deactivated.
pub fn usable_account(state: &LedgerState, account_id: AccountId) -> Result<&Account, LedgerError> {
    let account = state
        .accounts
        .get(&account_id)
        .ok_or(LedgerError::UnknownAccount(account_id))?;

    if !account.is_active {
        return Err(LedgerError::InactiveAccount(account_id));
    }

    Ok(account)
}

/// Validates an entry whose totals were just recomputed, right before posting.
///
/// # Errors
///
/// `EmptyEntry`, `UnknownAccount`/`InactiveAccount` for any referenced
/// account, or `Unbalanced` if debits differ from credits.
pub fn validate_for_posting(state: &LedgerState, entry: &JournalEntry) -> Result<(), LedgerError> {
    if entry.lines.is_empty() {
        return Err(LedgerError::EmptyEntry(entry.id));
    }

    for account_id in entry.account_ids() {
        usable_account(state, account_id)?;
    }

    if !entry.is_balanced() {
        return Err(LedgerError::Unbalanced {
            debit: entry.total_debit,
            credit: entry.total_credit,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(100), dec!(0))]
    #[case(dec!(0), dec!(0.01))]
    fn test_one_sided_lines_are_valid(#[case] debit: Decimal, #[case] credit: Decimal) {
        assert!(validate_line_amounts(debit, credit).is_ok());
    }

    #[rstest]
    #[case(dec!(-1), dec!(0), LedgerError::InvalidAmount)]
    #[case(dec!(0), dec!(-0.01), LedgerError::InvalidAmount)]
    #[case(dec!(-5), dec!(5), LedgerError::InvalidAmount)]
    #[case(dec!(0), dec!(0), LedgerError::ZeroLine)]
    #[case(dec!(10), dec!(10), LedgerError::TwoSidedLine)]
    fn test_invalid_lines(
        #[case] debit: Decimal,
        #[case] credit: Decimal,
        #[case] expected: LedgerError,
    ) {
        assert_eq!(validate_line_amounts(debit, credit), Err(expected));
    }

    #[test]
    fn test_negative_zero_is_not_negative() {
        let negative_zero = -Decimal::ZERO;
        assert!(validate_line_amounts(negative_zero, dec!(5)).is_ok());
    }
}
