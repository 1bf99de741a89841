//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `InvoiceId` where a `BillId` is expected.
//! Ordering follows the underlying UUID v7, so IDs sort by creation time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered ID (UUID v7).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Opaque identifier of the company a call is scoped to.");
typed_id!(UserId, "Identifier of the user who performed an action.");
typed_id!(AccountId, "Identifier for a chart of accounts entry.");
typed_id!(JournalEntryId, "Identifier for a journal entry.");
typed_id!(InvoiceId, "Identifier for a customer invoice.");
typed_id!(PaymentId, "Identifier for a customer payment.");
typed_id!(BillId, "Identifier for a vendor bill.");
typed_id!(ExpenseId, "Identifier for an expense claim.");
typed_id!(FixedAssetId, "Identifier for a fixed asset.");
typed_id!(BudgetId, "Identifier for a budget.");
typed_id!(BudgetLineId, "Identifier for a budget line.");
typed_id!(StatementLineId, "Identifier for a bank statement line.");
typed_id!(ReconciliationId, "Identifier for a bank reconciliation.");
typed_id!(AdjustmentId, "Identifier for a reconciliation adjustment.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_strings() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = JournalEntryId::new();
        let second = JournalEntryId::new();
        assert!(first < second);
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        assert!("not-a-uuid".parse::<TenantId>().is_err());
    }
}
