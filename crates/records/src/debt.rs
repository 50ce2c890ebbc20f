use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult, Record, RecordId};

/// An amount a customer owes the shop, typically from a credit sale.
///
/// Repayments accumulate in `paid`; the debt settles when `paid` reaches
/// `amount`. Partial payments are the normal case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: RecordId,
    pub customer_id: RecordId,
    /// Original amount owed, in minor currency units.
    pub amount: u64,
    /// Total repaid so far, in minor currency units.
    pub paid: u64,
    pub incurred_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub synced: bool,
}

impl DebtRecord {
    pub fn incur(
        customer_id: RecordId,
        amount: u64,
        incurred_at: DateTime<Utc>,
        due_at: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        if amount == 0 {
            return Err(DomainError::validation("debt amount must be positive"));
        }

        Ok(Self {
            id: RecordId::new(),
            customer_id,
            amount,
            paid: 0,
            incurred_at,
            due_at,
            settled_at: None,
            synced: false,
        })
    }

    /// What is still owed.
    pub fn outstanding(&self) -> u64 {
        self.amount - self.paid
    }

    pub fn is_settled(&self) -> bool {
        self.paid == self.amount
    }

    /// Record a repayment. Overpaying is rejected rather than credited.
    pub fn record_payment(&mut self, amount: u64, at: DateTime<Utc>) -> DomainResult<()> {
        if amount == 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if amount > self.outstanding() {
            return Err(DomainError::invariant(format!(
                "payment of {} exceeds outstanding balance of {}",
                amount,
                self.outstanding()
            )));
        }
        self.paid += amount;
        if self.is_settled() {
            self.settled_at = Some(at);
        }
        self.synced = false;
        Ok(())
    }
}

impl Record for DebtRecord {
    fn record_type(&self) -> &'static str {
        "debt"
    }

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn synced(&self) -> bool {
        self.synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_debt(amount: u64) -> DebtRecord {
        DebtRecord::incur(RecordId::new(), amount, Utc::now(), None).unwrap()
    }

    #[test]
    fn new_debt_is_fully_outstanding() {
        let debt = test_debt(5_000);
        assert_eq!(debt.outstanding(), 5_000);
        assert!(!debt.is_settled());
        assert!(!debt.synced);
    }

    #[test]
    fn zero_amount_debt_is_rejected() {
        let err = DebtRecord::incur(RecordId::new(), 0, Utc::now(), None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn partial_payment_reduces_outstanding() {
        let mut debt = test_debt(5_000);
        debt.synced = true;

        debt.record_payment(2_000, Utc::now()).unwrap();

        assert_eq!(debt.outstanding(), 3_000);
        assert!(!debt.is_settled());
        assert!(debt.settled_at.is_none());
        assert!(!debt.synced);
    }

    #[test]
    fn final_payment_settles_the_debt() {
        let mut debt = test_debt(5_000);
        debt.record_payment(2_000, Utc::now()).unwrap();
        debt.record_payment(3_000, Utc::now()).unwrap();

        assert!(debt.is_settled());
        assert_eq!(debt.outstanding(), 0);
        assert!(debt.settled_at.is_some());
    }

    #[test]
    fn overpayment_is_rejected() {
        let mut debt = test_debt(1_000);
        let err = debt.record_payment(1_500, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(debt.paid, 0);
    }

    #[test]
    fn payment_on_settled_debt_is_rejected() {
        let mut debt = test_debt(1_000);
        debt.record_payment(1_000, Utc::now()).unwrap();

        let err = debt.record_payment(1, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of accepted payments, paid never
        /// exceeds the original amount and paid + outstanding == amount.
        #[test]
        fn payments_never_exceed_amount(
            amount in 1u64..1_000_000u64,
            payments in prop::collection::vec(1u64..50_000u64, 0..20)
        ) {
            let mut debt = test_debt(amount);

            for payment in payments {
                // Ignore rejected payments; accepted ones must preserve
                // the balance arithmetic.
                let _ = debt.record_payment(payment, Utc::now());
                prop_assert!(debt.paid <= debt.amount);
                prop_assert_eq!(debt.paid + debt.outstanding(), debt.amount);
                prop_assert_eq!(debt.is_settled(), debt.paid == debt.amount);
            }
        }
    }
}
