use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// loan repayment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// repayment in progress
    Active,
    /// all installments paid, balance cleared
    Completed,
    /// written off by external decision; never set by the engine itself
    Defaulted,
}

impl LoanStatus {
    /// terminal states accept no further payments
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Defaulted)
    }
}

/// receipt for one applied installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub loan_id: LoanId,
    /// 1-based installment number
    pub payment_number: u32,
    pub amount: Money,
    /// due date this payment satisfied
    pub due_date: NaiveDate,
    pub applied_at: DateTime<Utc>,
    pub total_paid_after: Money,
    pub remaining_after: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LoanStatus::Active.is_terminal());
        assert!(LoanStatus::Completed.is_terminal());
        assert!(LoanStatus::Defaulted.is_terminal());
    }
}
