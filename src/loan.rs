use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::{add_months, monthly_payment, AmortizationSchedule};
use crate::decimal::{Money, Rate};
use crate::errors::{EmiError, Result};
use crate::events::{Event, EventStore};
use crate::types::{LoanId, LoanStatus, PaymentRecord};

/// an EMI loan: terms fixed at creation, mutated only by payment application
///
/// invariant while active: `total_paid + remaining_amount == principal`,
/// exact under decimal arithmetic since both move by `monthly_payment` per
/// applied installment. `remaining_amount` goes negative by the accumulated
/// interest on the final installment and is clamped to zero at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub name: String,

    // terms, immutable after creation
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub start_date: NaiveDate,

    // repayment progress
    pub next_due_date: NaiveDate,
    pub total_paid: Money,
    pub remaining_amount: Money,
    pub payments_made: u32,
    pub payment_history: Vec<PaymentRecord>,

    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub last_status_change: DateTime<Utc>,
}

impl Loan {
    /// builder for creating loans
    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    /// total owed over the whole term
    pub fn total_payable(&self) -> Money {
        self.monthly_payment * Decimal::from(self.term_months)
    }

    /// balance still owed, zero once completed
    pub fn outstanding(&self) -> Money {
        self.remaining_amount.max(Money::ZERO)
    }

    /// repayment progress as a ratio in [0, 1]; `as_percentage` yields 0-100
    pub fn progress(&self) -> Rate {
        let total = self.total_payable();
        if total.is_zero() {
            return Rate::ZERO;
        }
        Rate::from_decimal(self.total_paid.as_decimal() / total.as_decimal())
            .clamp(Rate::ZERO, Rate::ONE)
    }

    /// active with a due date in the past
    pub fn is_overdue(&self, time: &SafeTimeProvider) -> bool {
        self.status == LoanStatus::Active && time.now().date_naive() > self.next_due_date
    }

    /// apply one installment payment
    ///
    /// not idempotent: each call records one payment, callers invoke it at
    /// most once per due cycle. rejected on completed or defaulted loans.
    pub fn apply_payment(
        &mut self,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<PaymentRecord> {
        match self.status {
            LoanStatus::Completed => {
                return Err(EmiError::AlreadyCompleted { loan_id: self.id });
            }
            LoanStatus::Defaulted => {
                return Err(EmiError::LoanDefaulted { loan_id: self.id });
            }
            LoanStatus::Active => {}
        }

        let now = time.now();
        let due_date = self.next_due_date;

        self.total_paid += self.monthly_payment;
        self.remaining_amount -= self.monthly_payment;
        self.payments_made += 1;

        // due dates stay anchored to the start date's day-of-month, clamped
        // per target month, rather than compounding the clamp month over month
        self.next_due_date = add_months(self.start_date, self.payments_made + 1)?;

        if self.total_paid >= self.total_payable() {
            self.remaining_amount = Money::ZERO;
            self.status = LoanStatus::Completed;
            self.last_status_change = now;

            events.emit(Event::LoanCompleted {
                loan_id: self.id,
                total_paid: self.total_paid,
                timestamp: now,
            });
        }

        let record = PaymentRecord {
            loan_id: self.id,
            payment_number: self.payments_made,
            amount: self.monthly_payment,
            due_date,
            applied_at: now,
            total_paid_after: self.total_paid,
            remaining_after: self.remaining_amount,
        };

        events.emit(Event::PaymentApplied {
            loan_id: self.id,
            payment_number: record.payment_number,
            amount: record.amount,
            total_paid: self.total_paid,
            remaining_amount: self.remaining_amount,
            next_due_date: self.next_due_date,
            timestamp: now,
        });

        self.payment_history.push(record.clone());

        Ok(record)
    }

    /// external write-off override; the engine never enters this state itself
    pub fn mark_defaulted(
        &mut self,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        match self.status {
            LoanStatus::Completed => {
                return Err(EmiError::AlreadyCompleted { loan_id: self.id });
            }
            LoanStatus::Defaulted => {
                return Err(EmiError::LoanDefaulted { loan_id: self.id });
            }
            LoanStatus::Active => {}
        }

        let now = time.now();
        self.status = LoanStatus::Defaulted;
        self.last_status_change = now;

        events.emit(Event::LoanDefaulted {
            loan_id: self.id,
            outstanding: self.outstanding(),
            timestamp: now,
        });

        Ok(())
    }

    /// full principal/interest breakdown over the term
    pub fn schedule(&self) -> Result<AmortizationSchedule> {
        AmortizationSchedule::generate(
            self.id,
            self.principal,
            self.annual_rate,
            self.term_months,
            self.start_date,
        )
    }

    /// get json representation of current state
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// short alias for json output
    pub fn json(&self) -> String {
        self.to_json_pretty()
    }
}

/// builder for loans
pub struct LoanBuilder {
    name: Option<String>,
    principal: Option<Money>,
    annual_rate: Option<Rate>,
    term_months: Option<u32>,
    start_date: Option<NaiveDate>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            principal: None,
            annual_rate: None,
            term_months: None,
            start_date: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn annual_rate(mut self, rate: Rate) -> Self {
        self.annual_rate = Some(rate);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// validate terms, derive the monthly payment, and open the loan with
    /// the first installment due one month after the start date
    pub fn build(self, time: &SafeTimeProvider) -> Result<Loan> {
        let principal = self.principal.ok_or(EmiError::InvalidConfiguration {
            message: "principal required".to_string(),
        })?;
        let annual_rate = self.annual_rate.ok_or(EmiError::InvalidConfiguration {
            message: "annual rate required".to_string(),
        })?;
        let term_months = self.term_months.ok_or(EmiError::InvalidConfiguration {
            message: "term required".to_string(),
        })?;

        let emi = monthly_payment(principal, annual_rate, term_months)?;

        let now = time.now();
        let start_date = self.start_date.unwrap_or_else(|| now.date_naive());
        let next_due_date = add_months(start_date, 1)?;

        Ok(Loan {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(|| "loan".to_string()),
            principal,
            annual_rate,
            term_months,
            monthly_payment: emi,
            start_date,
            next_due_date,
            total_paid: Money::ZERO,
            remaining_amount: principal,
            payments_made: 0,
            payment_history: Vec::new(),
            status: LoanStatus::Active,
            created_at: now,
            last_status_change: now,
        })
    }
}

impl Default for LoanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
