use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::LoanId;

/// all events that can be emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LoanOpened {
        loan_id: LoanId,
        principal: Money,
        monthly_payment: Money,
        term_months: u32,
        first_due_date: NaiveDate,
    },
    PaymentApplied {
        loan_id: LoanId,
        payment_number: u32,
        amount: Money,
        total_paid: Money,
        remaining_amount: Money,
        next_due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    LoanCompleted {
        loan_id: LoanId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDefaulted {
        loan_id: LoanId,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    LoanRemoved {
        loan_id: LoanId,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
