use std::io::{Read, Write};

use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{EmiError, Result};
use crate::events::{Event, EventStore};
use crate::loan::Loan;
use crate::types::{LoanId, LoanStatus, PaymentRecord};

/// loan repository with an explicit save/load contract
///
/// the caller decides when state is persisted; nothing is written implicitly
/// on mutation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoanStore {
    loans: Vec<Loan>,
    #[serde(skip)]
    events: EventStore,
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            loans: Vec::new(),
            events: EventStore::new(),
        }
    }

    /// add a loan to the store
    pub fn add(&mut self, loan: Loan) -> LoanId {
        let id = loan.id;
        self.events.emit(Event::LoanOpened {
            loan_id: id,
            principal: loan.principal,
            monthly_payment: loan.monthly_payment,
            term_months: loan.term_months,
            first_due_date: loan.next_due_date,
        });
        self.loans.push(loan);
        id
    }

    pub fn get(&self, loan_id: LoanId) -> Result<&Loan> {
        self.loans
            .iter()
            .find(|l| l.id == loan_id)
            .ok_or(EmiError::LoanNotFound { loan_id })
    }

    pub fn get_mut(&mut self, loan_id: LoanId) -> Result<&mut Loan> {
        self.loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or(EmiError::LoanNotFound { loan_id })
    }

    /// remove a loan; deletion is the store's concern, not the loan's
    pub fn remove(&mut self, loan_id: LoanId) -> Result<Loan> {
        let idx = self
            .loans
            .iter()
            .position(|l| l.id == loan_id)
            .ok_or(EmiError::LoanNotFound { loan_id })?;
        let loan = self.loans.remove(idx);
        self.events.emit(Event::LoanRemoved { loan_id });
        Ok(loan)
    }

    /// apply one installment to a stored loan
    pub fn apply_payment(
        &mut self,
        loan_id: LoanId,
        time: &SafeTimeProvider,
    ) -> Result<PaymentRecord> {
        let loan = self
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or(EmiError::LoanNotFound { loan_id })?;
        loan.apply_payment(time, &mut self.events)
    }

    /// externally write off a stored loan
    pub fn mark_defaulted(&mut self, loan_id: LoanId, time: &SafeTimeProvider) -> Result<()> {
        let loan = self
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or(EmiError::LoanNotFound { loan_id })?;
        loan.mark_defaulted(time, &mut self.events)
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    // --- derived portfolio statistics ---

    /// sum of outstanding balances across active loans
    pub fn total_outstanding(&self) -> Money {
        self.loans
            .iter()
            .filter(|l| l.status == LoanStatus::Active)
            .map(|l| l.outstanding())
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// sum of everything paid so far, all statuses
    pub fn total_paid(&self) -> Money {
        self.loans
            .iter()
            .map(|l| l.total_paid)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// combined monthly obligation across active loans
    pub fn monthly_commitment(&self) -> Money {
        self.loans
            .iter()
            .filter(|l| l.status == LoanStatus::Active)
            .map(|l| l.monthly_payment)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    pub fn active_count(&self) -> usize {
        self.count_by_status(LoanStatus::Active)
    }

    pub fn completed_count(&self) -> usize {
        self.count_by_status(LoanStatus::Completed)
    }

    fn count_by_status(&self, status: LoanStatus) -> usize {
        self.loans.iter().filter(|l| l.status == status).count()
    }

    /// loans with a due date before `now`, oldest first
    pub fn overdue_loans(&self, time: &SafeTimeProvider) -> Vec<&Loan> {
        let mut overdue: Vec<&Loan> = self
            .loans
            .iter()
            .filter(|l| l.is_overdue(time))
            .collect();
        overdue.sort_by_key(|l| l.next_due_date);
        overdue
    }

    // --- explicit save/load contract ---

    pub fn save_to_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EmiError::SerializationFailed {
            message: e.to_string(),
        })
    }

    pub fn save_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| EmiError::SerializationFailed {
            message: e.to_string(),
        })
    }

    pub fn load_from_str(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| EmiError::SerializationFailed {
            message: e.to_string(),
        })
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| EmiError::SerializationFailed {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_store(time: &SafeTimeProvider) -> (LoanStore, LoanId, LoanId) {
        let mut store = LoanStore::new();

        let car = store.add(
            Loan::builder()
                .name("car loan")
                .principal(Money::from_major(100_000))
                .annual_rate(Rate::from_percentage(dec!(8.5)))
                .term_months(12)
                .start_date(date(2024, 1, 1))
                .build(time)
                .unwrap(),
        );
        let phone = store.add(
            Loan::builder()
                .name("phone emi")
                .principal(Money::from_major(12_000))
                .annual_rate(Rate::ZERO)
                .term_months(6)
                .start_date(date(2024, 1, 15))
                .build(time)
                .unwrap(),
        );

        (store, car, phone)
    }

    #[test]
    fn test_add_get_remove() {
        let time = test_time();
        let (mut store, car, _) = seeded_store(&time);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(car).unwrap().name, "car loan");

        let removed = store.remove(car).unwrap();
        assert_eq!(removed.id, car);
        assert_eq!(store.len(), 1);
        assert!(matches!(
            store.get(car),
            Err(EmiError::LoanNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_loan_rejected() {
        let time = test_time();
        let (mut store, _, _) = seeded_store(&time);

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.apply_payment(missing, &time),
            Err(EmiError::LoanNotFound { .. })
        ));
    }

    #[test]
    fn test_portfolio_statistics() {
        let time = test_time();
        let (mut store, car, phone) = seeded_store(&time);

        assert_eq!(store.active_count(), 2);
        assert_eq!(store.total_outstanding(), Money::from_major(112_000));
        assert_eq!(
            store.monthly_commitment(),
            store.get(car).unwrap().monthly_payment + Money::from_major(2_000)
        );

        // pay the phone off entirely
        for _ in 0..6 {
            store.apply_payment(phone, &time).unwrap();
        }

        assert_eq!(store.active_count(), 1);
        assert_eq!(store.completed_count(), 1);
        assert_eq!(store.total_paid(), Money::from_major(12_000));
        // completed loans drop out of outstanding and commitment
        assert_eq!(store.total_outstanding(), Money::from_major(100_000));
        assert_eq!(
            store.monthly_commitment(),
            store.get(car).unwrap().monthly_payment
        );
    }

    #[test]
    fn test_events_flow_through_store() {
        let time = test_time();
        let (mut store, car, _) = seeded_store(&time);

        store.apply_payment(car, &time).unwrap();

        let events = store.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::LoanOpened { .. }))
                .count(),
            2
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PaymentApplied { loan_id, .. } if *loan_id == car)));
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_overdue_ordering() {
        let time = test_time();
        let control = time.test_control().unwrap();
        let (mut store, _, phone) = seeded_store(&time);

        assert!(store.overdue_loans(&time).is_empty());

        // car due feb 1, phone due feb 15; overdue is strictly past due
        control.advance(chrono::Duration::days(46));
        let overdue = store.overdue_loans(&time);
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].name, "car loan");

        store.apply_payment(phone, &time).unwrap();
        assert_eq!(store.overdue_loans(&time).len(), 1);
    }

    #[test]
    fn test_save_load_round_trip() {
        let time = test_time();
        let (mut store, car, _) = seeded_store(&time);
        store.apply_payment(car, &time).unwrap();

        let saved = store.save_to_string().unwrap();
        let restored = LoanStore::load_from_str(&saved).unwrap();

        assert_eq!(restored.len(), store.len());
        assert_eq!(restored.total_outstanding(), store.total_outstanding());
        assert_eq!(restored.monthly_commitment(), store.monthly_commitment());

        let loan = restored.get(car).unwrap();
        assert_eq!(loan.payments_made, 1);
        assert_eq!(loan.payment_history.len(), 1);

        // events are transient, not part of persisted state
        assert!(restored.events().is_empty());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            LoanStore::load_from_str("not json"),
            Err(EmiError::SerializationFailed { .. })
        ));
    }
}
